//! Generic 2D coordinate holder.
//!
//! [`Point`] is a plain `Copy` value used for pixel positions (blob centres)
//! as well as sky coordinates. Sky coordinates are usually written in
//! sexagesimal notation, so this module also provides the conversions from
//! `hours/degrees, minutes, seconds` triples to decimal degrees.
//!
//! # Examples
//!
//! ```rust
//! use tracker_math::Point;
//!
//! let origin = Point::new(1.0, 0.0);
//! let other = Point::new(4.0, 4.0);
//! assert_eq!(origin.distance(&other), 5.0);
//! assert!(!origin.approx_eq(&other));
//! ```

use num_traits::Float;

/// Tolerance used by [`Point::approx_eq`] on each axis.
pub const POINT_EPSILON: f64 = 1e-4;

/// Degrees of right ascension per hour.
const DEGREES_PER_HOUR: f64 = 15.0;

/// An (x, y) coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point<T> {
    /// Horizontal coordinate (column, or right ascension in degrees)
    pub x: T,
    /// Vertical coordinate (row, or declination in degrees)
    pub y: T,
}

impl<T> Point<T> {
    /// Create a point from raw coordinates.
    pub fn new(x: T, y: T) -> Self {
        Self { x, y }
    }
}

impl<T: Copy> Point<T> {
    /// Create a point with both coordinates set to `value`.
    pub fn splat(value: T) -> Self {
        Self { x: value, y: value }
    }
}

impl<T: Float> Point<T> {
    /// Euclidean distance to another point.
    pub fn distance(&self, other: &Self) -> T {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// True if `other` matches this point within [`POINT_EPSILON`] on both axes.
    pub fn approx_eq(&self, other: &Self) -> bool {
        self.approx_eq_xy(other.x, other.y)
    }

    /// True if `(x, y)` matches this point within [`POINT_EPSILON`] on both axes.
    pub fn approx_eq_xy(&self, x: T, y: T) -> bool {
        within_epsilon(self.x - x) && within_epsilon(self.y - y)
    }
}

impl Point<f64> {
    /// Build a sky coordinate from a right ascension in hours/minutes/seconds
    /// and a declination in degrees/arcminutes/arcseconds.
    ///
    /// Both components are returned in decimal degrees.
    ///
    /// ```rust
    /// use tracker_math::Point;
    ///
    /// // Vega: RA 18h36m56.3s, Dec +38°47'01"
    /// let vega = Point::from_sexagesimal(18.0, 36.0, 56.3, 38.0, 47.0, 1.0);
    /// assert!((vega.x - 279.2346).abs() < 1e-3);
    /// assert!((vega.y - 38.7836).abs() < 1e-3);
    /// ```
    pub fn from_sexagesimal(
        hours: f64,
        minutes: f64,
        seconds: f64,
        degrees: f64,
        arcminutes: f64,
        arcseconds: f64,
    ) -> Self {
        Self {
            x: hms_to_degrees(hours, minutes, seconds),
            y: sexagesimal_to_decimal(degrees, arcminutes, arcseconds),
        }
    }
}

impl<T> From<(T, T)> for Point<T> {
    fn from((x, y): (T, T)) -> Self {
        Self { x, y }
    }
}

impl<T> From<Point<T>> for (T, T) {
    fn from(point: Point<T>) -> Self {
        (point.x, point.y)
    }
}

/// Convert a `whole, minutes, seconds` triple to a decimal value.
///
/// The sign of `whole` applies to the fractional part too, so `-10° 30'`
/// becomes `-10.5`. A negative zero keeps the sign for values such as
/// `-0° 30'`.
pub fn sexagesimal_to_decimal(whole: f64, minutes: f64, seconds: f64) -> f64 {
    let fraction = minutes / 60.0 + seconds / 3600.0;
    if whole.is_sign_negative() {
        whole - fraction
    } else {
        whole + fraction
    }
}

/// Convert a right ascension in hours/minutes/seconds to decimal degrees.
pub fn hms_to_degrees(hours: f64, minutes: f64, seconds: f64) -> f64 {
    sexagesimal_to_decimal(hours, minutes, seconds) * DEGREES_PER_HOUR
}

fn within_epsilon<T: Float>(delta: T) -> bool {
    delta
        .abs()
        .to_f64()
        .is_some_and(|delta| delta < POINT_EPSILON)
}

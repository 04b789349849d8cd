//! Small math helpers shared by the star tracker crates.
//!
//! Currently this is the generic [`Point`] coordinate holder together with
//! conversions from sexagesimal (hours/degrees, minutes, seconds) notation.

pub mod point;

pub use point::{hms_to_degrees, sexagesimal_to_decimal, Point, POINT_EPSILON};

//! # Editor Utility Functions
//!
//! Geometry and color helpers shared by the renderer and the hit-testing code.
//!
//! ## Key Functions
//!
//! ### Geometry
//! - [`distance_to_segment`]: Calculate distance from point to line segment
//!
//! ### Colors
//! - [`get_type_color`]: Get color for a data type
//! - [`lerp_color`]: Blend two colors

use crate::node_types::DataType;
use egui::{Color32, Pos2};

/// Get the display color for a data type.
///
/// # Colors
/// - String: Khaki
/// - Number: Green
/// - File: Orange
/// - Tool: Purple
/// - None: White
pub fn get_type_color(dt: DataType) -> Color32 {
    match dt {
        DataType::String => Color32::KHAKI,
        DataType::Number => Color32::GREEN,
        DataType::File => Color32::from_rgb(255, 165, 0),
        DataType::Tool => Color32::from_rgb(170, 110, 230),
        DataType::None => Color32::WHITE,
    }
}

/// Calculate the distance from a point to a line segment.
///
/// # Arguments
/// * `p` - The point
/// * `a` - Start of segment
/// * `b` - End of segment
///
/// # Returns
/// The shortest distance from `p` to the segment `a-b`
pub fn distance_to_segment(p: Pos2, a: Pos2, b: Pos2) -> f32 {
    let ab = b - a;
    if ab.length_sq() < 1e-6 {
        return p.distance(a);
    }
    let ap = p - a;
    let t = (ap.dot(ab) / ab.length_sq()).clamp(0.0, 1.0);
    let closest = a + ab * t;
    p.distance(closest)
}

/// Interpolate between two colors.
///
/// # Arguments
/// * `c1` - Start color
/// * `c2` - End color
/// * `t` - Interpolation factor (0.0 = c1, 1.0 = c2)
pub fn lerp_color(c1: Color32, c2: Color32, t: f32) -> Color32 {
    let mix = |a: u8, b: u8| (a as f32 * (1.0 - t) + b as f32 * t) as u8;
    Color32::from_rgba_premultiplied(
        mix(c1.r(), c2.r()),
        mix(c1.g(), c2.g()),
        mix(c1.b(), c2.b()),
        mix(c1.a(), c2.a()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_to_degenerate_segment() {
        let a = Pos2::new(1.0, 1.0);
        assert_eq!(distance_to_segment(Pos2::new(4.0, 5.0), a, a), 5.0);
    }

    #[test]
    fn distance_clamps_to_segment_ends() {
        let a = Pos2::new(0.0, 0.0);
        let b = Pos2::new(10.0, 0.0);
        assert_eq!(distance_to_segment(Pos2::new(5.0, 3.0), a, b), 3.0);
        assert_eq!(distance_to_segment(Pos2::new(13.0, 4.0), a, b), 5.0);
    }

    #[test]
    fn lerp_color_endpoints() {
        assert_eq!(lerp_color(Color32::BLACK, Color32::WHITE, 0.0), Color32::BLACK);
        assert_eq!(lerp_color(Color32::BLACK, Color32::WHITE, 1.0), Color32::WHITE);
    }
}

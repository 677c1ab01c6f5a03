//! Planar geometry used by link and receptor coordinate transforms
//!
//! Bearings follow the surveying convention of the CALINE3 input: angles are
//! measured clockwise from north (the +Y axis).

use nalgebra::Point2;
use std::f64::consts::{FRAC_PI_2, PI};

use super::units::{Meters, Radians};

/// Clockwise angle from north to the vector `origin → target`
///
/// Uses the single-argument arctangent of `dy/dx`, so the axis-aligned cases
/// are resolved explicitly: when `dx == 0` the result is π for a target due
/// south and 0 otherwise (which includes `target == origin`).
///
/// # Returns
/// Angle in `[0, 2π)`
///
/// # Example
/// ```
/// use caline3_core::core_types::geometry::azimuth;
/// use nalgebra::Point2;
///
/// let east = azimuth(&Point2::new(0.0, 0.0), &Point2::new(10.0, 0.0));
/// assert!((*east - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
/// ```
pub fn azimuth(origin: &Point2<f64>, target: &Point2<f64>) -> Radians {
    let dx = target.x - origin.x;
    let dy = target.y - origin.y;

    if dx == 0.0 {
        return if dy < 0.0 {
            Radians::new(PI)
        } else {
            Radians::new(0.0)
        };
    }

    let alpha = FRAC_PI_2 - (dy / dx).atan();
    if dx > 0.0 {
        Radians::new(alpha)
    } else {
        Radians::new(PI + alpha)
    }
}

/// Euclidean distance between two points on the plane
pub fn distance(p: &Point2<f64>, q: &Point2<f64>) -> Meters {
    Meters::new(nalgebra::distance(p, q))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::TAU;

    fn origin() -> Point2<f64> {
        Point2::new(3.0, -2.0)
    }

    #[test]
    fn test_azimuth_of_coincident_points_is_zero() {
        let p = origin();
        assert_eq!(*azimuth(&p, &p), 0.0);
    }

    #[test]
    fn test_azimuth_cardinal_directions() {
        let o = origin();
        let north = azimuth(&o, &Point2::new(3.0, 5.0));
        let east = azimuth(&o, &Point2::new(10.0, -2.0));
        let south = azimuth(&o, &Point2::new(3.0, -20.0));
        let west = azimuth(&o, &Point2::new(-1.0, -2.0));

        assert_eq!(*north, 0.0);
        assert_relative_eq!(*east, FRAC_PI_2, epsilon = 1e-12);
        assert_eq!(*south, PI);
        assert_relative_eq!(*west, 3.0 * FRAC_PI_2, epsilon = 1e-12);
    }

    #[test]
    fn test_azimuth_quadrants_stay_in_range() {
        let o = Point2::new(0.0, 0.0);
        let cases = [
            (Point2::new(1.0, 1.0), PI / 4.0),
            (Point2::new(1.0, -1.0), 3.0 * PI / 4.0),
            (Point2::new(-1.0, -1.0), 5.0 * PI / 4.0),
            (Point2::new(-1.0, 1.0), 7.0 * PI / 4.0),
        ];
        for (target, expected) in cases {
            let a = *azimuth(&o, &target);
            assert!((0.0..TAU).contains(&a), "azimuth out of range: {a}");
            assert_relative_eq!(a, expected, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_azimuth_is_scale_invariant() {
        let o = origin();
        let offset = nalgebra::Vector2::new(-7.0, 4.5);
        let base = *azimuth(&o, &(o + offset));
        for scale in [0.001, 0.5, 3.0, 1.0e6] {
            let scaled = *azimuth(&o, &(o + offset * scale));
            assert_relative_eq!(scaled, base, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_distance() {
        let d = distance(&Point2::new(0.0, 0.0), &Point2::new(3.0, 4.0));
        assert_relative_eq!(*d, 5.0);
        assert_eq!(*distance(&origin(), &origin()), 0.0);
    }
}

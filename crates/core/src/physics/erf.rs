//! Error function approximation
//!
//! # References
//! - Abramowitz, M. & Stegun, I.A. (1964). "Handbook of Mathematical Functions",
//!   formula 7.1.28 (|ε| ≤ 3×10⁻⁷).

const A: [f64; 6] = [
    0.070_523_078_4,
    0.042_282_012_3,
    0.009_270_527_2,
    0.000_152_014_3,
    0.000_276_567_2,
    0.000_043_063_8,
];

/// Gauss error function
///
/// ```text
/// erf(x) = 1 − (1 + a₁x + a₂x² + … + a₆x⁶)⁻¹⁶    (x ≥ 0)
/// ```
///
/// Odd extension for negative arguments; saturates to exactly 1 above 5.
///
/// # Example
/// ```
/// use caline3_core::physics::erf;
///
/// assert_eq!(erf(0.0), 0.0);
/// assert!((erf(1.0) - 0.842_700_79).abs() < 1e-6);
/// ```
pub fn erf(x: f64) -> f64 {
    if x < 0.0 {
        return -erf(-x);
    }
    if x > 5.0 {
        return 1.0;
    }

    let poly = A.iter().rev().fold(0.0, |acc, a| (acc + a) * x);
    1.0 - (1.0 + poly).powi(-16)
}

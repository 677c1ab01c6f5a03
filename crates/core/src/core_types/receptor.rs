//! Receptor points where concentrations are evaluated

use nalgebra::{Point2, Point3};
use serde::Serialize;

/// A receptor location (meters, same datum as the link coordinates)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Receptor {
    pub(crate) ordinal: usize,
    pub(crate) name: String,
    pub(crate) position: Point3<f64>,
}

impl Receptor {
    /// Create a receptor
    ///
    /// # Arguments
    /// * `ordinal` - Position of the receptor in its job (0-based)
    /// * `name` - Label used in reports
    /// * `position` - x, y and height z in meters
    pub fn new(ordinal: usize, name: impl Into<String>, position: Point3<f64>) -> Self {
        Receptor {
            ordinal,
            name: name.into(),
            position,
        }
    }

    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn position(&self) -> &Point3<f64> {
        &self.position
    }

    /// Horizontal projection of the receptor
    pub fn plan(&self) -> Point2<f64> {
        self.position.xy()
    }

    /// Height above the datum
    pub fn z(&self) -> f64 {
        self.position.z
    }
}

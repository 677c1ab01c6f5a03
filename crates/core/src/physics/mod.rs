//! CALINE3 dispersion physics

pub mod dispersion;
pub(crate) mod erf;
pub mod link_element;
pub mod plume;
pub mod wind_flow;

pub use dispersion::DispersionCurves;
pub use erf::erf;
pub use link_element::{ElementProfile, LinkElement};
pub use plume::{concentration, Plume};
pub use wind_flow::WindFlow;

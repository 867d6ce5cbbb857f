pub mod aero;
pub mod atmosphere;
pub mod geodesy;
pub mod magfield;
pub mod rotation;
pub mod thrust;
pub mod weight;

pub use aero::{AeroCoefficients, AeroModel};
pub use geodesy::GeoOrigin;
pub use thrust::{FixedWingThrust, QuadThrust};
pub use weight::Weight;

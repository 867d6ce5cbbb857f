pub mod config;
pub mod dynamics;
pub mod hil;
pub mod physics;
pub mod sim;

pub use config::{ConfigError, DroneConfig};
pub use dynamics::state::{DerivVec, StateVec};
pub use hil::Drone;

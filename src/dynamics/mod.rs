pub mod actuators;
pub mod eom;
pub mod state;

pub use actuators::{Actuator, ActuatorBank};
pub use eom::MixedEom;
pub use state::{DerivVec, StateVec};

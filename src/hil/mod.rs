pub mod clock;
pub mod drone;
pub mod encoder;
pub mod environment;
pub mod relay;
pub mod tcp;

pub use clock::{Clock, LockstepClock};
pub use drone::Drone;
pub use encoder::StateEncoder;
pub use environment::{ConstantEnvironment, EnvironmentProvider};
pub use relay::{InboundHandle, MessageQueue, MessageRelay};
pub use tcp::TcpRelay;

/// MAVLink identity of the simulator on the autopilot link.
pub const SYSTEM_ID: u8 = 1;
pub const COMPONENT_ID: u8 = 1;

pub mod ground;
pub mod integrator;

pub use ground::GroundContact;
pub use integrator::rk4_step;

use std::f64::consts::{PI, TAU};

use nalgebra::{SVector, Vector3};

// ---------------------------------------------------------------------------
// Physical constants
// ---------------------------------------------------------------------------

/// Gravity used by the equations of motion and the ground corrector (m/s^2).
pub const G: f64 = 9.81;

/// Body-x velocity seeded at construction (m/s). The aerodynamic model is
/// singular at zero airspeed; starting with forward velocity keeps the first
/// derivative evaluations finite. The singularity itself is not fixed here.
pub const SEED_BODY_VELOCITY_X: f64 = 28.0;

// ---------------------------------------------------------------------------
// 12-component rigid-body state (NED conventions)
// ---------------------------------------------------------------------------

/// Rigid-body state:
///
/// | slots | meaning                                   |
/// |-------|-------------------------------------------|
/// | 0..3  | body-frame origin in earth NED (m)        |
/// | 3..6  | body-frame linear velocity (m/s)          |
/// | 6..9  | orientation as Euler roll/pitch/yaw (rad) |
/// | 9..12 | body-frame angular velocity (rad/s)       |
pub type StateVec = SVector<f64, 12>;

/// State derivative:
///
/// | slots | meaning                                   |
/// |-------|-------------------------------------------|
/// | 0..3  | earth-frame velocity (m/s)                |
/// | 3..6  | body-frame linear acceleration (m/s^2)    |
/// | 6..9  | Euler-angle rates (rad/s)                 |
/// | 9..12 | body-frame angular acceleration (rad/s^2) |
pub type DerivVec = SVector<f64, 12>;

pub const POSITION: usize = 0;
pub const VELOCITY: usize = 3;
pub const ATTITUDE: usize = 6;
pub const RATES: usize = 9;

/// Initial state: all zeros except the seeded forward velocity.
pub fn seeded() -> StateVec {
    let mut x = StateVec::zeros();
    x[VELOCITY] = SEED_BODY_VELOCITY_X;
    x
}

pub fn position(x: &StateVec) -> Vector3<f64> {
    x.fixed_rows::<3>(POSITION).into_owned()
}

pub fn velocity_body(x: &StateVec) -> Vector3<f64> {
    x.fixed_rows::<3>(VELOCITY).into_owned()
}

pub fn attitude(x: &StateVec) -> Vector3<f64> {
    x.fixed_rows::<3>(ATTITUDE).into_owned()
}

pub fn rates_body(x: &StateVec) -> Vector3<f64> {
    x.fixed_rows::<3>(RATES).into_owned()
}

/// Body-frame acceleration slice of a derivative vector.
pub fn accel_body(dx: &DerivVec) -> Vector3<f64> {
    dx.fixed_rows::<3>(VELOCITY).into_owned()
}

/// Earth-frame velocity slice of a derivative vector.
pub fn velocity_earth(dx: &DerivVec) -> Vector3<f64> {
    dx.fixed_rows::<3>(POSITION).into_owned()
}

/// Wrap the orientation slots into (-pi, pi].
pub fn wrap_angles(x: &mut StateVec) {
    for i in ATTITUDE..ATTITUDE + 3 {
        x[i] = wrap_pi(x[i]);
    }
}

fn wrap_pi(angle: f64) -> f64 {
    let mut a = angle % TAU;
    if a <= -PI {
        a += TAU;
    } else if a > PI {
        a -= TAU;
    }
    a
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

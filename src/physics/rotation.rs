use nalgebra::Matrix3;

use crate::dynamics::state::{attitude, velocity_body, StateVec};

// ---------------------------------------------------------------------------
// Frame rotations (ZYX Euler convention, NED frames)
// ---------------------------------------------------------------------------

/// Airspeed below which the wind frame is undefined.
pub const MIN_AIRSPEED: f64 = 1e-6;

/// Rotation taking body-frame vectors into the earth NED frame.
pub fn body2earth(x: &StateVec) -> Matrix3<f64> {
    let rpy = attitude(x);
    let (sr, cr) = rpy[0].sin_cos();
    let (sp, cp) = rpy[1].sin_cos();
    let (sy, cy) = rpy[2].sin_cos();

    Matrix3::new(
        cp * cy, sr * sp * cy - cr * sy, cr * sp * cy + sr * sy,
        cp * sy, sr * sp * sy + cr * cy, cr * sp * sy - sr * cy,
        -sp,     sr * cp,                cr * cp,
    )
}

/// Rotation taking earth NED vectors into the body frame.
pub fn earth2body(x: &StateVec) -> Matrix3<f64> {
    body2earth(x).transpose()
}

/// Rotation taking wind-frame vectors (x along the relative velocity) into
/// the body frame. Identity below [`MIN_AIRSPEED`], where the angle of
/// attack and sideslip are undefined.
pub fn wind2body(x: &StateVec) -> Matrix3<f64> {
    let v = velocity_body(x);
    let speed = v.norm();
    if speed < MIN_AIRSPEED {
        return Matrix3::identity();
    }
    let alpha = v[2].atan2(v[0]);
    let beta = (v[1] / speed).clamp(-1.0, 1.0).asin();
    let (sa, ca) = alpha.sin_cos();
    let (sb, cb) = beta.sin_cos();

    Matrix3::new(
        ca * cb, -ca * sb, -sa,
        sb,      cb,       0.0,
        sa * cb, -sa * sb, ca,
    )
}

/// Matrix mapping body angular rates to Euler-angle rates. Singular at
/// pitch = +-pi/2, inherent to the Euler parameterization.
pub fn euler_rates_matrix(x: &StateVec) -> Matrix3<f64> {
    let rpy = attitude(x);
    let (sr, cr) = rpy[0].sin_cos();
    let cp = rpy[1].cos();
    let tp = rpy[1].tan();

    Matrix3::new(
        1.0, sr * tp,  cr * tp,
        0.0, cr,       -sr,
        0.0, sr / cp,  cr / cp,
    )
}

/// Euler roll/pitch/yaw to a unit quaternion in (x, y, z, w) slot order.
/// The slot order is the wire ABI of the state-quaternion telemetry frame;
/// do not reorder.
pub fn euler_to_quaternion(roll: f64, pitch: f64, yaw: f64) -> [f32; 4] {
    let (sr, cr) = (roll / 2.0).sin_cos();
    let (sp, cp) = (pitch / 2.0).sin_cos();
    let (sy, cy) = (yaw / 2.0).sin_cos();

    [
        (sr * cp * cy - cr * sp * sy) as f32,
        (cr * sp * cy + sr * cp * sy) as f32,
        (cr * cp * sy - sr * sp * cy) as f32,
        (cr * cp * cy + sr * sp * sy) as f32,
    ]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

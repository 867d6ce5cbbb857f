use nalgebra::{Vector3, Vector4};

use crate::dynamics::state::StateVec;

// ---------------------------------------------------------------------------
// Fixed-wing propeller thrust
// ---------------------------------------------------------------------------

/// Single pusher/tractor propeller along body-x. The command arrives already
/// scaled to Newtons by its actuator descriptor.
#[derive(Debug, Clone)]
pub struct FixedWingThrust {
    arm: Vector3<f64>,
    f: Vector3<f64>,
    m: Vector3<f64>,
}

impl FixedWingThrust {
    /// `arm` is the moment arm from the body origin to the propeller hub (m).
    pub fn new(arm: Vector3<f64>) -> Self {
        Self {
            arm,
            f: Vector3::zeros(),
            m: Vector3::zeros(),
        }
    }

    pub fn update(&mut self, _t: f64, _x: &StateVec, thrust_n: f64) {
        self.f = Vector3::new(thrust_n, 0.0, 0.0);
        self.m = self.arm.cross(&self.f);
    }

    /// Force in the body frame (N).
    pub fn force(&self) -> Vector3<f64> {
        self.f
    }

    /// Moment about the body origin (N m).
    pub fn moment(&self) -> Vector3<f64> {
        self.m
    }
}

// ---------------------------------------------------------------------------
// Quad-rotor thrust
// ---------------------------------------------------------------------------

/// Four lift rotors in an X layout:
///
/// ```text
///   2(cw)   0(ccw)        body x forward, y right, z down
///       \   /             rotor arms at 45 degrees, length `arm`
///       /   \
///   1(ccw)  3(cw)
/// ```
///
/// Thrust per rotor is `b * u_i` along body-up; yaw comes from the
/// alternating reaction torque `c * u_i`.
#[derive(Debug, Clone)]
pub struct QuadThrust {
    b: f64,
    c: f64,
    arm: f64,
    f: Vector3<f64>,
    m: Vector3<f64>,
}

impl QuadThrust {
    pub fn new(b: f64, c: f64, arm: f64) -> Self {
        Self {
            b,
            c,
            arm,
            f: Vector3::zeros(),
            m: Vector3::zeros(),
        }
    }

    pub fn update(&mut self, _t: f64, _x: &StateVec, u: &Vector4<f64>) {
        let u = u.map(|v| v.max(0.0)); // rotors cannot push down
        let t = u * self.b;
        let a = self.arm / std::f64::consts::SQRT_2;

        self.f = Vector3::new(0.0, 0.0, -(t[0] + t[1] + t[2] + t[3]));
        self.m = Vector3::new(
            a * (-t[0] + t[1] + t[2] - t[3]),
            a * (t[0] - t[1] + t[2] - t[3]),
            self.c * (u[0] + u[1] - u[2] - u[3]),
        );
    }

    /// Net force in the body frame (N).
    pub fn force(&self) -> Vector3<f64> {
        self.f
    }

    /// Net moment about the body origin (N m).
    pub fn moment(&self) -> Vector3<f64> {
        self.m
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

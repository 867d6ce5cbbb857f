use crate::dynamics::eom::MixedEom;
use crate::dynamics::state::{
    accel_body, velocity_body, DerivVec, StateVec, ATTITUDE, RATES, VELOCITY, G,
};
use crate::physics::rotation::body2earth;

// ---------------------------------------------------------------------------
// Runway-plane ground contact
// ---------------------------------------------------------------------------

/// Contact tolerance below the ground plane (m).
pub const CONTACT_EPS: f64 = 1e-3;

/// Clamps the state at a flat runway: a vehicle at or below the plane that
/// is descending (or pinned) is snapped onto it with all motion and
/// orientation zeroed. It cannot fall through and cannot slide.
#[derive(Debug, Clone, Copy)]
pub struct GroundContact {
    pub z_ground: f64,
}

impl Default for GroundContact {
    fn default() -> Self {
        Self { z_ground: 0.0 }
    }
}

impl GroundContact {
    /// Apply the contact constraint after an integration step of `dt`
    /// seconds. Returns true when the state was clamped; clamping is the
    /// only transition that grounds the equations of motion.
    pub fn apply(
        &self,
        dt: f64,
        eom: &mut MixedEom,
        x: &mut StateVec,
        dx: &mut DerivVec,
    ) -> bool {
        let rot = body2earth(x);
        let v_earth = rot * velocity_body(x);
        let a_earth = rot * accel_body(dx);

        let touching = x[2] >= self.z_ground - CONTACT_EPS;
        let descending = v_earth[2] + a_earth[2] * dt >= 0.0;
        if !(touching && descending) {
            return false;
        }

        x[2] = self.z_ground;
        x.fixed_rows_mut::<3>(VELOCITY).fill(0.0);
        x.fixed_rows_mut::<3>(ATTITUDE).fill(0.0);
        x.fixed_rows_mut::<3>(RATES).fill(0.0);
        dx.fixed_rows_mut::<3>(VELOCITY).fill(0.0);
        dx[VELOCITY + 2] = G;
        eom.force_grounded();
        true
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

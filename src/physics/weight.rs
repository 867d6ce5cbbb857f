use nalgebra::Vector3;

use crate::dynamics::state::{StateVec, G};

// ---------------------------------------------------------------------------
// Weight force model
// ---------------------------------------------------------------------------

/// Constant weight along earth-frame down. The equations of motion rotate
/// the force into the body frame.
#[derive(Debug, Clone)]
pub struct Weight {
    mass: f64,
    f: Vector3<f64>,
}

impl Weight {
    pub fn new(mass: f64) -> Self {
        Self {
            mass,
            f: Vector3::new(0.0, 0.0, mass * G),
        }
    }

    /// Weight does not depend on time or state; the cache is set once.
    pub fn update(&mut self, _t: f64, _x: &StateVec) {}

    /// Force in the earth NED frame (N).
    pub fn force(&self) -> Vector3<f64> {
        self.f
    }

    /// Weight exerts no moment about the body origin.
    pub fn moment(&self) -> Vector3<f64> {
        Vector3::zeros()
    }

    pub fn mass(&self) -> f64 {
        self.mass
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weight_points_down_with_mg_magnitude() {
        let w = Weight::new(7.0);
        assert_eq!(w.force(), Vector3::new(0.0, 0.0, 7.0 * G));
        assert_eq!(w.moment(), Vector3::zeros());
        assert_eq!(w.mass(), 7.0);
    }
}

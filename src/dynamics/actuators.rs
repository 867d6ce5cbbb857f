use nalgebra::SVector;

use crate::config::ActuatorsConfig;

// ---------------------------------------------------------------------------
// Actuator command holders
// ---------------------------------------------------------------------------

/// Holder for the latest normalized command on an N-wide actuator channel.
///
/// `set_control` replaces the setpoint, `advance` moves the tracked value
/// toward it (first-order lag when the descriptor carries a time constant),
/// `control` reads the tracked value scaled to physical units. The tracked
/// value is deliberately frozen between `advance` calls so that every
/// derivative evaluation inside one integration step samples the same
/// command.
#[derive(Debug, Clone)]
pub struct Actuator<const N: usize> {
    target: SVector<f64, N>,
    value: SVector<f64, N>,
    scale: f64,
    tau: f64,
}

impl<const N: usize> Actuator<N> {
    pub fn new(scale: f64, tau: f64) -> Self {
        Self {
            target: SVector::zeros(),
            value: SVector::zeros(),
            scale,
            tau,
        }
    }

    /// Replace the normalized setpoint.
    pub fn set_control(&mut self, v: SVector<f64, N>) {
        self.target = v;
    }

    /// Advance the tracked value by `dt` seconds. A zero time constant
    /// tracks the setpoint exactly.
    pub fn advance(&mut self, dt: f64) {
        if self.tau <= 0.0 {
            self.value = self.target;
        } else {
            let k = (dt / self.tau).min(1.0);
            self.value += (self.target - self.value) * k;
        }
    }

    /// Current command scaled to physical units.
    pub fn control(&self) -> SVector<f64, N> {
        self.value * self.scale
    }
}

/// The three actuator channels of the airframe.
#[derive(Debug, Clone)]
pub struct ActuatorBank {
    pub thrust_propellers: Actuator<1>,
    pub ailerons: Actuator<2>,
    pub vtol_propellers: Actuator<4>,
}

impl ActuatorBank {
    pub fn new(config: &ActuatorsConfig) -> Self {
        Self {
            thrust_propellers: Actuator::new(
                config.thrust_propellers.scale,
                config.thrust_propellers.tau,
            ),
            ailerons: Actuator::new(config.ailerons.scale, config.ailerons.tau),
            vtol_propellers: Actuator::new(
                config.vtol_propellers.scale,
                config.vtol_propellers.tau,
            ),
        }
    }

    pub fn advance(&mut self, dt: f64) {
        self.thrust_propellers.advance(dt);
        self.ailerons.advance(dt);
        self.vtol_propellers.advance(dt);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::{Vector1, Vector2};

    #[test]
    fn zero_tau_tracks_exactly() {
        let mut a: Actuator<1> = Actuator::new(30.0, 0.0);
        a.set_control(Vector1::new(0.5));
        a.advance(0.01);
        assert_relative_eq!(a.control()[0], 15.0, epsilon = 1e-12);
    }

    #[test]
    fn lag_approaches_setpoint_monotonically() {
        let mut a: Actuator<1> = Actuator::new(1.0, 0.2);
        a.set_control(Vector1::new(1.0));
        let mut prev = 0.0;
        for _ in 0..100 {
            a.advance(0.01);
            let v = a.control()[0];
            assert!(v > prev && v <= 1.0);
            prev = v;
        }
        assert!(prev > 0.99, "lag should settle within five time constants");
    }

    #[test]
    fn value_frozen_until_advance() {
        let mut a: Actuator<2> = Actuator::new(1.0, 0.0);
        a.set_control(Vector2::new(0.3, -0.3));
        assert_eq!(a.control(), Vector2::zeros());
        a.advance(0.01);
        assert_eq!(a.control(), Vector2::new(0.3, -0.3));
    }

    #[test]
    fn large_step_does_not_overshoot() {
        let mut a: Actuator<1> = Actuator::new(1.0, 0.05);
        a.set_control(Vector1::new(1.0));
        a.advance(10.0); // dt >> tau
        assert_relative_eq!(a.control()[0], 1.0, epsilon = 1e-12);
    }
}

use nalgebra::{Vector2, Vector3};

use crate::dynamics::state::{rates_body, velocity_body, StateVec};

// ---------------------------------------------------------------------------
// Aerodynamic force/moment model
// ---------------------------------------------------------------------------

/// Sea-level air density, kg/m^3. The airframe operates low enough that the
/// density variation over its envelope is ignored.
const RHO: f64 = 1.225;

/// Airspeed below which the model reads zero. Angle of attack and sideslip
/// are undefined at rest; the grounded vehicle sits inside this band.
const MIN_AIRSPEED: f64 = 1e-3;

#[derive(Debug, Clone, Copy, Default)]
pub struct DragCoefficients {
    pub c_d_0: f64,
    pub c_d_alpha: f64,
    pub c_d_alpha2: f64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LiftCoefficients {
    pub c_l_0: f64,
    pub c_l_alpha: f64,
    pub c_l_q: f64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SideForceCoefficients {
    pub c_y_beta: f64,
    pub c_y_p: f64,
    pub c_y_r: f64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RollCoefficients {
    pub c_l_beta: f64,
    pub c_l_p: f64,
    pub c_l_r: f64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PitchCoefficients {
    pub c_m_0: f64,
    pub c_m_alpha: f64,
    pub c_m_q: f64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct YawCoefficients {
    pub c_n_beta: f64,
    pub c_n_p: f64,
    pub c_n_r: f64,
}

/// Control-surface derivatives. The two aileron channels act as flaperons:
/// the differential part steers roll/yaw, the collective part adds lift and
/// pitching moment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ControlCoefficients {
    pub c_l_deltae: f64,
    pub c_m_deltae: f64,
    pub c_l_deltaa: f64,
    pub c_n_deltaa: f64,
}

/// Dimensionless stability and control derivative tables.
#[derive(Debug, Clone, Copy, Default)]
pub struct AeroCoefficients {
    pub drag: DragCoefficients,
    pub lift: LiftCoefficients,
    pub side_force: SideForceCoefficients,
    pub roll: RollCoefficients,
    pub pitch: PitchCoefficients,
    pub yaw: YawCoefficients,
    pub control: ControlCoefficients,
}

/// Lift, drag and side force in the wind frame plus body-frame moments,
/// evaluated from body velocity, body rates and surface deflections.
#[derive(Debug, Clone)]
pub struct AeroModel {
    span: f64,
    area: f64,
    chord: f64,
    coef: AeroCoefficients,
    f: Vector3<f64>,
    m: Vector3<f64>,
}

impl AeroModel {
    pub fn new(span: f64, area: f64, coef: AeroCoefficients) -> Self {
        Self {
            span,
            area,
            chord: area / span, // mean chord
            coef,
            f: Vector3::zeros(),
            m: Vector3::zeros(),
        }
    }

    /// Refresh the cached force/moment. `surfaces` holds the two flaperon
    /// deflections (rad).
    pub fn update(&mut self, _t: f64, x: &StateVec, surfaces: &Vector2<f64>) {
        let v = velocity_body(x);
        let w = rates_body(x);
        let speed = v.norm();
        if speed < MIN_AIRSPEED {
            self.f = Vector3::zeros();
            self.m = Vector3::zeros();
            return;
        }

        let alpha = v[2].atan2(v[0]);
        let beta = (v[1] / speed).clamp(-1.0, 1.0).asin();
        let q_bar = 0.5 * RHO * speed * speed * self.area;

        // dimensionless rates
        let p_hat = self.span * w[0] / (2.0 * speed);
        let q_hat = self.chord * w[1] / (2.0 * speed);
        let r_hat = self.span * w[2] / (2.0 * speed);

        let delta_a = 0.5 * (surfaces[1] - surfaces[0]);
        let delta_e = 0.5 * (surfaces[0] + surfaces[1]);

        let c = &self.coef;
        let drag = q_bar
            * (c.drag.c_d_0 + c.drag.c_d_alpha * alpha + c.drag.c_d_alpha2 * alpha * alpha);
        let side = q_bar
            * (c.side_force.c_y_beta * beta
                + c.side_force.c_y_p * p_hat
                + c.side_force.c_y_r * r_hat);
        let lift = q_bar
            * (c.lift.c_l_0
                + c.lift.c_l_alpha * alpha
                + c.lift.c_l_q * q_hat
                + c.control.c_l_deltae * delta_e);

        self.f = Vector3::new(-drag, side, -lift);
        self.m = Vector3::new(
            q_bar
                * self.span
                * (c.roll.c_l_beta * beta
                    + c.roll.c_l_p * p_hat
                    + c.roll.c_l_r * r_hat
                    + c.control.c_l_deltaa * delta_a),
            q_bar
                * self.chord
                * (c.pitch.c_m_0
                    + c.pitch.c_m_alpha * alpha
                    + c.pitch.c_m_q * q_hat
                    + c.control.c_m_deltae * delta_e),
            q_bar
                * self.span
                * (c.yaw.c_n_beta * beta
                    + c.yaw.c_n_p * p_hat
                    + c.yaw.c_n_r * r_hat
                    + c.control.c_n_deltaa * delta_a),
        );
    }

    /// Force in the wind frame (N); rotate with `wind2body` before summing.
    pub fn force(&self) -> Vector3<f64> {
        self.f
    }

    /// Moment about the body origin (N m).
    pub fn moment(&self) -> Vector3<f64> {
        self.m
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamics::state::VELOCITY;
    use approx::assert_relative_eq;

    fn cruise_coefficients() -> AeroCoefficients {
        AeroCoefficients {
            drag: DragCoefficients { c_d_0: 0.04, c_d_alpha: 0.3, c_d_alpha2: 1.5 },
            lift: LiftCoefficients { c_l_0: 0.3, c_l_alpha: 5.5, c_l_q: 7.9 },
            side_force: SideForceCoefficients { c_y_beta: -0.8, ..Default::default() },
            roll: RollCoefficients { c_l_beta: -0.08, c_l_p: -0.45, c_l_r: 0.12 },
            pitch: PitchCoefficients { c_m_0: 0.02, c_m_alpha: -1.2, c_m_q: -12.0 },
            yaw: YawCoefficients { c_n_beta: 0.07, c_n_p: -0.03, c_n_r: -0.1 },
            control: ControlCoefficients {
                c_l_deltae: 0.45,
                c_m_deltae: -1.1,
                c_l_deltaa: 0.18,
                c_n_deltaa: -0.01,
            },
        }
    }

    fn cruising(speed: f64) -> StateVec {
        let mut x = StateVec::zeros();
        x[VELOCITY] = speed;
        x
    }

    #[test]
    fn zero_output_at_rest() {
        let mut model = AeroModel::new(2.1, 0.55, cruise_coefficients());
        model.update(0.0, &StateVec::zeros(), &Vector2::zeros());
        assert_eq!(model.force(), Vector3::zeros());
        assert_eq!(model.moment(), Vector3::zeros());
    }

    #[test]
    fn level_cruise_lifts_and_drags() {
        let mut model = AeroModel::new(2.1, 0.55, cruise_coefficients());
        model.update(0.0, &cruising(28.0), &Vector2::zeros());
        let f = model.force();
        assert!(f[0] < 0.0, "drag opposes the wind x axis");
        assert!(f[2] < 0.0, "lift points up in the wind frame");
        assert_eq!(f[1], 0.0);
    }

    #[test]
    fn lift_scales_with_dynamic_pressure() {
        let mut model = AeroModel::new(2.1, 0.55, cruise_coefficients());
        model.update(0.0, &cruising(14.0), &Vector2::zeros());
        let slow = -model.force()[2];
        model.update(0.0, &cruising(28.0), &Vector2::zeros());
        let fast = -model.force()[2];
        assert_relative_eq!(fast / slow, 4.0, epsilon = 1e-9);
    }

    #[test]
    fn differential_deflection_rolls() {
        let mut model = AeroModel::new(2.1, 0.55, cruise_coefficients());
        model.update(0.0, &cruising(28.0), &Vector2::new(-0.2, 0.2));
        assert!(model.moment()[0] > 0.0, "right-down deflection rolls right");
        model.update(0.0, &cruising(28.0), &Vector2::new(0.2, -0.2));
        assert!(model.moment()[0] < 0.0);
    }

    #[test]
    fn collective_deflection_pitches_down() {
        let mut model = AeroModel::new(2.1, 0.55, cruise_coefficients());
        model.update(0.0, &cruising(28.0), &Vector2::new(0.2, 0.2));
        let mut neutral = AeroModel::new(2.1, 0.55, cruise_coefficients());
        neutral.update(0.0, &cruising(28.0), &Vector2::zeros());
        assert!(model.moment()[1] < neutral.moment()[1]);
    }

    #[test]
    fn pitch_rate_damps() {
        let mut x = cruising(28.0);
        x[crate::dynamics::state::RATES + 1] = 1.0;
        let mut model = AeroModel::new(2.1, 0.55, cruise_coefficients());
        model.update(0.0, &x, &Vector2::zeros());
        let mut still = AeroModel::new(2.1, 0.55, cruise_coefficients());
        still.update(0.0, &cruising(28.0), &Vector2::zeros());
        assert!(model.moment()[1] < still.moment()[1], "positive q should reduce pitch moment");
    }
}

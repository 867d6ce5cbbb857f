use nalgebra::{Matrix3, Vector3};

use crate::config::{ConfigError, DroneConfig};
use crate::dynamics::actuators::ActuatorBank;
use crate::dynamics::state::{
    rates_body, velocity_body, DerivVec, StateVec, ATTITUDE, POSITION, RATES, VELOCITY,
};
use crate::physics::rotation::{body2earth, earth2body, euler_rates_matrix, wind2body};
use crate::physics::{AeroModel, FixedWingThrust, QuadThrust, Weight};

// ---------------------------------------------------------------------------
// Mixed quad/fixed-wing equations of motion
// ---------------------------------------------------------------------------

/// Assembles the four force/moment contributions into the state derivative.
///
/// The model runs in two regimes, keyed by the airborne flag: on the ground
/// only the aerodynamic and quad-rotor contributions act, so that neither
/// gravity nor fixed-wing drag can drag a parked vehicle along the runway.
/// The flag is raised here as soon as quad thrust can carry the weight and
/// is lowered only by the ground corrector.
#[derive(Debug, Clone)]
pub struct MixedEom {
    weight: Weight,
    aero: AeroModel,
    thrust_fw: FixedWingThrust,
    thrust_quad: QuadThrust,
    actuators: ActuatorBank,
    j: Matrix3<f64>,
    j_inv: Matrix3<f64>,
    airborne: bool,
}

impl MixedEom {
    pub fn new(config: &DroneConfig) -> Result<Self, ConfigError> {
        let j_inv = config.j.try_inverse().ok_or(ConfigError::SingularInertia)?;
        Ok(Self {
            weight: Weight::new(config.mass),
            aero: AeroModel::new(config.b_aero, config.s, config.aero),
            thrust_fw: FixedWingThrust::new(config.d),
            thrust_quad: QuadThrust::new(config.b_prop, config.c, config.l),
            actuators: ActuatorBank::new(&config.actuators),
            j: config.j,
            j_inv,
            airborne: false,
        })
    }

    pub fn airborne(&self) -> bool {
        self.airborne
    }

    /// The ground corrector is the only caller allowed to lower the flag.
    pub(crate) fn force_grounded(&mut self) {
        self.airborne = false;
    }

    pub fn actuators(&self) -> &ActuatorBank {
        &self.actuators
    }

    pub fn actuators_mut(&mut self) -> &mut ActuatorBank {
        &mut self.actuators
    }

    /// State derivative at `(t, x)` under the current actuator commands.
    pub fn evaluate(&mut self, t: f64, x: &StateVec) -> DerivVec {
        let vb = velocity_body(x);
        let wb = rates_body(x);

        let u_fw = self.actuators.thrust_propellers.control()[0];
        let u_ail = self.actuators.ailerons.control();
        let u_vtol = self.actuators.vtol_propellers.control();

        self.aero.update(t, x, &u_ail);
        self.thrust_quad.update(t, x, &u_vtol);
        if self.airborne {
            self.weight.update(t, x);
            self.thrust_fw.update(t, x, u_fw);
        }

        let f_weight = if self.airborne {
            earth2body(x) * self.weight.force()
        } else {
            Vector3::zeros()
        };
        let f_aero = wind2body(x) * self.aero.force();
        let f_fw = if self.airborne {
            self.thrust_fw.force()
        } else {
            Vector3::zeros()
        };
        let f_quad = self.thrust_quad.force();

        let m_aero = self.aero.moment();
        let m_fw = if self.airborne {
            self.thrust_fw.moment()
        } else {
            Vector3::zeros()
        };
        let m_quad = self.thrust_quad.moment();

        let mut dx = DerivVec::zeros();
        dx.fixed_rows_mut::<3>(POSITION)
            .copy_from(&(body2earth(x) * vb));
        dx.fixed_rows_mut::<3>(VELOCITY)
            .copy_from(&((f_fw + f_weight + f_aero + f_quad) / self.weight.mass()));
        dx.fixed_rows_mut::<3>(ATTITUDE)
            .copy_from(&(euler_rates_matrix(x) * wb));

        let torque = m_fw + m_aero + m_quad - wb.cross(&(self.j * wb));
        dx.fixed_rows_mut::<3>(RATES).copy_from(&(self.j_inv * torque));

        // Lift-off: quad thrust along body-down can carry the weight.
        if !self.airborne && f_quad[2].abs() >= self.weight.force()[2].abs() {
            self.airborne = true;
        }

        dx
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

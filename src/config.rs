use std::path::Path;
use std::str::SplitWhitespace;

use nalgebra::{Matrix3, Vector3};
use thiserror::Error;

use crate::physics::aero::{
    AeroCoefficients, ControlCoefficients, DragCoefficients, LiftCoefficients,
    PitchCoefficients, RollCoefficients, SideForceCoefficients, YawCoefficients,
};

// ---------------------------------------------------------------------------
// Airframe configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("unexpected end of config while reading {field}")]
    UnexpectedEof { field: &'static str },
    #[error("invalid value {token:?} for {field}")]
    InvalidValue { field: &'static str, token: String },
    #[error("inertia tensor is not invertible")]
    SingularInertia,
}

/// Scaling descriptor for one actuator channel: normalized command times
/// `scale` gives physical units, `tau` is an optional first-order lag time
/// constant in seconds (zero tracks instantly).
#[derive(Debug, Clone, Copy)]
pub struct ControllerDescriptor {
    pub scale: f64,
    pub tau: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct ActuatorsConfig {
    pub thrust_propellers: ControllerDescriptor,
    pub ailerons: ControllerDescriptor,
    pub vtol_propellers: ControllerDescriptor,
}

/// Immutable airframe description, loaded once at startup.
///
/// The file format is a plain whitespace-delimited token stream in this
/// order (comments are not supported):
///
/// ```text
/// mass
/// J                  row-major, 9 values
/// b_prop c           rotor thrust and reaction torque coefficients
/// b_aero S           wingspan and wing reference area
/// d                  fixed-wing thrust moment arm, 3 values
/// l                  quad rotor arm length
/// aero               drag 3, lift 3, side force 3, roll 3, pitch 3, yaw 3,
///                    control derivatives 4
/// controllers        three (scale, tau) pairs: thrust, ailerons, vtol
/// ```
#[derive(Debug, Clone)]
pub struct DroneConfig {
    pub mass: f64,
    pub j: Matrix3<f64>,
    pub b_prop: f64,
    pub c: f64,
    pub b_aero: f64,
    pub s: f64,
    pub d: Vector3<f64>,
    pub l: f64,
    pub aero: AeroCoefficients,
    pub actuators: ActuatorsConfig,
}

impl DroneConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let mut t = Tokens::new(text);

        let mass = t.value("mass")?;
        let j = t.matrix3("J")?;
        let b_prop = t.value("b_prop")?;
        let c = t.value("c")?;
        let b_aero = t.value("b_aero")?;
        let s = t.value("S")?;
        let d = t.vector3("d")?;
        let l = t.value("l")?;

        let aero = AeroCoefficients {
            drag: DragCoefficients {
                c_d_0: t.value("c_d_0")?,
                c_d_alpha: t.value("c_d_alpha")?,
                c_d_alpha2: t.value("c_d_alpha2")?,
            },
            lift: LiftCoefficients {
                c_l_0: t.value("c_l_0")?,
                c_l_alpha: t.value("c_l_alpha")?,
                c_l_q: t.value("c_l_q")?,
            },
            side_force: SideForceCoefficients {
                c_y_beta: t.value("c_y_beta")?,
                c_y_p: t.value("c_y_p")?,
                c_y_r: t.value("c_y_r")?,
            },
            roll: RollCoefficients {
                c_l_beta: t.value("c_l_beta")?,
                c_l_p: t.value("c_l_p")?,
                c_l_r: t.value("c_l_r")?,
            },
            pitch: PitchCoefficients {
                c_m_0: t.value("c_m_0")?,
                c_m_alpha: t.value("c_m_alpha")?,
                c_m_q: t.value("c_m_q")?,
            },
            yaw: YawCoefficients {
                c_n_beta: t.value("c_n_beta")?,
                c_n_p: t.value("c_n_p")?,
                c_n_r: t.value("c_n_r")?,
            },
            control: ControlCoefficients {
                c_l_deltae: t.value("c_l_deltae")?,
                c_m_deltae: t.value("c_m_deltae")?,
                c_l_deltaa: t.value("c_l_deltaa")?,
                c_n_deltaa: t.value("c_n_deltaa")?,
            },
        };

        let actuators = ActuatorsConfig {
            thrust_propellers: t.descriptor("thrust_propellers")?,
            ailerons: t.descriptor("ailerons")?,
            vtol_propellers: t.descriptor("vtol_propellers")?,
        };

        Ok(Self {
            mass,
            j,
            b_prop,
            c,
            b_aero,
            s,
            d,
            l,
            aero,
            actuators,
        })
    }
}

// ---------------------------------------------------------------------------
// Token stream
// ---------------------------------------------------------------------------

struct Tokens<'a> {
    iter: SplitWhitespace<'a>,
}

impl<'a> Tokens<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            iter: text.split_whitespace(),
        }
    }

    fn value(&mut self, field: &'static str) -> Result<f64, ConfigError> {
        let token = self
            .iter
            .next()
            .ok_or(ConfigError::UnexpectedEof { field })?;
        token.parse().map_err(|_| ConfigError::InvalidValue {
            field,
            token: token.to_string(),
        })
    }

    fn vector3(&mut self, field: &'static str) -> Result<Vector3<f64>, ConfigError> {
        Ok(Vector3::new(
            self.value(field)?,
            self.value(field)?,
            self.value(field)?,
        ))
    }

    fn matrix3(&mut self, field: &'static str) -> Result<Matrix3<f64>, ConfigError> {
        let mut values = [0.0; 9];
        for v in values.iter_mut() {
            *v = self.value(field)?;
        }
        Ok(Matrix3::from_row_slice(&values))
    }

    fn descriptor(&mut self, field: &'static str) -> Result<ControllerDescriptor, ConfigError> {
        Ok(ControllerDescriptor {
            scale: self.value(field)?,
            tau: self.value(field)?,
        })
    }
}

/// A small electric quadplane, shared by the unit tests.
#[cfg(test)]
pub(crate) fn test_config() -> DroneConfig {
    DroneConfig::parse(SAMPLE).expect("sample config parses")
}

#[cfg(test)]
pub(crate) const SAMPLE: &str = "
7.0
0.6 0.0 0.0
0.0 0.8 0.0
0.0 0.0 1.2
22.0 0.4
2.1 0.55
-0.4 0.0 -0.05
0.45
0.04 0.3 1.5
0.3 5.5 7.9
-0.8 0.0 0.0
-0.08 -0.45 0.12
0.02 -1.2 -12.0
0.07 -0.03 -0.1
0.45 -1.1 0.18 -0.01
30.0 0.0
0.35 0.0
1.0 0.0
";

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

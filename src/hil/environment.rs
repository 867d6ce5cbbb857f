use nalgebra::Vector3;

// ---------------------------------------------------------------------------
// Environment
// ---------------------------------------------------------------------------

/// Ambient conditions sampled by the sensor encoder.
pub trait EnvironmentProvider {
    /// Wind over the ground in the earth NED frame (m/s).
    fn environment_wind(&self) -> Vector3<f64>;
    /// Outside air temperature (degrees C).
    fn temperature(&self) -> f32;
}

/// Fixed conditions: calm air at a configurable temperature.
#[derive(Debug, Clone, Copy)]
pub struct ConstantEnvironment {
    pub wind: Vector3<f64>,
    pub temperature_c: f32,
}

impl Default for ConstantEnvironment {
    fn default() -> Self {
        Self {
            wind: Vector3::zeros(),
            temperature_c: 25.0,
        }
    }
}

impl EnvironmentProvider for ConstantEnvironment {
    fn environment_wind(&self) -> Vector3<f64> {
        self.wind
    }

    fn temperature(&self) -> f32 {
        self.temperature_c
    }
}

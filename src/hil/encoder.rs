use std::f64::consts::PI;
use std::time::{SystemTime, UNIX_EPOCH};

use mavlink::common::{
    HilSensorUpdatedFlags, MavMessage, HIL_GPS_DATA, HIL_SENSOR_DATA, HIL_STATE_QUATERNION_DATA,
    SYSTEM_TIME_DATA,
};
use nalgebra::Vector3;

use crate::dynamics::state::{position, velocity_body, DerivVec, StateVec, ATTITUDE, G, RATES};
use crate::physics::atmosphere::alt_to_baro;
use crate::physics::geodesy::GeoOrigin;
use crate::physics::magfield::field_for_latlonalt;
use crate::physics::rotation::{body2earth, euler_to_quaternion};

// ---------------------------------------------------------------------------
// Sensor encoder
// ---------------------------------------------------------------------------

/// Body-z accelerations inside this band read as the zeroed fake-ground
/// value and are replaced by -1 g so the autopilot sees a resting IMU.
const FAKE_GROUND_ACC_EPS: f64 = 1e-4;

/// Bitmask naming the accelerometer, gyro, magnetometer and pressure fields
/// as freshly updated.
const FIELDS_UPDATED: HilSensorUpdatedFlags = HilSensorUpdatedFlags::from_bits_truncate(
    0b111 | 0b111000 | 0b111000000 | 0b1111000000000,
);

// GPS quality placeholders (centi-units)
const GPS_EPH: u16 = 30;
const GPS_EPV: u16 = 40;

/// Projects the simulated state into the sensor frames the autopilot
/// consumes. Every conversion here is wire ABI; field scalings and slot
/// orderings must not drift.
#[derive(Debug, Clone, Default)]
pub struct StateEncoder {
    origin: GeoOrigin,
}

impl StateEncoder {
    pub fn new(origin: GeoOrigin) -> Self {
        Self { origin }
    }

    pub fn hil_state_quaternion(
        &self,
        t_us: u64,
        x: &StateVec,
        dx: &DerivVec,
        wind: &Vector3<f64>,
    ) -> MavMessage {
        let lla = self.lat_lon_alt(x);
        let gs = ground_speed_cm(dx);
        let acc = body_accel(dx);
        let wind_speed = true_wind_speed_cm(dx, wind);

        MavMessage::HIL_STATE_QUATERNION(HIL_STATE_QUATERNION_DATA {
            time_usec: t_us,
            attitude_quaternion: euler_to_quaternion(x[ATTITUDE], x[ATTITUDE + 1], x[ATTITUDE + 2]),
            rollspeed: x[RATES] as f32,
            pitchspeed: x[RATES + 1] as f32,
            yawspeed: x[RATES + 2] as f32,
            lat: lla[0],
            lon: lla[1],
            alt: lla[2],
            vx: gs[0],
            vy: gs[1],
            vz: gs[2],
            ind_airspeed: wind_speed,
            true_airspeed: wind_speed,
            xacc: milli_g(acc[0]),
            yacc: milli_g(acc[1]),
            zacc: milli_g(acc[2]),
        })
    }

    pub fn hil_sensor(
        &self,
        t_us: u64,
        x: &StateVec,
        dx: &DerivVec,
        temperature: f32,
    ) -> MavMessage {
        let lla = self.lat_lon_alt(x);
        let acc = body_accel(dx);
        let mag = field_for_latlonalt(&lla);
        let abs_pressure = alt_to_baro(lla[2] as f64 / 1000.0) / 100.0; // Pa -> hPa

        MavMessage::HIL_SENSOR(HIL_SENSOR_DATA {
            time_usec: t_us,
            xacc: acc[0] as f32,
            yacc: acc[1] as f32,
            zacc: acc[2] as f32,
            xgyro: x[RATES] as f32,
            ygyro: x[RATES + 1] as f32,
            zgyro: x[RATES + 2] as f32,
            xmag: mag[0] as f32,
            ymag: mag[1] as f32,
            zmag: mag[2] as f32,
            abs_pressure: abs_pressure as f32,
            diff_pressure: 0.0,
            pressure_alt: lla[2] as f32,
            temperature,
            fields_updated: FIELDS_UPDATED,
            id: 0,
        })
    }

    pub fn hil_gps(&self, t_us: u64, x: &StateVec, dx: &DerivVec) -> MavMessage {
        let lla = self.lat_lon_alt(x);
        let gs = ground_speed_cm(dx);
        let vel_ned = earth_velocity_cm(x);
        let ground_speed =
            ((gs[0] as f64).powi(2) + (gs[1] as f64).powi(2)).sqrt() as u16;

        MavMessage::HIL_GPS(HIL_GPS_DATA {
            time_usec: t_us,
            // lat and lon are deliberately cross-assigned; the autopilot
            // side of this link expects exactly this packing.
            lat: lla[1],
            lon: lla[0],
            alt: lla[2],
            eph: GPS_EPH,
            epv: GPS_EPV,
            vel: ground_speed,
            vn: vel_ned[0],
            ve: vel_ned[1],
            vd: vel_ned[2],
            cog: course_over_ground_cdeg(x),
            fix_type: 3,
            satellites_visible: u8::MAX,
            id: 0,
            yaw: vehicle_yaw_cdeg(x),
        })
    }

    pub fn system_time(&self, t_us: u64) -> MavMessage {
        let wall = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();

        MavMessage::SYSTEM_TIME(SYSTEM_TIME_DATA {
            time_unix_usec: wall.as_micros() as u64,
            time_boot_ms: (t_us / 1000) as u32,
        })
    }

    /// Position as (degE7, degE7, mm) fixed-point geodesy.
    fn lat_lon_alt(&self, x: &StateVec) -> [i32; 3] {
        let (lat, lon, alt) = self.origin.ned_to_lla(&position(x));
        [
            (lat * 1e7) as i32,
            (lon * 1e7) as i32,
            (alt * 1000.0) as i32,
        ]
    }
}

// ---------------------------------------------------------------------------
// Field conversions
// ---------------------------------------------------------------------------

/// Earth-frame ground speed (cm/s).
fn ground_speed_cm(dx: &DerivVec) -> [i16; 3] {
    [
        (dx[0] * 100.0) as i16,
        (dx[1] * 100.0) as i16,
        (dx[2] * 100.0) as i16,
    ]
}

/// Body-frame acceleration (m/s^2) with the fake-ground substitution: the
/// ground corrector zeroes the vertical channel, which a real IMU at rest
/// would report as -1 g.
fn body_accel(dx: &DerivVec) -> [f64; 3] {
    let mut acc = [dx[3], dx[4], dx[5]];
    if acc[2].abs() < FAKE_GROUND_ACC_EPS {
        acc[2] = -G;
    }
    acc
}

fn milli_g(acc: f64) -> i16 {
    (acc / G * 1000.0).round() as i16
}

/// Magnitude of the apparent wind: ground speed plus ambient wind, negated
/// (cm/s).
fn true_wind_speed_cm(dx: &DerivVec, wind: &Vector3<f64>) -> u16 {
    let gs = ground_speed_cm(dx);
    let gs = Vector3::new(gs[0] as f64, gs[1] as f64, gs[2] as f64);
    ((gs + wind * 100.0) * -1.0).norm() as u16
}

/// Earth-frame velocity (cm/s).
fn earth_velocity_cm(x: &StateVec) -> [i16; 3] {
    let v = body2earth(x) * velocity_body(x) * 100.0;
    [v[0] as i16, v[1] as i16, v[2] as i16]
}

/// Course over ground (cdeg). Kept on the body-frame velocity slots with
/// north in the numerator; the autopilot end is calibrated against this
/// exact convention.
fn course_over_ground_cdeg(x: &StateVec) -> u16 {
    let cdeg = x[3].atan2(x[4]).to_degrees() * 100.0;
    cdeg as i32 as u16
}

/// Yaw against true north (cdeg). Zero is reserved for "unknown" on the
/// wire, so a true-north heading reads as 1.
fn vehicle_yaw_cdeg(x: &StateVec) -> u16 {
    let yaw = ((x[ATTITUDE + 2] * 18_000.0 / PI).round() as i32) as u16;
    if yaw == 0 {
        1
    } else {
        yaw
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

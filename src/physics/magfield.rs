use nalgebra::Vector3;

// ---------------------------------------------------------------------------
// Geomagnetic field lookup
// ---------------------------------------------------------------------------
//
// Coarse world-model grid of declination, inclination and total intensity,
// bilinearly interpolated. The altitude dependence of the field over the
// simulated envelope is below the resolution of this table and is ignored.

const LAT_MIN: f64 = -60.0;
const LAT_STEP: f64 = 30.0;
const LON_MIN: f64 = -180.0;
const LON_STEP: f64 = 90.0;

/// Declination, degrees east of true north. Rows run south to north.
const DECLINATION: [[f64; 5]; 5] = [
    [30.0, 15.0, -25.0, -60.0, 30.0],
    [12.0, 0.0, -15.0, -35.0, 12.0],
    [9.0, -3.0, -5.0, -3.0, 9.0],
    [7.0, -3.0, 1.0, 2.0, 7.0],
    [2.0, -20.0, 2.0, 12.0, 2.0],
];

/// Inclination, degrees below horizontal.
const INCLINATION: [[f64; 5]; 5] = [
    [-70.0, -55.0, -65.0, -75.0, -70.0],
    [-40.0, -30.0, -55.0, -65.0, -40.0],
    [10.0, 20.0, -10.0, -30.0, 10.0],
    [55.0, 60.0, 44.0, 40.0, 55.0],
    [70.0, 80.0, 73.0, 75.0, 70.0],
];

/// Total intensity, gauss.
const STRENGTH: [[f64; 5]; 5] = [
    [0.60, 0.45, 0.35, 0.60, 0.60],
    [0.45, 0.25, 0.28, 0.50, 0.45],
    [0.35, 0.32, 0.32, 0.40, 0.35],
    [0.45, 0.47, 0.42, 0.48, 0.45],
    [0.55, 0.58, 0.52, 0.60, 0.55],
];

/// Earth-frame NED magnetic field vector (gauss) at a geodetic position.
/// `lat_lon_alt` carries (degE7, degE7, mm) fixed-point geodesy.
pub fn field_for_latlonalt(lat_lon_alt: &[i32; 3]) -> Vector3<f64> {
    let lat = lat_lon_alt[0] as f64 / 1e7;
    let lon = lat_lon_alt[1] as f64 / 1e7;

    let decl = bilinear(&DECLINATION, lat, lon).to_radians();
    let incl = bilinear(&INCLINATION, lat, lon).to_radians();
    let f = bilinear(&STRENGTH, lat, lon);

    let horizontal = f * incl.cos();
    Vector3::new(
        horizontal * decl.cos(),
        horizontal * decl.sin(),
        f * incl.sin(),
    )
}

fn bilinear(table: &[[f64; 5]; 5], lat: f64, lon: f64) -> f64 {
    let r = ((lat - LAT_MIN) / LAT_STEP).clamp(0.0, 4.0);
    let c = ((lon - LON_MIN) / LON_STEP).clamp(0.0, 4.0);
    let r0 = (r.floor() as usize).min(3);
    let c0 = (c.floor() as usize).min(3);
    let fr = r - r0 as f64;
    let fc = c - c0 as f64;

    let top = table[r0][c0] * (1.0 - fc) + table[r0][c0 + 1] * fc;
    let bottom = table[r0 + 1][c0] * (1.0 - fc) + table[r0 + 1][c0 + 1] * fc;
    top * (1.0 - fr) + bottom * fr
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn lla(lat_deg: f64, lon_deg: f64) -> [i32; 3] {
        [(lat_deg * 1e7) as i32, (lon_deg * 1e7) as i32, 0]
    }

    #[test]
    fn northern_field_dips_down() {
        let b = field_for_latlonalt(&lla(49.766809, -7.5571598));
        assert!(b[2] > 0.0, "down component should be positive in the north");
        assert!(b[0] > 0.0, "north component should be positive");
    }

    #[test]
    fn southern_field_dips_up() {
        let b = field_for_latlonalt(&lla(-45.0, 20.0));
        assert!(b[2] < 0.0, "down component should be negative in the south");
    }

    #[test]
    fn magnitude_within_earth_range() {
        for &(lat, lon) in &[(60.0, 0.0), (0.0, 100.0), (-30.0, -60.0), (49.8, -7.6)] {
            let b = field_for_latlonalt(&lla(lat, lon));
            let f = b.norm();
            assert!((0.2..0.7).contains(&f), "|B| = {} at ({}, {})", f, lat, lon);
        }
    }

    #[test]
    fn clamps_outside_grid() {
        let polar = field_for_latlonalt(&lla(89.0, 10.0));
        let edge = field_for_latlonalt(&lla(60.0, 10.0));
        assert_eq!(polar, edge);
    }
}

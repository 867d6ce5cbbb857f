use nalgebra::Vector3;

// ---------------------------------------------------------------------------
// Flat-earth geodesy about a fixed origin
// ---------------------------------------------------------------------------

/// Spherical earth radius, m.
pub const EARTH_RADIUS: f64 = 6_371_000.0;

// UK grid origin
pub const ORIGIN_LAT: f64 = 49.766809;
pub const ORIGIN_LON: f64 = -7.5571598;

/// Geodetic anchor for the NED frame origin.
#[derive(Debug, Clone, Copy)]
pub struct GeoOrigin {
    pub lat_deg: f64,
    pub lon_deg: f64,
}

impl Default for GeoOrigin {
    fn default() -> Self {
        Self {
            lat_deg: ORIGIN_LAT,
            lon_deg: ORIGIN_LON,
        }
    }
}

impl GeoOrigin {
    /// Project an NED position (m) onto geodetic (lat deg, lon deg, alt m).
    ///
    /// Small-angle flat-earth projection: meridional arcs scale with the
    /// earth radius, east arcs with the radius shrunk by cos(origin lat),
    /// altitude is the negated down component.
    pub fn ned_to_lla(&self, ned: &Vector3<f64>) -> (f64, f64, f64) {
        let lat = self.lat_deg + (ned[0] / EARTH_RADIUS).to_degrees();
        let lon = self.lon_deg
            + (ned[1] / (EARTH_RADIUS * self.lat_deg.to_radians().cos())).to_degrees();
        (lat, lon, -ned[2])
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn origin_maps_to_itself() {
        let origin = GeoOrigin::default();
        let (lat, lon, alt) = origin.ned_to_lla(&Vector3::zeros());
        assert_eq!(lat, ORIGIN_LAT);
        assert_eq!(lon, ORIGIN_LON);
        assert_eq!(alt, 0.0);
    }

    #[test]
    fn one_kilometre_north() {
        let origin = GeoOrigin::default();
        let (lat, lon, _) = origin.ned_to_lla(&Vector3::new(1_000.0, 0.0, 0.0));
        // ~8.99e-3 degrees of latitude per km on a 6371 km sphere
        assert_relative_eq!(lat - ORIGIN_LAT, 0.008_993, epsilon = 1e-5);
        assert_eq!(lon, ORIGIN_LON);
    }

    #[test]
    fn east_arc_stretches_with_latitude() {
        let origin = GeoOrigin::default();
        let (_, lon, _) = origin.ned_to_lla(&Vector3::new(0.0, 1_000.0, 0.0));
        let dlon = lon - ORIGIN_LON;
        // at ~49.8 deg north a kilometre spans more longitude than latitude
        assert!(dlon > 0.008_993);
    }

    #[test]
    fn altitude_is_negated_down() {
        let origin = GeoOrigin::default();
        let (_, _, alt) = origin.ned_to_lla(&Vector3::new(0.0, 0.0, -120.0));
        assert_eq!(alt, 120.0);
    }
}

// ---------------------------------------------------------------------------
// Barometric altitude-to-pressure model
// ---------------------------------------------------------------------------

const P_B: f64 = 101_325.0; // static pressure at sea level, Pa
const T_B: f64 = 288.15; // standard temperature at sea level, K
const L_B: f64 = -0.0065; // temperature lapse rate, K/m
const M_AIR: f64 = 0.028_964_4; // molar mass of dry air, kg/mol
const G_STD: f64 = 9.806_65; // standard gravity, m/s^2
const R_GAS: f64 = 8.314_32; // universal gas constant, J/(mol K)

/// Barometric pressure (Pa) at a geometric altitude (m).
///
/// Troposphere uses the lapse-rate form, the layer up to 20 km decays
/// exponentially from the 11 km anchor, anything above reads zero.
pub fn alt_to_baro(alt: f64) -> f64 {
    if alt <= 11_000.0 {
        P_B * (T_B / (T_B + L_B * alt)).powf((G_STD * M_AIR) / (R_GAS * L_B))
    } else if alt <= 20_000.0 {
        let p11 = alt_to_baro(11_000.0);
        let t11 = T_B + 11_000.0 * L_B;
        p11 * ((-G_STD * M_AIR * (alt - 11_000.0)) / (R_GAS * t11)).exp()
    } else {
        0.0
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

use crate::dynamics::state::{DerivVec, StateVec};

// ---------------------------------------------------------------------------
// Fixed-step RK4 over the 12-vector
// ---------------------------------------------------------------------------

/// Advance `x` by one RK4 step of size `h` starting at time `t`.
///
/// Returns the final stage derivative, which doubles as the tick's published
/// acceleration/velocity readout. All stage vectors live on the stack; the
/// stepper performs no allocation.
pub fn rk4_step<F>(deriv: &mut F, t: f64, h: f64, x: &mut StateVec) -> DerivVec
where
    F: FnMut(f64, &StateVec) -> DerivVec,
{
    let k1 = deriv(t, x);
    let k2 = deriv(t + 0.5 * h, &(*x + k1 * (0.5 * h)));
    let k3 = deriv(t + 0.5 * h, &(*x + k2 * (0.5 * h)));
    let k4 = deriv(t + h, &(*x + k3 * h));

    *x += (k1 + k2 * 2.0 + k3 * 2.0 + k4) * (h / 6.0);
    k4
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Cent rounding applied to every monetary figure at the point of emission.

/// Round to 2 decimal places, half away from zero.
///
/// Accumulation inside the engine stays unrounded; only output records pass
/// through here.
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

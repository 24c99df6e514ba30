//! Linear temperature-to-duty-cycle mapping
//!
//! The control law is a single linear remap of one range onto another; the
//! hardware rail clamp is applied separately by the caller.

/// Map `x` from the range `[in_min, in_max]` onto `[out_min, out_max]`.
///
/// The mapping is an unclamped straight line: inputs outside the domain
/// extrapolate beyond the output range, which the caller relies on to
/// drive the start/stop hysteresis below `out_min`.
///
/// Callers must guarantee `in_min != in_max`; a zero-width domain has no
/// defined slope. Configuration validation enforces this before any fan
/// reaches the control path.
pub fn map_range(x: f64, in_min: f64, in_max: f64, out_min: f64, out_max: f64) -> f64 {
    debug_assert!(
        (in_max - in_min).abs() > f64::EPSILON,
        "map_range requires a non-empty input domain"
    );
    (x - in_min) * (out_max - out_min) / (in_max - in_min) + out_min
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_midpoint() {
        // 50C in [30, 70] onto [80, 255]
        let y = map_range(50.0, 30.0, 70.0, 80.0, 255.0);
        assert!((y - 167.5).abs() < 1e-9);
    }

    #[test]
    fn maps_domain_endpoints_to_range_endpoints() {
        assert!((map_range(30.0, 30.0, 70.0, 80.0, 255.0) - 80.0).abs() < 1e-9);
        assert!((map_range(70.0, 30.0, 70.0, 80.0, 255.0) - 255.0).abs() < 1e-9);
    }

    #[test]
    fn extrapolates_below_domain() {
        // Below the domain the line continues under out_min
        let y = map_range(20.0, 30.0, 70.0, 80.0, 255.0);
        assert!(y < 80.0);
        assert!((y - 36.25).abs() < 1e-9);
    }

    #[test]
    fn extrapolates_above_domain() {
        let y = map_range(90.0, 30.0, 70.0, 80.0, 255.0);
        assert!((y - 342.5).abs() < 1e-9);
    }

    #[test]
    fn handles_inverted_output_range() {
        // Output ranges may run downhill; the line just has negative slope
        let y = map_range(25.0, 0.0, 100.0, 100.0, 0.0);
        assert!((y - 75.0).abs() < 1e-9);
    }
}

//! Per-fan configuration and run/stop state
//!
//! A [`Fan`] holds the static mapping parameters for one physical fan plus
//! the single piece of mutable state the control path maintains: whether the
//! fan is currently stopped. Everything else is fixed at construction from
//! configuration and lives for the process lifetime.

/// One configured fan.
///
/// # Fields
///
/// - `min_temp` / `max_temp` bound the mapping domain in millidegrees
///   (the raw unit hwmon sensors report). Configuration validation
///   guarantees `min_temp < max_temp`.
/// - `min_pwm` / `max_pwm` are the hardware safety rail: the final duty
///   cycle is clamped into this range (or forced to exactly 0 when the
///   fan is stopped).
/// - `start_pwm` is both the lower bound of the mapping's output range and
///   the threshold a stopped fan must reach to spin up.
/// - `stop_pwm` is the threshold at or below which a running fan is shut
///   off. Normally `stop_pwm <= start_pwm`; the gap is the hysteresis band.
#[derive(Debug, Clone)]
pub struct Fan {
    pub name: String,
    pub min_temp: i32,
    pub max_temp: i32,
    pub min_pwm: u8,
    pub max_pwm: u8,
    pub start_pwm: u8,
    pub stop_pwm: u8,
    /// Run/stop state. Starts `false` (assumed running); the first cycle
    /// self-corrects from the measured temperature.
    pub stopped: bool,
}

impl Fan {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: String,
        min_temp: i32,
        max_temp: i32,
        min_pwm: u8,
        max_pwm: u8,
        start_pwm: u8,
        stop_pwm: u8,
    ) -> Self {
        Self {
            name,
            min_temp,
            max_temp,
            min_pwm,
            max_pwm,
            start_pwm,
            stop_pwm,
            stopped: false,
        }
    }
}

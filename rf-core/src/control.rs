//! One polling cycle for a single fan
//!
//! Sample the temperature, map it to a duty cycle, apply start/stop
//! hysteresis, write the result, and verify it took effect.
//!
//! # State machine
//!
//! | State   | Condition        | Action   | Next state |
//! |---------|------------------|----------|------------|
//! | Stopped | pwm < start_pwm  | pwm := 0 | Stopped    |
//! | Stopped | pwm >= start_pwm | keep pwm | Running    |
//! | Running | pwm <= stop_pwm  | pwm := 0 | Stopped    |
//! | Running | pwm > stop_pwm   | keep pwm | Running    |
//!
//! The boundary checks are asymmetric: a stopped fan starts the
//! moment the computed duty cycle reaches `start_pwm`, and a running fan
//! stops the moment it falls to `stop_pwm`, so a fan idling exactly at a
//! threshold does not flip state every poll.
//!
//! # Failure policy
//!
//! Nothing here is retried. Unparseable sensor text, a failed write, and a
//! readback that disagrees with the commanded value all fail the cycle, and
//! the caller treats any cycle failure as fatal for the daemon: an actuator
//! whose state cannot be verified is a thermal risk, not something to limp
//! along with.

use tracing::{debug, info};

use rf_error::{RefanError, Result};

use crate::curve::map_range;
use crate::fan::Fan;
use crate::port::FanPort;

/// Divisor from raw sensor units (millidegrees) to degrees.
const MILLIDEGREE_DIVISOR: f64 = 1000.0;

/// Run one control cycle for `fan` over `port`.
///
/// Returns the duty cycle actually applied (0 when the fan is held stopped).
pub fn run_cycle<P: FanPort>(fan: &mut Fan, port: &mut P) -> Result<u8> {
    let raw = port.read_temperature()?;
    let temp_c = parse_temperature(fan, &raw)?;

    // The unclamped curve starts at start_pwm, not min_pwm: below the
    // mapping domain it extrapolates under the start threshold, which is
    // what drives the hysteresis. The min/max clamp is the hardware rail.
    let mapped = map_range(
        temp_c,
        f64::from(fan.min_temp) / MILLIDEGREE_DIVISOR,
        f64::from(fan.max_temp) / MILLIDEGREE_DIVISOR,
        f64::from(fan.start_pwm),
        f64::from(fan.max_pwm),
    );
    let mut pwm = mapped
        .round()
        .clamp(f64::from(fan.min_pwm), f64::from(fan.max_pwm)) as u8;

    if fan.stopped {
        if pwm < fan.start_pwm {
            pwm = 0;
        } else {
            fan.stopped = false;
            info!(fan = %fan.name, pwm, temp_c, "fan starting");
        }
    } else if pwm <= fan.stop_pwm {
        pwm = 0;
        fan.stopped = true;
        info!(fan = %fan.name, temp_c, "fan stopping");
    }

    port.write_duty_cycle(pwm)?;

    let back = port.read_duty_cycle()?;
    let read = back
        .trim()
        .parse::<u8>()
        .map_err(|_| RefanError::ReadbackParse {
            fan: fan.name.clone(),
            text: back.trim().to_string(),
        })?;
    if read != pwm {
        return Err(RefanError::VerifyMismatch {
            fan: fan.name.clone(),
            wrote: pwm,
            read,
        });
    }

    debug!(
        fan = %fan.name,
        temp_c,
        pwm,
        start_pwm = fan.start_pwm,
        stop_pwm = fan.stop_pwm,
        stopped = fan.stopped,
        "cycle complete"
    );

    Ok(pwm)
}

/// Parse a raw millidegree reading into degrees.
///
/// Garbage or non-finite sensor text fails the cycle instead of being
/// coerced to 0: a silent zero would spin the fans down on a broken sensor.
fn parse_temperature(fan: &Fan, raw: &str) -> Result<f64> {
    let millidegrees = raw
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| RefanError::SensorParse {
            fan: fan.name.clone(),
            text: raw.trim().to_string(),
        })?;
    Ok(millidegrees / MILLIDEGREE_DIVISOR)
}

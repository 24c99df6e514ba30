//! The polling loop
//!
//! Switches every fan to manual control, then forever: run one cycle per
//! fan in configuration order, sleep, repeat. The loop only returns on a
//! cycle failure, which the caller treats as fatal for the process - an
//! actuator that stopped taking verified writes must not be left running
//! under stale manual control.

use std::thread;
use std::time::Duration;

use tracing::info;

use rf_core::{run_cycle, FanPort, PwmMode};
use rf_error::Result;

use crate::config::FanUnit;

pub fn run(units: &mut [FanUnit], interval: Duration) -> Result<()> {
    for unit in units.iter_mut() {
        unit.port.write_mode(PwmMode::Manual)?;
        info!(fan = %unit.fan.name, "manual PWM control enabled");
    }

    info!(
        fans = units.len(),
        interval_secs = interval.as_secs_f64(),
        "control loop starting"
    );

    loop {
        for unit in units.iter_mut() {
            run_cycle(&mut unit.fan, &mut unit.port)?;
        }
        thread::sleep(interval);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    use rf_core::{Fan, SysfsPort};

    #[test]
    fn startup_mode_write_failure_is_fatal() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("temp1_input"), "50000").unwrap();
        fs::write(dir.path().join("pwm1"), "0").unwrap();
        // No mode endpoint: the manual-mode write fails before any cycle

        let mut units = vec![FanUnit {
            fan: Fan::new("cpu".into(), 30_000, 70_000, 0, 255, 80, 40),
            port: SysfsPort::new(
                dir.path().join("temp1_input"),
                dir.path().join("pwm1"),
                dir.path().join("pwm1"),
                dir.path().join("missing").join("pwm1_enable"),
            ),
        }];

        let err = run(&mut units, Duration::from_millis(1)).unwrap_err();
        assert!(err.to_string().contains("mode"));
    }

    #[test]
    fn cycle_failure_stops_the_loop_and_names_the_fan() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("pwm1"), "0").unwrap();
        fs::write(dir.path().join("pwm1_enable"), "0").unwrap();
        // Temperature source missing: the first cycle fails and the loop
        // returns instead of spinning forever.

        let mut units = vec![FanUnit {
            fan: Fan::new("cpu".into(), 30_000, 70_000, 0, 255, 80, 40),
            port: SysfsPort::new(
                dir.path().join("temp1_input"),
                dir.path().join("pwm1"),
                dir.path().join("pwm1"),
                dir.path().join("pwm1_enable"),
            ),
        }];

        let err = run(&mut units, Duration::from_millis(1)).unwrap_err();
        assert!(err.to_string().contains("temperature"));
        // Manual mode was enabled before the failure
        assert_eq!(
            fs::read_to_string(dir.path().join("pwm1_enable")).unwrap(),
            "1"
        );
    }
}

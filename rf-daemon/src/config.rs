//! Configuration loading and validated fan construction
//!
//! The config file is TOML: one optional `[general]` table and an ordered
//! `[[fan]]` array of tables. Fans are processed in file order, and a fan
//! only becomes visible to the control loop once every required field is
//! present and consistent - a partially-configured section fails loading
//! instead of running with holes in it.
//!
//! ```toml
//! [general]
//! interval = 2.0
//!
//! [[fan]]
//! name = "cpu"
//! min_temp = 30000        # millidegrees
//! max_temp = 70000
//! min_pwm = 0
//! max_pwm = 255
//! start_pwm = 80
//! stop_pwm = 40
//! temp_sensor_path = "/sys/class/hwmon/hwmon0/temp1_input"
//! pwm_control_path = "/sys/class/hwmon/hwmon1/pwm1"
//! pwm_read_path = "/sys/class/hwmon/hwmon1/pwm1"
//! pwm_mode_path = "/sys/class/hwmon/hwmon1/pwm1_enable"
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use rf_core::{Fan, SysfsPort};
use rf_error::{RefanError, Result};

/// Polling interval used when `[general] interval` is absent.
pub const DEFAULT_INTERVAL_SECS: f64 = 2.0;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub general: General,
    #[serde(default, rename = "fan")]
    pub fans: Vec<FanSection>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct General {
    /// Polling interval in seconds.
    #[serde(default = "default_interval")]
    pub interval: f64,
}

impl Default for General {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL_SECS,
        }
    }
}

fn default_interval() -> f64 {
    DEFAULT_INTERVAL_SECS
}

/// One `[[fan]]` table. All fields are required; PWM values deserialize as
/// `u8`, so anything outside 0-255 is rejected by the parser itself.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FanSection {
    pub name: String,
    pub min_temp: i32,
    pub max_temp: i32,
    pub min_pwm: u8,
    pub max_pwm: u8,
    pub start_pwm: u8,
    pub stop_pwm: u8,
    pub temp_sensor_path: PathBuf,
    pub pwm_control_path: PathBuf,
    pub pwm_read_path: PathBuf,
    pub pwm_mode_path: PathBuf,
}

/// A fan paired with its I/O endpoints, ready for the control loop.
#[derive(Debug)]
pub struct FanUnit {
    pub fan: Fan,
    pub port: SysfsPort,
}

impl Config {
    pub fn load(path: &Path) -> Result<Config> {
        let text = fs::read_to_string(path).map_err(|e| {
            RefanError::config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config: Config = toml::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs_f64(self.general.interval)
    }

    fn validate(&self) -> Result<()> {
        if !self.general.interval.is_finite() || self.general.interval <= 0.0 {
            return Err(RefanError::invalid_config(
                "general.interval",
                "must be a positive number of seconds",
            ));
        }

        if self.fans.is_empty() {
            return Err(RefanError::MissingConfig(
                "at least one [[fan]] section".into(),
            ));
        }

        let mut seen = HashSet::new();
        for fan in &self.fans {
            let field = |key: &str| format!("fan.{}.{}", fan.name, key);

            if fan.name.is_empty() {
                return Err(RefanError::invalid_config("fan.name", "must not be empty"));
            }
            if !seen.insert(fan.name.as_str()) {
                return Err(RefanError::invalid_config(
                    field("name"),
                    "duplicate fan name",
                ));
            }
            if fan.min_temp >= fan.max_temp {
                return Err(RefanError::invalid_config(
                    field("min_temp"),
                    "min_temp must be below max_temp",
                ));
            }
            if fan.min_pwm > fan.max_pwm {
                return Err(RefanError::invalid_config(
                    field("min_pwm"),
                    "min_pwm must not exceed max_pwm",
                ));
            }
            if fan.start_pwm > fan.max_pwm {
                return Err(RefanError::invalid_config(
                    field("start_pwm"),
                    "start_pwm must not exceed max_pwm",
                ));
            }
            // An inverted band would flip the fan on and off every poll
            if fan.stop_pwm > fan.start_pwm {
                return Err(RefanError::invalid_config(
                    field("stop_pwm"),
                    "stop_pwm must not exceed start_pwm",
                ));
            }
        }

        Ok(())
    }

    /// Build the fan/port pairs the control loop drives, in file order.
    ///
    /// Every endpoint must already exist; a missing sysfs node at startup
    /// means the config points at the wrong hardware, which is a
    /// configuration failure rather than something to discover mid-loop.
    pub fn build_units(&self) -> Result<Vec<FanUnit>> {
        let mut units = Vec::with_capacity(self.fans.len());
        for section in &self.fans {
            for (key, path) in [
                ("temp_sensor_path", &section.temp_sensor_path),
                ("pwm_control_path", &section.pwm_control_path),
                ("pwm_read_path", &section.pwm_read_path),
                ("pwm_mode_path", &section.pwm_mode_path),
            ] {
                if !path.exists() {
                    return Err(RefanError::invalid_config(
                        format!("fan.{}.{}", section.name, key),
                        format!("{} does not exist", path.display()),
                    ));
                }
            }

            units.push(FanUnit {
                fan: Fan::new(
                    section.name.clone(),
                    section.min_temp,
                    section.max_temp,
                    section.min_pwm,
                    section.max_pwm,
                    section.start_pwm,
                    section.stop_pwm,
                ),
                port: SysfsPort::new(
                    &section.temp_sensor_path,
                    &section.pwm_control_path,
                    &section.pwm_read_path,
                    &section.pwm_mode_path,
                ),
            });
        }
        Ok(units)
    }
}

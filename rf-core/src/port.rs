//! Sensor/actuator I/O abstraction
//!
//! The control path never touches files directly; it talks to a [`FanPort`],
//! which abstracts the four endpoints a fan needs: a temperature source, a
//! duty-cycle write target, a duty-cycle readback target, and a mode switch.
//! [`SysfsPort`] is the production implementation over Linux hwmon-style
//! sysfs files. Tests substitute an in-memory port.

use std::fs;
use std::path::{Path, PathBuf};

use rf_error::{RefanError, Result};

/// PWM control mode as understood by hwmon `pwmN_enable` files.
///
/// - `1` = manual (software drives the duty cycle)
/// - `0` = automatic (firmware/hardware default)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PwmMode {
    Manual,
    Automatic,
}

impl PwmMode {
    /// The sentinel written to the mode endpoint.
    pub fn sentinel(self) -> &'static str {
        match self {
            PwmMode::Manual => "1",
            PwmMode::Automatic => "0",
        }
    }
}

/// I/O operations the control cycle needs for one fan.
///
/// Reads return raw text; parsing (and deciding what a parse failure means)
/// belongs to the control layer, not the transport.
pub trait FanPort {
    fn read_temperature(&mut self) -> Result<String>;
    fn read_duty_cycle(&mut self) -> Result<String>;
    fn write_duty_cycle(&mut self, value: u8) -> Result<()>;
    fn write_mode(&mut self, mode: PwmMode) -> Result<()>;
}

/// Production port backed by sysfs-style files.
///
/// Each operation opens the file fresh; sysfs attribute reads are not
/// seekable streams worth holding open, and a fresh open per poll matches
/// how the kernel expects these attributes to be used.
#[derive(Debug, Clone)]
pub struct SysfsPort {
    temp_path: PathBuf,
    pwm_path: PathBuf,
    pwm_read_path: PathBuf,
    mode_path: PathBuf,
}

impl SysfsPort {
    pub fn new(
        temp_path: impl Into<PathBuf>,
        pwm_path: impl Into<PathBuf>,
        pwm_read_path: impl Into<PathBuf>,
        mode_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            temp_path: temp_path.into(),
            pwm_path: pwm_path.into(),
            pwm_read_path: pwm_read_path.into(),
            mode_path: mode_path.into(),
        }
    }

    /// The mode endpoint path, exposed so the shutdown path can reacquire
    /// write access on its own instead of reusing a possibly-interrupted
    /// handle.
    pub fn mode_path(&self) -> &Path {
        &self.mode_path
    }
}

impl FanPort for SysfsPort {
    fn read_temperature(&mut self) -> Result<String> {
        fs::read_to_string(&self.temp_path).map_err(|e| RefanError::TemperatureRead {
            path: self.temp_path.clone(),
            reason: format!("Failed to read: {}", e),
        })
    }

    fn read_duty_cycle(&mut self) -> Result<String> {
        fs::read_to_string(&self.pwm_read_path).map_err(|e| RefanError::PwmRead {
            path: self.pwm_read_path.clone(),
            reason: format!("Failed to read: {}", e),
        })
    }

    fn write_duty_cycle(&mut self, value: u8) -> Result<()> {
        fs::write(&self.pwm_path, value.to_string()).map_err(|e| RefanError::PwmWrite {
            path: self.pwm_path.clone(),
            reason: format!("Failed to write PWM value {}: {}", value, e),
        })
    }

    fn write_mode(&mut self, mode: PwmMode) -> Result<()> {
        fs::write(&self.mode_path, mode.sentinel()).map_err(|e| RefanError::ModeWrite {
            path: self.mode_path.clone(),
            reason: format!("Failed to write mode {}: {}", mode.sentinel(), e),
        })
    }
}

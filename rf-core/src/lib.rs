//! refan core library
//!
//! Temperature-driven PWM fan control for Linux hwmon-style interfaces.
//!
//! # Module Structure
//!
//! - `curve` - Linear temperature-to-duty-cycle mapping
//! - `fan` - Per-fan configuration and run/stop state
//! - `port` - Sensor/actuator I/O abstraction and the sysfs implementation
//! - `control` - One polling cycle: sample, map, hysteresis, write, verify
//!
//! # Example
//!
//! ```no_run
//! use rf_core::{Fan, SysfsPort, run_cycle};
//!
//! let mut fan = Fan::new(
//!     "cpu".into(),
//!     30_000, 70_000, // mapping domain, millidegrees
//!     0, 255,         // duty-cycle rail
//!     80, 40,         // start/stop hysteresis band
//! );
//! let mut port = SysfsPort::new(
//!     "/sys/class/hwmon/hwmon0/temp1_input",
//!     "/sys/class/hwmon/hwmon0/pwm1",
//!     "/sys/class/hwmon/hwmon0/pwm1",
//!     "/sys/class/hwmon/hwmon0/pwm1_enable",
//! );
//! let applied = run_cycle(&mut fan, &mut port).unwrap();
//! ```

pub mod control;
pub mod curve;
pub mod fan;
pub mod port;

pub use control::run_cycle;
pub use fan::Fan;
pub use port::{FanPort, PwmMode, SysfsPort};

// Re-export the shared error types for convenience
pub use rf_error::{RefanError, Result};

//! Final hardware reset on every exit path
//!
//! Whenever the process stops - clean exit, termination signal, or crash -
//! every fan's mode endpoint must go back to automatic so the hardware is
//! never left obeying a dead daemon's last manual duty cycle.
//!
//! One idempotent routine owns the reset; it runs at most once per process
//! regardless of which path triggered it. Three paths reach it:
//!
//! - SIGINT/SIGTERM/SIGHUP via ctrlc, on its handler thread, where normal
//!   logging and file I/O are fine.
//! - SIGQUIT/SIGABRT/SIGSEGV/SIGPIPE via raw handlers that run in true
//!   async-signal context. These use only `open`/`write`/`close`/`_exit`
//!   against mode paths collected up front as C strings: no allocation, no
//!   locks, and no handles the interrupted loop might have been mid-use
//!   with.
//! - The normal fatal path in `main` after a hardware write failure.
//!
//! A panic hook covers unwinding: it performs the same raw reset and
//! aborts, and the SIGABRT handler's run-once guard keeps the overlap
//! harmless.

use std::ffi::CString;
use std::os::unix::ffi::OsStrExt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;

use libc::c_int;
use tracing::{info, warn};

use rf_core::{FanPort, PwmMode, SysfsPort};

use crate::config::FanUnit;

/// Set by whichever exit path gets there first.
static RESET_DONE: AtomicBool = AtomicBool::new(false);

/// Mode endpoint paths for the raw signal handler, NUL-terminated.
static MODE_PATHS: OnceLock<Vec<CString>> = OnceLock::new();

/// Termination-class signals that cannot go through ctrlc's thread.
/// SIGKILL is uncatchable and intentionally absent.
const FATAL_SIGNALS: &[c_int] = &[libc::SIGQUIT, libc::SIGABRT, libc::SIGSEGV, libc::SIGPIPE];

/// Name plus a fresh port for one fan's cleanup write. Ports are cloned
/// from the control loop's units, but every write opens the file anew, so
/// no handle is shared with a possibly-interrupted cycle.
pub struct ResetEntry {
    name: String,
    port: SysfsPort,
}

pub fn reset_entries(units: &[FanUnit]) -> Vec<ResetEntry> {
    units
        .iter()
        .map(|u| ResetEntry {
            name: u.fan.name.clone(),
            port: u.port.clone(),
        })
        .collect()
}

/// Install all exit-path hooks. Call once, after the fan set is final.
pub fn install(units: &[FanUnit]) {
    let raw_paths: Vec<CString> = units
        .iter()
        .filter_map(|u| CString::new(u.port.mode_path().as_os_str().as_bytes()).ok())
        .collect();
    let _ = MODE_PATHS.set(raw_paths);

    let mut entries = reset_entries(units);
    if let Err(e) = ctrlc::set_handler(move || {
        info!("termination signal received, restoring automatic fan control");
        restore_automatic(&mut entries);
        std::process::exit(0);
    }) {
        warn!(error = %e, "failed to set termination handler; signal shutdown may skip cleanup");
    }

    for &sig in FATAL_SIGNALS {
        // SAFETY: the handler is a plain extern "C" fn valid for the
        // process lifetime and restricted to async-signal-safe calls.
        unsafe {
            libc::signal(sig, on_fatal_signal as libc::sighandler_t);
        }
    }

    std::panic::set_hook(Box::new(|panic_info| {
        let location = panic_info
            .location()
            .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()))
            .unwrap_or_else(|| "unknown".to_string());
        eprintln!("PANIC at {}: restoring automatic fan control", location);
        if !RESET_DONE.swap(true, Ordering::SeqCst) {
            restore_automatic_raw();
        }
        std::process::abort();
    }));
}

/// Reset every fan to automatic mode, best-effort: one fan's failure is
/// logged and the next fan is still attempted, never an early abort.
pub fn restore_automatic(entries: &mut [ResetEntry]) {
    if RESET_DONE.swap(true, Ordering::SeqCst) {
        return;
    }
    for entry in entries.iter_mut() {
        match entry.port.write_mode(PwmMode::Automatic) {
            Ok(()) => info!(fan = %entry.name, "automatic fan control restored"),
            Err(e) => warn!(fan = %entry.name, error = %e, "failed to restore automatic control"),
        }
    }
}

extern "C" fn on_fatal_signal(sig: c_int) {
    if !RESET_DONE.swap(true, Ordering::SeqCst) {
        restore_automatic_raw();
    }
    // SAFETY: _exit is async-signal-safe and terminates without running
    // any further user code.
    unsafe { libc::_exit(128 + sig) }
}

/// Async-signal-safe reset: write the automatic sentinel to every mode
/// endpoint using raw syscalls only.
fn restore_automatic_raw() {
    let Some(paths) = MODE_PATHS.get() else {
        return;
    };
    let sentinel = b"0";
    for path in paths {
        // SAFETY: path is NUL-terminated, the buffer outlives the call,
        // and the descriptor is closed on the only branch that opened it.
        unsafe {
            let fd = libc::open(path.as_ptr(), libc::O_WRONLY);
            if fd >= 0 {
                libc::write(fd, sentinel.as_ptr().cast(), sentinel.len());
                libc::close(fd);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    // RESET_DONE is process-global, so the guard and the best-effort sweep
    // are exercised together in a single test.
    #[test]
    fn reset_is_best_effort_and_runs_once() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("pwm1_enable"), "1").unwrap();
        fs::write(dir.path().join("pwm2_enable"), "1").unwrap();

        let mut entries = vec![
            ResetEntry {
                name: "cpu".into(),
                port: SysfsPort::new(
                    dir.path().join("t"),
                    dir.path().join("p"),
                    dir.path().join("p"),
                    dir.path().join("pwm1_enable"),
                ),
            },
            // Mode endpoint in a directory that does not exist: the write
            // fails but must not stop the sweep.
            ResetEntry {
                name: "broken".into(),
                port: SysfsPort::new(
                    dir.path().join("t"),
                    dir.path().join("p"),
                    dir.path().join("p"),
                    dir.path().join("missing").join("enable"),
                ),
            },
            ResetEntry {
                name: "case".into(),
                port: SysfsPort::new(
                    dir.path().join("t"),
                    dir.path().join("p"),
                    dir.path().join("p"),
                    dir.path().join("pwm2_enable"),
                ),
            },
        ];

        restore_automatic(&mut entries);
        assert_eq!(
            fs::read_to_string(dir.path().join("pwm1_enable")).unwrap(),
            "0"
        );
        // The fan after the failing one was still reset
        assert_eq!(
            fs::read_to_string(dir.path().join("pwm2_enable")).unwrap(),
            "0"
        );

        // A second invocation is a no-op
        fs::write(dir.path().join("pwm1_enable"), "1").unwrap();
        restore_automatic(&mut entries);
        assert_eq!(
            fs::read_to_string(dir.path().join("pwm1_enable")).unwrap(),
            "1"
        );
    }
}

use std::{ffi::OsString, path::Path};

use sysinfo::{get_current_pid, Signal, System};
use tracing::{debug, warn};

const TRACKER_COMMAND: &str = "run";

/// Only `run` installs signal handlers. Other invocations would simply die from SIGUSR1.
fn is_tracker_command(cmd: &[OsString]) -> bool {
    cmd.iter().skip(1).any(|arg| arg == TRACKER_COMMAND)
}

/// Sends `signal` to every other tracker started from the same executable. Returns how many were
/// reached.
pub fn signal_running_trackers(name: &Path, signal: Signal, force: bool) -> usize {
    let system = System::new_all();
    let Ok(current_id) = get_current_pid() else {
        warn!("Can't determine current process id");
        return 0;
    };

    let mut reached = 0;
    for (pid, process) in system.processes().iter() {
        if *pid == current_id {
            continue;
        }
        if matches!(process.parent(), Some(p) if p == current_id) {
            continue;
        }

        if process
            .exe()
            .filter(|v| v.exists())
            .filter(|v| name == *v)
            .is_some()
            && is_tracker_command(process.cmd())
        {
            debug!("Sending {signal:?} to {pid}");
            match process.kill_with(signal) {
                Some(true) => reached += 1,
                Some(false) => warn!("Failed to send {signal:?} to {pid}"),
                // Signal isn't supported on this platform. Terminating forcefully is the only
                // option left and only makes sense when stopping.
                None if force => {
                    if process.kill() {
                        reached += 1;
                    }
                }
                None => warn!("{signal:?} is not supported on this platform"),
            }
        }
    }
    reached
}

use tracing::{debug, warn};
use windows::Win32::Foundation::{CloseHandle, GetLastError};
use windows::Win32::System::ProcessStatus::EmptyWorkingSet;
use windows::Win32::System::Threading::{
    OpenProcess, PROCESS_QUERY_LIMITED_INFORMATION, PROCESS_SET_QUOTA,
};

use crate::services::options::PauseOptions;
use crate::services::outcome::{Disposition, ThreadReport};
use crate::services::snapshot::ProcessTarget;
use crate::services::{thread, window};

/// Suspend every thread of one process, with the optional window and
/// working-set side effects in the order the mechanism requires: window
/// first, threads second, trim last.
pub fn pause(target: &ProcessTarget, options: &PauseOptions) -> Vec<ThreadReport> {
    if refuse(target) {
        return Vec::new();
    }

    // A suspended process cannot service the minimize message any more, so
    // the window has to reach iconic state before the first thread stops.
    if options.window_control {
        if let Some(hwnd) = target.main_window {
            if !window::minimize_blocking(hwnd, options.minimize_retries) {
                warn!(
                    pid = target.pid,
                    name = %target.name,
                    "window never reported iconic state, pausing anyway"
                );
            }
        }
    }

    let mut reports = Vec::with_capacity(target.threads.len());
    for &tid in &target.threads {
        let disposition = thread::suspend(tid, target.wow64);
        surface(target.pid, tid, disposition, options.quiet);
        reports.push(ThreadReport {
            pid: target.pid,
            tid,
            disposition,
        });
    }

    // Failure to trim does not roll the suspend back.
    if options.trim && !trim_working_set(target.pid) {
        warn!(pid = target.pid, "working-set trim failed");
    }

    reports
}

/// Resume every thread of one process, then restore the window.
pub fn resume(target: &ProcessTarget, options: &PauseOptions) -> Vec<ThreadReport> {
    if refuse(target) {
        return Vec::new();
    }

    let mut reports = Vec::with_capacity(target.threads.len());
    for &tid in &target.threads {
        let disposition = thread::resume(tid);
        surface(target.pid, tid, disposition, options.quiet);
        reports.push(ThreadReport {
            pid: target.pid,
            tid,
            disposition,
        });
    }

    // The process is running again and can service the message on its own
    // time, no need to block.
    if options.window_control {
        if let Some(hwnd) = target.main_window {
            window::restore(hwnd);
        }
    }

    reports
}

/// Hard safety rules, enforced here as well as at resolution: suspending
/// our own threads would deadlock the controller, and session 0 hosts
/// system-critical services.
fn refuse(target: &ProcessTarget) -> bool {
    if target.pid == std::process::id() {
        warn!(pid = target.pid, "refusing to operate on own process");
        return true;
    }
    if target.session_id == Some(0) {
        warn!(pid = target.pid, name = %target.name, "refusing to operate on session-0 process");
        return true;
    }
    false
}

fn surface(pid: u32, tid: u32, disposition: Disposition, quiet: bool) {
    match disposition {
        Disposition::AlreadySuspended { previous_count } => {
            warn!(pid, tid, previous_count, "thread was already suspended by another actor");
        }
        Disposition::StillSuspended { remaining_count } => {
            warn!(pid, tid, remaining_count, "thread is still suspended by another holder");
        }
        Disposition::NotSuspended => {
            warn!(pid, tid, "thread was not suspended, resume was a no-op");
        }
        Disposition::OpenFailed { os_error } if !quiet => {
            warn!(pid, tid, os_error, "could not open thread, skipping");
        }
        Disposition::CallFailed { os_error } if !quiet => {
            warn!(pid, tid, os_error, "suspend/resume call failed");
        }
        _ => debug!(pid, tid, ?disposition, "thread acted on"),
    }
}

/// Evict the process's resident pages; it stays suspended with its memory
/// paged out.
fn trim_working_set(pid: u32) -> bool {
    unsafe {
        let Ok(handle) = OpenProcess(
            PROCESS_SET_QUOTA | PROCESS_QUERY_LIMITED_INFORMATION,
            false,
            pid,
        ) else {
            debug!(pid, os_error = GetLastError().0, "could not open process for trim");
            return false;
        };
        let trimmed = EmptyWorkingSet(handle).is_ok();
        let _ = CloseHandle(handle);
        trimmed
    }
}

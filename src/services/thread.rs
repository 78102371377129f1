use windows::Win32::Foundation::{CloseHandle, GetLastError};
use windows::Win32::System::Threading::{
    OpenThread, ResumeThread, SuspendThread, Wow64SuspendThread, THREAD_SUSPEND_RESUME,
};

use crate::services::outcome::{Disposition, CALL_FAILED};

/// Suspend one thread and classify the result.
///
/// `wow64` selects the primitive for threads of a 32-bit process running
/// under emulation; the caller decides it once per process, not per thread.
/// A handle-open failure means the thread exited or access was denied and
/// is a skip, never a batch abort. Exactly one attempt: an exited thread
/// will never succeed on retry.
pub fn suspend(tid: u32, wow64: bool) -> Disposition {
    unsafe {
        let handle = match OpenThread(THREAD_SUSPEND_RESUME, false, tid) {
            Ok(handle) => handle,
            Err(_) => {
                return Disposition::OpenFailed {
                    os_error: GetLastError().0,
                }
            }
        };

        let previous = if wow64 {
            Wow64SuspendThread(handle)
        } else {
            SuspendThread(handle)
        };
        let disposition = if previous == CALL_FAILED {
            Disposition::CallFailed {
                os_error: GetLastError().0,
            }
        } else {
            Disposition::from_suspend_count(previous)
        };

        let _ = CloseHandle(handle);
        disposition
    }
}

/// Resume one thread and classify the result. The return value of the OS
/// call is the suspend count before decrementing; anything above one means
/// another holder keeps the thread suspended.
pub fn resume(tid: u32) -> Disposition {
    unsafe {
        let handle = match OpenThread(THREAD_SUSPEND_RESUME, false, tid) {
            Ok(handle) => handle,
            Err(_) => {
                return Disposition::OpenFailed {
                    os_error: GetLastError().0,
                }
            }
        };

        let previous = ResumeThread(handle);
        let disposition = if previous == CALL_FAILED {
            Disposition::CallFailed {
                os_error: GetLastError().0,
            }
        } else {
            Disposition::from_resume_count(previous)
        };

        let _ = CloseHandle(handle);
        disposition
    }
}

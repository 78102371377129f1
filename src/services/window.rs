use std::time::Duration;

use windows::Win32::Foundation::{BOOL, HWND, LPARAM};
use windows::Win32::UI::WindowsAndMessaging::{
    EnumWindows, GetWindowThreadProcessId, IsIconic, IsWindowVisible, ShowWindow, ShowWindowAsync,
    SW_FORCEMINIMIZE, SW_RESTORE,
};

pub const MINIMIZE_POLL_INTERVAL: Duration = Duration::from_millis(100);

struct WindowSearch {
    pid: u32,
    found: HWND,
}

unsafe extern "system" fn enum_callback(hwnd: HWND, lparam: LPARAM) -> BOOL {
    let search = &mut *(lparam.0 as *mut WindowSearch);

    let mut window_pid: u32 = 0;
    GetWindowThreadProcessId(hwnd, Some(&mut window_pid));

    if window_pid == search.pid && IsWindowVisible(hwnd).as_bool() {
        search.found = hwnd;
        return BOOL(0); // Stop enumeration
    }
    BOOL(1)
}

/// Find the first visible top-level window owned by a process.
pub fn main_window(pid: u32) -> Option<HWND> {
    let mut search = WindowSearch {
        pid,
        found: HWND(std::ptr::null_mut()),
    };

    unsafe {
        // EnumWindows reports an error when the callback stops it early.
        let _ = EnumWindows(
            Some(enum_callback),
            LPARAM(&mut search as *mut WindowSearch as isize),
        );
    }

    if search.found.0.is_null() {
        None
    } else {
        Some(search.found)
    }
}

/// Force-minimize a window and poll until it reports iconic state.
///
/// Minimizing is asynchronous at the message-queue level and a suspended
/// process can no longer service the message, so this must complete before
/// any thread is suspended. Returns whether iconic state was observed
/// within the retry budget; the caller proceeds either way.
pub fn minimize_blocking(hwnd: HWND, retries: u32) -> bool {
    unsafe {
        let _ = ShowWindow(hwnd, SW_FORCEMINIMIZE);

        for _ in 0..retries {
            if IsIconic(hwnd).as_bool() {
                return true;
            }
            std::thread::sleep(MINIMIZE_POLL_INTERVAL);
        }
        IsIconic(hwnd).as_bool()
    }
}

/// Restore a window without waiting. The process is running again at this
/// point and will service the message on its own time.
pub fn restore(hwnd: HWND) {
    unsafe {
        let _ = ShowWindowAsync(hwnd, SW_RESTORE);
    }
}

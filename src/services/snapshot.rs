use once_cell::sync::Lazy;
use windows::Win32::Foundation::{CloseHandle, BOOL, HWND};
use windows::Win32::System::Diagnostics::ToolHelp::{
    CreateToolhelp32Snapshot, Process32First, Process32Next, Thread32First, Thread32Next,
    PROCESSENTRY32, TH32CS_SNAPPROCESS, TH32CS_SNAPTHREAD, THREADENTRY32,
};
use windows::Win32::System::RemoteDesktop::ProcessIdToSessionId;
use windows::Win32::System::Threading::{
    IsWow64Process, OpenProcess, PROCESS_QUERY_LIMITED_INFORMATION,
};

use crate::services::resolve::ProcessRecord;
use crate::services::window;

/// A resolved process plus everything the aggregator needs to act on it.
/// The thread list is a snapshot taken at action time; threads appearing
/// afterwards are outside this invocation's scope.
#[derive(Debug, Clone)]
pub struct ProcessTarget {
    pub pid: u32,
    pub name: String,
    pub session_id: Option<u32>,
    pub threads: Vec<u32>,
    pub wow64: bool,
    pub main_window: Option<HWND>,
}

/// The session this invocation runs in.
pub static OWN_SESSION: Lazy<Option<u32>> = Lazy::new(|| session_of(std::process::id()));

/// Enumerate all running processes into selector-ready records.
pub fn processes() -> Vec<ProcessRecord> {
    let mut records = Vec::with_capacity(256);

    unsafe {
        let Ok(snapshot) = CreateToolhelp32Snapshot(TH32CS_SNAPPROCESS, 0) else {
            return records;
        };
        if snapshot.is_invalid() {
            return records;
        }

        let mut entry = PROCESSENTRY32 {
            dwSize: std::mem::size_of::<PROCESSENTRY32>() as u32,
            ..Default::default()
        };

        if Process32First(snapshot, &mut entry).is_ok() {
            loop {
                let pid = entry.th32ProcessID;
                records.push(ProcessRecord {
                    pid,
                    name: extract_process_name(&entry.szExeFile).to_string(),
                    session_id: session_of(pid),
                });
                if Process32Next(snapshot, &mut entry).is_err() {
                    break;
                }
            }
        }
        let _ = CloseHandle(snapshot);
    }
    records
}

/// Snapshot the thread ids belonging to one process, in enumeration order.
pub fn threads_of(pid: u32) -> Vec<u32> {
    let mut tids = Vec::new();

    unsafe {
        let Ok(snapshot) = CreateToolhelp32Snapshot(TH32CS_SNAPTHREAD, 0) else {
            return tids;
        };
        if snapshot.is_invalid() {
            return tids;
        }

        let mut entry = THREADENTRY32 {
            dwSize: std::mem::size_of::<THREADENTRY32>() as u32,
            ..Default::default()
        };

        if Thread32First(snapshot, &mut entry).is_ok() {
            loop {
                if entry.th32OwnerProcessID == pid {
                    tids.push(entry.th32ThreadID);
                }
                if Thread32Next(snapshot, &mut entry).is_err() {
                    break;
                }
            }
        }
        let _ = CloseHandle(snapshot);
    }
    tids
}

/// Build the full action target for a resolved record: fresh thread
/// snapshot, bitness (decided once per process), and main window if any.
pub fn collect_target(record: &ProcessRecord) -> ProcessTarget {
    ProcessTarget {
        pid: record.pid,
        name: record.name.clone(),
        session_id: record.session_id,
        threads: threads_of(record.pid),
        wow64: is_wow64(record.pid),
        main_window: window::main_window(record.pid),
    }
}

pub fn session_of(pid: u32) -> Option<u32> {
    let mut session = 0u32;
    unsafe { ProcessIdToSessionId(pid, &mut session).ok().map(|_| session) }
}

/// Whether the process is a 32-bit process under WOW64 emulation, which
/// needs the distinct suspend primitive.
pub fn is_wow64(pid: u32) -> bool {
    unsafe {
        let Ok(handle) = OpenProcess(PROCESS_QUERY_LIMITED_INFORMATION, false, pid) else {
            return false;
        };
        let mut wow64 = BOOL(0);
        let result = IsWow64Process(handle, &mut wow64);
        let _ = CloseHandle(handle);
        result.is_ok() && wow64.as_bool()
    }
}

/// Extract the executable name from PROCESSENTRY32, without the `.exe`
/// extension.
fn extract_process_name(sz_exe_file: &[i8; 260]) -> &str {
    let len = sz_exe_file.iter().position(|&c| c == 0).unwrap_or(260);
    // Windows process names are ASCII
    let bytes = unsafe { std::slice::from_raw_parts(sz_exe_file.as_ptr() as *const u8, len) };
    let name = std::str::from_utf8(bytes).unwrap_or("");
    name.strip_suffix(".exe")
        .or_else(|| name.strip_suffix(".EXE"))
        .unwrap_or(name)
}

use std::time::Duration;

use thiserror::Error;
use tracing::debug;
use windows::core::{HSTRING, PCWSTR};
use windows::Win32::Foundation::{
    CloseHandle, ERROR_FILE_NOT_FOUND, ERROR_PIPE_BUSY, ERROR_PIPE_CONNECTED, GENERIC_READ,
    GENERIC_WRITE, HANDLE,
};
use windows::Win32::Storage::FileSystem::{
    CreateFileW, FlushFileBuffers, ReadFile, WriteFile, FILE_ATTRIBUTE_NORMAL, FILE_SHARE_NONE,
    OPEN_EXISTING, PIPE_ACCESS_DUPLEX,
};
use windows::Win32::System::Pipes::{
    ConnectNamedPipe, CreateNamedPipeW, DisconnectNamedPipe, WaitNamedPipeW, NMPWAIT_WAIT_FOREVER,
    PIPE_READMODE_BYTE, PIPE_TYPE_BYTE, PIPE_WAIT,
};

const PIPE_PREFIX: &str = r"\\.\pipe\";
const PIPE_BUFFER: u32 = 512;
const CONNECT_POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Error)]
pub enum PipeError {
    #[error("could not create rendezvous channel \"{name}\": {source}")]
    Create {
        name: String,
        source: windows::core::Error,
    },
    #[error("rendezvous channel \"{name}\" failed: {source}")]
    Channel {
        name: String,
        source: windows::core::Error,
    },
}

/// Closes the pipe handle on every exit path.
struct PipeHandle(HANDLE);

impl Drop for PipeHandle {
    fn drop(&mut self) {
        unsafe {
            let _ = CloseHandle(self.0);
        }
    }
}

pub fn pipe_path(name: &str) -> String {
    if name.starts_with(PIPE_PREFIX) {
        name.to_string()
    } else {
        format!("{PIPE_PREFIX}{name}")
    }
}

/// Pauser side: create the channel, block until a peer connects, read one
/// message.
///
/// The wait is a plain blocking call with no timeout; the whole tool's job
/// at this point is to wait. Any error after the channel exists is
/// equivalent to a received signal for the caller: the reversion must run
/// either way, which the caller guarantees with a [`ResumeGuard`].
///
/// [`ResumeGuard`]: crate::services::batch::ResumeGuard
pub fn wait_for_signal(name: &str) -> Result<String, PipeError> {
    let path = pipe_path(name);
    let wide = HSTRING::from(path.as_str());

    unsafe {
        let raw = CreateNamedPipeW(
            PCWSTR(wide.as_ptr()),
            PIPE_ACCESS_DUPLEX,
            PIPE_TYPE_BYTE | PIPE_READMODE_BYTE | PIPE_WAIT,
            1,
            PIPE_BUFFER,
            PIPE_BUFFER,
            0,
            None,
        );
        if raw.is_invalid() {
            return Err(PipeError::Create {
                name: path,
                source: windows::core::Error::from_win32(),
            });
        }
        let pipe = PipeHandle(raw);

        debug!(channel = %path, "waiting for peer to connect");
        if let Err(source) = ConnectNamedPipe(pipe.0, None) {
            // The peer may have connected between create and accept.
            if source.code() != ERROR_PIPE_CONNECTED.to_hresult() {
                return Err(PipeError::Channel { name: path, source });
            }
        }

        let mut buffer = [0u8; PIPE_BUFFER as usize];
        let mut read = 0u32;
        ReadFile(pipe.0, Some(buffer.as_mut_slice()), Some(&mut read), None)
            .map_err(|source| PipeError::Channel {
                name: path.clone(),
                source,
            })?;
        let _ = DisconnectNamedPipe(pipe.0);

        let message = String::from_utf8_lossy(&buffer[..read as usize])
            .trim_end()
            .to_string();
        debug!(channel = %path, message = %message, "signal received");
        Ok(message)
    }
}

/// Signaler side: block until the pauser is listening, connect, write one
/// line, close. The signaler performs no pause/resume of its own.
///
/// There is no timeout: aborting the wait means killing this process,
/// same as on the pauser side.
pub fn send_signal(name: &str, message: &str) -> Result<(), PipeError> {
    let path = pipe_path(name);
    let wide = HSTRING::from(path.as_str());

    unsafe {
        let raw = loop {
            match CreateFileW(
                PCWSTR(wide.as_ptr()),
                (GENERIC_READ | GENERIC_WRITE).0,
                FILE_SHARE_NONE,
                None,
                OPEN_EXISTING,
                FILE_ATTRIBUTE_NORMAL,
                None,
            ) {
                Ok(handle) => break handle,
                // The pauser has not created the channel yet.
                Err(source) if source.code() == ERROR_FILE_NOT_FOUND.to_hresult() => {
                    std::thread::sleep(CONNECT_POLL_INTERVAL);
                }
                // The channel exists but its one instance is taken.
                Err(source) if source.code() == ERROR_PIPE_BUSY.to_hresult() => {
                    let _ = WaitNamedPipeW(PCWSTR(wide.as_ptr()), NMPWAIT_WAIT_FOREVER);
                }
                Err(source) => return Err(PipeError::Channel { name: path, source }),
            }
        };
        let pipe = PipeHandle(raw);

        let line = format!("{message}\n");
        let mut written = 0u32;
        WriteFile(pipe.0, Some(line.as_bytes()), Some(&mut written), None).map_err(|source| {
            PipeError::Channel {
                name: path.clone(),
                source,
            }
        })?;
        let _ = FlushFileBuffers(pipe.0);

        debug!(channel = %path, "signal sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipe_path_prefixes_bare_names() {
        assert_eq!(pipe_path("pause-1"), r"\\.\pipe\pause-1");
    }

    #[test]
    fn pipe_path_keeps_full_paths() {
        assert_eq!(pipe_path(r"\\.\pipe\pause-1"), r"\\.\pipe\pause-1");
    }
}

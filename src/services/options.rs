/// Bounded poll budget for confirming a window minimize before suspension.
pub const DEFAULT_MINIMIZE_RETRIES: u32 = 10;

/// Per-invocation behavior switches, resolved once from the CLI and passed
/// through the batch driver by reference.
#[derive(Debug, Clone)]
pub struct PauseOptions {
    /// Trim each process's working set after all its threads are suspended.
    pub trim: bool,
    /// Minimize the main window before pausing, restore it after resuming.
    pub window_control: bool,
    pub minimize_retries: u32,
    /// Suppress per-thread operation-failure warnings. Partial-state
    /// warnings are emitted regardless.
    pub quiet: bool,
}

impl Default for PauseOptions {
    fn default() -> Self {
        Self {
            trim: false,
            window_control: false,
            minimize_retries: DEFAULT_MINIMIZE_RETRIES,
            quiet: false,
        }
    }
}

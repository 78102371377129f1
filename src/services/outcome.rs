use serde::Serialize;

/// Sentinel returned by SuspendThread/ResumeThread when the call itself fails.
pub const CALL_FAILED: u32 = u32::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Pause,
    Resume,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Action::Pause => "pause",
            Action::Resume => "resume",
        }
    }
}

/// What happened to one thread, classified from the suspend-count value the
/// OS call returned. The count is always the value *before* the call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Disposition {
    /// Suspend call on a running thread; it is now suspended by us.
    Suspended,
    /// Suspend call on a thread another actor had already suspended. Our
    /// call was additive; the thread was not newly stopped by us.
    AlreadySuspended { previous_count: u32 },
    /// Resume call brought the count to zero; the thread is running again.
    Resumed,
    /// Resume call decremented the count but another holder remains.
    StillSuspended { remaining_count: u32 },
    /// Resume call on a thread that was not suspended at all.
    NotSuspended,
    /// The thread handle could not be opened (thread exited, access denied).
    OpenFailed { os_error: u32 },
    /// The suspend/resume call itself failed.
    CallFailed { os_error: u32 },
}

impl Disposition {
    /// Classify the raw return value of a suspend call.
    pub fn from_suspend_count(previous: u32) -> Self {
        match previous {
            0 => Disposition::Suspended,
            n => Disposition::AlreadySuspended { previous_count: n },
        }
    }

    /// Classify the raw return value of a resume call.
    pub fn from_resume_count(previous: u32) -> Self {
        match previous {
            0 => Disposition::NotSuspended,
            1 => Disposition::Resumed,
            n => Disposition::StillSuspended {
                remaining_count: n - 1,
            },
        }
    }

    /// The thread reached the state the operator asked for.
    pub fn changed(self) -> bool {
        matches!(self, Disposition::Suspended | Disposition::Resumed)
    }

    /// Partial state: the operation ran but the operator's mental model of
    /// "paused"/"resumed" may be wrong. Never suppressible.
    pub fn is_partial(self) -> bool {
        matches!(
            self,
            Disposition::AlreadySuspended { .. }
                | Disposition::StillSuspended { .. }
                | Disposition::NotSuspended
        )
    }

    pub fn is_failure(self) -> bool {
        matches!(
            self,
            Disposition::OpenFailed { .. } | Disposition::CallFailed { .. }
        )
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct ThreadReport {
    pub pid: u32,
    pub tid: u32,
    #[serde(flatten)]
    pub disposition: Disposition,
}

/// Closed result-code set for a whole batch, in the style of the Windows
/// Update result table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OpStatus {
    NotStarted,
    InProgress,
    Succeeded,
    SucceededWithErrors,
    Failed,
    Aborted,
}

#[derive(Debug, Serialize)]
pub struct BatchReport {
    pub action: Action,
    /// Processes the batch attempted to act on.
    pub considered: usize,
    /// Processes where at least one thread actually changed state.
    pub changed: usize,
    pub status: OpStatus,
    pub threads: Vec<ThreadReport>,
}

impl BatchReport {
    /// Roll per-thread dispositions up into the batch totals.
    ///
    /// Zero changed threads is not an error by itself: already-paused
    /// targets legitimately report no new changes. Failed means every
    /// attempted thread errored and nothing changed.
    pub fn summarize(action: Action, considered: usize, threads: Vec<ThreadReport>) -> Self {
        let mut changed_pids: Vec<u32> = threads
            .iter()
            .filter(|t| t.disposition.changed())
            .map(|t| t.pid)
            .collect();
        changed_pids.sort_unstable();
        changed_pids.dedup();

        let any_failure = threads.iter().any(|t| t.disposition.is_failure());
        let any_partial = threads.iter().any(|t| t.disposition.is_partial());
        let all_failed = !threads.is_empty() && threads.iter().all(|t| t.disposition.is_failure());

        let status = if considered == 0 {
            OpStatus::NotStarted
        } else if all_failed {
            OpStatus::Failed
        } else if any_failure || any_partial {
            OpStatus::SucceededWithErrors
        } else {
            OpStatus::Succeeded
        };

        BatchReport {
            action,
            considered,
            changed: changed_pids.len(),
            status,
            threads,
        }
    }

    /// Pids where at least one thread was freshly changed, in pid order.
    pub fn changed_pids(&self) -> Vec<u32> {
        let mut pids: Vec<u32> = self
            .threads
            .iter()
            .filter(|t| t.disposition.changed())
            .map(|t| t.pid)
            .collect();
        pids.sort_unstable();
        pids.dedup();
        pids
    }
}

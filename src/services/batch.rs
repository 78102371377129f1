use tracing::{debug, info};

use crate::services::options::PauseOptions;
use crate::services::outcome::{Action, BatchReport, ThreadReport};
use crate::services::process;
use crate::services::resolve::{self, ProcessRecord, ResolveError, Selector};
use crate::services::snapshot::{self, ProcessTarget};

/// Resolve a selector against a fresh process snapshot and build full
/// action targets for every match.
pub fn resolve_targets(selector: &Selector) -> Result<Vec<ProcessTarget>, ResolveError> {
    let records = snapshot::processes();
    let own_pid = std::process::id();
    let resolved = resolve::resolve(&records, selector, own_pid, *snapshot::OWN_SESSION)?;
    debug!(count = resolved.len(), "resolved selector");
    Ok(resolved.iter().map(snapshot::collect_target).collect())
}

/// Act on every target in turn and accumulate the totals. One attempt per
/// thread, no retries; a process that vanished since resolution simply
/// contributes open-failure skips.
pub fn run(targets: &[ProcessTarget], action: Action, options: &PauseOptions) -> BatchReport {
    let mut threads: Vec<ThreadReport> = Vec::new();

    for target in targets {
        debug!(
            pid = target.pid,
            name = %target.name,
            threads = target.threads.len(),
            wow64 = target.wow64,
            action = action.as_str(),
            "acting on process"
        );
        let reports = match action {
            Action::Pause => process::pause(target, options),
            Action::Resume => process::resume(target, options),
        };
        threads.extend(reports);
    }

    BatchReport::summarize(action, targets.len(), threads)
}

/// Resumes a set of pids when dropped.
///
/// This is the rendezvous fail-safe: once processes are paused pending a
/// signal, the reversion must run no matter how the wait ends (message
/// received, peer disconnected without data, broken pipe, or a panic on
/// the way out). Thread ids are re-snapshotted at resume time since the
/// pause-time list is stale by then.
pub struct ResumeGuard {
    pids: Vec<u32>,
    options: PauseOptions,
}

impl ResumeGuard {
    pub fn new(pids: Vec<u32>, options: PauseOptions) -> Self {
        Self { pids, options }
    }
}

impl Drop for ResumeGuard {
    fn drop(&mut self) {
        if self.pids.is_empty() {
            return;
        }
        let records: Vec<ProcessRecord> = snapshot::processes()
            .into_iter()
            .filter(|r| self.pids.contains(&r.pid))
            .collect();
        let targets: Vec<ProcessTarget> = records.iter().map(snapshot::collect_target).collect();
        let report = run(&targets, Action::Resume, &self.options);
        info!(
            resumed = report.changed,
            of = self.pids.len(),
            "reverted paused processes"
        );
    }
}

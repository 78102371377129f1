use thiserror::Error;
use tracing::warn;

/// One row of the process snapshot, as enumerated at invocation time.
/// Stale the moment it is produced: a process may exit between enumeration
/// and the suspend attempt, which later surfaces as a per-thread skip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessRecord {
    pub pid: u32,
    /// Executable name with any `.exe` suffix stripped.
    pub name: String,
    /// None when the session could not be determined (process gone).
    pub session_id: Option<u32>,
}

/// Which sessions a name-based selector may match in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionFilter {
    /// Only the caller's own session.
    Own,
    /// Every session.
    All,
    /// An explicit session-id set.
    Explicit(Vec<u32>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    Ids(Vec<u32>),
    Names {
        patterns: Vec<String>,
        sessions: SessionFilter,
    },
    Sessions(Vec<u32>),
}

impl Selector {
    pub fn describe(&self) -> String {
        match self {
            Selector::Ids(ids) => format!("--id {:?}", ids),
            Selector::Names { patterns, sessions } => match sessions {
                SessionFilter::Explicit(ids) => {
                    format!("--name {:?} --session-ids {:?}", patterns, ids)
                }
                _ => format!("--name {:?}", patterns),
            },
            Selector::Sessions(ids) => format!("--session-ids {:?}", ids),
        }
    }
}

#[derive(Debug, Error)]
pub enum ResolveError {
    /// Distinct from "zero threads changed": nothing matched the selector
    /// at all, so the invocation has nothing to act on.
    #[error("no matching processes for {selector}")]
    NoMatch { selector: String },
}

/// Strip a trailing `.exe` and compare case-insensitively.
pub fn name_matches(candidate: &str, pattern: &str) -> bool {
    strip_exe(candidate).eq_ignore_ascii_case(strip_exe(pattern))
}

fn strip_exe(name: &str) -> &str {
    name.strip_suffix(".exe")
        .or_else(|| name.strip_suffix(".EXE"))
        .unwrap_or(name)
}

/// Filter the snapshot down to the processes the selector names.
///
/// The caller's own pid is dropped unconditionally, even when listed via an
/// explicit id. Session-0 processes are never targeted. An empty result is
/// the hard "no matching processes" failure.
pub fn resolve(
    records: &[ProcessRecord],
    selector: &Selector,
    own_pid: u32,
    own_session: Option<u32>,
) -> Result<Vec<ProcessRecord>, ResolveError> {
    let mut out = Vec::new();

    for record in records {
        if record.pid == own_pid {
            if matches!(selector, Selector::Ids(ids) if ids.contains(&record.pid)) {
                warn!(
                    pid = record.pid,
                    "refusing to pause own process, dropping it from the target set"
                );
            }
            continue;
        }
        if !selected(record, selector, own_session) {
            continue;
        }
        if record.session_id == Some(0) {
            warn!(pid = record.pid, name = %record.name, "skipping session-0 process");
            continue;
        }
        out.push(record.clone());
    }

    if out.is_empty() {
        return Err(ResolveError::NoMatch {
            selector: selector.describe(),
        });
    }
    Ok(out)
}

fn selected(record: &ProcessRecord, selector: &Selector, own_session: Option<u32>) -> bool {
    match selector {
        Selector::Ids(ids) => ids.contains(&record.pid),
        Selector::Names { patterns, sessions } => {
            if !patterns.iter().any(|p| name_matches(&record.name, p)) {
                return false;
            }
            match sessions {
                SessionFilter::All => true,
                // Unknown sessions cannot be confirmed as in scope.
                SessionFilter::Own => record.session_id.is_some() && record.session_id == own_session,
                SessionFilter::Explicit(ids) => match record.session_id {
                    Some(session) => ids.contains(&session),
                    None => false,
                },
            }
        }
        Selector::Sessions(ids) => match record.session_id {
            Some(session) => ids.contains(&session),
            None => false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pid: u32, name: &str, session: u32) -> ProcessRecord {
        ProcessRecord {
            pid,
            name: name.to_string(),
            session_id: Some(session),
        }
    }

    const OWN_PID: u32 = 4242;
    const OWN_SESSION: Option<u32> = Some(2);

    fn snapshot() -> Vec<ProcessRecord> {
        vec![
            record(4, "wininit", 0),
            record(100, "notepad", 2),
            record(200, "notepad", 5),
            record(300, "calc", 2),
            record(OWN_PID, "procpause", 2),
        ]
    }

    fn names(patterns: &[&str], sessions: SessionFilter) -> Selector {
        Selector::Names {
            patterns: patterns.iter().map(|s| s.to_string()).collect(),
            sessions,
        }
    }

    #[test]
    fn own_pid_never_resolves_even_when_explicit() {
        // Self-protection is not configurable.
        let selector = Selector::Ids(vec![100, OWN_PID]);
        let resolved = resolve(&snapshot(), &selector, OWN_PID, OWN_SESSION).unwrap();
        assert_eq!(resolved.iter().map(|r| r.pid).collect::<Vec<_>>(), vec![100]);
    }

    #[test]
    fn name_resolution_stays_in_own_session() {
        // Without --all-sessions the result is a subset of our session.
        let selector = names(&["notepad"], SessionFilter::Own);
        let resolved = resolve(&snapshot(), &selector, OWN_PID, OWN_SESSION).unwrap();
        assert_eq!(resolved.len(), 1);
        assert!(resolved.iter().all(|r| r.session_id == OWN_SESSION));
    }

    #[test]
    fn all_sessions_widens_name_resolution() {
        let selector = names(&["notepad.exe"], SessionFilter::All);
        let resolved = resolve(&snapshot(), &selector, OWN_PID, OWN_SESSION).unwrap();
        assert_eq!(
            resolved.iter().map(|r| r.pid).collect::<Vec<_>>(),
            vec![100, 200]
        );
    }

    #[test]
    fn name_with_explicit_session_misses_other_sessions() {
        // notepad runs in session 5 but not in session 2: resolution must
        // fail hard rather than return an empty batch.
        let records = vec![record(200, "notepad", 5)];
        let selector = names(&["notepad"], SessionFilter::Explicit(vec![2]));
        let err = resolve(&records, &selector, OWN_PID, OWN_SESSION).unwrap_err();
        assert!(matches!(err, ResolveError::NoMatch { .. }));
    }

    #[test]
    fn name_with_explicit_session_hits_that_session() {
        let selector = names(&["notepad"], SessionFilter::Explicit(vec![5]));
        let resolved = resolve(&snapshot(), &selector, OWN_PID, OWN_SESSION).unwrap();
        assert_eq!(resolved.iter().map(|r| r.pid).collect::<Vec<_>>(), vec![200]);
    }

    #[test]
    fn session_selector_excludes_own_pid_and_session_zero() {
        let selector = Selector::Sessions(vec![0, 2]);
        let resolved = resolve(&snapshot(), &selector, OWN_PID, OWN_SESSION).unwrap();
        let pids: Vec<u32> = resolved.iter().map(|r| r.pid).collect();
        assert_eq!(pids, vec![100, 300]);
    }

    #[test]
    fn exe_suffix_is_ignored_on_both_sides() {
        assert!(name_matches("Notepad.exe", "notepad"));
        assert!(name_matches("notepad", "NOTEPAD.EXE"));
        assert!(!name_matches("notepad2", "notepad"));
    }

    #[test]
    fn unknown_session_is_not_matched_without_all_sessions() {
        let records = vec![ProcessRecord {
            pid: 700,
            name: "ghost".into(),
            session_id: None,
        }];
        let selector = names(&["ghost"], SessionFilter::Own);
        assert!(resolve(&records, &selector, OWN_PID, OWN_SESSION).is_err());
    }
}

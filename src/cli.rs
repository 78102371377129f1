use std::path::PathBuf;

use clap::Parser;

use crate::services::options::{PauseOptions, DEFAULT_MINIMIZE_RETRIES};
use crate::services::resolve::{Selector, SessionFilter};

#[derive(Parser, Debug)]
#[command(
    name = "procpause",
    about = "Pause and resume processes by suspending their threads",
    version
)]
pub struct Args {
    /// Process ids to act on
    #[arg(long = "id", value_name = "PID", value_delimiter = ',', group = "selector")]
    pub ids: Vec<u32>,

    /// Process names to act on (".exe" optional, case-insensitive)
    #[arg(long = "name", value_name = "NAME", value_delimiter = ',', group = "selector")]
    pub names: Vec<String>,

    /// Act on every process in these sessions, or scope --name to them
    #[arg(
        long = "session-ids",
        value_name = "ID",
        value_delimiter = ',',
        conflicts_with = "ids"
    )]
    pub session_ids: Vec<u32>,

    /// Resume instead of pause
    #[arg(long)]
    pub resume: bool,

    /// Match names in every session, not just the caller's
    #[arg(long = "all-sessions", conflicts_with = "session_ids")]
    pub all_sessions: bool,

    /// Trim each paused process's working set
    #[arg(long)]
    pub trim: bool,

    /// Minimize main windows before pausing, restore them after resuming
    #[arg(long = "window-control")]
    pub window_control: bool,

    /// Poll attempts when confirming a minimize
    #[arg(long = "minimize-retries", value_name = "N", default_value_t = DEFAULT_MINIMIZE_RETRIES)]
    pub minimize_retries: u32,

    /// Suppress per-thread operation-failure warnings
    #[arg(long)]
    pub quiet: bool,

    /// Rendezvous channel name; when pausing, block on it and undo the
    /// pauses once signaled. Killing the waiting process leaves its
    /// targets paused
    #[arg(long = "pipe-name", value_name = "NAME")]
    pub pipe_name: Option<String>,

    /// Send this message on the channel and exit without pausing or
    /// resuming anything
    #[arg(
        long,
        value_name = "MSG",
        requires = "pipe_name",
        conflicts_with_all = ["selector", "session_ids"]
    )]
    pub signal: Option<String>,

    /// Also write diagnostics to this file
    #[arg(long = "log-file", value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Append to the log file instead of truncating it
    #[arg(long, requires = "log_file")]
    pub append: bool,

    /// Print the full diagnostic report as JSON instead of the bare count
    #[arg(long)]
    pub json: bool,
}

impl Args {
    /// The target selector, if any was given. `--signal` invocations run
    /// without one.
    pub fn selector(&self) -> Option<Selector> {
        if !self.ids.is_empty() {
            Some(Selector::Ids(self.ids.clone()))
        } else if !self.names.is_empty() {
            let sessions = if self.all_sessions {
                SessionFilter::All
            } else if !self.session_ids.is_empty() {
                SessionFilter::Explicit(self.session_ids.clone())
            } else {
                SessionFilter::Own
            };
            Some(Selector::Names {
                patterns: self.names.clone(),
                sessions,
            })
        } else if !self.session_ids.is_empty() {
            Some(Selector::Sessions(self.session_ids.clone()))
        } else {
            None
        }
    }

    pub fn pause_options(&self) -> PauseOptions {
        PauseOptions {
            trim: self.trim,
            window_control: self.window_control,
            minimize_retries: self.minimize_retries,
            quiet: self.quiet,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Args, clap::Error> {
        Args::try_parse_from(std::iter::once("procpause").chain(args.iter().copied()))
    }

    #[test]
    fn id_list_parses_comma_separated() {
        let args = parse(&["--id", "100,200"]).unwrap();
        assert_eq!(args.selector(), Some(Selector::Ids(vec![100, 200])));
    }

    #[test]
    fn id_and_name_are_mutually_exclusive() {
        assert!(parse(&["--id", "100", "--name", "notepad"]).is_err());
    }

    #[test]
    fn id_and_session_ids_are_mutually_exclusive() {
        assert!(parse(&["--id", "100", "--session-ids", "2"]).is_err());
    }

    #[test]
    fn name_combines_with_session_ids() {
        let args = parse(&["--name", "notepad", "--session-ids", "2"]).unwrap();
        assert_eq!(
            args.selector(),
            Some(Selector::Names {
                patterns: vec!["notepad".into()],
                sessions: SessionFilter::Explicit(vec![2]),
            })
        );
    }

    #[test]
    fn name_defaults_to_own_session() {
        let args = parse(&["--name", "notepad"]).unwrap();
        assert_eq!(
            args.selector(),
            Some(Selector::Names {
                patterns: vec!["notepad".into()],
                sessions: SessionFilter::Own,
            })
        );
    }

    #[test]
    fn all_sessions_conflicts_with_explicit_sessions() {
        assert!(parse(&["--name", "notepad", "--all-sessions", "--session-ids", "2"]).is_err());
    }

    #[test]
    fn signal_requires_pipe_name() {
        assert!(parse(&["--signal", "go"]).is_err());
        let args = parse(&["--signal", "go", "--pipe-name", "x"]).unwrap();
        assert!(args.selector().is_none());
        assert_eq!(args.signal.as_deref(), Some("go"));
    }

    #[test]
    fn signal_invocations_take_no_selector() {
        assert!(parse(&["--signal", "go", "--pipe-name", "x", "--id", "5"]).is_err());
        assert!(parse(&["--signal", "go", "--pipe-name", "x", "--session-ids", "2"]).is_err());
    }

    #[test]
    fn append_requires_log_file() {
        assert!(parse(&["--append"]).is_err());
        assert!(parse(&["--id", "1", "--log-file", "out.log", "--append"]).is_ok());
    }

    #[test]
    fn minimize_retries_defaults_to_budget() {
        let args = parse(&["--id", "1"]).unwrap();
        assert_eq!(args.minimize_retries, DEFAULT_MINIMIZE_RETRIES);
        assert!(!args.resume);
        assert!(!args.pause_options().trim);
    }
}

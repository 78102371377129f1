mod cli;
mod logging;
mod services;

use anyhow::Result;
use clap::Parser;

use cli::Args;

fn main() -> Result<()> {
    let args = Args::parse();
    let _log_guard = logging::init(args.log_file.as_deref(), args.append)?;
    run(args)
}

#[cfg(windows)]
fn run(args: Args) -> Result<()> {
    use anyhow::{bail, Context};
    use tracing::{info, warn};

    use services::outcome::Action;
    use services::{batch, pipe};

    // A signaler invocation delivers one message and does nothing else.
    if let Some(message) = &args.signal {
        let Some(name) = args.pipe_name.as_deref() else {
            bail!("--signal requires --pipe-name");
        };
        pipe::send_signal(name, message)?;
        return Ok(());
    }

    let selector = args
        .selector()
        .context("one of --id, --name or --session-ids is required")?;
    let action = if args.resume {
        Action::Resume
    } else {
        Action::Pause
    };
    let options = args.pause_options();

    let targets = batch::resolve_targets(&selector)?;
    let report = batch::run(&targets, action, &options);
    emit(&report, args.json)?;

    // Pause-and-wait path: block on the rendezvous channel, then flip the
    // pauses back. The guard runs the reversion however the wait ends.
    if action == Action::Pause {
        if let Some(pipe_name) = &args.pipe_name {
            let _revert = batch::ResumeGuard::new(report.changed_pids(), options);
            match pipe::wait_for_signal(pipe_name) {
                Ok(message) => info!(message = %message, "resume signal received"),
                Err(error) => {
                    warn!(%error, "rendezvous channel failed, reverting pauses anyway");
                }
            }
        }
    }

    Ok(())
}

#[cfg(windows)]
fn emit(report: &services::outcome::BatchReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        println!("{}", report.changed);
    }
    Ok(())
}

#[cfg(not(windows))]
fn run(_args: Args) -> Result<()> {
    anyhow::bail!("procpause drives Win32 thread and window APIs and only runs on Windows");
}

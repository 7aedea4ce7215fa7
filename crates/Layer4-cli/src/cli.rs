//! `bgproc run` - start one process and stream its output until it exits

use bgproc_task::{ProcessStatus, ProcessSupervisor, StopOutcome};
use std::io::Write;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

/// Build the command line for `bgproc run`.
///
/// A single argument is taken as a whole shell line (`bgproc run "a && b"`).
/// Several arguments are an argv and are re-quoted so they reach the program
/// unchanged.
pub fn command_line(argv: &[String]) -> anyhow::Result<String> {
    match argv {
        [line] => Ok(line.clone()),
        _ => Ok(shlex::try_join(argv.iter().map(String::as_str))?),
    }
}

/// Run `command`, forwarding its output to our stdout/stderr.
///
/// Returns the exit code to use for the host process. Ctrl-C stops the child
/// and keeps streaming until it has exited.
pub async fn run_once(
    supervisor: &ProcessSupervisor,
    command: &str,
    cwd: Option<&Path>,
    poll: Duration,
) -> anyhow::Result<i32> {
    let started = supervisor.start(command, cwd).await?;
    let handle = started.handle.to_string();

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut interrupted = false;
    let mut ticker = tokio::time::interval(poll);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = &mut ctrl_c, if !interrupted => {
                interrupted = true;
                info!("Interrupted, stopping process {}", handle);
                if let StopOutcome::AlreadyStopped { final_status } = supervisor.stop(&handle).await? {
                    info!("Process {} already {}", handle, final_status);
                }
            }
        }

        let output = supervisor.get_output(&handle).await?;
        if !output.stdout.is_empty() {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(output.stdout.as_bytes())?;
            stdout.flush()?;
        }
        if !output.stderr.is_empty() {
            let mut stderr = std::io::stderr().lock();
            stderr.write_all(output.stderr.as_bytes())?;
            stderr.flush()?;
        }

        match output.status {
            ProcessStatus::Running => continue,
            ProcessStatus::Exited => {
                // killed by a signal: no exit code
                return Ok(output.exit_code.unwrap_or(if interrupted { 130 } else { 1 }));
            }
            ProcessStatus::Error => {
                warn!("Process {} ended with a runtime error", handle);
                return Ok(1);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bgproc_task::CommandLine;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_single_argument_is_a_shell_line() {
        let line = command_line(&argv(&["npm run dev && echo done"])).unwrap();
        assert_eq!(line, "npm run dev && echo done");
    }

    #[test]
    fn test_argv_keeps_quoting() {
        let line = command_line(&argv(&["printf", "%s|", "a b"])).unwrap();
        assert_ne!(line, "printf %s| a b");

        let parsed = CommandLine::parse(&line).unwrap();
        assert_eq!(parsed.program(), "printf");
        assert_eq!(parsed.args().collect::<Vec<_>>(), vec!["%s|", "a b"]);
    }

    #[test]
    fn test_argv_rejects_nul() {
        assert!(command_line(&argv(&["echo", "a\0b"])).is_err());
    }
}

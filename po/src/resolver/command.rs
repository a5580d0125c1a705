//! `{{ EXEC:cmd args }}` - captured stdout of a shell-free subprocess

use std::process::Stdio;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, warn};

use super::{EXEC_PREFIX, InlineError, Resolution};
use crate::context::Context;

/// Characters that would let a command chain, pipe or expand if it ever
/// reached a shell
const UNSAFE_CHARS: &[char] = &[';', '&', '|', '$', '`', '\n', '\r'];

#[derive(Debug, Error)]
enum ExecError {
    #[error("empty command")]
    Empty,

    #[error("{0}")]
    Spawn(#[source] std::io::Error),

    #[error("Command timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u128 },

    #[error("failed to start runtime: {0}")]
    Runtime(#[source] std::io::Error),

    #[error("command runner panicked")]
    Panicked,
}

pub(super) fn resolve(placeholder: &str, ctx: &Context) -> Resolution {
    let Some(command) = placeholder.strip_prefix(EXEC_PREFIX) else {
        return Resolution::Unresolved;
    };

    if command.contains(UNSAFE_CHARS) {
        warn!(%command, "Refused EXEC with unsafe characters");
        return Resolution::Failed(InlineError::UnsafeCommand);
    }

    match run(command, ctx.command_timeout()) {
        Ok(stdout) => Resolution::Value(stdout),
        Err(e) => {
            warn!(%command, %e, "EXEC failed");
            Resolution::Failed(InlineError::Command(e.to_string()))
        }
    }
}

/// Split on whitespace and run as an argv list, never through a shell
fn run(command: &str, timeout: Duration) -> Result<String, ExecError> {
    let argv: Vec<&str> = command.split_whitespace().collect();
    let Some((program, args)) = argv.split_first() else {
        return Err(ExecError::Empty);
    };
    debug!(%program, ?args, ?timeout, "command::run: called");

    // A nested block_on would panic inside an existing runtime, so hop onto a
    // plain thread in that case
    if tokio::runtime::Handle::try_current().is_ok() {
        debug!("command::run: inside a runtime, running on a scoped thread");
        return std::thread::scope(|scope| {
            scope
                .spawn(|| run_blocking(program, args, timeout))
                .join()
                .unwrap_or(Err(ExecError::Panicked))
        });
    }

    run_blocking(program, args, timeout)
}

fn run_blocking(program: &str, args: &[&str], timeout: Duration) -> Result<String, ExecError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(ExecError::Runtime)?;

    runtime.block_on(async {
        let mut cmd = tokio::process::Command::new(program);
        cmd.args(args).stdin(Stdio::null()).kill_on_drop(true);

        match tokio::time::timeout(timeout, cmd.output()).await {
            Ok(Ok(output)) => {
                debug!(status = ?output.status, "command::run_blocking: command completed");
                Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
            }
            Ok(Err(e)) => Err(ExecError::Spawn(e)),
            Err(_) => Err(ExecError::Timeout {
                timeout_ms: timeout.as_millis(),
            }),
        }
    })
}

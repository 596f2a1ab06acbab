//! Script execution and the per-session run throttle.
//!
//! Execution is deliberately unguarded: no timeout, no sandbox and no
//! resource limits. The interpreter is trusted with the session file as is.

use std::io;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

use crate::session::SessionRecord;

/// Message returned instead of program output while throttled.
pub const THROTTLE_MESSAGE: &str = "Running code too much within a short time period. Please wait a few seconds before clicking \"Run\" each time.";

/// Default ceiling on run submissions per second.
pub const DEFAULT_MAX_RUNS_PER_SEC: f64 = 5.0;

/// Elapsed time is never treated as shorter than this, and a window this old
/// is restarted on the next accepted run.
const MIN_WINDOW: Duration = Duration::from_secs(1);

/// Errors raised while running a submission.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("nothing to run: submit code for checking first")]
    NoSubmission,

    #[error("failed to launch interpreter `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
}

/// Outcome of a throttle check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThrottleDecision {
    Allowed,
    Throttled,
}

/// Rate limiter on run submissions, keyed by session record.
#[derive(Debug, Clone, Copy)]
pub struct RunThrottle {
    max_rate: f64,
}

impl Default for RunThrottle {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RUNS_PER_SEC)
    }
}

impl RunThrottle {
    pub fn new(max_rate: f64) -> Self {
        Self { max_rate }
    }

    pub fn max_rate(&self) -> f64 {
        self.max_rate
    }

    /// Count a run submission and decide whether it may proceed.
    ///
    /// Throttled submissions still count towards the window.
    pub fn check(&self, session: &mut SessionRecord, now: DateTime<Utc>) -> ThrottleDecision {
        session.run_count = session.run_count.saturating_add(1);

        let elapsed = (now - session.window_start).to_std().unwrap_or_default();
        let elapsed_secs = elapsed.max(MIN_WINDOW).as_secs_f64();

        if f64::from(session.run_count) / elapsed_secs > self.max_rate {
            debug!(
                session = %session.id,
                run_count = session.run_count,
                elapsed_secs,
                "Run throttled"
            );
            return ThrottleDecision::Throttled;
        }

        if elapsed >= MIN_WINDOW {
            session.window_start = now;
            session.run_count = 1;
        }
        ThrottleDecision::Allowed
    }
}

/// Run `script` with `interpreter`, returning stdout and stderr merged in
/// the order the program wrote them.
pub async fn execute(interpreter: &str, script: &Path) -> Result<String, RunError> {
    let output = merged_output_command(interpreter, script)
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|source| RunError::Spawn {
            program: interpreter.to_string(),
            source,
        })?;

    debug!(
        interpreter,
        script = %script.display(),
        status = ?output.status.code(),
        "Script finished"
    );

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

#[cfg(unix)]
fn merged_output_command(interpreter: &str, script: &Path) -> Command {
    let mut command = Command::new("sh");
    command
        .arg("-c")
        .arg("\"$0\" \"$1\" 2>&1")
        .arg(interpreter)
        .arg(script);
    command
}

#[cfg(windows)]
fn merged_output_command(interpreter: &str, script: &Path) -> Command {
    let mut command = Command::new("cmd");
    command
        .arg("/C")
        .arg(format!("\"{}\" \"{}\" 2>&1", interpreter, script.display()));
    command
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    fn record_at(start: DateTime<Utc>) -> SessionRecord {
        SessionRecord::started_at("s1", start)
    }

    #[test]
    fn test_sixth_run_within_a_second_is_throttled() {
        let start = Utc::now();
        let mut session = record_at(start);
        let throttle = RunThrottle::default();

        for i in 0..5 {
            let now = start + TimeDelta::milliseconds(100 * i);
            assert_eq!(throttle.check(&mut session, now), ThrottleDecision::Allowed, "run {i}");
        }
        let sixth = start + TimeDelta::milliseconds(600);
        assert_eq!(throttle.check(&mut session, sixth), ThrottleDecision::Throttled);
    }

    #[test]
    fn test_window_restarts_after_quiet_period() {
        let start = Utc::now();
        let mut session = record_at(start);
        let throttle = RunThrottle::default();

        for _ in 0..6 {
            throttle.check(&mut session, start);
        }
        let later = start + TimeDelta::seconds(3);
        assert_eq!(throttle.check(&mut session, later), ThrottleDecision::Allowed);
        assert_eq!(session.run_count, 1);
        assert_eq!(session.window_start, later);
    }

    #[test]
    fn test_clock_going_backwards_counts_as_min_window() {
        let start = Utc::now();
        let mut session = record_at(start);
        let throttle = RunThrottle::new(1.0);

        let earlier = start - TimeDelta::seconds(10);
        assert_eq!(throttle.check(&mut session, earlier), ThrottleDecision::Allowed);
        assert_eq!(throttle.check(&mut session, earlier), ThrottleDecision::Throttled);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_execute_merges_stdout_and_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("job.sh");
        std::fs::write(&script, "echo out\necho err 1>&2\necho done\n").unwrap();

        let output = execute("sh", &script).await.unwrap();
        assert_eq!(output, "out\nerr\ndone\n");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_execute_reports_program_output_even_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.py");

        // The shell starts fine; the interpreter's complaint becomes output.
        let output = execute("definitely-not-an-interpreter", &missing).await.unwrap();
        assert!(!output.is_empty());
    }
}

//! Static analysis of a submission.
//!
//! The submission is written to the session temp file and pylint is run
//! against it with refactor and convention checks disabled and reports off.
//! The message template reproduces the line layout the formatter expects.

use std::io;
use std::path::Path;
use std::process::Stdio;

use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, error};

use crate::format::{FormatError, FormattedErrors, LinePlatform, format_errors};
use crate::session::SessionStore;

/// Pylint message template producing `path:line: category (code, symbol, obj) message`.
pub const MSG_TEMPLATE: &str = "{path}:{line}: {category} ({msg_id}, {symbol}, {obj}) {msg}";

/// Errors raised while analyzing a submission.
#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error("Issue with pylint configuration: {0}")]
    Configuration(String),

    #[error("failed to launch analyzer `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to write submission: {0}")]
    Submission(#[source] io::Error),

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error("formatter task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Analyzer command line; the file path is appended as the last argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzerConfig {
    pub program: String,
    pub args: Vec<String>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            program: "pylint".to_string(),
            args: vec![
                "-r".to_string(),
                "n".to_string(),
                "--disable=R,C".to_string(),
                format!("--msg-template={}", MSG_TEMPLATE),
            ],
        }
    }
}

/// Captured analyzer streams.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalyzerOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Run the analyzer against `path`, capturing stdout and stderr separately.
///
/// The exit status is ignored: pylint exits non-zero whenever it reports
/// findings.
pub async fn run_analyzer(config: &AnalyzerConfig, path: &Path) -> Result<AnalyzerOutput, AnalyzerError> {
    let output = Command::new(&config.program)
        .args(&config.args)
        .arg(path)
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|source| AnalyzerError::Spawn {
            program: config.program.clone(),
            source,
        })?;

    debug!(
        program = %config.program,
        path = %path.display(),
        status = ?output.status.code(),
        stdout_bytes = output.stdout.len(),
        stderr_bytes = output.stderr.len(),
        "Analyzer finished"
    );

    Ok(AnalyzerOutput {
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

/// Write `text` to the session file, analyze it and format the findings.
pub async fn evaluate(
    store: &SessionStore,
    config: &AnalyzerConfig,
    session_id: &str,
    text: &str,
) -> Result<FormattedErrors, AnalyzerError> {
    let path = store
        .write_submission(session_id, text)
        .map_err(AnalyzerError::Submission)?;

    let output = run_analyzer(config, &path).await?;
    if !output.stderr.trim().is_empty() {
        error!(stderr = %output.stderr.trim(), "Analyzer wrote to stderr");
        return Err(AnalyzerError::Configuration(output.stderr.trim().to_string()));
    }

    let stdout = output.stdout;
    let formatted =
        tokio::task::spawn_blocking(move || format_errors(&stdout, LinePlatform::host())).await??;
    Ok(formatted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_disables_refactor_and_convention() {
        let config = AnalyzerConfig::default();
        assert_eq!(config.program, "pylint");
        assert!(config.args.contains(&"--disable=R,C".to_string()));
        assert!(config.args.windows(2).any(|w| w[0] == "-r" && w[1] == "n"));
        assert!(config.args.iter().any(|a| a.starts_with("--msg-template=")));
    }

    #[tokio::test]
    async fn test_missing_program_is_spawn_error() {
        let config = AnalyzerConfig {
            program: "definitely-not-an-installed-analyzer".to_string(),
            args: Vec::new(),
        };
        let result = run_analyzer(&config, Path::new("x.py")).await;
        assert!(matches!(result, Err(AnalyzerError::Spawn { .. })));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_stderr_is_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        let config = AnalyzerConfig {
            program: "sh".to_string(),
            args: vec!["-c".to_string(), "echo bad option >&2".to_string()],
        };

        let result = evaluate(&store, &config, "s1", "x = 1\n").await;
        match result {
            Err(AnalyzerError::Configuration(message)) => assert_eq!(message, "bad option"),
            other => panic!("expected configuration error, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_evaluate_formats_stdout() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        let script = "printf '%s\\n' '************* Module m' \"$0:2: warning (W0612, unused-variable, f) Unused variable 'x' here\"";
        let config = AnalyzerConfig {
            program: "sh".to_string(),
            args: vec!["-c".to_string(), script.to_string()],
        };

        let records = evaluate(&store, &config, "s1", "def f():\n    x = 1\n")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(records.len(), 1);
        let record = records[0].as_ref().unwrap();
        assert_eq!(record.line, 2);
        assert_eq!(record.error, "unused-variable");
    }
}

//! Pylint text output → structured error records.
//!
//! The analyzer prints one finding per line in the form
//!
//! ```text
//! /tmp/pycheck_x.py:12: warning (W0611, unused-import, ) Unused import os
//! ```
//!
//! preceded by a `************* Module ...` header and followed by a rating
//! summary. Lines are parsed independently on the rayon pool; the result
//! keeps input order, one entry per line after the header, with `None` for
//! lines that are not findings.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::codes::describe;

/// Marker of the trailing rating summary.
pub const RATING_MARKER: &str = "Your code has been rated at";

/// Category keywords that introduce a finding.
const FINDING_KEYWORDS: [&str; 3] = ["error", "warning", "fatal"];

/// Formatter output: `None` when the analyzer reported nothing, otherwise one
/// slot per output line after the header.
pub type FormattedErrors = Option<Vec<Option<ErrorRecord>>>;

/// Errors raised while formatting analyzer output.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("unknown pylint message code: {0}")]
    UnknownCode(String),

    #[error("malformed analyzer line: {0:?}")]
    MalformedLine(String),
}

/// One analyzer finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRecord {
    /// Message code, e.g. `W0611`.
    pub code: String,
    /// Message symbol, e.g. `unused-import`.
    pub error: String,
    /// Human-readable message.
    pub message: String,
    /// 1-based line number in the submission.
    pub line: u32,
    /// Long-form description of `code`.
    pub error_info: String,
}

/// Where the analyzer ran, which decides how the line number is located.
///
/// Windows paths start with a drive letter (`C:\...`), which adds one
/// colon-delimited field before the line number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinePlatform {
    Unix,
    Windows,
}

impl LinePlatform {
    /// The platform this binary was built for.
    pub fn host() -> Self {
        if cfg!(windows) {
            LinePlatform::Windows
        } else {
            LinePlatform::Unix
        }
    }

    fn line_field(self) -> usize {
        match self {
            LinePlatform::Unix => 1,
            LinePlatform::Windows => 2,
        }
    }
}

/// Format raw analyzer stdout.
pub fn format_errors(output: &str, platform: LinePlatform) -> Result<FormattedErrors, FormatError> {
    let lines: Vec<&str> = output.lines().collect();
    if lines.is_empty() || is_summary_only(&lines) {
        return Ok(None);
    }

    let records = lines[1..]
        .par_iter()
        .map(|line| process_line(line, platform))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Some(records))
}

/// Parse a single analyzer line.
///
/// Returns `Ok(None)` for blank lines and the rating summary.
pub fn process_line(line: &str, platform: LinePlatform) -> Result<Option<ErrorRecord>, FormatError> {
    if line.contains(RATING_MARKER) {
        return Ok(None);
    }

    let words: Vec<&str> = line.split_whitespace().collect();
    if words.len() < 3 {
        return Ok(None);
    }

    let malformed = || FormatError::MalformedLine(line.to_string());

    let line_number = line
        .split(':')
        .nth(platform.line_field())
        .and_then(|field| field.trim().parse::<u32>().ok())
        .ok_or_else(malformed)?;

    let keyword = words
        .iter()
        .position(|word| FINDING_KEYWORDS.contains(word))
        .ok_or_else(malformed)?;

    let code_index = keyword + 1;
    let code_token = words.get(code_index).ok_or_else(malformed)?;
    let kind_token = words.get(code_index + 1).ok_or_else(malformed)?;

    let code = strip_chars(code_token, 1, 1);
    let kind = strip_chars(kind_token, 0, 1);

    // The last token is dropped along with the `(code, kind, obj)` group.
    let message_start = code_index + 3;
    let message_end = words.len() - 1;
    let message = if message_start < message_end {
        words[message_start..message_end].join(" ")
    } else {
        String::new()
    };

    let error_info = describe(code).ok_or_else(|| FormatError::UnknownCode(code.to_string()))?;

    Ok(Some(ErrorRecord {
        code: code.to_string(),
        error: kind.to_string(),
        message,
        line: line_number,
        error_info: error_info.to_string(),
    }))
}

/// Returns true when the output is only the rating banner.
fn is_summary_only(lines: &[&str]) -> bool {
    let at = |index: usize| lines.get(index).copied().unwrap_or("");
    is_rule_line(at(1)) && at(2).contains(RATING_MARKER) && !at(0).contains("module")
}

/// Pylint sizes the rule above the rating to the rating line's width.
fn is_rule_line(line: &str) -> bool {
    let line = line.trim();
    !line.is_empty() && line.chars().all(|c| c == '-')
}

/// Drop `front` leading and `back` trailing characters.
fn strip_chars(token: &str, front: usize, back: usize) -> &str {
    let mut chars = token.chars();
    for _ in 0..front {
        chars.next();
    }
    for _ in 0..back {
        chars.next_back();
    }
    chars.as_str()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLEAN_OUTPUT: &str = "\n--------------------------------------------------------------------\nYour code has been rated at 10.00/10 (previous run: 7.50/10, +2.50)\n\n";

    #[test]
    fn test_summary_only_output_is_none() {
        assert_eq!(format_errors(CLEAN_OUTPUT, LinePlatform::Unix), Ok(None));
    }

    #[test]
    fn test_first_run_banner_is_none() {
        let output = format!("\n{}\nYour code has been rated at 10.00/10\n\n", "-".repeat(36));
        assert_eq!(format_errors(&output, LinePlatform::Unix), Ok(None));
    }

    #[test]
    fn test_banner_rule_of_any_width_is_none() {
        let output = format!(
            "\n{}\nYour code has been rated at 10.00/10 (previous run: 10.00/10, +0.00)\n\n",
            "-".repeat(67)
        );
        assert_eq!(format_errors(&output, LinePlatform::Unix), Ok(None));
    }

    #[test]
    fn test_rule_line_detection() {
        assert!(is_rule_line("------"));
        assert!(is_rule_line("  ---  "));
        assert!(!is_rule_line(""));
        assert!(!is_rule_line("--x--"));
    }

    #[test]
    fn test_empty_output_is_none() {
        assert_eq!(format_errors("", LinePlatform::Unix), Ok(None));
    }

    #[test]
    fn test_process_line_spec_example() {
        let record = process_line(
            "file.py:12: warning (W0611, unused-import) 'os' imported but unused",
            LinePlatform::Unix,
        )
        .unwrap()
        .unwrap();

        assert_eq!(record.line, 12);
        assert_eq!(record.code, "W0611");
        assert_eq!(record.error, "unused-import");
        assert!(!record.message.is_empty());
        assert_eq!(record.error_info, describe("W0611").unwrap());
    }

    #[test]
    fn test_process_line_template_format() {
        let record = process_line(
            "/tmp/pycheck_ab.py:3: error (E0602, undefined-variable, ) Undefined variable 'foo' here",
            LinePlatform::Unix,
        )
        .unwrap()
        .unwrap();

        assert_eq!(record.line, 3);
        assert_eq!(record.code, "E0602");
        assert_eq!(record.error, "undefined-variable");
        assert_eq!(record.message, "Undefined variable 'foo'");
    }

    #[test]
    fn test_process_line_windows_drive_letter() {
        let record = process_line(
            r"C:\Temp\pycheck_ab.py:7: warning (W0612, unused-variable, main) Unused variable 'x' now",
            LinePlatform::Windows,
        )
        .unwrap()
        .unwrap();

        assert_eq!(record.line, 7);
        assert_eq!(record.code, "W0612");
    }

    #[test]
    fn test_process_line_blank_and_rating() {
        assert_eq!(process_line("", LinePlatform::Unix), Ok(None));
        assert_eq!(process_line(" ", LinePlatform::Unix), Ok(None));
        assert_eq!(
            process_line("Your code has been rated at 5.00/10", LinePlatform::Unix),
            Ok(None)
        );
    }

    #[test]
    fn test_process_line_unknown_code() {
        let result = process_line(
            "x.py:1: warning (W9999, made-up, ) Something odd here",
            LinePlatform::Unix,
        );
        assert_eq!(result, Err(FormatError::UnknownCode("W9999".to_string())));
    }

    #[test]
    fn test_process_line_without_keyword_is_malformed() {
        let result = process_line("x.py:1: note (W0611, a, ) b c", LinePlatform::Unix);
        assert!(matches!(result, Err(FormatError::MalformedLine(_))));
    }

    #[test]
    fn test_format_errors_keeps_line_order() {
        let output = "************* Module pycheck_ab\n\
            /tmp/pycheck_ab.py:1: warning (W0611, unused-import, ) Unused import os here\n\
            /tmp/pycheck_ab.py:4: error (E0602, undefined-variable, ) Undefined variable 'y' here\n\
            \n\
            --------------------------------------------------------------------\n\
            Your code has been rated at 0.00/10\n";

        let records = format_errors(output, LinePlatform::Unix).unwrap().unwrap();

        assert_eq!(records.len(), 5);
        assert_eq!(records[0].as_ref().unwrap().line, 1);
        assert_eq!(records[1].as_ref().unwrap().code, "E0602");
        assert!(records[2].is_none());
        assert!(records[3].is_none());
        assert!(records[4].is_none());
    }

    #[test]
    fn test_format_errors_is_idempotent() {
        let output = "************* Module m\nm.py:2: warning (W0101, unreachable, f) Unreachable code here\n";
        let first = format_errors(output, LinePlatform::Unix);
        let second = format_errors(output, LinePlatform::Unix);
        assert_eq!(first, second);
    }

    #[test]
    fn test_error_record_json_field_names() {
        let record = ErrorRecord {
            code: "W0611".to_string(),
            error: "unused-import".to_string(),
            message: "Unused import".to_string(),
            line: 1,
            error_info: "info".to_string(),
        };
        let json = serde_json::to_value(&record).unwrap();
        for key in ["code", "error", "message", "line", "error_info"] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
    }

    #[test]
    fn test_strip_chars() {
        assert_eq!(strip_chars("(W0611,", 1, 1), "W0611");
        assert_eq!(strip_chars("unused-import,", 0, 1), "unused-import");
        assert_eq!(strip_chars("x", 1, 1), "");
    }
}

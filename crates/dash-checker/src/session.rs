//! Per-user session state.
//!
//! Each browser session owns one temporary `.py` file. The first submission
//! creates it; later submissions overwrite it in place, so the file always
//! holds the most recent submission only. Files outlive individual requests
//! and are removed only by [`SessionStore::purge`] at shutdown.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::{debug, warn};
use uuid::Uuid;

/// Prefix of every session temp file.
const TEMP_FILE_PREFIX: &str = "pycheck_";

/// Per-session state.
#[derive(Debug, Clone)]
pub struct SessionRecord {
    /// Opaque session identifier.
    pub id: String,
    /// Last submitted source text.
    pub code: Option<String>,
    /// Session temp file, once a submission has been written.
    pub file_path: Option<PathBuf>,
    /// Run submissions counted in the current throttle window.
    pub run_count: u32,
    /// Start of the current throttle window.
    pub window_start: DateTime<Utc>,
}

impl SessionRecord {
    /// Create a fresh record whose throttle window starts now.
    pub fn new(id: impl Into<String>) -> Self {
        Self::started_at(id, Utc::now())
    }

    /// Create a fresh record with an explicit window start.
    pub fn started_at(id: impl Into<String>, window_start: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            code: None,
            file_path: None,
            run_count: 0,
            window_start,
        }
    }
}

/// Concurrent session store keyed by session id.
///
/// Cloning is cheap; clones share the same map.
#[derive(Debug, Clone)]
pub struct SessionStore {
    sessions: Arc<DashMap<String, SessionRecord>>,
    temp_dir: PathBuf,
}

impl SessionStore {
    /// Create a store that places temp files in `temp_dir`.
    pub fn new(temp_dir: impl Into<PathBuf>) -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
            temp_dir: temp_dir.into(),
        }
    }

    /// Create a store backed by the system temp directory.
    pub fn in_system_temp() -> Self {
        Self::new(std::env::temp_dir())
    }

    /// Generate a new opaque session id.
    pub fn new_session_id() -> String {
        Uuid::new_v4().simple().to_string()
    }

    /// Directory holding session temp files.
    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    /// Number of known sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Returns true if no session has been seen yet.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Snapshot of a session, if it exists.
    pub fn get(&self, id: &str) -> Option<SessionRecord> {
        self.sessions.get(id).map(|record| record.clone())
    }

    /// Snapshot of a session, creating it first if needed.
    pub fn get_or_create(&self, id: &str) -> SessionRecord {
        self.with_session(id, |record| record.clone())
    }

    /// Run `f` against the session record, creating the record if needed.
    ///
    /// The shard lock is held while `f` runs; keep it short and never do I/O
    /// inside.
    pub fn with_session<R>(&self, id: &str, f: impl FnOnce(&mut SessionRecord) -> R) -> R {
        let mut entry = self
            .sessions
            .entry(id.to_string())
            .or_insert_with(|| SessionRecord::new(id));
        f(entry.value_mut())
    }

    /// Store `text` as the session's latest submission and write it to the
    /// session temp file, returning the file path.
    ///
    /// An existing session file is truncated and overwritten. If the session
    /// has no file yet, or the old one can no longer be opened, a new kept
    /// temp file is created in the store's directory.
    pub fn write_submission(&self, id: &str, text: &str) -> io::Result<PathBuf> {
        let existing = self.with_session(id, |record| {
            record.code = Some(text.to_string());
            record.file_path.clone()
        });

        if let Some(path) = existing {
            match overwrite(&path, text) {
                Ok(()) => return Ok(path),
                Err(e) => {
                    warn!(
                        session = %id,
                        path = %path.display(),
                        error = %e,
                        "Session file unusable, creating a new one"
                    );
                }
            }
        }

        let path = self.create_file(text)?;
        debug!(session = %id, path = %path.display(), "Created session file");
        self.with_session(id, |record| record.file_path = Some(path.clone()));
        Ok(path)
    }

    /// Drop every session and delete its temp file.
    ///
    /// Returns the number of files removed.
    pub fn purge(&self) -> usize {
        let paths: Vec<PathBuf> = self
            .sessions
            .iter()
            .filter_map(|entry| entry.file_path.clone())
            .collect();
        self.sessions.clear();

        let mut removed = 0;
        for path in paths {
            match std::fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove session file"),
            }
        }
        removed
    }

    fn create_file(&self, text: &str) -> io::Result<PathBuf> {
        let mut file = tempfile::Builder::new()
            .prefix(TEMP_FILE_PREFIX)
            .suffix(".py")
            .tempfile_in(&self.temp_dir)?;
        file.write_all(text.as_bytes())?;
        file.flush()?;
        let (_, path) = file.keep().map_err(|e| e.error)?;
        Ok(path)
    }
}

fn overwrite(path: &Path, text: &str) -> io::Result<()> {
    let mut file = OpenOptions::new().write(true).truncate(true).open(path)?;
    file.write_all(text.as_bytes())?;
    file.flush()
}

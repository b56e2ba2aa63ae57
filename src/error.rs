// SPDX-License-Identifier: PMPL-1.0-or-later

//! Unified error model for the audit pipeline.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuditError {
    /// A required tool or input is missing or unusable. Aborts the run
    /// before any engine invocation starts.
    #[error("configuration: {0}")]
    Configuration(String),

    /// The seed document is missing, empty, or unparseable. Callers recover
    /// with the built-in default seed; this never aborts a run.
    #[error("seed input: {0}")]
    SeedInput(String),

    /// An engine invocation or recovery query failed. Logged as a warning;
    /// the outcome is decided by the next recovery query, not the exit code.
    #[error("engine: {0}")]
    Engine(String),

    /// A wordlist, log, or summary write failed. Fatal for that write.
    #[error("persistence: {path}: {source}")]
    Persistence {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl AuditError {
    pub fn persistence(path: &Path, source: io::Error) -> Self {
        AuditError::Persistence {
            path: path.to_path_buf(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, AuditError>;

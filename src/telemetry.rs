// SPDX-License-Identifier: PMPL-1.0-or-later

//! Structured JSONL telemetry and the end-of-run summary table.
//!
//! Every stage execution appends one record to the run's stage log,
//! including skips; the synthesis engine appends one record per wordlist
//! build. The summary is one tabular row per target, written to CSV and
//! echoed to the console.

use crate::error::{AuditError, Result};
use crate::types::{EngineStatus, TargetOutcome};
use chrono::Utc;
use colored::Colorize;
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Append-only JSON-lines log.
pub struct JsonlLog {
    path: PathBuf,
}

impl JsonlLog {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append<T: Serialize>(&self, record: &T) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|err| AuditError::persistence(parent, err))?;
            }
        }
        let line = serde_json::to_string(record).map_err(|err| {
            AuditError::persistence(&self.path, std::io::Error::other(err.to_string()))
        })?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|err| AuditError::persistence(&self.path, err))?;
        writeln!(file, "{line}").map_err(|err| AuditError::persistence(&self.path, err))
    }
}

/// One record per stage execution, including skips.
#[derive(Debug, Serialize)]
pub struct StageRecord<'a> {
    pub ts: String,
    pub target: &'a str,
    pub fingerprint: &'a str,
    pub stage: &'a str,
    pub duration_secs: f64,
    pub recovered: usize,
    pub skipped: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<f64>,
}

impl<'a> StageRecord<'a> {
    pub fn new(
        target: &'a str,
        fingerprint: &'a str,
        stage: &'a str,
        duration: Duration,
        recovered: usize,
        skipped: bool,
        status: Option<EngineStatus>,
    ) -> Self {
        Self {
            ts: now_rfc3339(),
            target,
            fingerprint,
            stage,
            duration_secs: duration.as_secs_f64(),
            recovered,
            skipped,
            speed: status.map(|s| s.speed),
            progress: status.and_then(|s| s.progress),
        }
    }
}

/// One record per synthesis run.
#[derive(Debug, Serialize)]
pub struct WordlistRecord {
    pub ts: String,
    pub seeds: usize,
    pub tokens: usize,
    pub candidates: usize,
    pub output: String,
    pub sample: Vec<String>,
}

pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339()
}

/// Timestamp fragment used in per-run log file names.
pub fn run_id() -> String {
    Utc::now().format("%Y%m%d%H%M%S").to_string()
}

/// Write the per-target outcome table: label, found flag, stage-if-found,
/// guess, cumulative elapsed seconds.
pub fn write_summary(path: &Path, outcomes: &[TargetOutcome]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|err| AuditError::persistence(parent, err))?;
        }
    }
    let mut body = String::from("target,found,stage,guess,elapsed_secs\n");
    for outcome in outcomes {
        body.push_str(&format!(
            "{},{},{},{},{}\n",
            csv_field(&outcome.label),
            outcome.found,
            csv_field(outcome.stage.as_deref().unwrap_or("")),
            csv_field(outcome.guess.as_deref().unwrap_or("")),
            outcome.elapsed_secs
        ));
    }
    fs::write(path, body).map_err(|err| AuditError::persistence(path, err))
}

fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Console rendition of the summary table.
pub fn print_summary(outcomes: &[TargetOutcome]) {
    println!();
    println!("{}", "Audit summary".bold());
    println!(
        "  {:<24} {:<10} {:<8} {:<20} {}",
        "target", "outcome", "stage", "guess", "elapsed"
    );
    for outcome in outcomes {
        let state = if outcome.found {
            "recovered".green().bold()
        } else {
            "exhausted".red()
        };
        println!(
            "  {:<24} {:<10} {:<8} {:<20} {}s",
            outcome.label,
            state,
            outcome.stage.as_deref().unwrap_or("-"),
            outcome.guess.as_deref().unwrap_or("-"),
            outcome.elapsed_secs
        );
    }
}

// SPDX-License-Identifier: PMPL-1.0-or-later

//! Core type definitions for the audit pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// One recoverable credential, represented by one hash artifact on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Stable identifier derived from the hash file stem.
    pub id: String,
    pub hash_path: PathBuf,
    /// Human label from the lookup table, or the file stem when unmapped.
    pub label: String,
    /// Short content fingerprint of the artifact, recorded in telemetry.
    pub fingerprint: String,
}

/// Engine attack modes, numbered the way the worker expects them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttackMode {
    Dictionary,
    Combinator,
    Mask,
}

impl AttackMode {
    pub fn as_arg(&self) -> &'static str {
        match self {
            AttackMode::Dictionary => "0",
            AttackMode::Combinator => "1",
            AttackMode::Mask => "3",
        }
    }
}

/// One concrete engine run with fixed arguments and a session name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub stage: &'static str,
    pub session: String,
    pub mode: AttackMode,
    /// Wordlist paths, mask strings, and rule flags, in engine order.
    pub attack_args: Vec<String>,
    /// Wall-clock ceiling enforced by the engine, in seconds.
    pub runtime_secs: u64,
}

/// Last structured status observed on the engine's output stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineStatus {
    /// Instantaneous guess rate summed across reported compute devices.
    pub speed: u64,
    /// Completed/total fraction, when the engine reports both counters.
    pub progress: Option<f64>,
}

/// How one engine invocation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineExit {
    /// Exit 0: the engine stopped after recovering something.
    Completed,
    /// Exit 1: the keyspace was exhausted without a new recovery.
    Exhausted,
    /// Any other exit: an engine problem, reported as a warning.
    Error(i32),
}

/// What the engine reported for one invocation.
#[derive(Debug, Clone)]
pub struct InvocationReport {
    pub exit: EngineExit,
    /// True when the invocation resumed an existing session checkpoint.
    pub resumed: bool,
    pub last_status: Option<EngineStatus>,
    /// Last stderr lines, kept for the warning message on engine errors.
    pub stderr_tail: Vec<String>,
}

/// Result of driving one stage for one target.
#[derive(Debug, Clone)]
pub struct StageResult {
    pub stage: &'static str,
    pub duration: Duration,
    /// Plaintexts newly present in the store relative to the stage baseline.
    pub recovered: Vec<String>,
    pub skipped: bool,
    pub last_status: Option<EngineStatus>,
}

/// Final outcome for one target; one summary row.
#[derive(Debug, Clone, Serialize)]
pub struct TargetOutcome {
    pub label: String,
    pub found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guess: Option<String>,
    pub elapsed_secs: u64,
}

// SPDX-License-Identifier: PMPL-1.0-or-later

//! Invocation contract for the external cracking worker.
//!
//! The worker is consumed as a black box: it takes a hash mode, an attack
//! mode, a hash artifact, wordlist/mask arguments, the durable store path,
//! and a session name; it emits JSON status lines interleaved with free
//! text on stdout. Exit 0 means it stopped after a recovery, exit 1 means
//! the keyspace was exhausted, anything else is an engine problem reported
//! as a warning.

use crate::config::AuditConfig;
use crate::error::{AuditError, Result};
use crate::session;
use crate::types::{EngineExit, EngineStatus, Invocation, InvocationReport, Target};
use serde::Deserialize;
use std::fs;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;

/// Places the worker binary is probed for, in order.
const BINARY_CANDIDATES: [&str; 5] = [
    "hashcat",
    "/usr/bin/hashcat",
    "/usr/local/bin/hashcat",
    "/opt/homebrew/bin/hashcat",
    "/opt/local/bin/hashcat",
];

/// Stderr lines kept for warning messages.
const STDERR_TAIL: usize = 3;

/// Something that can execute one engine invocation for one target.
pub trait Engine {
    fn run(&self, target: &Target, invocation: &Invocation) -> Result<InvocationReport>;
}

pub struct HashcatEngine {
    binary: PathBuf,
    hash_mode: u32,
    potfile: PathBuf,
    sessions_dir: PathBuf,
    status_timer: u64,
}

impl HashcatEngine {
    pub fn new(
        binary: PathBuf,
        hash_mode: u32,
        potfile: PathBuf,
        sessions_dir: PathBuf,
        status_timer: u64,
    ) -> Self {
        Self {
            binary,
            hash_mode,
            potfile,
            sessions_dir,
            status_timer,
        }
    }

    /// Probe for the worker binary and prepare the session checkpoint
    /// directory. A missing binary aborts the run before any invocation.
    pub fn locate(cfg: &AuditConfig) -> Result<Self> {
        let binary = find_binary().ok_or_else(|| {
            AuditError::Configuration(
                "hashcat not found; install it or put it on PATH before running an audit"
                    .to_string(),
            )
        })?;
        fs::create_dir_all(&cfg.sessions_dir)
            .map_err(|err| AuditError::persistence(&cfg.sessions_dir, err))?;
        Ok(Self::new(
            binary,
            cfg.hash_mode,
            cfg.potfile.clone(),
            cfg.sessions_dir.clone(),
            cfg.status_timer,
        ))
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    pub fn hash_mode(&self) -> u32 {
        self.hash_mode
    }

    pub fn potfile(&self) -> &Path {
        &self.potfile
    }

    pub fn version(&self) -> Option<String> {
        Command::new(&self.binary)
            .arg("--version")
            .output()
            .ok()
            .and_then(|out| String::from_utf8(out.stdout).ok())
            .map(|s| s.trim().to_string())
    }

    /// Build the argument vector for one invocation. An existing checkpoint
    /// selects the resume form, which carries the original arguments
    /// implicitly; the fresh form gets the full attack arguments plus the
    /// runtime ceiling and checkpoint path.
    pub fn command_args(&self, target: &Target, invocation: &Invocation) -> (Vec<String>, bool) {
        let restore = session::restore_file(&self.sessions_dir, &invocation.session);
        let mut args: Vec<String> = vec![
            "--session".to_string(),
            invocation.session.clone(),
            "--restore-file-path".to_string(),
            restore.display().to_string(),
        ];
        if session::has_checkpoint(&self.sessions_dir, &invocation.session) {
            args.push("--restore".to_string());
            return (args, true);
        }
        args.extend([
            "-m".to_string(),
            self.hash_mode.to_string(),
            "-a".to_string(),
            invocation.mode.as_arg().to_string(),
            "--status".to_string(),
            "--status-json".to_string(),
            "--status-timer".to_string(),
            self.status_timer.to_string(),
            "--potfile-path".to_string(),
            self.potfile.display().to_string(),
            "--outfile-autohex-disable".to_string(),
            "--runtime".to_string(),
            invocation.runtime_secs.to_string(),
            target.hash_path.display().to_string(),
        ]);
        args.extend(invocation.attack_args.iter().cloned());
        (args, false)
    }
}

impl Engine for HashcatEngine {
    fn run(&self, target: &Target, invocation: &Invocation) -> Result<InvocationReport> {
        let (args, resumed) = self.command_args(target, invocation);
        let mut child = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| {
                AuditError::Engine(format!("failed to start {}: {err}", self.binary.display()))
            })?;

        let stderr_thread = child.stderr.take().map(|pipe| {
            thread::spawn(move || {
                let mut tail: Vec<String> = Vec::new();
                for line in BufReader::new(pipe).lines().map_while(std::io::Result::ok) {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    if tail.len() == STDERR_TAIL {
                        tail.remove(0);
                    }
                    tail.push(trimmed.to_string());
                }
                tail
            })
        });

        let mut last_status = None;
        if let Some(stdout) = child.stdout.take() {
            for line in BufReader::new(stdout).lines().map_while(std::io::Result::ok) {
                if let Some(status) = parse_status_line(&line) {
                    last_status = Some(status);
                }
            }
        }

        let status = child.wait().map_err(|err| {
            AuditError::Engine(format!("waiting for session {}: {err}", invocation.session))
        })?;
        let stderr_tail = stderr_thread
            .and_then(|handle| handle.join().ok())
            .unwrap_or_default();

        let exit = match status.code() {
            Some(0) => EngineExit::Completed,
            Some(1) => EngineExit::Exhausted,
            Some(code) => EngineExit::Error(code),
            // Killed by a signal.
            None => EngineExit::Error(-1),
        };

        Ok(InvocationReport {
            exit,
            resumed,
            last_status,
            stderr_tail,
        })
    }
}

fn find_binary() -> Option<PathBuf> {
    for candidate in BINARY_CANDIDATES {
        let probe = Command::new(candidate)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();
        if probe.map(|status| status.success()).unwrap_or(false) {
            return Some(PathBuf::from(candidate));
        }
    }
    None
}

#[derive(Debug, Deserialize)]
struct StatusLine {
    #[serde(default)]
    devices: Vec<DeviceLine>,
    #[serde(default)]
    progress: Vec<u64>,
}

#[derive(Debug, Deserialize)]
struct DeviceLine {
    #[serde(default)]
    speed: u64,
}

/// Parse one stdout line. JSON status lines yield the summed device speed
/// and, when both counters are present, the completed/total fraction; free
/// text yields nothing.
pub fn parse_status_line(line: &str) -> Option<EngineStatus> {
    let trimmed = line.trim_start();
    if !trimmed.starts_with('{') {
        return None;
    }
    let parsed: StatusLine = serde_json::from_str(trimmed).ok()?;
    let speed = parsed.devices.iter().map(|device| device.speed).sum();
    let progress = match parsed.progress[..] {
        [current, total] if total > 0 => Some(current as f64 / total as f64),
        _ => None,
    };
    Some(EngineStatus { speed, progress })
}

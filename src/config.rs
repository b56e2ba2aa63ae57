// SPDX-License-Identifier: PMPL-1.0-or-later

//! Layered run configuration: explicit CLI values override the YAML/JSON
//! configuration file, which overrides convention defaults relative to the
//! working root. Resolution happens once at startup; the resolved value is
//! immutable and passed into every component.

use crate::error::{AuditError, Result};
use crate::wordlist::GeneratorPolicy;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// WPA-PBKDF2-PMKID+EAPOL, the engine's hash mode for 22000 artifacts.
pub const DEFAULT_HASH_MODE: u32 = 22000;

pub const DEFAULT_STATUS_TIMER: u64 = 30;

/// Brute-force masks tried by the mask stage, in order.
pub const DEFAULT_MASKS: [&str; 4] = ["?d?d?d?d?d?d?d?d", "19?d?d?d?d", "20?d?d?d?d", "?d?d?d?d?d?d!"];

/// Raw file-level configuration; every field optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub root: Option<PathBuf>,
    pub hashes_dir: Option<PathBuf>,
    pub wordlists_dir: Option<PathBuf>,
    pub lists_dir: Option<PathBuf>,
    pub rules_dir: Option<PathBuf>,
    pub results_dir: Option<PathBuf>,
    pub logs_dir: Option<PathBuf>,
    pub sessions_dir: Option<PathBuf>,
    pub potfile: Option<PathBuf>,
    pub labels_file: Option<PathBuf>,
    pub base_wordlist: Option<PathBuf>,
    pub numbers_list: Option<PathBuf>,
    pub smart_list: Option<PathBuf>,
    pub rules_extended: Option<PathBuf>,
    pub rules_lite: Option<PathBuf>,
    pub hash_mode: Option<u32>,
    pub status_timer: Option<u64>,
    pub masks: Option<Vec<String>>,
    pub stage_runtime: Option<BTreeMap<String, u64>>,
    pub policy: Option<String>,
    pub min_len: Option<usize>,
    pub triples: Option<bool>,
}

impl ConfigFile {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|err| AuditError::Configuration(format!("{}: {err}", path.display())))?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => serde_json::from_str(&content)
                .map_err(|err| AuditError::Configuration(format!("{}: {err}", path.display()))),
            Some("yaml") | Some("yml") => serde_yaml::from_str(&content)
                .map_err(|err| AuditError::Configuration(format!("{}: {err}", path.display()))),
            _ => Err(AuditError::Configuration(format!(
                "unsupported configuration extension for {}",
                path.display()
            ))),
        }
    }
}

/// Explicit CLI-level values; they win over everything else.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub root: Option<PathBuf>,
    pub base_wordlist: Option<PathBuf>,
    pub potfile: Option<PathBuf>,
    pub policy: Option<GeneratorPolicy>,
}

/// Fully resolved, immutable run configuration.
#[derive(Debug, Clone)]
pub struct AuditConfig {
    pub root: PathBuf,
    pub hashes_dir: PathBuf,
    pub wordlists_dir: PathBuf,
    pub lists_dir: PathBuf,
    pub rules_dir: PathBuf,
    pub results_dir: PathBuf,
    pub logs_dir: PathBuf,
    pub sessions_dir: PathBuf,
    pub potfile: PathBuf,
    pub labels_file: PathBuf,
    /// Configured alternate wordlist for the base stage.
    pub base_wordlist: Option<PathBuf>,
    pub numbers_list: PathBuf,
    pub smart_list: PathBuf,
    pub rules_extended: PathBuf,
    pub rules_lite: PathBuf,
    pub hash_mode: u32,
    pub status_timer: u64,
    pub masks: Vec<String>,
    stage_runtime: BTreeMap<String, u64>,
    pub policy: GeneratorPolicy,
}

impl AuditConfig {
    /// Resolve the configuration once. A named configuration file that does
    /// not load is fatal; an absent default file is not.
    pub fn resolve(file: Option<&Path>, overrides: &Overrides) -> Result<Self> {
        let root_guess = overrides
            .root
            .clone()
            .unwrap_or_else(|| PathBuf::from("."));
        let file_cfg = match file {
            Some(path) => ConfigFile::load(path)?,
            None => {
                let conventional = root_guess.join("config").join("config.yaml");
                if conventional.is_file() {
                    ConfigFile::load(&conventional)?
                } else {
                    ConfigFile::default()
                }
            }
        };

        let root = overrides
            .root
            .clone()
            .or(file_cfg.root.clone())
            .unwrap_or_else(|| PathBuf::from("."));
        let rooted = |value: &Option<PathBuf>, default: &str| -> PathBuf {
            match value {
                Some(path) if path.is_absolute() => path.clone(),
                Some(path) => root.join(path),
                None => root.join(default),
            }
        };

        let lists_dir = rooted(&file_cfg.lists_dir, "lists");
        let rules_dir = rooted(&file_cfg.rules_dir, "rules");

        let mut stage_runtime: BTreeMap<String, u64> = BTreeMap::from([
            ("base".to_string(), 3600),
            ("combo".to_string(), 5400),
            ("mask".to_string(), 7200),
            ("smart".to_string(), 3600),
        ]);
        if let Some(overrides_map) = &file_cfg.stage_runtime {
            for (stage, secs) in overrides_map {
                stage_runtime.insert(stage.clone(), *secs);
            }
        }

        let policy = match &overrides.policy {
            Some(policy) => *policy,
            None => {
                let mut policy = match file_cfg.policy.as_deref() {
                    None | Some("focused") => GeneratorPolicy::focused(),
                    Some("broad") => GeneratorPolicy::broad(),
                    Some(other) => {
                        return Err(AuditError::Configuration(format!(
                            "unknown candidate policy '{other}' (expected focused or broad)"
                        )))
                    }
                };
                if let Some(min_len) = file_cfg.min_len {
                    policy.min_len = min_len;
                }
                if let Some(triples) = file_cfg.triples {
                    policy.triples = triples;
                }
                policy
            }
        };

        Ok(Self {
            hashes_dir: rooted(&file_cfg.hashes_dir, "hashes"),
            wordlists_dir: rooted(&file_cfg.wordlists_dir, "wordlists/targets"),
            results_dir: rooted(&file_cfg.results_dir, "results"),
            logs_dir: rooted(&file_cfg.logs_dir, "logs"),
            sessions_dir: rooted(&file_cfg.sessions_dir, ".sessions"),
            potfile: overrides
                .potfile
                .clone()
                .unwrap_or_else(|| rooted(&file_cfg.potfile, "potfile.txt")),
            labels_file: rooted(&file_cfg.labels_file, "targets.csv"),
            base_wordlist: overrides
                .base_wordlist
                .clone()
                .or_else(|| file_cfg.base_wordlist.as_ref().map(|p| {
                    if p.is_absolute() {
                        p.clone()
                    } else {
                        root.join(p)
                    }
                })),
            numbers_list: match &file_cfg.numbers_list {
                Some(path) if path.is_absolute() => path.clone(),
                Some(path) => root.join(path),
                None => lists_dir.join("numbers_suf.txt"),
            },
            smart_list: match &file_cfg.smart_list {
                Some(path) if path.is_absolute() => path.clone(),
                Some(path) => root.join(path),
                None => lists_dir.join("smart-top.txt"),
            },
            rules_extended: match &file_cfg.rules_extended {
                Some(path) if path.is_absolute() => path.clone(),
                Some(path) => root.join(path),
                None => rules_dir.join("rules-fr.rule"),
            },
            rules_lite: match &file_cfg.rules_lite {
                Some(path) if path.is_absolute() => path.clone(),
                Some(path) => root.join(path),
                None => rules_dir.join("rules-fr-lite.rule"),
            },
            hash_mode: file_cfg.hash_mode.unwrap_or(DEFAULT_HASH_MODE),
            status_timer: file_cfg.status_timer.unwrap_or(DEFAULT_STATUS_TIMER),
            masks: file_cfg
                .masks
                .unwrap_or_else(|| DEFAULT_MASKS.iter().map(|m| m.to_string()).collect()),
            stage_runtime,
            policy,
            lists_dir,
            rules_dir,
            root,
        })
    }

    /// Targeted wordlist path for one target id.
    pub fn target_wordlist(&self, target_id: &str) -> PathBuf {
        self.wordlists_dir.join(format!("{target_id}.txt"))
    }

    /// Runtime ceiling for a stage, in seconds.
    pub fn runtime_for(&self, stage: &str) -> u64 {
        self.stage_runtime.get(stage).copied().unwrap_or(3600)
    }
}

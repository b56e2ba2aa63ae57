// SPDX-License-Identifier: PMPL-1.0-or-later

//! Target discovery and label resolution.
//!
//! Every `.hc22000` artifact under the hashes directory is one target. An
//! optional tabular lookup file maps hash-file base names to human labels;
//! unmapped targets fall back to the file stem.

use crate::config::AuditConfig;
use crate::error::{AuditError, Result};
use crate::types::Target;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

/// Artifact extension produced by the capture conversion step.
pub const HASH_EXTENSION: &str = "hc22000";

/// Column-name preference order for the lookup key.
const KEY_COLUMNS: [&str; 4] = ["hash", "file", "target", "id"];

/// Column-name preference order for the label.
const LABEL_COLUMNS: [&str; 4] = ["label", "name", "ssid", "alias"];

/// Hex characters of the artifact fingerprint kept for telemetry.
const FINGERPRINT_LEN: usize = 12;

/// Discover all targets under the configured hashes directory, in stable
/// path order.
pub fn discover(cfg: &AuditConfig) -> Result<Vec<Target>> {
    let labels = load_labels(&cfg.labels_file);
    let mut paths: Vec<_> = WalkDir::new(&cfg.hashes_dir)
        .min_depth(1)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext.eq_ignore_ascii_case(HASH_EXTENSION))
                .unwrap_or(false)
        })
        .collect();
    paths.sort();

    let mut targets = Vec::with_capacity(paths.len());
    for path in paths {
        let id = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .map(|stem| stem.to_string())
            .ok_or_else(|| {
                AuditError::Configuration(format!("unusable hash file name: {}", path.display()))
            })?;
        let fingerprint = fingerprint(&path)?;
        let label = labels.get(&id).cloned().unwrap_or_else(|| id.clone());
        targets.push(Target {
            id,
            hash_path: path,
            label,
            fingerprint,
        });
    }
    Ok(targets)
}

fn fingerprint(path: &Path) -> Result<String> {
    let bytes = fs::read(path).map_err(|err| {
        AuditError::Configuration(format!("unreadable hash artifact {}: {err}", path.display()))
    })?;
    let digest = Sha256::digest(&bytes);
    Ok(hex::encode(digest)[..FINGERPRINT_LEN].to_string())
}

/// Load the label lookup table. A missing or malformed table simply yields
/// no labels; discovery falls back to file stems.
pub fn load_labels(path: &Path) -> BTreeMap<String, String> {
    let Ok(content) = fs::read_to_string(path) else {
        return BTreeMap::new();
    };
    let mut lines = content.lines();
    let Some(header) = lines.next() else {
        return BTreeMap::new();
    };
    let delimiter = detect_delimiter(header);
    let columns: Vec<String> = header
        .split(delimiter)
        .map(|col| col.trim().to_lowercase())
        .collect();
    let Some(key_idx) = preferred_column(&columns, &KEY_COLUMNS) else {
        return BTreeMap::new();
    };
    let Some(label_idx) = preferred_column(&columns, &LABEL_COLUMNS) else {
        return BTreeMap::new();
    };

    let mut labels = BTreeMap::new();
    for line in lines {
        let fields: Vec<&str> = line.split(delimiter).map(str::trim).collect();
        let (Some(&key), Some(&label)) = (fields.get(key_idx), fields.get(label_idx)) else {
            continue;
        };
        if key.is_empty() || label.is_empty() {
            continue;
        }
        // Keys may name the artifact with or without its extension.
        let key = key
            .strip_suffix(&format!(".{HASH_EXTENSION}"))
            .unwrap_or(key);
        labels.insert(key.to_string(), label.to_string());
    }
    labels
}

fn detect_delimiter(header: &str) -> char {
    if header.contains('\t') {
        '\t'
    } else if header.contains(';') {
        ';'
    } else {
        ','
    }
}

fn preferred_column(columns: &[String], candidates: &[&str]) -> Option<usize> {
    for candidate in candidates {
        if let Some(index) = columns.iter().position(|col| col == candidate) {
            return Some(index);
        }
    }
    None
}

// SPDX-License-Identifier: PMPL-1.0-or-later

//! The durable recovery store.
//!
//! The store is the engine's append-only potfile, shared across targets and
//! runs; it is the single source of truth for "already known." The
//! orchestrator only observes it through `RecoveryStore` — all writes are
//! appends performed by the engine itself.

use crate::engine::HashcatEngine;
use crate::error::{AuditError, Result};
use crate::types::Target;
use std::collections::BTreeSet;
use std::process::Command;

/// Emitted by some engine builds when a query matches nothing.
const NO_RESULT_SENTINEL: &str = "No hashes loaded";

/// Read access to the plaintexts already recovered for a target.
pub trait RecoveryStore {
    fn query(&self, target: &Target) -> Result<BTreeSet<String>>;
}

impl RecoveryStore for HashcatEngine {
    fn query(&self, target: &Target) -> Result<BTreeSet<String>> {
        let output = Command::new(self.binary())
            .arg("--show")
            .arg("--quiet")
            .arg("-m")
            .arg(self.hash_mode().to_string())
            .arg(&target.hash_path)
            .arg("--potfile-path")
            .arg(self.potfile())
            .output()
            .map_err(|err| {
                AuditError::Engine(format!("recovery query for {}: {err}", target.id))
            })?;
        if !output.status.success() {
            return Err(AuditError::Engine(format!(
                "recovery query for {} exited with {:?}",
                target.id,
                output.status.code()
            )));
        }
        Ok(parse_show_output(&String::from_utf8_lossy(&output.stdout)))
    }
}

/// Parse `<metadata>:<plaintext>` lines, dropping the no-result sentinel
/// and anything that is not a record.
pub fn parse_show_output(output: &str) -> BTreeSet<String> {
    output
        .lines()
        .filter_map(|line| {
            let line = line.trim();
            if line.is_empty() || line.contains(NO_RESULT_SENTINEL) {
                return None;
            }
            let (_, plaintext) = line.split_once(':')?;
            if plaintext.is_empty() {
                None
            } else {
                Some(plaintext.to_string())
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_yield_plaintexts() {
        let output = "WPA*02*aaaa*bbbb*4c697662616721:sunshine2015\n";
        let recovered = parse_show_output(output);
        assert_eq!(recovered.len(), 1);
        assert!(recovered.contains("sunshine2015"));
    }

    #[test]
    fn plaintext_keeps_embedded_colons() {
        let output = "WPA*02*aaaa*bbbb*cccc:pass:with:colons\n";
        let recovered = parse_show_output(output);
        assert!(recovered.contains("pass:with:colons"));
    }

    #[test]
    fn sentinel_and_noise_are_filtered() {
        let output = "No hashes loaded.\n\nsome free text without separator\n";
        assert!(parse_show_output(output).is_empty());
    }

    #[test]
    fn duplicate_records_collapse() {
        let output = "a*b:secret123\nc*d:secret123\n";
        assert_eq!(parse_show_output(output).len(), 1);
    }
}

// SPDX-License-Identifier: PMPL-1.0-or-later

//! Deterministic session naming and checkpoint detection.
//!
//! Session names are derived from (target id, stage name, invocation
//! suffix), so re-running the orchestrator against the same target and
//! stage resumes the engine's checkpoint instead of restarting it.

use std::path::{Path, PathBuf};

/// Derive the session name for one invocation.
pub fn session_name(target_id: &str, stage: &str, suffix: Option<&str>) -> String {
    let raw = match suffix {
        Some(suffix) => format!("{target_id}-{stage}-{suffix}"),
        None => format!("{target_id}-{stage}"),
    };
    sanitize_fragment(&raw)
}

/// Reduce an identifier to characters safe inside a session name. Mask
/// placeholders (`?d`, `?l`, ...) drop their `?`; anything else unsafe
/// becomes an underscore.
pub fn sanitize_fragment(raw: &str) -> String {
    let sanitized: String = raw
        .chars()
        .filter(|ch| *ch != '?')
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
                ch
            } else {
                '_'
            }
        })
        .collect();
    if sanitized.is_empty() {
        "s".to_string()
    } else {
        sanitized
    }
}

/// Checkpoint file the engine writes for a session.
pub fn restore_file(sessions_dir: &Path, session: &str) -> PathBuf {
    sessions_dir.join(format!("{session}.restore"))
}

/// An existing checkpoint means "resume" rather than "fresh start."
pub fn has_checkpoint(sessions_dir: &Path, session: &str) -> bool {
    restore_file(sessions_dir, session).is_file()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn session_names_are_deterministic() {
        let a = session_name("livbag", "mask", Some("1-19dddd"));
        let b = session_name("livbag", "mask", Some("1-19dddd"));
        assert_eq!(a, b);
        assert_eq!(a, "livbag-mask-1-19dddd");
    }

    #[test]
    fn mask_fragments_lose_placeholders_and_bangs() {
        assert_eq!(sanitize_fragment("?d?d?d?d?d?d?d?d"), "dddddddd");
        assert_eq!(sanitize_fragment("19?d?d?d?d"), "19dddd");
        assert_eq!(sanitize_fragment("?d?d?d?d?d?d!"), "dddddd_");
    }

    #[test]
    fn empty_fragment_still_yields_a_name() {
        assert_eq!(sanitize_fragment("???"), "s");
    }

    #[test]
    fn checkpoint_detection_looks_for_restore_file() {
        let dir = TempDir::new().unwrap();
        assert!(!has_checkpoint(dir.path(), "livbag-base"));
        fs::write(dir.path().join("livbag-base.restore"), b"").unwrap();
        assert!(has_checkpoint(dir.path(), "livbag-base"));
    }
}

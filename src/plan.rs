// SPDX-License-Identifier: PMPL-1.0-or-later

//! The fixed, ordered attack plan.
//!
//! Each stage builder maps a target to zero or more engine invocations; an
//! empty list means a precondition is unmet and the stage is skipped.

use crate::config::AuditConfig;
use crate::session::{sanitize_fragment, session_name};
use crate::types::{AttackMode, Invocation, Target};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageKind {
    /// Pure dictionary attack against the targeted wordlist.
    Base,
    /// Combinator attack pairing the targeted wordlist with numeric suffixes.
    Combo,
    /// One brute-force invocation per configured mask.
    Mask,
    /// Curated high-probability list with rule mutation.
    Smart,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stage {
    pub id: &'static str,
    pub kind: StageKind,
}

/// The escalation order tried for every target.
pub fn standard_plan() -> Vec<Stage> {
    vec![
        Stage {
            id: "base",
            kind: StageKind::Base,
        },
        Stage {
            id: "combo",
            kind: StageKind::Combo,
        },
        Stage {
            id: "mask",
            kind: StageKind::Mask,
        },
        Stage {
            id: "smart",
            kind: StageKind::Smart,
        },
    ]
}

impl Stage {
    pub fn invocations(&self, target: &Target, cfg: &AuditConfig) -> Vec<Invocation> {
        match self.kind {
            StageKind::Base => self.base_invocations(target, cfg),
            StageKind::Combo => self.combo_invocations(target, cfg),
            StageKind::Mask => self.mask_invocations(target, cfg),
            StageKind::Smart => self.smart_invocations(target, cfg),
        }
    }

    fn base_invocations(&self, target: &Target, cfg: &AuditConfig) -> Vec<Invocation> {
        let Some(wordlist) = primary_wordlist(target, cfg) else {
            return Vec::new();
        };
        vec![Invocation {
            stage: self.id,
            session: session_name(&target.id, self.id, None),
            mode: AttackMode::Dictionary,
            attack_args: vec![display(&wordlist)],
            runtime_secs: cfg.runtime_for(self.id),
        }]
    }

    fn combo_invocations(&self, target: &Target, cfg: &AuditConfig) -> Vec<Invocation> {
        let Some(wordlist) = primary_wordlist(target, cfg) else {
            return Vec::new();
        };
        if !cfg.numbers_list.is_file() {
            return Vec::new();
        }
        vec![Invocation {
            stage: self.id,
            session: session_name(&target.id, self.id, None),
            mode: AttackMode::Combinator,
            attack_args: vec![display(&wordlist), display(&cfg.numbers_list)],
            runtime_secs: cfg.runtime_for(self.id),
        }]
    }

    fn mask_invocations(&self, target: &Target, cfg: &AuditConfig) -> Vec<Invocation> {
        cfg.masks
            .iter()
            .enumerate()
            .map(|(index, mask)| Invocation {
                stage: self.id,
                session: session_name(
                    &target.id,
                    self.id,
                    Some(&format!("{index}-{}", sanitize_fragment(mask))),
                ),
                mode: AttackMode::Mask,
                attack_args: vec![mask.clone()],
                runtime_secs: cfg.runtime_for(self.id),
            })
            .collect()
    }

    fn smart_invocations(&self, target: &Target, cfg: &AuditConfig) -> Vec<Invocation> {
        if !cfg.smart_list.is_file() {
            return Vec::new();
        }
        let mut attack_args = vec![display(&cfg.smart_list)];
        // Prefer the extended rule set, fall back to the lite one; run bare
        // when neither exists.
        if cfg.rules_extended.is_file() {
            attack_args.push("-r".to_string());
            attack_args.push(display(&cfg.rules_extended));
        } else if cfg.rules_lite.is_file() {
            attack_args.push("-r".to_string());
            attack_args.push(display(&cfg.rules_lite));
        }
        vec![Invocation {
            stage: self.id,
            session: session_name(&target.id, self.id, None),
            mode: AttackMode::Dictionary,
            attack_args,
            runtime_secs: cfg.runtime_for(self.id),
        }]
    }
}

/// Targeted wordlist for the dictionary stages: explicit alternate first,
/// then the per-target convention path.
fn primary_wordlist(target: &Target, cfg: &AuditConfig) -> Option<PathBuf> {
    if let Some(alternate) = &cfg.base_wordlist {
        if alternate.is_file() {
            return Some(alternate.clone());
        }
    }
    let targeted = cfg.target_wordlist(&target.id);
    targeted.is_file().then_some(targeted)
}

fn display(path: &PathBuf) -> String {
    path.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Overrides;
    use std::fs;
    use tempfile::TempDir;

    fn target() -> Target {
        Target {
            id: "livbag".to_string(),
            hash_path: PathBuf::from("hashes/livbag.hc22000"),
            label: "livbag".to_string(),
            fingerprint: "0011aabbccdd".to_string(),
        }
    }

    fn config_in(dir: &TempDir) -> AuditConfig {
        let overrides = Overrides {
            root: Some(dir.path().to_path_buf()),
            ..Overrides::default()
        };
        AuditConfig::resolve(None, &overrides).unwrap()
    }

    #[test]
    fn plan_order_is_fixed() {
        let ids: Vec<&str> = standard_plan().iter().map(|s| s.id).collect();
        assert_eq!(ids, ["base", "combo", "mask", "smart"]);
    }

    #[test]
    fn base_skips_without_a_wordlist() {
        let dir = TempDir::new().unwrap();
        let cfg = config_in(&dir);
        let stage = standard_plan()[0];
        assert!(stage.invocations(&target(), &cfg).is_empty());
    }

    #[test]
    fn base_uses_the_targeted_wordlist() {
        let dir = TempDir::new().unwrap();
        let cfg = config_in(&dir);
        let wordlist = cfg.target_wordlist("livbag");
        fs::create_dir_all(wordlist.parent().unwrap()).unwrap();
        fs::write(&wordlist, "candidate\n").unwrap();

        let stage = standard_plan()[0];
        let invocations = stage.invocations(&target(), &cfg);
        assert_eq!(invocations.len(), 1);
        assert_eq!(invocations[0].mode, AttackMode::Dictionary);
        assert_eq!(invocations[0].session, "livbag-base");
        assert_eq!(invocations[0].attack_args, [wordlist.display().to_string()]);
    }

    #[test]
    fn combo_requires_both_inputs() {
        let dir = TempDir::new().unwrap();
        let cfg = config_in(&dir);
        let stage = standard_plan()[1];

        let wordlist = cfg.target_wordlist("livbag");
        fs::create_dir_all(wordlist.parent().unwrap()).unwrap();
        fs::write(&wordlist, "candidate\n").unwrap();
        assert!(stage.invocations(&target(), &cfg).is_empty());

        fs::create_dir_all(cfg.numbers_list.parent().unwrap()).unwrap();
        fs::write(&cfg.numbers_list, "123\n").unwrap();
        let invocations = stage.invocations(&target(), &cfg);
        assert_eq!(invocations.len(), 1);
        assert_eq!(invocations[0].mode, AttackMode::Combinator);
        assert_eq!(invocations[0].attack_args.len(), 2);
    }

    #[test]
    fn mask_stage_emits_one_invocation_per_mask() {
        let dir = TempDir::new().unwrap();
        let cfg = config_in(&dir);
        let stage = standard_plan()[2];
        let invocations = stage.invocations(&target(), &cfg);
        assert_eq!(invocations.len(), cfg.masks.len());
        assert_eq!(invocations[0].session, "livbag-mask-0-dddddddd");
        assert_eq!(invocations[1].session, "livbag-mask-1-19dddd");
        for invocation in &invocations {
            assert_eq!(invocation.mode, AttackMode::Mask);
            assert!(!invocation.session.contains('?'));
            assert!(!invocation.session.contains('!'));
        }
    }

    #[test]
    fn smart_prefers_extended_rules_and_falls_back() {
        let dir = TempDir::new().unwrap();
        let cfg = config_in(&dir);
        let stage = standard_plan()[3];
        assert!(stage.invocations(&target(), &cfg).is_empty());

        fs::create_dir_all(cfg.smart_list.parent().unwrap()).unwrap();
        fs::write(&cfg.smart_list, "12345678\n").unwrap();
        let bare = stage.invocations(&target(), &cfg);
        assert_eq!(bare[0].attack_args.len(), 1);

        fs::create_dir_all(cfg.rules_lite.parent().unwrap()).unwrap();
        fs::write(&cfg.rules_lite, ":\n").unwrap();
        let lite = stage.invocations(&target(), &cfg);
        assert_eq!(lite[0].attack_args[2], cfg.rules_lite.display().to_string());

        fs::write(&cfg.rules_extended, ":\n").unwrap();
        let extended = stage.invocations(&target(), &cfg);
        assert_eq!(
            extended[0].attack_args[2],
            cfg.rules_extended.display().to_string()
        );
    }
}

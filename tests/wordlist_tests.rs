// SPDX-License-Identifier: PMPL-1.0-or-later

//! End-to-end candidate synthesis against a sandbox workspace.

use psk_audit::seed;
use psk_audit::wordlist::{synthesize_to, GeneratorPolicy};
use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn write_seeds(dir: &TempDir, name: &str, body: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, body).unwrap();
    path
}

fn load_lines(path: &PathBuf) -> Vec<String> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

#[test]
fn identical_seeds_produce_identical_files() {
    let dir = TempDir::new().unwrap();
    let seeds = write_seeds(
        &dir,
        "seeds.json",
        r#"{"prenom": "Ana", "nom": "Ruiz", "annees": [2020, 2021]}"#,
    );
    let (facts, warning) = seed::load_facts(&seeds);
    assert!(warning.is_none());

    let first = dir.path().join("first.txt");
    let second = dir.path().join("second.txt");
    synthesize_to(&first, &facts, &GeneratorPolicy::focused()).unwrap();
    synthesize_to(&second, &facts, &GeneratorPolicy::focused()).unwrap();
    assert_eq!(fs::read(&first).unwrap(), fs::read(&second).unwrap());
}

#[test]
fn output_file_honors_every_invariant() {
    let dir = TempDir::new().unwrap();
    let seeds = write_seeds(
        &dir,
        "seeds.yaml",
        "prenom: Arthur\nnom: Charvet\nannees:\n  - 2015\n  - 2016\n",
    );
    let (facts, _) = seed::load_facts(&seeds);
    let output = dir.path().join("arthur.txt");
    let policy = GeneratorPolicy::focused();
    let report = synthesize_to(&output, &facts, &policy).unwrap();

    let lines = load_lines(&output);
    assert_eq!(lines.len(), report.candidates);
    assert!(!lines.is_empty());

    // Unique, length-bounded, whitespace-free.
    let unique: BTreeSet<&String> = lines.iter().collect();
    assert_eq!(unique.len(), lines.len());
    for line in &lines {
        let length = line.chars().count();
        assert!(length >= policy.min_len && length <= policy.max_len, "{line}");
        assert!(!line.chars().any(char::is_whitespace), "{line}");
    }

    // Non-decreasing length, lexicographic within equal length.
    for pair in lines.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        let (la, lb) = (a.chars().count(), b.chars().count());
        assert!(la < lb || (la == lb && a < b), "{a} before {b}");
    }

    // No byte-order mark.
    let bytes = fs::read(&output).unwrap();
    assert!(!bytes.starts_with(&[0xEF, 0xBB, 0xBF]));
}

#[test]
fn empty_seed_document_still_produces_candidates() {
    let dir = TempDir::new().unwrap();
    let seeds = write_seeds(&dir, "seeds.json", "[]");
    let (facts, warning) = seed::load_facts(&seeds);
    assert!(warning.is_some());

    let output = dir.path().join("fallback.txt");
    let report = synthesize_to(&output, &facts, &GeneratorPolicy::focused()).unwrap();
    assert!(report.candidates > 0);
    assert!(!load_lines(&output).is_empty());
}

#[test]
fn ana_ruiz_scenario_end_to_end() {
    let dir = TempDir::new().unwrap();
    let seeds = write_seeds(
        &dir,
        "seeds.json",
        r#"{"prenom": "Ana", "nom": "Ruiz", "annees": [2020]}"#,
    );
    let (facts, _) = seed::load_facts(&seeds);
    let output = dir.path().join("ana.txt");
    synthesize_to(&output, &facts, &GeneratorPolicy::focused()).unwrap();

    let lines = load_lines(&output);
    assert!(lines.contains(&"anaruiz2020".to_string()));
    assert!(!lines.contains(&"ana".to_string()));
}

#[test]
fn parent_directories_are_created() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("wordlists/targets/livbag.txt");
    let facts = seed::default_facts();
    synthesize_to(&output, &facts, &GeneratorPolicy::focused()).unwrap();
    assert!(output.is_file());
}

#[test]
fn sample_is_capped_and_taken_from_the_output() {
    let dir = TempDir::new().unwrap();
    let facts = seed::default_facts();
    let output = dir.path().join("sample.txt");
    let report = synthesize_to(&output, &facts, &GeneratorPolicy::broad()).unwrap();
    assert!(report.sample.len() <= 10);
    let lines = load_lines(&output);
    assert_eq!(report.sample.as_slice(), &lines[..report.sample.len()]);
}

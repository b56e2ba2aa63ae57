// SPDX-License-Identifier: PMPL-1.0-or-later

//! Candidate synthesis: deterministic expansion of seed tokens into a
//! bounded, deduplicated passphrase wordlist.
//!
//! The pipeline is case variants -> multi-token combinations -> numeric and
//! date suffixing -> leetspeak mutation, with a validation filter on every
//! emitted string. Identical seed input always produces an identical file.

use crate::error::{AuditError, Result};
use crate::seed::{collect_tokens, SeedValue, TokenSet};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Separators used between combined tokens.
const SEPARATORS: [&str; 4] = ["", "-", "_", "."];

/// Fixed suffixes appended alongside the extracted years and dates.
const EXTRA_SUFFIXES: [&str; 4] = ["123", "11", "29", "29!"];

/// Vocabulary guaranteeing a non-empty pipeline when the seeds yield no
/// word tokens at all.
const FALLBACK_WORDS: [&str; 4] = ["wifi", "maison", "internet", "secret"];

/// Candidates sampled into the synthesis telemetry record.
const SAMPLE_CAP: usize = 10;

/// Bounds and combination breadth for a synthesis run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorPolicy {
    pub min_len: usize,
    pub max_len: usize,
    /// Also combine ordered triples of distinct tokens.
    pub triples: bool,
}

impl GeneratorPolicy {
    /// WPA2-plausible candidates only: at least 8 characters, pairs only.
    pub fn focused() -> Self {
        Self {
            min_len: 8,
            max_len: 63,
            triples: false,
        }
    }

    /// Wider net for engines that filter on their own: short candidates
    /// allowed, ordered triples included.
    pub fn broad() -> Self {
        Self {
            min_len: 4,
            max_len: 63,
            triples: true,
        }
    }
}

impl Default for GeneratorPolicy {
    fn default() -> Self {
        Self::focused()
    }
}

/// Counters and sample recorded after a synthesis run.
#[derive(Debug, Clone, Serialize)]
pub struct SynthReport {
    pub seeds: usize,
    pub tokens: usize,
    pub candidates: usize,
    pub output: PathBuf,
    pub sample: Vec<String>,
}

/// Expand a token set into the final sorted candidate list.
pub fn generate(tokens: &TokenSet, policy: &GeneratorPolicy) -> Vec<String> {
    let fallback: Vec<String> = FALLBACK_WORDS.iter().map(|w| w.to_string()).collect();
    let words: &[String] = if tokens.words().is_empty() {
        &fallback
    } else {
        tokens.words()
    };

    let mut base: BTreeSet<String> = BTreeSet::new();
    for word in words {
        for variant in case_variants(word) {
            base.insert(variant);
        }
    }

    // Ordered pairs of distinct tokens, never a token with itself.
    for (i, left) in words.iter().enumerate() {
        for (j, right) in words.iter().enumerate() {
            if i == j {
                continue;
            }
            for sep in SEPARATORS {
                base.insert(join_lower(&[left, right], sep));
                base.insert(join_title(&[left, right], sep));
            }
        }
    }

    if policy.triples {
        for (i, a) in words.iter().enumerate() {
            for (j, b) in words.iter().enumerate() {
                if j == i {
                    continue;
                }
                for (k, c) in words.iter().enumerate() {
                    if k == i || k == j {
                        continue;
                    }
                    for sep in SEPARATORS {
                        base.insert(join_lower(&[a, b, c], sep));
                        base.insert(join_title(&[a, b, c], sep));
                    }
                }
            }
        }
    }

    let suffixes = suffix_set(tokens);

    let mut emitted: BTreeSet<String> = BTreeSet::new();
    for candidate in &base {
        push_checked(&mut emitted, candidate.clone(), policy);
        for suffix in &suffixes {
            push_checked(&mut emitted, format!("{candidate}{suffix}"), policy);
        }
        let leet = leetspeak(&candidate.to_lowercase());
        push_checked(&mut emitted, leet.clone(), policy);
        for suffix in &suffixes {
            push_checked(&mut emitted, format!("{leet}{suffix}"), policy);
        }
    }

    let mut candidates: Vec<String> = emitted.into_iter().collect();
    candidates.sort_by(|a, b| {
        a.chars()
            .count()
            .cmp(&b.chars().count())
            .then_with(|| a.cmp(b))
    });
    candidates
}

/// Union of years, years with a bang, short years, dates, and the fixed
/// extras.
pub fn suffix_set(tokens: &TokenSet) -> Vec<String> {
    let mut suffixes: Vec<String> = Vec::new();
    let mut push = |value: String| {
        if !suffixes.contains(&value) {
            suffixes.push(value);
        }
    };
    for year in tokens.years() {
        push(year.clone());
        push(format!("{year}!"));
    }
    for short in tokens.short_years() {
        push(short.clone());
    }
    for date in tokens.dates() {
        push(date.clone());
    }
    for extra in EXTRA_SUFFIXES {
        push(extra.to_string());
    }
    suffixes
}

fn push_checked(out: &mut BTreeSet<String>, candidate: String, policy: &GeneratorPolicy) {
    if is_valid(&candidate, policy) {
        out.insert(candidate);
    }
}

fn is_valid(candidate: &str, policy: &GeneratorPolicy) -> bool {
    let length = candidate.chars().count();
    length >= policy.min_len
        && length <= policy.max_len
        && !candidate.chars().any(char::is_whitespace)
}

fn case_variants(word: &str) -> Vec<String> {
    let mut variants = Vec::with_capacity(4);
    for form in [
        word.to_string(),
        word.to_lowercase(),
        word.to_uppercase(),
        title_case(word),
    ] {
        if !variants.contains(&form) {
            variants.push(form);
        }
    }
    variants
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}

fn join_lower(parts: &[&String], sep: &str) -> String {
    parts
        .iter()
        .map(|p| p.to_lowercase())
        .collect::<Vec<_>>()
        .join(sep)
}

fn join_title(parts: &[&String], sep: &str) -> String {
    parts
        .iter()
        .map(|p| title_case(p))
        .collect::<Vec<_>>()
        .join(sep)
}

/// Leetspeak transform applied to lowercase candidates.
pub fn leetspeak(text: &str) -> String {
    text.chars()
        .map(|ch| match ch {
            'a' => '@',
            'e' => '3',
            'i' => '1',
            'o' => '0',
            other => other,
        })
        .collect()
}

/// Write candidates one per line, UTF-8 without a byte-order mark, creating
/// parent directories as needed.
pub fn write_wordlist(path: &Path, candidates: &[String]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|err| AuditError::persistence(parent, err))?;
        }
    }
    let mut body = candidates.join("\n");
    if !body.is_empty() {
        body.push('\n');
    }
    fs::write(path, body).map_err(|err| AuditError::persistence(path, err))
}

/// Full synthesis run: facts -> tokens -> candidates -> wordlist file.
pub fn synthesize_to(path: &Path, facts: &[SeedValue], policy: &GeneratorPolicy) -> Result<SynthReport> {
    let tokens = collect_tokens(facts);
    let candidates = generate(&tokens, policy);
    write_wordlist(path, &candidates)?;
    Ok(SynthReport {
        seeds: facts.len(),
        tokens: tokens.len(),
        candidates: candidates.len(),
        output: path.to_path_buf(),
        sample: candidates.iter().take(SAMPLE_CAP).cloned().collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens_from(words: &[&str]) -> TokenSet {
        let mut tokens = TokenSet::default();
        for word in words {
            tokens.push_word(word);
        }
        tokens
    }

    fn seed_record(entries: &[(&str, SeedValue)]) -> SeedValue {
        SeedValue::Record(
            entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        )
    }

    #[test]
    fn pair_combinations_cover_separators_and_both_case_forms() {
        let tokens = tokens_from(&["Arthur", "Charvet"]);
        let candidates = generate(&tokens, &GeneratorPolicy::focused());
        assert!(candidates.contains(&"arthurcharvet".to_string()));
        assert!(candidates.contains(&"Arthur-Charvet".to_string()));
        assert!(candidates.contains(&"charvet_arthur".to_string()));
    }

    #[test]
    fn no_self_combination() {
        let tokens = tokens_from(&["Arthur"]);
        let candidates = generate(&tokens, &GeneratorPolicy::broad());
        assert!(!candidates.iter().any(|c| c.contains("arthurarthur")));
        assert!(!candidates.contains(&"ArthurArthur".to_string()));
    }

    #[test]
    fn suffix_set_from_years() {
        let fact = seed_record(&[(
            "annees",
            SeedValue::List(vec![SeedValue::Int(2015), SeedValue::Int(2016)]),
        )]);
        let tokens = collect_tokens(&[fact]);
        let suffixes = suffix_set(&tokens);
        for expected in ["2015", "2015!", "15", "2016", "2016!", "16"] {
            assert!(suffixes.contains(&expected.to_string()), "missing {expected}");
        }
    }

    #[test]
    fn ana_ruiz_scenario() {
        let fact = seed_record(&[
            ("prenom", SeedValue::Text("Ana".to_string())),
            ("nom", SeedValue::Text("Ruiz".to_string())),
            ("annees", SeedValue::List(vec![SeedValue::Int(2020)])),
        ]);
        let tokens = collect_tokens(&[fact]);
        let candidates = generate(&tokens, &GeneratorPolicy::focused());
        assert!(candidates.contains(&"anaruiz2020".to_string()));
        assert!(!candidates.contains(&"ana".to_string()));
    }

    #[test]
    fn leet_transform_applies_to_lowercase_form() {
        assert_eq!(leetspeak("passphrase"), "p@ssphr@s3");
        let tokens = tokens_from(&["Bonjour", "Arthur"]);
        let candidates = generate(&tokens, &GeneratorPolicy::focused());
        assert!(candidates.contains(&"b0nj0ur@rthur".to_string()));
    }

    #[test]
    fn length_and_whitespace_invariants_hold() {
        let tokens = tokens_from(&["Arthur", "Charvet", "livbag"]);
        let policy = GeneratorPolicy::focused();
        for candidate in generate(&tokens, &policy) {
            let length = candidate.chars().count();
            assert!(length >= policy.min_len && length <= policy.max_len);
            assert!(!candidate.chars().any(char::is_whitespace));
        }
    }

    #[test]
    fn output_is_sorted_by_length_then_lexicographic() {
        let tokens = tokens_from(&["Arthur", "Charvet"]);
        let candidates = generate(&tokens, &GeneratorPolicy::broad());
        for pair in candidates.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            let (la, lb) = (a.chars().count(), b.chars().count());
            assert!(la < lb || (la == lb && a < b), "{a} before {b}");
        }
    }

    #[test]
    fn output_has_no_duplicates() {
        let tokens = tokens_from(&["Arthur", "Charvet"]);
        let candidates = generate(&tokens, &GeneratorPolicy::broad());
        let unique: BTreeSet<&String> = candidates.iter().collect();
        assert_eq!(unique.len(), candidates.len());
    }

    #[test]
    fn empty_token_set_uses_fallback_vocabulary() {
        let tokens = TokenSet::default();
        let candidates = generate(&tokens, &GeneratorPolicy::focused());
        assert!(!candidates.is_empty());
        assert!(candidates.contains(&"maisonwifi".to_string()));
    }

    #[test]
    fn generation_is_deterministic() {
        let fact = seed_record(&[
            ("prenom", SeedValue::Text("Ana".to_string())),
            ("nom", SeedValue::Text("Ruiz".to_string())),
            ("annees", SeedValue::List(vec![SeedValue::Int(2020)])),
        ]);
        let tokens = collect_tokens(&[fact.clone()]);
        let first = generate(&tokens, &GeneratorPolicy::broad());
        let second = generate(&collect_tokens(&[fact]), &GeneratorPolicy::broad());
        assert_eq!(first, second);
    }

    #[test]
    fn triples_only_under_broad_policy() {
        let tokens = tokens_from(&["ana", "ruiz", "lima"]);
        let focused = generate(&tokens, &GeneratorPolicy::focused());
        let broad = generate(&tokens, &GeneratorPolicy::broad());
        assert!(!focused.contains(&"anaruizlima".to_string()));
        assert!(broad.contains(&"anaruizlima".to_string()));
        assert!(broad.contains(&"Ana-Ruiz-Lima".to_string()));
    }
}

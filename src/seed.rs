// SPDX-License-Identifier: PMPL-1.0-or-later

//! Seed documents: loosely structured facts about a target, and the token
//! extraction pass that feeds candidate synthesis.
//!
//! A seed document is JSON or YAML, either a single record or an array of
//! records. Field names are free-form except for the year-bearing set, whose
//! values are scanned for numeric tokens instead of words.

use crate::error::{AuditError, Result};
use regex::Regex;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

/// Key names whose values carry years, matched case- and
/// diacritic-insensitively after folding.
const YEAR_KEYS: [&str; 12] = [
    "year", "years", "annee", "annees", "anno", "anni", "ano", "anos", "anio", "anios", "jahr",
    "jahre",
];

/// A loosely structured seed value. Records use a `BTreeMap` so traversal
/// order is deterministic regardless of document formatting.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum SeedValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<SeedValue>),
    Record(BTreeMap<String, SeedValue>),
}

impl SeedValue {
    fn scalar_text(&self) -> Option<String> {
        match self {
            SeedValue::Null => None,
            SeedValue::Bool(b) => Some(b.to_string()),
            SeedValue::Int(n) => Some(n.to_string()),
            SeedValue::Float(f) => Some(f.to_string()),
            SeedValue::Text(s) => Some(s.clone()),
            SeedValue::List(_) | SeedValue::Record(_) => None,
        }
    }
}

/// Deduplicated, insertion-ordered tokens extracted from seed facts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenSet {
    words: Vec<String>,
    years: Vec<String>,
    short_years: Vec<String>,
    dates: Vec<String>,
}

impl TokenSet {
    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn years(&self) -> &[String] {
        &self.years
    }

    pub fn short_years(&self) -> &[String] {
        &self.short_years
    }

    pub fn dates(&self) -> &[String] {
        &self.dates
    }

    pub fn len(&self) -> usize {
        self.words.len() + self.years.len() + self.short_years.len() + self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn push_word(&mut self, word: &str) {
        push_unique(&mut self.words, word);
    }

    fn push_word_runs(&mut self, text: &str) {
        for run in word_run_re().find_iter(text) {
            let token = run.as_str();
            self.push_word(token);
            let folded = fold_diacritics(token);
            if folded != token {
                self.push_word(&folded);
            }
        }
    }

    /// Scan digit runs under a year-bearing key. Runs of exactly 2, 4, and 8
    /// digits become short years, years, and dates; longer forms also derive
    /// their shorter classes.
    fn push_numeric_runs(&mut self, text: &str) {
        for run in digit_run_re().find_iter(text) {
            let digits = run.as_str();
            match digits.len() {
                2 => push_unique(&mut self.short_years, digits),
                4 => {
                    push_unique(&mut self.years, digits);
                    push_unique(&mut self.short_years, &digits[2..]);
                }
                8 => {
                    push_unique(&mut self.dates, digits);
                    let year = &digits[4..8];
                    push_unique(&mut self.years, year);
                    push_unique(&mut self.short_years, &year[2..]);
                }
                _ => {}
            }
        }
    }
}

fn push_unique(list: &mut Vec<String>, value: &str) {
    if !list.iter().any(|existing| existing == value) {
        list.push(value.to_string());
    }
}

fn word_run_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[\p{L}\p{N}]+").expect("word run pattern"))
}

fn digit_run_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[0-9]+").expect("digit run pattern"))
}

/// Recursive token-collecting visitor over every scalar reachable in the
/// given facts.
pub fn collect_tokens(facts: &[SeedValue]) -> TokenSet {
    let mut tokens = TokenSet::default();
    for fact in facts {
        visit(None, fact, &mut tokens);
    }
    tokens
}

fn visit(key: Option<&str>, value: &SeedValue, tokens: &mut TokenSet) {
    match value {
        SeedValue::Record(map) => {
            for (child_key, child) in map {
                visit(Some(child_key), child, tokens);
            }
        }
        SeedValue::List(items) => {
            for item in items {
                visit(key, item, tokens);
            }
        }
        scalar => {
            let Some(text) = scalar.scalar_text() else {
                return;
            };
            if key.map(is_year_key).unwrap_or(false) {
                tokens.push_numeric_runs(&text);
            } else {
                tokens.push_word_runs(&text);
            }
        }
    }
}

pub fn is_year_key(key: &str) -> bool {
    let folded = fold_diacritics(key).to_lowercase();
    YEAR_KEYS.contains(&folded.as_str())
}

/// Strip common Latin diacritics, leaving other characters untouched.
pub fn fold_diacritics(text: &str) -> String {
    let mut folded = String::with_capacity(text.len());
    for ch in text.chars() {
        match fold_char(ch) {
            Some(replacement) => folded.push_str(replacement),
            None => folded.push(ch),
        }
    }
    folded
}

fn fold_char(ch: char) -> Option<&'static str> {
    Some(match ch {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => "a",
        'è' | 'é' | 'ê' | 'ë' => "e",
        'ì' | 'í' | 'î' | 'ï' => "i",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' => "o",
        'ù' | 'ú' | 'û' | 'ü' => "u",
        'ý' | 'ÿ' => "y",
        'ç' => "c",
        'ñ' => "n",
        'æ' => "ae",
        'œ' => "oe",
        'ß' => "ss",
        'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' => "A",
        'È' | 'É' | 'Ê' | 'Ë' => "E",
        'Ì' | 'Í' | 'Î' | 'Ï' => "I",
        'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' | 'Ø' => "O",
        'Ù' | 'Ú' | 'Û' | 'Ü' => "U",
        'Ý' => "Y",
        'Ç' => "C",
        'Ñ' => "N",
        'Æ' => "AE",
        'Œ' => "OE",
        _ => return None,
    })
}

/// Built-in fact used when no usable seed document is supplied.
pub fn default_facts() -> Vec<SeedValue> {
    let mut record = BTreeMap::new();
    record.insert(
        "mots".to_string(),
        SeedValue::List(vec![
            SeedValue::Text("wifi".to_string()),
            SeedValue::Text("maison".to_string()),
            SeedValue::Text("internet".to_string()),
            SeedValue::Text("bienvenue".to_string()),
        ]),
    );
    record.insert(
        "annees".to_string(),
        SeedValue::List(vec![
            SeedValue::Int(2020),
            SeedValue::Int(2021),
            SeedValue::Int(2022),
            SeedValue::Int(2023),
            SeedValue::Int(2024),
        ]),
    );
    vec![SeedValue::Record(record)]
}

/// Load seed facts, falling back to the built-in default when the document
/// is missing, empty, or unparseable. The soft error, when present, is for
/// the caller to surface; it never aborts a run.
pub fn load_facts(path: &Path) -> (Vec<SeedValue>, Option<AuditError>) {
    match read_facts(path) {
        Ok(facts) if !facts.is_empty() => (facts, None),
        Ok(_) => (
            default_facts(),
            Some(AuditError::SeedInput(format!(
                "{}: empty document, using built-in defaults",
                path.display()
            ))),
        ),
        Err(err) => (default_facts(), Some(err)),
    }
}

fn read_facts(path: &Path) -> Result<Vec<SeedValue>> {
    if !path.is_file() {
        return Err(AuditError::SeedInput(format!(
            "{}: not found, using built-in defaults",
            path.display()
        )));
    }
    let content = fs::read_to_string(path)
        .map_err(|err| AuditError::SeedInput(format!("{}: {err}", path.display())))?;
    let value: SeedValue = match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => serde_json::from_str(&content)
            .map_err(|err| AuditError::SeedInput(format!("{}: {err}", path.display())))?,
        _ => serde_yaml::from_str(&content)
            .map_err(|err| AuditError::SeedInput(format!("{}: {err}", path.display())))?,
    };
    match value {
        SeedValue::Record(_) => Ok(vec![value]),
        SeedValue::List(items) => Ok(items),
        _ => Err(AuditError::SeedInput(format!(
            "{}: expected a record or an array of records",
            path.display()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(entries: &[(&str, SeedValue)]) -> SeedValue {
        SeedValue::Record(
            entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        )
    }

    #[test]
    fn year_list_extraction() {
        let fact = record(&[(
            "annees",
            SeedValue::List(vec![SeedValue::Int(2015), SeedValue::Int(2016)]),
        )]);
        let tokens = collect_tokens(&[fact]);
        assert_eq!(tokens.years(), ["2015", "2016"]);
        assert_eq!(tokens.short_years(), ["15", "16"]);
        assert!(tokens.words().is_empty());
    }

    #[test]
    fn eight_digit_date_derives_year_and_short_year() {
        let fact = record(&[("year", SeedValue::Text("14072019".to_string()))]);
        let tokens = collect_tokens(&[fact]);
        assert_eq!(tokens.dates(), ["14072019"]);
        assert_eq!(tokens.years(), ["2019"]);
        assert_eq!(tokens.short_years(), ["19"]);
    }

    #[test]
    fn accented_year_key_routes_numeric_extraction() {
        let fact = record(&[("Années", SeedValue::Int(1998))]);
        let tokens = collect_tokens(&[fact]);
        assert_eq!(tokens.years(), ["1998"]);
        assert!(tokens.words().is_empty());
    }

    #[test]
    fn diacritics_yield_both_token_forms() {
        let fact = record(&[("lieu", SeedValue::Text("Crèche".to_string()))]);
        let tokens = collect_tokens(&[fact]);
        assert_eq!(tokens.words(), ["Crèche", "Creche"]);
    }

    #[test]
    fn nested_records_and_lists_are_traversed() {
        let inner = record(&[
            ("prenom", SeedValue::Text("Ana".to_string())),
            ("annees", SeedValue::List(vec![SeedValue::Int(2020)])),
        ]);
        let fact = record(&[("famille", SeedValue::List(vec![inner]))]);
        let tokens = collect_tokens(&[fact]);
        assert_eq!(tokens.words(), ["Ana"]);
        assert_eq!(tokens.years(), ["2020"]);
    }

    #[test]
    fn word_runs_split_on_punctuation() {
        let fact = record(&[("ssid", SeedValue::Text("Chez-Arthur 2eme".to_string()))]);
        let tokens = collect_tokens(&[fact]);
        assert_eq!(tokens.words(), ["Chez", "Arthur", "2eme"]);
    }

    #[test]
    fn duplicate_tokens_are_not_repeated() {
        let fact = record(&[
            ("a", SeedValue::Text("wifi".to_string())),
            ("b", SeedValue::Text("wifi".to_string())),
        ]);
        let tokens = collect_tokens(&[fact]);
        assert_eq!(tokens.words(), ["wifi"]);
    }

    #[test]
    fn unparseable_document_falls_back_to_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("seeds.json");
        fs::write(&path, "{ not json").unwrap();
        let (facts, warning) = load_facts(&path);
        assert_eq!(facts, default_facts());
        assert!(warning.is_some());
    }

    #[test]
    fn missing_document_falls_back_to_defaults() {
        let (facts, warning) = load_facts(Path::new("/nonexistent/seeds.yaml"));
        assert_eq!(facts, default_facts());
        assert!(warning.is_some());
    }

    #[test]
    fn array_of_records_loads_every_record() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("seeds.json");
        fs::write(&path, r#"[{"nom": "Ruiz"}, {"annees": [2020]}]"#).unwrap();
        let (facts, warning) = load_facts(&path);
        assert!(warning.is_none());
        assert_eq!(facts.len(), 2);
        let tokens = collect_tokens(&facts);
        assert_eq!(tokens.words(), ["Ruiz"]);
        assert_eq!(tokens.years(), ["2020"]);
    }
}

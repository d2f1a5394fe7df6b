//! Wordlist assembly from ASJP entries.

use std::collections::{BTreeSet, HashMap};
use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use crate::config::LexicalConfig;
use crate::types::{LanguageWordlist, WordEntry};

/// The 40 ASJP meanings used for LDN / LDND.
pub const ASJP_CORE_MEANINGS: [&str; 40] = [
    "I", "you", "we", "one", "two", "person", "fish", "dog", "louse", "tree", "leaf", "skin",
    "blood", "bone", "horn", "ear", "eye", "nose", "tooth", "tongue", "knee", "hand", "breast",
    "liver", "drink", "see", "hear", "die", "come", "sun", "star", "water", "stone", "fire",
    "path", "mountain", "night", "full", "new", "name",
];

fn separator() -> &'static Regex {
    static SEPARATOR: OnceLock<Regex> = OnceLock::new();
    SEPARATOR.get_or_init(|| Regex::new(r",\s*").expect("static regex"))
}

/// Split a raw ASJP cell into `(word, is_loanword)` pairs.
///
/// Synonyms are comma separated and a leading `%` marks a loanword.
/// Repeated synonyms are dropped, as are empty ones.
pub fn parse_word_cell(cell: &str) -> Vec<(String, bool)> {
    let mut seen = BTreeSet::new();
    let mut words = Vec::new();

    for raw in separator().split(cell.trim()) {
        if !seen.insert(raw) {
            continue;
        }
        let (word, loanword) = match raw.strip_prefix('%') {
            Some(rest) => (rest, true),
            None => (raw, false),
        };
        if word.is_empty() {
            continue;
        }
        words.push((word.to_string(), loanword));
    }
    words
}

/// Collects clean wordlists per language.
///
/// Loanwords and meanings outside the configured core list are dropped.
#[derive(Debug, Default)]
pub struct WordlistBuilder {
    core_meanings: Option<BTreeSet<String>>,
    wordlists: HashMap<String, LanguageWordlist>,
    skipped: usize,
}

impl WordlistBuilder {
    pub fn new(config: &LexicalConfig) -> Self {
        Self {
            core_meanings: config.core_meanings.clone(),
            ..Self::default()
        }
    }

    /// Builder restricted to [`ASJP_CORE_MEANINGS`].
    pub fn asjp_core() -> Self {
        Self {
            core_meanings: Some(ASJP_CORE_MEANINGS.iter().map(|m| m.to_string()).collect()),
            ..Self::default()
        }
    }

    fn accepts(&self, entry: &WordEntry) -> bool {
        !entry.loanword
            && self
                .core_meanings
                .as_ref()
                .map_or(true, |core| core.contains(&entry.meaning))
    }

    /// Add one entry; returns whether it was kept.
    pub fn add(&mut self, entry: WordEntry) -> bool {
        if !self.accepts(&entry) {
            self.skipped += 1;
            return false;
        }

        let wordlist = self.wordlists.entry(entry.language).or_default();
        if wordlist
            .synonyms(&entry.meaning)
            .is_some_and(|words| words.contains(&entry.word))
        {
            return false;
        }
        wordlist.push(entry.meaning, entry.word);
        true
    }

    /// Add every synonym of a raw ASJP cell.
    pub fn add_cell(&mut self, language: &str, meaning: &str, cell: &str) {
        for (word, loanword) in parse_word_cell(cell) {
            self.add(WordEntry::new(language, meaning, &word, loanword));
        }
    }

    pub fn finish(self) -> HashMap<String, LanguageWordlist> {
        debug!(
            languages = self.wordlists.len(),
            skipped = self.skipped,
            "wordlists assembled"
        );
        self.wordlists
    }
}

impl Extend<WordEntry> for WordlistBuilder {
    fn extend<T: IntoIterator<Item = WordEntry>>(&mut self, iter: T) {
        for entry in iter {
            self.add(entry);
        }
    }
}

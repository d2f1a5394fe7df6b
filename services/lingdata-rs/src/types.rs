//! Shared data structures for the lingdata distance engine.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// One transcription of a meaning in a language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordEntry {
    pub language: String,
    pub meaning: String,
    pub word: String,
    pub loanword: bool,
}

impl WordEntry {
    pub fn new(language: &str, meaning: &str, word: &str, loanword: bool) -> Self {
        Self {
            language: language.to_string(),
            meaning: meaning.to_string(),
            word: word.to_string(),
            loanword,
        }
    }
}

/// Synonyms of each meaning for a single language.
///
/// Meanings iterate in lexicographic order, which is the total order the
/// LDND off-diagonal terms are taken under. Every meaning present holds at
/// least one word.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageWordlist {
    meanings: BTreeMap<String, Vec<String>>,
}

impl LanguageWordlist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a synonym to `meaning`.
    pub fn push(&mut self, meaning: impl Into<String>, word: impl Into<String>) {
        self.meanings
            .entry(meaning.into())
            .or_default()
            .push(word.into());
    }

    pub fn synonyms(&self, meaning: &str) -> Option<&[String]> {
        self.meanings.get(meaning).map(Vec::as_slice)
    }

    pub fn meanings(&self) -> impl Iterator<Item = &str> {
        self.meanings.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.meanings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meanings.is_empty()
    }

    /// Meanings present in both lists, in ascending order.
    pub fn common_meanings<'a>(&'a self, other: &'a LanguageWordlist) -> Vec<&'a str> {
        self.meanings
            .iter()
            .filter(|(m, words)| {
                !words.is_empty() && other.meanings.get(*m).is_some_and(|w| !w.is_empty())
            })
            .map(|(m, _)| m.as_str())
            .collect()
    }
}

impl<M: Into<String>, W: Into<String>> FromIterator<(M, W)> for LanguageWordlist {
    fn from_iter<I: IntoIterator<Item = (M, W)>>(iter: I) -> Self {
        let mut wordlist = Self::new();
        for (meaning, word) in iter {
            wordlist.push(meaning, word);
        }
        wordlist
    }
}

/// LDN / LDND between two wordlists.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LexicalDistance {
    pub ldn: f64,
    pub ldnd: f64,
    pub common_meanings: usize,
}

/// Lexical distance tagged with its language pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LexicalDistanceRecord {
    pub language_1: String,
    pub language_2: String,
    pub ldn: f64,
    pub ldnd: f64,
    pub common_meanings: usize,
}

impl LexicalDistanceRecord {
    pub fn new(language_1: &str, language_2: &str, distance: LexicalDistance) -> Self {
        Self {
            language_1: language_1.to_string(),
            language_2: language_2.to_string(),
            ldn: distance.ldn,
            ldnd: distance.ldnd,
            common_meanings: distance.common_meanings,
        }
    }
}

/// Glottolog classification level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Family,
    Language,
    Dialect,
}

impl Level {
    pub fn is_lect(self) -> bool {
        matches!(self, Level::Language | Level::Dialect)
    }
}

/// WGS84 position in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Both halves or nothing; NaN counts as missing.
    pub fn from_parts(latitude: Option<f64>, longitude: Option<f64>) -> Option<Self> {
        match (latitude, longitude) {
            (Some(lat), Some(lon)) if !lat.is_nan() && !lon.is_nan() => Some(Self::new(lat, lon)),
            _ => None,
        }
    }
}

/// A Glottolog languoid with its source attributes and derived hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguoidNode {
    pub glottocode: String,
    #[serde(default)]
    pub name: String,
    pub level: Level,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub bookkeeping: bool,
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
    #[serde(default)]
    pub iso_639_3: BTreeSet<String>,
    #[serde(default)]
    pub wals_codes: BTreeSet<String>,
    #[serde(default)]
    pub macroarea: BTreeSet<String>,
    #[serde(default)]
    pub country_ids: BTreeSet<String>,

    // Filled by the tree passes; untouched for bookkeeping entries.
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub family_id: Option<String>,
    #[serde(default)]
    pub depth: Option<usize>,
    #[serde(default)]
    pub subtree_depth: Option<usize>,
    #[serde(default)]
    pub ancestors: Vec<String>,
    #[serde(default)]
    pub descendants: BTreeMap<String, i32>,
}

impl LanguoidNode {
    pub fn new(glottocode: &str, name: &str, level: Level) -> Self {
        Self {
            glottocode: glottocode.to_string(),
            name: name.to_string(),
            level,
            status: None,
            bookkeeping: false,
            coordinates: None,
            iso_639_3: BTreeSet::new(),
            wals_codes: BTreeSet::new(),
            macroarea: BTreeSet::new(),
            country_ids: BTreeSet::new(),
            parent_id: None,
            family_id: None,
            depth: None,
            subtree_depth: None,
            ancestors: Vec::new(),
            descendants: BTreeMap::new(),
        }
    }

    pub fn with_coordinates(mut self, latitude: f64, longitude: f64) -> Self {
        self.coordinates = Some(Coordinates::new(latitude, longitude));
        self
    }

    pub fn with_attribute(mut self, kind: AttributeKind, value: &str) -> Self {
        self.attribute_mut(kind).insert(value.to_string());
        self
    }

    pub fn bookkeeping(mut self) -> Self {
        self.bookkeeping = true;
        self
    }

    pub fn latitude(&self) -> Option<f64> {
        self.coordinates.map(|c| c.latitude)
    }

    pub fn longitude(&self) -> Option<f64> {
        self.coordinates.map(|c| c.longitude)
    }

    pub fn attribute(&self, kind: AttributeKind) -> &BTreeSet<String> {
        match kind {
            AttributeKind::Iso639_3 => &self.iso_639_3,
            AttributeKind::WalsCode => &self.wals_codes,
            AttributeKind::Macroarea => &self.macroarea,
            AttributeKind::Country => &self.country_ids,
        }
    }

    pub fn attribute_mut(&mut self, kind: AttributeKind) -> &mut BTreeSet<String> {
        match kind {
            AttributeKind::Iso639_3 => &mut self.iso_639_3,
            AttributeKind::WalsCode => &mut self.wals_codes,
            AttributeKind::Macroarea => &mut self.macroarea,
            AttributeKind::Country => &mut self.country_ids,
        }
    }

    /// Reset every field the tree passes derive.
    pub fn clear_hierarchy(&mut self) {
        self.parent_id = None;
        self.family_id = None;
        self.depth = None;
        self.subtree_depth = None;
        self.ancestors.clear();
        self.descendants.clear();
    }

    /// Whether the node was placed in a tree.
    pub fn is_placed(&self) -> bool {
        self.depth.is_some()
    }
}

/// Set-valued languoid attributes that accumulate up and inherit down the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeKind {
    Iso639_3,
    WalsCode,
    Macroarea,
    Country,
}

impl AttributeKind {
    pub const ALL: [AttributeKind; 4] = [
        AttributeKind::WalsCode,
        AttributeKind::Iso639_3,
        AttributeKind::Macroarea,
        AttributeKind::Country,
    ];
}

/// Hierarchy fields of one placed languoid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HierarchyRecord {
    pub glottocode: String,
    pub parent_id: Option<String>,
    pub family_id: String,
    pub depth: usize,
    pub subtree_depth: usize,
    pub ancestors: Vec<String>,
    pub descendants: BTreeMap<String, i32>,
}

/// Signed edge distance between a languoid and a relative.
///
/// Ancestors are positive (1 is the parent), descendants negative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathRecord {
    pub glottocode: String,
    pub relative: String,
    pub distance: i32,
}

/// Genealogical and geographic closeness of two lects in the same family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguagePairDistance {
    pub glottocode_1: String,
    pub glottocode_2: String,
    pub shared_ancestors: usize,
    /// Great-circle metres; absent when either side has no coordinates.
    pub geo_distance_m: Option<f64>,
}

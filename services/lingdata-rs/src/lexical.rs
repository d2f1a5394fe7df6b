//! ASJP lexical distances (LDN / LDND) between wordlists.
//!
//! For the meanings `C` two wordlists share, every pair of meanings
//! `m1 <= m2` is scored by the mean normalized Levenshtein distance between
//! the synonyms of `m1` in the first list and those of `m2` in the second.
//! Same-meaning scores give LDN; cross-meaning scores estimate the distance
//! expected by chance, and LDND is LDN rescaled against that baseline.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::hash::BuildHasher;

use ndarray::Array2;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::config::{Config, LexicalConfig, Segmentation};
use crate::error::{Error, Result};
use crate::phonetic::mean_cross_distance;
use crate::types::{LanguageWordlist, LexicalDistance, LexicalDistanceRecord};

/// Computes LDN / LDND for language pairs.
#[derive(Debug, Clone)]
pub struct LexicalDistanceEngine {
    min_common_meanings: usize,
    segmentation: Segmentation,
}

impl Default for LexicalDistanceEngine {
    fn default() -> Self {
        Self::new(&LexicalConfig::default())
    }
}

impl LexicalDistanceEngine {
    pub fn new(config: &LexicalConfig) -> Self {
        Self {
            min_common_meanings: config.min_common_meanings,
            segmentation: config.segmentation,
        }
    }

    pub fn with_min_common_meanings(mut self, min_common_meanings: usize) -> Self {
        self.min_common_meanings = min_common_meanings;
        self
    }

    pub fn min_common_meanings(&self) -> usize {
        self.min_common_meanings
    }

    /// Mean synonym distance for every pair of common meanings.
    ///
    /// Entry `[i, j]` with `i <= j` compares `wl1[common[i]]` against
    /// `wl2[common[j]]`; the lower triangle stays zero.
    pub fn meaning_distances(
        &self,
        wl1: &LanguageWordlist,
        wl2: &LanguageWordlist,
        common: &[&str],
    ) -> Array2<f64> {
        let n = common.len();
        let mut matrix = Array2::<f64>::zeros((n, n));

        for (i, m1) in common.iter().enumerate() {
            let Some(words_1) = wl1.synonyms(m1) else {
                continue;
            };
            for (j, m2) in common.iter().enumerate().skip(i) {
                let Some(words_2) = wl2.synonyms(m2) else {
                    continue;
                };
                matrix[[i, j]] =
                    mean_cross_distance(words_1, words_2, self.segmentation).unwrap_or(0.0);
            }
        }

        matrix
    }

    /// LDN and LDND for one pair of wordlists.
    ///
    /// `Ok(None)` when the lists share `min_common_meanings` meanings or fewer.
    pub fn pairwise_distance(
        &self,
        wl1: &LanguageWordlist,
        wl2: &LanguageWordlist,
    ) -> Result<Option<LexicalDistance>> {
        let common = wl1.common_meanings(wl2);
        let m = common.len();
        if m <= self.min_common_meanings {
            return Ok(None);
        }

        let matrix = self.meaning_distances(wl1, wl2, &common);
        let ldn_sum: f64 = matrix.diag().sum();
        let ldnd_denom: f64 = matrix
            .indexed_iter()
            .filter(|((i, j), _)| i < j)
            .map(|(_, d)| *d)
            .sum();

        if ldnd_denom == 0.0 {
            return Err(Error::ZeroChanceBaseline { common_meanings: m });
        }

        // Mean of the m(m-1)/2 cross terms divided into the mean of the m
        // diagonal terms reduces to (m - 1) / 2 * ldn_sum / ldnd_denom.
        Ok(Some(LexicalDistance {
            ldn: ldn_sum / m as f64,
            ldnd: 0.5 * (m as f64 - 1.0) * ldn_sum / ldnd_denom,
            common_meanings: m,
        }))
    }

    /// Lazily compare every candidate pair.
    ///
    /// Pairs with a language missing from `wordlists` or with too few common
    /// meanings produce nothing; failures are yielded per pair.
    pub fn compare_all<'a, I, S>(
        &'a self,
        wordlists: &'a HashMap<String, LanguageWordlist, S>,
        candidate_pairs: I,
    ) -> CompareAll<'a, I::IntoIter, S>
    where
        I: IntoIterator<Item = &'a (String, String)>,
        S: BuildHasher,
    {
        CompareAll {
            engine: self,
            wordlists,
            pairs: candidate_pairs.into_iter(),
            processed: 0,
        }
    }

    /// Compare every candidate pair on the rayon pool.
    ///
    /// Output follows the order of `candidate_pairs`.
    pub fn par_compare_all<S>(
        &self,
        wordlists: &HashMap<String, LanguageWordlist, S>,
        candidate_pairs: &BTreeSet<(String, String)>,
    ) -> Vec<Result<LexicalDistanceRecord>>
    where
        S: BuildHasher + Sync,
    {
        let pairs: Vec<&(String, String)> = candidate_pairs.iter().collect();

        pairs
            .par_iter()
            .filter_map(|(l1, l2)| {
                let wl1 = wordlists.get(l1)?;
                let wl2 = wordlists.get(l2)?;
                match self.pairwise_distance(wl1, wl2) {
                    Ok(Some(d)) => Some(Ok(LexicalDistanceRecord::new(l1, l2, d))),
                    Ok(None) => None,
                    Err(e) => Some(Err(e.for_pair(l1, l2))),
                }
            })
            .collect()
    }
}

/// Lazy sequence of lexical distance records.
pub struct CompareAll<'a, I, S> {
    engine: &'a LexicalDistanceEngine,
    wordlists: &'a HashMap<String, LanguageWordlist, S>,
    pairs: I,
    processed: usize,
}

impl<'a, I, S> CompareAll<'a, I, S>
where
    I: Iterator<Item = &'a (String, String)>,
    S: BuildHasher,
{
    /// Candidate pairs consumed so far, including those that produced nothing.
    pub fn processed(&self) -> usize {
        self.processed
    }

    /// Group output into checkpoints every `interval` processed pairs.
    pub fn checkpoints(self, interval: usize) -> Checkpoints<'a, I, S> {
        Checkpoints {
            inner: self,
            interval: interval.max(1),
            emitted: 0,
            done: false,
        }
    }

    /// Checkpoints at the configured `checkpoint_interval`.
    pub fn configured_checkpoints(self, config: &Config) -> Checkpoints<'a, I, S> {
        self.checkpoints(config.checkpoint_interval)
    }

    /// Consume one candidate pair.
    fn step(&mut self) -> Option<Option<Result<LexicalDistanceRecord>>> {
        let (l1, l2) = self.pairs.next()?;
        self.processed += 1;

        let (Some(wl1), Some(wl2)) = (self.wordlists.get(l1), self.wordlists.get(l2)) else {
            debug!(language_1 = %l1, language_2 = %l2, "no wordlist for candidate pair");
            return Some(None);
        };

        Some(match self.engine.pairwise_distance(wl1, wl2) {
            Ok(Some(d)) => Some(Ok(LexicalDistanceRecord::new(l1, l2, d))),
            Ok(None) => None,
            Err(e) => Some(Err(e.for_pair(l1, l2))),
        })
    }
}

impl<'a, I, S> Iterator for CompareAll<'a, I, S>
where
    I: Iterator<Item = &'a (String, String)>,
    S: BuildHasher,
{
    type Item = Result<LexicalDistanceRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(outcome) = self.step()? {
                return Some(outcome);
            }
        }
    }
}

/// Results gathered since the previous checkpoint.
#[derive(Debug, Default)]
pub struct Checkpoint {
    /// Total candidate pairs processed when the checkpoint was cut.
    pub processed: usize,
    pub records: Vec<LexicalDistanceRecord>,
    pub failures: Vec<Error>,
}

/// Checkpointing view of [`CompareAll`].
pub struct Checkpoints<'a, I, S> {
    inner: CompareAll<'a, I, S>,
    interval: usize,
    /// `processed` at the last checkpoint handed out.
    emitted: usize,
    done: bool,
}

impl<'a, I, S> Iterator for Checkpoints<'a, I, S>
where
    I: Iterator<Item = &'a (String, String)>,
    S: BuildHasher,
{
    type Item = Checkpoint;

    fn next(&mut self) -> Option<Checkpoint> {
        if self.done {
            return None;
        }

        let mut checkpoint = Checkpoint::default();
        loop {
            match self.inner.step() {
                None => {
                    self.done = true;
                    break;
                }
                Some(Some(Ok(record))) => checkpoint.records.push(record),
                Some(Some(Err(e))) => checkpoint.failures.push(e),
                Some(None) => {}
            }
            if self.inner.processed % self.interval == 0 {
                break;
            }
        }

        checkpoint.processed = self.inner.processed;
        if checkpoint.processed == self.emitted {
            return None;
        }
        self.emitted = checkpoint.processed;
        info!(processed = checkpoint.processed, "processed {}", checkpoint.processed);
        Some(checkpoint)
    }
}

/// Every same-family pair `(a, b)` with `a < b`.
pub fn same_family_pairs<L, F, T>(assignments: T) -> BTreeSet<(String, String)>
where
    L: Into<String>,
    F: Into<String>,
    T: IntoIterator<Item = (L, F)>,
{
    let mut families: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for (language, family) in assignments {
        families
            .entry(family.into())
            .or_default()
            .insert(language.into());
    }

    let mut pairs = BTreeSet::new();
    for members in families.values() {
        let members: Vec<&String> = members.iter().collect();
        for (i, a) in members.iter().enumerate() {
            for b in &members[i + 1..] {
                pairs.insert(((*a).clone(), (*b).clone()));
            }
        }
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wordlist(entries: &[(&str, &str)]) -> LanguageWordlist {
        entries.iter().copied().collect()
    }

    #[test]
    fn test_too_few_common_meanings() {
        let engine = LexicalDistanceEngine::default();
        let a = wordlist(&[("cat", "kat"), ("dog", "dog"), ("fish", "fis")]);
        let b = wordlist(&[("cat", "kat"), ("dog", "dag"), ("tree", "tri")]);
        assert!(engine.pairwise_distance(&a, &b).unwrap().is_none());
    }

    #[test]
    fn test_hand_computed_ldnd() {
        let engine = LexicalDistanceEngine::default();
        let a = wordlist(&[("a", "ab"), ("b", "cd"), ("c", "ef")]);
        let b = wordlist(&[("a", "ab"), ("b", "cx"), ("c", "ef")]);

        let d = engine.pairwise_distance(&a, &b).unwrap().unwrap();
        // diagonal: 0 + 0.5 + 0, cross terms: 1 + 1 + 1
        let ldn_sum = 0.5;
        let ldnd_denom = 3.0;
        assert_eq!(d.common_meanings, 3);
        assert!((d.ldn - ldn_sum / 3.0).abs() < 1e-12);
        assert!((d.ldnd - 0.5 * 2.0 * ldn_sum / ldnd_denom).abs() < 1e-12);
    }

    #[test]
    fn test_synonyms_are_averaged() {
        let engine = LexicalDistanceEngine::default();
        let mut a = wordlist(&[("a", "ab"), ("b", "xy"), ("c", "pq")]);
        a.push("a", "zz");
        let b = wordlist(&[("a", "ab"), ("b", "xy"), ("c", "pq")]);

        let d = engine.pairwise_distance(&a, &b).unwrap().unwrap();
        // meaning a: ("ab", "ab") = 0 and ("zz", "ab") = 1
        assert!((d.ldn - 0.5 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_identical_lists_have_zero_ldn() {
        let engine = LexicalDistanceEngine::default();
        let a = wordlist(&[("I", "ya"), ("you", "tu"), ("we", "nos")]);
        let d = engine.pairwise_distance(&a, &a).unwrap().unwrap();
        assert_eq!(d.ldn, 0.0);
        assert_eq!(d.ldnd, 0.0);
    }

    #[test]
    fn test_zero_baseline_is_an_error() {
        let engine = LexicalDistanceEngine::default();
        let a = wordlist(&[("a", "na"), ("b", "na"), ("c", "na")]);
        let err = engine.pairwise_distance(&a, &a).unwrap_err();
        assert!(matches!(err, Error::ZeroChanceBaseline { common_meanings: 3 }));
    }

    #[test]
    fn test_meaning_matrix_lower_triangle_zero() {
        let engine = LexicalDistanceEngine::default();
        let a = wordlist(&[("a", "ab"), ("b", "cd")]);
        let b = wordlist(&[("a", "xy"), ("b", "cd")]);
        let common = a.common_meanings(&b);
        let m = engine.meaning_distances(&a, &b, &common);
        assert_eq!(m.shape(), &[2, 2]);
        assert_eq!(m[[1, 0]], 0.0);
        assert_eq!(m[[0, 0]], 1.0);
        assert_eq!(m[[0, 1]], 1.0);
        assert_eq!(m[[1, 1]], 0.0);
    }

    #[test]
    fn test_compare_all_reports_failures_and_continues() {
        let engine = LexicalDistanceEngine::default();
        let mut wordlists = HashMap::new();
        wordlists.insert("flat".to_string(), wordlist(&[("a", "na"), ("b", "na"), ("c", "na")]));
        wordlists.insert("x".to_string(), wordlist(&[("a", "ab"), ("b", "cd"), ("c", "ef")]));
        wordlists.insert("y".to_string(), wordlist(&[("a", "ab"), ("b", "cx"), ("c", "ef")]));

        let pairs = BTreeSet::from([
            ("flat".to_string(), "flat".to_string()),
            ("ghost".to_string(), "x".to_string()),
            ("x".to_string(), "y".to_string()),
        ]);

        let mut iter = engine.compare_all(&wordlists, &pairs);
        let first = iter.next().unwrap();
        assert!(matches!(first, Err(Error::Pair { .. })));
        let second = iter.next().unwrap().unwrap();
        assert_eq!((second.language_1.as_str(), second.language_2.as_str()), ("x", "y"));
        assert!(iter.next().is_none());
        assert_eq!(iter.processed(), 3);
    }

    #[test]
    fn test_checkpoints_cut_on_processed_pairs() {
        let engine = LexicalDistanceEngine::default();
        let mut wordlists = HashMap::new();
        for name in ["p", "q", "r"] {
            wordlists.insert(name.to_string(), wordlist(&[("a", "ab"), ("b", "cd"), ("c", "ef")]));
        }
        // One pair has no data but still counts towards the interval.
        let pairs = BTreeSet::from([
            ("p".to_string(), "q".to_string()),
            ("p".to_string(), "r".to_string()),
            ("q".to_string(), "r".to_string()),
            ("q".to_string(), "z".to_string()),
            ("r".to_string(), "p".to_string()),
        ]);

        let checkpoints: Vec<Checkpoint> =
            engine.compare_all(&wordlists, &pairs).checkpoints(2).collect();
        let processed: Vec<usize> = checkpoints.iter().map(|c| c.processed).collect();
        let counts: Vec<usize> = checkpoints.iter().map(|c| c.records.len()).collect();
        assert_eq!(processed, vec![2, 4, 5]);
        assert_eq!(counts, vec![2, 1, 1]);
    }

    #[test]
    fn test_final_checkpoint_reports_trailing_empty_pairs() {
        let engine = LexicalDistanceEngine::default();
        let mut wordlists = HashMap::new();
        for name in ["p", "q", "r"] {
            wordlists.insert(name.to_string(), wordlist(&[("a", "ab"), ("b", "cd"), ("c", "ef")]));
        }
        let pairs = BTreeSet::from([
            ("p".to_string(), "q".to_string()),
            ("p".to_string(), "r".to_string()),
            ("q".to_string(), "r".to_string()),
            ("r".to_string(), "p".to_string()),
            ("z".to_string(), "p".to_string()),
        ]);

        let checkpoints: Vec<Checkpoint> =
            engine.compare_all(&wordlists, &pairs).checkpoints(2).collect();
        let processed: Vec<usize> = checkpoints.iter().map(|c| c.processed).collect();
        assert_eq!(processed, vec![2, 4, 5]);
        let last = checkpoints.last().unwrap();
        assert!(last.records.is_empty() && last.failures.is_empty());

        // An exact multiple of the interval ends on the last full checkpoint.
        let even: Vec<usize> = engine
            .compare_all(&wordlists, pairs.iter().take(4))
            .checkpoints(2)
            .map(|c| c.processed)
            .collect();
        assert_eq!(even, vec![2, 4]);
    }

    #[test]
    fn test_configured_checkpoint_interval() {
        let engine = LexicalDistanceEngine::default();
        let mut wordlists = HashMap::new();
        for name in ["p", "q", "r"] {
            wordlists.insert(name.to_string(), wordlist(&[("a", "ab"), ("b", "cd"), ("c", "ef")]));
        }
        let pairs = same_family_pairs([("p", "F"), ("q", "F"), ("r", "F")]);

        let mut config = Config::default();
        let single: Vec<Checkpoint> = engine
            .compare_all(&wordlists, &pairs)
            .configured_checkpoints(&config)
            .collect();
        assert_eq!(single.len(), 1);
        assert_eq!(single[0].processed, 3);
        assert_eq!(single[0].records.len(), 3);

        config.checkpoint_interval = 1;
        let each = engine
            .compare_all(&wordlists, &pairs)
            .configured_checkpoints(&config)
            .count();
        assert_eq!(each, 3);
    }

    #[test]
    fn test_par_compare_all_matches_sequential() {
        let engine = LexicalDistanceEngine::default();
        let mut wordlists = HashMap::new();
        wordlists.insert("x".to_string(), wordlist(&[("a", "ab"), ("b", "cd"), ("c", "ef")]));
        wordlists.insert("y".to_string(), wordlist(&[("a", "ab"), ("b", "cx"), ("c", "ef")]));
        wordlists.insert("z".to_string(), wordlist(&[("a", "ob"), ("b", "cd"), ("c", "gf")]));
        let pairs = same_family_pairs([("x", "F"), ("y", "F"), ("z", "F")]);

        let sequential: Vec<_> = engine
            .compare_all(&wordlists, &pairs)
            .map(|r| r.unwrap())
            .collect();
        let parallel: Vec<_> = engine
            .par_compare_all(&wordlists, &pairs)
            .into_iter()
            .map(|r| r.unwrap())
            .collect();
        assert_eq!(sequential, parallel);
        assert_eq!(sequential.len(), 3);
    }

    #[test]
    fn test_same_family_pairs() {
        let pairs = same_family_pairs([("b", "F"), ("a", "F"), ("c", "G"), ("d", "G"), ("e", "H")]);
        let expected = BTreeSet::from([
            ("a".to_string(), "b".to_string()),
            ("c".to_string(), "d".to_string()),
        ]);
        assert_eq!(pairs, expected);
    }
}

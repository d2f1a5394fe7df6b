use std::collections::{BTreeSet, HashMap};

use lingdata_core::phonetic::normalized_edit_distance;
use lingdata_core::{
    parse_glottolog, parse_word_cell, same_family_pairs, AttributeKind, Config,
    DistanceMatrixBuilder, Error, LanguageWordlist, LanguoidNode, LanguoidTreeIndex,
    LexicalDistance, LexicalDistanceEngine, Segmentation,
};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use tracing::warn;
use tracing_subscriber::EnvFilter;

fn to_py_err(err: Error) -> PyErr {
    PyValueError::new_err(err.to_string())
}

fn to_wordlist(meanings: HashMap<String, Vec<String>>) -> LanguageWordlist {
    meanings
        .into_iter()
        .flat_map(|(meaning, words)| words.into_iter().map(move |w| (meaning.clone(), w)))
        .collect()
}

fn engine(min_common_meanings: usize, grapheme: bool) -> LexicalDistanceEngine {
    let mut config = Config::default().lexical;
    config.min_common_meanings = min_common_meanings;
    if grapheme {
        config.segmentation = Segmentation::Grapheme;
    }
    LexicalDistanceEngine::new(&config)
}

/// Install a stderr tracing subscriber filtered by `filter` or `RUST_LOG`.
#[pyfunction]
#[pyo3(signature = (filter = None))]
fn init_logging(filter: Option<&str>) -> PyResult<bool> {
    let filter = match filter {
        Some(f) => EnvFilter::try_new(f).map_err(|e| PyValueError::new_err(e.to_string()))?,
        None => EnvFilter::from_default_env(),
    };
    Ok(tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok())
}

/// Levenshtein distance divided by the longer word's length.
#[pyfunction]
#[pyo3(signature = (word_a, word_b, grapheme = false))]
fn py_normalized_edit_distance(word_a: &str, word_b: &str, grapheme: bool) -> f64 {
    let segmentation = if grapheme {
        Segmentation::Grapheme
    } else {
        Segmentation::CodePoint
    };
    normalized_edit_distance(word_a, word_b, segmentation)
}

#[pyfunction]
fn py_parse_word_cell(cell: &str) -> Vec<(String, bool)> {
    parse_word_cell(cell)
}

#[pyfunction]
fn py_same_family_pairs(assignments: Vec<(String, String)>) -> Vec<(String, String)> {
    same_family_pairs(assignments).into_iter().collect()
}

/// LDN / LDND between two `{meaning: [synonym, ...]}` mappings.
#[pyfunction]
#[pyo3(signature = (words_1, words_2, min_common_meanings = 2, grapheme = false))]
fn py_pairwise_distance(
    words_1: HashMap<String, Vec<String>>,
    words_2: HashMap<String, Vec<String>>,
    min_common_meanings: usize,
    grapheme: bool,
) -> PyResult<Option<PyLexicalDistance>> {
    let engine = engine(min_common_meanings, grapheme);
    engine
        .pairwise_distance(&to_wordlist(words_1), &to_wordlist(words_2))
        .map(|d| d.map(PyLexicalDistance::from))
        .map_err(to_py_err)
}

/// Compare every candidate pair in parallel.
///
/// Pairs that fail are logged and left out of the result.
#[pyfunction]
#[pyo3(signature = (wordlists, pairs, min_common_meanings = 2, grapheme = false))]
fn py_compare_all(
    py: Python<'_>,
    wordlists: HashMap<String, HashMap<String, Vec<String>>>,
    pairs: Vec<(String, String)>,
    min_common_meanings: usize,
    grapheme: bool,
) -> Vec<(String, String, f64, f64, usize)> {
    let engine = engine(min_common_meanings, grapheme);
    let wordlists: HashMap<String, LanguageWordlist> = wordlists
        .into_iter()
        .map(|(language, meanings)| (language, to_wordlist(meanings)))
        .collect();
    let pairs: BTreeSet<(String, String)> = pairs.into_iter().collect();

    let results = py.allow_threads(|| engine.par_compare_all(&wordlists, &pairs));
    results
        .into_iter()
        .filter_map(|r| match r {
            Ok(r) => Some((r.language_1, r.language_2, r.ldn, r.ldnd, r.common_meanings)),
            Err(e) => {
                warn!(error = %e, "skipping language pair");
                None
            }
        })
        .collect()
}

/// Build a fully propagated index from a Newick export and JSON languoid records.
#[pyfunction]
fn py_build_languoid_index(newick: &str, records_json: &str) -> PyResult<PyLanguoidIndex> {
    let forest = parse_glottolog(newick).map_err(to_py_err)?;
    let records: Vec<LanguoidNode> = serde_json::from_str(records_json)
        .map_err(|e| to_py_err(Error::Config(e)))?;
    let inner = LanguoidTreeIndex::build(records, &forest).map_err(to_py_err)?;
    Ok(PyLanguoidIndex { inner })
}

// ============================================================================
// PYTHON WRAPPER TYPES
// ============================================================================

#[pyclass]
struct PyLexicalDistance {
    #[pyo3(get)]
    ldn: f64,
    #[pyo3(get)]
    ldnd: f64,
    #[pyo3(get)]
    common_meanings: usize,
}

impl From<LexicalDistance> for PyLexicalDistance {
    fn from(d: LexicalDistance) -> Self {
        Self {
            ldn: d.ldn,
            ldnd: d.ldnd,
            common_meanings: d.common_meanings,
        }
    }
}

#[pyclass]
struct PyLanguoidIndex {
    inner: LanguoidTreeIndex,
}

fn attribute_kind(name: &str) -> PyResult<AttributeKind> {
    match name {
        "iso_639_3" => Ok(AttributeKind::Iso639_3),
        "wals_codes" => Ok(AttributeKind::WalsCode),
        "macroarea" => Ok(AttributeKind::Macroarea),
        "country_ids" => Ok(AttributeKind::Country),
        other => Err(PyValueError::new_err(format!("unknown attribute {other}"))),
    }
}

#[pymethods]
impl PyLanguoidIndex {
    fn __len__(&self) -> usize {
        self.inner.len()
    }

    fn families(&self) -> Vec<String> {
        self.inner.families().map(str::to_string).collect()
    }

    /// One languoid as JSON, or `None` for an unknown glottocode.
    fn node_json(&self, glottocode: &str) -> PyResult<Option<String>> {
        self.inner
            .get(glottocode)
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| to_py_err(Error::Config(e)))
    }

    fn hierarchy_json(&self) -> PyResult<String> {
        let records: Vec<_> = self.inner.hierarchy_records().collect();
        serde_json::to_string(&records).map_err(|e| to_py_err(Error::Config(e)))
    }

    fn path_records(&self) -> Vec<(String, String, i32)> {
        self.inner
            .path_records()
            .map(|p| (p.glottocode, p.relative, p.distance))
            .collect()
    }

    fn attribute_pairs(&self, attribute: &str) -> PyResult<Vec<(String, String)>> {
        let kind = attribute_kind(attribute)?;
        Ok(self
            .inner
            .attribute_pairs(kind)
            .map(|(g, v)| (g.to_string(), v.to_string()))
            .collect())
    }

    /// `(glottocode_1, glottocode_2, shared_ancestors, metres)` for same-family lects.
    fn language_distances(&self, py: Python<'_>) -> PyResult<Vec<(String, String, usize, Option<f64>)>> {
        let config = Config::default().geo;
        let builder = DistanceMatrixBuilder::new(&self.inner, &config).map_err(to_py_err)?;
        let records = py.allow_threads(|| builder.par_build());
        Ok(records
            .into_iter()
            .map(|r| (r.glottocode_1, r.glottocode_2, r.shared_ancestors, r.geo_distance_m))
            .collect())
    }
}

// ============================================================================
// MODULE DEFINITION
// ============================================================================

#[pymodule]
fn lingdata_native(_py: Python, m: &PyModule) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(init_logging, m)?)?;

    // Lexical functions
    m.add_function(wrap_pyfunction!(py_normalized_edit_distance, m)?)?;
    m.add_function(wrap_pyfunction!(py_parse_word_cell, m)?)?;
    m.add_function(wrap_pyfunction!(py_same_family_pairs, m)?)?;
    m.add_function(wrap_pyfunction!(py_pairwise_distance, m)?)?;
    m.add_function(wrap_pyfunction!(py_compare_all, m)?)?;

    // Glottolog functions
    m.add_function(wrap_pyfunction!(py_build_languoid_index, m)?)?;

    // Classes
    m.add_class::<PyLexicalDistance>()?;
    m.add_class::<PyLanguoidIndex>()?;

    Ok(())
}

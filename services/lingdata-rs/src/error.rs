//! Error types shared across the distance engine.

use thiserror::Error;

/// Result alias for `lingdata_core`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by the lexical engine, the languoid tree index and the parsers.
#[derive(Debug, Error)]
pub enum Error {
    /// Every cross-meaning comparison summed to zero, so LDND has no baseline.
    #[error("LDND chance baseline is zero over {common_meanings} common meanings")]
    ZeroChanceBaseline { common_meanings: usize },

    /// A single language pair failed; the rest of the batch is unaffected.
    #[error("comparison {language_1} / {language_2} failed: {source}")]
    Pair {
        language_1: String,
        language_2: String,
        #[source]
        source: Box<Error>,
    },

    /// A tree references a languoid absent from the record table.
    #[error("languoid {glottocode} referenced under {parent:?} has no record")]
    MissingLanguoid {
        glottocode: String,
        parent: Option<String>,
    },

    /// Two records share a glottocode.
    #[error("duplicate languoid record {0}")]
    DuplicateLanguoid(String),

    /// A languoid appears more than once in the forest.
    #[error("languoid {0} is placed in the hierarchy more than once")]
    AlreadyPlaced(String),

    /// A tree pass was requested out of order.
    #[error("tree pass {requested} cannot run in state {state}")]
    PassOrder {
        requested: &'static str,
        state: &'static str,
    },

    #[error("newick syntax error at byte {position}: {message}")]
    NewickSyntax {
        position: usize,
        message: &'static str,
    },

    /// Node label does not follow `Name [glottocode][iso]-l-`.
    #[error("unrecognised glottolog label: {0:?}")]
    InvalidLabel(String),

    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Attach the language pair to a per-pair failure.
    pub fn for_pair(self, language_1: &str, language_2: &str) -> Self {
        Error::Pair {
            language_1: language_1.to_string(),
            language_2: language_2.to_string(),
            source: Box::new(self),
        }
    }
}

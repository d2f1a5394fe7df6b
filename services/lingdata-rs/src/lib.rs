//! lingdata core: pairwise lexical and phylogenetic distances between languages.
//!
//! - ASJP lexical distances (LDN / LDND) over meaning-keyed synonym lists
//! - Glottolog hierarchy index with bottom-up and top-down propagation
//! - Same-family distance matrix (shared ancestors, great-circle distance)
//!
//! Everything here works on in-memory records; fetching and storage are left
//! to the caller. Results are exposed as lazy iterators so long runs can be
//! checkpointed.

pub mod config;
pub mod distmat;
pub mod error;
pub mod geo;
pub mod lexical;
pub mod newick;
pub mod phonetic;
pub mod tree;
pub mod types;
pub mod wordlist;

pub use config::{Config, GeoConfig, LexicalConfig, Segmentation};
pub use distmat::DistanceMatrixBuilder;
pub use error::{Error, Result};
pub use lexical::{same_family_pairs, Checkpoint, LexicalDistanceEngine};
pub use newick::{parse_glottolog, TreeNode};
pub use tree::{LanguoidTreeIndex, PassState};
pub use types::{
    AttributeKind, Coordinates, HierarchyRecord, LanguagePairDistance, LanguageWordlist,
    LanguoidNode, Level, LexicalDistance, LexicalDistanceRecord, PathRecord, WordEntry,
};
pub use wordlist::{parse_word_cell, WordlistBuilder, ASJP_CORE_MEANINGS};

//! Genealogical and geographic distances between lects of the same family.

use std::collections::BTreeMap;

use rayon::prelude::*;
use tracing::info;

use crate::config::GeoConfig;
use crate::error::{Error, Result};
use crate::geo::great_circle_distance;
use crate::tree::{LanguoidTreeIndex, PassState};
use crate::types::{LanguagePairDistance, LanguoidNode};

/// Emits a [`LanguagePairDistance`] for every ordered same-family pair.
pub struct DistanceMatrixBuilder<'a> {
    families: Vec<Vec<&'a LanguoidNode>>,
    radius_km: f64,
}

impl<'a> DistanceMatrixBuilder<'a> {
    /// Builder over a fully propagated index.
    pub fn new(index: &'a LanguoidTreeIndex, config: &GeoConfig) -> Result<Self> {
        if index.state() != PassState::Resolved {
            return Err(Error::PassOrder {
                requested: "distance matrix",
                state: "incomplete",
            });
        }
        Ok(Self::from_nodes(index.nodes(), config))
    }

    /// Builder over arbitrary resolved nodes.
    ///
    /// Only placed, non-bookkeeping languages and dialects with a family are kept.
    pub fn from_nodes<I>(nodes: I, config: &GeoConfig) -> Self
    where
        I: IntoIterator<Item = &'a LanguoidNode>,
    {
        let mut by_family: BTreeMap<&str, Vec<&LanguoidNode>> = BTreeMap::new();
        for node in nodes {
            if !node.level.is_lect() || node.bookkeeping || !node.is_placed() {
                continue;
            }
            if let Some(family) = node.family_id.as_deref() {
                by_family.entry(family).or_default().push(node);
            }
        }

        let families: Vec<Vec<&LanguoidNode>> = by_family.into_values().collect();
        info!(
            families = families.len(),
            lects = families.iter().map(Vec::len).sum::<usize>(),
            "distance matrix prepared"
        );

        Self {
            families,
            radius_km: config.earth_radius_km,
        }
    }

    /// Number of records [`build`](Self::build) will yield.
    pub fn pair_count(&self) -> usize {
        self.families
            .iter()
            .map(|f| f.len() * f.len().saturating_sub(1))
            .sum()
    }

    /// Lazily yield every ordered pair, family by family.
    pub fn build(&self) -> impl Iterator<Item = LanguagePairDistance> + '_ {
        let radius_km = self.radius_km;
        self.families.iter().flat_map(move |members| {
            members.iter().flat_map(move |a| {
                members
                    .iter()
                    .filter(move |b| a.glottocode != b.glottocode)
                    .map(move |b| pair_distance(a, b, radius_km))
            })
        })
    }

    /// Same records as [`build`](Self::build), computed on the rayon pool.
    pub fn par_build(&self) -> Vec<LanguagePairDistance> {
        let radius_km = self.radius_km;
        self.families
            .par_iter()
            .flat_map_iter(|members| {
                members.iter().flat_map(move |a| {
                    members
                        .iter()
                        .filter(move |b| a.glottocode != b.glottocode)
                        .map(move |b| pair_distance(a, b, radius_km))
                })
            })
            .collect()
    }
}

/// Number of ancestors `a` and `b` have in common.
pub fn shared_ancestors(a: &LanguoidNode, b: &LanguoidNode) -> usize {
    a.ancestors
        .iter()
        .filter(|ancestor| b.ancestors.contains(ancestor))
        .count()
}

/// Distance record for one ordered pair.
pub fn pair_distance(a: &LanguoidNode, b: &LanguoidNode, radius_km: f64) -> LanguagePairDistance {
    let geo_distance_m = match (a.coordinates, b.coordinates) {
        (Some(pa), Some(pb)) => Some(great_circle_distance(pa, pb, radius_km)),
        _ => None,
    };

    LanguagePairDistance {
        glottocode_1: a.glottocode.clone(),
        glottocode_2: b.glottocode.clone(),
        shared_ancestors: shared_ancestors(a, b),
        geo_distance_m,
    }
}

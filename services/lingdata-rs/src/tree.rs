//! Glottolog hierarchy index.
//!
//! Languoid records live in a `petgraph` arena with parent -> child edges.
//! Two passes complete the records:
//!
//! 1. [`LanguoidTreeIndex::propagate_up`]: post-order. Places each node
//!    (family, ancestors, depth, parent), then folds its children into it:
//!    attribute unions, signed descendant distances, a centroid for missing
//!    coordinates and the subtree depth.
//! 2. [`LanguoidTreeIndex::propagate_down`]: pre-order. Empty attribute sets
//!    and missing coordinates are inherited from the already resolved parent.
//!
//! Bookkeeping languoids stay in the table but are never placed.

use std::collections::{BTreeMap, BTreeSet};

use ahash::AHashMap;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Bfs;
use petgraph::Direction;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::geo::geodesic_centroid;
use crate::newick::TreeNode;
use crate::types::{AttributeKind, HierarchyRecord, LanguoidNode, PathRecord};

/// Progress of the two tree passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassState {
    /// Edges are in place, no pass has run.
    Placed,
    /// Bottom-up pass complete.
    Aggregated,
    /// Both passes complete; the index is frozen.
    Resolved,
}

impl PassState {
    fn name(self) -> &'static str {
        match self {
            PassState::Placed => "placed",
            PassState::Aggregated => "aggregated",
            PassState::Resolved => "resolved",
        }
    }
}

enum Visit {
    Enter(NodeIndex),
    Exit(NodeIndex),
}

/// Arena of languoids with their classification.
pub struct LanguoidTreeIndex {
    graph: DiGraph<LanguoidNode, ()>,
    index: AHashMap<String, NodeIndex>,
    roots: Vec<NodeIndex>,
    state: PassState,
}

impl LanguoidTreeIndex {
    /// Load `records` and attach them according to `forest`.
    ///
    /// Every glottocode referenced by the forest must have a record.
    /// Hierarchy fields supplied with the records are discarded; bookkeeping
    /// records (and anything listed beneath them) are left unplaced.
    pub fn new<I>(records: I, forest: &[TreeNode]) -> Result<Self>
    where
        I: IntoIterator<Item = LanguoidNode>,
    {
        let mut graph = DiGraph::new();
        let mut index = AHashMap::new();

        for mut record in records {
            record.clear_hierarchy();
            if index.contains_key(&record.glottocode) {
                return Err(Error::DuplicateLanguoid(record.glottocode));
            }
            let glottocode = record.glottocode.clone();
            let ix = graph.add_node(record);
            index.insert(glottocode, ix);
        }

        let mut placed = vec![false; graph.node_count()];
        let mut roots = Vec::with_capacity(forest.len());

        for tree in forest {
            let mut work: Vec<(&TreeNode, Option<NodeIndex>)> = vec![(tree, None)];
            while let Some((tree_node, parent)) = work.pop() {
                let Some(&ix) = index.get(&tree_node.glottocode) else {
                    return Err(Error::MissingLanguoid {
                        glottocode: tree_node.glottocode.clone(),
                        parent: parent.map(|p| graph[p].glottocode.clone()),
                    });
                };
                if graph[ix].bookkeeping {
                    debug!(glottocode = %tree_node.glottocode, "skipping bookkeeping languoid");
                    continue;
                }
                if placed[ix.index()] {
                    return Err(Error::AlreadyPlaced(tree_node.glottocode.clone()));
                }
                placed[ix.index()] = true;

                match parent {
                    Some(p) => {
                        graph.add_edge(p, ix, ());
                    }
                    None => roots.push(ix),
                }
                work.extend(tree_node.children.iter().rev().map(|c| (c, Some(ix))));
            }
        }

        info!(
            languoids = graph.node_count(),
            families = roots.len(),
            placed = placed.iter().filter(|p| **p).count(),
            "languoid tree placed"
        );

        Ok(Self {
            graph,
            index,
            roots,
            state: PassState::Placed,
        })
    }

    /// Place the forest and run both passes.
    pub fn build<I>(records: I, forest: &[TreeNode]) -> Result<Self>
    where
        I: IntoIterator<Item = LanguoidNode>,
    {
        let mut tree = Self::new(records, forest)?;
        tree.propagate_up()?;
        tree.propagate_down()?;
        Ok(tree)
    }

    fn advance(&mut self, requested: &'static str, from: PassState, to: PassState) -> Result<()> {
        if self.state != from {
            return Err(Error::PassOrder {
                requested,
                state: self.state.name(),
            });
        }
        self.state = to;
        Ok(())
    }

    fn parent_of(&self, node: NodeIndex) -> Option<NodeIndex> {
        self.graph
            .neighbors_directed(node, Direction::Incoming)
            .next()
    }

    /// Bottom-up pass.
    pub fn propagate_up(&mut self) -> Result<()> {
        self.advance("propagate_up", PassState::Placed, PassState::Aggregated)?;

        for root in self.roots.clone() {
            let mut work = vec![Visit::Enter(root)];
            while let Some(visit) = work.pop() {
                match visit {
                    Visit::Enter(node) => {
                        self.place(node);
                        work.push(Visit::Exit(node));
                        work.extend(self.graph.neighbors(node).map(Visit::Enter));
                    }
                    Visit::Exit(node) => self.aggregate(node),
                }
            }
        }

        debug!(families = self.roots.len(), "bottom-up pass complete");
        Ok(())
    }

    /// Derive family, ancestors, depth and parent from the placed parent.
    fn place(&mut self, node: NodeIndex) {
        let (ancestors, depth, family_id) = match self.parent_of(node) {
            Some(parent) => {
                let parent = &self.graph[parent];
                let mut ancestors = parent.ancestors.clone();
                ancestors.push(parent.glottocode.clone());
                (
                    ancestors,
                    parent.depth.unwrap_or(0) + 1,
                    parent.family_id.clone(),
                )
            }
            None => (Vec::new(), 1, Some(self.graph[node].glottocode.clone())),
        };

        let languoid = &mut self.graph[node];
        languoid.parent_id = ancestors.last().cloned();
        languoid.ancestors = ancestors;
        languoid.depth = Some(depth);
        languoid.family_id = family_id;
    }

    /// Fold the finished children of `node` into it.
    fn aggregate(&mut self, node: NodeIndex) {
        let mut unions: [BTreeSet<String>; 4] = Default::default();
        let mut descendants = BTreeMap::new();
        let mut child_coordinates = Vec::new();
        let mut deepest_child: Option<usize> = None;

        for child in self.graph.neighbors(node) {
            let child = &self.graph[child];
            for (union, kind) in unions.iter_mut().zip(AttributeKind::ALL) {
                union.extend(child.attribute(kind).iter().cloned());
            }

            descendants.insert(child.glottocode.clone(), -1);
            for (glottocode, distance) in &child.descendants {
                descendants.insert(glottocode.clone(), distance - 1);
            }

            if let Some(coordinates) = child.coordinates {
                child_coordinates.push(coordinates);
            }

            let depth = child.subtree_depth.unwrap_or(0);
            deepest_child = Some(deepest_child.map_or(depth, |d| d.max(depth)));
        }

        let languoid = &mut self.graph[node];
        for (mut union, kind) in unions.into_iter().zip(AttributeKind::ALL) {
            languoid.attribute_mut(kind).append(&mut union);
        }
        languoid.descendants = descendants;
        if languoid.coordinates.is_none() {
            languoid.coordinates = geodesic_centroid(&child_coordinates);
        }
        languoid.subtree_depth = Some(deepest_child.map_or(0, |d| d + 1));
    }

    /// Top-down pass.
    pub fn propagate_down(&mut self) -> Result<()> {
        self.advance("propagate_down", PassState::Aggregated, PassState::Resolved)?;

        for &root in &self.roots {
            let mut bfs = Bfs::new(&self.graph, root);
            while let Some(node) = bfs.next(&self.graph) {
                let Some(parent) = self
                    .graph
                    .neighbors_directed(node, Direction::Incoming)
                    .next()
                else {
                    continue;
                };

                let (parent, languoid) = self.graph.index_twice_mut(parent, node);
                for kind in AttributeKind::ALL {
                    if languoid.attribute(kind).is_empty() {
                        languoid
                            .attribute_mut(kind)
                            .clone_from(parent.attribute(kind));
                    }
                }
                if languoid.coordinates.is_none() {
                    languoid.coordinates = parent.coordinates;
                }
            }
        }

        debug!(families = self.roots.len(), "top-down pass complete");
        Ok(())
    }

    pub fn state(&self) -> PassState {
        self.state
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn get(&self, glottocode: &str) -> Option<&LanguoidNode> {
        self.index.get(glottocode).map(|&ix| &self.graph[ix])
    }

    /// Every record, placed or not.
    pub fn nodes(&self) -> impl Iterator<Item = &LanguoidNode> {
        self.graph.node_weights()
    }

    /// Glottocodes of the tree roots, in forest order.
    pub fn families(&self) -> impl Iterator<Item = &str> {
        self.roots
            .iter()
            .map(|&ix| self.graph[ix].glottocode.as_str())
    }

    /// Direct children in tree order.
    pub fn children(&self, glottocode: &str) -> Vec<&str> {
        let Some(&ix) = self.index.get(glottocode) else {
            return Vec::new();
        };
        // petgraph walks edges newest first
        let mut children: Vec<&str> = self
            .graph
            .neighbors(ix)
            .map(|c| self.graph[c].glottocode.as_str())
            .collect();
        children.reverse();
        children
    }

    /// Hierarchy fields of every placed languoid.
    pub fn hierarchy_records(&self) -> impl Iterator<Item = HierarchyRecord> + '_ {
        self.graph.node_weights().filter_map(|n| {
            Some(HierarchyRecord {
                glottocode: n.glottocode.clone(),
                parent_id: n.parent_id.clone(),
                family_id: n.family_id.clone()?,
                depth: n.depth?,
                subtree_depth: n.subtree_depth?,
                ancestors: n.ancestors.clone(),
                descendants: n.descendants.clone(),
            })
        })
    }

    /// Signed distances to every ancestor (positive) and descendant (negative).
    pub fn path_records(&self) -> impl Iterator<Item = PathRecord> + '_ {
        self.graph.node_weights().flat_map(|n| {
            let up = n.ancestors.iter().rev().enumerate().map(|(i, a)| PathRecord {
                glottocode: n.glottocode.clone(),
                relative: a.clone(),
                distance: i as i32 + 1,
            });
            let down = n.descendants.iter().map(|(d, &distance)| PathRecord {
                glottocode: n.glottocode.clone(),
                relative: d.clone(),
                distance,
            });
            up.chain(down)
        })
    }

    /// `(glottocode, value)` for one attribute set across all records.
    pub fn attribute_pairs(&self, kind: AttributeKind) -> impl Iterator<Item = (&str, &str)> {
        self.graph.node_weights().flat_map(move |n| {
            n.attribute(kind)
                .iter()
                .map(move |v| (n.glottocode.as_str(), v.as_str()))
        })
    }

    pub fn into_nodes(self) -> Vec<LanguoidNode> {
        let (nodes, _) = self.graph.into_nodes_edges();
        nodes.into_iter().map(|n| n.weight).collect()
    }
}

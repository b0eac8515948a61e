//! Venuegraph: weighted multi-relational graph of typed entities
//!
//! Nodes are string identifiers carrying boolean role tags (`paper`,
//! `venue`, `level_3`, ...). Edges are directed, keyed, and carry one or
//! more numeric weight attributes, one per relation name.
//!
//! ```text
//! counts ──add_entities──▶ A ──R1──▶ B
//!                                     │
//!                          B ──R2──▶ C
//!                                     │
//!                infer_layer: A ──new──▶ C   (top max_links by score)
//! ```
//!
//! Layout follows a columnar, interned design:
//! - node names, roles and relation names are interned ([`StrId`])
//! - role membership is indexed with roaring bitmaps
//! - edges are indexed by `(node, relation)` in both directions
//!
//! Persistence is a node-link JSON document ([`document`]).

use ahash::AHashMap;
use roaring::RoaringBitmap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub mod document;
pub mod error;
pub mod inference;
pub mod interner;
pub mod stats;

pub use document::{GraphDocument, LinkRecord, NodeRecord};
pub use error::{GraphError, Result};
pub use inference::{InferenceReport, LayerSpec, DEFAULT_RELATIONSHIP};
pub use interner::{StrId, StringInterner};
pub use stats::{Coverage, DegreeBin};

/// `source -> (target -> count)` for one relation.
pub type RelationMap = BTreeMap<String, BTreeMap<String, f64>>;

// ============================================================================
// Edge Keys
// ============================================================================

/// Key distinguishing parallel edges between the same ordered pair.
///
/// Edges written by this crate are keyed by relation name. Documents written
/// elsewhere may use integer keys; both kinds round-trip with their JSON type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EdgeKey {
    Index(i64),
    Name(String),
}

impl EdgeKey {
    pub fn name(name: impl Into<String>) -> Self {
        EdgeKey::Name(name.into())
    }
}

impl Default for EdgeKey {
    fn default() -> Self {
        EdgeKey::Index(0)
    }
}

impl fmt::Display for EdgeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EdgeKey::Index(i) => write!(f, "{i}"),
            EdgeKey::Name(s) => f.write_str(s),
        }
    }
}

// ============================================================================
// Node Storage (Columnar)
// ============================================================================

/// Node columns: name, ordered role tags, and a bitmap per role.
#[derive(Debug, Default, Clone)]
struct NodeStore {
    /// node_id -> name
    names: Vec<StrId>,
    /// name -> node_id
    by_name: AHashMap<StrId, u32>,
    /// node_id -> (role, value) in tagging order
    roles: Vec<Vec<(StrId, bool)>>,
    /// role -> nodes whose tag is `true`
    role_index: AHashMap<StrId, RoaringBitmap>,
}

impl NodeStore {
    fn len(&self) -> usize {
        self.names.len()
    }

    fn get(&self, name: StrId) -> Option<u32> {
        self.by_name.get(&name).copied()
    }

    fn ensure(&mut self, name: StrId) -> u32 {
        if let Some(id) = self.get(name) {
            return id;
        }
        let id = self.names.len() as u32;
        self.names.push(name);
        self.roles.push(Vec::new());
        self.by_name.insert(name, id);
        id
    }

    /// Set a role tag. Tags are only ever added or overwritten, never removed.
    fn set_role(&mut self, node: u32, role: StrId, value: bool) {
        let roles = &mut self.roles[node as usize];
        match roles.iter_mut().find(|(r, _)| *r == role) {
            Some(slot) => slot.1 = value,
            None => roles.push((role, value)),
        }

        let bitmap = self.role_index.entry(role).or_default();
        if value {
            bitmap.insert(node);
        } else {
            bitmap.remove(node);
        }
    }

    fn has_role(&self, node: u32, role: Option<StrId>) -> bool {
        role.and_then(|r| self.role_index.get(&r))
            .is_some_and(|bitmap| bitmap.contains(node))
    }

    fn with_role(&self, role: Option<StrId>) -> RoaringBitmap {
        role.and_then(|r| self.role_index.get(&r))
            .cloned()
            .unwrap_or_default()
    }
}

// ============================================================================
// Edge Storage (Edge-List with Indexes)
// ============================================================================

#[derive(Debug, Clone)]
struct Edge {
    source: u32,
    target: u32,
    key: EdgeKey,
    /// (relation, weight) in insertion order
    weights: Vec<(StrId, f64)>,
}

impl Edge {
    fn weight(&self, relation: StrId) -> Option<f64> {
        self.weights
            .iter()
            .find(|(r, _)| *r == relation)
            .map(|(_, w)| *w)
    }
}

#[derive(Debug, Default, Clone)]
struct EdgeStore {
    edges: Vec<Edge>,
    /// (source, target, key) -> edge_id
    key_index: AHashMap<(u32, u32, EdgeKey), u32>,
    /// (source, relation) -> edge IDs carrying that weight
    forward_index: AHashMap<(u32, StrId), Vec<u32>>,
    /// (target, relation) -> edge IDs carrying that weight
    backward_index: AHashMap<(u32, StrId), Vec<u32>>,
}

impl EdgeStore {
    fn len(&self) -> usize {
        self.edges.len()
    }

    fn ensure(&mut self, source: u32, target: u32, key: EdgeKey) -> u32 {
        if let Some(&id) = self.key_index.get(&(source, target, key.clone())) {
            return id;
        }
        let id = self.edges.len() as u32;
        self.key_index.insert((source, target, key.clone()), id);
        self.edges.push(Edge {
            source,
            target,
            key,
            weights: Vec::new(),
        });
        id
    }

    /// Set one weight attribute, overwriting any previous value.
    fn set_weight(&mut self, edge_id: u32, relation: StrId, weight: f64) {
        let edge = &mut self.edges[edge_id as usize];
        if let Some(slot) = edge.weights.iter_mut().find(|(r, _)| *r == relation) {
            slot.1 = weight;
            return;
        }
        edge.weights.push((relation, weight));
        let (source, target) = (edge.source, edge.target);

        self.forward_index
            .entry((source, relation))
            .or_default()
            .push(edge_id);
        self.backward_index
            .entry((target, relation))
            .or_default()
            .push(edge_id);
    }

    /// `(target, weight)` for every outgoing edge carrying `relation`, in the
    /// order the weights were first written.
    fn outgoing(&self, source: u32, relation: StrId) -> impl Iterator<Item = (u32, f64)> + '_ {
        self.forward_index
            .get(&(source, relation))
            .into_iter()
            .flatten()
            .filter_map(move |&id| {
                let edge = &self.edges[id as usize];
                edge.weight(relation).map(|w| (edge.target, w))
            })
    }

    fn incoming(&self, target: u32, relation: StrId) -> impl Iterator<Item = (u32, f64)> + '_ {
        self.backward_index
            .get(&(target, relation))
            .into_iter()
            .flatten()
            .filter_map(move |&id| {
                let edge = &self.edges[id as usize];
                edge.weight(relation).map(|w| (edge.source, w))
            })
    }
}

// ============================================================================
// Graph
// ============================================================================

/// Borrowed view of a node.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeView<'g> {
    pub id: &'g str,
    pub roles: Vec<(&'g str, bool)>,
}

/// Borrowed view of an edge.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeView<'g> {
    pub source: &'g str,
    pub target: &'g str,
    pub key: &'g EdgeKey,
    pub weights: Vec<(&'g str, f64)>,
}

/// Directed multigraph with role-tagged nodes and weighted, keyed edges.
///
/// Nodes and edges are never removed. Iteration follows creation order.
#[derive(Debug, Default, Clone)]
pub struct VenueGraph {
    strings: StringInterner,
    nodes: NodeStore,
    edges: EdgeStore,
    /// Graph-level attributes carried through save/load untouched.
    attributes: serde_json::Map<String, serde_json::Value>,
}

/// A weight counts as present when the attribute exists and is positive.
fn present(weight: f64) -> bool {
    weight > 0.0
}

/// Node record fields; a role with one of these names could not be saved.
const RESERVED_ROLES: [&str; 1] = ["id"];
/// Link record fields; a relation with one of these names could not be saved.
const RESERVED_RELATIONS: [&str; 3] = ["source", "target", "key"];

fn check_role(role: &str) -> Result<()> {
    if RESERVED_ROLES.contains(&role) {
        return Err(GraphError::InvalidArgument(format!(
            "`{role}` is reserved and cannot be used as a role"
        )));
    }
    Ok(())
}

pub(crate) fn check_relation(relation: &str) -> Result<()> {
    if RESERVED_RELATIONS.contains(&relation) {
        return Err(GraphError::InvalidArgument(format!(
            "`{relation}` is reserved and cannot be used as a relation"
        )));
    }
    Ok(())
}

impl VenueGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn contains_node(&self, name: &str) -> bool {
        self.node_id(name).is_some()
    }

    /// Graph-level attributes.
    pub fn attributes(&self) -> &serde_json::Map<String, serde_json::Value> {
        &self.attributes
    }

    fn node_id(&self, name: &str) -> Option<u32> {
        self.nodes.get(self.strings.id_of(name)?)
    }

    fn node_name(&self, node: u32) -> &str {
        self.strings.resolve(self.nodes.names[node as usize])
    }

    pub(crate) fn ensure_node(&mut self, name: &str) -> u32 {
        let name = self.strings.intern(name);
        self.nodes.ensure(name)
    }

    pub(crate) fn tag(&mut self, node: u32, role: &str, value: bool) {
        let role = self.strings.intern(role);
        self.nodes.set_role(node, role, value);
    }

    /// Write `relation = weight` on the edge `(source, target, key)`,
    /// creating the edge if needed.
    pub(crate) fn write_weight(
        &mut self,
        source: u32,
        target: u32,
        key: EdgeKey,
        relation: StrId,
        weight: f64,
    ) {
        let edge_id = self.edges.ensure(source, target, key);
        self.edges.set_weight(edge_id, relation, weight);
    }

    /// Role tags of a node in tagging order, or `None` for unknown nodes.
    pub fn roles(&self, name: &str) -> Option<Vec<(&str, bool)>> {
        let node = self.node_id(name)?;
        Some(
            self.nodes.roles[node as usize]
                .iter()
                .map(|&(role, value)| (self.strings.resolve(role), value))
                .collect(),
        )
    }

    pub fn has_role(&self, name: &str, role: &str) -> bool {
        match self.node_id(name) {
            Some(node) => self.nodes.has_role(node, self.strings.id_of(role)),
            None => false,
        }
    }

    /// Nodes tagged `role = true`, in creation order.
    pub fn nodes_with_role(&self, role: &str) -> Vec<&str> {
        self.nodes
            .with_role(self.strings.id_of(role))
            .iter()
            .map(|node| self.node_name(node))
            .collect()
    }

    /// The `relation` weight from `source` to `target`, taken from the first
    /// edge between the pair that carries it.
    pub fn weight(&self, source: &str, target: &str, relation: &str) -> Option<f64> {
        let (source, target) = (self.node_id(source)?, self.node_id(target)?);
        let relation = self.strings.id_of(relation)?;
        self.edges
            .outgoing(source, relation)
            .find(|&(t, _)| t == target)
            .map(|(_, w)| w)
    }

    /// Successors reachable over a positive `relation` weight whose target is
    /// tagged `role`, with their weights, in the order they were written.
    pub fn outgoing(&self, name: &str, relation: &str, role: &str) -> Vec<(&str, f64)> {
        let (Some(node), Some(relation)) = (self.node_id(name), self.strings.id_of(relation))
        else {
            return Vec::new();
        };
        let role = self.strings.id_of(role);
        self.edges
            .outgoing(node, relation)
            .filter(|&(t, w)| present(w) && self.nodes.has_role(t, role))
            .map(|(t, w)| (self.node_name(t), w))
            .collect()
    }

    /// Predecessors over a positive `relation` weight whose source is tagged
    /// `role`.
    pub fn incoming(&self, name: &str, relation: &str, role: &str) -> Vec<(&str, f64)> {
        let (Some(node), Some(relation)) = (self.node_id(name), self.strings.id_of(relation))
        else {
            return Vec::new();
        };
        let role = self.strings.id_of(role);
        self.edges
            .incoming(node, relation)
            .filter(|&(s, w)| present(w) && self.nodes.has_role(s, role))
            .map(|(s, w)| (self.node_name(s), w))
            .collect()
    }

    pub fn nodes(&self) -> impl Iterator<Item = NodeView<'_>> + '_ {
        (0..self.nodes.len() as u32).map(move |node| NodeView {
            id: self.node_name(node),
            roles: self.nodes.roles[node as usize]
                .iter()
                .map(|&(role, value)| (self.strings.resolve(role), value))
                .collect(),
        })
    }

    pub fn edges(&self) -> impl Iterator<Item = EdgeView<'_>> + '_ {
        self.edges.edges.iter().map(move |edge| EdgeView {
            source: self.node_name(edge.source),
            target: self.node_name(edge.target),
            key: &edge.key,
            weights: edge
                .weights
                .iter()
                .map(|&(relation, w)| (self.strings.resolve(relation), w))
                .collect(),
        })
    }

    // ------------------------------------------------------------------------
    // Ingestion
    // ------------------------------------------------------------------------

    /// Add one relation from counts.
    ///
    /// Every non-empty source key is tagged `from_role`, every non-empty
    /// target key `to_role`. Each source's counts are normalized to sum to
    /// one, and an edge keyed `relation` carrying `relation = weight` is
    /// written for each target whose normalized weight is at least `cutoff`.
    /// Existing weights for the same edge are overwritten.
    ///
    /// Counts must be finite and non-negative, and each source's total must
    /// be finite; the map is validated before anything is written. A source
    /// whose counts sum to zero gets its role tag but no edges. `id` is not a
    /// valid role and `source`, `target` or `key` not a valid relation.
    pub fn add_entities(
        &mut self,
        from_role: &str,
        to_role: &str,
        relation: &str,
        relation_map: &RelationMap,
        cutoff: f64,
    ) -> Result<()> {
        if cutoff.is_nan() {
            return Err(GraphError::InvalidArgument(format!(
                "cutoff for relation `{relation}` is NaN"
            )));
        }
        check_role(from_role)?;
        check_role(to_role)?;
        check_relation(relation)?;
        validate_counts(relation, relation_map)?;

        for source in relation_map.keys().filter(|s| !s.is_empty()) {
            let node = self.ensure_node(source);
            self.tag(node, from_role, true);
        }
        for target in relation_map
            .values()
            .flat_map(|counts| counts.keys())
            .filter(|t| !t.is_empty())
        {
            let node = self.ensure_node(target);
            self.tag(node, to_role, true);
        }

        let relation_id = self.strings.intern(relation);
        let mut written = 0usize;
        for (source, counts) in relation_map.iter().filter(|(s, _)| !s.is_empty()) {
            let total: f64 = counts.values().sum();
            if total <= 0.0 {
                continue;
            }
            let source = self.ensure_node(source);
            for (target, count) in counts.iter().filter(|(t, _)| !t.is_empty()) {
                let weight = count / total;
                if weight < cutoff {
                    continue;
                }
                let target = self.ensure_node(target);
                self.write_weight(source, target, EdgeKey::name(relation), relation_id, weight);
                written += 1;
            }
        }

        tracing::debug!(
            relation,
            sources = relation_map.len(),
            edges = written,
            "added relation"
        );
        Ok(())
    }
}

fn validate_counts(relation: &str, relation_map: &RelationMap) -> Result<()> {
    for (source, counts) in relation_map {
        let mut total = 0.0;
        for (target, &count) in counts {
            total += count;
            let value = if !count.is_finite() || count < 0.0 {
                count
            } else if !total.is_finite() {
                // Finite counts can still sum past f64::MAX.
                total
            } else {
                continue;
            };
            return Err(GraphError::MalformedInput {
                relation: relation.to_string(),
                source_key: source.clone(),
                target_key: target.clone(),
                value,
            });
        }
    }
    Ok(())
}

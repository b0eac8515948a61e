//! Layer inference: derive `A -> C` edges from `A -> B -> C` paths.
//!
//! For each node `a` tagged with the first role of the entity chain:
//!
//! ```text
//! score(a, c) = Σ_b  w1(a, b) · w2(b, c) / Σ_c' w2(b, c')
//! ```
//!
//! where `b` ranges over neighbours reached by the first relation with
//! `w1 >= filters[0]` and tagged with the second role, and `c`, `c'` over
//! neighbours of `b` reached by the second relation with `w2 >= filters[1]`
//! and tagged with the third role. The `max_links` best-scoring `c` are
//! linked from `a`.
//!
//! All scores are computed before any edge is written, so a pass never sees
//! its own output.

use ahash::AHashMap;

use crate::error::{GraphError, Result};
use crate::{check_relation, present, EdgeKey, StrId, VenueGraph};

/// Output relation placeholder: inferred edges reuse the second relation's
/// name.
pub const DEFAULT_RELATIONSHIP: &str = "default";

const PROGRESS_EVERY: usize = 10_000;

/// Parameters of one [`VenueGraph::infer_layer`] pass.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerSpec {
    /// Roles `[A, B, C]`.
    pub entity_chain: [String; 3],
    /// Relations `[A -> B, B -> C]`.
    pub relationship_chain: [String; 2],
    /// Recompute nodes that already reach a `C` node over the second relation.
    pub overwrite: bool,
    pub max_links: usize,
    /// Minimum weight per hop.
    pub filters: [f64; 2],
    /// Relation written for inferred edges. [`DEFAULT_RELATIONSHIP`] or an
    /// empty name reuses the second relation.
    pub new_relationship: String,
}

impl LayerSpec {
    pub fn new(entity_chain: [&str; 3], relationship_chain: [&str; 2]) -> Self {
        Self {
            entity_chain: entity_chain.map(str::to_string),
            relationship_chain: relationship_chain.map(str::to_string),
            overwrite: false,
            max_links: 2,
            filters: [0.0, 0.0],
            new_relationship: DEFAULT_RELATIONSHIP.to_string(),
        }
    }

    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn max_links(mut self, max_links: usize) -> Self {
        self.max_links = max_links;
        self
    }

    pub fn filters(mut self, filters: [f64; 2]) -> Self {
        self.filters = filters;
        self
    }

    pub fn new_relationship(mut self, relation: impl Into<String>) -> Self {
        self.new_relationship = relation.into();
        self
    }

    pub fn output_relation(&self) -> &str {
        if self.new_relationship.is_empty() || self.new_relationship == DEFAULT_RELATIONSHIP {
            &self.relationship_chain[1]
        } else {
            &self.new_relationship
        }
    }
}

/// Counters from one inference pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InferenceReport {
    /// Nodes tagged with the first role.
    pub examined: usize,
    /// Skipped because they already reach a `C` node (only without overwrite).
    pub already_resolved: usize,
    /// Nodes for which no candidate scored.
    pub no_candidates: usize,
    pub edges_written: usize,
}

/// Interned view of a [`LayerSpec`]. Names never seen by the graph stay
/// `None` and match nothing.
struct Chain {
    roles: [Option<StrId>; 3],
    relations: [Option<StrId>; 2],
}

impl VenueGraph {
    /// Run one inference pass and write the resulting edges.
    ///
    /// Each inferred edge is keyed and weighted by the output relation; a
    /// previous value on the same edge is overwritten. With `overwrite` off,
    /// nodes that already have a second-relation edge to a `C` node are left
    /// alone.
    pub fn infer_layer(&mut self, spec: &LayerSpec) -> Result<InferenceReport> {
        if spec.filters.iter().any(|f| f.is_nan()) {
            return Err(GraphError::InvalidArgument(
                "layer filters must be numbers".to_string(),
            ));
        }
        let output = spec.output_relation();
        check_relation(output)?;

        let chain = Chain {
            roles: spec.entity_chain.each_ref().map(|r| self.strings.id_of(r)),
            relations: spec
                .relationship_chain
                .each_ref()
                .map(|r| self.strings.id_of(r)),
        };

        let mut report = InferenceReport::default();
        let mut pending: Vec<(u32, Vec<(u32, f64)>)> = Vec::new();
        let starts = self.nodes.with_role(chain.roles[0]);

        for node in &starts {
            if report.examined > 0 && report.examined % PROGRESS_EVERY == 0 {
                tracing::debug!(
                    processed = report.examined,
                    total = starts.len(),
                    "inferring layer"
                );
            }
            report.examined += 1;

            if !spec.overwrite && self.is_resolved(node, &chain) {
                report.already_resolved += 1;
                continue;
            }

            let mut scores = self.transitive_scores(node, &chain, spec)?;
            if scores.is_empty() {
                report.no_candidates += 1;
                continue;
            }
            // Stable: equal scores keep the order candidates were reached in.
            scores.sort_by(|a, b| b.1.total_cmp(&a.1));
            scores.truncate(spec.max_links);
            pending.push((node, scores));
        }

        let relation = self.strings.intern(output);
        for (node, targets) in pending {
            for (target, score) in targets {
                self.write_weight(node, target, EdgeKey::name(output), relation, score);
                report.edges_written += 1;
            }
        }

        tracing::info!(
            relation = output,
            examined = report.examined,
            skipped = report.already_resolved,
            unresolved = report.no_candidates,
            edges = report.edges_written,
            "inferred layer"
        );
        Ok(report)
    }

    /// Whether `node` already has a positive second-relation edge to a node
    /// tagged with the third role.
    fn is_resolved(&self, node: u32, chain: &Chain) -> bool {
        let Some(relation) = chain.relations[1] else {
            return false;
        };
        self.edges
            .outgoing(node, relation)
            .any(|(target, w)| present(w) && self.nodes.has_role(target, chain.roles[2]))
    }

    /// Candidate scores in the order candidates were first reached.
    ///
    /// Fails if a hop total or a score is not finite, which only happens
    /// when stored weights are near `f64::MAX`.
    fn transitive_scores(
        &self,
        node: u32,
        chain: &Chain,
        spec: &LayerSpec,
    ) -> Result<Vec<(u32, f64)>> {
        let (Some(first), Some(second)) = (chain.relations[0], chain.relations[1]) else {
            return Ok(Vec::new());
        };
        let filters = spec.filters;

        let mut scores: Vec<(u32, f64)> = Vec::new();
        let mut slots: AHashMap<u32, usize> = AHashMap::new();

        for (middle, w1) in self.edges.outgoing(node, first) {
            if !present(w1) || w1 < filters[0] || !self.nodes.has_role(middle, chain.roles[1]) {
                continue;
            }

            let hops: Vec<(u32, f64)> = self
                .edges
                .outgoing(middle, second)
                .filter(|&(target, w2)| {
                    present(w2) && w2 >= filters[1] && self.nodes.has_role(target, chain.roles[2])
                })
                .collect();
            let total: f64 = hops.iter().map(|(_, w2)| w2).sum();
            if !total.is_finite() {
                return Err(self.overflow(&spec.relationship_chain[1], middle, hops[0].0));
            }
            if total <= 0.0 {
                continue;
            }

            for (target, w2) in hops {
                let contribution = w1 * (w2 / total);
                match slots.get(&target) {
                    Some(&slot) => scores[slot].1 += contribution,
                    None => {
                        slots.insert(target, scores.len());
                        scores.push((target, contribution));
                    }
                }
            }
        }

        if let Some(&(target, _)) = scores.iter().find(|(_, score)| !score.is_finite()) {
            return Err(self.overflow(spec.output_relation(), node, target));
        }
        Ok(scores)
    }

    fn overflow(&self, relation: &str, source: u32, target: u32) -> GraphError {
        GraphError::WeightOverflow {
            relation: relation.to_string(),
            source_key: self.node_name(source).to_string(),
            target_key: self.node_name(target).to_string(),
        }
    }
}

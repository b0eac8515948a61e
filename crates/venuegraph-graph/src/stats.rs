//! Annotation coverage and degree distribution.

use crate::error::{GraphError, Result};
use crate::{present, VenueGraph};

/// How many nodes of a role carry at least one positive edge of a relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Coverage {
    pub covered: usize,
    pub total: usize,
}

impl Coverage {
    /// `covered / total`, or 0 when the role has no nodes.
    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.covered as f64 / self.total as f64
        }
    }
}

/// One histogram bin: `[lower, upper)`, the last bin closed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DegreeBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

impl VenueGraph {
    /// Share of `role` nodes with an outgoing positive `relation` weight.
    pub fn annotation_coverage(&self, relation: &str, role: &str) -> Coverage {
        let nodes = self.nodes.with_role(self.strings.id_of(role));
        let total = nodes.len() as usize;
        let Some(relation) = self.strings.id_of(relation) else {
            return Coverage { covered: 0, total };
        };

        let covered = nodes
            .iter()
            .filter(|&node| self.edges.outgoing(node, relation).any(|(_, w)| present(w)))
            .count();
        Coverage { covered, total }
    }

    /// Total degree (in + out, parallel edges counted separately) per node,
    /// in node-creation order.
    pub fn degrees(&self) -> Vec<usize> {
        let mut degrees = vec![0usize; self.node_count()];
        for edge in &self.edges.edges {
            degrees[edge.source as usize] += 1;
            degrees[edge.target as usize] += 1;
        }
        degrees
    }

    /// Histogram of total degrees over `nbins` equal-width bins spanning
    /// `[min, max]`. When every degree is equal the range is widened by half
    /// a unit on each side. An empty graph yields no bins.
    pub fn degree_distribution(&self, nbins: usize) -> Result<Vec<DegreeBin>> {
        if nbins == 0 {
            return Err(GraphError::InvalidArgument(
                "degree distribution needs at least one bin".to_string(),
            ));
        }

        let degrees = self.degrees();
        let (Some(&min), Some(&max)) = (degrees.iter().min(), degrees.iter().max()) else {
            return Ok(Vec::new());
        };

        let (lo, hi) = if min == max {
            (min as f64 - 0.5, max as f64 + 0.5)
        } else {
            (min as f64, max as f64)
        };
        let width = (hi - lo) / nbins as f64;

        let mut bins: Vec<DegreeBin> = (0..nbins)
            .map(|i| DegreeBin {
                lower: lo + width * i as f64,
                upper: if i + 1 == nbins {
                    hi
                } else {
                    lo + width * (i + 1) as f64
                },
                count: 0,
            })
            .collect();

        for degree in degrees {
            let slot = ((degree as f64 - lo) / width).floor() as usize;
            bins[slot.min(nbins - 1)].count += 1;
        }
        Ok(bins)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RelationMap;

    fn counts(entries: &[(&str, &str, f64)]) -> RelationMap {
        let mut map = RelationMap::new();
        for (source, target, count) in entries {
            map.entry(source.to_string())
                .or_default()
                .insert(target.to_string(), *count);
        }
        map
    }

    #[test]
    fn coverage_counts_nodes_with_positive_edges() {
        let mut graph = VenueGraph::new();
        graph
            .add_entities(
                "paper",
                "venue",
                "published_in",
                &counts(&[("p1", "v1", 1.0), ("p2", "v1", 2.0)]),
                0.0,
            )
            .unwrap();
        graph
            .add_entities("paper", "paper", "cites", &counts(&[("p3", "p1", 1.0)]), 0.0)
            .unwrap();

        let coverage = graph.annotation_coverage("published_in", "paper");
        assert_eq!(coverage, Coverage { covered: 2, total: 3 });
        assert!((coverage.ratio() - 2.0 / 3.0).abs() < 1e-12);

        let none = graph.annotation_coverage("published_in", "author");
        assert_eq!(none.total, 0);
        assert_eq!(none.ratio(), 0.0);
    }

    #[test]
    fn degree_histogram() {
        let mut graph = VenueGraph::new();
        graph
            .add_entities(
                "paper",
                "venue",
                "published_in",
                &counts(&[("p1", "v1", 1.0), ("p2", "v1", 1.0), ("p3", "v1", 1.0)]),
                0.0,
            )
            .unwrap();

        // p1, p2, p3 have degree 1; v1 has degree 3.
        let bins = graph.degree_distribution(2).unwrap();
        assert_eq!(bins.len(), 2);
        assert_eq!(bins[0].count, 3);
        assert_eq!(bins[1].count, 1);
        assert_eq!(bins[0].lower, 1.0);
        assert_eq!(bins[1].upper, 3.0);
    }

    #[test]
    fn degree_histogram_edge_cases() {
        let graph = VenueGraph::new();
        assert!(graph.degree_distribution(4).unwrap().is_empty());
        assert!(matches!(
            graph.degree_distribution(0),
            Err(GraphError::InvalidArgument(_))
        ));

        let mut graph = VenueGraph::new();
        graph
            .add_entities("paper", "venue", "in", &counts(&[("p", "v", 1.0)]), 0.0)
            .unwrap();
        let bins = graph.degree_distribution(3).unwrap();
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 2);
    }
}

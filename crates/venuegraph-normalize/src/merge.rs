//! Collapse near-duplicate venue keys using learned abbreviations.

use std::collections::BTreeMap;

use crate::cache::AbbreviationCache;
use crate::normalizer::VenueNormalizer;

/// `venue -> neighbor -> weight`, as produced by upstream counting jobs.
pub type WeightMapping = BTreeMap<String, BTreeMap<String, f64>>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergeOutcome {
    pub weights: WeightMapping,
    /// Number of keys folded into their abbreviation.
    pub merged: usize,
}

/// Fold every key that has a cached abbreviation into the entry keyed by
/// that abbreviation, summing weights of shared neighbors.
///
/// Keys that map to themselves are left in place.
pub fn merge_abbreviated_keys(cache: &AbbreviationCache, mut weights: WeightMapping) -> MergeOutcome {
    let keys: Vec<String> = weights.keys().cloned().collect();
    let mut merged = 0;

    for key in keys {
        let Some(target) = cache.get(&key) else {
            continue;
        };
        if target == key {
            continue;
        }
        let Some(neighbors) = weights.remove(&key) else {
            continue;
        };

        merged += 1;
        let slot = weights.entry(target).or_default();
        for (neighbor, weight) in neighbors {
            *slot.entry(neighbor).or_insert(0.0) += weight;
        }
    }

    tracing::info!(merged, "postprocessing merged keys");
    MergeOutcome { weights, merged }
}

impl VenueNormalizer {
    /// Merge keys of `weights` through this normalizer's abbreviation cache.
    pub fn postprocess(&self, weights: WeightMapping) -> MergeOutcome {
        merge_abbreviated_keys(self.cache(), weights)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping(entries: Vec<(&str, Vec<(&str, f64)>)>) -> WeightMapping {
        entries
            .into_iter()
            .map(|(k, v)| {
                (
                    k.to_string(),
                    v.into_iter().map(|(n, w)| (n.to_string(), w)).collect(),
                )
            })
            .collect()
    }

    #[test]
    fn full_name_merges_into_abbreviation() {
        let cache = AbbreviationCache::from_mapping([(
            "international conference on machine learning".to_string(),
            "icml".to_string(),
        )]);
        let out = merge_abbreviated_keys(
            &cache,
            mapping(vec![
                ("icml", vec![("a", 1.0)]),
                ("international conference on machine learning", vec![("b", 2.0)]),
            ]),
        );
        assert_eq!(out.merged, 1);
        assert_eq!(out.weights, mapping(vec![("icml", vec![("a", 1.0), ("b", 2.0)])]));
    }

    #[test]
    fn shared_neighbors_are_summed() {
        let cache = AbbreviationCache::from_mapping([("very large data bases".to_string(), "vldb".to_string())]);
        let out = merge_abbreviated_keys(
            &cache,
            mapping(vec![
                ("vldb", vec![("db", 1.5)]),
                ("very large data bases", vec![("db", 2.0), ("ir", 1.0)]),
            ]),
        );
        assert_eq!(out.weights, mapping(vec![("vldb", vec![("db", 3.5), ("ir", 1.0)])]));
    }

    #[test]
    fn abbreviation_entry_is_created_when_missing() {
        let cache = AbbreviationCache::from_mapping([("very large data bases".to_string(), "vldb".to_string())]);
        let out = merge_abbreviated_keys(
            &cache,
            mapping(vec![("very large data bases", vec![("db", 2.0)])]),
        );
        assert_eq!(out.weights, mapping(vec![("vldb", vec![("db", 2.0)])]));
    }

    #[test]
    fn unknown_and_self_mapped_keys_stay() {
        let cache = AbbreviationCache::from_mapping([("kdd".to_string(), "kdd".to_string())]);
        let input = mapping(vec![("kdd", vec![("dm", 1.0)]), ("other venue", vec![("x", 1.0)])]);
        let out = merge_abbreviated_keys(&cache, input.clone());
        assert_eq!(out.merged, 0);
        assert_eq!(out.weights, input);
    }
}

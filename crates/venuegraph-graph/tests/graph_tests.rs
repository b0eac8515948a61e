//! Graph Store E2E Tests

use approx::assert_relative_eq;
use std::fs;
use tempfile::tempdir;
use venuegraph_graph::*;

fn counts(entries: &[(&str, &str, f64)]) -> RelationMap {
    let mut map = RelationMap::new();
    for (source, target, count) in entries {
        map.entry(source.to_string())
            .or_default()
            .insert(target.to_string(), *count);
    }
    map
}

fn sample_graph() -> VenueGraph {
    let mut graph = VenueGraph::new();
    graph
        .add_entities(
            "paper",
            "venue",
            "published_in",
            &counts(&[("p1", "icml", 2.0), ("p1", "nips", 1.0), ("p2", "acl", 1.0)]),
            0.0,
        )
        .unwrap();
    graph
        .add_entities(
            "venue",
            "level_3",
            "in_field",
            &counts(&[("icml", "ml", 1.0), ("nips", "ml", 1.0), ("acl", "nlp", 1.0)]),
            0.0,
        )
        .unwrap();
    graph
}

// ============================================================================
// Persistence
// ============================================================================

#[test]
fn test_save_and_load_preserve_structure() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("graph.json");

    let mut graph = sample_graph();
    graph
        .infer_layer(
            &LayerSpec::new(["paper", "venue", "level_3"], ["published_in", "in_field"])
                .new_relationship("in_field"),
        )
        .unwrap();
    graph.save(&path).unwrap();

    let restored = VenueGraph::read(&path).unwrap();
    assert_eq!(restored.node_count(), graph.node_count());
    assert_eq!(restored.edge_count(), graph.edge_count());
    assert_eq!(
        restored.to_document().sorted(),
        graph.to_document().sorted()
    );
    assert_relative_eq!(restored.weight("p1", "ml", "in_field").unwrap(), 1.0);
}

#[test]
fn test_saved_file_is_node_link_json() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("graph.json");
    sample_graph().save(&path).unwrap();

    let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(value["directed"], serde_json::json!(true));
    assert_eq!(value["multigraph"], serde_json::json!(true));
    assert_eq!(value["nodes"][0], serde_json::json!({"id": "p1", "paper": true}));
    assert_eq!(value["links"][0]["key"], serde_json::json!("published_in"));
    assert_relative_eq!(
        value["links"][0]["published_in"].as_f64().unwrap(),
        2.0 / 3.0
    );
}

#[test]
fn test_open_missing_file_is_empty() {
    let dir = tempdir().unwrap();
    let graph = VenueGraph::open(&dir.path().join("absent.json")).unwrap();
    assert_eq!(graph.node_count(), 0);
    assert_eq!(graph.edge_count(), 0);

    assert!(matches!(
        VenueGraph::read(&dir.path().join("absent.json")),
        Err(GraphError::Io { .. })
    ));
}

#[test]
fn test_load_replaces_state() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("graph.json");

    let mut small = VenueGraph::new();
    small
        .add_entities("author", "paper", "wrote", &counts(&[("a1", "p9", 1.0)]), 0.0)
        .unwrap();
    small.save(&path).unwrap();

    let mut graph = sample_graph();
    graph.load(&path).unwrap();
    assert!(!graph.contains_node("p1"));
    assert!(graph.has_role("a1", "author"));
    assert_eq!(graph.edge_count(), 1);
}

#[test]
fn test_malformed_document_leaves_graph_untouched() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("broken.json");
    fs::write(&path, r#"{"nodes": [{"id": "x", "paper": 1}], "links": []}"#).unwrap();

    let mut graph = sample_graph();
    let before = graph.to_document();
    let err = graph.load(&path).unwrap_err();
    assert!(matches!(err, GraphError::Json { .. }));
    assert_eq!(graph.to_document(), before);

    fs::write(&path, "not json").unwrap();
    assert!(matches!(
        VenueGraph::open(&path),
        Err(GraphError::Json { .. })
    ));
}

// ============================================================================
// Layering
// ============================================================================

#[test]
fn test_two_layer_inference() {
    let mut graph = sample_graph();
    graph
        .add_entities(
            "level_3",
            "level_2",
            "parent",
            &counts(&[("ml", "cs", 1.0), ("nlp", "cs", 1.0), ("nlp", "ling", 1.0)]),
            0.0,
        )
        .unwrap();

    graph
        .infer_layer(
            &LayerSpec::new(["paper", "venue", "level_3"], ["published_in", "in_field"])
                .new_relationship("in_field"),
        )
        .unwrap();
    let report = graph
        .infer_layer(
            &LayerSpec::new(["paper", "level_3", "level_2"], ["in_field", "parent"])
                .new_relationship("in_area"),
        )
        .unwrap();

    assert_eq!(report.examined, 2);
    assert_eq!(report.edges_written, 3);
    assert_relative_eq!(graph.weight("p1", "cs", "in_area").unwrap(), 1.0);
    assert_relative_eq!(graph.weight("p2", "cs", "in_area").unwrap(), 0.5);
    assert_relative_eq!(graph.weight("p2", "ling", "in_area").unwrap(), 0.5);
}

#[test]
fn test_stats_on_sample_graph() {
    let graph = sample_graph();
    let coverage = graph.annotation_coverage("in_field", "venue");
    assert_eq!(coverage.covered, 3);
    assert_relative_eq!(coverage.ratio(), 1.0);

    let bins = graph.degree_distribution(5).unwrap();
    assert_eq!(bins.len(), 5);
    assert_eq!(
        bins.iter().map(|b| b.count).sum::<usize>(),
        graph.node_count()
    );
}

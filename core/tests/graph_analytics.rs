//! Graph construction and analytics tests: edge aggregation,
//! centralities, communities, cycle enumeration.

use entity_risk_core::analytics::{DefaultAnalytics, GraphAnalytics};
use entity_risk_core::config::AnalysisConfig;
use entity_risk_core::entity_extractor::EntityExtractor;
use entity_risk_core::graph::TransactionGraph;
use entity_risk_core::identifier::IdentifierExtractor;
use entity_risk_core::normalizer::Normalizer;
use serde_json::json;

fn build(records: serde_json::Value) -> TransactionGraph {
    let config = AnalysisConfig::default();
    let records = Normalizer::records_from_value(&records).unwrap();
    let batch = Normalizer::new(&config).normalize(&records);
    let (entities, _) =
        EntityExtractor::new(&config).extract(&batch.transactions, &IdentifierExtractor::default());
    TransactionGraph::build(&entities, &batch.transactions)
}

fn analytics() -> DefaultAnalytics {
    DefaultAnalytics::new(&AnalysisConfig::default())
}

/// Parallel transactions between the same pair aggregate into one edge.
#[test]
fn edges_aggregate_weight_and_count() {
    let graph = build(json!([
        {"sender": "Alpha Inc", "receiver": "Beta Bank", "amount": 100, "date": "2024-01-01", "type": "payment"},
        {"sender": "Alpha Inc", "receiver": "Beta Bank", "amount": 200, "date": "2024-01-02", "type": "invoice"}
    ]));

    assert_eq!(graph.node_count(), 2);
    assert_eq!(graph.edge_count(), 1, "Same ordered pair shares one edge");

    let edge = graph.edge("Alpha Inc", "Beta Bank").unwrap();
    assert_eq!(edge.weight, 300.0);
    assert_eq!(edge.transaction_count, 2);
    assert!(edge.types.contains("payment") && edge.types.contains("invoice"));
}

/// Self-loops never materialize as edges.
#[test]
fn self_loops_are_excluded() {
    let graph = build(json!([
        {"sender": "Alpha Inc", "receiver": "Alpha Inc", "amount": 100, "date": "2024-01-01"}
    ]));

    assert_eq!(graph.node_count(), 1);
    assert_eq!(graph.edge_count(), 0, "A self-payment must not create an edge");
}

/// On the path A -> B -> C the middle node carries all brokerage.
#[test]
fn betweenness_on_a_path() {
    let graph = build(json!([
        {"sender": "Alpha Inc", "receiver": "Middle Corp", "amount": 100, "date": "2024-01-01"},
        {"sender": "Middle Corp", "receiver": "Gamma LLC", "amount": 100, "date": "2024-01-02"}
    ]));
    let profiles = analytics().centralities(&graph);

    let middle = &profiles["Middle Corp"];
    assert!(
        (middle.betweenness - 0.5).abs() < 1e-9,
        "Middle of a 3-node path should have betweenness 0.5, got {}",
        middle.betweenness
    );
    assert!((middle.degree - 1.0).abs() < 1e-9);
    assert!((middle.in_degree - 0.5).abs() < 1e-9);
    assert!((middle.out_degree - 0.5).abs() < 1e-9);
    assert_eq!(profiles["Alpha Inc"].betweenness, 0.0);
}

/// Eigenvector centrality flows along edge direction: the sink of a
/// path ends up the most central node.
#[test]
fn eigenvector_concentrates_on_the_sink() {
    let graph = build(json!([
        {"sender": "Alpha Inc", "receiver": "Middle Corp", "amount": 100, "date": "2024-01-01"},
        {"sender": "Middle Corp", "receiver": "Gamma LLC", "amount": 100, "date": "2024-01-02"}
    ]));
    let profiles = analytics().centralities(&graph);

    assert!(
        profiles["Gamma LLC"].eigenvector > profiles["Alpha Inc"].eigenvector,
        "The receiving end of the flow should out-rank the source"
    );
}

/// A directed triangle yields exactly one simple cycle of length 3.
#[test]
fn triangle_yields_one_cycle() {
    let graph = build(json!([
        {"sender": "Alpha Inc", "receiver": "Beta LLC", "amount": 100, "date": "2024-01-01"},
        {"sender": "Beta LLC", "receiver": "Gamma Corp", "amount": 100, "date": "2024-01-02"},
        {"sender": "Gamma Corp", "receiver": "Alpha Inc", "amount": 100, "date": "2024-01-03"}
    ]));
    let cycles = analytics().simple_cycles(&graph);

    assert_eq!(cycles.len(), 1, "Expected one cycle, got {cycles:?}");
    assert_eq!(cycles[0].len(), 3);
    for name in ["Alpha Inc", "Beta LLC", "Gamma Corp"] {
        assert!(cycles[0].iter().any(|n| n == name), "Cycle should include {name}");
    }
}

/// A mutual pair is a simple cycle of length 2, reported once.
#[test]
fn mutual_pair_is_a_two_cycle() {
    let graph = build(json!([
        {"sender": "Alpha Inc", "receiver": "Beta Bank", "amount": 100, "date": "2024-01-01"},
        {"sender": "Beta Bank", "receiver": "Alpha Inc", "amount": 100, "date": "2024-01-02"}
    ]));
    let cycles = analytics().simple_cycles(&graph);

    assert_eq!(cycles.len(), 1);
    assert_eq!(cycles[0].len(), 2);
}

/// Disconnected clusters land in different communities; every node is
/// assigned one.
#[test]
fn communities_partition_disconnected_clusters() {
    let graph = build(json!([
        {"sender": "Alpha Inc", "receiver": "Beta LLC", "amount": 100, "date": "2024-01-01"},
        {"sender": "Beta LLC", "receiver": "Alpha Inc", "amount": 100, "date": "2024-01-02"},
        {"sender": "Gamma Corp", "receiver": "Delta GmbH", "amount": 100, "date": "2024-01-03"},
        {"sender": "Delta GmbH", "receiver": "Gamma Corp", "amount": 100, "date": "2024-01-04"}
    ]));
    let communities = analytics().communities(&graph);

    assert_eq!(communities.len(), 4);
    assert_eq!(
        communities["Alpha Inc"], communities["Beta LLC"],
        "Connected pair should share a community"
    );
    assert_eq!(communities["Gamma Corp"], communities["Delta GmbH"]);
    assert_ne!(
        communities["Alpha Inc"], communities["Gamma Corp"],
        "Disconnected clusters should not share a community"
    );
}

/// An empty or edgeless graph degrades to zero centralities and
/// community 0 without failing.
#[test]
fn degenerate_graphs_degrade_gracefully() {
    let graph = build(json!([
        {"sender": "Alpha Inc", "receiver": "Alpha Inc", "amount": 100, "date": "2024-01-01"}
    ]));
    let profiles = analytics().centralities(&graph);

    let alpha = &profiles["Alpha Inc"];
    assert_eq!(alpha.degree, 0.0);
    assert_eq!(alpha.betweenness, 0.0);
    assert_eq!(alpha.community_id, 0);
}

//! Relationship inference — turns graph edges into typed relationship
//! records using endpoint entity types and observed transaction types.

use crate::{
    entity_extractor::Entity,
    graph::TransactionGraph,
    types::EntityType,
};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relationship {
    pub source: String,
    pub target: String,
    pub inferred_type: String,
    pub weight: f64,
    pub transaction_count: usize,
    pub description: String,
}

/// One Relationship per directed edge with positive aggregate weight,
/// in deterministic (source, target) order.
pub fn infer_relationships(graph: &TransactionGraph, entities: &[Entity]) -> Vec<Relationship> {
    let types: BTreeMap<&str, EntityType> = entities
        .iter()
        .map(|e| (e.name.as_str(), e.entity_type))
        .collect();

    let mut relationships: Vec<Relationship> = graph
        .graph
        .edge_references()
        .filter(|edge| edge.weight().weight > 0.0)
        .map(|edge| {
            let source = &graph.graph[edge.source()].name;
            let target = &graph.graph[edge.target()].name;
            let source_type = types.get(source.as_str()).copied().unwrap_or(EntityType::Unknown);
            let target_type = types.get(target.as_str()).copied().unwrap_or(EntityType::Unknown);
            let data = edge.weight();
            let inferred = infer_type(source_type, target_type, data.types.iter(), data.transaction_count);
            Relationship {
                source: source.clone(),
                target: target.clone(),
                inferred_type: inferred.to_string(),
                weight: data.weight,
                transaction_count: data.transaction_count,
                description: format!(
                    "{} relationship with {} transactions",
                    capitalize(inferred),
                    data.transaction_count
                ),
            }
        })
        .collect();

    relationships.sort_by(|a, b| (&a.source, &a.target).cmp(&(&b.source, &b.target)));
    relationships
}

/// Ordered inference rules; first match wins.
fn infer_type<'a>(
    source_type: EntityType,
    target_type: EntityType,
    tx_types: impl Iterator<Item = &'a String>,
    transaction_count: usize,
) -> &'static str {
    let mut has_dividend = false;
    let mut has_investment = false;
    let mut has_payment = false;
    let mut has_invoice = false;
    let mut has_donation = false;
    for tx_type in tx_types {
        match tx_type.as_str() {
            "dividend" => has_dividend = true,
            "investment" => has_investment = true,
            "payment" => has_payment = true,
            "invoice" => has_invoice = true,
            "donation" => has_donation = true,
            _ => {}
        }
    }

    let both_corporate =
        source_type == EntityType::Corporation && target_type == EntityType::Corporation;
    if both_corporate && (has_dividend || has_investment) {
        "parent-subsidiary"
    } else if has_investment {
        "investor-investee"
    } else if source_type == EntityType::FinancialIntermediary
        || target_type == EntityType::FinancialIntermediary
    {
        "banking"
    } else if has_payment && transaction_count > 5 {
        "customer"
    } else if has_invoice || has_payment {
        "supplier"
    } else if has_donation || target_type == EntityType::NonProfit {
        "donor"
    } else {
        "business"
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

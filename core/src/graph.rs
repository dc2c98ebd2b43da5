//! Relationship Graph Builder — collapses the transaction flow into a
//! simple weighted directed graph.
//!
//! Node = entity name. Edge = aggregate of every transaction between an
//! ordered (source, target) pair: weight is the summed amount, plus
//! transaction count and the set of observed transaction types.
//! Self-loops are excluded. Rebuilt per analysis run, never persisted.

use crate::{entity_extractor::Entity, normalizer::Transaction, types::EntityType};
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Clone)]
pub struct NodeData {
    pub name: String,
    pub entity_type: EntityType,
    pub transaction_count: usize,
    pub total_volume: f64,
}

#[derive(Debug, Clone, Default)]
pub struct EdgeData {
    pub weight: f64,
    pub transaction_count: usize,
    pub types: BTreeSet<String>,
}

pub struct TransactionGraph {
    pub graph: DiGraph<NodeData, EdgeData>,
    node_map: HashMap<String, NodeIndex>,
}

impl TransactionGraph {
    /// Build the graph from the finalized entity set and the batch of
    /// transactions those entities were extracted from.
    pub fn build(entities: &[Entity], transactions: &[Transaction]) -> Self {
        let mut graph = DiGraph::new();
        let mut node_map = HashMap::with_capacity(entities.len());

        for entity in entities {
            let index = graph.add_node(NodeData {
                name: entity.name.clone(),
                entity_type: entity.entity_type,
                transaction_count: entity.transaction_count,
                total_volume: entity.total_volume_sent + entity.total_volume_received,
            });
            node_map.insert(entity.name.clone(), index);
        }

        for tx in transactions {
            let source = tx.sender.trim();
            let target = tx.receiver.trim();
            if source == target {
                continue; // self-loops excluded
            }
            let (Some(&a), Some(&b)) = (node_map.get(source), node_map.get(target)) else {
                continue;
            };

            let edge = match graph.find_edge(a, b) {
                Some(edge) => edge,
                None => graph.add_edge(a, b, EdgeData::default()),
            };
            let data = &mut graph[edge];
            data.weight += tx.amount;
            data.transaction_count += 1;
            data.types.insert(tx.tx_type.clone());
        }

        Self { graph, node_map }
    }

    pub fn node_index(&self, name: &str) -> Option<NodeIndex> {
        self.node_map.get(name).copied()
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Edge aggregate between two named entities, if any.
    pub fn edge(&self, source: &str, target: &str) -> Option<&EdgeData> {
        let a = self.node_index(source)?;
        let b = self.node_index(target)?;
        let edge = self.graph.find_edge(a, b)?;
        Some(&self.graph[edge])
    }
}

//! Suspicious-pattern detection over the transaction graph.
//!
//! Three independent detectors, each additive (an entity or edge can
//! trigger several):
//!   1. circular_transactions — simple cycles of length >= 3.
//!   2. shell_company_pattern — high-betweenness shell funnels.
//!   3. unusual_volume — edge weights far above the population mean.

use crate::{
    analytics::{CentralityProfile, GraphAnalytics},
    config::AnalysisConfig,
    entity_extractor::Entity,
    graph::TransactionGraph,
    types::EntityType,
};
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    CircularTransactions,
    ShellCompanyPattern,
    UnusualVolume,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Medium,
    High,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuspiciousPattern {
    pub kind: PatternKind,
    pub severity: Severity,
    pub entities: Vec<String>,
    pub description: String,
}

pub struct PatternDetector {
    betweenness_threshold: f64,
    sigma_threshold: f64,
    min_cycle_len: usize,
}

impl PatternDetector {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            betweenness_threshold: config.shell_betweenness_threshold,
            sigma_threshold: config.volume_sigma_threshold,
            min_cycle_len: config.min_cycle_len,
        }
    }

    pub fn detect(
        &self,
        graph: &TransactionGraph,
        entities: &[Entity],
        centralities: &BTreeMap<String, CentralityProfile>,
        analytics: &dyn GraphAnalytics,
    ) -> Vec<SuspiciousPattern> {
        let mut patterns = Vec::new();
        self.detect_cycles(graph, analytics, &mut patterns);
        self.detect_shell_funnels(graph, entities, centralities, &mut patterns);
        self.detect_unusual_volume(graph, &mut patterns);
        if !patterns.is_empty() {
            log::info!("detected {} suspicious pattern(s)", patterns.len());
        }
        patterns
    }

    fn detect_cycles(
        &self,
        graph: &TransactionGraph,
        analytics: &dyn GraphAnalytics,
        patterns: &mut Vec<SuspiciousPattern>,
    ) {
        for cycle in analytics.simple_cycles(graph) {
            if cycle.len() < self.min_cycle_len {
                continue;
            }
            patterns.push(SuspiciousPattern {
                kind: PatternKind::CircularTransactions,
                severity: Severity::High,
                description: format!(
                    "Circular transaction flow through {} entities: {}",
                    cycle.len(),
                    cycle.join(" -> ")
                ),
                entities: cycle,
            });
        }
    }

    fn detect_shell_funnels(
        &self,
        graph: &TransactionGraph,
        entities: &[Entity],
        centralities: &BTreeMap<String, CentralityProfile>,
        patterns: &mut Vec<SuspiciousPattern>,
    ) {
        for entity in entities {
            if entity.entity_type != EntityType::ShellCompany {
                continue;
            }
            let Some(profile) = centralities.get(&entity.name) else {
                continue;
            };
            if profile.betweenness <= self.betweenness_threshold {
                continue;
            }
            let Some(index) = graph.node_index(&entity.name) else {
                continue;
            };
            let incoming = graph.graph.edges_directed(index, Direction::Incoming).count();
            let outgoing = graph.graph.edges_directed(index, Direction::Outgoing).count();
            if incoming > 3 && outgoing < 2 {
                patterns.push(SuspiciousPattern {
                    kind: PatternKind::ShellCompanyPattern,
                    severity: Severity::High,
                    entities: vec![entity.name.clone()],
                    description: format!(
                        "'{}' funnels {} incoming flows through {} outgoing with betweenness {:.3}",
                        entity.name, incoming, outgoing, profile.betweenness
                    ),
                });
            }
        }
    }

    fn detect_unusual_volume(&self, graph: &TransactionGraph, patterns: &mut Vec<SuspiciousPattern>) {
        let weights: Vec<f64> = graph
            .graph
            .edge_indices()
            .map(|e| graph.graph[e].weight)
            .collect();
        if weights.len() < 2 {
            return;
        }
        let mean = weights.iter().sum::<f64>() / weights.len() as f64;
        let variance =
            weights.iter().map(|w| (w - mean).powi(2)).sum::<f64>() / weights.len() as f64;
        let std_dev = variance.sqrt();
        if std_dev <= 0.0 {
            return;
        }
        let cutoff = mean + self.sigma_threshold * std_dev;

        for edge in graph.graph.edge_indices() {
            let weight = graph.graph[edge].weight;
            if weight <= cutoff {
                continue;
            }
            let Some((source, target)) = graph.graph.edge_endpoints(edge) else {
                continue;
            };
            let source = graph.graph[source].name.clone();
            let target = graph.graph[target].name.clone();
            patterns.push(SuspiciousPattern {
                kind: PatternKind::UnusualVolume,
                severity: Severity::Medium,
                description: format!(
                    "Edge {} -> {} carries {:.2}, over {:.1} sigma above the mean of {:.2}",
                    source, target, weight, self.sigma_threshold, mean
                ),
                entities: vec![source, target],
            });
        }
    }
}

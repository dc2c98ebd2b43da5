//! Pipeline orchestration: raw records in, full analysis report out.
//!
//! Stage order is fixed:
//!   normalize -> extract entities -> build graph -> analytics ->
//!   relationships -> patterns -> (validate) -> score
//!
//! Each run is an independent, stateless unit of work; the config is
//! the only shared state and it is read-only.

use crate::{
    analytics::{CentralityProfile, DefaultAnalytics, GraphAnalytics},
    config::AnalysisConfig,
    entity_extractor::{Entity, EntityExtractor},
    error::AnalysisResult,
    evidence::EvidenceMap,
    graph::TransactionGraph,
    identifier::IdentifierExtractor,
    normalizer::{NormalizeWarning, Normalizer, RawRecord, Transaction},
    patterns::{PatternDetector, SuspiciousPattern},
    relationships::{infer_relationships, Relationship},
    risk::{RiskAssessment, RiskScorer},
    validator::{EntityValidator, ValidationReport},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-batch bookkeeping: what went in, what the pipeline made of it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchStats {
    pub records_in: usize,
    pub transactions_out: usize,
    pub entities: usize,
    pub skipped_parties: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub entities: Vec<Entity>,
    pub relationships: Vec<Relationship>,
    pub risk_assessments: Vec<RiskAssessment>,
    pub suspicious_patterns: Vec<SuspiciousPattern>,
    pub validations: BTreeMap<String, ValidationReport>,
    pub warnings: Vec<NormalizeWarning>,
    pub stats: BatchStats,
}

pub struct AnalysisPipeline {
    config: AnalysisConfig,
    normalizer: Normalizer,
    identifiers: IdentifierExtractor,
    extractor: EntityExtractor,
    analytics: DefaultAnalytics,
}

impl AnalysisPipeline {
    pub fn new(config: AnalysisConfig) -> Self {
        let normalizer = Normalizer::new(&config);
        let extractor = EntityExtractor::new(&config);
        let analytics = DefaultAnalytics::new(&config);
        Self {
            config,
            normalizer,
            identifiers: IdentifierExtractor::default(),
            extractor,
            analytics,
        }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Full run from raw records. Degrades per-record (warnings, not
    /// errors); only an unusable input shape is fatal upstream.
    pub fn run(&self, records: &[RawRecord]) -> AnalysisReport {
        let batch = self.normalizer.normalize(records);
        let mut report = self.run_transactions(&batch.transactions, None);
        report.warnings = batch.warnings;
        report.stats.records_in = records.len();
        report
    }

    /// Run from an arbitrary JSON value (array of records, wrapped
    /// array, or single record). Fails only on unsupported shapes.
    pub fn run_value(&self, value: &serde_json::Value) -> AnalysisResult<AnalysisReport> {
        let records = Normalizer::records_from_value(value)?;
        Ok(self.run(&records))
    }

    /// Run from raw records with per-entity evidence: the scorer
    /// switches to its evidence-integrated variant and validation runs
    /// for every entity.
    pub fn run_with_evidence(&self, records: &[RawRecord], evidence: &EvidenceMap) -> AnalysisReport {
        let batch = self.normalizer.normalize(records);
        let mut report = self.run_transactions(&batch.transactions, Some(evidence));
        report.warnings = batch.warnings;
        report.stats.records_in = records.len();
        report
    }

    /// Core path for callers that normalize elsewhere.
    pub fn run_transactions(
        &self,
        transactions: &[Transaction],
        evidence: Option<&EvidenceMap>,
    ) -> AnalysisReport {
        let (entities, skipped) = self.extractor.extract(transactions, &self.identifiers);
        let graph = TransactionGraph::build(&entities, transactions);
        let centralities = self.analytics.centralities(&graph);
        let relationships = infer_relationships(&graph, &entities);
        let detector = PatternDetector::new(&self.config);
        let suspicious_patterns = detector.detect(&graph, &entities, &centralities, &self.analytics);

        let validations = match evidence {
            Some(evidence) => validate_all(&entities, evidence),
            None => BTreeMap::new(),
        };
        let risk_assessments =
            self.score_all(&entities, transactions, &centralities, &validations, evidence);

        log::info!(
            "analyzed {} transaction(s): {} entities, {} relationships, {} patterns",
            transactions.len(),
            entities.len(),
            relationships.len(),
            suspicious_patterns.len()
        );

        let stats = BatchStats {
            records_in: transactions.len(),
            transactions_out: transactions.len(),
            entities: entities.len(),
            skipped_parties: skipped,
        };
        AnalysisReport {
            entities,
            relationships,
            risk_assessments,
            suspicious_patterns,
            validations,
            warnings: Vec::new(),
            stats,
        }
    }

    fn score_all(
        &self,
        entities: &[Entity],
        transactions: &[Transaction],
        centralities: &BTreeMap<String, CentralityProfile>,
        validations: &BTreeMap<String, ValidationReport>,
        evidence: Option<&EvidenceMap>,
    ) -> Vec<RiskAssessment> {
        let scorer = RiskScorer::new(&self.config);
        entities
            .iter()
            .map(|entity| {
                let own: Vec<&Transaction> = transactions
                    .iter()
                    .filter(|tx| {
                        tx.sender.trim() == entity.name || tx.receiver.trim() == entity.name
                    })
                    .collect();
                match evidence {
                    Some(evidence) => scorer.score_with_evidence(
                        entity,
                        &own,
                        validations.get(&entity.name),
                        evidence.get(&entity.name),
                    ),
                    None => scorer.score(entity, &own, centralities.get(&entity.name)),
                }
            })
            .collect()
    }
}

fn validate_all(entities: &[Entity], evidence: &EvidenceMap) -> BTreeMap<String, ValidationReport> {
    let validator = EntityValidator::new();
    entities
        .iter()
        .map(|entity| {
            let report = validator.validate(entity, evidence.get(&entity.name));
            (entity.name.clone(), report)
        })
        .collect()
}

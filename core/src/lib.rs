//! entity-risk-core — financial-transaction entity analysis.
//!
//! Turns raw transaction records into an entity graph with risk
//! assessments:
//!
//!   1. `normalizer`        — heterogeneous records to canonical Transactions.
//!   2. `entity_extractor`  — entities with inferred types and aggregates.
//!   3. `identifier`        — syntactic identifier recovery (EIN, VAT, SWIFT, IBAN).
//!   4. `graph`             — weighted directed transaction graph.
//!   5. `analytics`         — centralities, communities, simple cycles.
//!   6. `relationships`     — typed relationship records per edge.
//!   7. `patterns`          — circular/shell/volume pattern detection.
//!   8. `validator`         — layered entity validation.
//!   9. `evidence`          — external-evidence inputs and factor taxonomy.
//!  10. `risk`              — weighted composite risk scoring.
//!  11. `pipeline`          — orchestration and reporting.
//!
//! The pipeline is a pure batch computation: no persistence, no network
//! calls, no process-wide mutable state.

pub mod analytics;
pub mod config;
pub mod entity_extractor;
pub mod error;
pub mod evidence;
pub mod graph;
pub mod identifier;
pub mod normalizer;
pub mod patterns;
pub mod pipeline;
pub mod relationships;
pub mod risk;
pub mod types;
pub mod validator;

pub use analytics::{CentralityProfile, DefaultAnalytics, GraphAnalytics};
pub use config::AnalysisConfig;
pub use entity_extractor::{Entity, EntityExtractor};
pub use error::{AnalysisError, AnalysisResult};
pub use evidence::{EvidenceMap, EvidenceSet};
pub use graph::TransactionGraph;
pub use identifier::IdentifierExtractor;
pub use normalizer::{NormalizedBatch, Normalizer, RawRecord, Transaction};
pub use patterns::{PatternKind, Severity, SuspiciousPattern};
pub use pipeline::{AnalysisPipeline, AnalysisReport, BatchStats};
pub use relationships::Relationship;
pub use risk::{RiskAssessment, RiskFactor, RiskScorer};
pub use types::{EntityType, IdentifierKind, RiskLevel};
pub use validator::{EntityValidator, ValidationReport};

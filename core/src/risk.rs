//! Risk scoring. Two variants share the weighting machinery:
//!
//!   - transactional: entity + transaction + graph features only.
//!   - evidence-integrated: folds in validation results and external
//!     evidence (registries, news, sanctions).
//!
//! Composite = Σ(weight × sub-score) / Σweight on a 0-10 scale, rounded
//! to one decimal. A scoring failure never propagates: the assessment
//! degrades to the conservative 6.5 / high with an `error` factor.

use crate::{
    analytics::CentralityProfile,
    config::AnalysisConfig,
    entity_extractor::Entity,
    error::{AnalysisError, AnalysisResult},
    evidence::EvidenceSet,
    normalizer::Transaction,
    types::{EntityType, RiskLevel},
    validator::ValidationReport,
};
use serde::{Deserialize, Serialize};

const NEUTRAL_SCORE: f64 = 5.0;
const ERROR_FALLBACK_SCORE: f64 = 6.5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskFactor {
    pub name: String,
    pub weight: f64,
    pub score: f64,
    pub detail: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub entity: String,
    pub score: f64,
    pub level: RiskLevel,
    pub factors: Vec<RiskFactor>,
}

pub struct RiskScorer<'cfg> {
    config: &'cfg AnalysisConfig,
}

impl<'cfg> RiskScorer<'cfg> {
    pub fn new(config: &'cfg AnalysisConfig) -> Self {
        Self { config }
    }

    /// Transactional scoring. `transactions` is the subset where the
    /// entity is a party; `profile` its centralities if the graph had it.
    pub fn score(
        &self,
        entity: &Entity,
        transactions: &[&Transaction],
        profile: Option<&CentralityProfile>,
    ) -> RiskAssessment {
        match self.score_inner(entity, transactions, profile) {
            Ok(assessment) => assessment,
            Err(e) => self.error_fallback(entity, e),
        }
    }

    /// Evidence-integrated scoring. Callers pick this variant when
    /// validation results or external evidence are available.
    pub fn score_with_evidence(
        &self,
        entity: &Entity,
        transactions: &[&Transaction],
        validation: Option<&ValidationReport>,
        evidence: Option<&EvidenceSet>,
    ) -> RiskAssessment {
        match self.score_evidence_inner(entity, transactions, validation, evidence) {
            Ok(assessment) => assessment,
            Err(e) => self.error_fallback(entity, e),
        }
    }

    fn score_inner(
        &self,
        entity: &Entity,
        transactions: &[&Transaction],
        profile: Option<&CentralityProfile>,
    ) -> AnalysisResult<RiskAssessment> {
        let weights = &self.config.transactional_weights;
        let factors = vec![
            RiskFactor {
                name: "transaction_patterns".into(),
                weight: weights.transaction_patterns,
                score: self.transaction_pattern_score(transactions),
                detail: format!("{} transaction(s)", transactions.len()),
            },
            RiskFactor {
                name: "network_position".into(),
                weight: weights.network_position,
                score: network_position_score(entity, profile),
                detail: format!("{} distinct counterparties", entity.counterparties.len()),
            },
            RiskFactor {
                name: "entity_type".into(),
                weight: weights.entity_type,
                score: entity_type_score(entity.entity_type),
                detail: entity.entity_type.as_str().to_string(),
            },
            RiskFactor {
                name: "geographic_risk".into(),
                weight: weights.geographic_risk,
                score: self.geographic_score(&entity.countries),
                detail: format!("{} distinct countries observed", entity.countries.len()),
            },
            RiskFactor {
                name: "known_risk_indicators".into(),
                weight: weights.known_risk_indicators,
                score: self.indicator_score(entity, transactions),
                detail: "keyword and round-amount indicators".into(),
            },
        ];
        self.assemble(entity, factors, false)
    }

    fn score_evidence_inner(
        &self,
        entity: &Entity,
        transactions: &[&Transaction],
        validation: Option<&ValidationReport>,
        evidence: Option<&EvidenceSet>,
    ) -> AnalysisResult<RiskAssessment> {
        let weights = &self.config.evidence_weights;
        let sanctioned = evidence.map_or(false, |e| e.is_sanctioned());
        let factors = vec![
            RiskFactor {
                name: "entity_type".into(),
                weight: weights.entity_type,
                score: evidence_type_score(entity.entity_type),
                detail: entity.entity_type.as_str().to_string(),
            },
            RiskFactor {
                name: "validation".into(),
                weight: weights.validation,
                score: validation_score(validation),
                detail: match validation {
                    Some(report) => format!(
                        "valid={} confidence={:.2}",
                        report.is_valid, report.confidence_score
                    ),
                    None => "no validation performed".into(),
                },
            },
            RiskFactor {
                name: "transaction_patterns".into(),
                weight: weights.transaction_patterns,
                score: evidence_transaction_score(entity, transactions),
                detail: format!("{} transaction(s)", transactions.len()),
            },
            RiskFactor {
                name: "external_data".into(),
                weight: weights.external_data,
                score: self.external_data_score(evidence),
                detail: match evidence {
                    Some(_) => "evidence supplied".into(),
                    None => "no external evidence".into(),
                },
            },
            RiskFactor {
                name: "sanctions".into(),
                weight: weights.sanctions,
                score: if sanctioned { 10.0 } else { 1.0 },
                detail: format!("sanctioned={sanctioned}"),
            },
        ];
        self.assemble(entity, factors, sanctioned)
    }

    fn assemble(
        &self,
        entity: &Entity,
        factors: Vec<RiskFactor>,
        force_high: bool,
    ) -> AnalysisResult<RiskAssessment> {
        let total_weight: f64 = factors.iter().map(|f| f.weight).sum();
        if total_weight <= 0.0 {
            return Err(AnalysisError::Scoring {
                entity: entity.name.clone(),
                detail: "non-positive total factor weight".into(),
            });
        }
        let composite: f64 =
            factors.iter().map(|f| f.weight * f.score).sum::<f64>() / total_weight;
        if !composite.is_finite() {
            return Err(AnalysisError::Scoring {
                entity: entity.name.clone(),
                detail: "non-finite composite score".into(),
            });
        }
        let score = (composite.clamp(0.0, 10.0) * 10.0).round() / 10.0;
        let mut level = RiskLevel::from_score(score);
        // A confirmed sanctions match never grades below high.
        if force_high && level < RiskLevel::High {
            level = RiskLevel::High;
        }
        Ok(RiskAssessment {
            entity: entity.name.clone(),
            score,
            level,
            factors,
        })
    }

    fn error_fallback(&self, entity: &Entity, error: AnalysisError) -> RiskAssessment {
        log::error!("risk scoring failed for '{}': {error}", entity.name);
        RiskAssessment {
            entity: entity.name.clone(),
            score: ERROR_FALLBACK_SCORE,
            level: RiskLevel::from_score(ERROR_FALLBACK_SCORE),
            factors: vec![RiskFactor {
                name: "error".into(),
                weight: 1.0,
                score: ERROR_FALLBACK_SCORE,
                detail: error.to_string(),
            }],
        }
    }

    // ── Transactional sub-scores ─────────────────────────────────────────────

    fn transaction_pattern_score(&self, transactions: &[&Transaction]) -> f64 {
        if transactions.is_empty() {
            return NEUTRAL_SCORE;
        }
        let mut score: f64 = 0.0;
        let count = transactions.len();
        let total: f64 = transactions.iter().map(|tx| tx.amount).sum();
        let average = total / count as f64;

        if count > 100 {
            score += 2.0;
        } else if count > 50 {
            score += 1.0;
        }
        if average > 1_000_000.0 {
            score += 2.5;
        } else if average > 100_000.0 {
            score += 1.5;
        }
        if round_thousand_ratio(transactions) > 0.5 {
            score += 1.5;
        }
        // Timing-pattern placeholder term.
        score += 0.5;
        let distinct_types: std::collections::BTreeSet<&str> =
            transactions.iter().map(|tx| tx.tx_type.as_str()).collect();
        if distinct_types.len() == 1 {
            score += 1.0;
        }
        score.min(10.0)
    }

    fn geographic_score(&self, countries: &[String]) -> f64 {
        if countries.is_empty() {
            return NEUTRAL_SCORE;
        }
        let high = countries
            .iter()
            .filter(|c| self.config.high_risk_countries.contains(&c.to_lowercase()))
            .count();
        let medium = countries
            .iter()
            .filter(|c| self.config.medium_risk_countries.contains(&c.to_lowercase()))
            .count();
        let score = if high > 0 {
            7.0 + (high as f64 - 1.0) * 0.5
        } else if medium > 0 {
            5.0 + medium as f64 * 0.5
        } else {
            3.0
        };
        score.min(10.0)
    }

    fn indicator_score(&self, entity: &Entity, transactions: &[&Transaction]) -> f64 {
        let name = entity.name.to_lowercase();
        let description: String = transactions
            .iter()
            .filter_map(|tx| tx.raw_text("description"))
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();

        let mut score: f64 = 0.0;
        for keyword in &self.config.suspicious_keywords {
            if name.contains(keyword.as_str()) {
                score += 1.0;
            }
            if description.contains(keyword.as_str()) {
                score += 0.5;
            }
        }
        if !transactions.is_empty() && round_thousand_ratio(transactions) > 0.5 {
            score += 1.0;
        }
        score.min(10.0)
    }

    // ── Evidence-integrated sub-scores ───────────────────────────────────────

    fn external_data_score(&self, evidence: Option<&EvidenceSet>) -> f64 {
        let Some(evidence) = evidence else {
            return NEUTRAL_SCORE;
        };
        let mut contributions = 0.0;
        let mut any = false;
        if !evidence.has_corporate_records() {
            contributions += 3.0;
            any = true;
        }
        if evidence.recently_incorporated() {
            contributions += 2.0;
            any = true;
        }
        let negative = evidence.negative_article_count(&self.config.negative_news_keywords);
        if negative > 0 {
            contributions += (negative as f64).min(4.0);
            any = true;
        }
        if evidence.is_sanctioned() {
            contributions += 5.0;
            any = true;
        }
        if any {
            (3.0 + contributions).min(10.0)
        } else {
            NEUTRAL_SCORE
        }
    }
}

fn entity_type_score(entity_type: EntityType) -> f64 {
    match entity_type {
        EntityType::Corporation => 3.0,
        EntityType::NonProfit => 4.0,
        EntityType::ShellCompany => 8.0,
        EntityType::FinancialIntermediary => 5.0,
        EntityType::Individual => 3.0,
        EntityType::Unknown => 5.0,
    }
}

fn evidence_type_score(entity_type: EntityType) -> f64 {
    match entity_type {
        EntityType::Corporation => 3.0,
        EntityType::NonProfit => 4.0,
        EntityType::FinancialIntermediary => 6.0,
        EntityType::ShellCompany => 9.0,
        EntityType::Individual => 3.0,
        EntityType::Unknown => 5.0,
    }
}

fn network_position_score(entity: &Entity, profile: Option<&CentralityProfile>) -> f64 {
    if entity.counterparties.is_empty() {
        return NEUTRAL_SCORE;
    }
    let mut score = 0.0;
    if entity.counterparties.len() < 3 {
        score += 2.0;
    }
    // Counterparty-concentration placeholder term.
    score += 1.0;
    match profile {
        Some(profile) => {
            score += (profile.betweenness * 10.0).min(2.0);
            score += (profile.eigenvector * 10.0).min(2.0);
        }
        None => {
            score += 1.0 + 1.0;
        }
    }
    score.min(10.0)
}

fn validation_score(validation: Option<&ValidationReport>) -> f64 {
    let Some(report) = validation else {
        // Lack of validation is itself a risk signal.
        return 7.0;
    };
    let mut score = if report.is_valid { 2.0 } else { 8.0 };
    if report.is_valid && report.confidence_score < 0.7 {
        score += 2.0;
    }
    score
}

fn evidence_transaction_score(entity: &Entity, transactions: &[&Transaction]) -> f64 {
    if transactions.is_empty() {
        return NEUTRAL_SCORE;
    }
    let mut contributions: f64 = 0.0;
    let mut any = false;

    let sent = entity.total_volume_sent;
    let received = entity.total_volume_received;
    let peak = sent.max(received);
    if peak > 0.0 && (sent - received).abs() / peak > 0.8 {
        contributions += 2.0;
        any = true;
    }
    if entity.entity_type == EntityType::ShellCompany && entity.transaction_count > 10 {
        contributions += 3.0;
        any = true;
    }
    if round_thousand_ratio(transactions) > 0.5 {
        contributions += 2.0;
        any = true;
    }

    if any {
        (4.0 + contributions).min(10.0)
    } else {
        NEUTRAL_SCORE
    }
}

fn round_thousand_ratio(transactions: &[&Transaction]) -> f64 {
    if transactions.is_empty() {
        return 0.0;
    }
    let round = transactions
        .iter()
        .filter(|tx| tx.amount > 0.0 && tx.amount % 1000.0 == 0.0)
        .count();
    round as f64 / transactions.len() as f64
}

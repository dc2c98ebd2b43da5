//! Analysis configuration: every keyword table, country list, and weight
//! table the pipeline consults lives here as explicit data.
//!
//! RULES:
//!   - Rule priority is table position. The extractor and scorer walk
//!     these tables in order; nothing depends on incidental code order.
//!   - No module-level statics. The config is built once and shared
//!     read-only across requests.

use crate::error::AnalysisResult;
use crate::types::EntityType;
use serde::{Deserialize, Serialize};

/// One canonical field and the input spellings that map onto it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSynonyms {
    pub canonical: String,
    pub variants: Vec<String>,
}

/// One keyword rule of the entity-type inference table. Rules are
/// evaluated in table order; the first match wins. Shell-company rules
/// additionally require the topology condition (high activity, few
/// counterparties) at the rule site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeKeywordRule {
    pub entity_type: EntityType,
    pub keywords: Vec<String>,
}

/// Weights for the transactional scorer (entity + transaction + graph
/// features only).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionalWeights {
    pub transaction_patterns: f64,
    pub network_position: f64,
    pub entity_type: f64,
    pub geographic_risk: f64,
    pub known_risk_indicators: f64,
}

/// Weights for the evidence-integrated scorer variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceWeights {
    pub entity_type: f64,
    pub validation: f64,
    pub transaction_patterns: f64,
    pub external_data: f64,
    pub sanctions: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Canonical-field synonym table, in mapping order.
    pub field_synonyms: Vec<FieldSynonyms>,
    /// Timestamp patterns tried in order before the now-fallback.
    pub timestamp_formats: Vec<String>,

    /// Entity-type keyword rules, highest priority first.
    pub type_rules: Vec<TypeKeywordRule>,
    /// Corporate keywords checked after the personal-name rule. Matched
    /// on whole words so that "co" does not swallow "Consulting".
    pub corporate_keywords: Vec<String>,
    /// Topology condition for the shell-company rule.
    pub shell_min_transactions: usize,
    pub shell_max_counterparties: usize,

    pub high_risk_countries: Vec<String>,
    pub medium_risk_countries: Vec<String>,
    /// Keywords that raise the known-risk-indicator sub-score.
    pub suspicious_keywords: Vec<String>,
    /// Keywords that mark a news article as negative.
    pub negative_news_keywords: Vec<String>,

    pub transactional_weights: TransactionalWeights,
    pub evidence_weights: EvidenceWeights,

    /// Power-iteration bound for eigenvector centrality. Non-convergence
    /// is recoverable (zero centralities), never an error.
    pub eigenvector_max_iter: usize,
    pub eigenvector_tolerance: f64,

    /// Betweenness threshold for the shell-funnel pattern.
    pub shell_betweenness_threshold: f64,
    /// Standard-deviation multiplier for the volume-outlier pattern.
    pub volume_sigma_threshold: f64,
    /// Minimum cycle length reported as circular_transactions.
    pub min_cycle_len: usize,
    /// Upper bound on enumerated simple cycles, so pathological graphs
    /// keep the detector total.
    pub max_cycles: usize,
}

impl AnalysisConfig {
    /// Load a config override from a JSON file. Missing fields fall back
    /// to the built-in defaults; malformed JSON surfaces as a
    /// serialization error.
    pub fn load(path: &str) -> AnalysisResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: AnalysisConfig = serde_json::from_str(&content)?;
        Ok(config)
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        let field_synonyms = [
            (
                "transaction_id",
                vec!["transaction_id", "id", "txid", "tx_id", "transaction_reference", "reference"],
            ),
            (
                "sender",
                vec!["sender", "from", "source", "sender_name", "from_account", "originator", "payer"],
            ),
            (
                "receiver",
                vec![
                    "receiver", "to", "destination", "recipient", "recipient_name", "to_account",
                    "beneficiary", "payee",
                ],
            ),
            ("amount", vec!["amount", "sum", "total", "value", "transaction_amount"]),
            ("currency", vec!["currency", "curr", "currency_code"]),
            (
                "timestamp",
                vec!["timestamp", "date", "time", "datetime", "transaction_date", "created_at", "date_time"],
            ),
            ("type", vec!["type", "transaction_type", "payment_type", "tx_type"]),
        ]
        .into_iter()
        .map(|(canonical, variants)| FieldSynonyms {
            canonical: canonical.into(),
            variants: variants.into_iter().map(String::from).collect(),
        })
        .collect();

        let type_rules = vec![
            TypeKeywordRule {
                entity_type: EntityType::NonProfit,
                keywords: strings(&["foundation", "trust", "ngo", "charity", "association", "nonprofit"]),
            },
            TypeKeywordRule {
                entity_type: EntityType::FinancialIntermediary,
                keywords: strings(&["bank", "capital", "invest", "securities", "credit", "fund", "financial"]),
            },
            TypeKeywordRule {
                entity_type: EntityType::ShellCompany,
                keywords: strings(&["holding", "international", "overseas", "offshore", "global"]),
            },
        ];

        Self {
            field_synonyms,
            timestamp_formats: strings(&[
                "%Y-%m-%d %H:%M:%S",
                "%Y-%m-%d",
                "%m/%d/%Y",
                "%d/%m/%Y",
                "%Y/%m/%d",
            ]),
            type_rules,
            corporate_keywords: strings(&[
                "ltd", "llc", "inc", "corp", "corporation", "company", "co", "holdings", "gmbh",
                "ag", "plc",
            ]),
            shell_min_transactions: 10,
            shell_max_counterparties: 3,
            high_risk_countries: strings(&[
                "afghanistan", "belarus", "burma", "myanmar", "central african republic",
                "democratic republic of the congo", "eritrea", "iran", "iraq", "libya",
                "north korea", "somalia", "south sudan", "sudan", "syria", "venezuela",
                "yemen", "zimbabwe",
            ]),
            medium_risk_countries: strings(&[
                "albania", "bahamas", "barbados", "botswana", "cambodia", "ghana", "jamaica",
                "mauritius", "morocco", "nicaragua", "pakistan", "panama", "philippines",
                "senegal", "south africa", "uganda", "vanuatu",
            ]),
            suspicious_keywords: strings(&[
                "offshore", "shell", "nominee", "anonymous", "hidden", "secret", "concealed",
                "undisclosed", "confidential", "private", "international", "holding", "overseas",
                "global",
            ]),
            negative_news_keywords: strings(&[
                "fraud", "scam", "investigation", "scandal", "lawsuit", "crime", "criminal",
                "illegal", "violation", "sanction",
            ]),
            transactional_weights: TransactionalWeights {
                transaction_patterns: 0.30,
                network_position: 0.20,
                entity_type: 0.15,
                geographic_risk: 0.20,
                known_risk_indicators: 0.15,
            },
            evidence_weights: EvidenceWeights {
                entity_type: 0.15,
                validation: 0.25,
                transaction_patterns: 0.30,
                external_data: 0.20,
                sanctions: 0.10,
            },
            eigenvector_max_iter: 1000,
            eigenvector_tolerance: 1e-6,
            shell_betweenness_threshold: 0.3,
            volume_sigma_threshold: 3.0,
            min_cycle_len: 3,
            max_cycles: 10_000,
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

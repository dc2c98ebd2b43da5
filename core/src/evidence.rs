//! External-evidence inputs and the free-text risk-factor taxonomy.
//!
//! Evidence blobs arrive from excluded collaborators (registry lookups,
//! news search, sanctions screening) keyed by source; this module only
//! interprets them, it never performs lookups itself. Free-text factor
//! descriptions map onto a fixed, ordered keyword table so the mapping
//! is reproducible regardless of where the text came from.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A corporate-registry match for an entity name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryMatch {
    #[serde(default)]
    pub jurisdiction: Option<String>,
    #[serde(default)]
    pub incorporation_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryEvidence {
    #[serde(default)]
    pub total_count: usize,
    #[serde(default)]
    pub matches: Vec<RegistryMatch>,
    #[serde(default)]
    pub reliability: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewsArticle {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewsEvidence {
    #[serde(default)]
    pub articles: Vec<NewsArticle>,
    #[serde(default)]
    pub reliability: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SanctionsEvidence {
    #[serde(default)]
    pub is_sanctioned: bool,
    #[serde(default)]
    pub matches: Vec<String>,
    #[serde(default)]
    pub reliability: Option<f64>,
}

/// Everything the caller gathered about one entity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvidenceSet {
    #[serde(default)]
    pub registry: Option<RegistryEvidence>,
    #[serde(default)]
    pub news: Option<NewsEvidence>,
    #[serde(default)]
    pub sanctions: Option<SanctionsEvidence>,
}

/// Evidence blobs keyed by entity name, as supplied on the command line
/// or by an embedding service.
pub type EvidenceMap = BTreeMap<String, EvidenceSet>;

impl EvidenceSet {
    pub fn is_sanctioned(&self) -> bool {
        self.sanctions.as_ref().map_or(false, |s| s.is_sanctioned)
    }

    /// Articles whose title or description contains a negative keyword.
    pub fn negative_article_count(&self, keywords: &[String]) -> usize {
        let Some(news) = &self.news else {
            return 0;
        };
        news.articles
            .iter()
            .filter(|article| {
                let title = article.title.to_lowercase();
                let description = article.description.to_lowercase();
                keywords
                    .iter()
                    .any(|k| title.contains(k.as_str()) || description.contains(k.as_str()))
            })
            .count()
    }

    /// Registry match incorporated within the last 180 days.
    pub fn recently_incorporated(&self) -> bool {
        let Some(registry) = &self.registry else {
            return false;
        };
        let today = Utc::now().date_naive();
        registry.matches.iter().any(|m| {
            m.incorporation_date
                .map_or(false, |date| (today - date).num_days() < 180)
        })
    }

    pub fn has_corporate_records(&self) -> bool {
        self.registry.as_ref().map_or(true, |r| r.total_count > 0)
    }
}

// ── Free-text factor taxonomy ────────────────────────────────────────────────

/// Ordered (keywords, factor type, weight) table. First row whose
/// keywords match wins, so priority lives in table position.
const FACTOR_TABLE: &[(&[&str], &str, f64)] = &[
    (&["shell", "offshore", "nominee"], "shell_company", 0.8),
    (&["high volume", "numerous transactions"], "high_volume_transactions", 0.7),
    (&["circular", "round-trip"], "circular_transactions", 0.9),
    (&["overseas", "foreign", "international"], "overseas_transactions", 0.6),
    (&["round numbers", "even amounts"], "large_round_numbers", 0.5),
    (&["inconsistent", "unusual", "irregular"], "irregular_transaction_patterns", 0.8),
    (&["news", "media", "press", "negative"], "negative_news", 0.7),
    (&["regulator", "compliance", "violation"], "regulatory_issues", 0.8),
    (&["incomplete", "missing", "lack of"], "incomplete_information", 0.6),
    (&["jurisdict", "country", "territory", "high risk"], "jurisdiction_high_risk", 0.8),
    (&["pep", "political", "government", "official"], "politically_exposed", 0.9),
    (&["sanction", "prohibited", "restricted"], "sanctioned_entity", 1.0),
    (&["transparency", "disclosure", "opaque"], "poor_transparency", 0.6),
    (&["connect", "link", "relation"], "connection_to_high_risk_entity", 0.8),
    (&["complex", "structure", "ownership"], "complex_ownership_structure", 0.7),
    (&["management", "director", "change", "frequent"], "frequent_management_changes", 0.6),
];

/// Map a free-text factor description to the fixed taxonomy. Falls
/// through to `unknown` when nothing matches.
pub fn determine_factor_type(factor_text: &str) -> &'static str {
    let text = factor_text.to_lowercase();
    for (keywords, factor_type, _) in FACTOR_TABLE {
        if keywords.iter().any(|k| text.contains(k)) {
            return factor_type;
        }
    }
    "unknown"
}

/// Weight attached to a taxonomy factor type, if it is a known one.
pub fn factor_weight(factor_type: &str) -> Option<f64> {
    FACTOR_TABLE
        .iter()
        .find(|(_, name, _)| *name == factor_type)
        .map(|(_, _, weight)| *weight)
}

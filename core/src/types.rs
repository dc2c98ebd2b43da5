//! Shared primitive types used across the entire analysis pipeline.

use serde::{Deserialize, Serialize};

/// Classification assigned to an entity by the extractor's rule table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Corporation,
    NonProfit,
    FinancialIntermediary,
    ShellCompany,
    Individual,
    Unknown,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Corporation => "corporation",
            EntityType::NonProfit => "non_profit",
            EntityType::FinancialIntermediary => "financial_intermediary",
            EntityType::ShellCompany => "shell_company",
            EntityType::Individual => "individual",
            EntityType::Unknown => "unknown",
        }
    }
}

/// Discrete risk level derived from a composite score on the 0-10 scale.
/// Ordering matters: Minimal < Low < Medium < High < Critical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Minimal,
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// Deterministic, monotonic mapping from composite score to level.
    pub fn from_score(score: f64) -> Self {
        if score >= 7.5 {
            RiskLevel::Critical
        } else if score >= 6.0 {
            RiskLevel::High
        } else if score >= 4.0 {
            RiskLevel::Medium
        } else if score >= 2.0 {
            RiskLevel::Low
        } else {
            RiskLevel::Minimal
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Minimal => "minimal",
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        }
    }
}

/// Kind of structured identifier recovered from transaction text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentifierKind {
    TaxId,
    Registration,
    SwiftBic,
    Iban,
}

impl IdentifierKind {
    /// Lower number = higher priority when picking a primary identifier.
    pub fn priority(&self) -> u8 {
        match self {
            IdentifierKind::TaxId => 1,
            IdentifierKind::Registration => 2,
            IdentifierKind::SwiftBic => 3,
            IdentifierKind::Iban => 4,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IdentifierKind::TaxId => "tax_id",
            IdentifierKind::Registration => "registration",
            IdentifierKind::SwiftBic => "swift_bic",
            IdentifierKind::Iban => "iban",
        }
    }
}

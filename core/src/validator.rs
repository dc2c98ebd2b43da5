//! Layered entity validation:
//!   1. basic     — name, type, and identifier-format checks.
//!   2. extended  — name heuristics and transaction-flow sanity
//!                  (only when basic passes).
//!   3. evidence  — presence/quality of supplied evidence blobs
//!                  (only when extended ran and an EvidenceSet exists).
//!
//! An entity is valid when at least 70% of executed checks pass; the
//! confidence score is the raw pass ratio rounded to two decimals.

use crate::{
    entity_extractor::Entity,
    evidence::EvidenceSet,
    types::EntityType,
};
use regex::Regex;
use serde::{Deserialize, Serialize};

const PASS_RATIO: f64 = 0.7;
const GENERIC_NAME_TERMS: &[&str] = &[
    "holdings",
    "group",
    "international",
    "worldwide",
    "global",
    "trading",
    "investments",
];
const MAX_SHELL_TRANSACTIONS: usize = 20;
const VOLUME_DISCREPANCY_RATIO: f64 = 0.7;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationCheck {
    pub check_type: String,
    pub passed: bool,
    pub detail: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub checks: Vec<ValidationCheck>,
    pub confidence_score: f64,
}

pub struct EntityValidator {
    ein: Regex,
    vat: Regex,
    generic_registration: Regex,
    swift: Regex,
    iban: Regex,
    generic_identifier: Regex,
    abbreviation: Regex,
}

impl EntityValidator {
    pub fn new() -> Self {
        // Anchored variants of the extraction patterns: validation asks
        // "is this whole string an identifier", not "does one occur".
        Self {
            ein: Regex::new(r"^\d{2}-\d{7}$").unwrap(),
            vat: Regex::new(r"^[A-Z]{2}\d{8,12}$").unwrap(),
            generic_registration: Regex::new(r"^[A-Z0-9]{5,15}$").unwrap(),
            swift: Regex::new(r"^[A-Z]{6}[A-Z0-9]{2}([A-Z0-9]{3})?$").unwrap(),
            iban: Regex::new(r"^[A-Z]{2}\d{2}[A-Z0-9]{4}[A-Z0-9]{8,}$").unwrap(),
            generic_identifier: Regex::new(r"^[A-Z0-9]{5,}$").unwrap(),
            abbreviation: Regex::new(r"\b[A-Z]{2,}\b").unwrap(),
        }
    }

    pub fn validate(&self, entity: &Entity, evidence: Option<&EvidenceSet>) -> ValidationReport {
        let mut checks = Vec::new();

        let basic = self.basic_check(entity);
        let basic_passed = basic.passed;
        checks.push(basic);

        if basic_passed {
            let extended = self.extended_check(entity);
            let extended_passed = extended.passed;
            checks.push(extended);

            if extended_passed {
                if let Some(evidence) = evidence {
                    checks.push(evidence_check(entity, evidence));
                }
            }
        }

        let passed = checks.iter().filter(|c| c.passed).count();
        let total = checks.len();
        let is_valid = passed > 0 && passed as f64 >= total as f64 * PASS_RATIO;
        let confidence_score = if total > 0 {
            (passed as f64 / total as f64 * 100.0).round() / 100.0
        } else {
            0.0
        };
        if !is_valid {
            log::debug!("validation failed for '{}' ({passed}/{total} checks)", entity.name);
        }

        ValidationReport {
            is_valid,
            checks,
            confidence_score,
        }
    }

    fn basic_check(&self, entity: &Entity) -> ValidationCheck {
        let name_ok = entity.name.trim().len() >= 2;
        let type_ok = matches!(
            entity.entity_type,
            EntityType::Corporation
                | EntityType::NonProfit
                | EntityType::ShellCompany
                | EntityType::FinancialIntermediary
        );
        let identifier_ok = entity
            .primary_identifier
            .as_deref()
            .map(|id| self.identifier_matches(entity.entity_type, id))
            .unwrap_or(false);

        // Name must hold; a well-formed identifier can stand in for a
        // recognized entity type.
        let passed = name_ok && (type_ok || identifier_ok);
        ValidationCheck {
            check_type: "basic".to_string(),
            passed,
            detail: format!(
                "name={name_ok} type={type_ok} identifier={identifier_ok}"
            ),
        }
    }

    fn identifier_matches(&self, entity_type: EntityType, identifier: &str) -> bool {
        match entity_type {
            EntityType::Corporation => {
                self.ein.is_match(identifier)
                    || self.vat.is_match(identifier)
                    || self.generic_registration.is_match(identifier)
            }
            EntityType::FinancialIntermediary => {
                self.swift.is_match(identifier) || self.iban.is_match(identifier)
            }
            _ => self.generic_identifier.is_match(identifier),
        }
    }

    fn extended_check(&self, entity: &Entity) -> ValidationCheck {
        let mut reasons = Vec::new();

        let lower = entity.name.to_lowercase();
        let generic = GENERIC_NAME_TERMS.iter().any(|t| lower.contains(t));
        if generic && entity.name.split_whitespace().count() <= 2 {
            reasons.push("generic name with limited descriptive terms");
        }
        if self.abbreviation.find_iter(&entity.name).count() > 2 {
            reasons.push("excessive abbreviations in name");
        }

        let sent = entity.total_volume_sent;
        let received = entity.total_volume_received;
        let peak = sent.max(received);
        if entity.transaction_count > 0 && peak > 0.0 && (sent - received).abs() / peak > VOLUME_DISCREPANCY_RATIO {
            reasons.push("one-sided transaction flow");
        }
        if entity.entity_type == EntityType::ShellCompany
            && entity.transaction_count > MAX_SHELL_TRANSACTIONS
        {
            reasons.push("unusually high transaction count for a shell company");
        }

        ValidationCheck {
            check_type: "extended".to_string(),
            passed: reasons.is_empty(),
            detail: if reasons.is_empty() {
                "no structural anomalies".to_string()
            } else {
                reasons.join("; ")
            },
        }
    }
}

impl Default for EntityValidator {
    fn default() -> Self {
        Self::new()
    }
}

/// A supplied evidence set validates when at least one source is
/// present, corporate records exist, and the entity is not sanctioned.
fn evidence_check(entity: &Entity, evidence: &EvidenceSet) -> ValidationCheck {
    let sources = evidence.registry.is_some() as usize
        + evidence.news.is_some() as usize
        + evidence.sanctions.is_some() as usize;
    let passed = sources > 0 && evidence.has_corporate_records() && !evidence.is_sanctioned();
    ValidationCheck {
        check_type: "evidence".to_string(),
        passed,
        detail: format!(
            "{sources} source(s) for '{}', records={}, sanctioned={}",
            entity.name,
            evidence.has_corporate_records(),
            evidence.is_sanctioned()
        ),
    }
}

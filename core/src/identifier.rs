//! Identifier Extractor — scans transaction text for structured
//! identifiers: tax IDs, registration numbers, SWIFT/BIC codes, IBANs.
//!
//! Tax-ID and registration patterns run over every string-valued field
//! of a transaction; SWIFT/BIC and IBAN only over the named free-text
//! fields (reference, description, memo, notes), where they actually
//! occur and false positives stay manageable.

use crate::{normalizer::Transaction, types::IdentifierKind};
use regex::Regex;

/// Free-text fields scanned for financial-institution codes.
const FREE_TEXT_FIELDS: [&str; 4] = ["reference", "description", "memo", "notes"];

pub struct IdentifierExtractor {
    tax_id_patterns: Vec<Regex>,
    registration_patterns: Vec<Regex>,
    swift_pattern: Regex,
    iban_pattern: Regex,
}

impl IdentifierExtractor {
    pub fn new() -> Self {
        // The patterns are fixed; a failure to compile is a programming
        // error caught by the unit tests, not a runtime condition.
        Self {
            tax_id_patterns: vec![
                // US EIN: NN-NNNNNNN
                Regex::new(r"\b(\d{2}-\d{7})\b").unwrap(),
                // VAT: 2-letter country code + 8-12 digits
                Regex::new(r"\b([A-Z]{2}\d{8,12})\b").unwrap(),
            ],
            registration_patterns: vec![
                Regex::new(r"\bReg\.?\s*No\.?[:# ]\s*([A-Z0-9]{5,15})\b").unwrap(),
                Regex::new(r"\bRegistration\s*[:# ]\s*([A-Z0-9]{5,15})\b").unwrap(),
            ],
            swift_pattern: Regex::new(r"\b([A-Z]{6}[A-Z0-9]{2}(?:[A-Z0-9]{3})?)\b").unwrap(),
            iban_pattern: Regex::new(r"\b([A-Z]{2}\d{2}[A-Z0-9]{4}[A-Z0-9]{8,})\b").unwrap(),
        }
    }

    /// All identifiers found in one transaction, in encounter order,
    /// duplicates included (the entity dedups on attach).
    pub fn extract(&self, tx: &Transaction) -> Vec<(IdentifierKind, String)> {
        let mut found = Vec::new();

        for text in string_fields(tx) {
            for pattern in &self.tax_id_patterns {
                for capture in pattern.captures_iter(text) {
                    found.push((IdentifierKind::TaxId, capture[1].to_string()));
                }
            }
            for pattern in &self.registration_patterns {
                for capture in pattern.captures_iter(text) {
                    found.push((IdentifierKind::Registration, capture[1].to_string()));
                }
            }
        }

        for field in FREE_TEXT_FIELDS {
            let Some(text) = tx.raw_text(field) else { continue };
            for capture in self.swift_pattern.captures_iter(text) {
                found.push((IdentifierKind::SwiftBic, capture[1].to_string()));
            }
            for capture in self.iban_pattern.captures_iter(text) {
                found.push((IdentifierKind::Iban, capture[1].to_string()));
            }
        }

        found
    }

    /// Pick the primary identifier: lowest priority number wins, ties
    /// broken by first-encountered order within the same tier.
    pub fn primary(identifiers: &[(IdentifierKind, String)]) -> Option<String> {
        identifiers
            .iter()
            .enumerate()
            .min_by_key(|(position, (kind, _))| (kind.priority(), *position))
            .map(|(_, (_, value))| value.clone())
    }
}

impl Default for IdentifierExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Every string-valued field of the transaction, canonical and raw.
fn string_fields(tx: &Transaction) -> impl Iterator<Item = &str> {
    [
        tx.id.as_str(),
        tx.sender.as_str(),
        tx.receiver.as_str(),
        tx.currency.as_str(),
        tx.tx_type.as_str(),
    ]
    .into_iter()
    .chain(tx.raw_fields.values().filter_map(|v| v.as_str()))
}

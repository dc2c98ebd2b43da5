//! Entity Extractor — derives the deduplicated entity set from a batch
//! of normalized transactions.
//!
//! For every transaction's non-empty sender and receiver:
//!   1. Get-or-create an entity keyed by the exact trimmed name.
//!   2. Accumulate transaction count, directional volume,
//!      counterparties, and countries.
//!   3. Attach identifiers found in the transaction text.
//! Type inference runs once the whole batch is accumulated, because the
//! shell-company rule depends on aggregate topology.

use crate::{
    config::AnalysisConfig,
    identifier::IdentifierExtractor,
    normalizer::Transaction,
    types::{EntityType, IdentifierKind},
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Names this short are noise (initials, stray separators), not parties.
const MIN_NAME_LEN: usize = 2;

/// A named participant inferred from transaction sender/receiver fields.
/// Finalized once per batch; all collections are sorted or in
/// first-encountered order so output is deterministic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub name: String,
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    /// (kind, value) pairs in first-encountered order, deduplicated.
    pub identifiers: Vec<(IdentifierKind, String)>,
    pub primary_identifier: Option<String>,
    pub transaction_count: usize,
    pub total_volume_sent: f64,
    pub total_volume_received: f64,
    pub counterparties: Vec<String>,
    pub countries: Vec<String>,
}

/// Working state for one entity while the batch accumulates.
#[derive(Debug, Default)]
struct EntityBuilder {
    identifiers: Vec<(IdentifierKind, String)>,
    transaction_count: usize,
    total_volume_sent: f64,
    total_volume_received: f64,
    counterparties: BTreeSet<String>,
    countries: BTreeSet<String>,
}

pub struct EntityExtractor {
    config: AnalysisConfig,
    /// Two-capitalized-word personal-name pattern.
    personal_name: Regex,
}

impl EntityExtractor {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            config: config.clone(),
            personal_name: Regex::new(r"^[A-Z][a-z]+ [A-Z][a-z]+$").unwrap(),
        }
    }

    /// Extract the entity set from a batch. Returns the entities,
    /// ordered by activity (transaction count descending, then name),
    /// plus the number of party references skipped as unusable.
    pub fn extract(
        &self,
        transactions: &[Transaction],
        identifiers: &IdentifierExtractor,
    ) -> (Vec<Entity>, usize) {
        let mut builders: BTreeMap<String, EntityBuilder> = BTreeMap::new();
        let mut skipped = 0usize;

        for tx in transactions {
            let sender = usable_name(&tx.sender);
            let receiver = usable_name(&tx.receiver);
            let country = tx.raw_text("country").map(|c| c.trim().to_string());
            let found_ids = identifiers.extract(tx);

            // Non-empty but unusable party references count as skipped;
            // an absent party is just a one-sided record.
            for raw in [&tx.sender, &tx.receiver] {
                let trimmed = raw.trim();
                if !trimmed.is_empty() && trimmed.len() < MIN_NAME_LEN {
                    skipped += 1;
                }
            }

            if let Some(name) = &sender {
                let builder = builders.entry(name.clone()).or_default();
                builder.transaction_count += 1;
                builder.total_volume_sent += tx.amount;
                if let Some(other) = &receiver {
                    if other != name {
                        builder.counterparties.insert(other.clone());
                    }
                }
                if let Some(c) = &country {
                    if !c.is_empty() {
                        builder.countries.insert(c.clone());
                    }
                }
                attach_identifiers(builder, &found_ids);
            }

            if let Some(name) = &receiver {
                let builder = builders.entry(name.clone()).or_default();
                builder.transaction_count += 1;
                builder.total_volume_received += tx.amount;
                if let Some(other) = &sender {
                    if other != name {
                        builder.counterparties.insert(other.clone());
                    }
                }
                if let Some(c) = &country {
                    if !c.is_empty() {
                        builder.countries.insert(c.clone());
                    }
                }
                attach_identifiers(builder, &found_ids);
            }
        }

        let mut entities: Vec<Entity> = builders
            .into_iter()
            .map(|(name, builder)| self.finalize(name, builder))
            .collect();

        entities.sort_by(|a, b| {
            b.transaction_count
                .cmp(&a.transaction_count)
                .then_with(|| a.name.cmp(&b.name))
        });

        (entities, skipped)
    }

    fn finalize(&self, name: String, builder: EntityBuilder) -> Entity {
        let entity_type = self.guess_entity_type(
            &name,
            builder.transaction_count,
            builder.counterparties.len(),
        );
        let primary_identifier = IdentifierExtractor::primary(&builder.identifiers);

        Entity {
            name,
            entity_type,
            primary_identifier,
            identifiers: builder.identifiers,
            transaction_count: builder.transaction_count,
            total_volume_sent: builder.total_volume_sent,
            total_volume_received: builder.total_volume_received,
            counterparties: builder.counterparties.into_iter().collect(),
            countries: builder.countries.into_iter().collect(),
        }
    }

    /// Rule-based type inference. Rules are walked in table order; the
    /// first match wins, so non-profit and financial keywords take
    /// precedence over the shell test, which needs both a keyword match
    /// and the topology condition.
    pub fn guess_entity_type(
        &self,
        name: &str,
        transaction_count: usize,
        counterparty_count: usize,
    ) -> EntityType {
        let name_lower = name.to_lowercase();

        for rule in &self.config.type_rules {
            let keyword_match = rule.keywords.iter().any(|k| name_lower.contains(k.as_str()));
            if !keyword_match {
                continue;
            }
            if rule.entity_type == EntityType::ShellCompany {
                // Name alone is insufficient: high activity with few
                // counterparties is what makes the funnel.
                if transaction_count > self.config.shell_min_transactions
                    && counterparty_count < self.config.shell_max_counterparties
                {
                    return EntityType::ShellCompany;
                }
                continue;
            }
            return rule.entity_type;
        }

        // Corporate keywords match on whole words: "co" must not swallow
        // "Consulting". A corporate suffix also disqualifies the
        // personal-name rule below, so "Alpha Inc" stays a corporation.
        let words: Vec<&str> = name_lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();
        let corporate = self
            .config
            .corporate_keywords
            .iter()
            .any(|k| words.contains(&k.as_str()));

        if !corporate && (self.personal_name.is_match(name) || name.contains(',')) {
            return EntityType::Individual;
        }
        if corporate {
            return EntityType::Corporation;
        }

        if name.chars().any(|c| c.is_ascii_digit()) || words.len() >= 2 {
            EntityType::Corporation
        } else {
            EntityType::Unknown
        }
    }
}

fn usable_name(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (trimmed.len() >= MIN_NAME_LEN).then(|| trimmed.to_string())
}

fn attach_identifiers(builder: &mut EntityBuilder, found: &[(IdentifierKind, String)]) {
    for pair in found {
        if !builder.identifiers.contains(pair) {
            builder.identifiers.push(pair.clone());
        }
    }
}

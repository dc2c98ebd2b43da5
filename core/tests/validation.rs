//! Entity-validator tests: layered checks, the 70% rule, confidence.

use entity_risk_core::entity_extractor::Entity;
use entity_risk_core::evidence::{EvidenceSet, RegistryEvidence, SanctionsEvidence};
use entity_risk_core::types::EntityType;
use entity_risk_core::validator::EntityValidator;

fn entity(name: &str, entity_type: EntityType) -> Entity {
    Entity {
        name: name.to_string(),
        entity_type,
        identifiers: Vec::new(),
        primary_identifier: None,
        transaction_count: 5,
        total_volume_sent: 1000.0,
        total_volume_received: 900.0,
        counterparties: vec!["Partner Alpha Corp".into()],
        countries: Vec::new(),
    }
}

/// A sound corporation passes both layers with full confidence.
#[test]
fn clean_entity_is_valid() {
    let report = EntityValidator::new().validate(
        &entity("Acme Manufacturing Ltd", EntityType::Corporation),
        None,
    );

    assert!(report.is_valid, "Expected valid, got {:?}", report.checks);
    assert_eq!(report.checks.len(), 2, "Basic and extended should both run");
    assert_eq!(report.confidence_score, 1.0);
}

/// An unknown type without a well-formed identifier fails basic, and the
/// extended layer never runs.
#[test]
fn failed_basic_stops_the_chain() {
    let report =
        EntityValidator::new().validate(&entity("Somethingorother", EntityType::Unknown), None);

    assert!(!report.is_valid);
    assert_eq!(report.checks.len(), 1, "Extended must not run after a basic failure");
    assert!(!report.checks[0].passed);
    assert_eq!(report.confidence_score, 0.0);
}

/// A valid identifier stands in for a recognized entity type.
#[test]
fn identifier_rescues_unknown_type() {
    let mut subject = entity("Somethingorother", EntityType::Unknown);
    subject.primary_identifier = Some("ABC1234".into());

    let report = EntityValidator::new().validate(&subject, None);
    assert!(
        report.checks[0].passed,
        "Generic identifier should rescue the basic check: {:?}",
        report.checks[0]
    );
}

/// Generic short names and one-sided flows trip the extended layer; the
/// 70% rule then marks the entity invalid at 1 of 2 checks.
#[test]
fn suspicious_extended_profile_fails_seventy_percent_rule() {
    let mut subject = entity("Global Holdings", EntityType::Corporation);
    subject.total_volume_sent = 100_000.0;
    subject.total_volume_received = 0.0;

    let report = EntityValidator::new().validate(&subject, None);
    assert_eq!(report.checks.len(), 2);
    assert!(report.checks[0].passed, "Basic should still pass");
    assert!(!report.checks[1].passed, "Extended should flag the profile");
    assert!(!report.is_valid, "1/2 checks is below the 70% bar");
    assert_eq!(report.confidence_score, 0.5);
}

/// With evidence supplied, the third layer runs and sanctions fail it.
#[test]
fn evidence_layer_counts_toward_confidence() {
    let validator = EntityValidator::new();
    let subject = entity("Acme Manufacturing Ltd", EntityType::Corporation);

    let clean = EvidenceSet {
        registry: Some(RegistryEvidence {
            total_count: 1,
            matches: Vec::new(),
            reliability: Some(0.9),
        }),
        ..EvidenceSet::default()
    };
    let report = validator.validate(&subject, Some(&clean));
    assert_eq!(report.checks.len(), 3);
    assert!(report.is_valid);
    assert_eq!(report.confidence_score, 1.0);

    let sanctioned = EvidenceSet {
        sanctions: Some(SanctionsEvidence {
            is_sanctioned: true,
            matches: vec!["Acme Manufacturing Ltd".into()],
            reliability: Some(0.95),
        }),
        ..EvidenceSet::default()
    };
    let report = validator.validate(&subject, Some(&sanctioned));
    assert_eq!(report.checks.len(), 3);
    assert!(!report.checks[2].passed, "Sanctions evidence must fail the layer");
    assert!(!report.is_valid, "2/3 checks is below the 70% bar");
    assert!((report.confidence_score - 0.67).abs() < 1e-9);
}

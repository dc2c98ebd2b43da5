//! Transaction Normalizer — first stage of the pipeline.
//!
//! Maps loosely-structured records (field name -> JSON value) onto the
//! canonical transaction schema:
//!   1. Field-name variants resolve through the config synonym table.
//!   2. Amounts coerce to non-negative floats, stripping currency
//!      symbols and thousands separators.
//!   3. Timestamps try an ordered format list, falling back to "now".
//!   4. Missing transaction IDs synthesize as TX-{seq:06}.
//!   5. Unmapped fields are preserved verbatim in raw_fields.
//!
//! A single malformed record never fails the batch: malformed fields
//! degrade to defaults and surface as typed warnings.

use crate::{
    config::AnalysisConfig,
    error::{AnalysisError, AnalysisResult},
};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const DEFAULT_CURRENCY: &str = "USD";
const DEFAULT_TYPE: &str = "unknown";

/// A raw input record as handed over by the (excluded) upload layer.
pub type RawRecord = BTreeMap<String, serde_json::Value>;

/// Canonical transaction. Immutable once normalized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub sender: String,
    pub receiver: String,
    pub amount: f64,
    pub currency: String,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub tx_type: String,
    /// Unmapped input fields, preserved under their original names so no
    /// information is silently dropped.
    pub raw_fields: BTreeMap<String, serde_json::Value>,
}

impl Transaction {
    /// Free-text value of a named raw field, if present and a string.
    pub fn raw_text(&self, field: &str) -> Option<&str> {
        self.raw_fields.get(field).and_then(|v| v.as_str())
    }
}

/// A recoverable defect in a single record. The record is still emitted
/// with a safe default in place of the malformed field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizeWarning {
    pub record_index: usize,
    pub field: String,
    pub value: String,
    pub message: String,
}

/// Output of a normalization run: best-effort transactions plus the
/// warnings accumulated along the way.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedBatch {
    pub transactions: Vec<Transaction>,
    pub warnings: Vec<NormalizeWarning>,
}

pub struct Normalizer {
    synonyms: Vec<(String, Vec<String>)>,
    timestamp_formats: Vec<String>,
}

impl Normalizer {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            synonyms: config
                .field_synonyms
                .iter()
                .map(|s| (s.canonical.clone(), s.variants.clone()))
                .collect(),
            timestamp_formats: config.timestamp_formats.clone(),
        }
    }

    /// Interpret a decoded JSON document as a list of raw records.
    ///
    /// Accepted shapes: an array of objects, an object wrapping such an
    /// array under any key, or a single object (treated as one record).
    /// Anything else is a fatal UnsupportedFormat — distinct from
    /// per-record malformation, which never aborts a batch.
    pub fn records_from_value(value: &serde_json::Value) -> AnalysisResult<Vec<RawRecord>> {
        match value {
            serde_json::Value::Array(items) => {
                let records: Vec<RawRecord> = items.iter().filter_map(object_to_record).collect();
                if records.is_empty() && !items.is_empty() {
                    return Err(AnalysisError::UnsupportedFormat {
                        detail: "array contains no record objects".into(),
                    });
                }
                Ok(records)
            }
            serde_json::Value::Object(map) => {
                // An object wrapping a record list under some key.
                for inner in map.values() {
                    if let serde_json::Value::Array(items) = inner {
                        if items.iter().any(|i| i.is_object()) {
                            return Ok(items.iter().filter_map(object_to_record).collect());
                        }
                    }
                }
                // A single record.
                Ok(object_to_record(value).into_iter().collect())
            }
            other => Err(AnalysisError::UnsupportedFormat {
                detail: format!("expected a record list, got JSON {}", json_kind(other)),
            }),
        }
    }

    /// Normalize a batch. Never fails on a single malformed record.
    pub fn normalize(&self, records: &[RawRecord]) -> NormalizedBatch {
        let mut transactions = Vec::with_capacity(records.len());
        let mut warnings = Vec::new();

        for (index, record) in records.iter().enumerate() {
            transactions.push(self.normalize_record(index, record, &mut warnings));
        }

        if !warnings.is_empty() {
            log::warn!(
                "Normalized {} records with {} degraded fields",
                records.len(),
                warnings.len()
            );
        }

        NormalizedBatch { transactions, warnings }
    }

    fn normalize_record(
        &self,
        index: usize,
        record: &RawRecord,
        warnings: &mut Vec<NormalizeWarning>,
    ) -> Transaction {
        let mut mapped: BTreeMap<&str, &serde_json::Value> = BTreeMap::new();
        let mut consumed: Vec<&str> = Vec::new();

        for (canonical, variants) in &self.synonyms {
            for variant in variants {
                if let Some((key, value)) = record.get_key_value(variant.as_str()) {
                    mapped.insert(canonical.as_str(), value);
                    consumed.push(key.as_str());
                    break;
                }
            }
        }

        let id = mapped
            .get("transaction_id")
            .and_then(|v| value_to_text(v))
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| format!("TX-{index:06}"));

        let sender = mapped
            .get("sender")
            .and_then(|v| value_to_text(v))
            .map(|s| s.trim().to_string())
            .unwrap_or_default();
        let receiver = mapped
            .get("receiver")
            .and_then(|v| value_to_text(v))
            .map(|s| s.trim().to_string())
            .unwrap_or_default();

        let amount = match mapped.get("amount") {
            Some(value) => self.coerce_amount(index, value, warnings),
            None => 0.0,
        };

        let timestamp = match mapped.get("timestamp") {
            Some(value) => self.coerce_timestamp(index, value, warnings),
            None => Utc::now(),
        };

        let currency = mapped
            .get("currency")
            .and_then(|v| value_to_text(v))
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_CURRENCY.into());

        let tx_type = mapped
            .get("type")
            .and_then(|v| value_to_text(v))
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_TYPE.into());

        // Everything not consumed by the synonym table is preserved.
        let raw_fields: BTreeMap<String, serde_json::Value> = record
            .iter()
            .filter(|(key, _)| !consumed.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        Transaction {
            id,
            sender,
            receiver,
            amount,
            currency,
            timestamp,
            tx_type,
            raw_fields,
        }
    }

    /// Coerce an amount value to a non-negative float. Strings lose
    /// currency symbols and thousands separators first. On failure the
    /// record keeps going with 0.0 and a warning.
    fn coerce_amount(
        &self,
        index: usize,
        value: &serde_json::Value,
        warnings: &mut Vec<NormalizeWarning>,
    ) -> f64 {
        let parsed = match value {
            serde_json::Value::Number(n) => n.as_f64(),
            serde_json::Value::String(s) => {
                let cleaned: String = s
                    .replace(',', "")
                    .chars()
                    .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
                    .collect();
                cleaned.parse::<f64>().ok()
            }
            _ => None,
        };

        match parsed {
            Some(v) if v >= 0.0 && v.is_finite() => v,
            Some(v) => {
                warnings.push(NormalizeWarning {
                    record_index: index,
                    field: "amount".into(),
                    value: value.to_string(),
                    message: format!("amount {v} is not a non-negative finite number, defaulting to 0.0"),
                });
                0.0
            }
            None => {
                warnings.push(NormalizeWarning {
                    record_index: index,
                    field: "amount".into(),
                    value: value.to_string(),
                    message: "unparseable amount, defaulting to 0.0".into(),
                });
                0.0
            }
        }
    }

    /// Parse a timestamp through the ordered format list, then RFC 3339,
    /// falling back to the current time.
    fn coerce_timestamp(
        &self,
        index: usize,
        value: &serde_json::Value,
        warnings: &mut Vec<NormalizeWarning>,
    ) -> DateTime<Utc> {
        let Some(text) = value_to_text(value) else {
            warnings.push(NormalizeWarning {
                record_index: index,
                field: "timestamp".into(),
                value: value.to_string(),
                message: "timestamp is not text, falling back to now".into(),
            });
            return Utc::now();
        };

        if let Some(parsed) = self.parse_timestamp(&text) {
            return parsed;
        }

        warnings.push(NormalizeWarning {
            record_index: index,
            field: "timestamp".into(),
            value: text,
            message: "no timestamp format matched, falling back to now".into(),
        });
        Utc::now()
    }

    fn parse_timestamp(&self, text: &str) -> Option<DateTime<Utc>> {
        let text = text.trim();
        for format in &self.timestamp_formats {
            if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
                return Some(dt.and_utc());
            }
            if let Ok(date) = NaiveDate::parse_from_str(text, format) {
                return Some(date.and_hms_opt(0, 0, 0)?.and_utc());
            }
        }
        DateTime::parse_from_rfc3339(text)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

fn object_to_record(value: &serde_json::Value) -> Option<RawRecord> {
    value.as_object().map(|map| {
        map.iter()
            .map(|(key, value)| (key.trim().to_string(), value.clone()))
            .collect()
    })
}

/// Text rendering used for name/id/currency fields: strings pass through,
/// numbers render, everything else is unusable.
fn value_to_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

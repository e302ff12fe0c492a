//! Record processor
//!
//! Decides whether a record carries PII and produces its redacted copy.
//! Processing is pure: the input record is never mutated and no state is
//! kept between records.

use tracing::trace;

use crate::classifier::{FieldClassifier, FieldKind};
use crate::record::{value_to_text, Record};

/// Outcome of analysing one record
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PiiDecision {
    /// Whether the record is PII-bearing
    pub is_pii: bool,
    /// Standalone fields whose pattern matched, in record order
    pub standalone: Vec<String>,
    /// Quasi-identifiers that counted toward the threshold, in table order.
    /// Empty unless the threshold was reached.
    pub combinatorial: Vec<String>,
}

impl PiiDecision {
    /// Fields to redact: standalone matches followed by quasi-identifiers
    pub fn redact_set(&self) -> impl Iterator<Item = &str> {
        self.standalone
            .iter()
            .chain(self.combinatorial.iter())
            .map(String::as_str)
    }
}

/// Applies a [`FieldClassifier`] to records
#[derive(Debug, Clone, Copy)]
pub struct RecordProcessor<'a> {
    classifier: &'a FieldClassifier,
}

impl RecordProcessor<'static> {
    /// Processor over the builtin field table
    pub fn builtin() -> Self {
        Self::new(FieldClassifier::builtin())
    }
}

impl Default for RecordProcessor<'static> {
    fn default() -> Self {
        Self::builtin()
    }
}

impl<'a> RecordProcessor<'a> {
    pub fn new(classifier: &'a FieldClassifier) -> Self {
        Self { classifier }
    }

    /// Decide whether a record is PII-bearing and which fields to redact
    pub fn analyze(&self, record: &Record) -> PiiDecision {
        let standalone: Vec<String> = record
            .iter()
            .filter(|(key, value)| self.classifier.matches_standalone(key, value))
            .map(|(key, _)| key.clone())
            .collect();

        let present = self.classifier.combinatorial_present(record);
        let threshold = self.classifier.combinatorial_threshold();
        let combinatorial: Vec<String> = if present.len() >= threshold {
            present.iter().map(|(name, _)| name.to_string()).collect()
        } else {
            Vec::new()
        };

        let is_pii = !standalone.is_empty() || !combinatorial.is_empty();
        if is_pii {
            trace!(
                standalone = ?standalone,
                combinatorial = ?combinatorial,
                "Record flagged as PII"
            );
        }

        PiiDecision {
            is_pii,
            standalone,
            combinatorial,
        }
    }

    /// Classify a record and return its redacted copy with the PII flag.
    ///
    /// When the record is not PII-bearing the copy equals the input.
    pub fn classify_and_redact(&self, record: &Record) -> (Record, bool) {
        let decision = self.analyze(record);
        if !decision.is_pii {
            return (record.clone(), false);
        }

        let mut redacted = record.clone();
        for name in decision.redact_set() {
            let Some(kind) = self.classifier.lookup(name) else {
                continue;
            };
            if let Some(value) = redacted.get_mut(name) {
                trace!(
                    field = name,
                    kind = %kind,
                    strategy = %kind.strategy(),
                    "Redacting field"
                );
                *value = serde_json::Value::String(redact_value(kind, value));
            }
        }

        (redacted, true)
    }
}

fn redact_value(kind: FieldKind, value: &serde_json::Value) -> String {
    kind.redact(&value_to_text(value))
}

/// Classify and redact with the builtin field table
pub fn classify_and_redact(record: &Record) -> (Record, bool) {
    RecordProcessor::builtin().classify_and_redact(record)
}

//! Field classifier
//!
//! Binds record field names to either a standalone pattern (the value alone
//! identifies a person) or to the quasi-identifier set (identifying only in
//! combination). The table is immutable once built; the builtin table is
//! compiled once per process.

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::OnceLock;

use crate::error::{PiiError, Result};
use crate::record::{is_truthy, split_tokens, value_to_text, Record};
use crate::redaction::RedactionStrategy;

/// Minimum number of co-occurring quasi-identifiers that makes a record PII
pub const DEFAULT_COMBINATORIAL_THRESHOLD: usize = 2;

/// Ten consecutive digits, not part of a longer run
pub const PHONE_PATTERN: &str = r"\b\d{10}\b";

/// Twelve digits, contiguous or in three space-separated groups of four
pub const AADHAR_PATTERN: &str = r"\b\d{12}\b|\b\d{4}\s\d{4}\s\d{4}\b";

/// Letter prefix (Q, X and Z excluded) followed by seven digits in either
/// the contiguous or the `d d dddd d` layout
pub const PASSPORT_PATTERN: &str =
    r"\b[A-PR-WYa-pr-wy][1-9]\d\s?\d{4}[1-9]\b|\b[A-PR-WYa-pr-wy]\d{7}\b";

/// Anything shaped like `handle@provider`
pub const UPI_PATTERN: &str = r"[\w.-]+@[\w.-]+";

/// Kind of a recognized field, which fixes how it is redacted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// 10-digit phone-like identifier
    Phone,
    /// 12-digit national ID (Aadhaar)
    NationalId,
    Passport,
    /// UPI payment handle
    PaymentHandle,
    FullName,
    Email,
    Address,
    IpAddress,
    DeviceId,
}

impl FieldKind {
    /// Redaction applied to a confirmed value of this kind
    pub fn strategy(&self) -> RedactionStrategy {
        match self {
            Self::Phone => RedactionStrategy::Phone,
            Self::NationalId => RedactionStrategy::NationalId,
            Self::Passport => RedactionStrategy::Passport,
            Self::PaymentHandle => RedactionStrategy::PaymentHandle,
            Self::FullName => RedactionStrategy::FullName,
            Self::Email => RedactionStrategy::Email,
            Self::Address | Self::IpAddress | Self::DeviceId => RedactionStrategy::Generic,
        }
    }

    /// Redact a value of this kind
    pub fn redact(&self, value: &str) -> String {
        self.strategy().apply(value)
    }
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Phone => write!(f, "phone"),
            Self::NationalId => write!(f, "national_id"),
            Self::Passport => write!(f, "passport"),
            Self::PaymentHandle => write!(f, "payment_handle"),
            Self::FullName => write!(f, "full_name"),
            Self::Email => write!(f, "email"),
            Self::Address => write!(f, "address"),
            Self::IpAddress => write!(f, "ip_address"),
            Self::DeviceId => write!(f, "device_id"),
        }
    }
}

/// Declarative field rule.
///
/// A rule with a `pattern` is standalone; a rule without one joins the
/// combinatorial set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldRule {
    pub name: String,
    pub kind: FieldKind,
    #[serde(default)]
    pub pattern: Option<String>,
}

impl FieldRule {
    /// Field identifying on its own when `pattern` matches
    pub fn standalone(
        name: impl Into<String>,
        kind: FieldKind,
        pattern: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            pattern: Some(pattern.into()),
        }
    }

    /// Quasi-identifying field
    pub fn combinatorial(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            pattern: None,
        }
    }
}

/// Default field rules
pub fn default_field_rules() -> Vec<FieldRule> {
    vec![
        FieldRule::standalone("phone", FieldKind::Phone, PHONE_PATTERN),
        FieldRule::standalone("contact", FieldKind::Phone, PHONE_PATTERN),
        FieldRule::standalone("aadhar", FieldKind::NationalId, AADHAR_PATTERN),
        FieldRule::standalone("passport", FieldKind::Passport, PASSPORT_PATTERN),
        FieldRule::standalone("upi_id", FieldKind::PaymentHandle, UPI_PATTERN),
        FieldRule::combinatorial("name", FieldKind::FullName),
        FieldRule::combinatorial("email", FieldKind::Email),
        FieldRule::combinatorial("address", FieldKind::Address),
        FieldRule::combinatorial("ip_address", FieldKind::IpAddress),
        FieldRule::combinatorial("device_id", FieldKind::DeviceId),
    ]
}

#[derive(Debug)]
enum Binding {
    Standalone(Regex),
    Combinatorial,
}

#[derive(Debug)]
struct CompiledField {
    name: String,
    kind: FieldKind,
    binding: Binding,
}

/// Compiled, read-only field table
#[derive(Debug)]
pub struct FieldClassifier {
    fields: Vec<CompiledField>,
    threshold: usize,
}

impl FieldClassifier {
    /// Compile a rule table.
    ///
    /// Fails on an invalid pattern or a field name bound twice.
    pub fn new(rules: &[FieldRule]) -> Result<Self> {
        let mut fields: Vec<CompiledField> = Vec::with_capacity(rules.len());
        for rule in rules {
            if fields.iter().any(|f| f.name == rule.name) {
                return Err(PiiError::Config(format!(
                    "field '{}' is bound more than once",
                    rule.name
                )));
            }
            let binding = match &rule.pattern {
                Some(pattern) => {
                    let regex = Regex::new(pattern).map_err(|e| PiiError::InvalidPattern {
                        field: rule.name.clone(),
                        reason: e.to_string(),
                    })?;
                    Binding::Standalone(regex)
                }
                None => Binding::Combinatorial,
            };
            fields.push(CompiledField {
                name: rule.name.clone(),
                kind: rule.kind,
                binding,
            });
        }

        Ok(Self {
            fields,
            threshold: DEFAULT_COMBINATORIAL_THRESHOLD,
        })
    }

    /// Override how many quasi-identifiers must co-occur
    pub fn with_threshold(mut self, threshold: usize) -> Result<Self> {
        if threshold < 2 {
            return Err(PiiError::Config(format!(
                "combinatorial threshold must be at least 2, got {}",
                threshold
            )));
        }
        self.threshold = threshold;
        Ok(self)
    }

    /// Shared instance built from [`default_field_rules`]
    pub fn builtin() -> &'static FieldClassifier {
        static BUILTIN: OnceLock<FieldClassifier> = OnceLock::new();
        BUILTIN.get_or_init(|| {
            FieldClassifier::new(&default_field_rules()).expect("builtin field rules compile")
        })
    }

    /// Kind bound to a field name, if recognized
    pub fn lookup(&self, name: &str) -> Option<FieldKind> {
        self.field(name).map(|f| f.kind)
    }

    /// Whether `name` is a standalone field
    pub fn is_standalone(&self, name: &str) -> bool {
        matches!(
            self.field(name).map(|f| &f.binding),
            Some(Binding::Standalone(_))
        )
    }

    /// Whether a value matches the standalone pattern bound to `name`.
    ///
    /// Matching is a substring search. Non-string values, combinatorial
    /// fields and unknown names never match.
    pub fn matches_standalone(&self, name: &str, value: &Value) -> bool {
        let Value::String(text) = value else {
            return false;
        };
        match self.field(name).map(|f| &f.binding) {
            Some(Binding::Standalone(regex)) => regex.is_match(text),
            _ => false,
        }
    }

    /// Quasi-identifiers present in a record, in table order.
    ///
    /// A field counts when its key is present with a truthy value. A full
    /// name counts only with two or more whitespace-separated tokens.
    pub fn combinatorial_present(&self, record: &Record) -> Vec<(&str, FieldKind)> {
        self.fields
            .iter()
            .filter(|f| matches!(f.binding, Binding::Combinatorial))
            .filter(|f| match record.get(&f.name) {
                Some(value) if is_truthy(value) => {
                    f.kind != FieldKind::FullName
                        || split_tokens(&value_to_text(value)).count() >= 2
                }
                _ => false,
            })
            .map(|f| (f.name.as_str(), f.kind))
            .collect()
    }

    /// Number of co-occurring quasi-identifiers that makes a record PII
    pub fn combinatorial_threshold(&self) -> usize {
        self.threshold
    }

    fn field(&self, name: &str) -> Option<&CompiledField> {
        self.fields.iter().find(|f| f.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn classifier() -> &'static FieldClassifier {
        FieldClassifier::builtin()
    }

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn names(present: Vec<(&str, FieldKind)>) -> Vec<String> {
        present.into_iter().map(|(n, _)| n.to_string()).collect()
    }

    #[test]
    fn test_builtin_table() {
        let c = classifier();
        assert_eq!(c.lookup("phone"), Some(FieldKind::Phone));
        assert_eq!(c.lookup("contact"), Some(FieldKind::Phone));
        assert_eq!(c.lookup("aadhar"), Some(FieldKind::NationalId));
        assert_eq!(c.lookup("upi_id"), Some(FieldKind::PaymentHandle));
        assert_eq!(c.lookup("device_id"), Some(FieldKind::DeviceId));
        assert_eq!(c.lookup("city"), None);
        assert!(c.is_standalone("passport"));
        assert!(!c.is_standalone("email"));
        assert_eq!(c.combinatorial_threshold(), 2);
    }

    #[test]
    fn test_phone_pattern_boundaries() {
        let c = classifier();
        assert!(c.matches_standalone("phone", &json!("9876543210")));
        assert!(c.matches_standalone("phone", &json!("call me on 9876543210 today")));
        assert!(c.matches_standalone("contact", &json!("+91 9876543210")));
        assert!(!c.matches_standalone("phone", &json!("987654321")));
        assert!(!c.matches_standalone("phone", &json!("98765432101")));
        assert!(!c.matches_standalone("phone", &json!("98765-43210")));
    }

    #[test]
    fn test_aadhar_pattern() {
        let c = classifier();
        assert!(c.matches_standalone("aadhar", &json!("123456789012")));
        assert!(c.matches_standalone("aadhar", &json!("1234 5678 9012")));
        assert!(!c.matches_standalone("aadhar", &json!("12345678901")));
        assert!(!c.matches_standalone("aadhar", &json!("1234-5678-9012")));
        assert!(!c.matches_standalone("aadhar", &json!("1234567890123")));
    }

    #[test]
    fn test_passport_pattern() {
        let c = classifier();
        assert!(c.matches_standalone("passport", &json!("P1234567")));
        assert!(c.matches_standalone("passport", &json!("p1234567")));
        assert!(c.matches_standalone("passport", &json!("A12 34567")));
        assert!(!c.matches_standalone("passport", &json!("Q1234567")));
        assert!(!c.matches_standalone("passport", &json!("X1234567")));
        assert!(!c.matches_standalone("passport", &json!("P123456")));
    }

    #[test]
    fn test_upi_pattern_is_broad() {
        let c = classifier();
        assert!(c.matches_standalone("upi_id", &json!("user@ybl")));
        assert!(c.matches_standalone("upi_id", &json!("first.last@okhdfc")));
        assert!(!c.matches_standalone("upi_id", &json!("user at ybl")));
    }

    #[test]
    fn test_classification_is_by_field_name() {
        let c = classifier();
        // same shape, different binding
        assert!(!c.matches_standalone("email", &json!("user@ybl")));
        assert!(!c.matches_standalone("notes", &json!("9876543210")));
        assert!(!c.matches_standalone("name", &json!("9876543210")));
    }

    #[test]
    fn test_non_string_values_never_match() {
        let c = classifier();
        assert!(!c.matches_standalone("phone", &json!(9876543210u64)));
        assert!(!c.matches_standalone("aadhar", &json!(123456789012u64)));
        assert!(!c.matches_standalone("phone", &Value::Null));
    }

    #[test]
    fn test_combinatorial_present_order_and_truthiness() {
        let c = classifier();
        let r = record(json!({
            "device_id": "D-1",
            "email": "a@b.com",
            "address": "",
            "ip_address": null,
            "city": "Pune"
        }));
        assert_eq!(names(c.combinatorial_present(&r)), vec!["email", "device_id"]);
    }

    #[test]
    fn test_single_token_name_does_not_count() {
        let c = classifier();
        let r = record(json!({"name": "Jane", "email": "jane@example.com"}));
        assert_eq!(names(c.combinatorial_present(&r)), vec!["email"]);

        let r = record(json!({"name": "Jane Doe", "email": "jane@example.com"}));
        assert_eq!(names(c.combinatorial_present(&r)), vec!["name", "email"]);
    }

    #[test]
    fn test_name_tokens_follow_text_coercion() {
        let c = classifier();
        let r = record(json!({"name": "Jane\u{1f}Doe", "email": "x@y.com"}));
        assert_eq!(names(c.combinatorial_present(&r)), vec!["name", "email"]);

        // the newline is escaped inside the repr, leaving one token
        let r = record(json!({"name": ["Jane\nDoe"], "email": "x@y.com"}));
        assert_eq!(names(c.combinatorial_present(&r)), vec!["email"]);
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(FieldKind::PaymentHandle.to_string(), "payment_handle");
        assert_eq!(FieldKind::IpAddress.to_string(), "ip_address");
    }

    #[test]
    fn test_custom_table() {
        let rules = vec![
            FieldRule::standalone("mobile", FieldKind::Phone, PHONE_PATTERN),
            FieldRule::combinatorial("full_name", FieldKind::FullName),
            FieldRule::combinatorial("home", FieldKind::Address),
        ];
        let c = FieldClassifier::new(&rules).unwrap().with_threshold(3).unwrap();
        assert!(c.matches_standalone("mobile", &json!("9876543210")));
        assert!(!c.matches_standalone("phone", &json!("9876543210")));
        assert_eq!(c.combinatorial_threshold(), 3);
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let rules = vec![FieldRule::standalone("phone", FieldKind::Phone, r"\d{10")];
        let err = FieldClassifier::new(&rules).unwrap_err();
        assert!(matches!(err, PiiError::InvalidPattern { ref field, .. } if field == "phone"));
    }

    #[test]
    fn test_duplicate_field_rejected() {
        let rules = vec![
            FieldRule::standalone("phone", FieldKind::Phone, PHONE_PATTERN),
            FieldRule::combinatorial("phone", FieldKind::Phone),
        ];
        assert!(matches!(
            FieldClassifier::new(&rules),
            Err(PiiError::Config(_))
        ));
    }

    #[test]
    fn test_threshold_below_two_rejected() {
        let c = FieldClassifier::new(&default_field_rules()).unwrap();
        assert!(c.with_threshold(1).is_err());
    }

    #[test]
    fn test_rules_deserialize() {
        let rules: Vec<FieldRule> = serde_json::from_str(
            r#"[{"name": "mobile", "kind": "phone", "pattern": "\\b\\d{10}\\b"},
                {"name": "home", "kind": "address"}]"#,
        )
        .unwrap();
        assert_eq!(rules[0].kind, FieldKind::Phone);
        assert!(rules[1].pattern.is_none());
    }
}

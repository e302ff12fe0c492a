//! # a3s-pii
//!
//! Field-level PII classification and redaction for batch record datasets.
//!
//! ## Overview
//!
//! A record is a flat JSON object. `a3s-pii` decides whether a record
//! carries personally identifiable information and, if it does, returns a
//! copy with the sensitive fields masked. Two rules flag a record:
//!
//! - **Standalone fields** (`phone`, `contact`, `aadhar`, `passport`,
//!   `upi_id`) are PII when their value matches the field's pattern.
//! - **Quasi-identifiers** (`name`, `email`, `address`, `ip_address`,
//!   `device_id`) are PII when at least two are present together. A
//!   `name` counts only when it has two or more words.
//!
//! ## Quick Start
//!
//! ```rust
//! use a3s_pii::classify_and_redact;
//!
//! let record = serde_json::json!({"name": "Jane Doe", "email": "jane.doe@example.com"});
//! let record = record.as_object().cloned().unwrap();
//!
//! let (redacted, is_pii) = classify_and_redact(&record);
//! assert!(is_pii);
//! assert_eq!(redacted["name"], "JXXX DXXX");
//! assert_eq!(redacted["email"], "jaXXX@example.com");
//! ```
//!
//! ## Architecture
//!
//! - **FieldClassifier**: immutable field table (patterns and quasi-identifier set)
//! - **RedactionStrategy**: closed set of per-kind masking transforms
//! - **RecordProcessor**: decision and redaction for one record
//! - **BatchProcessor**: CSV driver that feeds embedded payloads through the processor

pub mod batch;
pub mod classifier;
pub mod config;
pub mod error;
pub mod processor;
pub mod record;
pub mod redaction;

// Re-export core types
pub use batch::{BatchProcessor, BatchSummary, RowOutcome};
pub use classifier::{default_field_rules, FieldClassifier, FieldKind, FieldRule};
pub use config::ScanConfig;
pub use error::{PiiError, Result};
pub use processor::{classify_and_redact, PiiDecision, RecordProcessor};
pub use record::{parse_payload, Record};
pub use redaction::RedactionStrategy;

//! Per-field redaction transforms
//!
//! Every transform is a pure function of one string. Slicing works on
//! Unicode scalar values, so short, empty or non-ASCII input yields a
//! shorter result instead of a panic.

use crate::record::split_tokens;

/// Replacement for fields that must not leak any part of their value
pub const GENERIC_MARKER: &str = "[REDACTED_PII]";

/// Fallback for payment handles that are not `local@domain`
pub const PAYMENT_HANDLE_FALLBACK: &str = "XXXX@XXXX";

/// Fallback for emails that are not `local@domain`
pub const EMAIL_FALLBACK: &str = "XXX@XXXX.com";

/// Masking strategy, one per field kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RedactionStrategy {
    /// Keep the first and last two characters
    Phone,
    /// Strip spaces, keep the last four digits
    NationalId,
    /// Keep the first and last character
    Passport,
    /// Keep two characters of the local part and the whole domain
    PaymentHandle,
    /// Keep the initials of the first and last token
    FullName,
    /// Keep two characters of the local part and the whole domain
    Email,
    /// Replace wholesale with [`GENERIC_MARKER`]
    Generic,
}

impl RedactionStrategy {
    /// Mask a value according to this strategy
    pub fn apply(&self, value: &str) -> String {
        match self {
            Self::Phone => format!("{}XXXXXX{}", head(value, 2), tail(value, 2)),
            Self::NationalId => {
                let digits = value.replace(' ', "");
                format!("XXXXXXXX{}", tail(&digits, 4))
            }
            Self::Passport => format!("{}XXXXXX{}", head(value, 1), tail(value, 1)),
            Self::PaymentHandle => match split_at_sign(value) {
                Some((user, domain)) => format!("{}XXXX@{}", head(user, 2), domain),
                None => PAYMENT_HANDLE_FALLBACK.to_string(),
            },
            Self::FullName => {
                let tokens: Vec<&str> = split_tokens(value).collect();
                match tokens.as_slice() {
                    [first, .., last] => {
                        format!("{}XXX {}XXX", head(first, 1), head(last, 1))
                    }
                    // single token keeps the raw first character
                    _ => format!("{}XXX", head(value, 1)),
                }
            }
            Self::Email => match split_at_sign(value) {
                Some((user, domain)) => format!("{}XXX@{}", head(user, 2), domain),
                None => EMAIL_FALLBACK.to_string(),
            },
            Self::Generic => GENERIC_MARKER.to_string(),
        }
    }
}

impl std::fmt::Display for RedactionStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Phone => write!(f, "phone"),
            Self::NationalId => write!(f, "national_id"),
            Self::Passport => write!(f, "passport"),
            Self::PaymentHandle => write!(f, "payment_handle"),
            Self::FullName => write!(f, "full_name"),
            Self::Email => write!(f, "email"),
            Self::Generic => write!(f, "generic"),
        }
    }
}

/// Split on `@` only when there is exactly one
fn split_at_sign(value: &str) -> Option<(&str, &str)> {
    let mut parts = value.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(user), Some(domain), None) => Some((user, domain)),
        _ => None,
    }
}

fn head(value: &str, n: usize) -> String {
    value.chars().take(n).collect()
}

fn tail(value: &str, n: usize) -> String {
    let len = value.chars().count();
    value.chars().skip(len.saturating_sub(n)).collect()
}

//! Order status enum, shared between the persistence gateway, the order
//! lifecycle engine, and the scoring worker's external accrual responses.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    New,
    Processing,
    Invalid,
    Processed,
}

impl OrderStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Invalid | OrderStatus::Processed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::New => "NEW",
            OrderStatus::Processing => "PROCESSING",
            OrderStatus::Invalid => "INVALID",
            OrderStatus::Processed => "PROCESSED",
        }
    }

    /// Parses a status value from the external accrual service, case-insensitively.
    /// Returns `None` for anything that isn't one of the four canonical statuses;
    /// callers should log and skip such responses rather than fail the poll loop.
    pub fn parse_external(raw: &str) -> Option<Self> {
        match raw.to_uppercase().as_str() {
            "NEW" => Some(OrderStatus::New),
            "PROCESSING" => Some(OrderStatus::Processing),
            "INVALID" => Some(OrderStatus::Invalid),
            "PROCESSED" => Some(OrderStatus::Processed),
            _ => None,
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for OrderStatus {
    /// Used when reading the canonical uppercase value back out of storage;
    /// defensively falls back to `New` rather than panicking on unexpected rows.
    fn from(raw: &str) -> Self {
        Self::parse_external(raw).unwrap_or(OrderStatus::New)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_statuses() {
        assert!(OrderStatus::Invalid.is_terminal());
        assert!(OrderStatus::Processed.is_terminal());
        assert!(!OrderStatus::New.is_terminal());
        assert!(!OrderStatus::Processing.is_terminal());
    }

    #[test]
    fn parses_case_insensitively() {
        assert_eq!(OrderStatus::parse_external("processed"), Some(OrderStatus::Processed));
        assert_eq!(OrderStatus::parse_external("Invalid"), Some(OrderStatus::Invalid));
        assert_eq!(OrderStatus::parse_external("bogus"), None);
    }
}

//! Cart lifecycle status.

use serde::{Deserialize, Serialize};

/// The status of a cart.
///
/// ```text
/// Active ──┬──► Expired      (lazily, on first access after expires_at)
///          └──► CheckedOut   (checkout success)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CartStatus {
    /// Cart accepts mutations.
    #[default]
    Active,

    /// Sliding window elapsed (terminal state).
    Expired,

    /// Converted into an order (terminal state).
    CheckedOut,
}

impl CartStatus {
    /// Returns true if items can be modified in this status.
    pub fn can_mutate(&self) -> bool {
        matches!(self, CartStatus::Active)
    }

    /// Returns true if this is a terminal status.
    pub fn is_terminal(&self) -> bool {
        !self.can_mutate()
    }

    /// Returns the stored status code.
    pub fn as_str(&self) -> &'static str {
        match self {
            CartStatus::Active => "active",
            CartStatus::Expired => "expired",
            CartStatus::CheckedOut => "checked_out",
        }
    }
}

impl std::fmt::Display for CartStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for CartStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(CartStatus::Active),
            "expired" => Ok(CartStatus::Expired),
            "checked_out" => Ok(CartStatus::CheckedOut),
            other => Err(format!("unknown cart status: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_status_is_active() {
        assert_eq!(CartStatus::default(), CartStatus::Active);
    }

    #[test]
    fn test_only_active_can_mutate() {
        assert!(CartStatus::Active.can_mutate());
        assert!(!CartStatus::Expired.can_mutate());
        assert!(!CartStatus::CheckedOut.can_mutate());
    }

    #[test]
    fn test_status_codes_parse_back() {
        for status in [
            CartStatus::Active,
            CartStatus::Expired,
            CartStatus::CheckedOut,
        ] {
            assert_eq!(status.as_str().parse::<CartStatus>().unwrap(), status);
        }
        assert!("abandoned".parse::<CartStatus>().is_err());
    }

    #[test]
    fn test_serializes_snake_case() {
        let json = serde_json::to_string(&CartStatus::CheckedOut).unwrap();
        assert_eq!(json, "\"checked_out\"");
    }
}

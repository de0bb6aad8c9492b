use std::fmt;

use serde::{Deserialize, Serialize};

/// Lowest tier whose raw content must be escrowed before anything is stored.
pub const ESCROW_MIN_TIER: u8 = 3;

/// Five-level privacy sensitivity of a text fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum PrivacyTier {
    /// Already public; leaking it carries no risk.
    Public = 1,
    /// Unpublished but harmless day-to-day material.
    Internal = 2,
    /// Indirectly identifying data or ordinary business secrets.
    Restricted = 3,
    /// Core competitive or compliance-controlled data.
    Confidential = 4,
    /// Credentials, payment, identity or health data.
    Critical = 5,
}

impl PrivacyTier {
    pub const ALL: [Self; 5] = [
        Self::Public,
        Self::Internal,
        Self::Restricted,
        Self::Confidential,
        Self::Critical,
    ];

    pub const fn level(self) -> u8 {
        self as u8
    }

    pub const fn requires_escrow(self) -> bool {
        self.level() >= ESCROW_MIN_TIER
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Internal => "internal",
            Self::Restricted => "restricted",
            Self::Confidential => "confidential",
            Self::Critical => "critical",
        }
    }
}

impl TryFrom<u8> for PrivacyTier {
    type Error = InvalidTier;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Public),
            2 => Ok(Self::Internal),
            3 => Ok(Self::Restricted),
            4 => Ok(Self::Confidential),
            5 => Ok(Self::Critical),
            other => Err(InvalidTier(other)),
        }
    }
}

impl From<PrivacyTier> for u8 {
    fn from(tier: PrivacyTier) -> Self {
        tier.level()
    }
}

impl fmt::Display for PrivacyTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tier {} ({})", self.level(), self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("privacy tier must be between 1 and 5, got {0}")]
pub struct InvalidTier(pub u8);

/// Outcome of classifying one fragment.
#[derive(Debug, Clone, PartialEq)]
pub struct PrivacyLabel {
    pub tier: PrivacyTier,
    pub confidence: f32,
    /// One-line assertion that sensitive content exists, without disclosing it.
    pub brief: String,
    pub risk_indicators: Vec<String>,
    pub compliance_notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escrow_starts_at_restricted() {
        let escrowed = PrivacyTier::ALL
            .iter()
            .filter(|t| t.requires_escrow())
            .map(|t| t.level())
            .collect::<Vec<_>>();
        assert_eq!(escrowed, vec![3, 4, 5]);
    }

    #[test]
    fn tier_serializes_as_integer_and_rejects_out_of_range() {
        let raw = serde_json::to_string(&PrivacyTier::Confidential).expect("serialize");
        assert_eq!(raw, "4");
        let parsed: PrivacyTier = serde_json::from_str("2").expect("parse");
        assert_eq!(parsed, PrivacyTier::Internal);
        assert!(serde_json::from_str::<PrivacyTier>("0").is_err());
        assert!(serde_json::from_str::<PrivacyTier>("6").is_err());
    }
}

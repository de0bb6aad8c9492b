use serde::{Deserialize, Serialize};

use crate::tier::PrivacyTier;

/// Metadata stored next to every memory in the semantic store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryMetadata {
    pub privacy_level: PrivacyTier,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_ref: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    #[error("{0} content must be escrowed, store the brief with an external reference")]
    EscrowRequired(PrivacyTier),
    #[error("{0} content is stored verbatim and cannot carry an external reference")]
    UnexpectedReference(PrivacyTier),
    #[error("external reference cannot be empty")]
    EmptyReference,
    #[error("memory content cannot be empty")]
    EmptyContent,
}

/// A memory as handed to the store. Fields are private so that a record can
/// only be built through [`MemoryRecord::verbatim`] or [`MemoryRecord::escrowed`],
/// which keep the tier/reference pairing consistent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryRecord {
    content: String,
    metadata: MemoryMetadata,
}

impl MemoryRecord {
    /// Raw text for tiers 1-2.
    pub fn verbatim(
        content: impl Into<String>,
        tier: PrivacyTier,
        source: impl Into<String>,
    ) -> Result<Self, RecordError> {
        if tier.requires_escrow() {
            return Err(RecordError::EscrowRequired(tier));
        }
        let content = content.into();
        if content.trim().is_empty() {
            return Err(RecordError::EmptyContent);
        }
        Ok(Self {
            content,
            metadata: MemoryMetadata {
                privacy_level: tier,
                source: source.into(),
                external_ref: None,
            },
        })
    }

    /// Brief plus escrow reference for tiers 3-5. The raw text never enters here.
    pub fn escrowed(
        brief: impl Into<String>,
        tier: PrivacyTier,
        source: impl Into<String>,
        external_ref: impl Into<String>,
    ) -> Result<Self, RecordError> {
        if !tier.requires_escrow() {
            return Err(RecordError::UnexpectedReference(tier));
        }
        let external_ref = external_ref.into();
        if external_ref.trim().is_empty() {
            return Err(RecordError::EmptyReference);
        }
        let brief = brief.into();
        if brief.trim().is_empty() {
            return Err(RecordError::EmptyContent);
        }
        Ok(Self {
            content: brief,
            metadata: MemoryMetadata {
                privacy_level: tier,
                source: source.into(),
                external_ref: Some(external_ref),
            },
        })
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn metadata(&self) -> &MemoryMetadata {
        &self.metadata
    }

    pub fn tier(&self) -> PrivacyTier {
        self.metadata.privacy_level
    }

    pub fn external_ref(&self) -> Option<&str> {
        self.metadata.external_ref.as_deref()
    }

    /// Escrowed briefs must be stored exactly as written, so store-side
    /// inference is only allowed for verbatim records.
    pub fn allows_inference(&self) -> bool {
        self.metadata.external_ref.is_none()
    }
}

/// One hit from a similarity query. Lives only for the duration of a search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateResult {
    pub content: String,
    pub score: f32,
    pub tier: PrivacyTier,
    pub source: String,
    #[serde(skip)]
    pub external_ref: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbatim_rejects_sensitive_tiers() {
        let err = MemoryRecord::verbatim("my card is 4111", PrivacyTier::Critical, "user_input")
            .expect_err("tier 5 cannot be verbatim");
        assert_eq!(err, RecordError::EscrowRequired(PrivacyTier::Critical));

        let ok = MemoryRecord::verbatim("I prefer dark mode", PrivacyTier::Public, "user_input")
            .expect("tier 1 verbatim");
        assert!(ok.external_ref().is_none());
        assert!(ok.allows_inference());
    }

    #[test]
    fn escrowed_requires_reference_and_high_tier() {
        assert_eq!(
            MemoryRecord::escrowed("brief", PrivacyTier::Internal, "user_input", "ref-1"),
            Err(RecordError::UnexpectedReference(PrivacyTier::Internal))
        );
        assert_eq!(
            MemoryRecord::escrowed("brief", PrivacyTier::Restricted, "user_input", "  "),
            Err(RecordError::EmptyReference)
        );

        let rec = MemoryRecord::escrowed(
            "The user shared a credential; this is private data.",
            PrivacyTier::Critical,
            "user_input",
            "ref-1",
        )
        .expect("escrowed record");
        assert_eq!(rec.external_ref(), Some("ref-1"));
        assert!(!rec.allows_inference());
    }

    #[test]
    fn metadata_omits_missing_reference() {
        let rec = MemoryRecord::verbatim("likes tea", PrivacyTier::Internal, "chat")
            .expect("record");
        let json = serde_json::to_value(rec.metadata()).expect("json");
        assert_eq!(json, serde_json::json!({"privacy_level": 2, "source": "chat"}));
    }
}

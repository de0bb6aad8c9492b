use adctx_core::{PrivacyLabel, PrivacyTier};

use crate::error::ProviderError;
use crate::traits::PrivacyClassifier;
use crate::types::{ClassificationRequest, ClassificationResponse};

struct MarkerGroup {
    tier: PrivacyTier,
    indicator: &'static str,
    subject: &'static str,
    markers: &'static [&'static str],
}

// Ordered from most to least sensitive; the first group that matches wins.
const GROUPS: &[MarkerGroup] = &[
    MarkerGroup {
        tier: PrivacyTier::Critical,
        indicator: "credential",
        subject: "an account credential",
        markers: &[
            "password", "passcode", "passwd", "private key", "secret key", "api key",
            "seed phrase", "mnemonic", "recovery phrase", "otp", "pin code", "pin",
        ],
    },
    MarkerGroup {
        tier: PrivacyTier::Critical,
        indicator: "payment",
        subject: "payment card or bank account details",
        markers: &[
            "credit card", "debit card", "bank card", "card number", "cvv", "iban",
            "bank account", "routing number",
        ],
    },
    MarkerGroup {
        tier: PrivacyTier::Critical,
        indicator: "identity",
        subject: "an identity document number",
        markers: &[
            "passport number", "social security", "ssn", "id number", "identity card",
            "driver license", "driver's license",
        ],
    },
    MarkerGroup {
        tier: PrivacyTier::Critical,
        indicator: "health",
        subject: "health information",
        markers: &[
            "diagnosis", "diagnosed", "medical record", "prescription", "hiv", "genetic", "mri",
        ],
    },
    MarkerGroup {
        tier: PrivacyTier::Confidential,
        indicator: "business_confidential",
        subject: "confidential business information",
        markers: &[
            "source code", "salary", "financial forecast", "revenue forecast", "patent",
            "acquisition", "algorithm parameters", "confidential",
        ],
    },
    MarkerGroup {
        tier: PrivacyTier::Restricted,
        indicator: "contact_or_restricted",
        subject: "personal contact or restricted business details",
        markers: &[
            "email", "phone number", "home address", "my address", "roadmap", "budget",
            "cost structure", "employee list",
        ],
    },
    MarkerGroup {
        tier: PrivacyTier::Internal,
        indicator: "internal",
        subject: "internal day-to-day information",
        markers: &["meeting", "agenda", "okr", "internal", "standup"],
    },
];

/// Digit runs at least this long are treated as card or document numbers.
const LONG_NUMBER_DIGITS: usize = 12;

/// Rule-based classifier that needs no network. Multi-word markers match as
/// substrings, single-word markers only as whole tokens.
#[derive(Debug, Clone, Default)]
pub struct KeywordClassifier;

impl KeywordClassifier {
    pub const fn new() -> Self {
        Self
    }

    pub fn label(text: &str) -> PrivacyLabel {
        let lowered = text.to_lowercase();
        let tokens = lowered
            .split(|c: char| !(c.is_alphanumeric() || c == '\''))
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>();

        if longest_digit_run(text) >= LONG_NUMBER_DIGITS {
            return sensitive(PrivacyTier::Critical, "long_number", "a card or document number");
        }

        for group in GROUPS {
            let hit = group.markers.iter().any(|m| {
                if m.contains(' ') {
                    lowered.contains(m)
                } else {
                    tokens.contains(m)
                }
            });
            if hit {
                return sensitive(group.tier, group.indicator, group.subject);
            }
        }

        if lowered.split_whitespace().any(looks_like_email) {
            return sensitive(
                PrivacyTier::Restricted,
                "email_address",
                "an email address",
            );
        }

        PrivacyLabel {
            tier: PrivacyTier::Public,
            confidence: 0.5,
            brief: "No sensitive markers found.".to_string(),
            risk_indicators: Vec::new(),
            compliance_notes: None,
        }
    }
}

fn sensitive(tier: PrivacyTier, indicator: &str, subject: &str) -> PrivacyLabel {
    PrivacyLabel {
        tier,
        confidence: 0.6,
        brief: format!("The user shared {subject}; this is private data."),
        risk_indicators: vec![indicator.to_string()],
        compliance_notes: None,
    }
}

fn looks_like_email(word: &str) -> bool {
    word.split_once('@')
        .is_some_and(|(user, host)| !user.is_empty() && host.contains('.'))
}

/// Longest digit run, allowing single spaces or dashes as group separators.
fn longest_digit_run(text: &str) -> usize {
    let mut best = 0;
    let mut current = 0;
    let mut prev_sep = false;
    for c in text.chars() {
        if c.is_ascii_digit() {
            current += 1;
            prev_sep = false;
            best = best.max(current);
        } else if (c == ' ' || c == '-') && current > 0 && !prev_sep {
            prev_sep = true;
        } else {
            current = 0;
            prev_sep = false;
        }
    }
    best
}

#[async_trait::async_trait]
impl PrivacyClassifier for KeywordClassifier {
    fn name(&self) -> &'static str {
        "keyword"
    }

    async fn classify(
        &self,
        request: ClassificationRequest,
    ) -> Result<ClassificationResponse, ProviderError> {
        if request.text.trim().is_empty() {
            return Err(ProviderError::Config(
                "classification input is empty".to_string(),
            ));
        }
        Ok(ClassificationResponse {
            provider: self.name().to_string(),
            model: "markers-v1".to_string(),
            label: Self::label(&request.text),
        })
    }
}

const TIER_GUIDE: &str = r#"You are a privacy classification expert. Assign the text fragment below exactly one privacy level from 1 to 5.

Level 1 (public): already published, no regulatory protection, leaking it carries no risk.
Examples: company blog posts, open-source READMEs, public job ads.

Level 2 (internal): unpublished but holds nothing that identifies a person or a key business asset.
Examples: routine meeting agendas, team OKR overviews, personal tastes such as "likes lattes".

Level 3 (restricted): indirectly identifies a person, or is an ordinary business secret that law expects to be reasonably protected.
Examples: name plus title plus work email, product roadmaps, cost structures, budget overviews.

Level 4 (confidential): core competitive or compliance-controlled information whose leak causes serious business or legal harm.
Examples: source code, algorithm parameters, patent drafts, pre-release financial statements, acquisition lists.

Level 5 (critical): directly identifying or irreversibly harmful data, or any credential that enables account takeover or monetary loss.
Examples: national ID numbers, bank card numbers, CVV codes, health or genetic data, private keys, seed phrases, production passwords.

Rules:
- When the fragment mixes levels, report the highest one.
- Consider whether combining the pieces raises sensitivity.
- When unsure, choose the more protective level.

Answer with a single JSON object and nothing else:
{
  "privacy_level": <integer 1-5>,
  "confidence": <float 0.0-1.0>,
  "brief": "<one sentence asserting that private data exists, e.g. 'The user shared a bank account password; this is private data.' Never repeat the sensitive values>",
  "risk_indicators": ["<indicator>", "..."],
  "compliance_notes": "<relevant regulation, or null>"
}"#;

/// Builds the single user message sent to the classification model.
pub fn classification_message(text: &str, additional_context: Option<&str>) -> String {
    let mut message = format!("{TIER_GUIDE}\n\nFragment to classify:\n```\n{text}\n```\n");
    if let Some(extra) = additional_context.filter(|c| !c.trim().is_empty()) {
        message.push_str(&format!("\nAdditional context:\n```\n{extra}\n```\n"));
    }
    message.push_str("\nReturn only the JSON object.");
    message
}

/// Strips a surrounding markdown code fence, with or without a language tag.
pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = rest.strip_prefix("json").unwrap_or(rest);
    body.strip_suffix("```").unwrap_or(body).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_embeds_fragment_and_optional_context() {
        let msg = classification_message("my pin is 1234", None);
        assert!(msg.contains("my pin is 1234"));
        assert!(!msg.contains("Additional context"));

        let msg = classification_message("roadmap for Q3", Some("from the product channel"));
        assert!(msg.contains("Additional context"));
        assert!(msg.contains("from the product channel"));
    }

    #[test]
    fn strips_json_fences() {
        assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```\n{\"a\":1}```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("  {\"a\":1} "), "{\"a\":1}");
    }
}

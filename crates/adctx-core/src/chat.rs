use serde::Deserialize;

/// The subset of an OpenAI-compatible `/chat/completions` body that the
/// classifier and the relevance filter read.
#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    pub model: Option<String>,
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    pub message: ChatMessage,
}

#[derive(Debug, Deserialize)]
pub struct ChatMessage {
    pub content: Option<String>,
}

impl ChatCompletionResponse {
    /// Splits the body into the reported model and the first choice's text.
    pub fn into_parts(self) -> (Option<String>, Option<String>) {
        let content = self
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content);
        (self.model, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_choice_content_and_model() {
        let body = r#"{"model":"m-1","choices":[{"message":{"content":"one"}},{"message":{"content":"two"}}]}"#;
        let parsed: ChatCompletionResponse = serde_json::from_str(body).expect("body");
        assert_eq!(parsed.into_parts(), (Some("m-1".to_string()), Some("one".to_string())));

        let parsed: ChatCompletionResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"content":null}}]}"#).expect("body");
        assert_eq!(parsed.into_parts(), (None, None));

        let parsed: ChatCompletionResponse = serde_json::from_str("{}").expect("body");
        assert_eq!(parsed.into_parts(), (None, None));
    }
}

use std::time::Duration;

use adctx_filter::{
    FilterProviderConfig, FilterRequest, OpenAiFilterConfig, ProviderError, build_relevance_filter,
};
use serde_json::json;
use wiremock::matchers::{bearer_token, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn filter_config(server: &MockServer) -> FilterProviderConfig {
    let mut cfg = OpenAiFilterConfig::new("filter-key");
    cfg.base_url = server.uri();
    cfg.timeout = Duration::from_secs(5);
    FilterProviderConfig::OpenAiCompatible(cfg)
}

fn answer(content: &str) -> serde_json::Value {
    json!({"model": "gpt-4o-mini", "choices": [{"message": {"content": content}}]})
}

fn request() -> FilterRequest {
    FilterRequest {
        query: "what theme does the user like?".to_string(),
        contexts: vec!["I prefer dark mode".to_string()],
    }
}

#[tokio::test]
async fn returns_condensed_summary() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(bearer_token("filter-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(answer(" The user prefers dark mode. ")))
        .expect(1)
        .mount(&server)
        .await;

    let filter = build_relevance_filter(filter_config(&server)).expect("filter");
    let res = filter.integrate(request()).await.expect("summary");
    assert_eq!(res.summary, "The user prefers dark mode.");
    assert_eq!(res.model, "gpt-4o-mini");
}

#[tokio::test]
async fn none_answer_means_empty_summary() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(answer("none")))
        .mount(&server)
        .await;

    let filter = build_relevance_filter(filter_config(&server)).expect("filter");
    let res = filter.integrate(request()).await.expect("summary");
    assert!(res.summary.is_empty());
}

#[tokio::test]
async fn no_contexts_skips_the_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(answer("should not be used")))
        .expect(0)
        .mount(&server)
        .await;

    let filter = build_relevance_filter(filter_config(&server)).expect("filter");
    let res = filter
        .integrate(FilterRequest {
            query: "anything".to_string(),
            contexts: Vec::new(),
        })
        .await
        .expect("summary");
    assert!(res.summary.is_empty());
}

#[tokio::test]
async fn upstream_error_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let filter = build_relevance_filter(filter_config(&server)).expect("filter");
    let err = filter.integrate(request()).await.expect_err("must fail");
    assert!(matches!(err, ProviderError::Api { status: 500, .. }));
}

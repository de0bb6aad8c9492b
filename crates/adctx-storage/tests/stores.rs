use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use adctx_core::{MemoryRecord, PrivacyTier};
use adctx_storage::{LocalMemoryStore, Mem0Config, Mem0Store, MemoryStore, StorageError};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn temp_db(name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    std::env::temp_dir().join(format!("adctx-storage-{name}-{nanos}.json"))
}

fn mem0(server: &MockServer) -> Mem0Store {
    let mut cfg = Mem0Config::new("m0-key");
    cfg.base_url = server.uri();
    cfg.user_id = "tester".to_string();
    cfg.timeout = Duration::from_secs(2);
    Mem0Store::new(cfg).expect("mem0 store")
}

#[tokio::test]
async fn local_store_persists_and_ranks() {
    let db = temp_db("rank");
    let store = LocalMemoryStore::open(&db).expect("open");
    let pref = MemoryRecord::verbatim("I prefer dark mode", PrivacyTier::Public, "user_input")
        .expect("record");
    let secret = MemoryRecord::escrowed(
        "The user shared an account credential; this is private data.",
        PrivacyTier::Critical,
        "user_input",
        "ref-77",
    )
    .expect("record");
    store.add(&pref).await.expect("add pref");
    store.add(&secret).await.expect("add secret");

    let reopened = LocalMemoryStore::open(&db).expect("reopen");
    assert_eq!(reopened.len().await, 2);

    let hits = reopened.search("dark mode", 5).await.expect("search");
    assert_eq!(hits.len(), 2);
    assert_eq!(hits.first().map(|h| h.content.as_str()), Some("I prefer dark mode"));

    let raw: serde_json::Value =
        serde_json::from_slice(&std::fs::read(&db).expect("read")).expect("json");
    let stored = raw["memories"].as_array().expect("memories array");
    assert_eq!(stored[1]["metadata"]["external_ref"], "ref-77");
    assert!(stored[0]["metadata"].get("external_ref").is_none());

    let _ = std::fs::remove_file(db);
}

#[tokio::test]
async fn failed_write_rolls_back_the_entry() {
    let db = temp_db("rollback");
    let store = LocalMemoryStore::open(&db).expect("open");
    let first = MemoryRecord::verbatim("kept across the failure", PrivacyTier::Public, "user_input")
        .expect("record");
    store.add(&first).await.expect("add first");

    // A directory in place of the file makes the next write fail.
    std::fs::remove_file(&db).expect("remove file");
    std::fs::create_dir(&db).expect("block path");
    let second = MemoryRecord::verbatim("never persisted", PrivacyTier::Public, "user_input")
        .expect("record");
    let err = store.add(&second).await.expect_err("write must fail");
    assert!(matches!(err, StorageError::Io(_)), "unexpected error: {err}");
    assert_eq!(store.len().await, 1);

    let hits = store.search("never persisted", 5).await.expect("search");
    assert!(hits.iter().all(|h| h.content != "never persisted"));

    let _ = std::fs::remove_dir(db);
}

#[tokio::test(flavor = "current_thread")]
async fn concurrent_adds_all_reach_the_file() {
    let db = temp_db("concurrent");
    let store = std::sync::Arc::new(LocalMemoryStore::open(&db).expect("open"));
    let mut tasks = Vec::new();
    for n in 0..8 {
        let store = std::sync::Arc::clone(&store);
        tasks.push(tokio::spawn(async move {
            let record =
                MemoryRecord::verbatim(format!("note number {n}"), PrivacyTier::Public, "user_input")
                    .expect("record");
            store.add(&record).await.expect("add");
        }));
    }
    for task in tasks {
        task.await.expect("join");
    }

    let reopened = LocalMemoryStore::open(&db).expect("reopen");
    assert_eq!(reopened.len().await, 8);

    let _ = std::fs::remove_file(db);
}

#[tokio::test]
async fn mem0_add_sends_metadata_and_disables_inference_for_briefs() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/memories/"))
        .and(header("authorization", "Token m0-key"))
        .and(body_partial_json(json!({
            "user_id": "tester",
            "infer": false,
            "metadata": {"privacy_level": 4, "source": "user_input", "external_ref": "ref-9"}
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{"id": "m-1", "memory": "brief", "event": "ADD"}])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let record = MemoryRecord::escrowed(
        "The user shared confidential business information; this is private data.",
        PrivacyTier::Confidential,
        "user_input",
        "ref-9",
    )
    .expect("record");
    let id = mem0(&server).add(&record).await.expect("add");
    assert_eq!(id.as_deref(), Some("m-1"));
}

#[tokio::test]
async fn mem0_search_skips_foreign_memories() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/memories/search/"))
        .and(body_partial_json(json!({"query": "theme", "top_k": 5})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": [
            {"id": "a", "memory": "Prefers dark mode", "score": 0.91,
             "metadata": {"privacy_level": 1, "source": "user_input"}},
            {"id": "b", "memory": "written by someone else", "score": 0.88, "metadata": null},
            {"id": "c", "memory": "brief", "score": 0.75,
             "metadata": {"privacy_level": 5, "source": "user_input", "external_ref": "ref-1"}}
        ]})))
        .mount(&server)
        .await;

    let hits = mem0(&server).search("theme", 5).await.expect("search");
    let ids = hits.iter().map(|h| h.id.as_str()).collect::<Vec<_>>();
    assert_eq!(ids, vec!["a", "c"]);
    assert_eq!(
        hits.get(1).and_then(|h| h.metadata.external_ref.as_deref()),
        Some("ref-1")
    );
}

#[tokio::test]
async fn mem0_server_errors_mean_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = mem0(&server).search("theme", 5).await.expect_err("must fail");
    assert!(err.is_unavailable());
}

#[tokio::test]
async fn mem0_client_errors_are_not_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad token"))
        .mount(&server)
        .await;

    let err = mem0(&server).search("theme", 5).await.expect_err("must fail");
    assert!(matches!(err, StorageError::Api { status: 401, .. }));
}

#[tokio::test]
async fn unreachable_mem0_is_unavailable() {
    let mut cfg = Mem0Config::new("m0-key");
    cfg.base_url = "http://127.0.0.1:9".to_string();
    cfg.timeout = Duration::from_secs(2);
    let store = Mem0Store::new(cfg).expect("store");
    let err = store.search("theme", 5).await.expect_err("must fail");
    assert!(err.is_unavailable(), "got {err}");
}

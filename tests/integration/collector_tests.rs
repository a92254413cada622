//! End-to-end collection runs against a mock API

use crate::support::{
    batch_files, client, mount_accepted_user, mount_search, profile_json, repo_json, search_json,
    test_config, TOKEN,
};
use chrono::Utc;
use resume_harvester::output::{read_batch, JsonBatchWriter};
use resume_harvester::state::{Checkpoint, CheckpointError, CheckpointStore, JsonCheckpointStore};
use resume_harvester::{Collector, CollectorPhase, HarvestError};
use serde_json::json;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Checkpoint store that remembers the count stamped on every save
struct RecordingStore {
    inner: JsonCheckpointStore,
    saves: Arc<Mutex<Vec<u64>>>,
}

impl CheckpointStore for RecordingStore {
    fn load(&self) -> Result<Checkpoint, CheckpointError> {
        self.inner.load()
    }

    fn save(&mut self, checkpoint: &Checkpoint) -> Result<(), CheckpointError> {
        self.saves.lock().unwrap().push(checkpoint.resumes_collected);
        self.inner.save(checkpoint)
    }
}

fn read_checkpoint(dir: &Path) -> Checkpoint {
    JsonCheckpointStore::new(dir.join("checkpoint.json"))
        .load()
        .unwrap()
}

#[tokio::test]
async fn full_run_accepts_rejects_and_counts_errors() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_search(&server, "rust programmer", &["alice", "bob", "ghost"]).await;

    Mock::given(method("GET"))
        .and(path("/users/alice"))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile_json(
            "alice",
            Some("Systems programmer"),
            Some("Acme"),
            12,
        )))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users/alice/repos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            repo_json("api", Some("Python"), 10),
            repo_json("cli", Some("Go"), 5),
            repo_json("tool", Some("Python"), 1)
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/alice/api/languages"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"Python": 1000, "Shell": 10})),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/users/bob"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(profile_json("bob", None, None, 2)),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users/bob/repos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/users/ghost"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let config = test_config(&server.uri(), dir.path());
    let mut collector = Collector::new(config, TOKEN).unwrap();
    let summary = collector.run(10).await.unwrap();

    assert_eq!(summary.accepted, 1);
    assert_eq!(summary.cumulative, 1);
    assert_eq!(summary.rejected, 1);
    assert_eq!(summary.errors, 1);
    assert!(!summary.target_reached());
    assert_eq!(collector.phase(), CollectorPhase::Done);

    let record = &collector.records()[0];
    assert_eq!(record.github_username, "alice");
    assert_eq!(record.skills, vec!["Python", "Go", "Shell"]);
    assert_eq!(record.top_repos[0].name, "api");

    let checkpoint = read_checkpoint(dir.path());
    assert!(checkpoint.contains("alice"));
    assert!(!checkpoint.contains("bob"));
    assert_eq!(checkpoint.resumes_collected, 1);

    let finals = batch_files(&dir.path().join("out"), false);
    assert_eq!(finals.len(), 1);
    assert_eq!(summary.final_batch.as_deref(), Some(finals[0].as_path()));
    let batch = read_batch(&finals[0]).unwrap();
    assert_eq!(batch.metadata.count, 1);
    assert_eq!(batch.metadata.errors, 1);
    assert_eq!(batch.metadata.target_count, 10);
    assert_eq!(batch.metadata.search_queries, vec!["rust programmer"]);
    assert_eq!(batch.resumes[0].github_username, "alice");
}

#[tokio::test]
async fn second_run_skips_checkpointed_users() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_search(&server, "rust programmer", &["alice"]).await;
    Mock::given(method("GET"))
        .and(path("/users/alice"))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile_json(
            "alice",
            Some("Engineer"),
            Some("Acme"),
            3,
        )))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users/alice/repos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let config = test_config(&server.uri(), dir.path());

    let first = Collector::new(config.clone(), TOKEN)
        .unwrap()
        .run(5)
        .await
        .unwrap();
    assert_eq!(first.accepted, 1);

    let mut collector = Collector::new(config, TOKEN).unwrap();
    assert_eq!(collector.checkpoint().resumes_collected, 1);
    let second = collector.run(5).await.unwrap();

    assert_eq!(second.accepted, 0);
    assert_eq!(second.cumulative, 1);
    assert_eq!(second.skipped, 1);
    assert_eq!(read_checkpoint(dir.path()).resumes_collected, 1);
}

#[tokio::test]
async fn stops_once_target_is_reached() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_search(&server, "rust programmer", &["a1", "a2", "a3"]).await;
    mount_accepted_user(&server, "a1").await;
    mount_accepted_user(&server, "a2").await;
    Mock::given(method("GET"))
        .and(path("/users/a3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile_json(
            "a3",
            Some("Engineer"),
            Some("Acme"),
            3,
        )))
        .expect(0)
        .mount(&server)
        .await;

    let config = test_config(&server.uri(), dir.path());
    let mut collector = Collector::new(config, TOKEN).unwrap();
    let summary = collector.run(2).await.unwrap();

    assert!(summary.target_reached());
    assert_eq!(summary.accepted, 2);
    let names: Vec<&str> = collector
        .records()
        .iter()
        .map(|r| r.github_username.as_str())
        .collect();
    assert_eq!(names, vec!["a1", "a2"]);
}

#[tokio::test]
async fn saves_checkpoint_and_partial_batch_at_each_interval() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_search(&server, "rust programmer", &["u1", "u2", "u3"]).await;
    for login in ["u1", "u2", "u3"] {
        mount_accepted_user(&server, login).await;
    }

    let mut config = test_config(&server.uri(), dir.path());
    config.output.batch_save_interval = 1;

    let saves = Arc::new(Mutex::new(Vec::new()));
    let store = RecordingStore {
        inner: JsonCheckpointStore::new(dir.path().join("checkpoint.json")),
        saves: Arc::clone(&saves),
    };
    let sink = JsonBatchWriter::new(dir.path().join("out"));
    let mut collector = Collector::with_components(
        config.clone(),
        client(&config),
        Box::new(store),
        Box::new(sink),
    )
    .unwrap();

    let summary = collector.run(10).await.unwrap();
    assert_eq!(summary.accepted, 3);

    let saves = saves.lock().unwrap().clone();
    assert_eq!(&saves[..3], &[1, 2, 3]);
    assert!(saves.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(saves.last(), Some(&3));

    let partials = batch_files(&dir.path().join("out"), true);
    assert_eq!(partials.len(), 3);
    let last = read_batch(partials.last().unwrap()).unwrap();
    assert_eq!(last.resumes.len(), 3);

    let finals = batch_files(&dir.path().join("out"), false);
    assert_eq!(finals.len(), 1);
    assert_eq!(read_batch(&finals[0]).unwrap().metadata.count, 3);
}

#[tokio::test]
async fn aborts_after_consecutive_failures_and_keeps_progress() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_search(&server, "q1", &["alice"]).await;
    mount_accepted_user(&server, "alice").await;
    for query in ["q2", "q3"] {
        Mock::given(method("GET"))
            .and(path("/search/users"))
            .and(query_param("q", query))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
    }

    let mut config = test_config(&server.uri(), dir.path());
    config.search.queries = vec!["q1".into(), "q2".into(), "q3".into()];
    config.api.max_retries = 0;
    config.api.max_consecutive_errors = 2;

    let mut collector = Collector::new(config, TOKEN).unwrap();
    let err = collector.run(10).await.unwrap_err();

    assert!(matches!(
        err,
        HarvestError::TooManyConsecutiveErrors { count: 2 }
    ));
    assert!(read_checkpoint(dir.path()).contains("alice"));
    assert_eq!(batch_files(&dir.path().join("out"), true).len(), 1);
    assert!(batch_files(&dir.path().join("out"), false).is_empty());
}

#[tokio::test]
async fn failed_searches_are_counted_as_errors() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    for query in ["q1", "q2"] {
        Mock::given(method("GET"))
            .and(path("/search/users"))
            .and(query_param("q", query))
            .respond_with(ResponseTemplate::new(502))
            .expect(1)
            .mount(&server)
            .await;
    }

    let mut config = test_config(&server.uri(), dir.path());
    config.search.queries = vec!["q1".into(), "q2".into()];
    config.api.max_retries = 0;
    config.api.max_consecutive_errors = 5;

    let summary = Collector::new(config, TOKEN)
        .unwrap()
        .run(10)
        .await
        .unwrap();

    assert_eq!(summary.errors, 2);
    assert_eq!(summary.accepted, 0);
    let finals = batch_files(&dir.path().join("out"), false);
    assert_eq!(finals.len(), 1);
    assert_eq!(read_batch(&finals[0]).unwrap().metadata.errors, 2);
}

#[tokio::test]
async fn aborts_after_consecutive_profile_failures() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_search(&server, "rust programmer", &["a0", "u1", "u2", "u3"]).await;
    mount_accepted_user(&server, "a0").await;
    for login in ["u1", "u2"] {
        Mock::given(method("GET"))
            .and(path(format!("/users/{login}")))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path("/users/u3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile_json(
            "u3",
            Some("Engineer"),
            Some("Acme"),
            3,
        )))
        .expect(0)
        .mount(&server)
        .await;

    let mut config = test_config(&server.uri(), dir.path());
    config.api.max_retries = 0;
    config.api.max_consecutive_errors = 2;

    let err = Collector::new(config, TOKEN)
        .unwrap()
        .run(10)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        HarvestError::TooManyConsecutiveErrors { count: 2 }
    ));
    assert!(read_checkpoint(dir.path()).contains("a0"));

    let partials = batch_files(&dir.path().join("out"), true);
    assert_eq!(partials.len(), 1);
    let partial = read_batch(&partials[0]).unwrap();
    assert_eq!(partial.metadata.count, 1);
    assert_eq!(partial.metadata.errors, 2);
    assert!(batch_files(&dir.path().join("out"), false).is_empty());
}

#[tokio::test]
async fn failed_language_breakdown_still_accepts_candidate() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_search(&server, "rust programmer", &["alice"]).await;
    Mock::given(method("GET"))
        .and(path("/users/alice"))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile_json(
            "alice",
            Some("Engineer"),
            Some("Acme"),
            6,
        )))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users/alice/repos"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([repo_json("api", Some("Rust"), 5)])),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/alice/api/languages"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = test_config(&server.uri(), dir.path());
    config.api.max_retries = 0;

    let mut collector = Collector::new(config, TOKEN).unwrap();
    let summary = collector.run(10).await.unwrap();

    assert_eq!(summary.accepted, 1);
    assert_eq!(summary.errors, 0);
    assert_eq!(collector.records()[0].skills, vec!["Rust"]);
    assert!(read_checkpoint(dir.path()).contains("alice"));
}

#[tokio::test]
async fn low_quota_throttles_then_resumes_fetching() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    let reset = Utc::now().timestamp() + 2;
    Mock::given(method("GET"))
        .and(path("/search/users"))
        .and(query_param("q", "rust programmer"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(search_json(&["alice"]))
                .insert_header("x-ratelimit-remaining", "3")
                .insert_header("x-ratelimit-reset", reset.to_string().as_str()),
        )
        .mount(&server)
        .await;
    mount_accepted_user(&server, "alice").await;

    let config = test_config(&server.uri(), dir.path());
    let mut collector = Collector::new(config, TOKEN).unwrap();

    let start = Instant::now();
    let summary = collector.run(10).await.unwrap();

    assert_eq!(summary.throttled, 1);
    assert_eq!(summary.accepted, 1);
    assert_eq!(collector.phase(), CollectorPhase::Done);
    assert!(
        start.elapsed() >= Duration::from_millis(900),
        "collector should wait for the quota reset, waited {:?}",
        start.elapsed()
    );
}

#[tokio::test]
async fn exhausted_queries_still_write_empty_final_batch() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_search(&server, "rust programmer", &[]).await;

    let config = test_config(&server.uri(), dir.path());
    let summary = Collector::new(config, TOKEN)
        .unwrap()
        .run(3)
        .await
        .unwrap();

    assert_eq!(summary.accepted, 0);
    let finals = batch_files(&dir.path().join("out"), false);
    assert_eq!(finals.len(), 1);
    assert!(read_batch(&finals[0]).unwrap().resumes.is_empty());
}

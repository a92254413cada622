//! GitHub client behavior against a mock API

use crate::support::{client, profile_json, repo_json, search_json, test_config, TOKEN};
use chrono::Utc;
use resume_harvester::api::ApiError;
use serde_json::json;
use std::path::Path;
use std::time::{Duration, Instant};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn profile() -> serde_json::Value {
    profile_json("octocat", Some("Mona"), Some("GitHub"), 8)
}

#[tokio::test]
async fn sends_auth_and_media_type_headers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/octocat"))
        .and(header("authorization", format!("token {TOKEN}").as_str()))
        .and(header("accept", "application/vnd.github.v3+json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile()))
        .expect(1)
        .mount(&server)
        .await;

    let config = test_config(&server.uri(), Path::new("."));
    let user = client(&config).get_user("octocat").await.unwrap();

    assert_eq!(user.login, "octocat");
    assert_eq!(user.public_repos, 8);
    assert!(user.blog.is_none(), "empty blog should be normalized away");
}

#[tokio::test]
async fn search_sends_pagination_and_sort_params() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/users"))
        .and(query_param("q", "rust programmer"))
        .and(query_param("per_page", "100"))
        .and(query_param("page", "2"))
        .and(query_param("sort", "repositories"))
        .and(query_param("order", "desc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_json(&["a", "b"])))
        .expect(1)
        .mount(&server)
        .await;

    let config = test_config(&server.uri(), Path::new("."));
    let page = client(&config)
        .search_users("rust programmer", 2, 100, "repositories", "desc")
        .await
        .unwrap();

    let logins: Vec<&str> = page.items.iter().map(|u| u.login.as_str()).collect();
    assert_eq!(logins, vec!["a", "b"]);
}

#[tokio::test]
async fn repos_and_languages_are_parsed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/octocat/repos"))
        .and(query_param("sort", "updated"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            repo_json("hello", Some("Ruby"), 3),
            repo_json("dotfiles", None, 0)
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/octocat/hello/languages"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"Ruby": 900, "HTML": 1200})),
        )
        .mount(&server)
        .await;

    let config = test_config(&server.uri(), Path::new("."));
    let client = client(&config);
    let repos = client.get_user_repos("octocat", 30).await.unwrap();
    assert_eq!(repos.len(), 2);
    assert!(repos[1].language.is_none());

    let breakdown = client.get_repo_languages("octocat", "hello").await.unwrap();
    let order: Vec<&str> = breakdown.languages().collect();
    assert_eq!(order, vec!["HTML", "Ruby"]);
}

#[tokio::test]
async fn suspends_until_reset_when_quota_runs_low() {
    let server = MockServer::start().await;
    let reset = Utc::now().timestamp() + 2;
    Mock::given(method("GET"))
        .and(path("/users/octocat"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(profile())
                .insert_header("x-ratelimit-limit", "5000")
                .insert_header("x-ratelimit-remaining", "5")
                .insert_header("x-ratelimit-reset", reset.to_string().as_str()),
        )
        .mount(&server)
        .await;

    let config = test_config(&server.uri(), Path::new("."));
    let client = client(&config);

    client.get_user("octocat").await.unwrap();
    assert!(client.pending_suspension().is_some());
    assert_eq!(client.last_rate_limit().map(|s| s.remaining), Some(5));

    let start = Instant::now();
    client.get_user("octocat").await.unwrap();
    assert!(
        start.elapsed() >= Duration::from_millis(900),
        "second call should wait for the reset, waited {:?}",
        start.elapsed()
    );
    assert!(client.quota_suspensions() >= 1);
}

#[tokio::test]
async fn healthy_quota_does_not_suspend() {
    let server = MockServer::start().await;
    let reset = Utc::now().timestamp() + 3600;
    Mock::given(method("GET"))
        .and(path("/users/octocat"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(profile())
                .insert_header("x-ratelimit-remaining", "4999")
                .insert_header("x-ratelimit-reset", reset.to_string().as_str()),
        )
        .mount(&server)
        .await;

    let config = test_config(&server.uri(), Path::new("."));
    let client = client(&config);
    client.get_user("octocat").await.unwrap();
    assert!(client.pending_suspension().is_none());
}

#[tokio::test]
async fn retries_server_errors_then_succeeds() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/octocat"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users/octocat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile()))
        .mount(&server)
        .await;

    let mut config = test_config(&server.uri(), Path::new("."));
    config.api.max_retries = 3;
    let client = client(&config);

    let user = client.get_user("octocat").await.unwrap();
    assert_eq!(user.login, "octocat");
    assert_eq!(client.requests_sent(), 3);
    assert_eq!(client.consecutive_errors(), 0);
}

#[tokio::test]
async fn gives_up_after_max_retries_and_counts_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/octocat"))
        .respond_with(ResponseTemplate::new(502))
        .expect(3)
        .mount(&server)
        .await;

    let mut config = test_config(&server.uri(), Path::new("."));
    config.api.max_retries = 2;
    let client = client(&config);

    let err = client.get_user("octocat").await.unwrap_err();
    assert!(matches!(err, ApiError::Server { status: 502, .. }));
    assert_eq!(client.consecutive_errors(), 1);
}

#[tokio::test]
async fn not_found_is_not_retried_and_leaves_circuit_alone() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/ghost"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "Not Found"})))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = test_config(&server.uri(), Path::new("."));
    config.api.max_retries = 3;
    let client = client(&config);

    let err = client.get_user("ghost").await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound { .. }));
    assert_eq!(client.consecutive_errors(), 0);
    assert!(!client.circuit_open());
}

#[tokio::test]
async fn unauthorized_counts_towards_circuit_without_retry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/octocat"))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;

    let mut config = test_config(&server.uri(), Path::new("."));
    config.api.max_retries = 3;
    config.api.max_consecutive_errors = 2;
    let client = client(&config);

    for _ in 0..2 {
        let err = client.get_user("octocat").await.unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized { .. }));
    }
    assert_eq!(client.consecutive_errors(), 2);
    assert!(client.circuit_open());
}

#[tokio::test]
async fn success_resets_consecutive_failures() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/octocat"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users/octocat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile()))
        .mount(&server)
        .await;

    let mut config = test_config(&server.uri(), Path::new("."));
    config.api.max_retries = 0;
    let client = client(&config);

    assert!(client.get_user("octocat").await.is_err());
    assert_eq!(client.consecutive_errors(), 1);

    client.get_user("octocat").await.unwrap();
    assert_eq!(client.consecutive_errors(), 0);
}

#[tokio::test]
async fn exhausted_quota_403_is_retried() {
    let server = MockServer::start().await;
    let reset = Utc::now().timestamp();
    Mock::given(method("GET"))
        .and(path("/users/octocat"))
        .respond_with(
            ResponseTemplate::new(403)
                .insert_header("x-ratelimit-remaining", "0")
                .insert_header("x-ratelimit-reset", reset.to_string().as_str()),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users/octocat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile()))
        .mount(&server)
        .await;

    let config = test_config(&server.uri(), Path::new("."));
    let client = client(&config);

    let user = client.get_user("octocat").await.unwrap();
    assert_eq!(user.login, "octocat");
    assert_eq!(client.requests_sent(), 2);
}

#[tokio::test]
async fn plain_403_is_permanent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/octocat"))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = test_config(&server.uri(), Path::new("."));
    config.api.max_retries = 3;
    let client = client(&config);

    let err = client.get_user("octocat").await.unwrap_err();
    assert!(matches!(err, ApiError::UnexpectedStatus { status: 403, .. }));
}

#[tokio::test]
async fn malformed_body_is_a_deserialize_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/octocat"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let config = test_config(&server.uri(), Path::new("."));
    let client = client(&config);

    let err = client.get_user("octocat").await.unwrap_err();
    assert!(matches!(err, ApiError::Deserialize { .. }));
    assert_eq!(client.consecutive_errors(), 0);
}

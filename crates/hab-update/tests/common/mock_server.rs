//! Mock server helpers for the release API and asset downloads

use hab_update::UpdaterConfig;
use serde_json::Value;
use std::time::Duration;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::builders::asset_path;
use super::constants::*;

/// Path of the release list endpoint
pub fn releases_path() -> String {
    format!("/repos/{}/{}/releases", REPO_OWNER, REPO_NAME)
}

/// Path of the release-by-tag endpoint
pub fn release_tag_path(tag: &str) -> String {
    format!("/repos/{}/{}/releases/tags/{}", REPO_OWNER, REPO_NAME, tag)
}

/// Updater config pointed at the mock server, progress disabled
pub fn test_config(server: &MockServer) -> UpdaterConfig {
    UpdaterConfig::default()
        .with_api_url(server.uri())
        .with_repo(REPO_OWNER, REPO_NAME)
        .with_timeouts(Duration::from_secs(5), Duration::from_secs(5))
        .with_progress(false)
        .with_arm_version(Some("7".to_string()))
}

/// Serve `releases` as the first (and only) page of the release list
pub async fn mock_releases(server: &MockServer, releases: Vec<Value>) {
    Mock::given(method("GET"))
        .and(path(releases_path()))
        .and(query_param("per_page", "100"))
        .and(header("accept", "application/vnd.github+json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(Value::Array(releases)))
        .mount(server)
        .await;
}

/// Serve one page of the release list
pub async fn mock_releases_page(server: &MockServer, page: u32, releases: Vec<Value>) {
    Mock::given(method("GET"))
        .and(path(releases_path()))
        .and(query_param("page", page.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(Value::Array(releases)))
        .mount(server)
        .await;
}

/// Serve a release at the release-by-tag endpoint
pub async fn mock_release_tag(server: &MockServer, release: Value) {
    let tag = release["tag_name"].as_str().unwrap_or_default().to_string();
    Mock::given(method("GET"))
        .and(path(release_tag_path(&tag)))
        .respond_with(ResponseTemplate::new(200).set_body_json(release))
        .mount(server)
        .await;
}

/// Answer the release-by-tag endpoint with 404
pub async fn mock_release_tag_missing(server: &MockServer, tag: &str) {
    Mock::given(method("GET"))
        .and(path(release_tag_path(tag)))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
            "message": "Not Found"
        })))
        .mount(server)
        .await;
}

/// Answer every release list request with an exhausted rate limit
pub async fn mock_rate_limited(server: &MockServer, reset_epoch: i64) {
    Mock::given(method("GET"))
        .and(path(releases_path()))
        .respond_with(
            ResponseTemplate::new(403)
                .insert_header("X-RateLimit-Remaining", "0")
                .insert_header("X-RateLimit-Reset", reset_epoch.to_string().as_str())
                .set_body_json(serde_json::json!({"message": "API rate limit exceeded"})),
        )
        .mount(server)
        .await;
}

/// Serve an asset of `tag`
pub async fn mock_asset(server: &MockServer, tag: &str, name: &str, content: &[u8]) {
    Mock::given(method("GET"))
        .and(path(asset_path(tag, name)))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(content.to_vec()))
        .mount(server)
        .await;
}

/// Answer an asset request with `status`
pub async fn mock_asset_status(server: &MockServer, tag: &str, name: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(asset_path(tag, name)))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

/// Serve an asset after a delay
pub async fn mock_slow_asset(
    server: &MockServer,
    tag: &str,
    name: &str,
    content: &[u8],
    delay: Duration,
) {
    Mock::given(method("GET"))
        .and(path(asset_path(tag, name)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(content.to_vec())
                .set_delay(delay),
        )
        .mount(server)
        .await;
}

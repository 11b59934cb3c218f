//! Builder for GitHub release JSON payloads
//!
//! Produces the JSON the releases API returns, with asset download URLs
//! pointing at the mock server.

use serde_json::{json, Value};

use super::constants::*;

/// Builder for release payloads with sensible test defaults
#[derive(Debug, Clone)]
pub struct ReleaseBuilder {
    base_url: String,
    tag_name: String,
    name: Option<String>,
    body: Option<String>,
    draft: bool,
    prerelease: bool,
    assets: Vec<Value>,
}

impl ReleaseBuilder {
    /// Start a release whose assets are served from `base_url`
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            tag_name: tool_tag(VERSION_1_6_0),
            name: None,
            body: None,
            draft: false,
            prerelease: false,
            assets: Vec::new(),
        }
    }

    /// Set the tag name
    pub fn tag(mut self, tag: &str) -> Self {
        self.tag_name = tag.to_string();
        self
    }

    /// Tool-specific tag for the tool under test
    pub fn tool_version(self, version: &str) -> Self {
        self.tag(&tool_tag(version))
    }

    /// Combined `v{version}` tag
    pub fn combined(self, version: &str) -> Self {
        let tag = format!("v{}", version);
        self.tag(&tag)
    }

    /// Set the release name
    pub fn name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    /// Set the release body/changelog
    pub fn body(mut self, body: &str) -> Self {
        self.body = Some(body.to_string());
        self
    }

    /// Mark as draft
    pub fn draft(mut self) -> Self {
        self.draft = true;
        self
    }

    /// Mark as prerelease
    pub fn prerelease(mut self) -> Self {
        self.prerelease = true;
        self
    }

    /// Add an asset served at [`asset_path`]
    pub fn asset(mut self, name: &str, size: u64) -> Self {
        let url = format!("{}{}", self.base_url, asset_path(&self.tag_name, name));
        self.assets.push(json!({
            "name": name,
            "browser_download_url": url,
            "size": size,
        }));
        self
    }

    /// Add the linux-amd64 binary of the tool under test
    pub fn with_binary(self, size: u64) -> Self {
        self.asset(TEST_ASSET_NAME, size)
    }

    /// Add `checksums.txt`
    pub fn with_checksums(self) -> Self {
        self.asset("checksums.txt", 0)
    }

    /// Add `versions.json`
    pub fn with_versions(self) -> Self {
        self.asset("versions.json", 0)
    }

    /// Current tag name
    pub fn tag_name(&self) -> &str {
        &self.tag_name
    }

    /// Build the JSON payload
    pub fn build(self) -> Value {
        json!({
            "tag_name": self.tag_name,
            "name": self.name,
            "body": self.body,
            "draft": self.draft,
            "prerelease": self.prerelease,
            "published_at": "2024-01-05T00:00:00Z",
            "assets": self.assets,
        })
    }
}

/// Server path an asset of `tag` is served from
pub fn asset_path(tag: &str, name: &str) -> String {
    format!("/download/{}/{}", tag, name)
}

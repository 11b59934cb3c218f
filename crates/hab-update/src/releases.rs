//! GitHub releases lookup
//!
//! Tools are published under two tag conventions:
//! - tool-specific tags, `{tool_tag}/v{version}` (e.g. `ha-ws-client-go/v1.5.4`)
//! - combined tags, `v{version}`, bundling several tools in one release. The
//!   per-tool versions live in the release's `versions.json` asset.

use chrono::{DateTime, Utc};
use reqwest::header::ACCEPT;
use semver::Version;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::UpdaterConfig;
use crate::error::{Error, ErrorKind, Result};
use crate::http::{build_client, check_response, GITHUB_ACCEPT};

/// Checksum manifest asset name
pub const CHECKSUMS_ASSET: &str = "checksums.txt";

/// Per-tool version map asset name, present on combined releases
pub const VERSIONS_ASSET: &str = "versions.json";

/// Releases requested per page
const PER_PAGE: usize = 100;

/// Upper bound on pages fetched when listing releases
const MAX_PAGES: u32 = 10;

/// Release information
#[derive(Debug, Clone, Deserialize)]
pub struct Release {
    /// Release tag (e.g., "ha-ws-client-go/v1.5.4" or "v1.6.0")
    pub tag_name: String,

    /// Release name
    #[serde(default)]
    pub name: Option<String>,

    /// Release body (changelog)
    #[serde(default)]
    pub body: Option<String>,

    /// Whether this is a draft
    #[serde(default)]
    pub draft: bool,

    /// Whether this is a prerelease
    #[serde(default)]
    pub prerelease: bool,

    /// Published date
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,

    /// Release assets
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}

/// Release asset
#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseAsset {
    /// Asset name
    pub name: String,

    /// Download URL
    pub browser_download_url: String,

    /// Asset size in bytes
    #[serde(default)]
    pub size: u64,
}

impl Release {
    /// Find an asset by exact name
    pub fn find_asset(&self, name: &str) -> Option<&ReleaseAsset> {
        self.assets.iter().find(|a| a.name == name)
    }

    /// The `checksums.txt` asset
    pub fn checksums_asset(&self) -> Option<&ReleaseAsset> {
        self.find_asset(CHECKSUMS_ASSET)
    }

    /// The `versions.json` asset
    pub fn versions_asset(&self) -> Option<&ReleaseAsset> {
        self.find_asset(VERSIONS_ASSET)
    }

    /// Whether the tag is a combined `v{semver}` tag
    pub fn is_combined(&self) -> bool {
        !self.tag_name.contains('/')
            && self
                .tag_name
                .strip_prefix('v')
                .is_some_and(|v| Version::parse(v).is_ok())
    }

    /// Whether the tag is tool-specific for `tool_tag`
    pub fn is_for_tool(&self, tool_tag: &str) -> bool {
        self.tag_name.starts_with(&tool_prefix(tool_tag))
    }

    /// Whether any asset is a binary of `binary_name`
    pub fn has_binary(&self, binary_name: &str) -> bool {
        let prefix = format!("{}-", binary_name);
        self.assets.iter().any(|a| a.name.starts_with(&prefix))
    }
}

/// Version carried by a tool-specific tag, e.g. `1.5.4` from `ha-ws-client-go/v1.5.4`
pub fn extract_version<'a>(tag: &'a str, tool_tag: &str) -> Option<&'a str> {
    tag.strip_prefix(tool_tag)
        .and_then(|rest| rest.strip_prefix("/v"))
        .filter(|v| !v.is_empty())
}

fn tool_prefix(tool_tag: &str) -> String {
    format!("{}/v", tool_tag)
}

/// Contents of `versions.json`: tool tag to version
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct ToolVersions(HashMap<String, String>);

impl ToolVersions {
    /// Version published for a tool tag
    pub fn get(&self, tool_tag: &str) -> Option<&str> {
        self.0.get(tool_tag).map(String::as_str)
    }
}

impl FromIterator<(String, String)> for ToolVersions {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// A release together with the tool version it publishes
#[derive(Debug, Clone)]
pub struct ResolvedRelease {
    /// The release
    pub release: Release,

    /// Tool version, without a leading `v`
    pub version: String,
}

/// Release manager for resolving tool releases
pub struct ReleaseManager {
    /// GitHub API client
    client: reqwest::Client,

    /// `{api}/repos/{owner}/{repo}`
    repo_url: String,

    /// Timeout for every metadata request
    timeout: Duration,
}

impl ReleaseManager {
    /// Create a release manager for the configured repository
    pub fn new(config: &UpdaterConfig) -> Result<Self> {
        Ok(Self::with_client(build_client(config)?, config))
    }

    /// Create a release manager sharing an existing client
    pub fn with_client(client: reqwest::Client, config: &UpdaterConfig) -> Self {
        Self {
            client,
            repo_url: config.repo_url(),
            timeout: config.check_timeout,
        }
    }

    /// List published releases, newest first
    ///
    /// Follows pagination until a short page; drafts are dropped.
    pub async fn list_releases(&self) -> Result<Vec<Release>> {
        let mut releases = Vec::new();

        for page in 1..=MAX_PAGES {
            let url = format!(
                "{}/releases?per_page={}&page={}",
                self.repo_url, PER_PAGE, page
            );
            let batch: Vec<Release> = self.get_json(&url).await?;
            let count = batch.len();
            debug!("Fetched {} releases from page {}", count, page);

            releases.extend(batch.into_iter().filter(|r| !r.draft));

            if count < PER_PAGE {
                break;
            }
        }

        Ok(releases)
    }

    /// Get release by tag
    pub async fn get_release(&self, tag: &str) -> Result<Release> {
        let url = format!("{}/releases/tags/{}", self.repo_url, tag);
        self.get_json(&url).await
    }

    /// Releases relevant to a tool, newest first
    ///
    /// Keeps API order. A release matches when its tag is tool-specific, or
    /// when it is combined and ships a `{binary_name}-*` asset. Combined
    /// releases are only considered when `binary_name` is given.
    pub async fn list_releases_for_tool(
        &self,
        tool_tag: &str,
        binary_name: Option<&str>,
    ) -> Result<Vec<Release>> {
        let releases = self.list_releases().await?;
        let filtered = filter_for_tool(releases, tool_tag, binary_name);

        if filtered.is_empty() {
            debug!("No releases match tool {}", tool_tag);
            return Err(Error::NoRelease);
        }

        Ok(filtered)
    }

    /// Latest release for a tool
    pub async fn latest_release_for_tool(
        &self,
        tool_tag: &str,
        binary_name: Option<&str>,
    ) -> Result<Release> {
        Ok(self.resolve_latest(tool_tag, binary_name).await?.release)
    }

    /// Latest release for a tool and the version it publishes
    ///
    /// The first matching release in API order wins. When that is a combined
    /// release, a tool-specific release of the same tool version replaces it.
    pub async fn resolve_latest(
        &self,
        tool_tag: &str,
        binary_name: Option<&str>,
    ) -> Result<ResolvedRelease> {
        let mut releases = self
            .list_releases_for_tool(tool_tag, binary_name)
            .await?
            .into_iter();
        let Some(first) = releases.next() else {
            return Err(Error::NoRelease);
        };

        let version = self.release_version(&first, tool_tag).await?;
        let release = if first.is_for_tool(tool_tag) {
            first
        } else {
            match same_version_tool_release(releases, tool_tag, &version) {
                Some(tool_release) => {
                    debug!(
                        "{} publishes {} {}, preferring {}",
                        first.tag_name, tool_tag, version, tool_release.tag_name
                    );
                    tool_release
                }
                None => first,
            }
        };

        debug!("Latest release for {}: {} ({})", tool_tag, release.tag_name, version);
        Ok(ResolvedRelease { release, version })
    }

    /// Release publishing `version` of a tool
    ///
    /// Tries the tool-specific tag first. On 404 scans combined releases for a
    /// `versions.json` mapping the tool to `version`.
    pub async fn release_for_version(
        &self,
        tool_tag: &str,
        binary_name: Option<&str>,
        version: &str,
    ) -> Result<Release> {
        let version = version.trim_start_matches('v');
        let tag = format!("{}{}", tool_prefix(tool_tag), version);

        match self.get_release(&tag).await {
            Ok(release) => return Ok(release),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("Tag {} not found, searching combined releases", tag);
            }
            Err(e) => return Err(e),
        }

        let Some(binary_name) = binary_name else {
            return Err(Error::version_not_found(version));
        };

        let releases = match self.list_releases_for_tool(tool_tag, Some(binary_name)).await {
            Ok(releases) => releases,
            Err(Error::NoRelease) => return Err(Error::version_not_found(version)),
            Err(e) => return Err(e),
        };

        for release in releases.into_iter().filter(|r| !r.is_for_tool(tool_tag)) {
            let versions = match self.fetch_tool_versions(&release).await {
                Ok(Some(versions)) => versions,
                Ok(None) => continue,
                Err(e) => {
                    warn!("Skipping {}: {}", release.tag_name, e);
                    continue;
                }
            };

            if versions.get(tool_tag) == Some(version) {
                info!("Found {} {} in combined release {}", tool_tag, version, release.tag_name);
                return Ok(release);
            }
        }

        Err(Error::version_not_found(version))
    }

    /// Download and parse a release's `versions.json`
    ///
    /// `None` when the release has no such asset or the download 404s.
    pub async fn fetch_tool_versions(&self, release: &Release) -> Result<Option<ToolVersions>> {
        let Some(asset) = release.versions_asset() else {
            return Ok(None);
        };

        match self.get_json::<ToolVersions>(&asset.browser_download_url).await {
            Ok(versions) => Ok(Some(versions)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Version of a tool a release publishes
    ///
    /// Tool-specific tags carry it directly. Combined releases are looked up
    /// in `versions.json`, falling back to the tag without its `v`.
    pub async fn release_version(&self, release: &Release, tool_tag: &str) -> Result<String> {
        if let Some(version) = extract_version(&release.tag_name, tool_tag) {
            return Ok(version.to_string());
        }

        if !release.is_combined() {
            return Err(Error::InvalidTag {
                tag: release.tag_name.clone(),
            });
        }

        match self.fetch_tool_versions(release).await {
            Ok(Some(versions)) => {
                if let Some(v) = versions.get(tool_tag) {
                    return Ok(v.to_string());
                }
            }
            Ok(None) => {}
            Err(e) => warn!("Could not read {} for {}: {}", VERSIONS_ASSET, release.tag_name, e),
        }

        Ok(release.tag_name.trim_start_matches('v').to_string())
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .header(ACCEPT, GITHUB_ACCEPT)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| Error::from_request(url, self.timeout, e))?;

        let response = check_response(response)?;

        response.json::<T>().await.map_err(|e| {
            if e.is_timeout() {
                Error::from_request(url, self.timeout, e)
            } else {
                Error::invalid_response(url, e)
            }
        })
    }
}

/// Keep tool-specific releases and combined releases shipping the binary, in API order
fn filter_for_tool(releases: Vec<Release>, tool_tag: &str, binary_name: Option<&str>) -> Vec<Release> {
    releases
        .into_iter()
        .filter(|r| {
            r.is_for_tool(tool_tag)
                || binary_name.is_some_and(|name| r.is_combined() && r.has_binary(name))
        })
        .collect()
}

/// Tool-specific release whose tag carries `version`
fn same_version_tool_release(
    releases: impl IntoIterator<Item = Release>,
    tool_tag: &str,
    version: &str,
) -> Option<Release> {
    let version = version.trim_start_matches('v');
    releases
        .into_iter()
        .find(|r| extract_version(&r.tag_name, tool_tag) == Some(version))
}

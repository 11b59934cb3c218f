//! Update engine configuration

use hab_core::types::RuntimeConfig;
use std::path::PathBuf;
use std::time::Duration;

/// Default GitHub API base URL
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Default release repository owner
pub const DEFAULT_REPO_OWNER: &str = "schoolboyqueue";

/// Default release repository name
pub const DEFAULT_REPO_NAME: &str = "home-assistant-blueprints";

/// Default timeout for release metadata, checksums and versions.json
pub const DEFAULT_CHECK_TIMEOUT: Duration = Duration::from_secs(30);

/// Default timeout for binary downloads
pub const DEFAULT_DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(120);

/// Settings for talking to the release API and installing binaries
#[derive(Debug, Clone)]
pub struct UpdaterConfig {
    /// GitHub API base URL, without trailing slash
    pub api_url: String,

    /// Repository owner
    pub repo_owner: String,

    /// Repository name
    pub repo_name: String,

    /// Timeout for metadata requests
    pub check_timeout: Duration,

    /// Timeout for binary downloads
    pub download_timeout: Duration,

    /// User-Agent header value
    pub user_agent: String,

    /// ARM sub-version for 32-bit ARM hosts
    pub arm_version: Option<String>,

    /// Show a progress bar while downloading
    pub show_progress: bool,

    /// Directory for downloads; defaults to the executable's directory
    pub download_dir: Option<PathBuf>,
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            repo_owner: DEFAULT_REPO_OWNER.to_string(),
            repo_name: DEFAULT_REPO_NAME.to_string(),
            check_timeout: DEFAULT_CHECK_TIMEOUT,
            download_timeout: DEFAULT_DOWNLOAD_TIMEOUT,
            user_agent: format!("hab-update/{}", env!("CARGO_PKG_VERSION")),
            arm_version: None,
            show_progress: true,
            download_dir: None,
        }
    }
}

impl UpdaterConfig {
    /// Point the engine at a different API, e.g. a mock server
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the release repository
    pub fn with_repo(mut self, owner: impl Into<String>, name: impl Into<String>) -> Self {
        self.repo_owner = owner.into();
        self.repo_name = name.into();
        self
    }

    /// Set both request timeouts
    pub fn with_timeouts(mut self, check: Duration, download: Duration) -> Self {
        self.check_timeout = check;
        self.download_timeout = download;
        self
    }

    /// Set the ARM sub-version
    pub fn with_arm_version(mut self, version: Option<String>) -> Self {
        self.arm_version = version;
        self
    }

    /// Enable or disable the progress bar
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Download into a fixed directory instead of next to the executable
    pub fn with_download_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.download_dir = Some(dir.into());
        self
    }

    /// `{api}/repos/{owner}/{repo}` prefix for release endpoints
    pub(crate) fn repo_url(&self) -> String {
        format!(
            "{}/repos/{}/{}",
            self.api_url, self.repo_owner, self.repo_name
        )
    }
}

impl From<&RuntimeConfig> for UpdaterConfig {
    fn from(runtime: &RuntimeConfig) -> Self {
        Self {
            api_url: runtime.github.api_url.trim_end_matches('/').to_string(),
            repo_owner: runtime.github.repo_owner.clone(),
            repo_name: runtime.github.repo_name.clone(),
            check_timeout: Duration::from_secs(runtime.network.check_timeout_secs),
            download_timeout: Duration::from_secs(runtime.network.download_timeout_secs),
            user_agent: runtime.network.user_agent.clone(),
            arm_version: runtime.platform.arm_version.clone(),
            show_progress: runtime.display.show_progress,
            download_dir: None,
        }
    }
}

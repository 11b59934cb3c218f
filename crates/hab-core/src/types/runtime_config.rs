//! Runtime configuration types for operational parameters
//!
//! These types define configuration that controls runtime behavior like
//! network timeouts, the release repository and output display.

use serde::{Deserialize, Serialize};

/// Complete runtime configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RuntimeConfig {
    /// Network and HTTP configuration
    #[serde(default)]
    pub network: NetworkConfig,

    /// GitHub repository settings
    #[serde(default)]
    pub github: GitHubConfig,

    /// Platform overrides
    #[serde(default)]
    pub platform: PlatformConfig,

    /// Display and output settings
    #[serde(default)]
    pub display: DisplayConfig,
}

/// Network and HTTP configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct NetworkConfig {
    /// Timeout for release metadata, checksum and versions requests
    #[serde(default = "default_check_timeout")]
    pub check_timeout_secs: u64,

    /// Timeout for binary downloads
    #[serde(default = "default_download_timeout")]
    pub download_timeout_secs: u64,

    /// User agent string for HTTP requests
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            check_timeout_secs: default_check_timeout(),
            download_timeout_secs: default_download_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_check_timeout() -> u64 {
    30
}
fn default_download_timeout() -> u64 {
    120 // 2 minutes
}
fn default_user_agent() -> String {
    format!(
        "hab/{} ({}; {})",
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS,
        std::env::consts::ARCH
    )
}

/// GitHub repository configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct GitHubConfig {
    /// Repository owner
    #[serde(default = "default_repo_owner")]
    pub repo_owner: String,

    /// Repository name
    #[serde(default = "default_repo_name")]
    pub repo_name: String,

    /// Base URL for GitHub API
    #[serde(default = "default_github_api_url")]
    pub api_url: String,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            repo_owner: default_repo_owner(),
            repo_name: default_repo_name(),
            api_url: default_github_api_url(),
        }
    }
}

fn default_repo_owner() -> String {
    "schoolboyqueue".to_string()
}
fn default_repo_name() -> String {
    "home-assistant-blueprints".to_string()
}
fn default_github_api_url() -> String {
    "https://api.github.com".to_string()
}

/// Platform configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PlatformConfig {
    /// ARM sub-version ("6" or "7") for 32-bit ARM builds.
    /// Overrides the value baked in at build time.
    #[serde(default)]
    pub arm_version: Option<String>,
}

/// Display and output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DisplayConfig {
    /// Show a progress bar while downloading
    #[serde(default = "default_show_progress")]
    pub show_progress: bool,

    /// Enable colored output
    #[serde(default = "default_color_enabled")]
    pub color_enabled: bool,

    /// Number of changelog lines to preview
    #[serde(default = "default_preview_lines")]
    pub preview_lines: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            show_progress: default_show_progress(),
            color_enabled: default_color_enabled(),
            preview_lines: default_preview_lines(),
        }
    }
}

fn default_show_progress() -> bool {
    true
}
fn default_color_enabled() -> bool {
    true
}
fn default_preview_lines() -> usize {
    10
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runtime_config_defaults() {
        let config = RuntimeConfig::default();
        assert_eq!(config.network.check_timeout_secs, 30);
        assert_eq!(config.network.download_timeout_secs, 120);
        assert_eq!(config.github.repo_owner, "schoolboyqueue");
        assert_eq!(config.github.repo_name, "home-assistant-blueprints");
        assert_eq!(config.github.api_url, "https://api.github.com");
        assert!(config.platform.arm_version.is_none());
        assert!(config.display.show_progress);
    }

    #[test]
    fn test_default_user_agent_names_the_client() {
        let config = NetworkConfig::default();
        assert!(config.user_agent.starts_with("hab/"));
    }

    #[test]
    fn test_network_config_serialization() {
        let config = NetworkConfig::default();
        let yaml = serde_yaml_ng::to_string(&config).unwrap();
        assert!(yaml.contains("check-timeout-secs: 30"));
        let deserialized: NetworkConfig = serde_yaml_ng::from_str(&yaml).unwrap();
        assert_eq!(config.download_timeout_secs, deserialized.download_timeout_secs);
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let yaml = "github:\n  repo-owner: someone-else\n";
        let config: RuntimeConfig = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(config.github.repo_owner, "someone-else");
        assert_eq!(config.github.repo_name, "home-assistant-blueprints");
        assert_eq!(config.network.check_timeout_secs, 30);
    }
}

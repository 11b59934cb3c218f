//! Update workflows: check, update, update to a version, list versions
//!
//! [`Updater::update_to_version`] performs the following steps:
//! 1. Resolve the release publishing the target version
//! 2. Locate the platform binary and `checksums.txt` in it
//! 3. Resolve the installed executable and check its directory is writable
//! 4. Download the checksum manifest and look up the binary's digest
//! 5. Download the binary next to the executable
//! 6. Verify the digest
//! 7. Swap the executable, restoring it if the swap fails
//!
//! Nothing is written to the executable's directory before step 5, and the
//! download is deleted on every failure path.

use semver::Version;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::checksum::verify_checksum;
use crate::config::UpdaterConfig;
use crate::download::BinaryDownloader;
use crate::error::{Error, Operation, UpdateError};
use crate::http::build_client;
use crate::installer::{
    resolve_executable_path, resolve_target_path, BinaryInstaller, FsRename, Rename,
};
use crate::platform::Platform;
use crate::progress::{NoProgress, ProgressBarObserver, ProgressObserver};
use crate::releases::{extract_version, Release, ReleaseManager, ResolvedRelease};

/// Version reported by development builds; always considered outdated
pub const DEV_VERSION: &str = "dev";

/// Identity of an updatable tool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolSpec {
    /// Binary name used in asset names, e.g. `ha-ws-client`
    pub name: String,

    /// Tag prefix of tool-specific releases, e.g. `ha-ws-client-go`
    pub tag: String,
}

impl ToolSpec {
    /// Create a tool spec
    pub fn new(name: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tag: tag.into(),
        }
    }
}

/// Outcome of [`Updater::check`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateResult {
    /// Installed version
    pub current_version: String,

    /// Newest published version
    pub latest_version: String,

    /// Whether the newest version should be installed
    pub update_available: bool,

    /// Platform binary URL, set when an update is available
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,

    /// `checksums.txt` URL, set when an update is available
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checksum_url: Option<String>,

    /// Platform binary size in bytes, 0 when unknown
    pub asset_size: u64,
}

/// A completed installation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateOutcome {
    /// Version replaced
    pub previous_version: String,

    /// Version now installed
    pub installed_version: String,

    /// Executable that was replaced
    pub path: PathBuf,
}

/// Whether `target` should replace `current`
///
/// `dev` always updates. Semver versions compare by precedence, anything
/// else updates when the strings differ. A leading `v` is ignored.
pub fn needs_update(current: &str, target: &str) -> bool {
    if current == DEV_VERSION {
        return true;
    }

    let current = current.trim_start_matches('v');
    let target = target.trim_start_matches('v');

    match (Version::parse(current), Version::parse(target)) {
        (Ok(current), Ok(target)) => target > current,
        _ => current != target,
    }
}

/// Self-updater for one tool
pub struct Updater {
    tool: ToolSpec,
    current_version: String,
    platform: Platform,
    config: UpdaterConfig,
    releases: ReleaseManager,
    downloader: BinaryDownloader,
    installer: BinaryInstaller<Box<dyn Rename>>,
    observer: Box<dyn ProgressObserver>,
    executable_path: Option<PathBuf>,
}

impl Updater {
    /// Create an updater for `tool` running at `current_version`
    ///
    /// Detects the platform up front, so an unsupported host fails here.
    pub fn new(
        tool: ToolSpec,
        current_version: impl Into<String>,
        config: UpdaterConfig,
    ) -> Result<Self, UpdateError> {
        let current_version = current_version.into();

        let platform = Platform::detect(config.arm_version.as_deref())
            .map_err(|e| UpdateError::new(Operation::Check, &tool.name, None, e))?;
        let client = build_client(&config)
            .map_err(|e| UpdateError::new(Operation::Check, &tool.name, None, e))?;

        let observer: Box<dyn ProgressObserver> = if config.show_progress {
            Box::new(ProgressBarObserver::new())
        } else {
            Box::new(NoProgress)
        };

        debug!(
            "Updater initialized: tool={}, version={}, platform={}",
            tool.name, current_version, platform
        );

        Ok(Self {
            releases: ReleaseManager::with_client(client.clone(), &config),
            downloader: BinaryDownloader::with_client(client, &config),
            installer: BinaryInstaller::with_renamer(Box::new(FsRename) as Box<dyn Rename>),
            observer,
            executable_path: None,
            tool,
            current_version,
            platform,
            config,
        })
    }

    /// Use a fixed platform instead of the detected one
    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    /// Replace this executable instead of the running one
    pub fn with_executable_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.executable_path = Some(path.into());
        self
    }

    /// Report download progress to `observer`
    pub fn with_observer(mut self, observer: impl ProgressObserver + 'static) -> Self {
        self.observer = Box::new(observer);
        self
    }

    /// Rename implementation used when swapping the executable
    pub fn with_renamer(mut self, renamer: impl Rename + 'static) -> Self {
        self.installer = BinaryInstaller::with_renamer(Box::new(renamer) as Box<dyn Rename>);
        self
    }

    /// Tool being updated
    pub fn tool(&self) -> &ToolSpec {
        &self.tool
    }

    /// Installed version
    pub fn current_version(&self) -> &str {
        &self.current_version
    }

    /// Platform binaries are selected for
    pub fn platform(&self) -> &Platform {
        &self.platform
    }

    /// Asset name of this tool's binary for the platform
    pub fn asset_name(&self) -> String {
        self.platform.asset_name(&self.tool.name)
    }

    /// Look up the newest release without downloading anything
    pub async fn check(&self) -> Result<UpdateResult, UpdateError> {
        let latest = self.latest_release().await?;
        Ok(self.check_release(&latest))
    }

    /// Newest release of the tool and the version it publishes
    ///
    /// Pair with [`Updater::check_release`] and [`Updater::update_to_release`]
    /// to report and install from a single release listing.
    pub async fn latest_release(&self) -> Result<ResolvedRelease, UpdateError> {
        self.releases
            .resolve_latest(&self.tool.tag, Some(&self.tool.name))
            .await
            .map_err(|e| self.error(Operation::Check, None, e))
    }

    /// Compare an already resolved release against the installed version
    pub fn check_release(&self, latest: &ResolvedRelease) -> UpdateResult {
        let release = &latest.release;
        let update_available = needs_update(&self.current_version, &latest.version);
        info!(
            "{} current={} latest={} update_available={}",
            self.tool.name, self.current_version, latest.version, update_available
        );

        let mut result = UpdateResult {
            current_version: self.current_version.clone(),
            latest_version: latest.version.clone(),
            update_available,
            download_url: None,
            checksum_url: None,
            asset_size: 0,
        };

        if update_available {
            if let Some(asset) = release.find_asset(&self.asset_name()) {
                result.download_url = Some(asset.browser_download_url.clone());
                result.asset_size = asset.size;
            }
            result.checksum_url = release
                .checksums_asset()
                .map(|a| a.browser_download_url.clone());
        }

        result
    }

    /// Install the newest release
    ///
    /// Fails with [`Error::AlreadyLatest`] when the installed version is not
    /// older than it.
    pub async fn update(&self) -> Result<UpdateOutcome, UpdateError> {
        let latest = self.latest_release().await?;
        self.update_to_release(&latest).await
    }

    /// Install an already resolved release
    ///
    /// Same rules as [`Updater::update`], without listing releases again.
    pub async fn update_to_release(
        &self,
        latest: &ResolvedRelease,
    ) -> Result<UpdateOutcome, UpdateError> {
        if !needs_update(&self.current_version, &latest.version) {
            info!("{} is already at {}", self.tool.name, self.current_version);
            return Err(self.error(
                Operation::Check,
                Some(&latest.version),
                Error::AlreadyLatest {
                    version: self.current_version.clone(),
                },
            ));
        }

        self.install_release(&latest.release, &latest.version).await
    }

    /// Install a specific version, downgrades included
    ///
    /// Fails with [`Error::AlreadyLatest`] only when `version` is the installed one.
    pub async fn update_to_version(&self, version: &str) -> Result<UpdateOutcome, UpdateError> {
        let version = version.trim().trim_start_matches('v');

        let release = self
            .releases
            .release_for_version(&self.tool.tag, Some(&self.tool.name), version)
            .await
            .map_err(|e| self.error(Operation::Check, Some(version), e))?;

        let target_version = extract_version(&release.tag_name, &self.tool.tag)
            .unwrap_or(version)
            .to_string();

        if self.current_version != DEV_VERSION
            && self.current_version.trim_start_matches('v') == target_version
        {
            return Err(self.error(
                Operation::Check,
                Some(&target_version),
                Error::AlreadyLatest {
                    version: target_version.clone(),
                },
            ));
        }

        self.install_release(&release, &target_version).await
    }

    /// Versions published under tool-specific tags, newest first
    pub async fn list_available_versions(&self) -> Result<Vec<String>, UpdateError> {
        let releases = self
            .releases
            .list_releases_for_tool(&self.tool.tag, None)
            .await
            .map_err(|e| self.error(Operation::List, None, e))?;

        Ok(releases
            .iter()
            .filter_map(|r| extract_version(&r.tag_name, &self.tool.tag))
            .map(String::from)
            .collect())
    }

    async fn install_release(
        &self,
        release: &Release,
        version: &str,
    ) -> Result<UpdateOutcome, UpdateError> {
        let v = Some(version);
        let asset_name = self.asset_name();
        info!("Updating {} to {} from {}", self.tool.name, version, release.tag_name);

        let asset = release.find_asset(&asset_name).ok_or_else(|| {
            self.error(
                Operation::Download,
                v,
                Error::AssetNotFound {
                    asset: asset_name.clone(),
                    tag: release.tag_name.clone(),
                },
            )
        })?;

        let checksums_asset = release.checksums_asset().ok_or_else(|| {
            self.error(
                Operation::Verify,
                v,
                Error::MissingChecksumManifest {
                    tag: release.tag_name.clone(),
                },
            )
        })?;

        let target = self
            .target_path()
            .map_err(|e| self.error(Operation::Replace, v, e))?;

        let checksums = self
            .downloader
            .fetch_checksums(&checksums_asset.browser_download_url)
            .await
            .map_err(|e| self.error(Operation::Verify, v, e))?;

        let expected = checksums.get(&asset_name).ok_or_else(|| {
            self.error(
                Operation::Verify,
                v,
                Error::MissingChecksumEntry {
                    asset: asset_name.clone(),
                },
            )
        })?;

        let download_dir = self
            .config
            .download_dir
            .clone()
            .or_else(|| target.parent().map(Path::to_path_buf))
            .unwrap_or_else(std::env::temp_dir);

        let downloaded = self
            .downloader
            .download_in(
                &download_dir,
                &asset.browser_download_url,
                asset.size,
                self.config.download_timeout,
                &*self.observer,
            )
            .await
            .map_err(|e| self.error(Operation::Download, v, e))?;

        verify_checksum(downloaded.path(), expected)
            .map_err(|e| self.error(Operation::Verify, v, e))?;

        self.installer
            .install(downloaded.path(), &target)
            .map_err(|e| self.error(Operation::Replace, v, e))?;

        info!("Updated {} {} -> {}", self.tool.name, self.current_version, version);

        Ok(UpdateOutcome {
            previous_version: self.current_version.clone(),
            installed_version: version.to_string(),
            path: target,
        })
    }

    fn target_path(&self) -> crate::Result<PathBuf> {
        match &self.executable_path {
            Some(path) => resolve_target_path(path),
            None => resolve_executable_path(),
        }
    }

    fn error(&self, op: Operation, version: Option<&str>, source: Error) -> UpdateError {
        UpdateError::new(op, &self.tool.name, version, source)
    }
}

//! Self-update engine for hab tools
//!
//! Provides:
//! - Release resolution across tool-specific (`{tool}/v1.2.3`) and combined (`v1.2.3`) tags
//! - Platform detection and release asset naming
//! - Streaming downloads with progress reporting
//! - SHA-256 verification against the release's `checksums.txt`
//! - Replacement of the running executable with restore on failure

pub mod checksum;
pub mod config;
pub mod download;
pub mod error;
mod http;
pub mod installer;
pub mod platform;
pub mod progress;
pub mod releases;
pub mod updater;

pub use checksum::{
    compute_checksum, compute_reader_checksum, verify_checksum, verify_reader_checksum, Checksums,
};
pub use config::UpdaterConfig;
pub use download::{BinaryDownloader, DownloadedFile};
pub use error::{Error, ErrorKind, Operation, Result, UpdateError};
pub use installer::{BinaryInstaller, FsRename, Rename};
pub use platform::{Platform, SUPPORTED_ARCHITECTURES};
pub use progress::{DownloadProgress, NoProgress, ProgressBarObserver, ProgressObserver};
pub use releases::{
    extract_version, Release, ReleaseAsset, ReleaseManager, ResolvedRelease, ToolVersions,
    CHECKSUMS_ASSET, VERSIONS_ASSET,
};
pub use updater::{needs_update, ToolSpec, UpdateOutcome, UpdateResult, Updater, DEV_VERSION};

/// Engine version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

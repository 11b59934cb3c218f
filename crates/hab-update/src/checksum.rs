//! SHA-256 checksum manifests and digest verification
//!
//! Releases publish a `checksums.txt` in `sha256sum` format:
//!
//! ```text
//! e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855  ha-ws-client-linux-amd64
//! ```

use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

use crate::error::{Error, Result};

/// Length of a hex-encoded SHA-256 digest
const DIGEST_HEX_LEN: usize = 64;

/// Parsed checksum manifest: asset filename to lowercase hex digest
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Checksums {
    entries: HashMap<String, String>,
}

impl Checksums {
    /// Parse a `sha256sum`-style manifest
    ///
    /// Blank lines are skipped. Each remaining line must be a 64 character hex
    /// digest, one or two spaces, and a filename. A manifest without any entry
    /// is rejected.
    pub fn parse(text: &str) -> Result<Self> {
        let mut entries = HashMap::new();

        for (idx, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }

            let (digest, name) = split_line(line)
                .ok_or_else(|| Error::invalid_manifest_line(idx + 1, "expected '<sha256>  <file>'"))?;

            if digest.len() != DIGEST_HEX_LEN || !digest.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(Error::invalid_manifest_line(
                    idx + 1,
                    format!("'{}' is not a SHA-256 digest", digest),
                ));
            }

            // sha256sum marks binary-mode entries with a leading '*'
            let name = name.strip_prefix('*').unwrap_or(name);
            if name.is_empty() {
                return Err(Error::invalid_manifest_line(idx + 1, "missing filename"));
            }

            entries.insert(name.to_string(), digest.to_ascii_lowercase());
        }

        if entries.is_empty() {
            return Err(Error::InvalidChecksumManifest {
                reason: "no checksum entries".to_string(),
            });
        }

        debug!("Parsed {} checksum entries", entries.len());
        Ok(Self { entries })
    }

    /// Digest for an asset, if listed
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the manifest has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(filename, digest)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl FromStr for Checksums {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Split on the two-space separator, falling back to a single space
fn split_line(line: &str) -> Option<(&str, &str)> {
    let (digest, name) = line.split_once("  ").or_else(|| line.split_once(' '))?;
    Some((digest, name.trim()))
}

/// Compute the SHA-256 digest of a file as lowercase hex
pub fn compute_checksum(path: &Path) -> Result<String> {
    let file = File::open(path)?;
    compute_reader_checksum(file)
}

/// Compute the SHA-256 digest of everything a reader yields
pub fn compute_reader_checksum<R: Read>(mut reader: R) -> Result<String> {
    let mut hasher = Sha256::new();
    io::copy(&mut reader, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}

/// Verify a file against an expected digest (case-insensitive)
pub fn verify_checksum(path: &Path, expected: &str) -> Result<()> {
    let actual = compute_checksum(path)?;
    check_digest(expected, actual, path)
}

/// Verify reader content against an expected digest; `name` labels the error
pub fn verify_reader_checksum<R: Read>(reader: R, expected: &str, name: &str) -> Result<()> {
    let actual = compute_reader_checksum(reader)?;
    check_digest(expected, actual, Path::new(name))
}

fn check_digest(expected: &str, actual: String, file: &Path) -> Result<()> {
    if actual.eq_ignore_ascii_case(expected.trim()) {
        debug!("Checksum verified for {}", file.display());
        Ok(())
    } else {
        Err(Error::ChecksumMismatch {
            expected: expected.trim().to_ascii_lowercase(),
            actual,
            file: file.to_path_buf(),
        })
    }
}

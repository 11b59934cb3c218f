//! Host platform detection and release asset naming

use std::fmt;

use crate::error::{Error, Result};

const OS_WINDOWS: &str = "windows";
const ARCH_ARM: &str = "arm";

/// Every `{os}-{arch}` suffix a release publishes a binary for
pub const SUPPORTED_ARCHITECTURES: &[&str] = &[
    "linux-amd64",
    "linux-arm64",
    "linux-armv7",
    "linux-armv6",
    "darwin-amd64",
    "darwin-arm64",
    "windows-amd64",
];

/// The OS/architecture combination this process runs on, in release naming
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Platform {
    os: String,
    arch: String,
    arm_version: Option<String>,
    file_extension: &'static str,
}

impl Platform {
    /// Detect the running platform
    ///
    /// `arm_version` is the ARM sub-version the binary was built for. It cannot
    /// be detected at runtime, so 32-bit ARM hosts need it supplied.
    pub fn detect(arm_version: Option<&str>) -> Result<Self> {
        Self::new(std::env::consts::OS, std::env::consts::ARCH, arm_version)
    }

    /// Build a platform from host OS/arch names
    ///
    /// Accepts Rust names (`macos`, `x86_64`, `aarch64`) as well as the release
    /// names they map to (`darwin`, `amd64`, `arm64`).
    pub fn new(os: &str, arch: &str, arm_version: Option<&str>) -> Result<Self> {
        let os = normalize_os(os);
        let arch = normalize_arch(arch);

        let arm_version = if arch == ARCH_ARM {
            match arm_version.map(str::trim).filter(|v| !v.is_empty()) {
                Some(v) => Some(v.to_string()),
                None => {
                    return Err(unsupported(&os, "arm (unknown version)"));
                }
            }
        } else {
            None
        };

        let platform = Self {
            file_extension: if os == OS_WINDOWS { ".exe" } else { "" },
            os,
            arch,
            arm_version,
        };

        if !SUPPORTED_ARCHITECTURES.contains(&platform.asset_suffix().as_str()) {
            return Err(unsupported(&platform.os, &platform.arch_string()));
        }

        Ok(platform)
    }

    /// Operating system name (`linux`, `darwin`, `windows`)
    pub fn os(&self) -> &str {
        &self.os
    }

    /// Bare architecture name (`amd64`, `arm64`, `arm`)
    pub fn arch(&self) -> &str {
        &self.arch
    }

    /// ARM sub-version, only set on 32-bit ARM
    pub fn arm_version(&self) -> Option<&str> {
        self.arm_version.as_deref()
    }

    /// Executable extension (`.exe` on Windows)
    pub fn file_extension(&self) -> &str {
        self.file_extension
    }

    /// Architecture including the ARM variant: `amd64`, `arm64`, `armv7`
    pub fn arch_string(&self) -> String {
        match (&self.arch[..], &self.arm_version) {
            (ARCH_ARM, Some(v)) => format!("armv{}", v),
            _ => self.arch.clone(),
        }
    }

    /// `{os}-{arch}` suffix used in asset names, e.g. `linux-armv7`
    pub fn asset_suffix(&self) -> String {
        format!("{}-{}", self.os, self.arch_string())
    }

    /// Asset name for a tool, e.g. `validate-blueprint-windows-amd64.exe`
    pub fn asset_name(&self, tool_name: &str) -> String {
        format!("{}-{}{}", tool_name, self.asset_suffix(), self.file_extension)
    }

    /// Error describing this platform as having no published asset
    pub fn unsupported_error(&self) -> Error {
        unsupported(&self.os, &self.arch_string())
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.asset_suffix())
    }
}

fn normalize_os(os: &str) -> String {
    match os.to_lowercase().as_str() {
        "macos" | "osx" => "darwin".to_string(),
        other => other.to_string(),
    }
}

fn normalize_arch(arch: &str) -> String {
    match arch.to_lowercase().as_str() {
        "x86_64" => "amd64".to_string(),
        "aarch64" => "arm64".to_string(),
        other => other.to_string(),
    }
}

fn unsupported(os: &str, arch: &str) -> Error {
    Error::UnsupportedArchitecture {
        os: os.to_string(),
        arch: arch.to_string(),
        supported: SUPPORTED_ARCHITECTURES.iter().map(|s| s.to_string()).collect(),
    }
}

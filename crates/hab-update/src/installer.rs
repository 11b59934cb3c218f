//! Replacing the running executable
//!
//! A running binary cannot be truncated on every platform, and Windows will
//! not let it be overwritten at all. It can still be renamed, so the installer
//! moves the current executable aside to `{target}.old`, renames the verified
//! download into its place, and restores `.old` if that last step fails.

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};

/// Suffix of the moved-aside executable
const OLD_SUFFIX: &str = ".old";

/// Sentinel written to test directory permissions
const WRITE_TEST_FILE: &str = ".hab-update-test";

/// File rename, injectable so failures can be simulated
pub trait Rename: Send + Sync {
    /// Rename `from` to `to`, replacing `to` where the platform allows
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;
}

impl<R: Rename + ?Sized> Rename for Box<R> {
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        (**self).rename(from, to)
    }
}

/// [`Rename`] backed by [`std::fs::rename`]
#[derive(Debug, Default, Clone, Copy)]
pub struct FsRename;

impl Rename for FsRename {
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        fs::rename(from, to)
    }
}

/// Swaps an executable for a verified replacement
#[derive(Debug, Default)]
pub struct BinaryInstaller<R: Rename = FsRename> {
    renamer: R,
}

impl BinaryInstaller {
    /// Create an installer using filesystem renames
    pub fn new() -> Self {
        Self { renamer: FsRename }
    }
}

impl<R: Rename> BinaryInstaller<R> {
    /// Create an installer with a custom rename implementation
    pub fn with_renamer(renamer: R) -> Self {
        Self { renamer }
    }

    /// Replace `target` with `new_file`
    ///
    /// `new_file` must already be verified and live on the same volume as
    /// `target`. It receives the target's permissions before the swap.
    pub fn install(&self, new_file: &Path, target: &Path) -> Result<()> {
        info!("Installing {} over {}", new_file.display(), target.display());

        let permissions = fs::metadata(target)
            .map_err(|e| Error::from_fs(target, "read", e))?
            .permissions();
        fs::set_permissions(new_file, permissions)
            .map_err(|e| Error::from_fs(new_file, "set permissions on", e))?;

        let old = old_path(target);
        remove_stale(&old);

        if let Err(e) = self.renamer.rename(target, &old) {
            debug!("Could not move {} aside ({}), replacing directly", target.display(), e);
            return self
                .renamer
                .rename(new_file, target)
                .map_err(|e| Error::from_fs(target, "replace", e));
        }

        if let Err(e) = self.renamer.rename(new_file, target) {
            warn!("Replacing {} failed, restoring previous binary", target.display());
            if let Err(restore) = self.renamer.rename(&old, target) {
                warn!(
                    "Could not restore {} from {}: {}",
                    target.display(),
                    old.display(),
                    restore
                );
            }
            return Err(Error::from_fs(target, "replace", e));
        }

        // Windows keeps the running image locked; the next run removes it
        if let Err(e) = fs::remove_file(&old) {
            debug!("Leaving {} in place: {}", old.display(), e);
        }

        info!("Installed {}", target.display());
        Ok(())
    }
}

/// `{target}.old`
pub fn old_path(target: &Path) -> PathBuf {
    let mut name = OsString::from(target.as_os_str());
    name.push(OLD_SUFFIX);
    PathBuf::from(name)
}

fn remove_stale(old: &Path) {
    match fs::remove_file(old) {
        Ok(()) => debug!("Removed stale {}", old.display()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => debug!("Could not remove stale {}: {}", old.display(), e),
    }
}

/// Path of the running executable with symlinks resolved, checked for write access
pub fn resolve_executable_path() -> Result<PathBuf> {
    let exe = std::env::current_exe()?;
    resolve_target_path(&exe)
}

/// Resolve symlinks in `path` and require its directory to be writable
pub fn resolve_target_path(path: &Path) -> Result<PathBuf> {
    let real = fs::canonicalize(path).map_err(|e| Error::from_fs(path, "resolve", e))?;

    let dir = real.parent().unwrap_or_else(|| Path::new("."));
    if let Err(e) = check_writable(dir) {
        debug!("{} is not writable: {}", dir.display(), e);
        return Err(Error::PermissionDenied {
            path: real,
            op: "write",
        });
    }

    Ok(real)
}

/// Check a directory is writable by creating and removing a sentinel file
pub fn check_writable(dir: &Path) -> io::Result<()> {
    let sentinel = dir.join(WRITE_TEST_FILE);
    fs::File::create(&sentinel)?;
    fs::remove_file(&sentinel)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    /// Fails the rename whose call index matches `fail_on`
    struct FailingRename {
        calls: AtomicUsize,
        fail_on: usize,
    }

    impl FailingRename {
        fn on_call(fail_on: usize) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail_on,
            }
        }
    }

    impl Rename for FailingRename {
        fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call == self.fail_on {
                return Err(io::Error::other("simulated rename failure"));
            }
            fs::rename(from, to)
        }
    }

    fn setup() -> (TempDir, PathBuf, PathBuf) {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("tool");
        let new_file = dir.path().join(".hab-download-new");
        fs::write(&target, b"old binary").unwrap();
        fs::write(&new_file, b"new binary").unwrap();
        (dir, target, new_file)
    }

    #[test]
    fn test_old_path_appends_suffix() {
        assert_eq!(old_path(Path::new("/usr/bin/tool")), PathBuf::from("/usr/bin/tool.old"));
        assert_eq!(
            old_path(Path::new("C:/bin/tool.exe")),
            PathBuf::from("C:/bin/tool.exe.old")
        );
    }

    #[test]
    fn test_install_replaces_target() {
        let (_dir, target, new_file) = setup();

        BinaryInstaller::new().install(&new_file, &target).unwrap();

        assert_eq!(fs::read(&target).unwrap(), b"new binary");
        assert!(!new_file.exists());
        assert!(!old_path(&target).exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_install_preserves_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let (_dir, target, new_file) = setup();
        fs::set_permissions(&target, fs::Permissions::from_mode(0o750)).unwrap();
        fs::set_permissions(&new_file, fs::Permissions::from_mode(0o600)).unwrap();

        BinaryInstaller::new().install(&new_file, &target).unwrap();

        let mode = fs::metadata(&target).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o750);
    }

    #[test]
    fn test_install_removes_stale_old() {
        let (_dir, target, new_file) = setup();
        fs::write(old_path(&target), b"stale").unwrap();

        BinaryInstaller::new().install(&new_file, &target).unwrap();

        assert_eq!(fs::read(&target).unwrap(), b"new binary");
        assert!(!old_path(&target).exists());
    }

    #[test]
    fn test_failed_final_rename_restores_original() {
        let (_dir, target, new_file) = setup();
        let installer = BinaryInstaller::with_renamer(FailingRename::on_call(1));

        let err = installer.install(&new_file, &target).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Install);
        assert_eq!(fs::read(&target).unwrap(), b"old binary");
        assert!(!old_path(&target).exists());
        assert!(new_file.exists());
    }

    #[test]
    fn test_failed_move_aside_falls_back_to_direct_rename() {
        let (_dir, target, new_file) = setup();
        let installer = BinaryInstaller::with_renamer(FailingRename::on_call(0));

        installer.install(&new_file, &target).unwrap();

        assert_eq!(fs::read(&target).unwrap(), b"new binary");
        assert!(!old_path(&target).exists());
    }

    #[test]
    fn test_missing_target_fails_before_rename() {
        let dir = TempDir::new().unwrap();
        let new_file = dir.path().join("new");
        fs::write(&new_file, b"new binary").unwrap();

        let err = BinaryInstaller::new()
            .install(&new_file, &dir.path().join("missing"))
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Install);
        assert!(new_file.exists());
    }

    #[test]
    fn test_resolve_target_path() {
        let (dir, target, _new) = setup();
        let resolved = resolve_target_path(&target).unwrap();
        assert_eq!(resolved, fs::canonicalize(&target).unwrap());
        assert!(!dir.path().join(WRITE_TEST_FILE).exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_resolve_target_path_follows_symlinks() {
        let (dir, target, _new) = setup();
        let link = dir.path().join("tool-link");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        let resolved = resolve_target_path(&link).unwrap();
        assert_eq!(resolved, fs::canonicalize(&target).unwrap());
    }

    #[test]
    fn test_check_writable_missing_dir() {
        let dir = TempDir::new().unwrap();
        assert!(check_writable(&dir.path().join("nope")).is_err());
        check_writable(dir.path()).unwrap();
    }
}

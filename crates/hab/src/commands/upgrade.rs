//! Upgrade command

use anyhow::Result;
use dialoguer::Confirm;
use hab_core::{HierarchicalConfigLoader, RuntimeConfig};
use hab_update::progress::format_size;
use hab_update::{
    Error, ErrorKind, Release, ToolSpec, UpdateError, UpdateOutcome, Updater, UpdaterConfig,
};
use serde_json::json;
use tracing::debug;

use crate::cli::UpgradeArgs;
use crate::output;

/// Version of this build
const CURRENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Binary name used in release asset names
const TOOL_NAME: &str = "hab";

/// Tag prefix of hab's own releases
const TOOL_TAG: &str = "hab-rs";

/// ARM sub-version of the build, set by the release pipeline
const BUILD_ARM_VERSION: Option<&str> = option_env!("HAB_ARM_VERSION");

pub async fn run(args: UpgradeArgs) -> Result<()> {
    let runtime = HierarchicalConfigLoader::new()?.load_runtime_config()?;
    if !runtime.display.color_enabled {
        output::disable_colors();
    }

    let config = updater_config(&runtime, args.json);
    let result = match new_updater(&config) {
        Ok(updater) => dispatch(&updater, &runtime, &args).await,
        Err(e) => Err(e.into()),
    };

    if let Err(e) = &result {
        if let Some(update_err) = e.downcast_ref::<UpdateError>() {
            report(update_err, &config, args.json).await;
        }
    }
    result
}

fn new_updater(config: &UpdaterConfig) -> Result<Updater, UpdateError> {
    Updater::new(
        ToolSpec::new(TOOL_NAME, TOOL_TAG),
        CURRENT_VERSION,
        config.clone(),
    )
}

async fn dispatch(updater: &Updater, runtime: &RuntimeConfig, args: &UpgradeArgs) -> Result<()> {
    if args.list {
        return list_versions(updater, args.json).await;
    }

    if args.check {
        return check_for_updates(updater, runtime, args.json).await;
    }

    do_upgrade(updater, args).await
}

/// Engine config from the runtime config; the build's ARM version is the fallback
fn updater_config(runtime: &RuntimeConfig, json: bool) -> UpdaterConfig {
    let mut config = UpdaterConfig::from(runtime);
    if config.arm_version.is_none() {
        config.arm_version = BUILD_ARM_VERSION.map(String::from);
    }
    // Keep stderr free of redraws when output is machine-readable
    if json {
        config.show_progress = false;
    }
    config
}

/// List available versions
async fn list_versions(updater: &Updater, json: bool) -> Result<()> {
    let spinner = output::spinner("Fetching releases...", json);
    let versions = updater.list_available_versions().await;
    spinner.finish_and_clear();
    let versions = versions?;

    if json {
        println!("{}", serde_json::to_string_pretty(&versions)?);
        return Ok(());
    }

    output::header("Available versions");
    for version in &versions {
        let current = if version == CURRENT_VERSION { " (current)" } else { "" };
        println!("  {}{}", version, current);
    }
    Ok(())
}

/// Check for updates only
async fn check_for_updates(updater: &Updater, runtime: &RuntimeConfig, json: bool) -> Result<()> {
    let spinner = output::spinner("Checking for updates...", json);
    let latest = updater.latest_release().await;
    spinner.finish_and_clear();
    let latest = latest?;
    debug!("Latest release is {}", latest.release.tag_name);
    let result = updater.check_release(&latest);

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    output::info(&format!("Current version: {}", result.current_version));
    if !result.update_available {
        output::success("Already on the latest version");
        return Ok(());
    }

    output::success(&format!("Update available: {}", result.latest_version));
    if result.asset_size > 0 {
        output::kv("Size", &format_size(result.asset_size));
    }
    if let Some(preview) = changelog_preview(&latest.release, runtime.display.preview_lines) {
        println!("\nChangelog:\n{}\n", preview);
    }
    output::info("Run 'hab upgrade' to install the update");

    Ok(())
}

/// First `lines` lines of a release's notes
fn changelog_preview(release: &Release, lines: usize) -> Option<String> {
    if lines == 0 {
        return None;
    }
    let body = release.body.as_deref().filter(|b| !b.trim().is_empty())?;
    Some(body.lines().take(lines).collect::<Vec<_>>().join("\n"))
}

/// Perform the upgrade
async fn do_upgrade(updater: &Updater, args: &UpgradeArgs) -> Result<()> {
    let (target, latest) = match &args.version {
        Some(version) => (version.trim().trim_start_matches('v').to_string(), None),
        None => {
            let spinner = output::spinner("Checking for updates...", args.json);
            let latest = updater.latest_release().await;
            spinner.finish_and_clear();
            let latest = latest?;
            debug!("Resolved {} for upgrade", latest.release.tag_name);

            let result = updater.check_release(&latest);
            if !result.update_available {
                return already_latest(&result.current_version, args.json);
            }
            (result.latest_version, Some(latest))
        }
    };

    if !args.json {
        output::header("Upgrade plan");
        println!("  Current version: {}", CURRENT_VERSION);
        println!("  Target version:  {}", target);
        println!("  Asset:           {}", updater.asset_name());
        if is_downgrade(CURRENT_VERSION, &target) {
            output::warning("This is a downgrade");
        }
        println!();
    }

    if !args.yes {
        let proceed = Confirm::new()
            .with_prompt(format!("Upgrade hab to {}?", target))
            .default(false)
            .interact()?;

        if !proceed {
            output::info("Upgrade cancelled");
            return Ok(());
        }
    }

    let outcome = match &latest {
        Some(latest) => updater.update_to_release(latest).await,
        None => updater.update_to_version(&target).await,
    };

    match outcome {
        Ok(outcome) => print_outcome(&outcome, args.json),
        Err(e) if e.kind() == ErrorKind::AlreadyLatest => {
            already_latest(CURRENT_VERSION, args.json)
        }
        Err(e) => Err(e.into()),
    }
}

fn print_outcome(outcome: &UpdateOutcome, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(outcome)?);
    } else {
        output::success(&format!(
            "Upgraded hab {} -> {}",
            outcome.previous_version, outcome.installed_version
        ));
        output::kv("Path", &outcome.path.display().to_string());
    }
    Ok(())
}

fn already_latest(version: &str, json: bool) -> Result<()> {
    if json {
        let body = json!({ "current_version": version, "updated": false });
        println!("{}", serde_json::to_string_pretty(&body)?);
    } else {
        output::success(&format!("Already at version {}", version));
    }
    Ok(())
}

fn is_downgrade(current: &str, target: &str) -> bool {
    match (
        semver::Version::parse(current.trim_start_matches('v')),
        semver::Version::parse(target),
    ) {
        (Ok(current), Ok(target)) => target < current,
        _ => false,
    }
}

/// Print guidance for failures the user can act on
async fn report(err: &UpdateError, config: &UpdaterConfig, json: bool) {
    if json {
        return;
    }

    if let Some(hint) = remediation(err) {
        output::warning(&hint);
    }

    if err.kind() == ErrorKind::VersionNotFound {
        // Fresh updater: the failed one may not have been constructed
        let Ok(updater) = new_updater(config) else {
            return;
        };
        match updater.list_available_versions().await {
            Ok(versions) if !versions.is_empty() => {
                output::info("Available versions:");
                for version in versions.iter().take(10) {
                    println!("  {}", version);
                }
            }
            Ok(_) => {}
            Err(e) => output::error(&format!("Could not list versions: {}", e)),
        }
    }
}

/// Remediation hint for an update failure
fn remediation(err: &UpdateError) -> Option<String> {
    match &err.source {
        Error::RateLimited { reset, .. } => Some(match reset {
            Some(reset) => format!(
                "GitHub API rate limit reached. Try again after {}",
                reset.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M:%S")
            ),
            None => "GitHub API rate limit reached. Wait a few minutes and try again".to_string(),
        }),
        Error::ChecksumMismatch { .. } => Some(
            "The downloaded binary did not match the published checksum and was discarded. \
             Retry the upgrade; if it keeps failing, report it to the maintainers"
                .to_string(),
        ),
        Error::PermissionDenied { path, .. } => Some(format!(
            "No write access to {}. Re-run with sudo or reinstall hab somewhere you own",
            path.display()
        )),
        Error::UnsupportedArchitecture { .. } => Some(
            "No prebuilt binary exists for this platform. Build hab from source instead"
                .to_string(),
        ),
        Error::MissingChecksumManifest { .. } | Error::MissingChecksumEntry { .. } => Some(
            "The release is not verifiable, so it was not installed".to_string(),
        ),
        _ if err.kind().is_download_failure() => {
            Some("Check your network connection and try again".to_string())
        }
        _ => None,
    }
}

//! Version command

use crate::cli::VersionArgs;
use crate::version::VersionInfo;
use anyhow::Result;

pub fn run(args: VersionArgs) -> Result<()> {
    let info = VersionInfo::current();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&info)?);
    } else {
        println!("{}", info.display());
        println!("Engine:     {}", info.engine);
        if let Some(date) = &info.build_date {
            println!("Build date: {}", date);
        }
        if let Some(arm) = &info.arm_version {
            println!("ARM:        v{}", arm);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_info_current_is_valid_semver() {
        let info = VersionInfo::current();
        assert!(
            semver::Version::parse(&info.version).is_ok(),
            "version should be valid semver, got: {}",
            info.version
        );
    }

    #[test]
    fn test_version_info_display() {
        let info = VersionInfo {
            version: "1.6.0".to_string(),
            engine: "1.6.0".to_string(),
            commit: Some("abc1234".to_string()),
            build_date: None,
            arm_version: None,
        };
        assert_eq!(info.display(), "hab 1.6.0 (abc1234)");
        assert_eq!(info.to_string(), info.display());

        let info = VersionInfo { commit: None, ..info };
        assert_eq!(info.display(), "hab 1.6.0");
    }

    #[test]
    fn test_version_info_json_round_trip() {
        let info = VersionInfo::current();
        let json = serde_json::to_string(&info).unwrap();
        let parsed: VersionInfo = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.version, info.version);
        assert_eq!(parsed.engine, info.engine);
    }
}

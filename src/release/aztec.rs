use std::fs;
use std::path::Path;

use regex::Regex;

use crate::config::{Config, GUTENBERG_REPO};
use crate::error::{ReleaseError, Result};
use crate::gh::fetch_raw_file;

const ANDROID_VERSION_FILE: &str =
    "packages/react-native-aztec/android/build.gradle";
const IOS_VERSION_FILE: &str = "packages/react-native-aztec/RNTAztecView.podspec";

/// How one platform's Aztec pin looks after validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AztecResult {
    pub platform: &'static str,
    pub version: String,
    pub valid: bool,
}

/// Checks that both platforms pin Aztec to a stable release version.
///
/// The files are read from a local gutenberg checkout when one is given,
/// otherwise fetched from the repository at `git_ref`. The two lookups run
/// concurrently.
pub fn validate_aztec_versions(
    config: &Config,
    checkout: Option<&Path>,
    git_ref: &str,
) -> Result<(AztecResult, AztecResult)> {
    let (android, ios) = rayon::join(
        || {
            let contents = read_version_file(config, checkout, git_ref, ANDROID_VERSION_FILE)?;
            android_aztec_version(&contents)
        },
        || {
            let contents = read_version_file(config, checkout, git_ref, IOS_VERSION_FILE)?;
            ios_aztec_version(&contents)
        },
    );
    Ok((android?, ios?))
}

fn read_version_file(
    config: &Config,
    checkout: Option<&Path>,
    git_ref: &str,
    file: &str,
) -> Result<String> {
    match checkout {
        Some(dir) => Ok(fs::read_to_string(dir.join(file))?),
        None => {
            let org = config.org_for(GUTENBERG_REPO)?;
            fetch_raw_file(org, GUTENBERG_REPO, git_ref, file)
        }
    }
}

/// Extracts `aztecVersion` from the Android build.gradle.
pub fn android_aztec_version(build_gradle: &str) -> Result<AztecResult> {
    let re = Regex::new(r#"aztecVersion\s*=\s*['"]([^'"]+)['"]"#)
        .map_err(|e| ReleaseError::version_file(e.to_string()))?;
    let version = re
        .captures(build_gradle)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| ReleaseError::version_file("no aztecVersion found in build.gradle"))?;
    Ok(AztecResult {
        platform: "android",
        valid: is_stable(&version),
        version,
    })
}

/// Extracts the WordPress-Aztec-iOS pin from the podspec.
pub fn ios_aztec_version(podspec: &str) -> Result<AztecResult> {
    let re = Regex::new(r#"WordPress-Aztec-iOS['"]\s*,\s*['"]([^'"]+)['"]"#)
        .map_err(|e| ReleaseError::version_file(e.to_string()))?;
    let version = re
        .captures(podspec)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| {
            ReleaseError::version_file("no WordPress-Aztec-iOS dependency found in the podspec")
        })?;
    Ok(AztecResult {
        platform: "ios",
        valid: is_stable(&version),
        version,
    })
}

// A stable pin is a bare x.y.z, no commit shas and no prerelease suffixes.
fn is_stable(version: &str) -> bool {
    let re = match Regex::new(r"^\d+\.\d+\.\d+$") {
        Ok(re) => re,
        Err(_) => return false,
    };
    re.is_match(version)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_android_stable_pin() {
        let gradle = "ext {\n    aztecVersion = 'v2.1.0'\n}\n";
        let result = android_aztec_version(gradle).unwrap();
        assert_eq!(result.version, "v2.1.0");
        assert!(!result.valid);

        let gradle = "ext {\n    aztecVersion = '2.1.0'\n}\n";
        let result = android_aztec_version(gradle).unwrap();
        assert!(result.valid);
    }

    #[test]
    fn test_ios_commit_pin_is_not_stable() {
        let podspec =
            "s.dependency 'WordPress-Aztec-iOS', '0ba6e07d0a3a7b8b0e8e9d3e'\n";
        let result = ios_aztec_version(podspec).unwrap();
        assert!(!result.valid);

        let podspec = "s.dependency 'WordPress-Aztec-iOS', '1.19.8'\n";
        let result = ios_aztec_version(podspec).unwrap();
        assert!(result.valid);
        assert_eq!(result.version, "1.19.8");
    }

    #[test]
    fn test_missing_pin_is_an_error() {
        assert!(android_aztec_version("ext {}\n").is_err());
        assert!(ios_aztec_version("Pod::Spec.new do |s|\nend\n").is_err());
    }
}

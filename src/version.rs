use std::fmt;
use std::str::FromStr;

use crate::error::{ReleaseError, Result};

/// A Gutenberg Mobile release version.
///
/// Versions follow `MAJOR.MINOR.PATCH[-PRERELEASE]` with an optional leading
/// `v` that is ignored on parse. The patch component and the pre-release
/// suffix classify the release:
/// - patch == 0 and no suffix: a scheduled release on the regular cadence
/// - patch > 0: a patch release cherry-picking fixes onto the prior tag
/// - suffix present: a pre-release (alpha/test build)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub prerelease: Option<String>,
}

impl Version {
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Version {
            major,
            minor,
            patch,
            prerelease: None,
        }
    }

    /// True for scheduled releases: patch is zero and there is no
    /// pre-release suffix.
    pub fn is_scheduled_release(&self) -> bool {
        self.patch == 0 && self.prerelease.is_none()
    }

    /// True for patch releases: any nonzero patch component.
    pub fn is_patch_release(&self) -> bool {
        self.patch > 0
    }

    pub fn is_prerelease(&self) -> bool {
        self.prerelease.is_some()
    }

    /// The version this release follows: the previous patch for a patch
    /// release, otherwise the previous scheduled release. Asking for the
    /// prior of an `x.0.0` version is an error rather than an underflow.
    pub fn prior_version(&self) -> Result<Version> {
        if self.is_patch_release() {
            return Ok(Version::new(self.major, self.minor, self.patch - 1));
        }
        match self.minor.checked_sub(1) {
            Some(minor) => Ok(Version::new(self.major, minor, 0)),
            None => Err(ReleaseError::version(format!(
                "{} has no prior version",
                self
            ))),
        }
    }

    /// The version with a leading `v`, as used in tag names.
    pub fn vstring(&self) -> String {
        format!("v{}", self)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(pre) = &self.prerelease {
            write!(f, "-{}", pre)?;
        }
        Ok(())
    }
}

impl FromStr for Version {
    type Err = ReleaseError;

    fn from_str(s: &str) -> Result<Version> {
        let cleaned = s.trim().trim_start_matches('v');
        let parsed = semver::Version::parse(cleaned).map_err(|e| {
            ReleaseError::version(format!(
                "{}: versions must have a `Major.Minor.Patch` form ({})",
                s, e
            ))
        })?;
        let prerelease = if parsed.pre.is_empty() {
            None
        } else {
            Some(parsed.pre.as_str().to_string())
        };
        Ok(Version {
            major: parsed.major,
            minor: parsed.minor,
            patch: parsed.patch,
            prerelease,
        })
    }
}

//! The release builders: one module per phase of a gutenberg-mobile
//! release, plus shared branch naming and pull request lookup helpers.

pub mod aztec;
pub mod editor;
pub mod integrate;
pub mod notes;
pub mod publish;
pub mod status;
pub mod wrapper;

use crate::config::{Config, GUTENBERG_MOBILE_REPO, GUTENBERG_REPO};
use crate::error::Result;
use crate::gh::{build_repo_filter, PullRequest, Remote};
use crate::version::Version;

pub const EDITOR_PR_LABEL: &str = "Mobile App - i.e. Android or iOS";
pub const WRAPPER_PR_LABEL: &str = "release-process";
pub const INTEGRATION_PR_LABEL: &str = "Gutenberg";

/// Options shared by the prepare commands.
#[derive(Debug, Clone)]
pub struct Build {
    pub version: Version,
    /// Push the `rnmobile/<version>` tag as part of the editor prepare.
    pub use_tag: bool,
    /// Pull requests to cherry-pick onto a patch release branch.
    pub prs: Vec<u64>,
}

/// The frozen editor branch for a release, e.g. `rnmobile/release_1.2.0`.
pub fn editor_release_branch(version: &Version) -> String {
    format!("rnmobile/release_{}", version)
}

/// The wrapper release branch, e.g. `release/1.2.0`.
pub fn wrapper_release_branch(version: &Version) -> String {
    format!("release/{}", version)
}

/// The app-side integration branch, e.g. `gutenberg/integrate_release_1.2.0`.
pub fn integration_branch(version: &Version) -> String {
    format!("gutenberg/integrate_release_{}", version)
}

/// The post-release branch apps track between releases.
pub fn after_branch(version: &Version) -> String {
    format!("gutenberg/after_{}", version)
}

pub fn editor_pr_title(version: &Version) -> String {
    format!("Mobile Release v{}", version)
}

pub fn wrapper_pr_title(version: &Version) -> String {
    format!("Release {}", version)
}

pub fn integration_pr_title(version: &Version) -> String {
    format!("Integrate gutenberg-mobile v{}", version)
}

/// The editor repo's release PR, matched by label and version in the title.
pub fn find_editor_release_pr(
    remote: &dyn Remote,
    config: &Config,
    version: &Version,
) -> Result<Option<PullRequest>> {
    let title = format!("v{} in:title", version);
    let label = format!("label:\"{}\"", EDITOR_PR_LABEL);
    let filter = build_repo_filter(
        GUTENBERG_REPO,
        config.org_for(GUTENBERG_REPO)?,
        &["is:pr", &title, &label],
    );
    remote.search_pr(&filter)
}

/// The wrapper repo's release PR.
pub fn find_wrapper_release_pr(
    remote: &dyn Remote,
    config: &Config,
    version: &Version,
) -> Result<Option<PullRequest>> {
    let title = format!("{} in:title", version);
    let label = format!("label:\"{}\"", WRAPPER_PR_LABEL);
    let filter = build_repo_filter(
        GUTENBERG_MOBILE_REPO,
        config.org_for(GUTENBERG_MOBILE_REPO)?,
        &["is:pr", &title, &label],
    );
    remote.search_pr(&filter)
}

/// An app repo's integration PR for the release, if one exists.
pub fn find_integration_pr(
    remote: &dyn Remote,
    config: &Config,
    repo: &str,
    version: &Version,
) -> Result<Option<PullRequest>> {
    let title = format!("v{} in:title", version);
    let label = format!("label:\"{}\"", INTEGRATION_PR_LABEL);
    let filter = build_repo_filter(repo, config.org_for(repo)?, &["is:pr", &title, &label]);
    remote.search_pr(&filter)
}

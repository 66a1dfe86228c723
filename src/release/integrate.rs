use std::fs;
use std::path::Path;

use regex::Regex;

use crate::config::{Config, GUTENBERG_MOBILE_REPO, WORDPRESS_ANDROID_REPO, WORDPRESS_IOS_REPO};
use crate::console::Console;
use crate::error::{ReleaseError, Result};
use crate::gh::{PrRequest, PullRequest, Remote};
use crate::release::{
    after_branch, find_integration_pr, integration_branch, integration_pr_title,
    INTEGRATION_PR_LABEL,
};
use crate::render;
use crate::shell::{Bundler, Git};
use crate::version::Version;
use crate::workspace::Workspace;
use crate::yamledit;

const ANDROID_VERSION_FILE: &str = "build.gradle";
const IOS_CONFIG_FILE: &str = "Gutenberg/config.yml";
const IOS_VERSION_RB: &str = "Gutenberg/version.rb";

const ANDROID_STATUS_CONTEXT: &str = "build-android-rn-bridge-and-publish-to-s3";
const IOS_STATUS_CONTEXT: &str = "build-ios-rn-xcframework-and-publish-to-s3";

const BASE_BRANCH: &str = "trunk";

/// The two apps a gutenberg-mobile release is integrated into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Android,
    Ios,
}

impl Platform {
    pub fn repo(&self) -> &'static str {
        match self {
            Platform::Android => WORDPRESS_ANDROID_REPO,
            Platform::Ios => WORDPRESS_IOS_REPO,
        }
    }

    /// The commit status that signals the platform artifact landed on S3.
    pub fn status_context(&self) -> &'static str {
        match self {
            Platform::Android => ANDROID_STATUS_CONTEXT,
            Platform::Ios => IOS_STATUS_CONTEXT,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Platform::Android => "android",
            Platform::Ios => "ios",
        }
    }
}

/// Opens the integration pull request for one platform.
///
/// Returns `Ok(None)` when the release is not ready to integrate yet, so
/// the caller can come back later without treating it as a failure.
pub fn create_integration_pr(
    remote: &mut dyn Remote,
    config: &Config,
    console: &Console,
    workspace: &Workspace,
    version: &Version,
    platform: Platform,
) -> Result<Option<PullRequest>> {
    let tag = version.vstring();

    let release = match remote.get_release(GUTENBERG_MOBILE_REPO, &tag)? {
        Some(release) if release.published_at.is_some() => release,
        _ => {
            console.warn(&format!("release {} is not published yet", tag));
            return Ok(None);
        }
    };

    let tag_info = remote
        .get_tag(GUTENBERG_MOBILE_REPO, &tag)?
        .ok_or_else(|| ReleaseError::missing(format!("no tag {} on gutenberg-mobile", tag)))?;
    match remote.get_status_check(GUTENBERG_MOBILE_REPO, &tag_info.sha, platform.status_context())? {
        Some(check) if check.state == "success" => {}
        Some(check) => {
            console.warn(&format!(
                "{} artifact build is {}, not integrating yet",
                platform.name(),
                check.state
            ));
            return Ok(None);
        }
        None => {
            console.warn(&format!(
                "no {} artifact build found for {}",
                platform.name(),
                tag
            ));
            return Ok(None);
        }
    }

    let repo = platform.repo();
    if let Some(existing) = find_integration_pr(remote, config, repo, version)? {
        console.warn(&format!(
            "integration PR already exists: {}",
            existing.html_url
        ));
        return Ok(Some(existing));
    }

    let branch = integration_branch(version);
    let url = config.https_url(repo)?;
    let dir = workspace.repo_dir(repo);
    let git = Git::new(&dir, config.verbose);

    if remote.search_branch(repo, &branch)?.is_some() {
        console.info(&format!("Using existing branch {}", branch));
        git.clone(&url, &branch, false)?;
    } else {
        console.info(&format!("Cloning {} {}", repo, BASE_BRANCH));
        git.clone(&url, BASE_BRANCH, false)?;
        git.switch_create(&branch)?;
    }

    console.info("Updating the gutenberg-mobile ref");
    match platform {
        Platform::Android => update_android_version_file(&dir, &tag)?,
        Platform::Ios => {
            update_ios_version_file(&dir, &tag)?;
            console.info("Refreshing pods");
            let bundler = Bundler::new(&dir, config.verbose);
            bundler.install()?;
            bundler.rake("dependencies")?;
        }
    }

    if git.commit_all(&format!(
        "Release script: update gutenberg-mobile ref to {}",
        tag
    ))? {
        git.push()?;
    } else {
        console.warn("ref already up to date, nothing to commit");
    }

    let body = render::integration_pr_body(version, &release.html_url);
    console.out(&body);
    if !console.confirm(&format!("Open this integration PR on {}?", repo))? {
        return Err(ReleaseError::aborted("integration PR not created"));
    }

    let request = PrRequest {
        title: integration_pr_title(version),
        body,
        head: branch,
        base: BASE_BRANCH.to_string(),
        draft: true,
    };
    let pr = remote.create_pr(repo, &request)?;
    remote.add_labels(repo, pr.number, &[INTEGRATION_PR_LABEL])?;
    console.info(&format!("Created integration PR: {}", pr.html_url));

    push_after_branch(&git, &url, version)?;

    Ok(Some(pr))
}

/// Creates the `gutenberg/after_<version>` branch for post-release work.
///
/// The branch forks from the base branch, never from the integration
/// branch, so it carries no unmerged integration commits.
pub fn push_after_branch(git: &Git, url: &str, version: &Version) -> Result<()> {
    let after = after_branch(version);
    if git.remote_branch_exists(url, &after)? {
        return Ok(());
    }
    git.fetch(BASE_BRANCH, None)?;
    git.switch(BASE_BRANCH)?;
    git.switch_create(&after)?;
    git.push()
}

fn update_android_version_file(dir: &Path, git_ref: &str) -> Result<()> {
    let path = dir.join(ANDROID_VERSION_FILE);
    let contents = fs::read_to_string(&path)?;
    let updated = android_set_mobile_ref(&contents, git_ref)?;
    fs::write(&path, updated)?;
    Ok(())
}

/// Rewrites `gutenbergMobileVersion` in the app's build.gradle.
pub fn android_set_mobile_ref(build_gradle: &str, git_ref: &str) -> Result<String> {
    let re = Regex::new(r"(gutenbergMobileVersion\s*=\s*)'(?:.*)'")
        .map_err(|e| ReleaseError::version_file(e.to_string()))?;
    if !re.is_match(build_gradle) {
        return Err(ReleaseError::version_file(
            "no gutenbergMobileVersion found in build.gradle",
        ));
    }
    let replacement = format!("${{1}}'{}'", git_ref);
    Ok(re.replace(build_gradle, replacement.as_str()).into_owned())
}

fn update_ios_version_file(dir: &Path, git_ref: &str) -> Result<()> {
    let config_path = dir.join(IOS_CONFIG_FILE);
    if config_path.exists() {
        let mut doc: serde_yaml::Value = serde_yaml::from_str(&fs::read_to_string(&config_path)?)?;
        yamledit::set_scalar(&mut doc, "ref.tag", git_ref)?;
        yamledit::delete_key(&mut doc, "ref.commit")?;
        fs::write(&config_path, serde_yaml::to_string(&doc)?)?;
        return Ok(());
    }

    let path = dir.join(IOS_VERSION_RB);
    let contents = fs::read_to_string(&path)?;
    let updated = ios_toggle_version_rb(&contents, git_ref)?;
    fs::write(&path, updated)?;
    Ok(())
}

/// Switches the version.rb pin between tag and commit form.
///
/// A tag-shaped ref activates the `tag:` line and comments out `commit:`;
/// anything else does the opposite and pins the commit.
pub fn ios_toggle_version_rb(contents: &str, git_ref: &str) -> Result<String> {
    let tag_shaped = Regex::new(r"^v\d+\.\d+\.\d+$")
        .map_err(|e| ReleaseError::version_file(e.to_string()))?
        .is_match(git_ref);
    let tag_line = Regex::new(r"([\r\n]\s*)#?\s*(tag:.*)")
        .map_err(|e| ReleaseError::version_file(e.to_string()))?;
    let commit_line = Regex::new(r"([\r\n]\s*)#?\s*(commit:.*)")
        .map_err(|e| ReleaseError::version_file(e.to_string()))?;

    if !tag_line.is_match(contents) || !commit_line.is_match(contents) {
        return Err(ReleaseError::version_file(
            "version.rb is missing its tag or commit line",
        ));
    }

    let updated = if tag_shaped {
        let commented = commit_line.replace(contents, "${1}# ${2}").into_owned();
        let active = format!("${{1}}tag: '{}'", git_ref);
        tag_line.replace(&commented, active.as_str()).into_owned()
    } else {
        let commented = tag_line.replace(contents, "${1}# ${2}").into_owned();
        let active = format!("${{1}}commit: '{}'", git_ref);
        commit_line
            .replace(&commented, active.as_str())
            .into_owned()
    };
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_android_ref_rewrite() {
        let gradle = "ext {\n    gutenbergMobileVersion = 'v1.1.0'\n}\n";
        let updated = android_set_mobile_ref(gradle, "v1.2.0").unwrap();
        assert!(updated.contains("gutenbergMobileVersion = 'v1.2.0'"));
    }

    #[test]
    fn test_android_missing_ref_is_an_error() {
        assert!(android_set_mobile_ref("ext {}\n", "v1.2.0").is_err());
    }

    #[test]
    fn test_version_rb_tag_ref_activates_the_tag_line() {
        let rb = "GUTENBERG_CONFIG = {\n  # tag: 'v1.1.0'\n  commit: 'abc123'\n}\n";
        let updated = ios_toggle_version_rb(rb, "v1.2.0").unwrap();
        assert!(updated.contains("tag: 'v1.2.0'"), "got: {}", updated);
        assert!(updated.contains("# commit: 'abc123'"), "got: {}", updated);
    }

    #[test]
    fn test_version_rb_commit_ref_activates_the_commit_line() {
        let rb = "GUTENBERG_CONFIG = {\n  tag: 'v1.1.0'\n  # commit: 'abc123'\n}\n";
        let updated = ios_toggle_version_rb(rb, "deadbeef").unwrap();
        assert!(updated.contains("commit: 'deadbeef'"), "got: {}", updated);
        assert!(updated.contains("# tag: 'v1.1.0'"), "got: {}", updated);
    }

    #[test]
    fn test_version_rb_toggle_round_trip() {
        let rb = "GUTENBERG_CONFIG = {\n  tag: 'v1.96.0'\n  # commit: '123'\n}\n";

        let pinned = ios_toggle_version_rb(rb, "deadbeef").unwrap();
        assert!(pinned.contains("commit: 'deadbeef'"), "got: {}", pinned);
        assert!(pinned.contains("# tag: 'v1.96.0'"), "got: {}", pinned);

        let back = ios_toggle_version_rb(&pinned, "v1.97.0").unwrap();
        assert!(back.contains("tag: 'v1.97.0'"), "got: {}", back);
        assert!(back.contains("# commit: 'deadbeef'"), "got: {}", back);

        // a same-form update must not disturb the other line's comment
        let again = ios_toggle_version_rb(&back, "v1.98.0").unwrap();
        assert!(again.contains("tag: 'v1.98.0'"), "got: {}", again);
        assert!(again.contains("# commit: 'deadbeef'"), "got: {}", again);
    }

    fn run_git(dir: &std::path::Path, args: &[&str]) {
        let status = std::process::Command::new("git")
            .arg("-C")
            .arg(dir)
            .args(args)
            .output()
            .unwrap();
        assert!(status.status.success(), "git {:?} failed", args);
    }

    fn rev_parse(dir: &std::path::Path, git_ref: &str) -> String {
        let out = std::process::Command::new("git")
            .arg("-C")
            .arg(dir)
            .args(["rev-parse", git_ref])
            .output()
            .unwrap();
        String::from_utf8_lossy(&out.stdout).trim().to_string()
    }

    #[test]
    fn test_after_branch_forks_from_base_not_the_integration_head() {
        use std::str::FromStr;

        let root = tempfile::TempDir::new().unwrap();
        let origin = root.path().join("origin.git");
        fs::create_dir(&origin).unwrap();
        run_git(&origin, &["init", "-q", "--bare", "--initial-branch=trunk"]);
        let url = origin.to_string_lossy().to_string();

        // seed the remote with a commit on trunk
        let seed = root.path().join("seed");
        fs::create_dir(&seed).unwrap();
        run_git(&seed, &["init", "-q", "--initial-branch=trunk"]);
        run_git(&seed, &["config", "user.email", "dev@example.com"]);
        run_git(&seed, &["config", "user.name", "dev"]);
        fs::write(seed.join("build.gradle"), "gutenbergMobileVersion = 'v1.1.0'\n").unwrap();
        run_git(&seed, &["add", "--all"]);
        run_git(&seed, &["commit", "-q", "-m", "base"]);
        run_git(&seed, &["remote", "add", "origin", &url]);
        run_git(&seed, &["push", "-q", "origin", "trunk"]);

        // an integration branch with one extra commit, like the flow leaves it
        let checkout = root.path().join("checkout");
        let git = Git::new(&checkout, false);
        git.clone(&url, "trunk", false).unwrap();
        run_git(&checkout, &["config", "user.email", "dev@example.com"]);
        run_git(&checkout, &["config", "user.name", "dev"]);
        let version = Version::from_str("1.2.0").unwrap();
        git.switch_create(&integration_branch(&version)).unwrap();
        fs::write(
            checkout.join("build.gradle"),
            "gutenbergMobileVersion = 'v1.2.0'\n",
        )
        .unwrap();
        git.commit_all("update ref").unwrap();
        git.push().unwrap();

        push_after_branch(&git, &url, &version).unwrap();

        let after_sha = rev_parse(&origin, "gutenberg/after_1.2.0");
        assert_eq!(after_sha, rev_parse(&origin, "trunk"));
        assert_ne!(after_sha, rev_parse(&origin, "gutenberg/integrate_release_1.2.0"));

        // reruns leave the existing branch alone
        push_after_branch(&git, &url, &version).unwrap();
        assert_eq!(rev_parse(&origin, "gutenberg/after_1.2.0"), after_sha);
    }
}

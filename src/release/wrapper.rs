use std::fs;

use crate::config::{Config, GUTENBERG_MOBILE_REPO, GUTENBERG_REPO, JETPACK_REPO};
use crate::console::Console;
use crate::error::{ReleaseError, Result};
use crate::gh::{find_synced_prs, PrRequest, PullRequest, Remote};
use crate::release::{
    editor_release_branch, find_wrapper_release_pr, notes, wrapper_pr_title,
    wrapper_release_branch, Build, WRAPPER_PR_LABEL,
};
use crate::render;
use crate::shell::{Bundler, Git, Npm};
use crate::workspace::Workspace;

const SUBMODULE_PATH: &str = "gutenberg";
const RELEASE_NOTES: &str = "RELEASE-NOTES.txt";
const XCFRAMEWORK_DIR: &str = "ios-xcframework";
const EDITOR_CHANGELOG: &str = "gutenberg/packages/react-native-editor/CHANGELOG.md";

/// Creates the gutenberg-mobile release pull request.
///
/// Pins the gutenberg submodule to the editor release branch, bumps the
/// package version, regenerates the JS bundles and the iOS pods, and opens
/// a draft PR that links back to the editor PR.
pub fn create_wrapper_pr(
    remote: &mut dyn Remote,
    config: &Config,
    console: &Console,
    workspace: &Workspace,
    build: &Build,
    editor_pr: &PullRequest,
) -> Result<PullRequest> {
    let version = &build.version;

    if let Some(existing) = find_wrapper_release_pr(remote, config, version)? {
        console.warn(&format!(
            "wrapper release PR already exists: {}",
            existing.html_url
        ));
        return Ok(existing);
    }

    // the wrapper pins the editor branch, so it must exist first
    let editor_branch = editor_release_branch(version);
    if remote
        .search_branch(GUTENBERG_REPO, &editor_branch)?
        .is_none()
    {
        return Err(ReleaseError::missing(format!(
            "editor branch {} does not exist, prepare the editor first",
            editor_branch
        )));
    }

    let branch = wrapper_release_branch(version);
    let url = config.https_url(GUTENBERG_MOBILE_REPO)?;
    let dir = workspace.repo_dir(GUTENBERG_MOBILE_REPO);
    let git = Git::new(&dir, config.verbose);

    if remote
        .search_branch(GUTENBERG_MOBILE_REPO, &branch)?
        .is_some()
    {
        console.info(&format!("Using existing branch {}", branch));
        git.clone(&url, &branch, true)?;
    } else {
        console.info("Cloning gutenberg-mobile trunk");
        git.clone(&url, "trunk", true)?;
        git.switch_create(&branch)?;
    }

    console.info("Pinning the gutenberg submodule to the release branch");
    pin_submodule(console, &git, config.verbose, build, editor_pr)?;
    git.commit_all(&format!(
        "Release script: point gutenberg to {}",
        editor_branch
    ))?;

    console.info("Updating the package version");
    let npm = Npm::new(&dir, config.verbose);
    npm.ci()?;
    npm.version(&version.to_string())?;

    console.info("Regenerating the JS bundles and translations");
    npm.run_script("bundle")?;
    npm.run_script("i18n:update")?;

    console.info("Refreshing the xcframework pods");
    let bundler = Bundler::new(dir.join(XCFRAMEWORK_DIR), config.verbose);
    bundler.install()?;
    bundler.pod_install()?;

    notes::update_release_notes_file(&dir.join(RELEASE_NOTES), version)?;

    if !git.commit_all(&format!("Release script: update version to {}", version))? {
        console.warn("no release changes to commit, branch already prepared");
    }

    let changes = fs::read_to_string(dir.join(EDITOR_CHANGELOG))
        .ok()
        .and_then(|log| notes::extract_version_section(&log, version))
        .unwrap_or_else(|| "See the editor changelog.".to_string());

    console.info("Collecting pull requests synced to this release");
    let related = find_synced_prs(
        remote,
        config,
        &[GUTENBERG_REPO, JETPACK_REPO],
        &editor_pr.html_url,
        console,
    );

    let body = render::wrapper_pr_body(version, &editor_pr.html_url, &changes, &related);
    console.out(&body);
    if !console.confirm("Push the release branch and open this PR?")? {
        return Err(ReleaseError::aborted("wrapper release PR not created"));
    }

    console.info("Pushing the release branch");
    git.push()?;

    let request = PrRequest {
        title: wrapper_pr_title(version),
        body,
        head: branch,
        base: "trunk".to_string(),
        draft: true,
    };
    let pr = remote.create_pr(GUTENBERG_MOBILE_REPO, &request)?;
    remote.add_labels(GUTENBERG_MOBILE_REPO, pr.number, &[WRAPPER_PR_LABEL])?;
    console.info(&format!("Created wrapper release PR: {}", pr.html_url));
    Ok(pr)
}

/// Checks the submodule out at the editor release branch head.
fn pin_submodule(
    console: &Console,
    git: &Git,
    verbose: bool,
    build: &Build,
    editor_pr: &PullRequest,
) -> Result<()> {
    let branch = editor_release_branch(&build.version);
    let submodule = Git::new(git.dir().join(SUBMODULE_PATH), verbose);
    submodule.fetch(&branch, None)?;
    submodule.switch(&branch)?;

    // Catch the case where the editor PR gained commits after the pin was
    // pushed on an earlier run.
    if let Some(head) = &editor_pr.head {
        let pinned = git.submodule_sha(SUBMODULE_PATH)?;
        if !head.sha.is_empty() && pinned != head.sha {
            console.warn(&format!(
                "submodule pin {} does not match the editor PR head {}",
                &pinned[..pinned.len().min(9)],
                &head.sha[..head.sha.len().min(9)]
            ));
        }
    }
    Ok(())
}

/// Whether a wrapper release checkout still matches the editor release PR.
///
/// The checkout must be clean; a dirty tree means a half-finished run and
/// the comparison would be meaningless.
pub fn is_wrapper_current(git: &Git, editor_pr: &PullRequest) -> Result<bool> {
    if !git.is_porcelain()? {
        return Err(ReleaseError::NotPorcelain(
            "the wrapper checkout has local changes".to_string(),
        ));
    }
    let head = editor_pr
        .head
        .as_ref()
        .ok_or_else(|| ReleaseError::missing("editor PR has no head commit"))?;
    let pinned = git.submodule_sha(SUBMODULE_PATH)?;
    Ok(pinned == head.sha)
}

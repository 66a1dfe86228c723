use crate::config::{Config, GUTENBERG_MOBILE_REPO, GUTENBERG_REPO};
use crate::console::Console;
use crate::error::{ReleaseError, Result};
use crate::gh::{fetch_raw_file, is_pr_approved, is_pr_passing, Release, Remote};
use crate::release::{
    editor_release_branch, find_editor_release_pr, find_wrapper_release_pr, notes, wrapper,
    wrapper_release_branch,
};
use crate::render;
use crate::shell::Git;
use crate::version::Version;
use crate::workspace::Workspace;

const RELEASE_NOTES: &str = "RELEASE-NOTES.txt";

/// Evaluates every publish precondition and reports all the failures at
/// once, so the wrangler fixes them in one pass instead of replaying the
/// command per problem.
pub fn is_ready_to_publish(
    remote: &dyn Remote,
    config: &Config,
    console: &Console,
    version: &Version,
    skip_checks: bool,
    skip: &[String],
) -> Result<(bool, Vec<String>)> {
    let wrapper_pr = match find_wrapper_release_pr(remote, config, version)? {
        Some(pr) => pr,
        None => {
            return Ok((
                false,
                vec![format!("no wrapper release PR found for {}", version)],
            ))
        }
    };
    let editor_pr = match find_editor_release_pr(remote, config, version)? {
        Some(pr) => pr,
        None => {
            return Ok((
                false,
                vec![format!("no editor release PR found for {}", version)],
            ))
        }
    };

    let mut reasons = Vec::new();

    if wrapper_pr.mergeable == Some(false) {
        reasons.push(format!("wrapper PR {} is not mergeable", wrapper_pr.html_url));
    }
    if editor_pr.mergeable == Some(false) {
        reasons.push(format!("editor PR {} is not mergeable", editor_pr.html_url));
    }
    if !is_pr_approved(remote, &editor_pr)? {
        reasons.push(format!("editor PR {} is not approved", editor_pr.html_url));
    }
    if !is_pr_approved(remote, &wrapper_pr)? {
        reasons.push(format!("wrapper PR {} is not approved", wrapper_pr.html_url));
    }

    if skip_checks {
        console.warn("skipping CI checks");
    } else {
        for pr in [&wrapper_pr, &editor_pr] {
            if !is_pr_passing(remote, pr, skip, console)? {
                reasons.push(format!("checks are failing on {}", pr.html_url));
            }
        }
    }

    Ok((reasons.is_empty(), reasons))
}

/// Publishes the release: creates the GitHub release off the wrapper
/// release branch and tags the editor.
pub fn publish_release(
    remote: &mut dyn Remote,
    config: &Config,
    console: &Console,
    workspace: &Workspace,
    version: &Version,
    skip_checks: bool,
    skip: &[String],
) -> Result<Release> {
    let tag = version.vstring();

    if let Some(existing) = remote.get_release(GUTENBERG_MOBILE_REPO, &tag)? {
        console.warn(&format!("release {} already exists: {}", tag, existing.html_url));
        return Ok(existing);
    }

    let (ready, reasons) = is_ready_to_publish(remote, config, console, version, skip_checks, skip)?;
    if !ready {
        console.error(&format!("release {} is not ready to publish:", version));
        for reason in &reasons {
            console.info(&format!("  - {}", reason));
        }
        if !console.confirm("Publish anyway?")? {
            return Err(ReleaseError::aborted("publish cancelled"));
        }
    }

    let branch = wrapper_release_branch(version);
    check_wrapper_currency(remote, config, console, workspace, version, &branch)?;

    console.info("Fetching the release notes");
    let org = config.org_for(GUTENBERG_MOBILE_REPO)?;
    let changes = match fetch_raw_file(org, GUTENBERG_MOBILE_REPO, &branch, RELEASE_NOTES) {
        Ok(notes) => extract_release_notes(&notes, version)
            .unwrap_or_else(|| format!("Release {}", version)),
        Err(e) => {
            console.warn(&format!("could not fetch release notes: {}", e));
            format!("Release {}", version)
        }
    };
    let references = notes::collect_pr_references(&changes)?;

    let release = Release {
        tag_name: tag.clone(),
        name: tag,
        body: render::release_body(&changes, &references),
        target_commitish: branch,
        prerelease: version.is_prerelease(),
        ..Default::default()
    };
    let created = remote.create_release(GUTENBERG_MOBILE_REPO, &release)?;
    console.info(&format!("Published release: {}", created.html_url));

    tag_editor(remote, config, console, workspace, version)?;
    Ok(created)
}

/// Warns when the wrapper's submodule pin fell behind the editor release
/// PR, which happens when the editor branch gained commits after prepare.
fn check_wrapper_currency(
    remote: &dyn Remote,
    config: &Config,
    console: &Console,
    workspace: &Workspace,
    version: &Version,
    branch: &str,
) -> Result<()> {
    let editor_pr = match find_editor_release_pr(remote, config, version)? {
        Some(pr) => pr,
        None => return Ok(()),
    };
    let dir = workspace.repo_dir(GUTENBERG_MOBILE_REPO);
    let git = Git::new(&dir, config.verbose);
    if !dir.exists() {
        let url = config.https_url(GUTENBERG_MOBILE_REPO)?;
        git.clone(&url, branch, true)?;
    }
    match wrapper::is_wrapper_current(&git, &editor_pr) {
        Ok(true) => {}
        Ok(false) => {
            console.warn("the wrapper submodule pin is behind the editor release PR");
            if !console.confirm("Publish with a stale pin anyway?")? {
                return Err(ReleaseError::aborted("publish cancelled, re-run prepare"));
            }
        }
        Err(e) => console.warn(&format!("could not verify the submodule pin: {}", e)),
    }
    Ok(())
}

/// Lays an annotated `rnmobile/<version>` tag on the editor release branch,
/// unless prepare already pushed it.
pub fn tag_editor(
    remote: &dyn Remote,
    config: &Config,
    console: &Console,
    workspace: &Workspace,
    version: &Version,
) -> Result<()> {
    let tag = format!("rnmobile/{}", version);
    if remote.get_tag(GUTENBERG_REPO, &tag)?.is_some() {
        console.info(&format!("Tag {} already exists", tag));
        return Ok(());
    }

    let branch = editor_release_branch(version);
    let url = config.https_url(GUTENBERG_REPO)?;
    let dir = workspace.repo_dir(GUTENBERG_REPO);
    let git = Git::new(&dir, config.verbose);

    if !dir.exists() {
        console.info("Cloning gutenberg for tagging");
        git.clone(&url, &branch, false)?;
    }
    console.info(&format!("Tagging the editor as {}", tag));
    git.push_tag(&tag, true)
}

/// The block of notes for one version in the plain-text release notes,
/// between its heading line and the next `---` divider.
pub fn extract_release_notes(notes: &str, version: &Version) -> Option<String> {
    let heading = version.to_string();
    let mut lines = notes.lines();
    lines.by_ref().find(|line| line.trim() == heading)?;
    let body: Vec<&str> = lines
        .take_while(|line| line.trim() != "---")
        .collect();
    let body = body.join("\n").trim().to_string();
    if body.is_empty() {
        None
    } else {
        Some(body)
    }
}

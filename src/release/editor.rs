use crate::config::{Config, GUTENBERG_REPO};
use crate::console::Console;
use crate::error::{ReleaseError, Result};
use crate::gh::{PrRequest, PullRequest, Remote};
use crate::release::{
    editor_pr_title, editor_release_branch, find_editor_release_pr, notes, Build, EDITOR_PR_LABEL,
};
use crate::render;
use crate::shell::{open_in_editor, Bundler, Git, Npm};
use crate::workspace::Workspace;

const NPM_PACKAGES: [&str; 3] = [
    "packages/react-native-aztec",
    "packages/react-native-bridge",
    "packages/react-native-editor",
];
const EDITOR_CHANGELOG: &str = "packages/react-native-editor/CHANGELOG.md";

/// Creates the editor repo release pull request.
///
/// Scheduled releases branch off trunk; patch releases branch off the prior
/// release tag and cherry-pick the requested pull requests. The branch gets
/// the version bumps and changelog entry, then a draft PR.
pub fn create_editor_pr(
    remote: &mut dyn Remote,
    config: &Config,
    console: &Console,
    workspace: &Workspace,
    build: &Build,
) -> Result<PullRequest> {
    let version = &build.version;

    if let Some(existing) = find_editor_release_pr(remote, config, version)? {
        console.warn(&format!(
            "editor release PR already exists: {}",
            existing.html_url
        ));
        return Ok(existing);
    }

    let branch = editor_release_branch(version);
    let url = config.https_url(GUTENBERG_REPO)?;
    let dir = workspace.repo_dir(GUTENBERG_REPO);
    let git = Git::new(&dir, config.verbose);

    let branch_on_remote = remote.search_branch(GUTENBERG_REPO, &branch)?.is_some();

    if branch_on_remote {
        console.info(&format!("Using existing branch {}", branch));
        git.clone(&url, &branch, true)?;
    } else if build.version.is_patch_release() {
        if build.prs.is_empty() {
            return Err(ReleaseError::config(
                "a patch release needs --prs with the PRs to cherry-pick",
            ));
        }
        let prior = version.prior_version()?;
        console.info(&format!("Cloning gutenberg from {}", prior.vstring()));
        git.clone(&url, &prior.vstring(), true)?;
        git.switch_create(&branch)?;
        cherry_pick_prs(remote, console, &git, build, &prior.vstring())?;
    } else {
        console.info("Cloning gutenberg trunk");
        git.clone(&url, "trunk", true)?;
        git.switch_create(&branch)?;
    }

    console.info("Updating the editor package versions");
    let npm = Npm::new(&dir, config.verbose);
    for package in NPM_PACKAGES {
        npm.version_in(package, &version.to_string())?;
    }
    if !git.commit_all(&format!("Release script: update versions to {}", version))? {
        console.warn("no version changes to commit, branch already prepared");
    }

    notes::update_changelog_file(&dir.join(EDITOR_CHANGELOG), version)?;
    git.commit_all("Release script: update changelog")?;

    console.info("Installing dependencies and running the iOS pre-build");
    npm.install()?;
    Bundler::new(dir.join("packages/react-native-editor/ios"), config.verbose).install()?;
    npm.run_script_in("packages/react-native-editor", "preios")?;
    git.commit_all("Release script: sync podfile changes")?;

    let body = render::editor_pr_body(version, "(wrapper PR pending)");
    console.out(&body);
    if !console.confirm("Push the release branch and open this PR?")? {
        return Err(ReleaseError::aborted("editor release PR not created"));
    }

    console.info("Pushing the release branch");
    git.push()?;

    let request = PrRequest {
        title: editor_pr_title(version),
        body,
        head: branch,
        base: "trunk".to_string(),
        draft: true,
    };
    let pr = remote.create_pr(GUTENBERG_REPO, &request)?;
    remote.add_labels(GUTENBERG_REPO, pr.number, &[EDITOR_PR_LABEL])?;
    console.info(&format!("Created editor release PR: {}", pr.html_url));

    if build.use_tag {
        let tag = format!("rnmobile/{}", version);
        console.info(&format!("Pushing tag {}", tag));
        git.push_tag(&tag, true)?;
    }
    Ok(pr)
}

/// Rewrites the editor PR body once the wrapper PR exists, so the two link
/// to each other.
pub fn link_wrapper_pr(
    remote: &mut dyn Remote,
    build: &Build,
    editor_pr: &PullRequest,
    wrapper_url: &str,
) -> Result<PullRequest> {
    let request = PrRequest {
        title: editor_pr.title.clone(),
        body: render::editor_pr_body(&build.version, wrapper_url),
        ..Default::default()
    };
    remote.update_pr(GUTENBERG_REPO, editor_pr.number, &request)
}

fn cherry_pick_prs(
    remote: &dyn Remote,
    console: &Console,
    git: &Git,
    build: &Build,
    prior_tag: &str,
) -> Result<()> {
    // deepen history back to the prior tag so merge commits are reachable
    let since = remote
        .get_tag(GUTENBERG_REPO, prior_tag)?
        .map(|tag| tag.date);

    for number in &build.prs {
        let pr = remote.get_pr(GUTENBERG_REPO, *number)?;
        let sha = pr.merge_commit_sha.as_deref().ok_or_else(|| {
            ReleaseError::missing(format!("pull request {} has no merge commit", number))
        })?;
        console.info(&format!("Cherry-picking #{} ({})", number, sha));
        git.fetch(sha, since.as_deref())?;

        if let Err(err) = git.cherry_pick(sha) {
            resolve_conflicts(console, git, number, err)?;
        }
    }

    console.info("Branch now looks like:");
    console.info(&git.recent_log(build.prs.len() + 1)?);
    Ok(())
}

fn resolve_conflicts(
    console: &Console,
    git: &Git,
    number: &u64,
    err: ReleaseError,
) -> Result<()> {
    console.warn(&format!("cherry-pick of #{} hit conflicts: {}", number, err));
    for path in git.conflicts()? {
        console.info(&format!("  conflict: {}", path));
    }
    console.info(&format!(
        "Resolve the conflicts in {} in another terminal.",
        git.dir().display()
    ));
    if console.confirm("Open the conflicting files in $EDITOR?")? {
        for path in git.conflicts()? {
            open_in_editor(&git.dir().join(path))?;
        }
    }
    if !console.confirm("Conflicts resolved, continue the cherry-pick?")? {
        return Err(ReleaseError::aborted("cherry-pick abandoned"));
    }
    git.cherry_pick_continue()
}

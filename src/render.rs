use chrono::{Datelike, Duration, NaiveDate, Weekday};

use crate::gh::PullRequest;
use crate::version::Version;

/// Body for the editor repo release pull request.
pub fn editor_pr_body(version: &Version, wrapper_pr_url: &str) -> String {
    format!(
        "## Description\n\
         Release {version} of the mobile editor.\n\n\
         This PR contains the version bumps and changelog entries for the \
         `{version}` mobile release. It targets the frozen release branch and \
         is merged as part of the release, not before.\n\n\
         Part of the gutenberg-mobile release: {wrapper}\n\n\
         ## Test plan\n\
         The release is validated end to end from the gutenberg-mobile PR.\n",
        version = version,
        wrapper = wrapper_pr_url,
    )
}

/// Body for the wrapper repo release pull request.
pub fn wrapper_pr_body(
    version: &Version,
    editor_pr_url: &str,
    changes: &str,
    related_prs: &[PullRequest],
) -> String {
    let mut body = format!(
        "## Release {version}\n\n\
         This PR pins gutenberg to the `rnmobile/release_{version}` branch and \
         bumps the bundle for the `{version}` release.\n\n\
         Gutenberg PR: {editor}\n\n\
         ## Changes\n{changes}\n",
        version = version,
        editor = editor_pr_url,
        changes = changes,
    );
    if !related_prs.is_empty() {
        body.push_str("\n## Related PRs\n");
        for pr in related_prs {
            body.push_str(&format!("- {} ({})\n", pr.html_url, pr.repo));
        }
    }
    body
}

/// Body for an integration pull request in one of the main apps.
pub fn integration_pr_body(version: &Version, release_url: &str) -> String {
    format!(
        "## Description\n\
         Integrates gutenberg-mobile `{version}`.\n\n\
         Release: {url}\n\n\
         ## Test plan\n\
         - Smoke test the editor on a post with common blocks.\n\
         - Verify the gutenberg-mobile ref points at `v{version}`.\n",
        version = version,
        url = release_url,
    )
}

/// Body for the GitHub release itself.
pub fn release_body(release_notes: &str, pr_references: &[String]) -> String {
    let mut body = format!("## What's changed\n\n{}\n", release_notes.trim());
    if !pr_references.is_empty() {
        body.push_str("\n## Referenced PRs\n");
        for reference in pr_references {
            body.push_str(&format!("- {}\n", reference));
        }
    }
    body
}

/// The plain-text release checklist handed to the release wrangler.
pub fn checklist(
    version: &Version,
    host_version: Option<&str>,
    date: &str,
    message: Option<&str>,
) -> String {
    let host = host_version.unwrap_or("TBD");
    let prepare_step = if version.is_patch_release() {
        format!(
            "[ ] Run `gbm-release release prepare all {} --prs <fix PR numbers>`\n",
            version
        )
    } else {
        format!("[ ] Run `gbm-release release prepare all {}`\n", version)
    };
    let mut out = format!(
        "Release checklist for gutenberg-mobile v{version} (apps {host}, cut {date})\n\
         \n\
         Before the release:\n\
         [ ] Post the release announcement in the releases channel\n\
         [ ] Verify the Aztec dependencies point at stable tags\n\
         [ ] Check for open PRs labeled for this release\n\
         \n\
         Cut the release:\n\
         {prepare_step}\
         [ ] Verify both release PRs and ask for review\n\
         \n\
         Publish:\n\
         [ ] Run `gbm-release release publish {version}` once approvals and CI are green\n\
         [ ] Verify the v{version} release appears on GitHub\n\
         [ ] Wait for the S3 bridge builds to go green\n\
         \n\
         Integrate:\n\
         [ ] Run `gbm-release release integrate {version}`\n\
         [ ] Ask the platform teams to review the integration PRs\n",
        version = version,
        host = host,
        date = date,
    );
    if let Some(message) = message {
        out.push_str(&format!("\nNotes: {}\n", message));
    }
    out
}

/// The plain-text steps for upgrading the Aztec dependencies ahead of a
/// release. Both platforms must end up pinned to a stable tag.
pub fn aztec_steps() -> String {
    "Aztec upgrade steps\n\
     \n\
     Both platforms must pin a stable Aztec release before the editor release \
     branch is cut.\n\
     \n\
     Android:\n\
     [ ] Cut and publish a new AztecEditor-Android release\n\
     [ ] Update `aztecVersion` in packages/react-native-aztec/android/build.gradle\n\
     [ ] Open a gutenberg PR with the new pin and wait for CI\n\
     \n\
     iOS:\n\
     [ ] Cut and publish a new AztecEditor-iOS release\n\
     [ ] Update `WordPress-Aztec-iOS` in packages/react-native-aztec/RNTAztecView.podspec\n\
     [ ] Open a gutenberg PR with the new pin and wait for CI\n\
     \n\
     Verify:\n\
     [ ] Neither pin is a commit hash or a prerelease\n\
     [ ] `gbm-release release prepare` no longer warns about unstable Aztec versions\n"
        .to_string()
}

/// The next scheduled release cut date: releases are cut on Thursdays.
pub fn next_release_date(today: NaiveDate) -> NaiveDate {
    let mut date = today + Duration::days(1);
    while date.weekday() != Weekday::Thu {
        date += Duration::days(1);
    }
    date
}

use console::style;

use crate::config::{Config, GUTENBERG_MOBILE_REPO, WORDPRESS_ANDROID_REPO, WORDPRESS_IOS_REPO};
use crate::console::Console;
use crate::error::Result;
use crate::gh::{PullRequest, Remote};
use crate::release::integrate::Platform;
use crate::release::{find_editor_release_pr, find_integration_pr, find_wrapper_release_pr};
use crate::version::Version;

struct Row {
    item: &'static str,
    state: String,
    url: String,
}

/// Prints where each moving part of the release currently stands.
pub fn release_status(
    remote: &dyn Remote,
    config: &Config,
    console: &Console,
    version: &Version,
) -> Result<()> {
    let mut rows = Vec::new();

    rows.push(pr_row(
        "Editor PR",
        find_editor_release_pr(remote, config, version)?,
    ));
    rows.push(pr_row(
        "Wrapper PR",
        find_wrapper_release_pr(remote, config, version)?,
    ));
    rows.push(pr_row(
        "Android integration",
        find_integration_pr(remote, config, WORDPRESS_ANDROID_REPO, version)?,
    ));
    rows.push(pr_row(
        "iOS integration",
        find_integration_pr(remote, config, WORDPRESS_IOS_REPO, version)?,
    ));

    let tag = version.vstring();
    rows.push(
        match remote.get_release(GUTENBERG_MOBILE_REPO, &tag)? {
            Some(release) => Row {
                item: "Release",
                state: if release.published_at.is_some() {
                    "published".to_string()
                } else {
                    "draft".to_string()
                },
                url: release.html_url,
            },
            None => Row {
                item: "Release",
                state: "missing".to_string(),
                url: String::new(),
            },
        },
    );

    if let Some(tag_info) = remote.get_tag(GUTENBERG_MOBILE_REPO, &tag)? {
        for platform in [Platform::Android, Platform::Ios] {
            let item = match platform {
                Platform::Android => "Android build",
                Platform::Ios => "iOS build",
            };
            rows.push(
                match remote.get_status_check(
                    GUTENBERG_MOBILE_REPO,
                    &tag_info.sha,
                    platform.status_context(),
                )? {
                    Some(check) => Row {
                        item,
                        state: check.state,
                        url: String::new(),
                    },
                    None => Row {
                        item,
                        state: "missing".to_string(),
                        url: String::new(),
                    },
                },
            );
        }
    }

    console.out(&format!("Release status for v{}", version));
    for row in rows {
        let state = match row.state.as_str() {
            "merged" | "published" | "success" => style(row.state.clone()).green(),
            "missing" | "conflicts" | "failure" | "error" => style(row.state.clone()).red(),
            _ => style(row.state.clone()).yellow(),
        };
        console.out(&format!("  {:<22} {:<10} {}", row.item, state, row.url));
    }
    Ok(())
}

fn pr_row(item: &'static str, pr: Option<PullRequest>) -> Row {
    match pr {
        Some(pr) => Row {
            item,
            state: if pr.merged {
                "merged".to_string()
            } else if pr.mergeable == Some(false) {
                "conflicts".to_string()
            } else if pr.draft {
                "draft".to_string()
            } else {
                pr.state.clone()
            },
            url: pr.html_url,
        },
        None => Row {
            item,
            state: "missing".to_string(),
            url: String::new(),
        },
    }
}

use std::str::FromStr;

use gbm_release::config::Config;
use gbm_release::console::Console;
use gbm_release::gh::{Label, MockRemote, PullRequest, Release, StatusCheck, TagInfo};
use gbm_release::release::integrate::{create_integration_pr, Platform};
use gbm_release::release::INTEGRATION_PR_LABEL;
use gbm_release::version::Version;
use gbm_release::workspace::Workspace;

const ANDROID_CONTEXT: &str = "build-android-rn-bridge-and-publish-to-s3";

fn version() -> Version {
    Version::from_str("1.2.0").unwrap()
}

fn console() -> Console {
    Console::new(true)
}

fn published_release(remote: &mut MockRemote) {
    remote.set_release(
        "gutenberg-mobile",
        Release {
            tag_name: "v1.2.0".to_string(),
            published_at: Some("2024-03-07T12:00:00Z".to_string()),
            html_url: "https://github.com/wordpress-mobile/gutenberg-mobile/releases/tag/v1.2.0"
                .to_string(),
            ..Default::default()
        },
    );
    remote.set_tag(
        "gutenberg-mobile",
        "v1.2.0",
        TagInfo {
            sha: "tag-sha".to_string(),
            date: "2024-03-07T12:00:00Z".to_string(),
        },
    );
}

#[test]
fn unpublished_release_defers_integration() {
    let mut remote = MockRemote::new();
    let workspace = Workspace::new(false).unwrap();
    let result = create_integration_pr(
        &mut remote,
        &Config::default(),
        &console(),
        &workspace,
        &version(),
        Platform::Android,
    )
    .unwrap();
    assert!(result.is_none());
    assert_eq!(remote.created_pr_count(), 0);
}

#[test]
fn pending_artifact_build_defers_integration() {
    let mut remote = MockRemote::new();
    published_release(&mut remote);
    remote.set_status(
        "gutenberg-mobile",
        "tag-sha",
        StatusCheck {
            state: "pending".to_string(),
            context: ANDROID_CONTEXT.to_string(),
        },
    );

    let workspace = Workspace::new(false).unwrap();
    let result = create_integration_pr(
        &mut remote,
        &Config::default(),
        &console(),
        &workspace,
        &version(),
        Platform::Android,
    )
    .unwrap();
    assert!(result.is_none());
}

#[test]
fn missing_artifact_build_defers_integration() {
    let mut remote = MockRemote::new();
    published_release(&mut remote);

    let workspace = Workspace::new(false).unwrap();
    let result = create_integration_pr(
        &mut remote,
        &Config::default(),
        &console(),
        &workspace,
        &version(),
        Platform::Android,
    )
    .unwrap();
    assert!(result.is_none());
}

#[test]
fn existing_integration_pr_is_returned_untouched() {
    let mut remote = MockRemote::new();
    published_release(&mut remote);
    remote.set_status(
        "gutenberg-mobile",
        "tag-sha",
        StatusCheck {
            state: "success".to_string(),
            context: ANDROID_CONTEXT.to_string(),
        },
    );
    remote.add_pr(
        "WordPress-Android",
        PullRequest {
            number: 42,
            title: "Integrate gutenberg-mobile v1.2.0".to_string(),
            state: "open".to_string(),
            html_url: "https://github.com/wordpress-mobile/WordPress-Android/pull/42".to_string(),
            labels: vec![Label {
                name: INTEGRATION_PR_LABEL.to_string(),
            }],
            repo: "WordPress-Android".to_string(),
            ..Default::default()
        },
    );

    let workspace = Workspace::new(false).unwrap();
    let result = create_integration_pr(
        &mut remote,
        &Config::default(),
        &console(),
        &workspace,
        &version(),
        Platform::Android,
    )
    .unwrap();
    assert_eq!(result.unwrap().number, 42);
    assert_eq!(remote.created_pr_count(), 1);
}

//! GitHub gateway: wire types, the `Remote` trait, and the pull request
//! predicates the publish gate is built on.

mod client;
mod mock;

pub use client::{fetch_raw_file, GhClient};
pub use mock::MockRemote;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::console::Console;
use crate::error::{ReleaseError, Result};

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct User {
    pub login: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Label {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Branch {
    pub name: String,
    pub commit: Commit,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Commit {
    pub sha: String,
}

/// A pull request as the REST API returns it, plus a locally-tracked
/// `repo` field that never crosses the wire.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct PullRequest {
    pub number: u64,
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub draft: bool,
    #[serde(default)]
    pub html_url: String,
    #[serde(default)]
    pub user: User,
    #[serde(default)]
    pub labels: Vec<Label>,
    #[serde(default)]
    pub requested_reviewers: Vec<User>,
    #[serde(default)]
    pub mergeable: Option<bool>,
    #[serde(default)]
    pub merged: bool,
    #[serde(default)]
    pub merge_commit_sha: Option<String>,
    #[serde(default)]
    pub head: Option<PrBranch>,
    #[serde(default)]
    pub base: Option<PrBranch>,

    /// Which repository the PR belongs to; set locally, never on the wire.
    #[serde(skip)]
    pub repo: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct PrBranch {
    #[serde(rename = "ref")]
    pub ref_name: String,
    #[serde(default)]
    pub sha: String,
}

/// The writable subset of a pull request, for create and update calls.
#[derive(Debug, Clone, Serialize, Default)]
pub struct PrRequest {
    pub title: String,
    pub body: String,
    pub head: String,
    pub base: String,
    pub draft: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Review {
    pub state: String,
    #[serde(default)]
    pub user: User,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CheckRun {
    pub name: String,
    pub status: String,
    #[serde(default)]
    pub conclusion: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct CheckRuns {
    #[serde(default)]
    pub check_runs: Vec<CheckRun>,
}

/// One context from the combined commit status endpoint.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StatusCheck {
    pub state: String,
    pub context: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Release {
    pub tag_name: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub html_url: String,
    #[serde(default)]
    pub prerelease: bool,
    #[serde(default)]
    pub target_commitish: String,
    #[serde(default)]
    pub published_at: Option<String>,
}

/// Resolved tag details: the commit it points at and when it was created.
#[derive(Debug, Clone)]
pub struct TagInfo {
    pub sha: String,
    pub date: String,
}

/// Narrows a search query to one repository plus arbitrary qualifiers.
#[derive(Debug, Clone)]
pub struct RepoFilter {
    pub repo: String,
    pub queries: Vec<String>,
}

pub fn build_repo_filter(repo: &str, org: &str, queries: &[&str]) -> RepoFilter {
    RepoFilter {
        repo: format!("{}/{}", org, repo),
        queries: queries.iter().map(|q| q.to_string()).collect(),
    }
}

impl RepoFilter {
    /// The full search string; percent-encoding is left to the HTTP client.
    pub fn query(&self) -> String {
        let mut parts = vec![format!("repo:{}", self.repo)];
        parts.extend(self.queries.iter().cloned());
        parts.join(" ")
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchResult {
    pub total_count: u64,
    pub items: Vec<PullRequest>,
}

/// Everything the release commands need from GitHub.
///
/// `GhClient` implements this against the REST API; `MockRemote` backs the
/// tests with in-memory state. Trait objects are shared across threads by
/// the fan-out searches, hence the `Send + Sync` bound.
pub trait Remote: Send + Sync {
    /// Looks up a branch. A missing branch is `Ok(None)`, not an error.
    fn search_branch(&self, repo: &str, branch: &str) -> Result<Option<Branch>>;

    /// Runs an issue search restricted to pull requests.
    fn search_prs(&self, filter: &RepoFilter) -> Result<SearchResult>;

    /// Fetches the full pull request, including mergeability.
    fn get_pr(&self, repo: &str, number: u64) -> Result<PullRequest>;

    fn create_pr(&mut self, repo: &str, request: &PrRequest) -> Result<PullRequest>;

    fn update_pr(&mut self, repo: &str, number: u64, request: &PrRequest) -> Result<PullRequest>;

    fn add_labels(&mut self, repo: &str, number: u64, labels: &[&str]) -> Result<()>;

    fn get_reviews(&self, repo: &str, number: u64) -> Result<Vec<Review>>;

    fn get_check_runs(&self, repo: &str, sha: &str) -> Result<CheckRuns>;

    /// One combined-status context for a commit, `None` when absent.
    fn get_status_check(&self, repo: &str, sha: &str, context: &str)
        -> Result<Option<StatusCheck>>;

    fn get_release(&self, repo: &str, tag: &str) -> Result<Option<Release>>;

    fn create_release(&mut self, repo: &str, release: &Release) -> Result<Release>;

    fn get_tag(&self, repo: &str, tag: &str) -> Result<Option<TagInfo>>;

    /// Looks up a single pull request by search. Zero hits is `Ok(None)`;
    /// more than one hit means the filter was too loose and is an error, as
    /// is a result whose reported count disagrees with its items.
    fn search_pr(&self, filter: &RepoFilter) -> Result<Option<PullRequest>> {
        let result = self.search_prs(filter)?;
        if result.total_count > 1 || result.items.len() > 1 {
            return Err(ReleaseError::remote(format!(
                "expected at most one pull request for {:?}, found {}",
                filter.queries,
                result.total_count.max(result.items.len() as u64)
            )));
        }
        match result.items.first() {
            None if result.total_count == 0 => Ok(None),
            None => Err(ReleaseError::remote(format!(
                "search reported {} pull requests but returned none",
                result.total_count
            ))),
            Some(found) => {
                let repo = filter
                    .repo
                    .split('/')
                    .next_back()
                    .unwrap_or(&filter.repo)
                    .to_string();
                let mut pr = self.get_pr(&repo, found.number)?;
                pr.repo = repo;
                Ok(Some(pr))
            }
        }
    }
}

/// A pull request counts as approved when the latest review approved it and
/// nobody else is still queued for review.
pub fn is_pr_approved(remote: &dyn Remote, pr: &PullRequest) -> Result<bool> {
    let reviews = remote.get_reviews(&pr.repo, pr.number)?;
    let last_approved = reviews
        .last()
        .map(|r| r.state == "APPROVED")
        .unwrap_or(false);
    Ok(last_approved && pr.requested_reviewers.is_empty())
}

/// Whether the head commit's checks allow merging.
///
/// Only completed check runs are considered. A completed run passes when it
/// concluded neutral, skipped, or success, or when its name is in the skip
/// list. Runs still in progress never block.
pub fn is_pr_passing(
    remote: &dyn Remote,
    pr: &PullRequest,
    skip: &[String],
    console: &Console,
) -> Result<bool> {
    let sha = match &pr.head {
        Some(head) => &head.sha,
        None => return Err(ReleaseError::remote("pull request has no head commit")),
    };
    let runs = remote.get_check_runs(&pr.repo, sha)?;

    let mut passing = true;
    for run in &runs.check_runs {
        if run.status != "completed" {
            continue;
        }
        let conclusion = run.conclusion.as_deref().unwrap_or("");
        let ok = matches!(conclusion, "neutral" | "skipped" | "success")
            || skip.iter().any(|s| s == &run.name);
        if !ok {
            console.info(&format!("  check {} concluded {}", run.name, conclusion));
            passing = false;
        }
    }
    Ok(passing)
}

/// Finds open pull requests in `repos` whose bodies link back to `anchor`.
///
/// The searches run in parallel and a failed search only produces a warning;
/// a partial list is still useful for the PR body.
pub fn find_synced_prs(
    remote: &dyn Remote,
    config: &crate::config::Config,
    repos: &[&str],
    anchor: &str,
    console: &Console,
) -> Vec<PullRequest> {
    let results: Vec<Result<Vec<PullRequest>>> = repos
        .par_iter()
        .map(|repo| {
            let org = config.org_for(repo)?;
            let filter = build_repo_filter(repo, org, &["is:open", "is:pr"]);
            let found = remote.search_prs(&filter)?;
            Ok(found
                .items
                .into_iter()
                .filter(|pr| pr.body.contains(anchor))
                .map(|mut pr| {
                    pr.repo = repo.to_string();
                    pr
                })
                .collect())
        })
        .collect();

    let mut prs = Vec::new();
    for (repo, result) in repos.iter().zip(results) {
        match result {
            Ok(found) => prs.extend(found),
            Err(e) => console.warn(&format!("could not search {}: {}", repo, e)),
        }
    }
    prs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn console() -> Console {
        Console::new(true)
    }

    #[test]
    fn test_repo_filter_query() {
        let filter = build_repo_filter(
            "gutenberg-mobile",
            "wordpress-mobile",
            &["is:pr", "v1.2.3 in:title"],
        );
        assert_eq!(
            filter.query(),
            "repo:wordpress-mobile/gutenberg-mobile is:pr v1.2.3 in:title"
        );
    }

    #[test]
    fn test_approved_needs_empty_reviewer_queue() {
        let mut remote = MockRemote::new();
        let pr = remote.add_pr(
            "gutenberg-mobile",
            PullRequest {
                number: 7,
                requested_reviewers: vec![User {
                    login: "reviewer".into(),
                }],
                repo: "gutenberg-mobile".into(),
                ..Default::default()
            },
        );
        remote.set_reviews(
            "gutenberg-mobile",
            7,
            vec![Review {
                state: "APPROVED".into(),
                user: User::default(),
            }],
        );
        assert!(!is_pr_approved(&remote, &pr).unwrap());
    }

    #[test]
    fn test_approved_uses_the_latest_review() {
        let mut remote = MockRemote::new();
        let pr = remote.add_pr(
            "gutenberg-mobile",
            PullRequest {
                number: 7,
                repo: "gutenberg-mobile".into(),
                ..Default::default()
            },
        );
        remote.set_reviews(
            "gutenberg-mobile",
            7,
            vec![
                Review {
                    state: "CHANGES_REQUESTED".into(),
                    user: User::default(),
                },
                Review {
                    state: "APPROVED".into(),
                    user: User::default(),
                },
            ],
        );
        assert!(is_pr_approved(&remote, &pr).unwrap());
    }

    #[test]
    fn test_passing_ignores_checks_in_progress() {
        let mut remote = MockRemote::new();
        let pr = remote.add_pr(
            "gutenberg-mobile",
            PullRequest {
                number: 3,
                head: Some(PrBranch {
                    ref_name: "release/1.0.0".into(),
                    sha: "abc".into(),
                }),
                repo: "gutenberg-mobile".into(),
                ..Default::default()
            },
        );
        remote.set_check_runs(
            "gutenberg-mobile",
            "abc",
            vec![
                CheckRun {
                    name: "lint".into(),
                    status: "in_progress".into(),
                    conclusion: None,
                },
                CheckRun {
                    name: "unit".into(),
                    status: "completed".into(),
                    conclusion: Some("success".into()),
                },
            ],
        );
        assert!(is_pr_passing(&remote, &pr, &[], &console()).unwrap());
    }

    #[test]
    fn test_failing_check_can_be_skipped_by_name() {
        let mut remote = MockRemote::new();
        let pr = remote.add_pr(
            "gutenberg-mobile",
            PullRequest {
                number: 3,
                head: Some(PrBranch {
                    ref_name: "release/1.0.0".into(),
                    sha: "abc".into(),
                }),
                repo: "gutenberg-mobile".into(),
                ..Default::default()
            },
        );
        remote.set_check_runs(
            "gutenberg-mobile",
            "abc",
            vec![CheckRun {
                name: "flaky-e2e".into(),
                status: "completed".into(),
                conclusion: Some("failure".into()),
            }],
        );
        assert!(!is_pr_passing(&remote, &pr, &[], &console()).unwrap());
        assert!(is_pr_passing(&remote, &pr, &["flaky-e2e".to_string()], &console()).unwrap());
    }

    // reports one hit but returns no items, like a truncated search page
    struct InconsistentRemote;

    impl Remote for InconsistentRemote {
        fn search_branch(&self, _: &str, _: &str) -> Result<Option<Branch>> {
            unimplemented!()
        }
        fn search_prs(&self, _: &RepoFilter) -> Result<SearchResult> {
            Ok(SearchResult {
                total_count: 1,
                items: Vec::new(),
            })
        }
        fn get_pr(&self, _: &str, _: u64) -> Result<PullRequest> {
            unimplemented!()
        }
        fn create_pr(&mut self, _: &str, _: &PrRequest) -> Result<PullRequest> {
            unimplemented!()
        }
        fn update_pr(&mut self, _: &str, _: u64, _: &PrRequest) -> Result<PullRequest> {
            unimplemented!()
        }
        fn add_labels(&mut self, _: &str, _: u64, _: &[&str]) -> Result<()> {
            unimplemented!()
        }
        fn get_reviews(&self, _: &str, _: u64) -> Result<Vec<Review>> {
            unimplemented!()
        }
        fn get_check_runs(&self, _: &str, _: &str) -> Result<CheckRuns> {
            unimplemented!()
        }
        fn get_status_check(&self, _: &str, _: &str, _: &str) -> Result<Option<StatusCheck>> {
            unimplemented!()
        }
        fn get_release(&self, _: &str, _: &str) -> Result<Option<Release>> {
            unimplemented!()
        }
        fn create_release(&mut self, _: &str, _: &Release) -> Result<Release> {
            unimplemented!()
        }
        fn get_tag(&self, _: &str, _: &str) -> Result<Option<TagInfo>> {
            unimplemented!()
        }
    }

    #[test]
    fn test_search_pr_rejects_count_item_mismatch() {
        let filter = build_repo_filter("gutenberg-mobile", "wordpress-mobile", &["is:pr"]);
        let err = InconsistentRemote.search_pr(&filter).unwrap_err();
        assert!(err.to_string().contains("returned none"));
    }

    #[test]
    fn test_search_pr_rejects_ambiguous_results() {
        let mut remote = MockRemote::new();
        for number in [1, 2] {
            remote.add_pr(
                "gutenberg-mobile",
                PullRequest {
                    number,
                    title: "Release 1.0.0".into(),
                    repo: "gutenberg-mobile".into(),
                    ..Default::default()
                },
            );
        }
        let filter = build_repo_filter("gutenberg-mobile", "wordpress-mobile", &["is:pr"]);
        assert!(remote.search_pr(&filter).is_err());
    }
}

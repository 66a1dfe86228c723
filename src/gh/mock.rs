use std::collections::HashMap;

use super::{
    Branch, CheckRun, CheckRuns, Commit, PullRequest, PrRequest, Release, RepoFilter, Review,
    SearchResult, StatusCheck, TagInfo,
};
use crate::error::{ReleaseError, Result};
use crate::gh::Remote;

/// In-memory stand-in for the REST client, for tests.
///
/// Search support is deliberately shallow: it understands the handful of
/// qualifiers the release commands actually emit (`is:open`, `label:`,
/// `in:title`) and treats everything else as a match.
#[derive(Debug, Default)]
pub struct MockRemote {
    prs: HashMap<(String, u64), PullRequest>,
    branches: HashMap<(String, String), Branch>,
    reviews: HashMap<(String, u64), Vec<Review>>,
    check_runs: HashMap<(String, String), Vec<CheckRun>>,
    statuses: HashMap<(String, String, String), StatusCheck>,
    releases: HashMap<(String, String), Release>,
    tags: HashMap<(String, String), TagInfo>,
    next_number: u64,
}

impl MockRemote {
    pub fn new() -> MockRemote {
        MockRemote {
            next_number: 1,
            ..Default::default()
        }
    }

    pub fn add_pr(&mut self, repo: &str, pr: PullRequest) -> PullRequest {
        self.next_number = self.next_number.max(pr.number + 1);
        self.prs.insert((repo.to_string(), pr.number), pr.clone());
        pr
    }

    pub fn add_branch(&mut self, repo: &str, name: &str, sha: &str) {
        self.branches.insert(
            (repo.to_string(), name.to_string()),
            Branch {
                name: name.to_string(),
                commit: Commit {
                    sha: sha.to_string(),
                },
            },
        );
    }

    pub fn set_reviews(&mut self, repo: &str, number: u64, reviews: Vec<Review>) {
        self.reviews.insert((repo.to_string(), number), reviews);
    }

    pub fn set_check_runs(&mut self, repo: &str, sha: &str, runs: Vec<CheckRun>) {
        self.check_runs
            .insert((repo.to_string(), sha.to_string()), runs);
    }

    pub fn set_status(&mut self, repo: &str, sha: &str, check: StatusCheck) {
        self.statuses.insert(
            (repo.to_string(), sha.to_string(), check.context.clone()),
            check,
        );
    }

    pub fn set_release(&mut self, repo: &str, release: Release) {
        self.releases
            .insert((repo.to_string(), release.tag_name.clone()), release);
    }

    pub fn set_tag(&mut self, repo: &str, tag: &str, info: TagInfo) {
        self.tags.insert((repo.to_string(), tag.to_string()), info);
    }

    pub fn created_pr_count(&self) -> usize {
        self.prs.len()
    }

    fn matches(pr: &PullRequest, query: &str) -> bool {
        if query == "is:open" {
            return pr.state == "open";
        }
        if let Some(label) = query.strip_prefix("label:") {
            let label = label.trim_matches('"');
            return pr.labels.iter().any(|l| l.name == label);
        }
        if let Some(needle) = query.strip_suffix(" in:title") {
            return pr.title.contains(needle);
        }
        true
    }
}

impl Remote for MockRemote {
    fn search_branch(&self, repo: &str, branch: &str) -> Result<Option<Branch>> {
        Ok(self
            .branches
            .get(&(repo.to_string(), branch.to_string()))
            .cloned())
    }

    fn search_prs(&self, filter: &RepoFilter) -> Result<SearchResult> {
        let repo = filter
            .repo
            .split('/')
            .next_back()
            .unwrap_or(&filter.repo)
            .to_string();
        let mut items: Vec<PullRequest> = self
            .prs
            .iter()
            .filter(|((r, _), _)| *r == repo)
            .map(|(_, pr)| pr.clone())
            .filter(|pr| filter.queries.iter().all(|q| Self::matches(pr, q)))
            .collect();
        items.sort_by_key(|pr| pr.number);
        Ok(SearchResult {
            total_count: items.len() as u64,
            items,
        })
    }

    fn get_pr(&self, repo: &str, number: u64) -> Result<PullRequest> {
        self.prs
            .get(&(repo.to_string(), number))
            .cloned()
            .ok_or_else(|| ReleaseError::missing(format!("no pull request {}/{}", repo, number)))
    }

    fn create_pr(&mut self, repo: &str, request: &PrRequest) -> Result<PullRequest> {
        let number = self.next_number;
        self.next_number += 1;
        let pr = PullRequest {
            number,
            title: request.title.clone(),
            body: request.body.clone(),
            state: "open".to_string(),
            draft: request.draft,
            html_url: format!("https://github.com/org/{}/pull/{}", repo, number),
            head: Some(super::PrBranch {
                ref_name: request.head.clone(),
                sha: format!("sha-{}", number),
            }),
            base: Some(super::PrBranch {
                ref_name: request.base.clone(),
                sha: String::new(),
            }),
            repo: repo.to_string(),
            ..Default::default()
        };
        self.prs.insert((repo.to_string(), number), pr.clone());
        Ok(pr)
    }

    fn update_pr(&mut self, repo: &str, number: u64, request: &PrRequest) -> Result<PullRequest> {
        let pr = self
            .prs
            .get_mut(&(repo.to_string(), number))
            .ok_or_else(|| ReleaseError::missing(format!("no pull request {}/{}", repo, number)))?;
        if !request.title.is_empty() {
            pr.title = request.title.clone();
        }
        if !request.body.is_empty() {
            pr.body = request.body.clone();
        }
        Ok(pr.clone())
    }

    fn add_labels(&mut self, repo: &str, number: u64, labels: &[&str]) -> Result<()> {
        let pr = self
            .prs
            .get_mut(&(repo.to_string(), number))
            .ok_or_else(|| ReleaseError::missing(format!("no pull request {}/{}", repo, number)))?;
        for label in labels {
            pr.labels.push(super::Label {
                name: label.to_string(),
            });
        }
        Ok(())
    }

    fn get_reviews(&self, repo: &str, number: u64) -> Result<Vec<Review>> {
        Ok(self
            .reviews
            .get(&(repo.to_string(), number))
            .cloned()
            .unwrap_or_default())
    }

    fn get_check_runs(&self, repo: &str, sha: &str) -> Result<CheckRuns> {
        Ok(CheckRuns {
            check_runs: self
                .check_runs
                .get(&(repo.to_string(), sha.to_string()))
                .cloned()
                .unwrap_or_default(),
        })
    }

    fn get_status_check(
        &self,
        repo: &str,
        sha: &str,
        context: &str,
    ) -> Result<Option<StatusCheck>> {
        Ok(self
            .statuses
            .get(&(repo.to_string(), sha.to_string(), context.to_string()))
            .cloned())
    }

    fn get_release(&self, repo: &str, tag: &str) -> Result<Option<Release>> {
        Ok(self
            .releases
            .get(&(repo.to_string(), tag.to_string()))
            .cloned())
    }

    fn create_release(&mut self, repo: &str, release: &Release) -> Result<Release> {
        let mut created = release.clone();
        created.html_url = format!(
            "https://github.com/org/{}/releases/tag/{}",
            repo, release.tag_name
        );
        created.published_at = Some("2024-01-01T00:00:00Z".to_string());
        self.releases.insert(
            (repo.to_string(), release.tag_name.clone()),
            created.clone(),
        );
        Ok(created)
    }

    fn get_tag(&self, repo: &str, tag: &str) -> Result<Option<TagInfo>> {
        Ok(self
            .tags
            .get(&(repo.to_string(), tag.to_string()))
            .cloned())
    }
}

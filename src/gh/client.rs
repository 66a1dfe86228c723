use std::env;

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

use super::{
    Branch, CheckRuns, PullRequest, PrRequest, Release, RepoFilter, Remote, Review, SearchResult,
    StatusCheck, TagInfo,
};
use crate::config::Config;
use crate::error::{ReleaseError, Result};

const DEFAULT_BASE_URL: &str = "https://api.github.com";
const USER_AGENT: &str = concat!("gbm-release/", env!("CARGO_PKG_VERSION"));

/// REST client for the `Remote` trait.
pub struct GhClient {
    http: Client,
    base_url: String,
    token: Option<String>,
    config: Config,
}

impl GhClient {
    /// Builds a client against api.github.com, reading the token from
    /// `GITHUB_TOKEN` (or `GH_TOKEN`). Most read endpoints work without a
    /// token, so its absence is only a warning at call sites that need it.
    pub fn new(config: Config) -> Result<GhClient> {
        let token = env::var("GITHUB_TOKEN")
            .or_else(|_| env::var("GH_TOKEN"))
            .ok();
        Ok(GhClient {
            http: Client::builder().user_agent(USER_AGENT).build()?,
            base_url: DEFAULT_BASE_URL.to_string(),
            token,
            config,
        })
    }

    /// Points the client at a different API root, for tests.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> GhClient {
        self.base_url = base_url.into();
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn repo_path(&self, repo: &str, rest: &str) -> Result<String> {
        let org = self.config.org_for(repo)?;
        Ok(format!("repos/{}/{}/{}", org, repo, rest))
    }

    fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        let builder = builder.header("Accept", "application/vnd.github+json");
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.authed(self.http.get(self.url(path))).send()?;
        parse(response, path)
    }

    /// Like `get_json`, but a 404 becomes `Ok(None)`.
    fn get_json_opt<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>> {
        let response = self.authed(self.http.get(self.url(path))).send()?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        parse(response, path).map(Some)
    }
}

fn parse<T: DeserializeOwned>(response: Response, path: &str) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().unwrap_or_default();
        return Err(ReleaseError::remote(format!(
            "{} returned {}: {}",
            path,
            status,
            body.chars().take(200).collect::<String>()
        )));
    }
    Ok(response.json()?)
}

/// Fetches a file from raw.githubusercontent.com at the given ref.
pub fn fetch_raw_file(org: &str, repo: &str, git_ref: &str, path: &str) -> Result<String> {
    let url = format!(
        "https://raw.githubusercontent.com/{}/{}/{}/{}",
        org, repo, git_ref, path
    );
    let response = reqwest::blocking::Client::builder()
        .user_agent(USER_AGENT)
        .build()?
        .get(&url)
        .send()?;
    let status = response.status();
    if !status.is_success() {
        return Err(ReleaseError::remote(format!(
            "could not fetch {}: {}",
            url, status
        )));
    }
    Ok(response.text()?)
}

#[derive(Debug, Deserialize)]
struct CombinedStatus {
    #[serde(default)]
    statuses: Vec<StatusCheck>,
}

#[derive(Debug, Deserialize)]
struct RefLookup {
    object: RefObject,
}

#[derive(Debug, Deserialize)]
struct RefObject {
    sha: String,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Deserialize)]
struct TagObject {
    object: TagTarget,
    tagger: Tagger,
}

#[derive(Debug, Deserialize)]
struct TagTarget {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct Tagger {
    date: String,
}

#[derive(Debug, Deserialize)]
struct CommitLookup {
    sha: String,
    commit: CommitDetail,
}

#[derive(Debug, Deserialize)]
struct CommitDetail {
    committer: Tagger,
}

impl Remote for GhClient {
    fn search_branch(&self, repo: &str, branch: &str) -> Result<Option<Branch>> {
        let path = self.repo_path(repo, &format!("branches/{}", branch))?;
        self.get_json_opt(&path)
    }

    fn search_prs(&self, filter: &RepoFilter) -> Result<SearchResult> {
        let path = "search/issues";
        let response = self
            .authed(self.http.get(self.url(path)).query(&[("q", filter.query())]))
            .send()?;
        parse(response, path)
    }

    fn get_pr(&self, repo: &str, number: u64) -> Result<PullRequest> {
        let path = self.repo_path(repo, &format!("pulls/{}", number))?;
        let mut pr: PullRequest = self.get_json(&path)?;
        pr.repo = repo.to_string();
        Ok(pr)
    }

    fn create_pr(&mut self, repo: &str, request: &PrRequest) -> Result<PullRequest> {
        let path = self.repo_path(repo, "pulls")?;
        let response = self
            .authed(self.http.post(self.url(&path)))
            .json(request)
            .send()?;
        let mut pr: PullRequest = parse(response, &path)?;
        pr.repo = repo.to_string();
        Ok(pr)
    }

    fn update_pr(&mut self, repo: &str, number: u64, request: &PrRequest) -> Result<PullRequest> {
        let path = self.repo_path(repo, &format!("pulls/{}", number))?;
        let body = json!({ "title": request.title, "body": request.body });
        let response = self
            .authed(self.http.patch(self.url(&path)))
            .json(&body)
            .send()?;
        let mut pr: PullRequest = parse(response, &path)?;
        pr.repo = repo.to_string();
        Ok(pr)
    }

    fn add_labels(&mut self, repo: &str, number: u64, labels: &[&str]) -> Result<()> {
        let path = self.repo_path(repo, &format!("issues/{}/labels", number))?;
        let body = json!({ "labels": labels });
        let response = self
            .authed(self.http.post(self.url(&path)))
            .json(&body)
            .send()?;
        parse::<serde_json::Value>(response, &path)?;
        Ok(())
    }

    fn get_reviews(&self, repo: &str, number: u64) -> Result<Vec<Review>> {
        let path = self.repo_path(repo, &format!("pulls/{}/reviews", number))?;
        self.get_json(&path)
    }

    fn get_check_runs(&self, repo: &str, sha: &str) -> Result<CheckRuns> {
        let path = self.repo_path(repo, &format!("commits/{}/check-runs", sha))?;
        self.get_json(&path)
    }

    fn get_status_check(
        &self,
        repo: &str,
        sha: &str,
        context: &str,
    ) -> Result<Option<StatusCheck>> {
        let path = self.repo_path(repo, &format!("commits/{}/status", sha))?;
        let combined: CombinedStatus = self.get_json(&path)?;
        Ok(combined.statuses.into_iter().find(|s| s.context == context))
    }

    fn get_release(&self, repo: &str, tag: &str) -> Result<Option<Release>> {
        let path = self.repo_path(repo, &format!("releases/tags/{}", tag))?;
        self.get_json_opt(&path)
    }

    fn create_release(&mut self, repo: &str, release: &Release) -> Result<Release> {
        let path = self.repo_path(repo, "releases")?;
        let response = self
            .authed(self.http.post(self.url(&path)))
            .json(release)
            .send()?;
        parse(response, &path)
    }

    fn get_tag(&self, repo: &str, tag: &str) -> Result<Option<TagInfo>> {
        let path = self.repo_path(repo, &format!("git/ref/tags/{}", tag))?;
        let found: Option<RefLookup> = self.get_json_opt(&path)?;
        let Some(found) = found else {
            return Ok(None);
        };

        // annotated tags need one more hop to reach the commit
        if found.object.kind == "tag" {
            let tag_path = self.repo_path(repo, &format!("git/tags/{}", found.object.sha))?;
            let tag_obj: TagObject = self.get_json(&tag_path)?;
            return Ok(Some(TagInfo {
                sha: tag_obj.object.sha,
                date: tag_obj.tagger.date,
            }));
        }

        let commit_path = self.repo_path(repo, &format!("commits/{}", found.object.sha))?;
        let commit: CommitLookup = self.get_json(&commit_path)?;
        Ok(Some(TagInfo {
            sha: commit.sha,
            date: commit.commit.committer.date,
        }))
    }
}

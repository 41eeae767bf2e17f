use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, LINK};
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use triggerbox_core::platform::{COMMENTS_PER_PAGE, RUNS_PER_PAGE};
use triggerbox_core::types::{EnvironmentId, RunId};

use crate::error::GithubError;
use crate::link::has_next_page;
use crate::types::{
    CommentBody, DispatchRequest, EnvironmentList, IssueCommentWire, PendingDeploymentWire,
    PullRequest, ReviewRequest, ReviewState, Workflow, WorkflowRun, WorkflowRunList,
};

pub type Result<T> = std::result::Result<T, GithubError>;

pub const DEFAULT_API_URL: &str = "https://api.github.com";
const API_VERSION: &str = "2022-11-28";
const ENVIRONMENTS_PER_PAGE: u32 = 100;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub token: String,
    /// `owner/repo`
    pub repository: String,
    pub api_url: String,
}

impl ClientConfig {
    pub fn new(token: impl Into<String>, repository: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            repository: repository.into(),
            api_url: DEFAULT_API_URL.to_string(),
        }
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }
}

/// Split `owner/repo` into its two non-empty halves.
pub fn parse_repository(repository: &str) -> Result<(String, String)> {
    match repository.trim().split_once('/') {
        Some((owner, repo))
            if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') =>
        {
            Ok((owner.to_string(), repo.to_string()))
        }
        _ => Err(GithubError::InvalidRepository(repository.to_string())),
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Thin typed wrapper over the GitHub REST endpoints triggerbox touches.
/// Every call is scoped to one repository.
#[derive(Debug, Clone)]
pub struct GithubClient {
    http: reqwest::Client,
    api_base: String,
    owner: String,
    repo: String,
    token: String,
}

impl GithubClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        if config.token.trim().is_empty() {
            return Err(GithubError::Config("token is empty".into()));
        }
        let (owner, repo) = parse_repository(&config.repository)?;

        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "x-github-api-version",
            HeaderValue::from_static(API_VERSION),
        );

        let http = reqwest::Client::builder()
            .user_agent(concat!("triggerbox/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            api_base: config.api_url.trim_end_matches('/').to_string(),
            owner,
            repo,
            token: config.token,
        })
    }

    fn repo_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/{}",
            self.api_base, self.owner, self.repo, path
        )
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.http
            .request(method, url)
            .bearer_auth(&self.token)
    }

    /// Send `req` and turn any non-2xx answer into [`GithubError::Status`].
    async fn send(&self, method: &Method, url: &str, req: RequestBuilder) -> Result<Response> {
        tracing::debug!(%method, url, "github request");
        let resp = req.send().await?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(GithubError::Status {
            method: method.to_string(),
            url: url.to_string(),
            status: status.as_u16(),
            body,
        })
    }

    async fn decode<T: DeserializeOwned>(url: &str, resp: Response) -> Result<T> {
        let text = resp.text().await?;
        serde_json::from_str(&text).map_err(|source| GithubError::Decode {
            url: url.to_string(),
            source,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let resp = self.send(&Method::GET, url, self.request(Method::GET, url)).await?;
        Self::decode(url, resp).await
    }

    /// GET one page of a listing; the flag reports whether a next page exists.
    async fn get_page<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<(T, bool)> {
        let req = self.request(Method::GET, url).query(query);
        let resp = self.send(&Method::GET, url, req).await?;
        let has_next = has_next_page(resp.headers().get(LINK).and_then(|v| v.to_str().ok()));
        Ok((Self::decode(url, resp).await?, has_next))
    }

    // ---------------------------------------------------------------------
    // Workflows & runs
    // ---------------------------------------------------------------------

    pub async fn get_workflow(&self, workflow_file: &str) -> Result<Workflow> {
        self.get_json(&self.repo_url(&format!("actions/workflows/{workflow_file}")))
            .await
    }

    pub async fn list_runs_for_commit(
        &self,
        head_sha: &str,
        page: u32,
    ) -> Result<(Vec<WorkflowRun>, bool)> {
        let url = self.repo_url("actions/runs");
        let (list, has_next): (WorkflowRunList, bool) = self
            .get_page(
                &url,
                &[
                    ("head_sha", head_sha.to_string()),
                    ("per_page", RUNS_PER_PAGE.to_string()),
                    ("page", page.to_string()),
                ],
            )
            .await?;
        Ok((list.workflow_runs, has_next))
    }

    pub async fn get_run(&self, run_id: RunId) -> Result<WorkflowRun> {
        self.get_json(&self.repo_url(&format!("actions/runs/{run_id}")))
            .await
    }

    pub async fn create_dispatch(&self, workflow_file: &str, git_ref: &str) -> Result<()> {
        let url = self.repo_url(&format!("actions/workflows/{workflow_file}/dispatches"));
        let req = self
            .request(Method::POST, &url)
            .json(&DispatchRequest { git_ref });
        self.send(&Method::POST, &url, req).await?;
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Deployments & environments
    // ---------------------------------------------------------------------

    pub async fn list_pending_deployments(
        &self,
        run_id: RunId,
    ) -> Result<Vec<PendingDeploymentWire>> {
        self.get_json(&self.repo_url(&format!(
            "actions/runs/{run_id}/pending_deployments"
        )))
        .await
    }

    pub async fn review_pending_deployments(
        &self,
        run_id: RunId,
        environment_ids: &[EnvironmentId],
        state: ReviewState,
        comment: &str,
    ) -> Result<()> {
        let url = self.repo_url(&format!("actions/runs/{run_id}/pending_deployments"));
        let req = self.request(Method::POST, &url).json(&ReviewRequest {
            environment_ids,
            state,
            comment,
        });
        self.send(&Method::POST, &url, req).await?;
        Ok(())
    }

    pub async fn list_environments(&self, page: u32) -> Result<(EnvironmentList, bool)> {
        self.get_page(
            &self.repo_url("environments"),
            &[
                ("per_page", ENVIRONMENTS_PER_PAGE.to_string()),
                ("page", page.to_string()),
            ],
        )
        .await
    }

    // ---------------------------------------------------------------------
    // Pull requests & comments
    // ---------------------------------------------------------------------

    pub async fn get_pull_request(&self, number: u64) -> Result<PullRequest> {
        self.get_json(&self.repo_url(&format!("pulls/{number}")))
            .await
    }

    pub async fn list_issue_comments(
        &self,
        issue_number: u64,
        page: u32,
    ) -> Result<(Vec<IssueCommentWire>, bool)> {
        self.get_page(
            &self.repo_url(&format!("issues/{issue_number}/comments")),
            &[
                ("per_page", COMMENTS_PER_PAGE.to_string()),
                ("page", page.to_string()),
            ],
        )
        .await
    }

    pub async fn create_issue_comment(
        &self,
        issue_number: u64,
        body: &str,
    ) -> Result<IssueCommentWire> {
        let url = self.repo_url(&format!("issues/{issue_number}/comments"));
        let req = self
            .request(Method::POST, &url)
            .json(&CommentBody { body });
        let resp = self.send(&Method::POST, &url, req).await?;
        Self::decode(&url, resp).await
    }

    pub async fn update_issue_comment(&self, comment_id: u64, body: &str) -> Result<()> {
        let url = self.repo_url(&format!("issues/comments/{comment_id}"));
        let req = self
            .request(Method::PATCH, &url)
            .json(&CommentBody { body });
        self.send(&Method::PATCH, &url, req).await?;
        Ok(())
    }
}

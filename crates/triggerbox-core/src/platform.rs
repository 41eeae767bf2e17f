//! The source-control hosting platform, seen as a set of request/response
//! calls. `triggerbox-github` implements it over the GitHub REST API; tests
//! use a scripted in-memory fake.

use std::future::Future;

use async_trait::async_trait;
use futures::stream::{self, Stream};

use crate::types::{
    CandidateRun, CommentId, Environment, EnvironmentId, IssueComment, Page, PendingDeployment,
    RunId, WorkflowDefinition,
};
use crate::Result;

/// Page size used when listing runs for a commit.
pub const RUNS_PER_PAGE: u32 = 50;
/// Page size used when listing issue comments.
pub const COMMENTS_PER_PAGE: u32 = 100;

#[async_trait]
pub trait Platform: Send + Sync {
    /// Fetch the definition of `workflow_file` (e.g. `build-preview.yml`).
    async fn get_workflow(&self, workflow_file: &str) -> Result<WorkflowDefinition>;

    async fn list_environments(&self) -> Result<Vec<Environment>>;

    /// One page (1-based) of runs whose head commit is `sha`.
    async fn list_runs_for_commit(&self, sha: &str, page: u32) -> Result<Page<CandidateRun>>;

    async fn get_pending_deployments(&self, run_id: RunId) -> Result<Vec<PendingDeployment>>;

    async fn get_run(&self, run_id: RunId) -> Result<CandidateRun>;

    async fn create_dispatch(&self, workflow_file: &str, git_ref: &str) -> Result<()>;

    async fn approve_deployment(
        &self,
        run_id: RunId,
        environment_ids: &[EnvironmentId],
        comment: &str,
    ) -> Result<()>;

    async fn get_pull_request_head_ref(&self, pr_number: u64) -> Result<String>;

    /// One page (1-based) of comments on `issue_number`.
    async fn list_comments(&self, issue_number: u64, page: u32) -> Result<Page<IssueComment>>;

    async fn create_comment(&self, issue_number: u64, body: &str) -> Result<CommentId>;

    async fn update_comment(&self, comment_id: CommentId, body: &str) -> Result<()>;
}

/// Lazily walk a paginated listing, one page per poll.
///
/// `fetch` is called with page numbers starting at 1 and only when the
/// consumer asks for the next item; dropping the stream stops the walk.
pub fn paginate<T, F, Fut>(fetch: F) -> impl Stream<Item = Result<Vec<T>>>
where
    F: Fn(u32) -> Fut,
    Fut: Future<Output = Result<Page<T>>>,
{
    stream::try_unfold((fetch, Some(1u32)), |(fetch, next)| async move {
        let Some(page) = next else {
            return Ok(None);
        };
        let Page { items, has_next } = fetch(page).await?;
        let next = has_next.then(|| page + 1);
        Ok(Some((items, (fetch, next))))
    })
}

/// Stream the runs for `sha`, one page at a time.
pub fn run_pages<'a, P>(
    platform: &'a P,
    sha: &'a str,
) -> impl Stream<Item = Result<Vec<CandidateRun>>> + 'a
where
    P: Platform + ?Sized,
{
    paginate(move |page| platform.list_runs_for_commit(sha, page))
}

/// Stream the comments on `issue_number`, one page at a time.
pub fn comment_pages<P>(
    platform: &P,
    issue_number: u64,
) -> impl Stream<Item = Result<Vec<IssueComment>>> + '_
where
    P: Platform + ?Sized,
{
    paginate(move |page| platform.list_comments(issue_number, page))
}

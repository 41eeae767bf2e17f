use async_trait::async_trait;
use futures::TryStreamExt;
use triggerbox_core::platform::{paginate, Platform};
use triggerbox_core::types::{
    CandidateRun, CommentId, Environment, EnvironmentId, IssueComment, Page, PendingDeployment,
    RunId, WorkflowDefinition,
};
use triggerbox_core::{Result, TriggerboxError};

use crate::client::GithubClient;
use crate::types::ReviewState;

fn page_of<W, T: From<W>>((items, has_next): (Vec<W>, bool)) -> Page<T> {
    Page {
        items: items.into_iter().map(T::from).collect(),
        has_next,
    }
}

#[async_trait]
impl Platform for GithubClient {
    async fn get_workflow(&self, workflow_file: &str) -> Result<WorkflowDefinition> {
        GithubClient::get_workflow(self, workflow_file)
            .await
            .map(WorkflowDefinition::from)
            .map_err(|e| TriggerboxError::platform(format!("get workflow {workflow_file}"), e))
    }

    async fn list_environments(&self) -> Result<Vec<Environment>> {
        paginate(|page| async move {
            let (list, has_next) = GithubClient::list_environments(self, page)
                .await
                .map_err(|e| TriggerboxError::platform("list environments", e))?;
            Ok::<_, TriggerboxError>(page_of::<_, Environment>((list.environments, has_next)))
        })
        .try_concat()
        .await
    }

    async fn list_runs_for_commit(&self, sha: &str, page: u32) -> Result<Page<CandidateRun>> {
        GithubClient::list_runs_for_commit(self, sha, page)
            .await
            .map(page_of)
            .map_err(|e| TriggerboxError::platform(format!("list runs for commit {sha}"), e))
    }

    async fn get_pending_deployments(&self, run_id: RunId) -> Result<Vec<PendingDeployment>> {
        GithubClient::list_pending_deployments(self, run_id)
            .await
            .map(|items| items.into_iter().map(PendingDeployment::from).collect())
            .map_err(|e| {
                TriggerboxError::platform(format!("get pending deployments for run {run_id}"), e)
            })
    }

    async fn get_run(&self, run_id: RunId) -> Result<CandidateRun> {
        GithubClient::get_run(self, run_id)
            .await
            .map(CandidateRun::from)
            .map_err(|e| TriggerboxError::platform(format!("get run {run_id}"), e))
    }

    async fn create_dispatch(&self, workflow_file: &str, git_ref: &str) -> Result<()> {
        GithubClient::create_dispatch(self, workflow_file, git_ref)
            .await
            .map_err(|e| TriggerboxError::platform(format!("dispatch {workflow_file}"), e))
    }

    async fn approve_deployment(
        &self,
        run_id: RunId,
        environment_ids: &[EnvironmentId],
        comment: &str,
    ) -> Result<()> {
        self.review_pending_deployments(run_id, environment_ids, ReviewState::Approved, comment)
            .await
            .map_err(|e| TriggerboxError::platform(format!("approve run {run_id}"), e))
    }

    async fn get_pull_request_head_ref(&self, pr_number: u64) -> Result<String> {
        self.get_pull_request(pr_number)
            .await
            .map(|pr| pr.head.git_ref)
            .map_err(|e| TriggerboxError::platform(format!("get pull request #{pr_number}"), e))
    }

    async fn list_comments(&self, issue_number: u64, page: u32) -> Result<Page<IssueComment>> {
        self.list_issue_comments(issue_number, page)
            .await
            .map(page_of)
            .map_err(|e| TriggerboxError::platform(format!("list comments on #{issue_number}"), e))
    }

    async fn create_comment(&self, issue_number: u64, body: &str) -> Result<CommentId> {
        self.create_issue_comment(issue_number, body)
            .await
            .map(|c| CommentId(c.id))
            .map_err(|e| TriggerboxError::platform(format!("create comment on #{issue_number}"), e))
    }

    async fn update_comment(&self, comment_id: CommentId, body: &str) -> Result<()> {
        self.update_issue_comment(comment_id.0, body)
            .await
            .map_err(|e| TriggerboxError::platform(format!("update comment {comment_id}"), e))
    }
}

//! Scripted in-memory [`Platform`] used by the unit and end-to-end tests.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::platform::Platform;
use crate::types::{
    CandidateRun, CommentId, Environment, EnvironmentId, IssueComment, Page, PendingDeployment,
    RunId, RunStatus, WorkflowDefinition,
};
use crate::{Result, TriggerboxError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Approval {
    pub run_id: RunId,
    pub environment_ids: Vec<EnvironmentId>,
    pub comment: String,
}

#[derive(Default)]
pub struct FakePlatform {
    environments: Vec<Environment>,
    workflows: HashSet<String>,
    run_pages: Vec<Vec<CandidateRun>>,
    head_ref: String,
    comment_pages: Vec<Vec<IssueComment>>,
    failing: HashSet<String>,
    /// Successive snapshots; the last one repeats once the queue is drained.
    deployments: Mutex<HashMap<RunId, VecDeque<Vec<PendingDeployment>>>>,
    statuses: Mutex<HashMap<RunId, VecDeque<RunStatus>>>,
    calls: Mutex<Vec<String>>,
    approvals: Mutex<Vec<Approval>>,
    dispatches: Mutex<Vec<(String, String)>>,
    created_comments: Mutex<Vec<(u64, String)>>,
    updated_comments: Mutex<Vec<(CommentId, String)>>,
}

pub fn run(id: u64, workflow: &str, status: RunStatus) -> CandidateRun {
    CandidateRun {
        id: RunId(id),
        name: workflow.to_string(),
        path: crate::types::workflow_path(workflow),
        status,
    }
}

pub fn deployment(environment_id: u64) -> PendingDeployment {
    PendingDeployment {
        environment_id: EnvironmentId(environment_id),
        environment_name: None,
        waiting_for_reviewers: true,
    }
}

impl FakePlatform {
    pub fn new() -> Self {
        Self {
            head_ref: "feature/branch".to_string(),
            ..Self::default()
        }
    }

    pub fn with_environment(mut self, name: &str, id: u64) -> Self {
        self.environments.push(Environment {
            id: EnvironmentId(id),
            name: name.to_string(),
        });
        self
    }

    pub fn with_workflow(mut self, workflow: &str) -> Self {
        self.workflows.insert(crate::types::workflow_file(workflow));
        self
    }

    pub fn with_run_page(mut self, runs: Vec<CandidateRun>) -> Self {
        self.run_pages.push(runs);
        self
    }

    pub fn with_deployments(self, run_id: u64, snapshots: Vec<Vec<PendingDeployment>>) -> Self {
        self.deployments
            .lock()
            .unwrap()
            .insert(RunId(run_id), snapshots.into());
        self
    }

    pub fn with_statuses(self, run_id: u64, statuses: Vec<RunStatus>) -> Self {
        self.statuses
            .lock()
            .unwrap()
            .insert(RunId(run_id), statuses.into());
        self
    }

    pub fn with_head_ref(mut self, head_ref: &str) -> Self {
        self.head_ref = head_ref.to_string();
        self
    }

    pub fn with_comment_page(mut self, comments: Vec<IssueComment>) -> Self {
        self.comment_pages.push(comments);
        self
    }

    /// Make every call to `op` fail. `op` is either a bare operation name or
    /// `name:key` (e.g. `approve_deployment:12`).
    pub fn failing(mut self, op: &str) -> Self {
        self.failing.insert(op.to_string());
        self
    }

    pub fn count(&self, op: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.split(':').next() == Some(op))
            .count()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn approvals(&self) -> Vec<Approval> {
        self.approvals.lock().unwrap().clone()
    }

    pub fn dispatches(&self) -> Vec<(String, String)> {
        self.dispatches.lock().unwrap().clone()
    }

    pub fn created_comments(&self) -> Vec<(u64, String)> {
        self.created_comments.lock().unwrap().clone()
    }

    pub fn updated_comments(&self) -> Vec<(CommentId, String)> {
        self.updated_comments.lock().unwrap().clone()
    }

    fn record(&self, op: &str, key: impl std::fmt::Display) -> Result<()> {
        let entry = format!("{op}:{key}");
        self.calls.lock().unwrap().push(entry.clone());
        if self.failing.contains(op) || self.failing.contains(&entry) {
            return Err(TriggerboxError::platform(entry, "scripted failure"));
        }
        Ok(())
    }

    fn next_from<T: Clone>(
        map: &Mutex<HashMap<RunId, VecDeque<T>>>,
        run_id: RunId,
    ) -> Option<T> {
        let mut map = map.lock().unwrap();
        let queue = map.get_mut(&run_id)?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

#[async_trait]
impl Platform for FakePlatform {
    async fn get_workflow(&self, workflow_file: &str) -> Result<WorkflowDefinition> {
        self.record("get_workflow", workflow_file)?;
        if !self.workflows.contains(workflow_file) {
            return Err(TriggerboxError::platform(
                format!("get workflow {workflow_file}"),
                "404 Not Found",
            ));
        }
        Ok(WorkflowDefinition {
            id: 1,
            name: workflow_file.trim_end_matches(".yml").to_string(),
            path: format!(".github/workflows/{workflow_file}"),
            html_url: None,
        })
    }

    async fn list_environments(&self) -> Result<Vec<Environment>> {
        self.record("list_environments", "")?;
        Ok(self.environments.clone())
    }

    async fn list_runs_for_commit(&self, sha: &str, page: u32) -> Result<Page<CandidateRun>> {
        self.record("list_runs_for_commit", format!("{sha}:{page}"))?;
        let index = page as usize - 1;
        Ok(Page {
            items: self.run_pages.get(index).cloned().unwrap_or_default(),
            has_next: index + 1 < self.run_pages.len(),
        })
    }

    async fn get_pending_deployments(&self, run_id: RunId) -> Result<Vec<PendingDeployment>> {
        self.record("get_pending_deployments", run_id)?;
        Ok(Self::next_from(&self.deployments, run_id).unwrap_or_default())
    }

    async fn get_run(&self, run_id: RunId) -> Result<CandidateRun> {
        self.record("get_run", run_id)?;
        let status = Self::next_from(&self.statuses, run_id).unwrap_or(RunStatus::Unknown);
        let existing = self
            .run_pages
            .iter()
            .flatten()
            .find(|r| r.id == run_id)
            .cloned();
        Ok(match existing {
            Some(found) => CandidateRun { status, ..found },
            None => CandidateRun {
                id: run_id,
                name: String::new(),
                path: String::new(),
                status,
            },
        })
    }

    async fn create_dispatch(&self, workflow_file: &str, git_ref: &str) -> Result<()> {
        self.record("create_dispatch", workflow_file)?;
        self.dispatches
            .lock()
            .unwrap()
            .push((workflow_file.to_string(), git_ref.to_string()));
        Ok(())
    }

    async fn approve_deployment(
        &self,
        run_id: RunId,
        environment_ids: &[EnvironmentId],
        comment: &str,
    ) -> Result<()> {
        self.record("approve_deployment", run_id)?;
        self.approvals.lock().unwrap().push(Approval {
            run_id,
            environment_ids: environment_ids.to_vec(),
            comment: comment.to_string(),
        });
        Ok(())
    }

    async fn get_pull_request_head_ref(&self, pr_number: u64) -> Result<String> {
        self.record("get_pull_request_head_ref", pr_number)?;
        Ok(self.head_ref.clone())
    }

    async fn list_comments(&self, issue_number: u64, page: u32) -> Result<Page<IssueComment>> {
        self.record("list_comments", format!("{issue_number}:{page}"))?;
        let index = page as usize - 1;
        Ok(Page {
            items: self.comment_pages.get(index).cloned().unwrap_or_default(),
            has_next: index + 1 < self.comment_pages.len(),
        })
    }

    async fn create_comment(&self, issue_number: u64, body: &str) -> Result<CommentId> {
        self.record("create_comment", issue_number)?;
        self.created_comments
            .lock()
            .unwrap()
            .push((issue_number, body.to_string()));
        Ok(CommentId(9000))
    }

    async fn update_comment(&self, comment_id: CommentId, body: &str) -> Result<()> {
        self.record("update_comment", comment_id)?;
        self.updated_comments
            .lock()
            .unwrap()
            .push((comment_id, body.to_string()));
        Ok(())
    }
}

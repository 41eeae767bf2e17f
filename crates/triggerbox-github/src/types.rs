//! Wire shapes of the GitHub REST responses used by the client, trimmed to
//! the fields triggerbox reads. Unknown fields are ignored.

use serde::{Deserialize, Serialize};
use triggerbox_core::types::{
    CandidateRun, CommentId, Environment, EnvironmentId, IssueComment, PendingDeployment, RunId,
    RunStatus, WorkflowDefinition,
};

// ─── Workflows ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct Workflow {
    pub id: u64,
    pub name: String,
    pub path: String,
    #[serde(default)]
    pub html_url: Option<String>,
}

impl From<Workflow> for WorkflowDefinition {
    fn from(w: Workflow) -> Self {
        WorkflowDefinition {
            id: w.id,
            name: w.name,
            path: w.path,
            html_url: w.html_url,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DispatchRequest<'a> {
    #[serde(rename = "ref")]
    pub git_ref: &'a str,
}

// ─── Runs ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowRunList {
    #[serde(default)]
    pub workflow_runs: Vec<WorkflowRun>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowRun {
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub path: String,
    /// GitHub returns `null` for some runs that have not been scheduled yet.
    #[serde(default)]
    pub status: Option<RunStatus>,
}

impl From<WorkflowRun> for CandidateRun {
    fn from(run: WorkflowRun) -> Self {
        CandidateRun {
            id: RunId(run.id),
            name: run.name.unwrap_or_default(),
            path: run.path,
            status: run.status.unwrap_or(RunStatus::Unknown),
        }
    }
}

// ─── Deployments & environments ───────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct EnvironmentRef {
    pub id: EnvironmentId,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PendingDeploymentWire {
    pub environment: EnvironmentRef,
    #[serde(default)]
    pub reviewers: Vec<serde_json::Value>,
}

impl From<PendingDeploymentWire> for PendingDeployment {
    fn from(d: PendingDeploymentWire) -> Self {
        PendingDeployment {
            environment_id: d.environment.id,
            environment_name: d.environment.name,
            waiting_for_reviewers: !d.reviewers.is_empty(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReviewRequest<'a> {
    pub environment_ids: &'a [EnvironmentId],
    pub state: ReviewState,
    pub comment: &'a str,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewState {
    Approved,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EnvironmentList {
    #[serde(default)]
    pub environments: Vec<EnvironmentWire>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EnvironmentWire {
    pub id: EnvironmentId,
    pub name: String,
}

impl From<EnvironmentWire> for Environment {
    fn from(e: EnvironmentWire) -> Self {
        Environment {
            id: e.id,
            name: e.name,
        }
    }
}

// ─── Pull requests & comments ─────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct PullRequest {
    pub head: PullRequestHead,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestHead {
    #[serde(rename = "ref")]
    pub git_ref: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub login: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IssueCommentWire {
    pub id: u64,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub user: Option<User>,
}

impl From<IssueCommentWire> for IssueComment {
    fn from(c: IssueCommentWire) -> Self {
        IssueComment {
            id: CommentId(c.id),
            author: c.user.map(|u| u.login).unwrap_or_default(),
            body: c.body.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentBody<'a> {
    pub body: &'a str,
}

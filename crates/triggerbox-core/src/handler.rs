//! Processing one comment-edit event end to end.

use serde::Serialize;

use crate::approval::{approve_run, ApprovalOutcome};
use crate::config::Settings;
use crate::environment::{resolve, EnvironmentCache};
use crate::error::{Result, TriggerboxError};
use crate::event::{ChangeEvent, CommentEventPayload, EventDisposition, SkipReason};
use crate::locator::locate;
use crate::platform::Platform;
use crate::toggle::was_toggled_on;
use crate::types::{workflow_file, EnvironmentId, RunId, RunStatus};

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// What happened to one toggled workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WorkflowOutcome {
    Dispatched {
        git_ref: String,
    },
    Approved {
        run_id: RunId,
        environment_id: EnvironmentId,
    },
    AlreadyResolved {
        run_id: RunId,
    },
    Aborted {
        run_id: RunId,
        status: RunStatus,
    },
    /// No run for the commit is waiting on the environment.
    NoWaitingRun {
        environment_id: EnvironmentId,
    },
    /// Approval needed but the comment carries no commit SHA.
    MissingCommit,
}

impl From<ApprovalOutcome> for WorkflowOutcome {
    fn from(outcome: ApprovalOutcome) -> Self {
        match outcome {
            ApprovalOutcome::Approved {
                run_id,
                environment_id,
            } => WorkflowOutcome::Approved {
                run_id,
                environment_id,
            },
            ApprovalOutcome::AlreadyResolved { run_id } => {
                WorkflowOutcome::AlreadyResolved { run_id }
            }
            ApprovalOutcome::Aborted { run_id, status } => {
                WorkflowOutcome::Aborted { run_id, status }
            }
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkflowReport {
    pub workflow: String,
    #[serde(flatten)]
    pub result: WorkflowResult,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WorkflowResult {
    Ok { outcome: WorkflowOutcome },
    Failed { error: String },
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "disposition", rename_all = "snake_case")]
pub enum EventReport {
    Skipped { reason: SkipReason },
    Handled { pr_number: u64, workflows: Vec<WorkflowReport> },
}

impl EventReport {
    pub fn failures(&self) -> Vec<String> {
        match self {
            EventReport::Skipped { .. } => Vec::new(),
            EventReport::Handled { workflows, .. } => workflows
                .iter()
                .filter_map(|w| match &w.result {
                    WorkflowResult::Failed { error } => Some(format!("{}: {error}", w.workflow)),
                    WorkflowResult::Ok { .. } => None,
                })
                .collect(),
        }
    }

    /// Turn partial failures into one aggregate error; successes are still
    /// logged by the caller from the report itself.
    pub fn into_result(self) -> Result<Self> {
        let failures = self.failures();
        if failures.is_empty() {
            return Ok(self);
        }
        let total = match &self {
            EventReport::Handled { workflows, .. } => workflows.len(),
            EventReport::Skipped { .. } => 0,
        };
        Err(TriggerboxError::WorkflowsFailed { failures, total })
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Check that every configured workflow definition exists and is accessible.
/// All failures are collected into one error.
pub async fn validate_workflows<P>(platform: &P, settings: &Settings) -> Result<()>
where
    P: Platform + ?Sized,
{
    tracing::info!(count = settings.workflows.len(), "validating configured workflows");
    let mut errors = Vec::new();
    for workflow in settings.workflows.workflows() {
        let file = workflow_file(workflow);
        match platform.get_workflow(&file).await {
            Ok(definition) => {
                tracing::info!(workflow = %file, path = %definition.path, "workflow exists and is accessible")
            }
            Err(e) => {
                tracing::error!(workflow = %file, error = %e, "workflow validation failed");
                errors.push(format!("{file}: {e}"));
            }
        }
    }

    if errors.is_empty() {
        tracing::info!(count = settings.workflows.len(), "all configured workflows are valid");
        Ok(())
    } else {
        Err(TriggerboxError::WorkflowValidation(errors))
    }
}

// ---------------------------------------------------------------------------
// EventHandler
// ---------------------------------------------------------------------------

/// Handles one [`ChangeEvent`]. Holds the per-invocation lookups (environment
/// table, PR head ref) so each is fetched at most once.
pub struct EventHandler<'a, P: Platform + ?Sized> {
    platform: &'a P,
    settings: &'a Settings,
    environments: EnvironmentCache,
    head_ref: Option<String>,
}

impl<'a, P: Platform + ?Sized> EventHandler<'a, P> {
    pub fn new(platform: &'a P, settings: &'a Settings) -> Self {
        Self {
            platform,
            settings,
            environments: EnvironmentCache::new(),
            head_ref: None,
        }
    }

    /// Workflows whose checkbox went from unchecked to checked.
    pub fn toggled_workflows(&self, event: &ChangeEvent) -> Vec<String> {
        self.settings
            .workflows
            .workflows()
            .filter(|w| was_toggled_on(w, &event.previous_body, &event.current_body))
            .map(str::to_string)
            .collect()
    }

    /// Process every toggled workflow in order. A failing workflow is
    /// recorded in the report and does not stop the others.
    pub async fn handle(&mut self, event: &ChangeEvent) -> EventReport {
        tracing::info!(
            pr_number = event.pr_number,
            actor = %event.actor_login,
            "handling comment edit"
        );
        match &event.commit_sha {
            Some(sha) => tracing::info!(commit_sha = %sha, "commit hash extracted"),
            None => tracing::warn!(
                "could not extract commit hash from comment body, approvals will be skipped"
            ),
        }

        let toggled = self.toggled_workflows(event);
        if toggled.is_empty() {
            tracing::info!("no checkbox was toggled on");
        }

        let mut workflows = Vec::with_capacity(toggled.len());
        for workflow in toggled {
            let result = match self.process_workflow(&workflow, event).await {
                Ok(outcome) => {
                    tracing::info!(workflow = %workflow, outcome = ?outcome, "workflow processed");
                    WorkflowResult::Ok { outcome }
                }
                Err(e) => {
                    tracing::error!(workflow = %workflow, error = %e, "failed to process workflow");
                    WorkflowResult::Failed {
                        error: e.to_string(),
                    }
                }
            };
            workflows.push(WorkflowReport { workflow, result });
        }

        EventReport::Handled {
            pr_number: event.pr_number,
            workflows,
        }
    }

    async fn process_workflow(&mut self, workflow: &str, event: &ChangeEvent) -> Result<WorkflowOutcome> {
        let target_env = if self.settings.workflows.environment_for(workflow).is_some() {
            let table = self.environments.get(self.platform).await?;
            resolve(workflow, &self.settings.workflows, table)?
        } else {
            None
        };

        let Some(target_env) = target_env else {
            return self.dispatch(workflow, event.pr_number).await;
        };

        let Some(sha) = event.commit_sha.as_deref() else {
            tracing::warn!(workflow, "skipping approval, no commit hash in comment");
            return Ok(WorkflowOutcome::MissingCommit);
        };

        let located = locate(
            self.platform,
            workflow,
            sha,
            target_env,
            self.settings.require_reviewers,
        )
        .await?;

        match located {
            Some(run) => approve_run(
                self.platform,
                &run,
                target_env,
                event.pr_number,
                self.settings.poll,
            )
            .await
            .map(WorkflowOutcome::from),
            None => Ok(WorkflowOutcome::NoWaitingRun {
                environment_id: target_env,
            }),
        }
    }

    async fn dispatch(&mut self, workflow: &str, pr_number: u64) -> Result<WorkflowOutcome> {
        let git_ref = match &self.head_ref {
            Some(r) => r.clone(),
            None => {
                tracing::info!(pr_number, "fetching PR head branch");
                let r = self.platform.get_pull_request_head_ref(pr_number).await?;
                tracing::info!(branch = %r, "branch name");
                self.head_ref = Some(r.clone());
                r
            }
        };

        let file = workflow_file(workflow);
        tracing::info!(workflow = %file, git_ref = %git_ref, "dispatching unprotected workflow");
        self.platform.create_dispatch(&file, &git_ref).await?;
        Ok(WorkflowOutcome::Dispatched { git_ref })
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Handle an inbound comment event: skip it if it does not apply, validate the
/// configured workflows, then process every toggled checkbox.
///
/// Validation failures abort before any side effect. Per-workflow failures
/// are returned inside the report; use [`EventReport::into_result`] to turn
/// them into one error.
pub async fn process_payload<P>(
    platform: &P,
    settings: &Settings,
    payload: CommentEventPayload,
) -> Result<EventReport>
where
    P: Platform + ?Sized,
{
    let event = match ChangeEvent::from_payload(payload, &settings.bot_login)? {
        EventDisposition::Skip(reason) => {
            tracing::info!(%reason, "skipping event");
            return Ok(EventReport::Skipped { reason });
        }
        EventDisposition::Handle(event) => event,
    };

    validate_workflows(platform, settings).await?;

    let report = EventHandler::new(platform, settings).handle(&event).await;
    tracing::info!("checkbox analysis complete");
    Ok(report)
}

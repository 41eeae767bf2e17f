//! Approving a located run's pending deployment.
//!
//! ```text
//! unknown ──poll──▶ pending ──sleep──▶ (poll again)
//!    │                 │
//!    │                 └──▶ waiting ──▶ re-fetch deployments ──▶ approved
//!    ├──▶ any other status ──▶ aborted
//!    └──▶ budget exhausted ──▶ timed out
//! ```

use serde::Serialize;
use std::time::Duration;

use tokio::time::{sleep, Instant};

use crate::config::PollPolicy;
use crate::error::{Result, TriggerboxError};
use crate::platform::Platform;
use crate::types::{CandidateRun, EnvironmentId, RunId, RunStatus};

// ---------------------------------------------------------------------------
// Poll state machine
// ---------------------------------------------------------------------------

/// What to do after observing a run status while polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollStep {
    /// The run is blocked on approval.
    Ready,
    /// Not there yet; sleep one interval and look again.
    Retry,
    /// The run can no longer reach `waiting` from this status.
    Abort,
}

pub fn next_step(status: RunStatus) -> PollStep {
    match status {
        RunStatus::Waiting => PollStep::Ready,
        RunStatus::Pending => PollStep::Retry,
        _ => PollStep::Abort,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Waiting,
    Aborted(RunStatus),
    /// Still pending when the budget ran out, after this much waiting.
    TimedOut(Duration),
}

/// Poll `run_id` until it reaches `waiting`, aborts, or `policy.timeout`
/// elapses.
///
/// Sleeps never cross the deadline: the last one is shortened and followed
/// by a final poll at the deadline itself.
pub async fn wait_until_waiting<P>(
    platform: &P,
    run_id: RunId,
    policy: PollPolicy,
) -> Result<PollOutcome>
where
    P: Platform + ?Sized,
{
    let started = Instant::now();
    let deadline = started + policy.timeout;
    loop {
        let run = platform.get_run(run_id).await?;
        tracing::info!(run_id = %run_id, status = %run.status, "polled workflow run");

        match next_step(run.status) {
            PollStep::Ready => return Ok(PollOutcome::Waiting),
            PollStep::Abort => {
                tracing::warn!(
                    run_id = %run_id,
                    status = %run.status,
                    "run is neither pending nor waiting, aborting approval"
                );
                return Ok(PollOutcome::Aborted(run.status));
            }
            PollStep::Retry => {
                let remaining = deadline.saturating_duration_since(Instant::now());
                if remaining.is_zero() {
                    return Ok(PollOutcome::TimedOut(started.elapsed()));
                }
                let nap = policy.retry_interval.min(remaining);
                tracing::info!(
                    run_id = %run_id,
                    "run is pending, checking again in {}s",
                    nap.as_secs_f32()
                );
                sleep(nap).await;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Coordinator
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ApprovalOutcome {
    Approved {
        run_id: RunId,
        environment_id: EnvironmentId,
    },
    /// The run reached `waiting` but nothing is pending any more: someone
    /// else approved or cancelled it in the meantime.
    AlreadyResolved { run_id: RunId },
    /// The run moved to a status from which it never waits for approval.
    Aborted { run_id: RunId, status: RunStatus },
}

pub fn approval_comment(pr_number: u64) -> String {
    format!("Approved via checkbox toggle in PR #{pr_number}.")
}

/// Approve `run`'s deployment into `target_env`, polling first when the run
/// has not reached `waiting` yet.
pub async fn approve_run<P>(
    platform: &P,
    run: &CandidateRun,
    target_env: EnvironmentId,
    pr_number: u64,
    policy: PollPolicy,
) -> Result<ApprovalOutcome>
where
    P: Platform + ?Sized,
{
    if run.status != RunStatus::Waiting {
        match wait_until_waiting(platform, run.id, policy).await? {
            PollOutcome::Waiting => {}
            PollOutcome::Aborted(status) => {
                return Ok(ApprovalOutcome::Aborted {
                    run_id: run.id,
                    status,
                })
            }
            PollOutcome::TimedOut(waited) => {
                return Err(TriggerboxError::PollTimeout {
                    run_id: run.id,
                    waited_secs: waited.as_secs(),
                })
            }
        }

        // State may have moved on while we were polling.
        let deployments = platform.get_pending_deployments(run.id).await?;
        if deployments.is_empty() {
            tracing::info!(run_id = %run.id, "no pending deployments left, nothing to approve");
            return Ok(ApprovalOutcome::AlreadyResolved { run_id: run.id });
        }
        if !deployments.iter().any(|d| d.environment_id == target_env) {
            return Err(TriggerboxError::DeploymentMismatch {
                run_id: run.id,
                environment_id: target_env,
                found: deployments.iter().map(|d| d.environment_id).collect(),
            });
        }
    }

    tracing::info!(run_id = %run.id, environment_id = %target_env, "approving deployment");
    platform
        .approve_deployment(run.id, &[target_env], &approval_comment(pr_number))
        .await?;
    tracing::info!(run_id = %run.id, environment_id = %target_env, "deployment approved");

    Ok(ApprovalOutcome::Approved {
        run_id: run.id,
        environment_id: target_env,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

use crate::cmd::{GithubArgs, WorkflowArgs};
use crate::output::{print_json, print_table};
use anyhow::Context;
use clap::Args;
use std::path::PathBuf;
use triggerbox_core::event::CommentEventPayload;
use triggerbox_core::handler::{EventReport, WorkflowOutcome, WorkflowResult};
use triggerbox_core::process_payload;

#[derive(Args)]
pub struct HandleArgs {
    /// Path to the issue_comment event payload
    #[arg(long, env = "GITHUB_EVENT_PATH")]
    event_path: PathBuf,

    #[command(flatten)]
    workflows: WorkflowArgs,
}

pub fn run(github: &GithubArgs, args: HandleArgs, json: bool) -> anyhow::Result<()> {
    let settings = args.workflows.settings()?;

    let raw = std::fs::read_to_string(&args.event_path)
        .with_context(|| format!("failed to read event payload {}", args.event_path.display()))?;
    let payload = CommentEventPayload::from_json(&raw).context("failed to parse event payload")?;

    let client = github.client()?;
    let rt = tokio::runtime::Runtime::new()?;
    let report = rt.block_on(process_payload(&client, &settings, payload))?;

    if json {
        print_json(&report)?;
    } else {
        print_report(&report);
    }

    report.into_result()?;
    Ok(())
}

fn print_report(report: &EventReport) {
    match report {
        EventReport::Skipped { reason } => println!("Skipped: {reason}."),
        EventReport::Handled { workflows, .. } if workflows.is_empty() => {
            println!("No workflow checkbox was ticked.")
        }
        EventReport::Handled { pr_number, workflows } => {
            println!("PR #{pr_number}:");
            let rows = workflows
                .iter()
                .map(|w| {
                    let (status, detail) = match &w.result {
                        WorkflowResult::Ok { outcome } => {
                            let status = status_label(outcome);
                            if status != "ok" {
                                tracing::warn!(workflow = %w.workflow, "{}", describe(outcome));
                            }
                            (status, describe(outcome))
                        }
                        WorkflowResult::Failed { error } => ("failed", error.clone()),
                    };
                    vec![w.workflow.clone(), status.to_string(), detail]
                })
                .collect();
            print_table(&["WORKFLOW", "STATUS", "DETAIL"], rows);
        }
    }
}

/// Aborted runs exit cleanly but were never approved.
fn status_label(outcome: &WorkflowOutcome) -> &'static str {
    match outcome {
        WorkflowOutcome::Aborted { .. } => "not approved",
        _ => "ok",
    }
}

fn describe(outcome: &WorkflowOutcome) -> String {
    match outcome {
        WorkflowOutcome::Dispatched { git_ref } => format!("dispatched on {git_ref}"),
        WorkflowOutcome::Approved {
            run_id,
            environment_id,
        } => format!("approved run {run_id} for environment {environment_id}"),
        WorkflowOutcome::AlreadyResolved { run_id } => {
            format!("run {run_id} no longer has pending deployments")
        }
        WorkflowOutcome::Aborted { run_id, status } => {
            format!("run {run_id} is {status}, not approved")
        }
        WorkflowOutcome::NoWaitingRun { environment_id } => {
            format!("no run waiting on environment {environment_id}")
        }
        WorkflowOutcome::MissingCommit => "no commit hash in comment, approval skipped".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use triggerbox_core::types::{EnvironmentId, RunId, RunStatus};

    #[test]
    fn aborted_run_is_not_labelled_ok() {
        let aborted = WorkflowOutcome::Aborted {
            run_id: RunId(12),
            status: RunStatus::Completed,
        };
        assert_eq!(status_label(&aborted), "not approved");
        assert!(describe(&aborted).contains("not approved"));

        let approved = WorkflowOutcome::Approved {
            run_id: RunId(12),
            environment_id: EnvironmentId(7),
        };
        assert_eq!(status_label(&approved), "ok");
    }
}

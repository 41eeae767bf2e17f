use futures::TryStreamExt;

use crate::platform::{run_pages, Platform};
use crate::types::{CandidateRun, EnvironmentId};
use crate::Result;

/// Find the first run of `workflow` for `commit_sha` that has a pending
/// deployment into `target_env`.
///
/// Pages are pulled in API order and the walk stops at the first match.
/// `Ok(None)` is a normal outcome: the run may not have started, may have
/// finished, or may already have been approved or rejected.
///
/// With `require_reviewers`, only deployments explicitly waiting on reviewers
/// qualify.
pub async fn locate<P>(
    platform: &P,
    workflow: &str,
    commit_sha: &str,
    target_env: EnvironmentId,
    require_reviewers: bool,
) -> Result<Option<CandidateRun>>
where
    P: Platform + ?Sized,
{
    tracing::info!(workflow, commit_sha, "looking for a run waiting on environment {target_env}");

    let pages = run_pages(platform, commit_sha);
    futures::pin_mut!(pages);

    let mut page_number = 0u32;
    while let Some(runs) = pages.try_next().await? {
        page_number += 1;
        for run in runs.into_iter().filter(|r| r.is_for_workflow(workflow)) {
            let deployments = platform.get_pending_deployments(run.id).await?;
            let needs_approval = deployments.iter().any(|d| {
                d.environment_id == target_env && (!require_reviewers || d.waiting_for_reviewers)
            });

            if needs_approval {
                tracing::info!(
                    workflow,
                    run_id = %run.id,
                    status = %run.status,
                    page = page_number,
                    "found run waiting for environment {target_env}"
                );
                return Ok(Some(run));
            }
            tracing::info!(
                workflow,
                run_id = %run.id,
                pending = deployments.len(),
                "run is not waiting for environment {target_env}, checking further"
            );
        }
    }

    tracing::warn!(
        workflow,
        commit_sha,
        "no run found that requires approval for environment {target_env}"
    );
    Ok(None)
}

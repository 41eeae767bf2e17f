//! The tracking comment: rendering its body and keeping a single copy of it
//! on the pull request.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use futures::TryStreamExt;

use crate::error::{Result, TriggerboxError};
use crate::platform::{comment_pages, Platform};
use crate::types::{workflow_file, CommentId};

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Everything needed to render the tracking comment for one commit.
#[derive(Debug, Clone)]
pub struct CommentContext<'a> {
    /// Web URL of the repository, e.g. `https://github.com/o/r`.
    pub repo_url: &'a str,
    pub pr_number: u64,
    pub commit_sha: &'a str,
    pub head_ref: &'a str,
    pub comment_key: &'a str,
    pub doc_link: Option<&'a str>,
    pub required: &'a [String],
    pub optional: &'a [String],
    pub timezones: &'a [Tz],
}

/// Hidden marker identifying the tracking comment of a PR.
pub fn comment_marker(comment_key: &str, pr_number: u64) -> String {
    format!("<!-- {comment_key}-{pr_number} -->")
}

pub fn workflow_url(repo_url: &str, workflow: &str, head_ref: &str) -> String {
    format!(
        "{}/actions/workflows/{}?query=branch%3A{}",
        repo_url.trim_end_matches('/'),
        workflow_file(workflow),
        urlencoding::encode(head_ref)
    )
}

/// One unchecked checkbox line, in the exact shape the toggle detector reads.
pub fn checkbox_line(repo_url: &str, workflow: &str, head_ref: &str) -> String {
    format!(
        "- [ ] `{workflow}` on CI at this [workflow]({}).",
        workflow_url(repo_url, workflow, head_ref)
    )
}

/// `Asia/Ho_Chi_Minh` → `Asia/Ho Chi Minh`
fn zone_label(tz: Tz) -> String {
    tz.name().replace('_', " ")
}

fn timestamp_line(now: DateTime<Utc>, tz: Tz) -> String {
    let local = now.with_timezone(&tz);
    format!(
        "- _{} - {} ({})_",
        local.format("%d/%m/%Y"),
        local.format("%H:%M:%S"),
        zone_label(tz)
    )
}

pub fn parse_timezones(raw: &str) -> Result<Vec<Tz>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<Tz>()
                .map_err(|_| TriggerboxError::MissingInput(format!("unknown timezone '{s}'")))
        })
        .collect()
}

pub fn render_comment(ctx: &CommentContext<'_>, now: DateTime<Utc>) -> String {
    let list = |workflows: &[String]| {
        workflows
            .iter()
            .map(|w| checkbox_line(ctx.repo_url, w, ctx.head_ref))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let mut body = format!(
        "# Workflow triggers {}\n",
        comment_marker(ctx.comment_key, ctx.pr_number)
    );
    if let Some(link) = ctx.doc_link {
        body.push_str(&format!(
            "\n_For details on each workflow or feedback, please check out this [document]({link})_\n"
        ));
    }
    body.push_str(&format!("\n## Required\n{}\n", list(ctx.required)));
    body.push_str(&format!("\n## Optional\n{}\n", list(ctx.optional)));
    body.push_str(&format!(
        "\n_This comment is generated against commit {}, updated at:_",
        ctx.commit_sha
    ));
    for tz in ctx.timezones {
        body.push('\n');
        body.push_str(&timestamp_line(now, *tz));
    }
    body
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum CommentAction {
    Created { comment_id: CommentId },
    Updated { comment_id: CommentId },
}

/// Find the bot's tracking comment on `pr_number`, scanning pages until the
/// first hit.
pub async fn find_tracking_comment<P>(
    platform: &P,
    pr_number: u64,
    bot_login: &str,
    marker: &str,
) -> Result<Option<CommentId>>
where
    P: Platform + ?Sized,
{
    tracing::info!(pr_number, bot = bot_login, "searching for existing comment");
    let pages = comment_pages(platform, pr_number);
    futures::pin_mut!(pages);

    while let Some(comments) = pages.try_next().await? {
        if let Some(found) = comments
            .iter()
            .find(|c| c.author == bot_login && c.body.contains(marker))
        {
            tracing::info!(comment_id = %found.id, "found existing comment");
            return Ok(Some(found.id));
        }
    }
    Ok(None)
}

/// Update the tracking comment if it exists, create it otherwise.
pub async fn upsert_tracking_comment<P>(
    platform: &P,
    pr_number: u64,
    bot_login: &str,
    marker: &str,
    body: &str,
) -> Result<CommentAction>
where
    P: Platform + ?Sized,
{
    match find_tracking_comment(platform, pr_number, bot_login, marker).await? {
        Some(comment_id) => {
            tracing::info!(comment_id = %comment_id, "updating existing comment");
            platform.update_comment(comment_id, body).await?;
            Ok(CommentAction::Updated { comment_id })
        }
        None => {
            tracing::info!(pr_number, "creating new comment");
            let comment_id = platform.create_comment(pr_number, body).await?;
            Ok(CommentAction::Created { comment_id })
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

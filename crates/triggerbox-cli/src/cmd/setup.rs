use crate::cmd::{GithubArgs, WorkflowArgs};
use crate::output::print_json;
use clap::Args;
use triggerbox_core::comment::{
    comment_marker, parse_timezones, render_comment, upsert_tracking_comment, CommentAction,
    CommentContext,
};
use triggerbox_core::config::{DEFAULT_COMMENT_KEY, DEFAULT_TIMEZONES};
use triggerbox_core::TriggerboxError;

#[derive(Args)]
pub struct SetupArgs {
    /// Pull request to comment on
    #[arg(long, env = "PR_NUMBER")]
    pr_number: Option<u64>,

    /// Full SHA of the commit the comment tracks
    #[arg(long, env = "COMMIT_HASH")]
    commit_hash: Option<String>,

    /// Head branch of the pull request, used in workflow links
    #[arg(long, env = "HEAD_REF")]
    head_ref: Option<String>,

    /// Prefix of the hidden marker identifying the comment
    #[arg(long, env = "COMMENT_KEY", default_value = DEFAULT_COMMENT_KEY)]
    comment_key: String,

    /// Comma-separated IANA zones shown in the footer timestamp
    #[arg(long, env = "DISPLAY_TIMEZONES", default_value = DEFAULT_TIMEZONES)]
    timezones: String,

    #[command(flatten)]
    workflows: WorkflowArgs,
}

fn is_full_sha(sha: &str) -> bool {
    sha.len() == 40 && sha.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f'))
}

pub fn run(github: &GithubArgs, args: SetupArgs, json: bool) -> anyhow::Result<()> {
    let settings = args.workflows.settings()?;

    let pr_number = args
        .pr_number
        .ok_or_else(|| TriggerboxError::MissingInput("PR_NUMBER".into()))?;
    let commit_sha = args
        .commit_hash
        .as_deref()
        .map(|s| s.trim().to_ascii_lowercase())
        .filter(|s| is_full_sha(s))
        .ok_or_else(|| {
            TriggerboxError::MissingInput("COMMIT_HASH (40-character hex SHA)".into())
        })?;
    let head_ref = args
        .head_ref
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .ok_or_else(|| TriggerboxError::MissingInput("HEAD_REF".into()))?;
    if settings.required.is_empty() {
        return Err(TriggerboxError::MissingInput("REQUIRED_WORKFLOWS".into()).into());
    }
    let timezones = parse_timezones(&args.timezones)?;

    let repo_url = github.repo_url()?;
    let ctx = CommentContext {
        repo_url: &repo_url,
        pr_number,
        commit_sha: &commit_sha,
        head_ref,
        comment_key: &args.comment_key,
        doc_link: settings.doc_link.as_deref(),
        required: &settings.required,
        optional: &settings.optional,
        timezones: &timezones,
    };
    let body = render_comment(&ctx, chrono::Utc::now());
    let marker = comment_marker(&args.comment_key, pr_number);

    let client = github.client()?;
    let rt = tokio::runtime::Runtime::new()?;
    let action = rt.block_on(upsert_tracking_comment(
        &client,
        pr_number,
        &settings.bot_login,
        &marker,
        &body,
    ))?;

    if json {
        print_json(&serde_json::json!({
            "pr_number": pr_number,
            "comment": action,
        }))?;
    } else {
        match action {
            CommentAction::Created { comment_id } => {
                println!("Created comment {comment_id} on PR #{pr_number}.")
            }
            CommentAction::Updated { comment_id } => {
                println!("Updated comment {comment_id} on PR #{pr_number}.")
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_sha_is_forty_lowercase_hex() {
        assert!(is_full_sha("0123456789abcdef0123456789abcdef01234567"));
        assert!(!is_full_sha("0123456"));
        assert!(!is_full_sha("0123456789ABCDEF0123456789abcdef01234567"));
        assert!(!is_full_sha("g123456789abcdef0123456789abcdef01234567"));
    }
}

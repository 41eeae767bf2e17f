use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

use crate::error::{Result, TriggerboxError};

// ---------------------------------------------------------------------------
// Inbound payload (issue_comment webhook shape)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct CommentEventPayload {
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub issue: Option<PayloadIssue>,
    #[serde(default)]
    pub comment: Option<PayloadComment>,
    #[serde(default)]
    pub changes: Option<PayloadChanges>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PayloadIssue {
    #[serde(default)]
    pub number: Option<u64>,
    #[serde(default)]
    pub pull_request: Option<PayloadPullRequestRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PayloadPullRequestRef {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PayloadComment {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub body: Option<String>,
    pub user: PayloadUser,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PayloadUser {
    pub login: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PayloadChanges {
    #[serde(default)]
    pub body: Option<PayloadFrom>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PayloadFrom {
    #[serde(default)]
    pub from: Option<String>,
}

impl CommentEventPayload {
    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}

// ---------------------------------------------------------------------------
// ChangeEvent
// ---------------------------------------------------------------------------

/// An edit of the tracking comment by the bot account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeEvent {
    pub previous_body: String,
    pub current_body: String,
    /// `None` disables approvals for this event; dispatches still happen.
    pub commit_sha: Option<String>,
    pub pr_number: u64,
    pub actor_login: String,
}

/// Why an event was not handled. Skips are silent successes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    NotPullRequest,
    MissingComment,
    NotBotAuthor { actor: String, expected: String },
    NotAnEdit,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NotPullRequest => {
                f.write_str("event is missing issue or pull_request information")
            }
            SkipReason::MissingComment => f.write_str("event carries no comment"),
            SkipReason::NotBotAuthor { actor, expected } => {
                write!(f, "comment user '{actor}' is not the expected bot '{expected}'")
            }
            SkipReason::NotAnEdit => {
                f.write_str("event has no previous comment body (changes.body.from)")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventDisposition {
    Handle(ChangeEvent),
    Skip(SkipReason),
}

impl ChangeEvent {
    /// Decide whether `payload` is an edit of the bot's comment on a pull
    /// request and, if so, extract the event.
    ///
    /// Only an unparsable PR URL is an error; everything else that makes the
    /// event inapplicable is a [`SkipReason`].
    pub fn from_payload(payload: CommentEventPayload, bot_login: &str) -> Result<EventDisposition> {
        let Some(pr_url) = payload
            .issue
            .and_then(|issue| issue.pull_request)
            .map(|pr| pr.url)
        else {
            return Ok(EventDisposition::Skip(SkipReason::NotPullRequest));
        };

        let Some(comment) = payload.comment else {
            return Ok(EventDisposition::Skip(SkipReason::MissingComment));
        };

        if comment.user.login != bot_login {
            return Ok(EventDisposition::Skip(SkipReason::NotBotAuthor {
                actor: comment.user.login,
                expected: bot_login.to_string(),
            }));
        }

        let Some(previous_body) = payload
            .changes
            .and_then(|c| c.body)
            .and_then(|b| b.from)
            .filter(|from| !from.is_empty())
        else {
            return Ok(EventDisposition::Skip(SkipReason::NotAnEdit));
        };

        let pr_number = pr_number_from_url(&pr_url)?;
        let current_body = comment.body.unwrap_or_default();
        let commit_sha = extract_commit_sha(&current_body);

        Ok(EventDisposition::Handle(ChangeEvent {
            previous_body,
            current_body,
            commit_sha,
            pr_number,
            actor_login: comment.user.login,
        }))
    }
}

// ---------------------------------------------------------------------------
// Text extraction
// ---------------------------------------------------------------------------

fn commit_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"commit ([a-f0-9]{40})").expect("valid commit regex"))
}

/// Pull the commit SHA out of the footer `... generated against commit <sha>`.
pub fn extract_commit_sha(body: &str) -> Option<String> {
    commit_regex()
        .captures(body)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// `https://api.github.com/repos/o/r/pulls/42` → `42`
pub fn pr_number_from_url(url: &str) -> Result<u64> {
    url.trim_end_matches('/')
        .rsplit('/')
        .next()
        .and_then(|segment| segment.parse().ok())
        .ok_or_else(|| TriggerboxError::InvalidPullRequestUrl(url.to_string()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

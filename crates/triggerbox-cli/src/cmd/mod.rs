pub mod handle;
pub mod setup;
pub mod validate;

use anyhow::Context;
use clap::Args;
use std::time::Duration;
use triggerbox_core::config::{
    split_workflows, PollPolicy, Settings, WarnLevel, WorkflowConfig, DEFAULT_BOT_LOGIN,
    DEFAULT_POLL_TIMEOUT_SECS, DEFAULT_RETRY_INTERVAL_SECS,
};
use triggerbox_core::TriggerboxError;
use triggerbox_github::{ClientConfig, GithubClient, DEFAULT_API_URL};

// ---------------------------------------------------------------------------
// Repository access
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct GithubArgs {
    /// API token with actions and pull-request scope
    #[arg(long, global = true, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Target repository as owner/repo
    #[arg(long, global = true, env = "GITHUB_REPOSITORY")]
    repo: Option<String>,

    /// REST API base URL
    #[arg(long, global = true, env = "GITHUB_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Web base URL, used for links in the tracking comment
    #[arg(
        long,
        global = true,
        env = "GITHUB_SERVER_URL",
        default_value = "https://github.com"
    )]
    server_url: String,
}

impl GithubArgs {
    pub fn client(&self) -> anyhow::Result<GithubClient> {
        let token = required(self.token.as_deref(), "GITHUB_TOKEN")?;
        let repo = required(self.repo.as_deref(), "GITHUB_REPOSITORY")?;
        let client = GithubClient::new(ClientConfig::new(token, repo).with_api_url(&self.api_url))
            .context("failed to build GitHub client")?;
        Ok(client)
    }

    /// Web URL of the repository, e.g. `https://github.com/acme/web`.
    pub fn repo_url(&self) -> anyhow::Result<String> {
        let repo = required(self.repo.as_deref(), "GITHUB_REPOSITORY")?;
        let (owner, name) = triggerbox_github::parse_repository(repo)?;
        Ok(format!(
            "{}/{owner}/{name}",
            self.server_url.trim_end_matches('/')
        ))
    }
}

fn required<'a>(value: Option<&'a str>, name: &str) -> Result<&'a str, TriggerboxError> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| TriggerboxError::MissingInput(name.to_string()))
}

// ---------------------------------------------------------------------------
// Workflow configuration
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct WorkflowArgs {
    /// JSON object mapping workflow name to protected environment name (or null)
    #[arg(long, env = "ENVIRONMENT_MAPPINGS")]
    environment_mappings: Option<String>,

    /// Comma-separated workflows listed under "Required"
    #[arg(long, env = "REQUIRED_WORKFLOWS")]
    required_workflows: Option<String>,

    /// Comma-separated workflows listed under "Optional"
    #[arg(long, env = "OPTIONAL_WORKFLOWS")]
    optional_workflows: Option<String>,

    /// Login of the account that owns the tracking comment
    #[arg(long, env = "ACTION_BOT", default_value = DEFAULT_BOT_LOGIN)]
    bot: String,

    /// Document linked from the tracking comment
    #[arg(long, env = "DOC_LINK")]
    doc_link: Option<String>,

    /// Seconds to wait for a run to become "waiting"
    #[arg(long, env = "APPROVAL_TIMEOUT_SECS", default_value_t = DEFAULT_POLL_TIMEOUT_SECS)]
    approval_timeout_secs: u64,

    /// Seconds between status checks while a run is pending
    #[arg(
        long,
        env = "APPROVAL_RETRY_INTERVAL_SECS",
        default_value_t = DEFAULT_RETRY_INTERVAL_SECS
    )]
    approval_retry_interval_secs: u64,

    /// Only approve deployments that are explicitly waiting on reviewers
    #[arg(long, env = "REQUIRE_REVIEWERS")]
    require_reviewers: bool,
}

impl WorkflowArgs {
    /// Build and check the settings. Warnings are logged; any error-level
    /// finding fails the command.
    pub fn settings(&self) -> anyhow::Result<Settings> {
        let workflows = WorkflowConfig::from_json(
            self.environment_mappings.as_deref().unwrap_or_default(),
        )?;
        let mut settings = Settings::new(self.bot.trim(), workflows).with_lists(
            split_workflows(self.required_workflows.as_deref()),
            split_workflows(self.optional_workflows.as_deref()),
        );
        settings.doc_link = self
            .doc_link
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string);
        settings.poll = PollPolicy {
            timeout: Duration::from_secs(self.approval_timeout_secs),
            retry_interval: Duration::from_secs(self.approval_retry_interval_secs),
        };
        settings.require_reviewers = self.require_reviewers;

        let warnings = settings.validate();
        for w in &warnings {
            match w.level {
                WarnLevel::Warning => tracing::warn!("{}", w.message),
                WarnLevel::Error => tracing::error!("{}", w.message),
            }
        }
        if let Some(first) = warnings.iter().find(|w| w.level == WarnLevel::Error) {
            anyhow::bail!("invalid configuration: {}", first.message);
        }

        tracing::info!(
            workflows = settings.workflows.len(),
            bot = %settings.bot_login,
            "configuration loaded"
        );
        Ok(settings)
    }
}

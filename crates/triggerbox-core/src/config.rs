use crate::error::{Result, TriggerboxError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// WorkflowConfig
// ---------------------------------------------------------------------------

/// Workflow identifier → protected environment name.
///
/// A workflow mapped to `None` (JSON `null` or `""`) has no approval gate and
/// is dispatched directly when toggled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkflowConfig {
    mappings: BTreeMap<String, Option<String>>,
}

impl WorkflowConfig {
    /// Parse the `ENVIRONMENT_MAPPINGS` JSON object. Blank input is an empty
    /// mapping.
    pub fn from_json(raw: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        let parsed: BTreeMap<String, Option<String>> = serde_json::from_str(raw)
            .map_err(|e| TriggerboxError::InvalidMappings(e.to_string()))?;

        let mut config = Self::default();
        for (workflow, environment) in parsed {
            let workflow = workflow.trim();
            if workflow.is_empty() {
                return Err(TriggerboxError::InvalidMappings(
                    "workflow names must not be empty".to_string(),
                ));
            }
            config.insert(workflow, environment);
        }
        Ok(config)
    }

    pub fn insert(&mut self, workflow: impl Into<String>, environment: Option<String>) {
        let environment = environment
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty());
        self.mappings.insert(workflow.into(), environment);
    }

    /// Add `workflows` that have no mapping yet as unprotected entries.
    pub fn include_unmapped<'a>(&mut self, workflows: impl IntoIterator<Item = &'a String>) {
        for workflow in workflows {
            self.mappings.entry(workflow.clone()).or_insert(None);
        }
    }

    pub fn environment_for(&self, workflow: &str) -> Option<&str> {
        self.mappings.get(workflow).and_then(|e| e.as_deref())
    }

    pub fn workflows(&self) -> impl Iterator<Item = &str> {
        self.mappings.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}

/// Split a comma-separated workflow list, trimming entries and dropping blanks.
pub fn split_workflows(raw: Option<&str>) -> Vec<String> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

// ---------------------------------------------------------------------------
// PollPolicy
// ---------------------------------------------------------------------------

/// Bounds for waiting on a run to reach the `waiting` state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub timeout: Duration,
    pub retry_interval: Duration,
}

pub const DEFAULT_POLL_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_RETRY_INTERVAL_SECS: u64 = 5;

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_POLL_TIMEOUT_SECS),
            retry_interval: Duration::from_secs(DEFAULT_RETRY_INTERVAL_SECS),
        }
    }
}

// ---------------------------------------------------------------------------
// Settings (top-level)
// ---------------------------------------------------------------------------

pub const DEFAULT_BOT_LOGIN: &str = "github-actions[bot]";
pub const DEFAULT_COMMENT_KEY: &str = "workflow-triggers";
pub const DEFAULT_TIMEZONES: &str = "Asia/Ho_Chi_Minh,Australia/Sydney";

#[derive(Debug, Clone)]
pub struct Settings {
    /// Login of the account that owns the tracking comment.
    pub bot_login: String,
    pub workflows: WorkflowConfig,
    pub required: Vec<String>,
    pub optional: Vec<String>,
    pub doc_link: Option<String>,
    pub poll: PollPolicy,
    /// Only accept pending deployments that are explicitly waiting on reviewers.
    pub require_reviewers: bool,
}

impl Settings {
    pub fn new(bot_login: impl Into<String>, workflows: WorkflowConfig) -> Self {
        Self {
            bot_login: bot_login.into(),
            workflows,
            required: Vec::new(),
            optional: Vec::new(),
            doc_link: None,
            poll: PollPolicy::default(),
            require_reviewers: false,
        }
    }

    /// Attach the required/optional lists; any listed workflow missing from the
    /// environment mapping is tracked as unprotected.
    pub fn with_lists(mut self, required: Vec<String>, optional: Vec<String>) -> Self {
        self.workflows.include_unmapped(required.iter().chain(optional.iter()));
        self.required = required;
        self.optional = optional;
        self
    }

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.bot_login.trim().is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "bot login must not be empty".to_string(),
            });
        }

        if self.workflows.is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "no workflows configured: comment edits will never trigger anything"
                    .to_string(),
            });
        }

        for workflow in &self.required {
            if self.optional.contains(workflow) {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!("workflow '{workflow}' is listed as both required and optional"),
                });
            }
        }

        if self.poll.retry_interval.is_zero() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "retry interval must be greater than zero".to_string(),
            });
        } else if self.poll.retry_interval > self.poll.timeout {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "retry interval ({}s) exceeds poll timeout ({}s): a pending run is checked only once",
                    self.poll.retry_interval.as_secs(),
                    self.poll.timeout.as_secs()
                ),
            });
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Identifier of a protected environment.
///
/// Every id that flows through the resolver or comes back from the platform
/// goes through this type, so a resolved id and a platform id always compare
/// as the same numeric value. Numeric strings are accepted on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct EnvironmentId(pub u64);

impl<'de> Deserialize<'de> for EnvironmentId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Ok(EnvironmentId(n)),
            Raw::Text(s) => s
                .trim()
                .parse()
                .map(EnvironmentId)
                .map_err(|_| serde::de::Error::custom(format!("invalid environment id '{s}'"))),
        }
    }
}

impl fmt::Display for EnvironmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub u64);

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommentId(pub u64);

impl fmt::Display for CommentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// RunStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Requested,
    Queued,
    InProgress,
    Waiting,
    Pending,
    ActionRequired,
    Completed,
    #[serde(other)]
    Unknown,
}

impl RunStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RunStatus::Requested => "requested",
            RunStatus::Queued => "queued",
            RunStatus::InProgress => "in_progress",
            RunStatus::Waiting => "waiting",
            RunStatus::Pending => "pending",
            RunStatus::ActionRequired => "action_required",
            RunStatus::Completed => "completed",
            RunStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Platform records
// ---------------------------------------------------------------------------

/// A workflow run discovered for a commit. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateRun {
    pub id: RunId,
    pub name: String,
    /// Definition path, e.g. `.github/workflows/build-preview.yml`. Newer API
    /// versions may append `@<ref>`.
    pub path: String,
    pub status: RunStatus,
}

impl CandidateRun {
    /// Whether this run was started from `workflow`'s definition file.
    pub fn is_for_workflow(&self, workflow: &str) -> bool {
        let path = self.path.split('@').next().unwrap_or_default();
        path == workflow_path(workflow) || self.name == workflow
    }
}

/// A run's request to deploy into a protected environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingDeployment {
    pub environment_id: EnvironmentId,
    #[serde(default)]
    pub environment_name: Option<String>,
    #[serde(default)]
    pub waiting_for_reviewers: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    pub id: EnvironmentId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    pub id: u64,
    pub name: String,
    pub path: String,
    #[serde(default)]
    pub html_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueComment {
    pub id: CommentId,
    pub author: String,
    pub body: String,
}

/// One page of a paginated listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub has_next: bool,
}

// ---------------------------------------------------------------------------
// Workflow file naming
// ---------------------------------------------------------------------------

/// `build-preview` → `build-preview.yml`
pub fn workflow_file(workflow: &str) -> String {
    format!("{workflow}.yml")
}

/// `build-preview` → `.github/workflows/build-preview.yml`
pub fn workflow_path(workflow: &str) -> String {
    format!(".github/workflows/{workflow}.yml")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

use crate::types::{EnvironmentId, RunId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TriggerboxError {
    #[error("missing or invalid required input: {0}")]
    MissingInput(String),

    #[error("invalid environment mappings: {0}")]
    InvalidMappings(String),

    #[error("workflow validation failed for {} workflow(s):\n{}", .0.len(), .0.join("\n"))]
    WorkflowValidation(Vec<String>),

    #[error("could not parse PR number from event payload URL: {0}")]
    InvalidPullRequestUrl(String),

    #[error("environment '{environment}' mapped for workflow '{workflow}' does not exist")]
    EnvironmentNotFound {
        workflow: String,
        environment: String,
    },

    #[error("{operation} failed: {message}")]
    Platform { operation: String, message: String },

    #[error("timeout: workflow run {run_id} did not become 'waiting' within {waited_secs}s")]
    PollTimeout { run_id: RunId, waited_secs: u64 },

    #[error(
        "workflow run {run_id} is waiting on {found:?}, none matching environment {environment_id}"
    )]
    DeploymentMismatch {
        run_id: RunId,
        environment_id: EnvironmentId,
        found: Vec<EnvironmentId>,
    },

    #[error("{} of {} toggled workflow(s) failed:\n{}", .failures.len(), .total, .failures.join("\n"))]
    WorkflowsFailed { failures: Vec<String>, total: usize },

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl TriggerboxError {
    /// Build a [`TriggerboxError::Platform`] for a failed outbound call.
    pub fn platform(operation: impl Into<String>, message: impl ToString) -> Self {
        Self::Platform {
            operation: operation.into(),
            message: message.to_string(),
        }
    }

    /// True for errors raised before any side effect could have happened.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::MissingInput(_)
                | Self::InvalidMappings(_)
                | Self::WorkflowValidation(_)
                | Self::InvalidPullRequestUrl(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, TriggerboxError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workflow_validation_lists_every_failure() {
        let err = TriggerboxError::WorkflowValidation(vec![
            "build.yml: not found".to_string(),
            "lint.yml: not found".to_string(),
        ]);
        let msg = err.to_string();
        assert!(msg.starts_with("workflow validation failed for 2 workflow(s)"));
        assert!(msg.contains("build.yml: not found"));
        assert!(msg.contains("lint.yml: not found"));
        assert!(err.is_validation());
    }

    #[test]
    fn environment_not_found_is_not_a_validation_error() {
        let err = TriggerboxError::EnvironmentNotFound {
            workflow: "build-preview".into(),
            environment: "Staging".into(),
        };
        assert!(!err.is_validation());
        assert_eq!(
            err.to_string(),
            "environment 'Staging' mapped for workflow 'build-preview' does not exist"
        );
    }

    #[test]
    fn platform_helper_formats_operation() {
        let err = TriggerboxError::platform("get run 12", "502 Bad Gateway");
        assert_eq!(err.to_string(), "get run 12 failed: 502 Bad Gateway");
    }
}

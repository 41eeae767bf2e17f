use std::collections::HashMap;

use crate::config::WorkflowConfig;
use crate::error::{Result, TriggerboxError};
use crate::platform::Platform;
use crate::types::{Environment, EnvironmentId};

// ---------------------------------------------------------------------------
// EnvironmentTable
// ---------------------------------------------------------------------------

/// Environment name → id, as reported by the platform. Immutable once built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvironmentTable {
    ids: HashMap<String, EnvironmentId>,
}

impl EnvironmentTable {
    pub fn new(environments: impl IntoIterator<Item = Environment>) -> Self {
        Self {
            ids: environments.into_iter().map(|e| (e.name, e.id)).collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<EnvironmentId> {
        self.ids.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.ids.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

// ---------------------------------------------------------------------------
// Resolver
// ---------------------------------------------------------------------------

/// Resolve the environment gating `workflow`.
///
/// `Ok(None)` means the workflow has no mapping and needs no approval. A
/// mapping to an environment absent from `table` is a configuration error.
pub fn resolve(
    workflow: &str,
    config: &WorkflowConfig,
    table: &EnvironmentTable,
) -> Result<Option<EnvironmentId>> {
    let Some(name) = config.environment_for(workflow) else {
        tracing::info!(workflow, "no environment mapping, no approval required");
        return Ok(None);
    };

    let id = table
        .get(name)
        .ok_or_else(|| TriggerboxError::EnvironmentNotFound {
            workflow: workflow.to_string(),
            environment: name.to_string(),
        })?;

    tracing::info!(workflow, environment = name, environment_id = %id, "found environment mapping");
    Ok(Some(id))
}

// ---------------------------------------------------------------------------
// EnvironmentCache
// ---------------------------------------------------------------------------

enum CacheState {
    Unfetched,
    Ready(EnvironmentTable),
    Failed(String),
}

/// The environment table for one invocation, fetched on first use.
///
/// A failed fetch is remembered too: later workflows get the same error
/// without another request.
pub struct EnvironmentCache {
    state: CacheState,
}

impl Default for EnvironmentCache {
    fn default() -> Self {
        Self::new()
    }
}

impl EnvironmentCache {
    pub fn new() -> Self {
        Self {
            state: CacheState::Unfetched,
        }
    }

    pub fn is_fetched(&self) -> bool {
        !matches!(self.state, CacheState::Unfetched)
    }

    pub async fn get<P>(&mut self, platform: &P) -> Result<&EnvironmentTable>
    where
        P: Platform + ?Sized,
    {
        if let CacheState::Unfetched = self.state {
            tracing::info!("fetching environment ids");
            self.state = match platform.list_environments().await {
                Ok(environments) => {
                    let table = EnvironmentTable::new(environments);
                    tracing::info!(environments = ?table.names(), "found environments");
                    CacheState::Ready(table)
                }
                Err(e) => {
                    tracing::warn!(error = %e, "could not fetch environments");
                    CacheState::Failed(e.to_string())
                }
            };
        }

        match &self.state {
            CacheState::Ready(table) => Ok(table),
            CacheState::Failed(message) => {
                Err(TriggerboxError::platform("list environments", message))
            }
            CacheState::Unfetched => unreachable!("environment cache populated above"),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::FakePlatform;
    use crate::types::PendingDeployment;

    fn table(entries: &[(&str, u64)]) -> EnvironmentTable {
        EnvironmentTable::new(entries.iter().map(|(name, id)| Environment {
            id: EnvironmentId(*id),
            name: name.to_string(),
        }))
    }

    #[test]
    fn unmapped_workflow_needs_no_approval() {
        let config = WorkflowConfig::default();
        assert_eq!(resolve("wf", &config, &table(&[("Preview", 7)])).unwrap(), None);
        assert_eq!(resolve("wf", &config, &EnvironmentTable::default()).unwrap(), None);
    }

    #[test]
    fn mapping_to_missing_environment_is_a_config_error() {
        let config = WorkflowConfig::from_json(r#"{"wf":"Staging"}"#).unwrap();
        let err = resolve("wf", &config, &EnvironmentTable::default()).unwrap_err();
        assert!(matches!(
            err,
            TriggerboxError::EnvironmentNotFound { ref workflow, ref environment }
                if workflow == "wf" && environment == "Staging"
        ));
    }

    #[test]
    fn mapped_workflow_resolves_to_id() {
        let config = WorkflowConfig::from_json(r#"{"build-preview":"Preview"}"#).unwrap();
        let id = resolve("build-preview", &config, &table(&[("Preview", 7), ("Prod", 9)])).unwrap();
        assert_eq!(id, Some(EnvironmentId(7)));
    }

    #[test]
    fn resolved_id_equals_platform_id_whatever_its_json_shape() {
        // Environments listed with string ids, deployments with numeric ids.
        let environments: Vec<Environment> =
            serde_json::from_str(r#"[{"id":"7","name":"Preview"}]"#).unwrap();
        let deployment: PendingDeployment =
            serde_json::from_str(r#"{"environment_id":7,"waiting_for_reviewers":true}"#).unwrap();

        let config = WorkflowConfig::from_json(r#"{"build-preview":"Preview"}"#).unwrap();
        let resolved = resolve("build-preview", &config, &EnvironmentTable::new(environments))
            .unwrap()
            .unwrap();
        assert_eq!(resolved, deployment.environment_id);
    }

    #[tokio::test]
    async fn cache_fetches_once() {
        let platform = FakePlatform::new().with_environment("Preview", 7);
        let mut cache = EnvironmentCache::new();
        assert!(!cache.is_fetched());

        assert_eq!(cache.get(&platform).await.unwrap().get("Preview"), Some(EnvironmentId(7)));
        assert_eq!(cache.get(&platform).await.unwrap().len(), 1);
        assert!(cache.is_fetched());
        assert_eq!(platform.count("list_environments"), 1);
    }

    #[tokio::test]
    async fn cache_remembers_failure() {
        let platform = FakePlatform::new().failing("list_environments");
        let mut cache = EnvironmentCache::new();

        assert!(cache.get(&platform).await.is_err());
        let err = cache.get(&platform).await.unwrap_err();
        assert!(matches!(err, TriggerboxError::Platform { .. }));
        assert_eq!(platform.count("list_environments"), 1);
    }
}

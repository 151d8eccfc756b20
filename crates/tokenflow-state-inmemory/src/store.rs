use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};
use uuid::Uuid;

use tokenflow_core::{activate, ActivationOutcome, CoreConfig, CoreError, InstanceData, ProcessGraph};

use crate::instance_data::InMemoryInstanceData;

/// Value object: process instance id
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstanceId(pub String);

impl InstanceId {
    /// Generate a new random instance id
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

type SharedInstance = Arc<Mutex<InMemoryInstanceData>>;

/// Instance data of many process instances.
///
/// Each instance sits behind its own lock: activations of one instance run
/// one at a time, activations of different instances run in parallel.
#[derive(Clone, Default)]
pub struct InMemoryInstanceStore {
    instances: Arc<DashMap<InstanceId, SharedInstance>>,
    config: CoreConfig,
}

impl InMemoryInstanceStore {
    /// Create an empty store with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store whose activations use `config`
    pub fn with_config(config: CoreConfig) -> Self {
        Self {
            instances: Arc::new(DashMap::new()),
            config,
        }
    }

    /// Configuration passed to every activation
    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    /// Register an instance with no tokens
    pub fn create(&self) -> InstanceId {
        let id = InstanceId::generate();
        self.insert(id.clone(), InMemoryInstanceData::new());
        id
    }

    /// Register an instance with one token at the graph's start node
    pub fn start(&self, graph: &ProcessGraph) -> Result<InstanceId, CoreError> {
        let start = graph
            .start_node()
            .ok_or_else(|| CoreError::NodeNotFound(format!("start node of {}", graph.id)))?;

        let mut data = InMemoryInstanceData::new();
        data.add_token_at_node(start.base().id())?;

        let id = InstanceId::generate();
        self.insert(id.clone(), data);
        info!(instance = %id, graph = %graph.id, start = %start.base().id(), "Instance started");
        Ok(id)
    }

    /// Register or replace an instance
    pub fn insert(&self, id: InstanceId, data: InMemoryInstanceData) {
        self.instances.insert(id, Arc::new(Mutex::new(data)));
    }

    /// Drop an instance, returning its data if it was known
    pub fn remove(&self, id: &InstanceId) -> Result<Option<InMemoryInstanceData>, CoreError> {
        let Some((_, shared)) = self.instances.remove(id) else {
            return Ok(None);
        };
        let data = lock(id, &shared)?.clone();
        Ok(Some(data))
    }

    /// Whether an instance is registered
    pub fn contains(&self, id: &InstanceId) -> bool {
        self.instances.contains_key(id)
    }

    /// Number of registered instances
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    /// Whether no instance is registered
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Ids of every registered instance
    pub fn ids(&self) -> Vec<InstanceId> {
        self.instances.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Run `f` with exclusive access to one instance's data
    pub fn with_instance<R, F>(&self, id: &InstanceId, f: F) -> Result<R, CoreError>
    where
        F: FnOnce(&mut InMemoryInstanceData) -> Result<R, CoreError>,
    {
        // Clone the handle so the map shard is not locked while `f` runs.
        let shared = self
            .instances
            .get(id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| CoreError::InstanceNotFound(id.to_string()))?;

        let mut data = lock(id, &shared)?;
        f(&mut *data)
    }

    /// Copy of one instance's data
    pub fn snapshot(&self, id: &InstanceId) -> Result<InMemoryInstanceData, CoreError> {
        self.with_instance(id, |data| Ok(data.clone()))
    }

    /// Copy of one instance's data as JSON
    pub fn export(&self, id: &InstanceId) -> Result<serde_json::Value, CoreError> {
        let snapshot = self.snapshot(id)?;
        Ok(serde_json::to_value(&snapshot)?)
    }

    /// Register an instance from JSON produced by [`InMemoryInstanceStore::export`]
    pub fn import(&self, id: InstanceId, value: serde_json::Value) -> Result<(), CoreError> {
        let data: InMemoryInstanceData = serde_json::from_value(value)?;
        self.insert(id, data);
        Ok(())
    }

    /// Activate one node of one instance
    pub fn activate(
        &self,
        id: &InstanceId,
        graph: &ProcessGraph,
        node_id: &str,
    ) -> Result<ActivationOutcome, CoreError> {
        let config = self.config.clone();
        let outcome = self.with_instance(id, |data| activate(graph, node_id, data, config))?;
        debug!(instance = %id, node = %node_id, faulted = outcome.is_faulted(), "Instance activated");
        Ok(outcome)
    }

    /// Whether an instance has no live tokens left
    pub fn is_complete(&self, id: &InstanceId) -> Result<bool, CoreError> {
        self.with_instance(id, |data| Ok(data.is_complete()))
    }
}

fn lock<'a>(
    id: &InstanceId,
    shared: &'a SharedInstance,
) -> Result<std::sync::MutexGuard<'a, InMemoryInstanceData>, CoreError> {
    shared
        .lock()
        .map_err(|_| CoreError::StateStore(format!("instance {} lock poisoned", id)))
}

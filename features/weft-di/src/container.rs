use std::{
    any::type_name,
    fmt::Debug,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use crate::{
    dag::{Dag, GraphSnapshot, NodeRef},
    errors::{LifecycleError, RequireError},
    token::{Token, TokenId, TokenRegistry},
    types::{Injectable, Instance},
};

/// Lifecycle of a built container
///
/// `NotInitialized -> Initialized -> Destroyed`, destroying without init is allowed.
/// A failing hook leaves the container `Failed`, it must be discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    NotInitialized,
    Initializing,
    Initialized,
    Destroying,
    Destroyed,
    Failed,
}

/// Container holding all instances
///
/// Cloning is cheap, all clones share the same instances and lifecycle state.
#[derive(Clone)]
pub struct Container(Arc<ContainerInner>);
struct ContainerInner {
    dag: Dag,
    registry: TokenRegistry,
    state: Mutex<LifecycleState>,
}

impl Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_struct("Container");
        map.field("state", &self.state());
        for node in self.0.dag.iter() {
            map.field(node.id().name(), &node.instance().info.type_name);
        }
        map.finish()
    }
}

impl Container {
    pub(crate) fn new(dag: Dag, registry: TokenRegistry) -> Self {
        Self(Arc::new(ContainerInner {
            dag,
            registry,
            state: Mutex::new(LifecycleState::NotInitialized),
        }))
    }

    /// Attempts to get the instance bound to `token`
    ///
    /// Legal before `init()`, application code relying on init side effects must init first.
    pub fn get<T: Injectable>(&self, token: &Token<T>) -> Result<Arc<T>, RequireError> {
        self.get_instance(token.name())?
            .downcast()
            .map_err(|actual_type| RequireError::DowncastFailed {
                required_type: type_name::<T>(),
                actual_type,
            })
    }

    /// Type erased lookup by token name
    pub fn get_instance(&self, token: &str) -> Result<Instance, RequireError> {
        if self.state() == LifecycleState::Destroyed {
            return Err(RequireError::ContainerDestroyed);
        }

        self.0
            .dag
            .get(token)
            .map(|node| node.instance().clone())
            .ok_or_else(|| RequireError::InstanceNotFound(TokenId::from(token)))
    }

    pub fn contains(&self, token: &str) -> bool {
        self.0.dag.contains(token)
    }

    pub fn node(&self, token: &str) -> Option<NodeRef<'_>> {
        self.0.dag.get(token)
    }

    pub fn graph(&self) -> &Dag {
        &self.0.dag
    }

    /// Tokens and types of everything the container provides
    pub fn registry(&self) -> &TokenRegistry {
        &self.0.registry
    }

    /// Calls `visitor` once per node, dependencies first
    pub fn traverse<F: FnMut(NodeRef<'_>)>(&self, visitor: F) {
        self.0.dag.traverse(visitor)
    }

    pub fn snapshot(&self) -> GraphSnapshot {
        self.0.dag.snapshot()
    }

    /// `{ nodes: [{ id, metadata: { module?, exported? }, dependencies: [id] }] }`
    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        self.0.dag.to_json()
    }

    pub fn state(&self) -> LifecycleState {
        *self.lock_state()
    }

    /// Runs all init hooks, dependencies before dependents
    ///
    /// Fails with [`LifecycleError::AlreadyInitialized`] when called twice.
    pub async fn init(&self) -> Result<(), LifecycleError> {
        self.begin(LifecycleState::Initializing)?;
        tracing::debug!("Initializing {} instances", self.0.dag.len());

        for node in self.0.dag.iter() {
            if node.hooks().on_init().is_empty() {
                continue;
            }
            tracing::debug!("Running init hooks of '{}'", node.id());
            if let Err(source) = node.hooks().run_init().await {
                return Err(self.fail(node.id(), source));
            }
        }

        self.set_state(LifecycleState::Initialized);
        Ok(())
    }

    /// Runs all destroy hooks, dependents before dependencies
    ///
    /// Fails with [`LifecycleError::AlreadyDestroyed`] when called twice. Instances obtained
    /// through [`Container::get`] must not be used afterwards.
    pub async fn destroy(&self) -> Result<(), LifecycleError> {
        if self.begin(LifecycleState::Destroying)? == LifecycleState::NotInitialized {
            tracing::warn!("Destroying a container which was never initialized");
        }

        for node in self.0.dag.iter().rev() {
            if node.hooks().on_destroy().is_empty() {
                continue;
            }
            tracing::debug!("Running destroy hooks of '{}'", node.id());
            if let Err(source) = node.hooks().run_destroy().await {
                return Err(self.fail(node.id(), source));
            }
        }

        self.set_state(LifecycleState::Destroyed);
        Ok(())
    }

    /// Moves into `next`, returning the previous state
    fn begin(&self, next: LifecycleState) -> Result<LifecycleState, LifecycleError> {
        let mut state = self.lock_state();
        let previous = *state;

        match (previous, next) {
            (LifecycleState::NotInitialized, _) => {}
            (LifecycleState::Initialized, LifecycleState::Destroying) => {}
            (LifecycleState::Initialized, _) => return Err(LifecycleError::AlreadyInitialized),
            (LifecycleState::Destroyed, _) => return Err(LifecycleError::AlreadyDestroyed),
            (LifecycleState::Initializing | LifecycleState::Destroying, _) => {
                return Err(LifecycleError::InProgress)
            }
            (LifecycleState::Failed, _) => return Err(LifecycleError::Poisoned),
        }

        *state = next;
        Ok(previous)
    }

    fn fail(&self, token: &TokenId, source: crate::errors::HookError) -> LifecycleError {
        tracing::error!("Lifecycle hook of '{token}' failed: {source}");
        self.set_state(LifecycleState::Failed);
        LifecycleError::HookFailed {
            token: token.clone(),
            source,
        }
    }

    fn set_state(&self, next: LifecycleState) {
        *self.lock_state() = next;
    }

    fn lock_state(&self) -> MutexGuard<'_, LifecycleState> {
        // The state is a plain value, it cannot be left inconsistent by a panic
        self.0.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

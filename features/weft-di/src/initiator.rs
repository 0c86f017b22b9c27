use std::collections::HashSet;

use crate::{
    builder::ContainerBuilder,
    container::Container,
    dag::{Dag, Node, NodeMetadata},
    dependency_graph::DependencyGraph,
    errors::{BuildError, TokenRegistryError},
    provider::{ConstructError, Provider},
    resolver::{Args, ResolvedArgument},
    token::TokenRegistry,
    visibility::{ModuleGraph, Scope, Visibility},
};

/// Builds a [`Container`] out of a [`ContainerBuilder`]
///
/// Runs strictly sequential:
/// 1. collect all modules reachable from the registered ones and load their providers once
/// 2. validate the dependency relation (duplicates, missing tokens, types, visibility, cycles)
/// 3. instantiate every provider in topological order
///
/// Nothing is handed out before all steps succeeded.
pub(crate) struct DiInitiator {
    registry: TokenRegistry,
    dag: Dag,
}

impl DiInitiator {
    pub(crate) fn new(registry: TokenRegistry) -> DiInitiator {
        DiInitiator {
            registry,
            dag: Dag::new(),
        }
    }

    pub(crate) async fn initiate(
        self,
        blueprint: &ContainerBuilder,
    ) -> Result<Container, BuildError> {
        match self.try_initiate(blueprint).await {
            Ok(container) => Ok(container),
            Err(e) => {
                tracing::error!("Building the container failed: {e}");
                Err(e)
            }
        }
    }

    async fn try_initiate(
        mut self,
        blueprint: &ContainerBuilder,
    ) -> Result<Container, BuildError> {
        let modules = ModuleGraph::collect(&blueprint.modules);

        // Deferred providers are loaded exactly once per module
        let mut loaded: Vec<Vec<Provider>> = Vec::with_capacity(modules.modules().len());
        for module in modules.modules() {
            let providers =
                module
                    .load_deferred()
                    .await
                    .map_err(|error| BuildError::ModuleProvidersFailed {
                        module: module.name().to_string(),
                        error,
                    })?;
            tracing::debug!(
                "Module '{}' contributes {} providers",
                module.name(),
                module.providers().len() + providers.len()
            );
            loaded.push(providers);
        }

        tracing::debug!(
            "Initializing container with {} modules and {} floating providers",
            modules.modules().len(),
            blueprint.providers.len()
        );

        // ###############################################
        // Build and check the dependency graph
        let mut graph = DependencyGraph::new();
        let mut own_tokens = Vec::with_capacity(modules.modules().len());
        for (index, module) in modules.modules().iter().enumerate() {
            let mut tokens = HashSet::new();
            for provider in module.providers().iter().chain(&loaded[index]) {
                graph.add(
                    provider,
                    Scope::Module(index),
                    Some(module.name().to_string()),
                )?;
                self.record(provider)?;
                tokens.insert(provider.token().clone());
            }
            own_tokens.push(tokens);
        }
        for provider in &blueprint.providers {
            graph.add(provider, Scope::Floating, None)?;
            self.record(provider)?;
        }

        let visibility = Visibility::compute(&modules, &own_tokens)?;
        graph.check(&visibility)?;
        let order = graph.topological_order()?;

        tracing::debug!("Dependency graph of {} providers is valid", graph.len());

        // ###############################################
        // Instantiate in topological order
        for index in order {
            let entry = graph.entry(index);
            let metadata = match entry.scope {
                Scope::Module(module) => {
                    let module = modules.module(module);
                    NodeMetadata {
                        module: Some(module.name().to_string()),
                        exported: Some(module.is_exported(entry.provider.token())),
                    }
                }
                Scope::Floating => NodeMetadata::default(),
            };

            self.instantiate(entry.provider, metadata).await?;
        }

        tracing::debug!("All {} instances constructed", self.dag.len());

        Ok(Container::new(self.dag, self.registry))
    }

    fn record(&mut self, provider: &Provider) -> Result<(), BuildError> {
        self.registry
            .record(provider.token(), provider.supplies())
            .map_err(|error| match error {
                TokenRegistryError::Conflict {
                    token,
                    registered,
                    requested,
                } => BuildError::TypeMismatch {
                    token,
                    expected: registered,
                    actual: requested,
                },
            })
    }

    /// Constructs one provider, all of its dependencies must already be part of the graph
    async fn instantiate(
        &mut self,
        provider: &Provider,
        metadata: NodeMetadata,
    ) -> Result<(), BuildError> {
        let token = provider.token().clone();

        let mut arguments = Vec::with_capacity(provider.dependencies().len());
        let mut edges = Vec::with_capacity(provider.dependencies().len());
        for dependency in provider.dependencies() {
            // Only optional dependencies may be missing at this point
            let node = self.dag.get(dependency.token.name());
            // An injected token is one edge, however often it is injected
            if let Some(node) = node.filter(|node| !edges.contains(&node.position())) {
                edges.push(node.position());
            }
            arguments.push(ResolvedArgument {
                dependency: dependency.clone(),
                instance: node.map(|node| node.instance().clone()),
            });
        }

        tracing::debug!("Constructing instance of '{}'", token);
        let constructed = provider
            .construct(Args::new(arguments))
            .await
            .map_err(|error| match error {
                ConstructError::Provider(error) => BuildError::ProviderFailed {
                    token: token.clone(),
                    error,
                },
                ConstructError::HookBinding(source) => BuildError::HookBinding {
                    token: token.clone(),
                    source,
                },
            })?;

        tracing::debug!(
            "Constructed instance of '{}' ({})",
            token,
            constructed.instance.info.type_name
        );

        self.dag.insert(Node::new(
            token,
            constructed.instance,
            metadata,
            constructed.hooks,
            edges,
        ));

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_builder_builds_empty_container() {
        let builder = ContainerBuilder::new();
        let container =
            futures::executor::block_on(DiInitiator::new(TokenRegistry::new()).initiate(&builder))
                .unwrap();

        assert!(container.graph().is_empty());
        assert!(container.registry().is_empty());
        assert!(container.get_instance("anything").is_err());
    }
}

use std::sync::Arc;

use crate::{
    container::Container,
    errors::BuildError,
    initiator::DiInitiator,
    module::Module,
    provider::Provider,
    token::{Token, TokenRegistry},
    types::Injectable,
};

/// Collects modules and floating providers, then builds a [`Container`] out of them
///
/// ```rust
/// use weft_di::{ContainerBuilder, Module, Provider, Token};
///
/// let port = Token::<u16>::new("port");
/// let network = Module::new("network")
///     .provider(Provider::value(&port, 8080))
///     .export(&port);
///
/// let container = futures::executor::block_on(
///     ContainerBuilder::new().register_module(network).build(),
/// )
/// .unwrap();
///
/// assert_eq!(*container.get(&port).unwrap(), 8080);
/// ```
pub struct ContainerBuilder {
    /// Root modules, imports are collected during the build
    pub(crate) modules: Vec<Arc<Module>>,
    /// Providers registered outside of any module
    pub(crate) providers: Vec<Provider>,
    pub(crate) registry: TokenRegistry,
}
impl Default for ContainerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ContainerBuilder {
    pub fn new() -> Self {
        Self::with_registry(TokenRegistry::new())
    }

    /// Starts from a registry whose tokens were created up front
    ///
    /// Providers binding one of its names to another type fail the build.
    pub fn with_registry(registry: TokenRegistry) -> Self {
        ContainerBuilder {
            modules: Vec::new(),
            providers: Vec::new(),
            registry,
        }
    }
}
impl ContainerBuilder {
    pub fn register_module(mut self, module: impl Into<Arc<Module>>) -> Self {
        self.modules.push(module.into());
        self
    }

    /// Registers a floating provider, visible to every module
    pub fn register_provider(mut self, provider: impl Into<Provider>) -> Self {
        self.providers.push(provider.into());
        self
    }

    pub fn add_instance<T: Injectable>(self, token: &Token<T>, instance: T) -> Self {
        self.register_provider(Provider::value(token, instance))
    }

    pub fn modules(&self) -> &[Arc<Module>] {
        &self.modules
    }

    pub fn providers(&self) -> &[Provider] {
        &self.providers
    }

    /// Validates the registrations and instantiates every provider
    ///
    /// Can be called repeatedly, every call yields an independent container. Deferred module
    /// providers are loaded again per call.
    pub async fn build(&self) -> Result<Container, BuildError> {
        DiInitiator::new(self.registry.clone())
            .initiate(self)
            .await
    }
}

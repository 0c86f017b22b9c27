use std::{fmt::Debug, future::Future, sync::Arc};

use futures::future::BoxFuture;

use crate::{
    provider::Provider,
    token::{Token, TokenId},
    types::DynError,
};

type DeferredFuture = BoxFuture<'static, Result<Vec<Provider>, DynError>>;
type DeferredFn = Box<dyn Fn() -> DeferredFuture + Send + Sync>;

/// A named group of providers
///
/// A module sees its own tokens and the exports of the modules it imports directly. Exports are
/// not transitive: a token exported by an import reaches further importers only when the module
/// exports it again.
///
/// Modules are identified by their allocation: importing the same `Arc<Module>` from several
/// places (a diamond) materializes its providers once.
pub struct Module {
    name: String,
    providers: Vec<Provider>,
    deferred: Vec<DeferredFn>,
    imports: Vec<Arc<Module>>,
    exports: Vec<TokenId>,
}

impl Module {
    pub fn new(name: impl Into<String>) -> Self {
        Module {
            name: name.into(),
            providers: Vec::new(),
            deferred: Vec::new(),
            imports: Vec::new(),
            exports: Vec::new(),
        }
    }

    /// A module whose providers are produced when the container is built
    pub fn deferred<F, Fut>(name: impl Into<String>, providers: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Vec<Provider>, DynError>> + Send + 'static,
    {
        Self::new(name).defer(providers)
    }

    /// Adds a deferred provider list, loaded once per build
    pub fn defer<F, Fut>(mut self, providers: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Vec<Provider>, DynError>> + Send + 'static,
    {
        self.deferred.push(Box::new(
            move || -> BoxFuture<'static, Result<Vec<Provider>, DynError>> {
                Box::pin(providers())
            },
        ));
        self
    }

    pub fn provider(mut self, provider: impl Into<Provider>) -> Self {
        self.providers.push(provider.into());
        self
    }

    pub fn import(mut self, module: impl Into<Arc<Module>>) -> Self {
        self.imports.push(module.into());
        self
    }

    pub fn export<T: ?Sized>(self, token: &Token<T>) -> Self {
        self.export_id(token.id().clone())
    }

    pub fn export_id(mut self, token: impl Into<TokenId>) -> Self {
        self.exports.push(token.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn providers(&self) -> &[Provider] {
        &self.providers
    }

    pub fn imports(&self) -> &[Arc<Module>] {
        &self.imports
    }

    pub fn exports(&self) -> &[TokenId] {
        &self.exports
    }

    pub fn is_exported(&self, token: &TokenId) -> bool {
        self.exports.contains(token)
    }

    /// Loads all deferred provider lists, in the order they were added
    pub(crate) async fn load_deferred(&self) -> Result<Vec<Provider>, DynError> {
        let mut loaded = Vec::new();
        for deferred in &self.deferred {
            loaded.extend(deferred().await?);
        }
        Ok(loaded)
    }
}

impl Debug for Module {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Module")
            .field("name", &self.name)
            .field("providers", &self.providers)
            .field("deferred", &self.deferred.len())
            .field(
                "imports",
                &self.imports.iter().map(|m| m.name()).collect::<Vec<_>>(),
            )
            .field("exports", &self.exports)
            .finish()
    }
}

/// Identity of a module, by allocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct ModuleId(usize);

impl ModuleId {
    pub(crate) fn of(module: &Arc<Module>) -> Self {
        ModuleId(Arc::as_ptr(module) as usize)
    }
}

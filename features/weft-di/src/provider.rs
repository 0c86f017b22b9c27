//! Providers are recipes producing the instance bound to a token.
//!
//! Three declaration styles exist and are normalized into the same record: a token, the
//! dependency tokens (declared up front) and one construction step which runs once all
//! dependencies have been built.
//!
//! - [`Provider::value`] binds an existing value
//! - [`Provider::factory`] invokes an async function with the resolved dependencies
//! - [`Provider::class`] constructs a [`Class`] and binds its lifecycle hooks

use std::{fmt::Debug, future::Future, sync::Arc};

use futures::future::BoxFuture;

use crate::{
    errors::HookBindingError,
    lifecycle::{bind_hooks, HookNames, Hookable, LifecycleHooks},
    resolver::Args,
    token::{Dependency, Token, TokenId},
    types::{DynError, Injectable, Instance, TypeInfo},
};

/// A type the container can construct from positional arguments
///
/// The dependency tokens are declared on the provider, the constructor pulls them in the same
/// order with [`Args::next`].
pub trait Class: Hookable {
    fn construct(args: Args) -> impl Future<Output = Result<Self, DynError>> + Send;
}

/// Output of a provider's construction step
pub(crate) struct Constructed {
    pub instance: Instance,
    pub hooks: LifecycleHooks,
}

pub(crate) enum ConstructError {
    Provider(DynError),
    HookBinding(HookBindingError),
}

type ConstructFuture = BoxFuture<'static, Result<Constructed, ConstructError>>;
type FactoryFn = Box<dyn Fn(Args) -> BoxFuture<'static, Result<Instance, DynError>> + Send + Sync>;
type ClassFn = Box<dyn Fn(Args, &HookNames) -> ConstructFuture + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Value,
    Factory,
    Class,
}

/// A recipe for the instance bound to one token
pub enum Provider {
    Value(ValueProvider),
    Factory(FactoryProvider),
    Class(ClassProvider),
}

impl Provider {
    /// Binds a fixed value
    pub fn value<T: Injectable>(token: &Token<T>, value: T) -> ValueProvider {
        Self::shared(token, Arc::new(value))
    }

    /// Binds an already shared value
    pub fn shared<T: Injectable>(token: &Token<T>, value: Arc<T>) -> ValueProvider {
        ValueProvider {
            token: token.id().clone(),
            instance: Instance::from_arc(value),
        }
    }

    /// Binds the result of an async factory
    ///
    /// ```rust
    /// use std::sync::Arc;
    /// use weft_di::{DynError, Provider, Token};
    ///
    /// let host = Token::<String>::new("host");
    /// let url = Token::<String>::new("url");
    ///
    /// let provider = Provider::factory(&url, |mut args| async move {
    ///     let host: Arc<String> = args.next()?;
    ///     Ok::<_, DynError>(format!("https://{host}"))
    /// })
    /// .inject(&host);
    /// ```
    pub fn factory<T, F, Fut, E>(token: &Token<T>, factory: F) -> FactoryProvider
    where
        T: Injectable,
        F: Fn(Args) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        E: Into<DynError>,
    {
        FactoryProvider {
            token: token.id().clone(),
            supplies: TypeInfo::of::<T>(),
            dependencies: Vec::new(),
            factory: Box::new(move |args: Args| -> BoxFuture<'static, Result<Instance, DynError>> {
                let construction_fut = factory(args);
                Box::pin(async move {
                    construction_fut
                        .await
                        .map(Instance::new)
                        .map_err(|e| -> DynError { e.into() })
                })
            }),
        }
    }

    /// Binds a [`Class`], starting with the hooks the class declares itself
    pub fn class<T: Class>(token: &Token<T>) -> ClassProvider {
        ClassProvider {
            token: token.id().clone(),
            supplies: TypeInfo::of::<T>(),
            dependencies: Vec::new(),
            hooks: T::lifecycle(),
            construct: Box::new(|args: Args, names: &HookNames| -> ConstructFuture {
                let names = names.clone();
                Box::pin(async move {
                    let value = T::construct(args)
                        .await
                        .map_err(ConstructError::Provider)?;
                    let value = Arc::new(value);
                    let hooks =
                        bind_hooks(value.clone(), &names).map_err(ConstructError::HookBinding)?;

                    Ok::<_, ConstructError>(Constructed {
                        instance: Instance::from_arc(value),
                        hooks,
                    })
                })
            }),
        }
    }

    pub fn token(&self) -> &TokenId {
        match self {
            Provider::Value(value) => &value.token,
            Provider::Factory(factory) => &factory.token,
            Provider::Class(class) => &class.token,
        }
    }

    /// Type of the produced instance
    pub fn supplies(&self) -> TypeInfo {
        match self {
            Provider::Value(value) => value.instance.info,
            Provider::Factory(factory) => factory.supplies,
            Provider::Class(class) => class.supplies,
        }
    }

    /// Dependencies in positional order
    pub fn dependencies(&self) -> &[Dependency] {
        match self {
            Provider::Value(_) => &[],
            Provider::Factory(factory) => &factory.dependencies,
            Provider::Class(class) => &class.dependencies,
        }
    }

    pub fn kind(&self) -> ProviderKind {
        match self {
            Provider::Value(_) => ProviderKind::Value,
            Provider::Factory(_) => ProviderKind::Factory,
            Provider::Class(_) => ProviderKind::Class,
        }
    }

    /// Declared lifecycle hook names, only class providers carry them
    pub fn hook_names(&self) -> Option<&HookNames> {
        match self {
            Provider::Class(class) => Some(&class.hooks),
            _ => None,
        }
    }

    /// Runs the construction step with the resolved dependencies
    pub(crate) fn construct(&self, args: Args) -> ConstructFuture {
        match self {
            Provider::Value(value) => {
                let instance = value.instance.clone();
                Box::pin(async move {
                    Ok::<_, ConstructError>(Constructed {
                        instance,
                        hooks: LifecycleHooks::none(),
                    })
                })
            }
            Provider::Factory(factory) => {
                let construction_fut = (factory.factory)(args);
                Box::pin(async move {
                    let instance = construction_fut.await.map_err(ConstructError::Provider)?;
                    Ok::<_, ConstructError>(Constructed {
                        instance,
                        hooks: LifecycleHooks::none(),
                    })
                })
            }
            Provider::Class(class) => (class.construct)(args, &class.hooks),
        }
    }
}

impl Debug for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Provider")
            .field("kind", &self.kind())
            .field("token", self.token())
            .field("supplies", &self.supplies().type_name)
            .field(
                "dependencies",
                &self
                    .dependencies()
                    .iter()
                    .map(|dependency| &dependency.token)
                    .collect::<Vec<_>>(),
            )
            .field("hooks", &self.hook_names())
            .finish()
    }
}

/// Provider of a fixed value
pub struct ValueProvider {
    token: TokenId,
    instance: Instance,
}
impl ValueProvider {
    /// Binds an already type erased instance
    pub fn from_instance(token: impl Into<TokenId>, instance: Instance) -> Self {
        ValueProvider {
            token: token.into(),
            instance,
        }
    }
}

/// Provider invoking a factory function
pub struct FactoryProvider {
    token: TokenId,
    supplies: TypeInfo,
    dependencies: Vec<Dependency>,
    factory: FactoryFn,
}
impl FactoryProvider {
    /// Appends a required positional dependency
    pub fn inject<U: Injectable>(self, token: &Token<U>) -> Self {
        self.depends_on(token.dependency())
    }

    /// Appends a positional dependency which may be missing
    pub fn inject_optional<U: Injectable>(self, token: &Token<U>) -> Self {
        self.depends_on(token.optional())
    }

    pub fn depends_on(mut self, dependency: Dependency) -> Self {
        self.dependencies.push(dependency);
        self
    }
}

/// Provider constructing a [`Class`]
pub struct ClassProvider {
    token: TokenId,
    supplies: TypeInfo,
    dependencies: Vec<Dependency>,
    hooks: HookNames,
    construct: ClassFn,
}
impl ClassProvider {
    /// Appends a required positional dependency
    pub fn inject<U: Injectable>(self, token: &Token<U>) -> Self {
        self.depends_on(token.dependency())
    }

    /// Appends a positional dependency which may be missing
    pub fn inject_optional<U: Injectable>(self, token: &Token<U>) -> Self {
        self.depends_on(token.optional())
    }

    pub fn depends_on(mut self, dependency: Dependency) -> Self {
        self.dependencies.push(dependency);
        self
    }

    /// Adds a hook which runs on `init()`
    pub fn on_init(mut self, hook: &'static str) -> Self {
        self.hooks.on_init.push(hook.into());
        self
    }

    /// Adds a hook which runs on `destroy()`
    pub fn on_destroy(mut self, hook: &'static str) -> Self {
        self.hooks.on_destroy.push(hook.into());
        self
    }
}

impl From<ValueProvider> for Provider {
    fn from(provider: ValueProvider) -> Self {
        Provider::Value(provider)
    }
}
impl From<FactoryProvider> for Provider {
    fn from(provider: FactoryProvider) -> Self {
        Provider::Factory(provider)
    }
}
impl From<ClassProvider> for Provider {
    fn from(provider: ClassProvider) -> Self {
        Provider::Class(provider)
    }
}

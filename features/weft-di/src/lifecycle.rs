//! Lifecycle hooks
//!
//! Types opt into hooks by implementing [`Hookable`], which maps hook names to methods.
//! Providers declare which names run on init and on destroy ([`HookNames`]); after construction
//! the names are bound to the concrete instance, producing [`LifecycleHooks`].
//!
//! ```rust
//! use std::sync::Arc;
//! use weft_di::lifecycle::{bind_hooks, HookFuture, HookMethod, HookNames, Hookable};
//!
//! struct Pool;
//! impl Pool {
//!     fn connect(&self) -> HookFuture<'_> {
//!         Box::pin(async { Ok(()) })
//!     }
//! }
//! impl Hookable for Pool {
//!     fn hook(name: &str) -> Option<HookMethod<Self>> {
//!         match name {
//!             "connect" => Some(Pool::connect),
//!             _ => None,
//!         }
//!     }
//! }
//!
//! let hooks = bind_hooks(Arc::new(Pool), &HookNames::new().on_init("connect")).unwrap();
//! futures::executor::block_on(hooks.run_init()).unwrap();
//! ```

use std::{any::type_name, borrow::Cow, fmt::Debug, sync::Arc};

use futures::future::BoxFuture;

use crate::{
    errors::{HookBindingError, HookError},
    types::{DynError, Injectable},
};

pub type HookResult = Result<(), DynError>;
pub type HookFuture<'a> = BoxFuture<'a, HookResult>;

/// A lifecycle method of `T`
pub type HookMethod<T> = for<'a> fn(&'a T) -> HookFuture<'a>;

/// Capability of types exposing named lifecycle methods
pub trait Hookable: Injectable + Sized {
    /// Hooks every class provider of this type runs, unless the provider adds more
    fn lifecycle() -> HookNames {
        HookNames::default()
    }

    /// Resolves a hook name to the method implementing it
    fn hook(name: &str) -> Option<HookMethod<Self>>;
}

/// Names of the hooks to run, in declaration order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HookNames {
    pub on_init: Vec<Cow<'static, str>>,
    pub on_destroy: Vec<Cow<'static, str>>,
}

impl HookNames {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_init(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.on_init.push(name.into());
        self
    }

    pub fn on_destroy(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.on_destroy.push(name.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.on_init.is_empty() && self.on_destroy.is_empty()
    }
}

/// A hook bound to its instance
pub struct BoundHook {
    name: Cow<'static, str>,
    run: Box<dyn Fn() -> HookFuture<'static> + Send + Sync>,
}

impl BoundHook {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call(&self) -> HookFuture<'static> {
        (self.run)()
    }
}

impl Debug for BoundHook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("BoundHook").field(&self.name).finish()
    }
}

/// Init and destroy hooks of one instance
#[derive(Debug, Default)]
pub struct LifecycleHooks {
    on_init: Vec<BoundHook>,
    on_destroy: Vec<BoundHook>,
}

impl LifecycleHooks {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn on_init(&self) -> &[BoundHook] {
        &self.on_init
    }

    pub fn on_destroy(&self) -> &[BoundHook] {
        &self.on_destroy
    }

    pub fn is_empty(&self) -> bool {
        self.on_init.is_empty() && self.on_destroy.is_empty()
    }

    /// Runs all init hooks in order, stopping at the first failure
    pub async fn run_init(&self) -> Result<(), HookError> {
        run_all(&self.on_init).await
    }

    /// Runs all destroy hooks in order, stopping at the first failure
    pub async fn run_destroy(&self) -> Result<(), HookError> {
        run_all(&self.on_destroy).await
    }
}

async fn run_all(hooks: &[BoundHook]) -> Result<(), HookError> {
    for hook in hooks {
        tracing::trace!("Running hook {}", hook.name());
        hook.call().await.map_err(|error| HookError {
            hook: hook.name().to_string(),
            error,
        })?;
    }
    Ok(())
}

/// Binds the declared hook names to an instance
///
/// Works for instances created outside a container just as well, e.g. in tests.
pub fn bind_hooks<T: Hookable>(
    instance: Arc<T>,
    names: &HookNames,
) -> Result<LifecycleHooks, HookBindingError> {
    let bind = |name: &Cow<'static, str>| -> Result<BoundHook, HookBindingError> {
        let method = T::hook(name).ok_or_else(|| HookBindingError {
            hook: name.to_string(),
            type_name: type_name::<T>(),
        })?;

        let instance = instance.clone();
        Ok(BoundHook {
            name: name.clone(),
            run: Box::new(move || -> HookFuture<'static> {
                let instance = instance.clone();
                Box::pin(async move { method(&instance).await })
            }),
        })
    };

    Ok(LifecycleHooks {
        on_init: names.on_init.iter().map(&bind).collect::<Result<_, _>>()?,
        on_destroy: names.on_destroy.iter().map(&bind).collect::<Result<_, _>>()?,
    })
}

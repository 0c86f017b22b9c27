//! Weft DI wires an application out of typed tokens, providers and modules.
//!
//! Using it happens in three steps:
//! 1. Register modules and floating providers on a [`ContainerBuilder`]
//! 2. `build()` validates the whole registration (missing tokens, visibility, types, cycles) and
//!    instantiates every provider exactly once, dependencies first
//! 3. The resulting [`Container`] hands out instances, runs lifecycle hooks and exports its
//!    dependency graph
//!
//! ```rust
//! use std::sync::Arc;
//! use weft_di::{ContainerBuilder, DynError, Module, Provider, Token};
//!
//! let greeting = Token::<String>::new("greeting");
//! let message = Token::<String>::new("message");
//!
//! let text = Module::new("text")
//!     .provider(Provider::value(&greeting, "hello".to_string()))
//!     .export(&greeting);
//! let app = Module::new("app").import(text).provider(
//!     Provider::factory(&message, |mut args| async move {
//!         let greeting: Arc<String> = args.next()?;
//!         Ok::<_, DynError>(format!("{greeting} world"))
//!     })
//!     .inject(&greeting),
//! );
//!
//! let container = futures::executor::block_on(
//!     ContainerBuilder::new().register_module(app).build(),
//! )
//! .unwrap();
//! assert_eq!(*container.get(&message).unwrap(), "hello world");
//! ```

pub mod builder;
pub mod container;
pub mod dag;
mod dependency_graph;
pub mod errors;
mod initiator;
pub mod lifecycle;
pub mod module;
pub mod provider;
pub mod resolver;
pub mod token;
pub mod types;
mod visibility;

pub use builder::ContainerBuilder;
pub use container::{Container, LifecycleState};
pub use dag::{GraphSnapshot, NodeRef};
pub use lifecycle::{bind_hooks, HookFuture, HookMethod, HookNames, Hookable, LifecycleHooks};
pub use module::Module;
pub use provider::{Class, Provider};
pub use resolver::{Args, Resolver};
pub use token::{Token, TokenId, TokenRegistry};
pub use types::{DynError, Injectable, Instance, TypeInfo};

use std::{any::TypeId, collections::HashMap, sync::Arc};

use weft_di::{
    provider::ValueProvider,
    types::{Injectable, Instance, TypeInfo},
    Module, Token,
};

use crate::errors::ConfigError;

/// Name of the module produced by [`ConfigProvider::into_module`]
pub const CONFIG_MODULE: &str = "config";

/// A provider to register all configs.
///
/// Configs can be registered and retrieved based on type. Each config type is bound to its own
/// token, see [`ConfigProvider::token`].
#[derive(Debug, Default, Clone)]
pub struct ConfigProvider {
    configs: Vec<Instance>,
    index: HashMap<TypeId, usize>,
}

impl ConfigProvider {
    /// Initializes an empty Config Provider
    pub fn new() -> Self {
        Self::default()
    }

    /// Token the config of type `T` is bound to, `config::<type name>`
    pub fn token<T: Injectable>() -> Token<T> {
        Token::new(format!("config::{}", std::any::type_name::<T>()))
    }

    /// Retrieve a config with specified type.
    ///
    /// If the config type is not available, it will return [`ConfigError::Missing`]
    pub fn get_config<T: Injectable>(&self) -> Result<Arc<T>, ConfigError> {
        let missing = || ConfigError::Missing(TypeInfo::of::<T>());

        let index = self.index.get(&TypeId::of::<T>()).ok_or_else(missing)?;
        self.configs[*index].downcast().map_err(|_| missing())
    }

    /// Add a config to the registry.
    ///
    /// If the config type is already registered, it will return
    /// [`ConfigError::AlreadyRegistered`]
    pub fn add_config<T: Injectable>(&mut self, config: T) -> Result<&mut Self, ConfigError> {
        let info = TypeInfo::of::<T>();
        if self.index.contains_key(&info.type_id) {
            return Err(ConfigError::AlreadyRegistered(info));
        }

        tracing::debug!("Registered config '{info}'");
        self.index.insert(info.type_id, self.configs.len());
        self.configs.push(Instance::new(config));
        Ok(self)
    }

    /// Can optionally add a config to the registry.
    ///
    /// If the config provided is `Some(T)`, it will be the same as calling
    /// [`ConfigProvider::add_config`]
    /// If the config provided is `None`, then the function just returns `Ok(self)` for chaining
    pub fn maybe_add_config<T: Injectable>(
        &mut self,
        config: Option<T>,
    ) -> Result<&mut Self, ConfigError> {
        match config {
            Some(c) => self.add_config(c),
            None => Ok(self),
        }
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }

    /// A module named `config` exporting every registered config under its token
    ///
    /// Modules importing it can inject configs like any other dependency.
    pub fn into_module(self) -> Module {
        self.configs
            .into_iter()
            .fold(Module::new(CONFIG_MODULE), |module, config| {
                let token = format!("config::{}", config.info.type_name);
                module
                    .provider(ValueProvider::from_instance(token.as_str(), config))
                    .export_id(token)
            })
    }
}

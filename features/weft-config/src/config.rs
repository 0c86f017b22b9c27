use std::{ops::Deref, sync::Arc};

use weft_di::{
    errors::InjectError,
    resolver::{ResolvedArgument, Resolver},
    token::Dependency,
    types::Injectable,
};

use crate::provider::ConfigProvider;

/// A wrapper type to allow for config injections
///
/// Declare the dependency with [`Config::dependency`] and pull it from the arguments like any
/// other positional argument.
///
/// # Example
/// ```rust
/// use weft_config::{config::Config, provider::ConfigProvider};
/// use weft_di::{ContainerBuilder, DynError, Module, Provider, Token};
///
/// struct ServerConfig {
///     port: u16,
/// }
///
/// let mut configs = ConfigProvider::new();
/// configs.add_config(ServerConfig { port: 8080 }).unwrap();
///
/// let address = Token::<String>::new("address");
/// let server = Module::new("server").import(configs.into_module()).provider(
///     Provider::factory(&address, |mut args| async move {
///         let config: Config<ServerConfig> = args.next()?;
///         Ok::<_, DynError>(format!("0.0.0.0:{}", config.port))
///     })
///     .depends_on(Config::<ServerConfig>::dependency()),
/// );
///
/// let builder = ContainerBuilder::new().register_module(server);
/// let container = futures::executor::block_on(builder.build()).unwrap();
/// assert_eq!(*container.get(&address).unwrap(), "0.0.0.0:8080");
/// ```
pub struct Config<T> {
    inner: Arc<T>,
}
impl<T> Deref for Config<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}
impl<T> Config<T> {
    pub fn inner(&self) -> Arc<T> {
        self.inner.clone()
    }

    pub fn into_inner(self) -> Arc<T> {
        self.inner
    }
}
impl<T: Injectable> Config<T> {
    /// Dependency on the config token of `T`
    pub fn dependency() -> Dependency {
        ConfigProvider::token::<T>().dependency()
    }
}

impl<T: Injectable> Resolver for Config<T> {
    fn resolve(argument: ResolvedArgument) -> Result<Self, InjectError> {
        Ok(Config {
            inner: Arc::<T>::resolve(argument)?,
        })
    }
}

use thiserror::Error;

use crate::{
    token::TokenId,
    types::{DynError, TypeInfo},
};

/// Errors while building the container
///
/// All of them are structural and detected before any caller obtains an instance.
#[derive(Error, Debug)]
pub enum BuildError {
    /// A provider depends on a token nothing provides
    #[error("'{required_by}' depends on '{token}' but it is missing")]
    UnresolvedDependency { token: TokenId, required_by: TokenId },

    /// The token exists but is not exported to the requesting module
    #[error("'{required_by}' in {} depends on '{token}' which is not visible there - export it from an imported module", scope(module))]
    TokenNotVisible {
        token: TokenId,
        module: Option<String>,
        required_by: TokenId,
    },

    /// The dependency relation contains a cycle, `path` starts and ends with the same token
    #[error("A Circular Dependency exists: {}", format_path(path))]
    CyclicDependency { path: Vec<TokenId> },

    /// Two providers bound to the same token
    #[error("'{token}' has been registered twice: by {} and by {}", scope(first), scope(second))]
    DuplicateTokenRegistration {
        token: TokenId,
        first: Option<String>,
        second: Option<String>,
    },

    /// A module exports a token it neither provides nor receives from an import
    #[error("Module '{module}' exports '{token}' but neither provides nor imports it")]
    InvalidExport { token: TokenId, module: String },

    /// A token is bound to a different type than a dependent or the registry expects
    #[error("'{token}' provides '{actual}' but '{expected}' was expected")]
    TypeMismatch {
        token: TokenId,
        expected: TypeInfo,
        actual: TypeInfo,
    },

    /// A provider failed to construct its instance
    #[error("Provider for '{token}' failed - error: {error}")]
    ProviderFailed {
        token: TokenId,
        #[source]
        error: DynError,
    },

    /// A deferred provider list of a module failed to load
    #[error("Providers of module '{module}' failed to load - error: {error}")]
    ModuleProvidersFailed {
        module: String,
        #[source]
        error: DynError,
    },

    /// A declared lifecycle hook could not be bound to the constructed instance
    #[error("Hooks of '{token}' could not be bound: {source}")]
    HookBinding {
        token: TokenId,
        #[source]
        source: HookBindingError,
    },
}

fn scope(module: &Option<String>) -> String {
    match module {
        Some(module) => format!("module '{module}'"),
        None => "the floating scope".to_string(),
    }
}

fn format_path(path: &[TokenId]) -> String {
    path.iter()
        .map(TokenId::name)
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Errors when trying to get an instance out of a built container
#[derive(Error, Debug, Clone)]
pub enum RequireError {
    /// The token was never registered
    #[error("No instance for '{0}' exists")]
    InstanceNotFound(TokenId),

    #[error("Failed to downcast, required: '{required_type}' actual: '{actual_type}'")]
    DowncastFailed {
        required_type: &'static str,
        actual_type: &'static str,
    },

    /// All instances are invalid after destruction
    #[error("The container has been destroyed")]
    ContainerDestroyed,
}

/// Errors a constructor sees while pulling its positional arguments
#[derive(Error, Debug, Clone)]
pub enum InjectError {
    /// More arguments were pulled than dependencies were declared
    #[error("Argument {position} was requested but not declared as dependency")]
    MissingArgument { position: usize },

    #[error(transparent)]
    Require(#[from] RequireError),
}

/// A declared lifecycle hook name does not resolve to a method
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("'{hook}' is not a lifecycle hook of '{type_name}'")]
pub struct HookBindingError {
    pub hook: String,
    pub type_name: &'static str,
}

/// A lifecycle hook returned an error
#[derive(Error, Debug)]
#[error("Hook '{hook}' failed - error: {error}")]
pub struct HookError {
    pub hook: String,
    #[source]
    pub error: DynError,
}

/// Errors while running container lifecycle
#[derive(Error, Debug)]
pub enum LifecycleError {
    #[error("The container has already been initialized")]
    AlreadyInitialized,

    #[error("The container has already been destroyed")]
    AlreadyDestroyed,

    #[error("Another lifecycle operation is running on the container")]
    InProgress,

    /// A previous lifecycle operation failed, the container must be discarded
    #[error("A previous lifecycle operation failed, the container is unusable")]
    Poisoned,

    #[error("Lifecycle hook of '{token}' failed: {source}")]
    HookFailed {
        token: TokenId,
        #[source]
        source: HookError,
    },
}

/// Errors of the explicit token registry
#[derive(Error, Debug, Clone)]
pub enum TokenRegistryError {
    #[error("'{token}' is already bound to '{registered}', cannot rebind it to '{requested}'")]
    Conflict {
        token: TokenId,
        registered: TypeInfo,
        requested: TypeInfo,
    },
}

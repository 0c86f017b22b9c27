use weft_di::types::TypeInfo;

/// Errors of the config registry
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The config type has been added before
    #[error("Config '{0}' is already registered")]
    AlreadyRegistered(TypeInfo),

    /// The required config type is not known
    #[error("Config '{0}' is not registered")]
    Missing(TypeInfo),
}

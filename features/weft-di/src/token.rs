//! Tokens name the capabilities providers bind to.
//!
//! A [`Token<T>`] pairs a human readable name with a compile-time type tag. The name alone is
//! the identity: two tokens with the same name are the same binding point, regardless of where
//! they were created.

use std::{
    borrow::Borrow,
    collections::{hash_map::Entry, HashMap},
    fmt::{Debug, Display},
    hash::Hash,
    marker::PhantomData,
    sync::Arc,
};

use crate::{
    errors::TokenRegistryError,
    types::{Injectable, TypeInfo},
};

/// Untyped token identity, used as key of the graph
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TokenId(Arc<str>);

impl TokenId {
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        TokenId(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}
impl Borrow<str> for TokenId {
    fn borrow(&self) -> &str {
        &self.0
    }
}
impl AsRef<str> for TokenId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
impl Display for TokenId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
impl Debug for TokenId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Debug::fmt(&*self.0, f)
    }
}
impl From<&str> for TokenId {
    fn from(name: &str) -> Self {
        TokenId::new(name)
    }
}
impl From<String> for TokenId {
    fn from(name: String) -> Self {
        TokenId::new(name)
    }
}
impl<T: ?Sized> From<&Token<T>> for TokenId {
    fn from(token: &Token<T>) -> Self {
        token.id.clone()
    }
}

/// Typed token for a capability of type `T`
pub struct Token<T: ?Sized> {
    id: TokenId,
    _type: PhantomData<fn() -> T>,
}

impl<T: ?Sized> Token<T> {
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Token {
            id: TokenId::new(name),
            _type: PhantomData,
        }
    }

    pub fn id(&self) -> &TokenId {
        &self.id
    }

    pub fn name(&self) -> &str {
        self.id.name()
    }
}

impl<T: Injectable> Token<T> {
    /// Declares a required dependency on this token
    pub fn dependency(&self) -> Dependency {
        Dependency {
            token: self.id.clone(),
            type_info: TypeInfo::of::<T>(),
            optional: false,
        }
    }

    /// Declares a dependency which resolves to nothing if no provider exists
    pub fn optional(&self) -> Dependency {
        Dependency {
            optional: true,
            ..self.dependency()
        }
    }
}

impl<T: ?Sized> Clone for Token<T> {
    fn clone(&self) -> Self {
        Token {
            id: self.id.clone(),
            _type: PhantomData,
        }
    }
}
impl<T: ?Sized> PartialEq for Token<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}
impl<T: ?Sized> Eq for Token<T> {}
impl<T: ?Sized> Hash for Token<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state)
    }
}
impl<T: ?Sized> Debug for Token<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Token").field(&self.id).finish()
    }
}
impl<T: ?Sized> Display for Token<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.id, f)
    }
}

/// Information about a provider dependency
#[derive(Debug, Clone)]
pub struct Dependency {
    /// The required token
    pub token: TokenId,
    /// The type the dependent expects behind the token
    pub type_info: TypeInfo,
    /// If it is optional or required
    pub optional: bool,
}

/// Explicit record of which type is bound to each token name.
///
/// Tokens can be created anywhere, the registry is only needed when names are generated at
/// runtime and must not collide. The builder records every provider token into its registry,
/// and the built container keeps it for introspection.
#[derive(Debug, Clone, Default)]
pub struct TokenRegistry {
    tokens: HashMap<TokenId, TypeInfo>,
}

impl TokenRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a token, failing if the name is already bound to another type
    pub fn token<T: Injectable>(
        &mut self,
        name: impl Into<Arc<str>>,
    ) -> Result<Token<T>, TokenRegistryError> {
        let token = Token::<T>::new(name);
        self.record(token.id(), TypeInfo::of::<T>())?;
        Ok(token)
    }

    pub(crate) fn record(
        &mut self,
        id: &TokenId,
        info: TypeInfo,
    ) -> Result<(), TokenRegistryError> {
        match self.tokens.entry(id.clone()) {
            Entry::Occupied(existing) if existing.get().type_id != info.type_id => {
                Err(TokenRegistryError::Conflict {
                    token: id.clone(),
                    registered: *existing.get(),
                    requested: info,
                })
            }
            Entry::Occupied(_) => Ok(()),
            Entry::Vacant(slot) => {
                slot.insert(info);
                Ok(())
            }
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tokens.contains_key(name)
    }

    pub fn type_of(&self, name: &str) -> Option<TypeInfo> {
        self.tokens.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// All known tokens, sorted by name
    pub fn tokens(&self) -> Vec<&TokenId> {
        let mut tokens: Vec<_> = self.tokens.keys().collect();
        tokens.sort();
        tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_compare_by_name() {
        let a = Token::<String>::new("greeting");
        let b = Token::<String>::new(String::from("greeting"));

        assert_eq!(a, b);
        assert_eq!(a.id(), &TokenId::from("greeting"));
        assert_ne!(a, Token::new("farewell"));
    }

    #[test]
    fn registry_rejects_name_reuse_with_other_type() {
        let mut registry = TokenRegistry::new();
        registry.token::<u32>("port").unwrap();
        // Same type is the same binding point
        registry.token::<u32>("port").unwrap();

        let err = registry.token::<String>("port").unwrap_err();
        assert!(matches!(
            err,
            TokenRegistryError::Conflict { ref token, .. } if token.name() == "port"
        ));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.type_of("port"), Some(TypeInfo::of::<u32>()));
    }

    #[test]
    fn optional_dependency_keeps_type() {
        let token = Token::<u8>::new("byte");
        let dependency = token.optional();

        assert!(dependency.optional);
        assert_eq!(dependency.type_info, TypeInfo::of::<u8>());
        assert_eq!(dependency.token.name(), "byte");
    }
}

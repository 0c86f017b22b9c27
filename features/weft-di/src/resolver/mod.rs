use std::collections::VecDeque;

use crate::{errors::InjectError, token::Dependency, types::Instance};

pub mod arc;

/// Allows custom behaviour on injection
///
/// Implemented for `Arc<T>` (required), `Option<R>` (optional) and the erased [`Instance`].
pub trait Resolver: Sized {
    fn resolve(argument: ResolvedArgument) -> Result<Self, InjectError>;
}

/// One positional argument as handed to a constructor
#[derive(Debug, Clone)]
pub struct ResolvedArgument {
    /// The declared dependency
    pub dependency: Dependency,
    /// The instance, `None` when an optional dependency has no provider
    pub instance: Option<Instance>,
}

/// Positional arguments of a provider, in the order the dependencies were declared
#[derive(Debug)]
pub struct Args {
    arguments: VecDeque<ResolvedArgument>,
    position: usize,
}

impl Args {
    pub(crate) fn new(arguments: Vec<ResolvedArgument>) -> Self {
        Args {
            arguments: arguments.into(),
            position: 0,
        }
    }

    /// Takes the next positional argument
    pub fn next<R: Resolver>(&mut self) -> Result<R, InjectError> {
        let argument = self
            .arguments
            .pop_front()
            .ok_or(InjectError::MissingArgument {
                position: self.position,
            })?;
        self.position += 1;

        R::resolve(argument)
    }

    /// Number of arguments not yet taken
    pub fn len(&self) -> usize {
        self.arguments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arguments.is_empty()
    }
}

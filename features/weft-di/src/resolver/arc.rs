use std::{any::type_name, sync::Arc};

use crate::{
    errors::{InjectError, RequireError},
    resolver::{ResolvedArgument, Resolver},
    types::{Injectable, Instance},
};

impl<T: Injectable> Resolver for Arc<T> {
    fn resolve(argument: ResolvedArgument) -> Result<Self, InjectError> {
        let resolved = Instance::resolve(argument)?;
        let downcasted = resolved
            .downcast::<T>()
            .map_err(|e| RequireError::DowncastFailed {
                required_type: type_name::<T>(),
                actual_type: e,
            })?;

        Ok(downcasted)
    }
}

impl Resolver for Instance {
    fn resolve(argument: ResolvedArgument) -> Result<Self, InjectError> {
        argument
            .instance
            .ok_or_else(|| RequireError::InstanceNotFound(argument.dependency.token).into())
    }
}

impl<Resolvable: Resolver> Resolver for Option<Resolvable> {
    fn resolve(argument: ResolvedArgument) -> Result<Self, InjectError> {
        match Resolvable::resolve(argument) {
            Ok(resolved) => Ok(Some(resolved)),
            Err(e) => match e {
                // If the optional dependency has no provider Option does not fail
                InjectError::Require(RequireError::InstanceNotFound(_)) => Ok(None),
                _ => Err(e),
            },
        }
    }
}

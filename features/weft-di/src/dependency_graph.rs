use std::collections::HashMap;

use crate::{
    errors::BuildError,
    provider::Provider,
    token::TokenId,
    visibility::{Scope, Visibility},
};

/// Dependency relation of all registered providers, before anything is instantiated
///
/// Used to reject invalid configurations and to compute the instantiation order
pub(crate) struct DependencyGraph<'p> {
    entries: Vec<DependencyGraphEntry<'p>>,
    index: HashMap<TokenId, usize>,
}

pub(crate) struct DependencyGraphEntry<'p> {
    pub provider: &'p Provider,
    pub scope: Scope,
    /// Name of the owning module
    pub module: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

impl<'p> DependencyGraph<'p> {
    pub(crate) fn new() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub(crate) fn add(
        &mut self,
        provider: &'p Provider,
        scope: Scope,
        module: Option<String>,
    ) -> Result<(), BuildError> {
        if let Some(&existing) = self.index.get(provider.token()) {
            return Err(BuildError::DuplicateTokenRegistration {
                token: provider.token().clone(),
                first: self.entries[existing].module.clone(),
                second: module,
            });
        }

        self.index.insert(provider.token().clone(), self.entries.len());
        self.entries.push(DependencyGraphEntry {
            provider,
            scope,
            module,
        });

        Ok(())
    }

    pub(crate) fn entry(&self, index: usize) -> &DependencyGraphEntry<'p> {
        &self.entries[index]
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Validates every dependency edge
    ///
    /// The dependency must be provided (unless optional), produce the expected type, and be
    /// visible from the scope of the dependent.
    pub(crate) fn check(&self, visibility: &Visibility) -> Result<(), BuildError> {
        for entry in &self.entries {
            let required_by = entry.provider.token();

            for dependency in entry.provider.dependencies() {
                let Some(&target) = self.index.get(&dependency.token) else {
                    if dependency.optional {
                        continue;
                    }
                    return Err(BuildError::UnresolvedDependency {
                        token: dependency.token.clone(),
                        required_by: required_by.clone(),
                    });
                };
                let target = &self.entries[target];

                let actual = target.provider.supplies();
                if actual.type_id != dependency.type_info.type_id {
                    return Err(BuildError::TypeMismatch {
                        token: dependency.token.clone(),
                        expected: dependency.type_info,
                        actual,
                    });
                }

                let visible = target.scope == Scope::Floating
                    || visibility.can_see(entry.scope, &dependency.token);
                if !visible {
                    return Err(BuildError::TokenNotVisible {
                        token: dependency.token.clone(),
                        module: entry.module.clone(),
                        required_by: required_by.clone(),
                    });
                }
            }
        }

        Ok(())
    }

    /// Entry indices in instantiation order, every entry after all its dependencies
    ///
    /// Depth first in registration order, so the order only depends on how providers were
    /// registered. Fails on the first cycle found.
    pub(crate) fn topological_order(&self) -> Result<Vec<usize>, BuildError> {
        let mut marks = vec![Mark::Unvisited; self.entries.len()];
        let mut order = Vec::with_capacity(self.entries.len());
        // The current dependency chain, each entry with the next dependency to follow
        let mut dependency_chain: Vec<(usize, usize)> = Vec::new();

        for start in 0..self.entries.len() {
            if marks[start] != Mark::Unvisited {
                continue;
            }
            marks[start] = Mark::InProgress;
            dependency_chain.push((start, 0));

            while let Some(&(index, cursor)) = dependency_chain.last() {
                let Some(dependency) = self.entries[index].provider.dependencies().get(cursor)
                else {
                    dependency_chain.pop();
                    marks[index] = Mark::Done;
                    order.push(index);
                    continue;
                };
                let top = dependency_chain.len() - 1;
                dependency_chain[top].1 += 1;

                let Some(&next) = self.index.get(&dependency.token) else {
                    continue;
                };
                match marks[next] {
                    Mark::Done => {}
                    Mark::InProgress => return Err(self.cycle(&dependency_chain, next)),
                    Mark::Unvisited => {
                        marks[next] = Mark::InProgress;
                        dependency_chain.push((next, 0));
                    }
                }
            }
        }

        Ok(order)
    }

    /// The cycle closed by reaching `repeated` again
    fn cycle(&self, dependency_chain: &[(usize, usize)], repeated: usize) -> BuildError {
        // Everything from the first occurrence onwards is part of the cycle
        let start = dependency_chain
            .iter()
            .position(|&(entry, _)| entry == repeated)
            .unwrap_or_default();
        let mut path: Vec<TokenId> = dependency_chain[start..]
            .iter()
            .map(|&(entry, _)| self.entries[entry].provider.token().clone())
            .collect();
        path.push(self.entries[repeated].provider.token().clone());

        BuildError::CyclicDependency { path }
    }
}

use std::{
    collections::{HashMap, HashSet, VecDeque},
    sync::Arc,
};

use crate::{
    errors::BuildError,
    module::{Module, ModuleId},
    token::TokenId,
};

/// Where a provider was registered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Scope {
    /// Index into [`ModuleGraph::modules`]
    Module(usize),
    /// Registered on the builder directly, visible to everyone
    Floating,
}

/// Every module reachable from the roots, each exactly once, in breadth first order
pub(crate) struct ModuleGraph {
    modules: Vec<Arc<Module>>,
    imports: Vec<Vec<usize>>,
    roots: Vec<usize>,
}

impl ModuleGraph {
    pub(crate) fn collect(roots: &[Arc<Module>]) -> Self {
        let mut graph = ModuleGraph {
            modules: Vec::new(),
            imports: Vec::new(),
            roots: Vec::new(),
        };
        let mut known = HashMap::new();
        let mut queue = VecDeque::new();

        for root in roots {
            let index = graph.insert(&mut known, &mut queue, root);
            if !graph.roots.contains(&index) {
                graph.roots.push(index);
            }
        }

        while let Some(current) = queue.pop_front() {
            let module = graph.modules[current].clone();
            for import in module.imports() {
                let index = graph.insert(&mut known, &mut queue, import);
                graph.imports[current].push(index);
            }
        }

        tracing::debug!(
            "Collected {} modules from {} roots",
            graph.modules.len(),
            graph.roots.len()
        );
        graph
    }

    /// Index of the module, queueing it if it was not seen before
    fn insert(
        &mut self,
        known: &mut HashMap<ModuleId, usize>,
        queue: &mut VecDeque<usize>,
        module: &Arc<Module>,
    ) -> usize {
        *known.entry(ModuleId::of(module)).or_insert_with(|| {
            self.modules.push(module.clone());
            self.imports.push(Vec::new());
            let index = self.modules.len() - 1;
            queue.push_back(index);
            index
        })
    }

    pub(crate) fn modules(&self) -> &[Arc<Module>] {
        &self.modules
    }

    pub(crate) fn module(&self, index: usize) -> &Module {
        &self.modules[index]
    }
}

/// Tokens each scope may depend on
pub(crate) struct Visibility {
    scopes: Vec<HashSet<TokenId>>,
    floating: HashSet<TokenId>,
}

impl Visibility {
    /// `own[i]` holds the tokens provided by module `i` itself
    ///
    /// A module may export its own tokens and re-export tokens its direct imports export.
    pub(crate) fn compute(
        graph: &ModuleGraph,
        own: &[HashSet<TokenId>],
    ) -> Result<Self, BuildError> {
        let mut scopes = Vec::with_capacity(graph.modules.len());
        for (index, module) in graph.modules.iter().enumerate() {
            let mut visible = own[index].clone();
            for &import in &graph.imports[index] {
                visible.extend(graph.modules[import].exports().iter().cloned());
            }

            if let Some(token) = module
                .exports()
                .iter()
                .find(|token| !visible.contains(*token))
            {
                return Err(BuildError::InvalidExport {
                    token: token.clone(),
                    module: module.name().to_string(),
                });
            }

            tracing::trace!("Module '{}' sees {:?}", module.name(), visible);
            scopes.push(visible);
        }

        let floating = graph
            .roots
            .iter()
            .flat_map(|&root| graph.modules[root].exports().iter().cloned())
            .collect();

        Ok(Visibility { scopes, floating })
    }

    /// Whether providers in `scope` may depend on a module owned `token`
    pub(crate) fn can_see(&self, scope: Scope, token: &TokenId) -> bool {
        match scope {
            Scope::Module(index) => self.scopes[index].contains(token),
            Scope::Floating => self.floating.contains(token),
        }
    }
}

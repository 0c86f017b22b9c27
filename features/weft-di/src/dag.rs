//! The instantiated dependency graph
//!
//! Nodes are stored in instantiation order, which is a valid topological order: every node sits
//! after all of its dependencies. Edges are indices into the same graph.

use std::{
    collections::{HashMap, HashSet},
    fmt::Debug,
};

use serde::{Deserialize, Serialize};

use crate::{
    lifecycle::LifecycleHooks,
    token::TokenId,
    types::{Injectable, Instance},
};

/// Where a node comes from
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeMetadata {
    /// Owning module, `None` for floating providers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
    /// Whether the owning module exports the token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exported: Option<bool>,
}

/// One resolved binding
pub struct Node {
    id: TokenId,
    instance: Instance,
    metadata: NodeMetadata,
    hooks: LifecycleHooks,
    dependencies: Vec<usize>,
}

impl Node {
    pub(crate) fn new(
        id: TokenId,
        instance: Instance,
        metadata: NodeMetadata,
        hooks: LifecycleHooks,
        dependencies: Vec<usize>,
    ) -> Self {
        Node {
            id,
            instance,
            metadata,
            hooks,
            dependencies,
        }
    }
}

/// Directed acyclic graph of all instances of a container
#[derive(Default)]
pub struct Dag {
    nodes: Vec<Node>,
    index: HashMap<TokenId, usize>,
}

impl Dag {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Appends a node, its dependencies must already be part of the graph
    pub(crate) fn insert(&mut self, node: Node) -> usize {
        let position = self.nodes.len();
        debug_assert!(
            node.dependencies.iter().all(|&dependency| dependency < position),
            "dependencies of '{}' must be inserted first",
            node.id
        );
        debug_assert!(!self.index.contains_key(&node.id));

        self.index.insert(node.id.clone(), position);
        self.nodes.push(node);
        position
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, token: &str) -> bool {
        self.index.contains_key(token)
    }

    pub fn get(&self, token: &str) -> Option<NodeRef<'_>> {
        self.index.get(token).map(|&index| self.node(index))
    }

    fn node(&self, index: usize) -> NodeRef<'_> {
        NodeRef { dag: self, index }
    }

    /// All nodes, dependencies first
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = NodeRef<'_>> + ExactSizeIterator {
        (0..self.nodes.len()).map(move |index| self.node(index))
    }

    /// Calls `visitor` once per node, dependencies first
    pub fn traverse<F: FnMut(NodeRef<'_>)>(&self, visitor: F) {
        self.iter().for_each(visitor)
    }

    /// Serializable view of the graph, without instance data
    pub fn snapshot(&self) -> GraphSnapshot {
        GraphSnapshot {
            nodes: self
                .iter()
                .map(|node| NodeSnapshot {
                    id: node.id().to_string(),
                    metadata: node.metadata().clone(),
                    dependencies: node
                        .dependencies()
                        .map(|dependency| dependency.id().to_string())
                        .collect(),
                })
                .collect(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self.snapshot())
    }
}

impl Debug for Dag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

/// Borrowed view of a node inside its graph
#[derive(Clone, Copy)]
pub struct NodeRef<'a> {
    dag: &'a Dag,
    index: usize,
}

impl<'a> NodeRef<'a> {
    fn inner(&self) -> &'a Node {
        &self.dag.nodes[self.index]
    }

    pub fn id(&self) -> &'a TokenId {
        &self.inner().id
    }

    pub fn instance(&self) -> &'a Instance {
        &self.inner().instance
    }

    pub fn downcast<T: Injectable>(&self) -> Option<std::sync::Arc<T>> {
        self.instance().downcast().ok()
    }

    pub fn metadata(&self) -> &'a NodeMetadata {
        &self.inner().metadata
    }

    pub fn hooks(&self) -> &'a LifecycleHooks {
        &self.inner().hooks
    }

    /// Position in topological order
    pub fn position(&self) -> usize {
        self.index
    }

    /// Direct dependencies, in declaration order
    pub fn dependencies(&self) -> impl Iterator<Item = NodeRef<'a>> + 'a {
        let dag = self.dag;
        self.inner()
            .dependencies
            .iter()
            .map(move |&index| dag.node(index))
    }

    /// Every node reachable through dependency edges, excluding this node, dependencies first
    pub fn all_dependencies(&self) -> Vec<NodeRef<'a>> {
        let mut seen = HashSet::new();
        let mut stack: Vec<usize> = self.inner().dependencies.clone();

        while let Some(index) = stack.pop() {
            if !seen.insert(index) {
                continue;
            }
            stack.extend(self.dag.nodes[index].dependencies.iter().copied());
        }

        let mut reachable: Vec<usize> = seen.into_iter().collect();
        reachable.sort_unstable();
        reachable
            .into_iter()
            .map(|index| self.dag.node(index))
            .collect()
    }

    /// Nodes depending directly on this one
    pub fn dependents(&self) -> Vec<NodeRef<'a>> {
        let dag = self.dag;
        dag.nodes[self.index + 1..]
            .iter()
            .enumerate()
            .filter(|(_, node)| node.dependencies.contains(&self.index))
            .map(|(offset, _)| dag.node(self.index + 1 + offset))
            .collect()
    }
}

impl Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("id", self.id())
            .field("type", &self.instance().info.type_name)
            .field("metadata", self.metadata())
            .field(
                "dependencies",
                &self.dependencies().map(|node| node.id()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl PartialEq for NodeRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.dag, other.dag) && self.index == other.index
    }
}

/// JSON export of a graph, consumed by visualization tooling
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub nodes: Vec<NodeSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSnapshot {
    pub id: String,
    pub metadata: NodeMetadata,
    pub dependencies: Vec<String>,
}

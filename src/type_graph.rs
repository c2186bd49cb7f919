//! Type assignment graph used by variable type analysis.
//!
//! Nodes are program values, edges carry types from a source value to the
//! value it is assigned into, and tags are the concrete classes allocated
//! into a value. Strongly connected components share one tag set.

use std::collections::{BTreeSet, HashMap};

use petgraph::Direction;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};

use crate::ir::{MethodRef, Value};

/// Value tracked by the type assignment graph.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub(crate) enum FlowNode {
    Local { method: MethodRef, name: String },
    This(MethodRef),
    Parameter(MethodRef, usize),
    Field { owner: String, name: String },
    Return(MethodRef),
}

impl FlowNode {
    /// Node for `value` as it appears in the body of `method`.
    pub(crate) fn of(method: &MethodRef, value: &Value) -> Self {
        match value {
            Value::Local { name } => FlowNode::Local {
                method: method.clone(),
                name: name.clone(),
            },
            Value::This => FlowNode::This(method.clone()),
            Value::Parameter { index } => FlowNode::Parameter(method.clone(), *index),
            Value::Field { owner, name } => FlowNode::Field {
                owner: owner.clone(),
                name: name.clone(),
            },
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct TypeAssignmentGraph {
    graph: DiGraph<FlowNode, ()>,
    indices: HashMap<FlowNode, NodeIndex>,
    /// Tags attached directly by allocation sites, indexed like `graph`.
    seeds: Vec<BTreeSet<String>>,
    /// SCC index per node after the last propagation.
    components: Vec<usize>,
    component_tags: Vec<BTreeSet<String>>,
}

impl TypeAssignmentGraph {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add_node(&mut self, node: FlowNode) -> NodeIndex {
        if let Some(index) = self.indices.get(&node) {
            return *index;
        }
        let index = self.graph.add_node(node.clone());
        self.indices.insert(node, index);
        self.seeds.push(BTreeSet::new());
        index
    }

    pub(crate) fn tag_node(&mut self, node: FlowNode, class: &str) {
        let index = self.add_node(node);
        self.seeds[index.index()].insert(class.to_string());
    }

    /// Add a `source -> target` flow, creating missing nodes.
    pub(crate) fn add_edge(&mut self, source: FlowNode, target: FlowNode) {
        let source = self.add_node(source);
        let target = self.add_node(target);
        if !self.graph.contains_edge(source, target) {
            self.graph.add_edge(source, target, ());
        }
    }

    /// Values `node` flows into directly.
    pub(crate) fn targets_for(&self, node: &FlowNode) -> Vec<&FlowNode> {
        let Some(index) = self.indices.get(node) else {
            return Vec::new();
        };
        self.graph
            .neighbors_directed(*index, Direction::Outgoing)
            .map(|target| &self.graph[target])
            .collect()
    }

    pub(crate) fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub(crate) fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Collapse SCCs and push tags along flow edges until every node holds
    /// the tags of everything that can reach it. Returns the SCC count.
    pub(crate) fn propagate(&mut self) -> usize {
        // Tarjan yields components in reverse topological order, so walking
        // the list backwards visits every source component before its targets.
        let sccs = tarjan_scc(&self.graph);
        let mut components = vec![0; self.graph.node_count()];
        for (component, members) in sccs.iter().enumerate() {
            for member in members {
                components[member.index()] = component;
            }
        }

        // A component's slot holds what its predecessors pushed into it; its
        // own seeds are added before it pushes on to its successors.
        let mut component_tags: Vec<BTreeSet<String>> = vec![BTreeSet::new(); sccs.len()];
        for component in (0..sccs.len()).rev() {
            for member in &sccs[component] {
                let seeds = &self.seeds[member.index()];
                component_tags[component].extend(seeds.iter().cloned());
            }
            let tags = component_tags[component].clone();
            for member in &sccs[component] {
                for target in self.targets_for(&self.graph[*member]) {
                    let target_component = components[self.indices[target].index()];
                    if target_component != component {
                        component_tags[target_component].extend(tags.iter().cloned());
                    }
                }
            }
        }

        self.components = components;
        self.component_tags = component_tags;
        sccs.len()
    }

    /// Propagated tags of `node`; empty for unknown nodes or nodes added since
    /// the last propagation.
    pub(crate) fn tags(&self, node: &FlowNode) -> BTreeSet<String> {
        self.scc_index(node)
            .map(|component| self.component_tags[component].clone())
            .unwrap_or_default()
    }

    pub(crate) fn scc_index(&self, node: &FlowNode) -> Option<usize> {
        let index = self.indices.get(node)?;
        self.components.get(index.index()).copied()
    }

    /// Nodes holding at least one tag after propagation.
    pub(crate) fn tagged_nodes(&self) -> Vec<(&FlowNode, &BTreeSet<String>)> {
        self.graph
            .node_indices()
            .filter_map(|index| {
                let component = *self.components.get(index.index())?;
                let tags = &self.component_tags[component];
                (!tags.is_empty()).then(|| (&self.graph[index], tags))
            })
            .collect()
    }
}

use indexmap::IndexSet;

use crate::error::{AnalysisError, AnalysisResult};
use crate::ir::MethodRef;

/// Append-only call graph over methods, edges point from caller to callee.
#[derive(Clone, Debug, Default)]
pub(crate) struct CallGraph {
    nodes: IndexSet<MethodRef>,
    edges: IndexSet<(MethodRef, MethodRef)>,
}

impl CallGraph {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn has_node(&self, method: &MethodRef) -> bool {
        self.nodes.contains(method)
    }

    /// Returns false when the node already existed.
    pub(crate) fn add_node(&mut self, method: MethodRef) -> bool {
        self.nodes.insert(method)
    }

    pub(crate) fn has_edge(&self, caller: &MethodRef, callee: &MethodRef) -> bool {
        // IndexSet<(A, B)> cannot be probed with borrowed halves.
        self.edges.contains(&(caller.clone(), callee.clone()))
    }

    /// Both endpoints must already be nodes. Returns false for a duplicate edge.
    pub(crate) fn add_edge(
        &mut self,
        caller: &MethodRef,
        callee: &MethodRef,
    ) -> AnalysisResult<bool> {
        for method in [caller, callee] {
            if !self.has_node(method) {
                return Err(AnalysisError::UnknownNode {
                    method: method.clone(),
                });
            }
        }
        Ok(self.edges.insert((caller.clone(), callee.clone())))
    }

    pub(crate) fn nodes(&self) -> impl Iterator<Item = &MethodRef> {
        self.nodes.iter()
    }

    pub(crate) fn edges(&self) -> impl Iterator<Item = (&MethodRef, &MethodRef)> {
        self.edges.iter().map(|(caller, callee)| (caller, callee))
    }

    pub(crate) fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn edge_count(&self) -> usize {
        self.edges.len()
    }
}

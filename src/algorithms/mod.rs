use std::collections::{BTreeSet, HashSet};

use clap::ValueEnum;
use tracing::{debug, warn};

use crate::callgraph::CallGraph;
use crate::error::{AmbiguousDispatch, AnalysisResult};
use crate::ir::MethodRef;
use crate::program::ProgramModel;

pub(crate) mod cha;
pub(crate) mod rta;
pub(crate) mod vta;

/// Metadata describing a call graph algorithm.
#[derive(Clone, Debug)]
pub(crate) struct AlgorithmMetadata {
    pub(crate) id: &'static str,
    pub(crate) name: &'static str,
    pub(crate) description: &'static str,
}

/// Call graph construction interface shared by CHA, RTA and VTA.
pub(crate) trait CallGraphAlgorithm: Send + Sync {
    fn metadata(&self) -> AlgorithmMetadata;
    fn construct(&self, program: &dyn ProgramModel) -> AnalysisResult<AnalysisRun>;
}

/// Finished call graph of one algorithm run.
#[derive(Debug)]
pub(crate) struct AnalysisRun {
    pub(crate) algorithm: AlgorithmMetadata,
    pub(crate) graph: CallGraph,
    pub(crate) warnings: BTreeSet<AmbiguousDispatch>,
}

/// Algorithm selection accepted on the command line.
#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub(crate) enum AlgorithmChoice {
    Cha,
    Rta,
    Vta,
    All,
}

pub(crate) fn algorithms(choice: AlgorithmChoice) -> Vec<Box<dyn CallGraphAlgorithm>> {
    match choice {
        AlgorithmChoice::Cha => vec![Box::new(cha::ChaAlgorithm)],
        AlgorithmChoice::Rta => vec![Box::new(rta::RtaAlgorithm)],
        AlgorithmChoice::Vta => vec![Box::new(vta::VtaAlgorithm)],
        AlgorithmChoice::All => vec![
            Box::new(cha::ChaAlgorithm),
            Box::new(rta::RtaAlgorithm),
            Box::new(vta::VtaAlgorithm),
        ],
    }
}

/// Worklist reachability over the call relation.
///
/// A method is scheduled at most once; the visited check happens when a
/// callee is linked, before its body is ever flowed through.
pub(crate) struct Traversal<'p> {
    program: &'p dyn ProgramModel,
    graph: CallGraph,
    visited: HashSet<MethodRef>,
    worklist: Vec<MethodRef>,
}

impl<'p> Traversal<'p> {
    pub(crate) fn new(program: &'p dyn ProgramModel) -> Self {
        Self {
            program,
            graph: CallGraph::new(),
            visited: HashSet::new(),
            worklist: Vec::new(),
        }
    }

    /// Seed with the program's entry points that have a body.
    pub(crate) fn seed_entry_points(&mut self) {
        for entry_point in self.program.entry_points() {
            if !self.program.has_body(&entry_point) {
                debug!(method = %entry_point, "skipping entry point without body");
                continue;
            }
            self.graph.add_node(entry_point.clone());
            self.schedule(entry_point);
        }
    }

    fn schedule(&mut self, method: MethodRef) {
        if self.program.has_body(&method) && self.visited.insert(method.clone()) {
            self.worklist.push(method);
        }
    }

    /// Next method whose body has not been flowed through yet.
    pub(crate) fn next(&mut self) -> Option<MethodRef> {
        self.worklist.pop()
    }

    pub(crate) fn is_idle(&self) -> bool {
        self.worklist.is_empty()
    }

    /// Add `callee` and the `caller -> callee` edge, scheduling `callee` if unvisited.
    pub(crate) fn link(&mut self, caller: &MethodRef, callee: &MethodRef) -> AnalysisResult<bool> {
        self.graph.add_node(callee.clone());
        let added = self.graph.add_edge(caller, callee)?;
        self.schedule(callee.clone());
        Ok(added)
    }

    pub(crate) fn finish(self) -> CallGraph {
        self.graph
    }
}

pub(crate) fn record_ambiguous(
    warnings: &mut BTreeSet<AmbiguousDispatch>,
    caller: &MethodRef,
    signature: &MethodRef,
) {
    let warning = AmbiguousDispatch {
        caller: caller.clone(),
        signature: signature.clone(),
    };
    if warnings.insert(warning) {
        warn!(caller = %caller, signature = %signature, "dispatch resolved to no target");
    }
}

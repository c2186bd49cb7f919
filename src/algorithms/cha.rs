use std::collections::BTreeSet;

use tracing::info;

use crate::algorithms::{
    AlgorithmMetadata, AnalysisRun, CallGraphAlgorithm, Traversal, record_ambiguous,
};
use crate::error::AnalysisResult;
use crate::ir::{CallKind, InvokeExpr, MethodRef, Statement};
use crate::program::ProgramModel;

/// Class Hierarchy Analysis: every subtype of a receiver's declared type is feasible.
pub(crate) struct ChaAlgorithm;

impl CallGraphAlgorithm for ChaAlgorithm {
    fn metadata(&self) -> AlgorithmMetadata {
        AlgorithmMetadata {
            id: "CHA",
            name: "Class hierarchy analysis",
            description: "Resolves dispatch against every subtype of the declared receiver type",
        }
    }

    fn construct(&self, program: &dyn ProgramModel) -> AnalysisResult<AnalysisRun> {
        let mut traversal = Traversal::new(program);
        traversal.seed_entry_points();
        let mut warnings = BTreeSet::new();

        while let Some(caller) = traversal.next() {
            for call in program.statements(&caller).iter().filter_map(Statement::invoke) {
                let targets = cha_targets(program, call);
                if targets.is_empty() {
                    record_ambiguous(&mut warnings, &caller, call.signature());
                }
                for target in &targets {
                    traversal.link(&caller, target)?;
                }
            }
        }

        let graph = traversal.finish();
        info!(
            algorithm = "CHA",
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "call graph built"
        );
        Ok(AnalysisRun {
            algorithm: self.metadata(),
            graph,
            warnings,
        })
    }
}

/// Conservative targets of a call site: the signature method for static and
/// special calls, every override below the declared class otherwise.
///
/// A dispatched call on a class missing from the snapshot has no hierarchy to
/// resolve against, so its signature method becomes a leaf target.
pub(crate) fn cha_targets(program: &dyn ProgramModel, call: &InvokeExpr) -> BTreeSet<MethodRef> {
    let signature = call.signature();
    match call.classify() {
        CallKind::Static | CallKind::Special => BTreeSet::from([signature.clone()]),
        CallKind::Virtual | CallKind::Interface => {
            let targets = program.resolve_overrides(signature.declaring_class(), signature);
            if targets.is_empty() && !program.has_class(signature.declaring_class()) {
                return BTreeSet::from([signature.clone()]);
            }
            targets
        }
    }
}

use std::collections::BTreeSet;

use indexmap::IndexSet;
use tracing::{debug, info};

use crate::algorithms::{
    AlgorithmMetadata, AnalysisRun, CallGraphAlgorithm, Traversal, record_ambiguous,
};
use crate::error::AnalysisResult;
use crate::ir::{MethodRef, Statement};
use crate::program::ProgramModel;

/// Rapid Type Analysis: dispatch is limited to classes instantiated in reachable code.
pub(crate) struct RtaAlgorithm;

/// Virtual or interface call awaiting resolution against newly instantiated classes.
struct DispatchSite {
    caller: MethodRef,
    signature: MethodRef,
    /// Number of instantiated classes already checked against this site.
    seen: usize,
    targets: usize,
}

impl CallGraphAlgorithm for RtaAlgorithm {
    fn metadata(&self) -> AlgorithmMetadata {
        AlgorithmMetadata {
            id: "RTA",
            name: "Rapid type analysis",
            description: "Resolves dispatch against classes constructed in reachable code",
        }
    }

    fn construct(&self, program: &dyn ProgramModel) -> AnalysisResult<AnalysisRun> {
        let mut traversal = Traversal::new(program);
        traversal.seed_entry_points();
        let mut instantiated: IndexSet<String> = IndexSet::new();
        let mut sites: Vec<DispatchSite> = Vec::new();
        let mut rounds = 0usize;

        loop {
            rounds += 1;
            while let Some(caller) = traversal.next() {
                for call in program.statements(&caller).iter().filter_map(Statement::invoke) {
                    let signature = call.signature();
                    if call.classify().is_dispatched() {
                        sites.push(DispatchSite {
                            caller: caller.clone(),
                            signature: signature.clone(),
                            seen: 0,
                            targets: 0,
                        });
                        continue;
                    }
                    if call.is_instantiation()
                        && instantiated.insert(signature.declaring_class().to_string())
                    {
                        let class = signature.declaring_class();
                        debug!(class, caller = %caller, "class instantiated");
                    }
                    traversal.link(&caller, signature)?;
                }
            }

            // Every site catches up with classes instantiated since it last looked.
            for site in &mut sites {
                for class in instantiated.iter().skip(site.seen) {
                    if !program.is_concrete(class)
                        || !program.is_subtype(class, site.signature.declaring_class())
                    {
                        continue;
                    }
                    if let Some(target) = program.dispatch(class, &site.signature) {
                        traversal.link(&site.caller, &target)?;
                        site.targets += 1;
                    }
                }
                site.seen = instantiated.len();
            }

            if traversal.is_idle() {
                break;
            }
        }

        let mut warnings = BTreeSet::new();
        for site in sites.iter().filter(|site| site.targets == 0) {
            record_ambiguous(&mut warnings, &site.caller, &site.signature);
        }

        let graph = traversal.finish();
        info!(
            algorithm = "RTA",
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            instantiated = instantiated.len(),
            rounds,
            "call graph built"
        );
        Ok(AnalysisRun {
            algorithm: self.metadata(),
            graph,
            warnings,
        })
    }
}

use std::collections::BTreeSet;

use tracing::{debug, info, warn};

use crate::algorithms::cha::{ChaAlgorithm, cha_targets};
use crate::algorithms::{
    AlgorithmMetadata, AnalysisRun, CallGraphAlgorithm, Traversal, record_ambiguous,
};
use crate::error::{AnalysisError, AnalysisResult};
use crate::ir::{CallKind, Expr, InvokeExpr, MethodRef, Statement, Value};
use crate::program::ProgramModel;
use crate::type_graph::{FlowNode, TypeAssignmentGraph};

/// Variable Type Analysis: dispatch is limited to the classes that can flow
/// into the receiver value, refining a CHA baseline.
pub(crate) struct VtaAlgorithm;

/// Dispatch site resolved from the tags of its receiver.
struct ReceiverSite {
    caller: MethodRef,
    signature: MethodRef,
    receiver: Option<FlowNode>,
    resolved: bool,
}

impl CallGraphAlgorithm for VtaAlgorithm {
    fn metadata(&self) -> AlgorithmMetadata {
        AlgorithmMetadata {
            id: "VTA",
            name: "Variable type analysis",
            description: "Resolves dispatch against the classes reaching each receiver value",
        }
    }

    fn construct(&self, program: &dyn ProgramModel) -> AnalysisResult<AnalysisRun> {
        let baseline = ChaAlgorithm.construct(program)?.graph;
        let mut traversal = Traversal::new(program);
        traversal.seed_entry_points();
        let mut flow = TypeAssignmentGraph::new();
        let mut sites: Vec<ReceiverSite> = Vec::new();
        let mut rounds = 0usize;

        // Newly reachable methods add flows, which can tag more receivers and
        // reach more methods, so iterate until no method is added.
        loop {
            rounds += 1;
            while let Some(caller) = traversal.next() {
                flow_through_method(program, &mut flow, &caller);
                for call in program.statements(&caller).iter().filter_map(Statement::invoke) {
                    let signature = call.signature();
                    if call.classify().is_dispatched() {
                        sites.push(ReceiverSite {
                            caller: caller.clone(),
                            signature: signature.clone(),
                            receiver: call.receiver().map(|value| FlowNode::of(&caller, value)),
                            resolved: false,
                        });
                    } else if baseline.has_edge(&caller, signature) {
                        traversal.link(&caller, signature)?;
                    }
                }
            }

            let components = flow.propagate();
            debug!(
                round = rounds,
                values = flow.node_count(),
                flows = flow.edge_count(),
                components,
                tagged = flow.tagged_nodes().len(),
                "type assignment graph propagated"
            );

            for site in &mut sites {
                for target in refine_dispatch(program, &flow, site) {
                    if baseline.has_edge(&site.caller, &target) {
                        traversal.link(&site.caller, &target)?;
                        site.resolved = true;
                    }
                }
            }

            if traversal.is_idle() {
                break;
            }
        }

        let mut warnings = BTreeSet::new();
        for site in sites.iter().filter(|site| !site.resolved) {
            record_ambiguous(&mut warnings, &site.caller, &site.signature);
        }

        let graph = traversal.finish();
        info!(
            algorithm = "VTA",
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            baseline_edges = baseline.edge_count(),
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

/// Targets of a dispatch site whose receiver may hold one of its tags.
fn refine_dispatch(
    program: &dyn ProgramModel,
    flow: &TypeAssignmentGraph,
    site: &ReceiverSite,
) -> BTreeSet<MethodRef> {
    let Some(receiver) = &site.receiver else {
        return BTreeSet::new();
    };
    flow.tags(receiver)
        .iter()
        .filter(|class| program.is_subtype(class, site.signature.declaring_class()))
        .filter_map(|class| program.dispatch(class, &site.signature))
        .collect()
}

/// Add the flows of every statement in `method` to the type assignment graph.
pub(crate) fn flow_through_method(
    program: &dyn ProgramModel,
    flow: &mut TypeAssignmentGraph,
    method: &MethodRef,
) {
    for statement in program.statements(method) {
        match statement {
            Statement::Assign { target, value } => {
                let target = FlowNode::of(method, target);
                match value {
                    Expr::New { class } => flow.tag_node(target, class),
                    Expr::Use { value } | Expr::Cast { value, .. } => {
                        flow.add_edge(FlowNode::of(method, value), target)
                    }
                    Expr::Invoke { call } => {
                        add_call_flows(program, flow, method, call, Some(target))
                    }
                    Expr::Constant => {
                        flow.add_node(target);
                    }
                }
            }
            Statement::Invoke { call } => add_call_flows(program, flow, method, call, None),
            Statement::Return { value: Some(value) } => {
                flow.add_edge(FlowNode::of(method, value), FlowNode::Return(method.clone()))
            }
            Statement::Return { value: None } | Statement::Other => {}
        }
    }
}

/// Receiver, argument and result flows between `caller` and every conservative target.
fn add_call_flows(
    program: &dyn ProgramModel,
    flow: &mut TypeAssignmentGraph,
    caller: &MethodRef,
    call: &InvokeExpr,
    mut result: Option<FlowNode>,
) {
    if call.classify() == CallKind::Static && result.is_some() {
        if let Err(error) = returned_values(program, call.signature()) {
            warn!(caller = %caller, %error, "call result left untagged");
            if let Some(node) = result.take() {
                flow.add_node(node);
            }
        }
    }

    for target in cha_targets(program, call) {
        if let Some(receiver) = call.receiver() {
            flow.add_edge(FlowNode::of(caller, receiver), FlowNode::This(target.clone()));
        }
        for (index, argument) in call.args.iter().enumerate() {
            flow.add_edge(
                FlowNode::of(caller, argument),
                FlowNode::Parameter(target.clone(), index),
            );
        }
        if let Some(result) = &result {
            flow.add_edge(FlowNode::Return(target.clone()), result.clone());
        }
    }
}

/// Values returned by `method`; fails when it has no body or never returns a value.
pub(crate) fn returned_values<'a>(
    program: &'a dyn ProgramModel,
    method: &MethodRef,
) -> AnalysisResult<Vec<&'a Value>> {
    let values: Vec<&Value> = program
        .statements(method)
        .iter()
        .filter_map(|statement| match statement {
            Statement::Return { value: Some(value) } => Some(value),
            _ => None,
        })
        .collect();
    if values.is_empty() {
        return Err(AnalysisError::UnresolvedReturnType {
            method: method.clone(),
        });
    }
    Ok(values)
}

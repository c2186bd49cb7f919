use clap::ValueEnum;
use serde::Serialize;
use serde_json::json;
use serde_sarif::sarif::{
    Invocation, Location, LogicalLocation, Message, MultiformatMessageString,
    ReportingDescriptor, Result as SarifResult, Run, Sarif, Tool, ToolComponent, SCHEMA_URL,
};

use crate::algorithms::{AlgorithmMetadata, AnalysisRun};
use crate::ir::MethodRef;

const TOOL_NAME: &str = "callgraph";

/// Output encoding for finished call graphs.
#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub(crate) enum OutputFormat {
    Json,
    Sarif,
}

#[derive(Debug, Serialize)]
pub(crate) struct Report {
    runs: Vec<RunReport>,
}

#[derive(Debug, Serialize)]
struct RunReport {
    algorithm: &'static str,
    nodes: Vec<String>,
    edges: Vec<EdgeReport>,
    warnings: Vec<WarningReport>,
}

#[derive(Debug, Serialize)]
struct EdgeReport {
    caller: String,
    callee: String,
}

#[derive(Debug, Serialize)]
struct WarningReport {
    caller: String,
    signature: String,
}

/// Nodes and edges in discovery order, one entry per run.
pub(crate) fn build_report(runs: &[AnalysisRun]) -> Report {
    let runs = runs
        .iter()
        .map(|run| RunReport {
            algorithm: run.algorithm.id,
            nodes: run.graph.nodes().map(ToString::to_string).collect(),
            edges: run
                .graph
                .edges()
                .map(|(caller, callee)| EdgeReport {
                    caller: caller.to_string(),
                    callee: callee.to_string(),
                })
                .collect(),
            warnings: run
                .warnings
                .iter()
                .map(|warning| WarningReport {
                    caller: warning.caller.to_string(),
                    signature: warning.signature.to_string(),
                })
                .collect(),
        })
        .collect();
    Report { runs }
}

/// One SARIF run per algorithm, one result per call edge.
pub(crate) fn build_sarif(runs: &[AnalysisRun], invocation: Invocation) -> Sarif {
    let runs = runs
        .iter()
        .map(|run| {
            let results = run
                .graph
                .edges()
                .map(|(caller, callee)| edge_result(run.algorithm.id, caller, callee))
                .collect::<Vec<_>>();
            Run::builder()
                .tool(tool(&run.algorithm))
                .invocations(vec![invocation.clone()])
                .results(results)
                .build()
        })
        .collect::<Vec<_>>();

    Sarif::builder()
        .schema(SCHEMA_URL)
        .runs(runs)
        .version(json!("2.1.0"))
        .build()
}

pub(crate) fn build_invocation() -> Invocation {
    let arguments: Vec<String> = std::env::args().collect();
    let command_line = arguments.join(" ");

    Invocation::builder()
        .execution_successful(true)
        .arguments(arguments)
        .command_line(command_line)
        .build()
}

/// Driver with the run's algorithm as its only rule.
fn tool(algorithm: &AlgorithmMetadata) -> Tool {
    let rule = ReportingDescriptor::builder()
        .id(algorithm.id)
        .name(algorithm.name)
        .short_description(
            MultiformatMessageString::builder()
                .text(algorithm.description)
                .build(),
        )
        .build();
    let driver = ToolComponent::builder()
        .name(TOOL_NAME)
        .version(env!("CARGO_PKG_VERSION"))
        .rules(vec![rule])
        .build();
    Tool {
        driver,
        extensions: None,
        properties: None,
    }
}

fn edge_result(algorithm: &str, caller: &MethodRef, callee: &MethodRef) -> SarifResult {
    SarifResult::builder()
        .rule_id(algorithm)
        .message(result_message(format!("{caller} may call {callee}")))
        .locations(vec![method_location(caller)])
        .related_locations(vec![method_location(callee)])
        .build()
}

pub(crate) fn method_location(method: &MethodRef) -> Location {
    let logical = method_logical_location(method);
    Location::builder().logical_locations(vec![logical]).build()
}

pub(crate) fn method_logical_location(method: &MethodRef) -> LogicalLocation {
    LogicalLocation::builder()
        .name(method.to_string())
        .kind("function")
        .build()
}

pub(crate) fn result_message(text: impl Into<String>) -> Message {
    Message::builder().text(text.into()).build()
}

mod algorithms;
mod callgraph;
mod error;
#[cfg(test)]
mod fixtures;
mod ir;
mod program;
mod report;
mod scan;
mod type_graph;

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use rayon::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::algorithms::{AlgorithmChoice, AnalysisRun, algorithms};
use crate::report::{OutputFormat, build_invocation, build_report, build_sarif};
use crate::scan::scan_inputs;

/// CLI arguments for call graph construction.
#[derive(Parser, Debug)]
#[command(
    name = "callgraph",
    about = "Static call graphs (CHA, RTA, VTA) for JVM program snapshots.",
    version
)]
struct Cli {
    /// Snapshot file or directory of snapshot files to analyze.
    #[arg(long, value_name = "PATH")]
    input: PathBuf,
    /// Library snapshots; their classes resolve dispatch but seed no entry points.
    #[arg(long, value_name = "PATH")]
    classpath: Vec<PathBuf>,
    #[arg(long, value_enum, default_value = "all")]
    algorithm: AlgorithmChoice,
    #[arg(long, value_enum, default_value = "json")]
    format: OutputFormat,
    #[arg(long, value_name = "PATH")]
    output: Option<PathBuf>,
    #[arg(long)]
    quiet: bool,
    #[arg(long)]
    timing: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.quiet);
    run(cli)
}

fn init_tracing(quiet: bool) {
    let default_level = if quiet { "error" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn run(cli: Cli) -> Result<()> {
    if !cli.input.exists() {
        anyhow::bail!("input not found: {}", cli.input.display());
    }
    for entry in &cli.classpath {
        if !entry.exists() {
            anyhow::bail!("classpath entry not found: {}", entry.display());
        }
    }

    let started_at = Instant::now();
    let scan = scan_inputs(&cli.input, &cli.classpath)?;
    let program = &scan.program;

    // Each run owns its graph and scratch state, so runs share only the program.
    let timed: Vec<(AnalysisRun, u128)> = algorithms(cli.algorithm)
        .par_iter()
        .map(|algorithm| -> Result<(AnalysisRun, u128)> {
            let started = Instant::now();
            let run = algorithm
                .construct(program)
                .with_context(|| format!("{} construction failed", algorithm.metadata().id))?;
            Ok((run, started.elapsed().as_millis()))
        })
        .collect::<Result<Vec<_>>>()?;

    if cli.timing && !cli.quiet {
        for (run, elapsed_ms) in &timed {
            eprintln!(
                "timing: algorithm={} ms={} nodes={} edges={} warnings={}",
                run.algorithm.id,
                elapsed_ms,
                run.graph.node_count(),
                run.graph.edge_count(),
                run.warnings.len()
            );
        }
    }
    let runs: Vec<AnalysisRun> = timed.into_iter().map(|(run, _)| run).collect();

    let mut writer = output_writer(cli.output.as_deref())?;
    match cli.format {
        OutputFormat::Json => serde_json::to_writer_pretty(&mut writer, &build_report(&runs)),
        OutputFormat::Sarif => {
            serde_json::to_writer_pretty(&mut writer, &build_sarif(&runs, build_invocation()))
        }
    }
    .context("failed to serialize call graph output")?;
    writer
        .write_all(b"\n")
        .context("failed to write call graph output")?;

    if cli.timing && !cli.quiet {
        eprintln!(
            "timing: total_ms={} classes={} files={}",
            started_at.elapsed().as_millis(),
            scan.class_count,
            scan.file_count
        );
    }

    Ok(())
}

fn output_writer(output: Option<&Path>) -> Result<Box<dyn Write>> {
    match output {
        Some(path) if path == Path::new("-") => Ok(Box::new(io::stdout())),
        Some(path) => Ok(Box::new(
            File::create(path).with_context(|| format!("failed to open {}", path.display()))?,
        )),
        None => Ok(Box::new(io::stdout())),
    }
}

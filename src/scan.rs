use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use jsonschema::JSONSchema;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::ir::{Class, MethodRef};
use crate::program::Program;

const SNAPSHOT_SCHEMA: &str = include_str!("snapshot.schema.json");

/// Loaded program and counts for a scan.
pub(crate) struct ScanOutput {
    pub(crate) program: Program,
    pub(crate) class_count: usize,
    pub(crate) file_count: usize,
}

/// On-disk program snapshot.
#[derive(Debug, Default, Deserialize)]
struct Snapshot {
    #[serde(default)]
    classes: Vec<Class>,
    #[serde(default)]
    entry_points: Vec<MethodRef>,
}

struct SnapshotValidator {
    schema: JSONSchema,
}

impl SnapshotValidator {
    fn new() -> Result<Self> {
        let schema: Value =
            serde_json::from_str(SNAPSHOT_SCHEMA).context("failed to parse snapshot schema")?;
        let schema = JSONSchema::compile(&schema)
            .map_err(|error| anyhow::anyhow!("failed to compile snapshot schema: {error}"))?;
        Ok(Self { schema })
    }

    fn validate(&self, path: &Path, value: &Value) -> Result<()> {
        if let Err(errors) = self.schema.validate(value) {
            let messages: Vec<String> = errors
                .map(|error| format!("{}: {}", error.instance_path, error))
                .collect();
            anyhow::bail!(
                "invalid snapshot {}: {}",
                path.display(),
                messages.join("; ")
            );
        }
        Ok(())
    }
}

/// Load the input snapshot(s) and classpath snapshots into one program.
///
/// Entry points come from input snapshots only; classpath entries contribute
/// library classes.
pub(crate) fn scan_inputs(input: &Path, classpath: &[PathBuf]) -> Result<ScanOutput> {
    let validator = SnapshotValidator::new()?;
    let mut inputs = Vec::new();
    scan_path(input, &validator, &mut inputs)?;

    // Keep deterministic ordering by sorting classpath entries and directory listings.
    let mut classpath_entries = classpath.to_vec();
    classpath_entries.sort_by_key(|entry| path_key(entry));

    let mut libraries = Vec::new();
    for entry in classpath_entries {
        scan_path(&entry, &validator, &mut libraries)?;
    }

    let file_count = inputs.len() + libraries.len();
    let mut entry_points: Vec<MethodRef> = inputs
        .iter()
        .flat_map(|snapshot| snapshot.entry_points.iter().cloned())
        .collect();
    if entry_points.is_empty() {
        let classes = inputs.iter().flat_map(|snapshot| snapshot.classes.iter());
        entry_points = Program::main_methods(classes);
    }

    let classes: Vec<Class> = inputs
        .into_iter()
        .chain(libraries)
        .flat_map(|snapshot| snapshot.classes)
        .collect();
    let class_count = classes.len();
    debug!(
        files = file_count,
        classes = class_count,
        entry_points = entry_points.len(),
        "snapshots loaded"
    );

    Ok(ScanOutput {
        program: Program::new(classes, entry_points),
        class_count,
        file_count,
    })
}

fn scan_path(
    path: &Path,
    validator: &SnapshotValidator,
    snapshots: &mut Vec<Snapshot>,
) -> Result<()> {
    if path.is_dir() {
        for file in snapshot_files(path)? {
            snapshots.push(read_snapshot(&file, validator)?);
        }
        return Ok(());
    }
    if !is_snapshot_file(path) {
        anyhow::bail!("unsupported input file: {}", path.display());
    }
    snapshots.push(read_snapshot(path, validator)?);
    Ok(())
}

/// `*.json` files below `dir`, depth first in path order.
fn snapshot_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = fs::read_dir(dir)
        .with_context(|| format!("failed to read directory {}", dir.display()))?
        .map(|entry| entry.map(|entry| entry.path()))
        .collect::<io::Result<Vec<_>>>()
        .with_context(|| format!("failed to list {}", dir.display()))?;
    entries.sort_by_key(|entry| path_key(entry));

    let mut files = Vec::new();
    for entry in entries {
        if entry.is_dir() {
            files.extend(snapshot_files(&entry)?);
        } else if is_snapshot_file(&entry) {
            files.push(entry);
        } else {
            debug!(path = %entry.display(), "skipping non-snapshot file");
        }
    }
    Ok(files)
}

fn is_snapshot_file(path: &Path) -> bool {
    path.extension().and_then(|ext| ext.to_str()) == Some("json")
}

fn read_snapshot(path: &Path, validator: &SnapshotValidator) -> Result<Snapshot> {
    let data = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let value: Value = serde_json::from_slice(&data)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    validator.validate(path, &value)?;
    serde_json::from_value(value).with_context(|| format!("failed to decode {}", path.display()))
}

fn path_key(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

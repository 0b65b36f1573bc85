//! `cpdag orient`: orient a skeleton file and print its edge-mark matrix.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;
use cpdag_core::encode::EdgeMarkMatrix;
use cpdag_core::error::OrientError;
use cpdag_core::oracle::CiRecord;
use cpdag_core::orient::{OrientationReport, orient};
use cpdag_core::sepset::SeparationSets;
use cpdag_core::skeleton::Skeleton;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::output::{
    CliError, OutputMode, fail, pretty_kv, pretty_section, render_error, render_mode,
};

/// Arguments for `cpdag orient`.
#[derive(Args, Debug)]
pub struct OrientArgs {
    /// JSON file with `skeleton` and one separation-set form.
    #[arg(short, long, value_name = "FILE")]
    pub input: PathBuf,
}

/// On-disk orientation request.
///
/// Exactly one of `sepsets`, `sepset_tensor` or `records` must be present.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct OrientInput {
    #[serde(default)]
    variables: Option<Vec<String>>,
    skeleton: Vec<Vec<u8>>,
    /// `[i, j, [members...]]` triples.
    #[serde(default)]
    sepsets: Option<Vec<(usize, usize, Vec<usize>)>>,
    /// Sentinel-padded `n × n × k` tensor.
    #[serde(default)]
    sepset_tensor: Option<Vec<Vec<Vec<i64>>>>,
    /// Skeleton-search test log.
    #[serde(default)]
    records: Option<Vec<CiRecord>>,
}

#[derive(Debug, Serialize)]
struct OrientOutput {
    variables: Vec<String>,
    matrix: EdgeMarkMatrix,
    fingerprint: String,
    report: OrientationReport,
}

/// Execute `cpdag orient`.
pub fn run_orient(args: &OrientArgs, output: OutputMode) -> anyhow::Result<()> {
    let input = read_input(&args.input)?;

    let (variables, skeleton, sepsets) = match build(input) {
        Ok(parts) => parts,
        Err(InputError::Engine(err)) => return Err(fail(output, &err)),
        Err(InputError::Request(message)) => {
            render_error(output, &CliError::new(message.clone()))?;
            anyhow::bail!(message);
        }
    };
    debug!(nodes = skeleton.len(), pairs = sepsets.len(), "orientation input loaded");

    let outcome = orient(&skeleton, &sepsets).map_err(|err| fail(output, &err))?;
    let payload = OrientOutput {
        variables,
        matrix: outcome.matrix,
        fingerprint: outcome.fingerprint,
        report: outcome.report,
    };

    render_mode(output, &payload, render_text, render_pretty)
}

fn read_input(path: &Path) -> anyhow::Result<OrientInput> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

type Parts = (Vec<String>, Skeleton, SeparationSets);

#[derive(Debug)]
enum InputError {
    /// The request itself is malformed.
    Request(String),
    /// The engine rejected the skeleton or separation sets.
    Engine(OrientError),
}

impl From<OrientError> for InputError {
    fn from(err: OrientError) -> Self {
        Self::Engine(err)
    }
}

fn build(input: OrientInput) -> Result<Parts, InputError> {
    let skeleton = Skeleton::from_matrix(&input.skeleton)?;
    let n = skeleton.len();

    let variables = match input.variables {
        Some(names) if names.len() != n => {
            return Err(InputError::Request(format!(
                "{} variable names given for {n} variables",
                names.len()
            )));
        }
        Some(names) => names,
        None => (0..n).map(|i| format!("X{}", i + 1)).collect(),
    };

    let sepsets = match (input.sepsets, input.sepset_tensor, input.records) {
        (Some(entries), None, None) => {
            let mut sepsets = SeparationSets::new(n);
            for (i, j, members) in entries {
                if !sepsets.insert(i, j, members) {
                    debug!(i, j, "duplicate separation set ignored");
                }
            }
            sepsets
        }
        (None, Some(tensor), None) => SeparationSets::from_tensor(&skeleton, &tensor)?,
        (None, None, Some(records)) => SeparationSets::from_records(&skeleton, records)?,
        _ => {
            return Err(InputError::Request(
                "provide exactly one of `sepsets`, `sepset_tensor` or `records`".to_string(),
            ));
        }
    };

    Ok((variables, skeleton, sepsets))
}

fn render_text(payload: &OrientOutput, w: &mut dyn Write) -> std::io::Result<()> {
    for row in payload.matrix.to_rows() {
        let cells: Vec<String> = row.iter().map(ToString::to_string).collect();
        writeln!(w, "{}", cells.join(" "))?;
    }
    Ok(())
}

fn render_pretty(payload: &OrientOutput, w: &mut dyn Write) -> std::io::Result<()> {
    let names = &payload.variables;
    let matrix = &payload.matrix;

    pretty_section(w, "Edges")?;
    let mut any = false;
    for i in 0..matrix.len() {
        for j in 0..matrix.len() {
            if matrix.is_directed(i, j) {
                writeln!(w, "  {} -> {}", names[i], names[j])?;
                any = true;
            } else if i < j && matrix.adjacent(i, j) && !matrix.is_directed(j, i) {
                writeln!(w, "  {} -- {}", names[i], names[j])?;
                any = true;
            }
        }
    }
    if !any {
        writeln!(w, "  (none)")?;
    }

    writeln!(w)?;
    pretty_section(w, "Summary")?;
    let summary = &payload.report.summary;
    let vstructures = &payload.report.vstructures;
    let propagation = &payload.report.propagation;
    pretty_kv(w, "variables", summary.nodes.to_string())?;
    pretty_kv(w, "edges", summary.edges.to_string())?;
    pretty_kv(w, "directed", summary.directed.to_string())?;
    pretty_kv(w, "undirected", summary.undirected.to_string())?;
    pretty_kv(w, "colliders", vstructures.colliders.len().to_string())?;
    if !vstructures.conflicts.is_empty() {
        pretty_kv(w, "conflicts", vstructures.conflicts.len().to_string())?;
    }
    pretty_kv(
        w,
        "propagated",
        format!(
            "{} in {} passes ({} suppressed)",
            propagation.orientations.len(),
            propagation.passes,
            propagation.suppressed
        ),
    )?;
    if summary.directed_cycles > 0 {
        pretty_kv(w, "cycles", summary.directed_cycles.to_string())?;
    }
    pretty_kv(w, "fingerprint", &payload.fingerprint)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(json: &str) -> OrientInput {
        serde_json::from_str(json).expect("valid request json")
    }

    #[test]
    fn builds_from_sepset_triples() {
        let (names, skeleton, sepsets) = build(input(
            r#"{"skeleton": [[0,1,0],[1,0,1],[0,1,0]], "sepsets": [[0, 2, []]]}"#,
        ))
        .expect("valid request");
        assert_eq!(names, vec!["X1", "X2", "X3"]);
        assert_eq!(skeleton.edge_count(), 2);
        assert_eq!(sepsets.get(2, 0), Some(&[][..]));
    }

    #[test]
    fn rejects_two_sepset_forms() {
        let result = build(input(
            r#"{"skeleton": [[0]], "sepsets": [], "sepset_tensor": [[[-1]]]}"#,
        ));
        assert!(matches!(result, Err(InputError::Request(_))));
    }

    #[test]
    fn rejects_wrong_name_count() {
        let result = build(input(
            r#"{"variables": ["a"], "skeleton": [[0,0],[0,0]], "sepsets": []}"#,
        ));
        assert!(matches!(result, Err(InputError::Request(_))));
    }

    #[test]
    fn asymmetric_skeleton_is_an_engine_error() {
        let result = build(input(r#"{"skeleton": [[0,1],[0,0]], "sepsets": []}"#));
        assert!(matches!(
            result,
            Err(InputError::Engine(OrientError::MalformedSkeleton { .. }))
        ));
    }

    #[test]
    fn text_rendering_prints_matrix_rows() {
        let (variables, skeleton, sepsets) = build(input(
            r#"{"skeleton": [[0,1,0],[1,0,1],[0,1,0]], "sepsets": [[0, 2, []]]}"#,
        ))
        .expect("valid request");
        let outcome = orient(&skeleton, &sepsets).expect("orient");
        let payload = OrientOutput {
            variables,
            matrix: outcome.matrix,
            fingerprint: outcome.fingerprint,
            report: outcome.report,
        };

        let mut out = Vec::new();
        render_text(&payload, &mut out).expect("render");
        assert_eq!(String::from_utf8(out).expect("utf8"), "0 -1 0\n1 0 1\n0 -1 0\n");

        let mut out = Vec::new();
        render_pretty(&payload, &mut out).expect("render");
        let rendered = String::from_utf8(out).expect("utf8");
        assert!(rendered.contains("X1 -> X2"));
        assert!(rendered.contains("X3 -> X2"));
    }
}

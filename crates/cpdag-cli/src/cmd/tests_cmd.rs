//! `cpdag tests`: list the independence tests and their dispatch policy.

use std::io::Write;

use clap::Args;
use cpdag_core::backend::{BackendStatus, Dispatcher, FallbackPolicy};
use serde::Serialize;

use crate::output::{OutputMode, pretty_section, render_mode};

/// Arguments for `cpdag tests`.
#[derive(Args, Debug, Default)]
pub struct TestsArgs {}

#[derive(Debug, Serialize)]
struct TestsOutput {
    tests: Vec<BackendStatus>,
}

/// Execute `cpdag tests`.
pub fn run_tests(_args: &TestsArgs, output: OutputMode) -> anyhow::Result<()> {
    // The CLI ships no native backends; the listing shows policy only.
    let payload = TestsOutput {
        tests: Dispatcher::new().describe(),
    };
    render_mode(output, &payload, render_text, render_pretty)
}

const fn policy(status: &BackendStatus) -> &'static str {
    match status.policy {
        FallbackPolicy::CpuAllowed => "cpu-fallback",
        FallbackPolicy::GpuOnly => "gpu-only",
    }
}

const fn support(status: &BackendStatus) -> &'static str {
    if status.supported {
        "supported"
    } else {
        "unsupported"
    }
}

fn render_text(payload: &TestsOutput, w: &mut dyn Write) -> std::io::Result<()> {
    writeln!(w, "id  name  support  policy")?;
    for status in &payload.tests {
        writeln!(
            w,
            "{}  {}  {}  {}",
            status.identifier,
            status.long_name,
            support(status),
            policy(status)
        )?;
    }
    Ok(())
}

fn render_pretty(payload: &TestsOutput, w: &mut dyn Write) -> std::io::Result<()> {
    pretty_section(w, "Independence tests")?;
    for status in &payload.tests {
        writeln!(
            w,
            "{:<8} {:<24} {:<12} {}",
            status.identifier,
            status.long_name,
            support(status),
            policy(status)
        )?;
    }
    Ok(())
}

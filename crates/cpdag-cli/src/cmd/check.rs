//! `cpdag check`: validate a discovery config against a variable count.

use std::io::Write;
use std::path::PathBuf;

use clap::Args;
use cpdag_core::backend::{FallbackPolicy, IndependenceTest};
use cpdag_core::config::load_config;
use serde::Serialize;

use crate::output::{OutputMode, fail, pretty_kv, pretty_section, render_mode};

/// Arguments for `cpdag check`.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// TOML config file; defaults apply when it does not exist.
    #[arg(short, long, value_name = "FILE", default_value = "cpdag.toml")]
    pub config: PathBuf,

    /// Number of variables in the dataset the config will run on.
    #[arg(long, value_name = "N")]
    pub vars: usize,
}

#[derive(Debug, Serialize)]
struct CheckOutput {
    test: IndependenceTest,
    name: &'static str,
    policy: FallbackPolicy,
    allow_cpu_fallback: bool,
    alpha: f64,
    depth: usize,
    gamma: f64,
}

/// Execute `cpdag check`.
pub fn run_check(args: &CheckArgs, output: OutputMode) -> anyhow::Result<()> {
    let config = load_config(&args.config).map_err(|err| fail(output, &err))?;
    let discovery = config.discovery;
    let test = discovery.test().map_err(|err| fail(output, &err))?;
    let params = discovery.params(args.vars).map_err(|err| fail(output, &err))?;

    let payload = CheckOutput {
        test,
        name: test.long_name(),
        policy: test.fallback_policy(),
        allow_cpu_fallback: discovery.allow_cpu_fallback,
        alpha: params.alpha,
        depth: params.depth,
        gamma: params.gamma,
    };

    render_mode(output, &payload, render_text, render_pretty)
}

fn policy_label(payload: &CheckOutput) -> &'static str {
    match (payload.policy, payload.allow_cpu_fallback) {
        (FallbackPolicy::GpuOnly, _) => "gpu-only",
        (FallbackPolicy::CpuAllowed, true) => "cpu fallback allowed",
        (FallbackPolicy::CpuAllowed, false) => "cpu fallback disabled",
    }
}

fn render_text(payload: &CheckOutput, w: &mut dyn Write) -> std::io::Result<()> {
    writeln!(
        w,
        "ok test={} alpha={} depth={} gamma={}",
        payload.test, payload.alpha, payload.depth, payload.gamma
    )
}

fn render_pretty(payload: &CheckOutput, w: &mut dyn Write) -> std::io::Result<()> {
    pretty_section(w, "Discovery config")?;
    pretty_kv(w, "test", format!("{} ({})", payload.test, payload.name))?;
    pretty_kv(w, "acceleration", policy_label(payload))?;
    pretty_kv(w, "alpha", payload.alpha.to_string())?;
    pretty_kv(w, "depth", payload.depth.to_string())?;
    pretty_kv(w, "gamma", payload.gamma.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(test: IndependenceTest, allow: bool) -> CheckOutput {
        CheckOutput {
            test,
            name: test.long_name(),
            policy: test.fallback_policy(),
            allow_cpu_fallback: allow,
            alpha: 0.05,
            depth: 3,
            gamma: 1.0,
        }
    }

    #[test]
    fn text_line_lists_resolved_params() {
        let mut out = Vec::new();
        render_text(&payload(IndependenceTest::FisherZ, true), &mut out).expect("render");
        assert_eq!(
            String::from_utf8(out).expect("utf8"),
            "ok test=fisherz alpha=0.05 depth=3 gamma=1\n"
        );
    }

    #[test]
    fn gpu_only_label_ignores_fallback_flag() {
        assert_eq!(policy_label(&payload(IndependenceTest::CmiKnn, true)), "gpu-only");
        assert_eq!(
            policy_label(&payload(IndependenceTest::ChiSquare, false)),
            "cpu fallback disabled"
        );
    }
}

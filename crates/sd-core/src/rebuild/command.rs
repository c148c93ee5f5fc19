//! Derive build and test command lines from captured reproducers.

use std::path::Path;

use sd_model::{Invocation, Reproducer};

use crate::error::PipelineError;

pub const BUILD_PREFIX: &str = "tuxsuite build";
pub const TEST_PREFIX: &str = "tuxsuite test";

const COMMENTED_BUILD: &str = "# tuxsuite build";

/// Kernel configuration forced on the debug rebuild.
pub const DEBUG_KCONFIG: [&str; 2] = [
    "CONFIG_DEBUG_INFO=y",
    "CONFIG_DEBUG_INFO_DWARF_TOOLCHAIN_DEFAULT=y",
];

/// Targets requested from the debug rebuild.
pub const DEBUG_TARGETS: [&str; 4] = ["config", "kernel", "modules", "debugkernel"];

/// First build invocation in the reproducer.
///
/// Reproducers often ship the build line commented out; such lines are
/// uncommented before matching.
pub fn build_invocation(reproducer: &Reproducer) -> Result<Invocation, PipelineError> {
    reproducer
        .lines()
        .map(|line| line.replace(COMMENTED_BUILD, BUILD_PREFIX))
        .find(|line| line.starts_with(BUILD_PREFIX))
        .and_then(|line| Invocation::parse_line(&line))
        .ok_or_else(|| PipelineError::MissingReproducerLine {
            prefix: BUILD_PREFIX,
            source_url: reproducer.source_url.clone(),
        })
}

/// First test invocation in the reproducer.
pub fn test_invocation(reproducer: &Reproducer) -> Result<Invocation, PipelineError> {
    reproducer
        .lines()
        .find(|line| line.starts_with(TEST_PREFIX))
        .and_then(Invocation::parse_line)
        .ok_or_else(|| PipelineError::MissingReproducerLine {
            prefix: TEST_PREFIX,
            source_url: reproducer.source_url.clone(),
        })
}

/// Keep `--flag value` pairs and `key=value` tokens, drop every other bare
/// token. `--flag=value` is a single token and kept as is. A trailing flag
/// without a value is kept alone.
///
/// Applying this to its own output returns the output unchanged.
pub fn sanitize_params(tokens: &[String]) -> Vec<String> {
    let mut out = Vec::with_capacity(tokens.len());
    let mut iter = tokens.iter();
    while let Some(tok) = iter.next() {
        if tok.starts_with("--") {
            out.push(tok.clone());
            if !tok.contains('=')
                && let Some(value) = iter.next()
            {
                out.push(value.clone());
            }
        } else if tok.contains('=') {
            out.push(tok.clone());
        }
    }
    out
}

/// Debug-info rebuild of the reproducer's build.
pub fn debug_build(program: &str, original: &Invocation, json_out: &Path) -> Invocation {
    let mut inv = Invocation::new(program, ["build"]).args(sanitize_params(original.args_after_subcommand()));
    for kconfig in DEBUG_KCONFIG {
        inv = inv.args(["--kconfig", kconfig]);
    }
    inv.args(["--json-out".to_string(), json_out.display().to_string()])
        .args(DEBUG_TARGETS)
}

/// Replace the value after `--kernel` / `--modules` with the given URLs.
///
/// Every other token is kept verbatim and in order. Fails with the flag
/// name when `--modules` is present but no modules URL is known.
pub fn substitute_artifacts(
    args: &[String],
    kernel_url: &str,
    modules_url: Option<&str>,
) -> Result<Vec<String>, &'static str> {
    let mut out = Vec::with_capacity(args.len());
    let mut iter = args.iter();
    while let Some(tok) = iter.next() {
        let replacement = match tok.as_str() {
            "--kernel" => kernel_url,
            "--modules" => modules_url.ok_or("modules")?,
            _ => {
                out.push(tok.clone());
                continue;
            }
        };
        out.push(tok.clone());
        out.push(replacement.to_string());
        iter.next();
    }
    Ok(out)
}

/// The reproducer's test, pointed at freshly built artifacts.
pub fn rerun_test(
    program: &str,
    original: &Invocation,
    kernel_url: &str,
    modules_url: Option<&str>,
    json_out: &Path,
) -> Result<Invocation, &'static str> {
    let args = substitute_artifacts(&original.args, kernel_url, modules_url)?;
    Ok(Invocation::new(program, args).args(["--json-out".to_string(), json_out.display().to_string()]))
}

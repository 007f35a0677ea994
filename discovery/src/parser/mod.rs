//! Framework output parsers sharing one contract.
//!
//! Each parser turns raw discovery output into a list of [`RawTestId`]s.
//! A line that does not match the expected identifier grammar is
//! skipped and logged, never fatal: one malformed line must not discard
//! an otherwise successful discovery. Zero identifiers under a failing
//! exit code is a [`DiscoveryError::Parse`]; zero identifiers under a
//! successful exit is a legitimate empty result.

pub(crate) mod nosetest;
pub(crate) mod pytest;
pub(crate) mod unittest;

use crate::error::{DiscoveryError, DiscoveryResult};
use crate::framework::TestFramework;
use crate::process::ProcessOutput;
use crate::types::RawTestId;
use std::path::{Component, Path, PathBuf};

/// Inputs every parser needs beyond the raw text: where discovery ran
/// and which directory module-style identifiers are relative to.
#[derive(Debug, Clone)]
pub struct ParseContext {
    pub root: PathBuf,
    pub start_dir: PathBuf,
}

impl ParseContext {
    pub fn new(root: impl Into<PathBuf>, start_dir: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            start_dir: start_dir.into(),
        }
    }
}

/// Apply the shared zero-identifier rule after a parse pass.
pub(crate) fn finish(
    framework: TestFramework,
    output: &ProcessOutput,
    ids: Vec<RawTestId>,
) -> DiscoveryResult<Vec<RawTestId>> {
    if ids.is_empty() && framework.exit_indicates_failure(output.exit_code) {
        return Err(DiscoveryError::Parse {
            framework,
            exit_code: output.exit_code,
            stdout: output.stdout.clone(),
            stderr: output.stderr.clone(),
        });
    }
    Ok(ids)
}

pub(crate) fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_')
}

/// Class segments in dotted identifiers follow Python convention:
/// a leading uppercase letter marks a suite, anything else a module.
pub(crate) fn is_suite_segment(s: &str) -> bool {
    is_identifier(s) && s.chars().next().is_some_and(|c| c.is_uppercase())
}

/// Split a dotted identifier into (module segments, suite names,
/// function name). The suite run is the longest chain of class-like
/// segments directly preceding the function.
pub(crate) fn split_dotted(segments: &[&str]) -> Option<(Vec<String>, Vec<String>, String)> {
    if segments.len() < 2 || !segments.iter().all(|s| is_identifier(s)) {
        return None;
    }

    let function = segments[segments.len() - 1].to_string();
    let mut suite_start = segments.len() - 1;
    while suite_start > 1 && is_suite_segment(segments[suite_start - 1]) {
        suite_start -= 1;
    }

    let module: Vec<String> = segments[..suite_start].iter().map(|s| s.to_string()).collect();
    let suites: Vec<String> = segments[suite_start..segments.len() - 1]
        .iter()
        .map(|s| s.to_string())
        .collect();

    Some((module, suites, function))
}

/// Resolve dotted module segments to a file path relative to the root,
/// going through the configured start directory.
pub(crate) fn resolve_module(context: &ParseContext, module: &[String]) -> PathBuf {
    let mut path = context.start_dir.clone();
    if path.is_absolute() {
        if let Ok(stripped) = path.strip_prefix(&context.root) {
            path = stripped.to_path_buf();
        }
    }
    for segment in module {
        path.push(segment);
    }
    path.set_extension("py");
    normalize(&path)
}

/// Drop `.` components so equal paths compare equal as keys.
pub(crate) fn normalize(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

//! pytest output parser.
//!
//! `--collect-only -q` prints one nodeid per line:
//! `relative/path.py::ClassName::test_name` or
//! `relative/path.py::test_name`, followed by a summary line the
//! identifier grammar rejects.

use super::{finish, is_identifier, normalize, ParseContext};
use crate::error::DiscoveryResult;
use crate::framework::TestFramework;
use crate::process::ProcessOutput;
use crate::types::RawTestId;
use std::path::Path;
use tracing::debug;

pub(crate) fn parse(
    _context: &ParseContext,
    output: &ProcessOutput,
) -> DiscoveryResult<Vec<RawTestId>> {
    let mut ids = Vec::new();
    for line in output.stdout.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match parse_line(line) {
            Some(id) => ids.push(id),
            None => debug!(line, "skipping unrecognized pytest output line"),
        }
    }
    finish(TestFramework::Pytest, output, ids)
}

fn parse_line(line: &str) -> Option<RawTestId> {
    if line.contains(char::is_whitespace) || !line.contains("::") {
        return None;
    }

    let mut parts = line.split("::");
    let path = parts.next()?;
    if !path.ends_with(".py") {
        return None;
    }

    let rest: Vec<&str> = parts.collect();
    let (function_part, suite_parts) = rest.split_last()?;
    let function = parse_function_name(function_part)?;
    if !suite_parts.iter().all(|s| is_identifier(s)) {
        return None;
    }

    Some(RawTestId::new(
        normalize(Path::new(path)),
        suite_parts.iter().map(|s| s.to_string()).collect(),
        function,
    ))
}

/// Accept plain names and parametrized ids like `test_a[case-1]`; the
/// bracket suffix is kept as part of the function name.
fn parse_function_name(part: &str) -> Option<String> {
    let base = part.split('[').next()?;
    if !is_identifier(base) {
        return None;
    }
    Some(part.to_string())
}

//! unittest output parser.
//!
//! Discovery output is a sequence of dotted test identifiers, one per
//! line: `module.Class.method` or `module.function`, with the module
//! path relative to the start directory.

use super::{finish, resolve_module, split_dotted, ParseContext};
use crate::error::DiscoveryResult;
use crate::framework::TestFramework;
use crate::process::ProcessOutput;
use crate::types::RawTestId;
use tracing::debug;

pub(crate) fn parse(
    context: &ParseContext,
    output: &ProcessOutput,
) -> DiscoveryResult<Vec<RawTestId>> {
    let mut ids = Vec::new();
    // unittest writes diagnostics to stderr; some launchers put the
    // identifier listing there as well.
    for line in output.stdout.lines().chain(output.stderr.lines()) {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match parse_line(context, line) {
            Some(id) => ids.push(id),
            None => debug!(line, "skipping unrecognized unittest output line"),
        }
    }
    finish(TestFramework::Unittest, output, ids)
}

fn parse_line(context: &ParseContext, line: &str) -> Option<RawTestId> {
    if line.contains(char::is_whitespace) {
        return None;
    }
    let segments: Vec<&str> = line.split('.').collect();
    let (module, suites, function) = split_dotted(&segments)?;
    let file = resolve_module(context, &module);
    Some(RawTestId::new(file, suites, function))
}

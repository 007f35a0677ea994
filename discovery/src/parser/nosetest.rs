//! nose output parser.
//!
//! nose identifiers resemble unittest's dotted form but may carry a
//! file-path prefix instead: `path/to/test_file.py:Class.test_name`.
//! The parser disambiguates the two shapes per line.

use super::{finish, is_identifier, normalize, resolve_module, split_dotted, ParseContext};
use crate::error::DiscoveryResult;
use crate::framework::TestFramework;
use crate::process::ProcessOutput;
use crate::types::RawTestId;
use std::path::Path;
use tracing::debug;

pub(crate) fn parse(
    context: &ParseContext,
    output: &ProcessOutput,
) -> DiscoveryResult<Vec<RawTestId>> {
    let mut ids = Vec::new();
    for line in output.stdout.lines().chain(output.stderr.lines()) {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match parse_line(context, line) {
            Some(id) => ids.push(id),
            None => debug!(line, "skipping unrecognized nose output line"),
        }
    }
    finish(TestFramework::Nosetest, output, ids)
}

fn parse_line(context: &ParseContext, line: &str) -> Option<RawTestId> {
    if line.contains(char::is_whitespace) {
        return None;
    }

    // Path-style: everything before ':' is the file itself.
    if let Some((path, qualified)) = line.split_once(':') {
        if path.ends_with(".py") {
            return parse_path_style(context, path, qualified);
        }
    }

    let segments: Vec<&str> = line.split('.').collect();
    let (module, suites, function) = split_dotted(&segments)?;
    let file = resolve_module(context, &module);
    Some(RawTestId::new(file, suites, function))
}

fn parse_path_style(context: &ParseContext, path: &str, qualified: &str) -> Option<RawTestId> {
    let segments: Vec<&str> = qualified.split('.').collect();
    if segments.is_empty() || !segments.iter().all(|s| is_identifier(s)) {
        return None;
    }

    let (function, suites) = segments.split_last()?;
    let mut file = normalize(Path::new(path));
    if file.is_absolute() {
        if let Ok(stripped) = file.strip_prefix(&context.root) {
            file = stripped.to_path_buf();
        }
    }

    Some(RawTestId::new(
        file,
        suites.iter().map(|s| s.to_string()).collect(),
        *function,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn context() -> ParseContext {
        ParseContext::new("/work/project", ".")
    }

    fn ok_output(stdout: &str) -> ProcessOutput {
        ProcessOutput {
            stdout: stdout.to_string(),
            exit_code: Some(0),
            ..Default::default()
        }
    }

    #[test]
    fn test_dotted_identifiers_parse_like_unittest() {
        let output = ok_output("tests.test_one.TestOne.test_a\n");
        let ids = parse(&context(), &output).unwrap();
        assert_eq!(ids[0].file, PathBuf::from("tests/test_one.py"));
        assert_eq!(ids[0].suites, vec!["TestOne"]);
        assert_eq!(ids[0].function, "test_a");
    }

    #[test]
    fn test_path_style_identifiers() {
        let output = ok_output(
            "tests/test_one.py:TestOne.test_a\n\
             tests/test_two.py:test_standalone\n",
        );
        let ids = parse(&context(), &output).unwrap();
        assert_eq!(ids.len(), 2);

        assert_eq!(ids[0].file, PathBuf::from("tests/test_one.py"));
        assert_eq!(ids[0].suites, vec!["TestOne"]);

        assert_eq!(ids[1].file, PathBuf::from("tests/test_two.py"));
        assert!(ids[1].suites.is_empty());
        assert_eq!(ids[1].function, "test_standalone");
    }

    #[test]
    fn test_absolute_path_prefix_rebased_on_root() {
        let output = ok_output("/work/project/tests/test_one.py:TestOne.test_a\n");
        let ids = parse(&context(), &output).unwrap();
        assert_eq!(ids[0].file, PathBuf::from("tests/test_one.py"));
    }

    #[test]
    fn test_mixed_shapes_in_one_run() {
        let output = ok_output(
            "tests.test_one.TestOne.test_a\n\
             tests/test_two.py:test_b\n",
        );
        let ids = parse(&context(), &output).unwrap();
        assert_eq!(ids.len(), 2);
    }

    #[test]
    fn test_progress_noise_is_skipped() {
        let output = ok_output(
            "tests.test_one.TestOne.test_a\n\
             Ran 1 test in 0.002s\n\
             OK\n",
        );
        let ids = parse(&context(), &output).unwrap();
        assert_eq!(ids.len(), 1);
    }

    #[test]
    fn test_zero_identifiers_with_failing_exit_is_error() {
        let output = ProcessOutput {
            stderr: "Usage: nosetests [options]\n".to_string(),
            exit_code: Some(2),
            ..Default::default()
        };
        assert!(parse(&context(), &output).is_err());
    }
}

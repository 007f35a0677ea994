//! Builds the exact command line for a framework's discovery mode.
//!
//! The mandatory discovery flags always end up in the argv; configured
//! arguments take precedence when they repeat a mandatory flag, and a
//! configured flag the framework cannot honor in discovery mode fails
//! before any process is spawned.

use crate::error::{DiscoveryError, DiscoveryResult};
use crate::framework::TestFramework;
use std::path::PathBuf;

/// A ready-to-spawn command line, plus the start directory test
/// identifiers resolve against (unittest `-s`, nose `-w`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub start_dir: PathBuf,
}

/// Build the discovery invocation for `framework` from the configured
/// argument list. An empty list means framework defaults.
pub fn build(framework: TestFramework, configured: &[String]) -> DiscoveryResult<Invocation> {
    for arg in configured {
        let flag = flag_name(arg);
        if framework.conflicting_args().contains(&flag) {
            return Err(DiscoveryError::Configuration {
                framework,
                message: format!("'{flag}' cannot be combined with discovery mode"),
            });
        }
    }

    let effective: Vec<String> = if configured.is_empty() {
        framework.default_args().iter().map(|s| s.to_string()).collect()
    } else {
        configured.to_vec()
    };

    let mut args = Vec::new();
    match framework {
        // `-m unittest discover` is the mode itself, never elided.
        TestFramework::Unittest => {
            args.extend(framework.discovery_args().iter().map(|s| s.to_string()));
        }
        TestFramework::Pytest | TestFramework::Nosetest => {
            for mandatory in framework.discovery_args() {
                let already_configured = effective
                    .iter()
                    .any(|arg| flag_name(arg) == flag_name(mandatory));
                if !already_configured {
                    args.push(mandatory.to_string());
                }
            }
        }
    }
    args.extend(effective.iter().cloned());

    let start_dir = start_directory(framework, &effective);

    Ok(Invocation {
        program: framework.executable().to_string(),
        args,
        start_dir,
    })
}

/// The flag portion of an argument: `-s=./tests` compares as `-s`.
fn flag_name(arg: &str) -> &str {
    arg.split('=').next().unwrap_or(arg)
}

/// Extract the directory that module-style identifiers are relative
/// to. Both `-s=dir` and `-s dir` spellings are accepted.
fn start_directory(framework: TestFramework, args: &[String]) -> PathBuf {
    let flags: &[&str] = match framework {
        TestFramework::Unittest => &["-s", "--start-directory"],
        TestFramework::Nosetest => &["-w", "--where"],
        TestFramework::Pytest => return PathBuf::from("."),
    };

    let mut iter = args.iter().peekable();
    while let Some(arg) = iter.next() {
        let flag = flag_name(arg);
        if !flags.contains(&flag) {
            continue;
        }
        if let Some((_, value)) = arg.split_once('=') {
            return PathBuf::from(value);
        }
        if let Some(value) = iter.peek() {
            return PathBuf::from(value.as_str());
        }
    }
    PathBuf::from(".")
}

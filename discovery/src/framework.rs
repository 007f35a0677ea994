use crate::error::DiscoveryResult;
use crate::parser::{self, ParseContext};
use crate::process::ProcessOutput;
use crate::types::RawTestId;
use serde::{Deserialize, Serialize};

/// The test frameworks the engine can drive. Each tag maps to an
/// executable, its mandatory discovery-mode flags, and an output
/// parser; framework quirks stay isolated behind this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestFramework {
    Unittest,
    Pytest,
    Nosetest,
}

impl TestFramework {
    pub const ALL: [TestFramework; 3] = [
        TestFramework::Unittest,
        TestFramework::Pytest,
        TestFramework::Nosetest,
    ];

    /// Executable invoked in the discovery root. unittest ships with
    /// the interpreter, so it is driven through `python -m`.
    pub fn executable(&self) -> &'static str {
        match self {
            TestFramework::Unittest => "python",
            TestFramework::Pytest => "pytest",
            TestFramework::Nosetest => "nosetests",
        }
    }

    /// Flags that put the framework in discovery-only mode. Always
    /// present in the final argv; configured args win on conflicts.
    pub(crate) fn discovery_args(&self) -> &'static [&'static str] {
        match self {
            TestFramework::Unittest => &["-m", "unittest", "discover"],
            TestFramework::Pytest => &["--collect-only", "-q"],
            TestFramework::Nosetest => &["--collect-only", "-v"],
        }
    }

    /// Configured flags that cannot be reconciled with discovery-only
    /// mode: they demand an execution context that never exists here.
    pub(crate) fn conflicting_args(&self) -> &'static [&'static str] {
        match self {
            TestFramework::Unittest => &["-c", "--catch", "-f", "--failfast", "-b", "--buffer"],
            TestFramework::Pytest => &["--pdb", "--trace"],
            TestFramework::Nosetest => &["--pdb", "--pdb-failures", "--pdb-errors"],
        }
    }

    /// Arguments applied when the configured list is empty.
    pub(crate) fn default_args(&self) -> &'static [&'static str] {
        match self {
            TestFramework::Unittest => &["-v", "-s", ".", "-p", "*test*.py"],
            TestFramework::Pytest => &[],
            TestFramework::Nosetest => &[],
        }
    }

    /// Whether an exit code means discovery itself failed. pytest exits
    /// with 5 when collection succeeds but finds nothing; nose reports
    /// collection noise through non-zero codes the parser overrides
    /// when the output is usable.
    pub(crate) fn exit_indicates_failure(&self, exit_code: Option<i32>) -> bool {
        match self {
            TestFramework::Unittest => !matches!(exit_code, Some(0)),
            TestFramework::Pytest => !matches!(exit_code, Some(0) | Some(5)),
            TestFramework::Nosetest => !matches!(exit_code, Some(0)),
        }
    }

    /// Parse raw discovery output into test identifiers.
    pub fn parse_output(
        &self,
        context: &ParseContext,
        output: &ProcessOutput,
    ) -> DiscoveryResult<Vec<RawTestId>> {
        match self {
            TestFramework::Unittest => parser::unittest::parse(context, output),
            TestFramework::Pytest => parser::pytest::parse(context, output),
            TestFramework::Nosetest => parser::nosetest::parse(context, output),
        }
    }
}

impl std::fmt::Display for TestFramework {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TestFramework::Unittest => write!(f, "unittest"),
            TestFramework::Pytest => write!(f, "pytest"),
            TestFramework::Nosetest => write!(f, "nosetest"),
        }
    }
}

impl std::str::FromStr for TestFramework {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "unittest" => Ok(TestFramework::Unittest),
            "pytest" => Ok(TestFramework::Pytest),
            "nosetest" | "nose" | "nosetests" => Ok(TestFramework::Nosetest),
            other => Err(format!(
                "unknown test framework '{other}' (expected unittest, pytest, or nosetest)"
            )),
        }
    }
}

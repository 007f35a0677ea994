use crate::framework::TestFramework;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// What triggered a discovery call. Recorded for observability only;
/// it never changes discovery behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandSource {
    Ui,
    Auto,
    CodeLens,
    Cli,
}

impl std::fmt::Display for CommandSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommandSource::Ui => write!(f, "ui"),
            CommandSource::Auto => write!(f, "auto"),
            CommandSource::CodeLens => write!(f, "codelens"),
            CommandSource::Cli => write!(f, "cli"),
        }
    }
}

/// One test identifier as extracted from framework output, before any
/// tree structure exists. `suites` is outermost-first and may be empty
/// for module-level functions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTestId {
    /// Source file path, relative to the discovery root.
    pub file: PathBuf,
    /// Enclosing class names, outermost first.
    pub suites: Vec<String>,
    /// Function name, exactly as the framework reported it.
    pub function: String,
    /// Line number, when the framework provides one.
    pub line: Option<u32>,
}

impl RawTestId {
    pub fn new(file: impl Into<PathBuf>, suites: Vec<String>, function: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            suites,
            function: function.into(),
            line: None,
        }
    }
}

/// Normalized key for a file path: forward slashes, no leading `./`.
pub fn file_key(relative: &Path) -> String {
    let mut parts = Vec::new();
    for component in relative.components() {
        match component {
            std::path::Component::CurDir => {}
            other => parts.push(other.as_os_str().to_string_lossy().into_owned()),
        }
    }
    parts.join("/")
}

/// Identity key for a suite: `file::Outer::Inner`.
pub fn suite_key(file: &str, suites: &[String]) -> String {
    let mut key = String::from(file);
    for suite in suites {
        key.push_str("::");
        key.push_str(suite);
    }
    key
}

/// Identity key for a function: `file::Outer::Inner::test_name`.
pub fn function_key(file: &str, suites: &[String], function: &str) -> String {
    let mut key = suite_key(file, suites);
    key.push_str("::");
    key.push_str(function);
    key
}

/// A discovered test function. Leaf of the tree; addressed by identity
/// key, stable across re-discovery for unchanged tests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestFunction {
    pub key: String,
    pub name: String,
    /// `Class.test_name` for suite members, bare name otherwise.
    pub qualified_name: String,
    pub file: PathBuf,
    /// Key of the owning suite; `None` for module-level functions.
    pub suite_key: Option<String>,
    pub line: Option<u32>,
}

/// A test class or logical grouping. Owns its functions exclusively,
/// children addressed by key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSuite {
    pub key: String,
    pub name: String,
    /// Dotted path of enclosing suite names, e.g. `Outer.Inner`.
    pub qualified_name: String,
    pub file: PathBuf,
    /// Key of the enclosing suite, for nested classes.
    pub parent_key: Option<String>,
    pub suite_keys: Vec<String>,
    pub function_keys: Vec<String>,
}

/// One discovered source file containing tests. Top-level suites and
/// functions only; nested entities hang off their suites.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestFile {
    pub key: String,
    pub relative_path: PathBuf,
    pub absolute_path: PathBuf,
    pub suite_keys: Vec<String>,
    pub function_keys: Vec<String>,
}

/// The tree root returned to callers: flat deduplicated collections in
/// first-seen order, plus the structural file list for traversal.
///
/// Invariant: every suite and function in the flat collections is
/// reachable from exactly one file, and no identity key appears twice.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiscoveredTests {
    pub test_files: Vec<TestFile>,
    pub test_suites: Vec<TestSuite>,
    pub test_functions: Vec<TestFunction>,
}

impl DiscoveredTests {
    pub fn is_empty(&self) -> bool {
        self.test_functions.is_empty()
    }

    pub fn file(&self, key: &str) -> Option<&TestFile> {
        self.test_files.iter().find(|f| f.key == key)
    }

    pub fn suite(&self, key: &str) -> Option<&TestSuite> {
        self.test_suites.iter().find(|s| s.key == key)
    }

    pub fn function(&self, key: &str) -> Option<&TestFunction> {
        self.test_functions.iter().find(|f| f.key == key)
    }

    /// Identity keys of all functions, in first-seen order. Callers
    /// tracking ancillary state (run status, cached results) re-key
    /// against these after re-discovery.
    pub fn function_keys(&self) -> impl Iterator<Item = &str> {
        self.test_functions.iter().map(|f| f.key.as_str())
    }

    pub fn suite_keys(&self) -> impl Iterator<Item = &str> {
        self.test_suites.iter().map(|s| s.key.as_str())
    }

    pub fn file_keys(&self) -> impl Iterator<Item = &str> {
        self.test_files.iter().map(|f| f.key.as_str())
    }
}

/// Metadata for one completed discovery run. Ephemeral: kept only as
/// the manager's `last_run()` for observability, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryRun {
    pub framework: TestFramework,
    pub root: PathBuf,
    pub source: CommandSource,
    pub exit_code: Option<i32>,
    pub started_at: DateTime<Utc>,
    pub duration: Duration,
}

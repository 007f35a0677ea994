//! Test discovery engine for Python unit tests.
//!
//! Drives unittest, pytest, or nose in discovery-only mode as an
//! external process, parses the framework's output into a canonical
//! TestFile → TestSuite → TestFunction tree, and reconciles successive
//! runs by stable identity keys. Discovery only: the engine never
//! executes tests or interprets pass/fail results.

pub mod args;
pub mod config;
pub mod error;
pub mod framework;
pub mod manager;
pub mod parser;
pub mod process;
pub mod tree;
pub mod types;

pub mod prelude {
    pub use crate::args::{build as build_invocation, Invocation};
    pub use crate::config::DiscoveryConfig;
    pub use crate::error::{DiscoveryError, DiscoveryResult};
    pub use crate::framework::TestFramework;
    pub use crate::manager::{TestManager, TestManagerFactory};
    pub use crate::parser::ParseContext;
    pub use crate::process::{ProcessOutput, ProcessRunner, TokioRunner};
    pub use crate::tree::build as build_tree;
    pub use crate::types::{
        CommandSource, DiscoveredTests, DiscoveryRun, RawTestId, TestFile, TestFunction, TestSuite,
    };
    pub use tokio_util::sync::CancellationToken;
}

use crate::framework::TestFramework;
use serde::{Deserialize, Serialize};

/// Engine configuration: per-framework argument lists plus the output
/// capture limit. Argument lists use framework-specific syntax; an
/// empty list means framework defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    pub unittest_args: Vec<String>,
    pub pytest_args: Vec<String>,
    pub nosetest_args: Vec<String>,
    /// Maximum bytes captured per output stream; overflow is truncated
    /// so parsers can still attempt partial recovery.
    pub output_cap: usize,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            unittest_args: Vec::new(),
            pytest_args: Vec::new(),
            nosetest_args: Vec::new(),
            output_cap: 1024 * 1024,
        }
    }
}

impl DiscoveryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_args(mut self, framework: TestFramework, args: Vec<String>) -> Self {
        match framework {
            TestFramework::Unittest => self.unittest_args = args,
            TestFramework::Pytest => self.pytest_args = args,
            TestFramework::Nosetest => self.nosetest_args = args,
        }
        self
    }

    pub fn with_output_cap(mut self, output_cap: usize) -> Self {
        self.output_cap = output_cap;
        self
    }

    pub fn args_for(&self, framework: TestFramework) -> &[String] {
        match framework {
            TestFramework::Unittest => &self.unittest_args,
            TestFramework::Pytest => &self.pytest_args,
            TestFramework::Nosetest => &self.nosetest_args,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.output_cap == 0 {
            return Err("Output cap must be greater than 0".to_string());
        }

        for framework in TestFramework::ALL {
            if self.args_for(framework).iter().any(|arg| arg.trim().is_empty()) {
                return Err(format!("{framework} argument list contains an empty entry"));
            }
        }

        Ok(())
    }
}

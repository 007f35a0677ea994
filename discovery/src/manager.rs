//! Discovery orchestration and re-discovery state.
//!
//! One [`TestManager`] owns the discovery state for a single
//! (framework, root) pair. Calls against one manager are serialized;
//! a call that was queued behind an in-flight discovery receives that
//! discovery's outcome instead of spawning a second process. Distinct
//! (framework, root) pairs share no mutable state and run freely in
//! parallel.

use crate::args;
use crate::config::DiscoveryConfig;
use crate::error::DiscoveryResult;
use crate::framework::TestFramework;
use crate::parser::ParseContext;
use crate::process::{ProcessRunner, TokioRunner};
use crate::tree;
use crate::types::{CommandSource, DiscoveredTests, DiscoveryRun};
use chrono::Utc;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError};
use std::time::Instant;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Per-(framework, root) discovery façade.
pub struct TestManager {
    framework: TestFramework,
    root: PathBuf,
    config: DiscoveryConfig,
    runner: Arc<dyn ProcessRunner>,
    /// Bumped after every completed discovery attempt. A caller that
    /// entered before the bump and acquired the lock after it has been
    /// coalesced onto that attempt.
    generation: AtomicU64,
    state: Mutex<ManagerState>,
}

#[derive(Default)]
struct ManagerState {
    cached: Option<Arc<DiscoveredTests>>,
    last_outcome: Option<DiscoveryResult<Arc<DiscoveredTests>>>,
    last_run: Option<DiscoveryRun>,
}

impl TestManager {
    pub fn new(framework: TestFramework, root: impl Into<PathBuf>, config: DiscoveryConfig) -> Self {
        Self::with_runner(framework, root, config, Arc::new(TokioRunner::new()))
    }

    /// Construct with a custom process runner (tests substitute a
    /// scripted one here).
    pub fn with_runner(
        framework: TestFramework,
        root: impl Into<PathBuf>,
        config: DiscoveryConfig,
        runner: Arc<dyn ProcessRunner>,
    ) -> Self {
        Self {
            framework,
            root: root.into(),
            config,
            runner,
            generation: AtomicU64::new(0),
            state: Mutex::new(ManagerState::default()),
        }
    }

    pub fn framework(&self) -> TestFramework {
        self.framework
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Discover tests for this manager's (framework, root) pair.
    ///
    /// With `force_refresh` unset, a cached prior result is returned
    /// without spawning a process. `quiet` lowers the log severity of
    /// failures but never suppresses the returned error. `source` is
    /// recorded for observability only.
    pub async fn discover_tests(
        &self,
        source: CommandSource,
        force_refresh: bool,
        quiet: bool,
        cancel: &CancellationToken,
    ) -> DiscoveryResult<Arc<DiscoveredTests>> {
        let entry_generation = self.generation.load(Ordering::Acquire);
        let mut state = self.state.lock().await;

        // A discovery completed while we waited on the lock: this call
        // was concurrent with it, so its outcome is ours. At most one
        // process runs for any set of concurrent callers.
        if self.generation.load(Ordering::Acquire) > entry_generation {
            if let Some(outcome) = &state.last_outcome {
                debug!(
                    framework = %self.framework,
                    root = %self.root.display(),
                    "coalescing onto just-completed discovery"
                );
                return outcome.clone();
            }
        }

        if !force_refresh {
            if let Some(cached) = &state.cached {
                debug!(
                    framework = %self.framework,
                    root = %self.root.display(),
                    "returning cached discovery result"
                );
                return Ok(cached.clone());
            }
        }

        let outcome = self.run_discovery(source, cancel).await;
        self.generation.fetch_add(1, Ordering::AcqRel);

        match outcome {
            Ok((tests, run)) => {
                let tests = Arc::new(tests);
                // Full replacement: the new tree is the manager's
                // state. Collaborators re-key ancillary data against
                // it by identity key.
                state.cached = Some(Arc::clone(&tests));
                state.last_run = Some(run);
                state.last_outcome = Some(Ok(Arc::clone(&tests)));
                Ok(tests)
            }
            Err(e) => {
                // A failed run never invalidates the previous tree.
                state.last_outcome = Some(Err(e.clone()));
                if e.is_cancelled() || quiet {
                    debug!(framework = %self.framework, error = %e, "discovery did not complete");
                } else {
                    error!(framework = %self.framework, error = %e, "discovery failed");
                }
                Err(e)
            }
        }
    }

    /// Drop the cached tree so the next call re-discovers even without
    /// `force_refresh`.
    pub async fn invalidate(&self) {
        let mut state = self.state.lock().await;
        state.cached = None;
        state.last_outcome = None;
    }

    /// The most recent successful tree, if any.
    pub async fn cached_tests(&self) -> Option<Arc<DiscoveredTests>> {
        self.state.lock().await.cached.clone()
    }

    /// Metadata for the most recent successful run.
    pub async fn last_run(&self) -> Option<DiscoveryRun> {
        self.state.lock().await.last_run.clone()
    }

    async fn run_discovery(
        &self,
        source: CommandSource,
        cancel: &CancellationToken,
    ) -> DiscoveryResult<(DiscoveredTests, DiscoveryRun)> {
        let invocation = args::build(self.framework, self.config.args_for(self.framework))?;

        info!(
            framework = %self.framework,
            root = %self.root.display(),
            source = %source,
            "discovering tests"
        );
        let started_at = Utc::now();
        let started = Instant::now();

        let output = self
            .runner
            .run(&invocation, &self.root, self.config.output_cap, cancel)
            .await?;

        let context = ParseContext::new(self.root.clone(), invocation.start_dir.clone());
        let raw_ids = self.framework.parse_output(&context, &output)?;
        let tests = tree::build(&raw_ids, &self.root);

        info!(
            framework = %self.framework,
            files = tests.test_files.len(),
            suites = tests.test_suites.len(),
            functions = tests.test_functions.len(),
            "discovery complete"
        );

        let run = DiscoveryRun {
            framework: self.framework,
            root: self.root.clone(),
            source,
            exit_code: output.exit_code,
            started_at,
            duration: started.elapsed(),
        };
        Ok((tests, run))
    }
}

/// Hands out one shared [`TestManager`] per (framework, root) pair so
/// repeat callers benefit from caching and coalescing.
pub struct TestManagerFactory {
    config: DiscoveryConfig,
    runner: Arc<dyn ProcessRunner>,
    managers: std::sync::Mutex<HashMap<(TestFramework, PathBuf), Arc<TestManager>>>,
}

impl TestManagerFactory {
    pub fn new(config: DiscoveryConfig) -> Self {
        Self::with_runner(config, Arc::new(TokioRunner::new()))
    }

    pub fn with_runner(config: DiscoveryConfig, runner: Arc<dyn ProcessRunner>) -> Self {
        Self {
            config,
            runner,
            managers: std::sync::Mutex::new(HashMap::new()),
        }
    }

    pub fn manager(&self, framework: TestFramework, root: &Path) -> Arc<TestManager> {
        let mut managers = self
            .managers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::clone(
            managers
                .entry((framework, root.to_path_buf()))
                .or_insert_with(|| {
                    Arc::new(TestManager::with_runner(
                        framework,
                        root,
                        self.config.clone(),
                        Arc::clone(&self.runner),
                    ))
                }),
        )
    }
}

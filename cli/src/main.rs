use clap::{Parser, Subcommand};
use discovery::prelude::*;
use std::path::PathBuf;
use std::time::Duration;
use tracing::error;

#[derive(Parser)]
#[command(name = "pyscout")]
#[command(about = "Discover Python unit tests via unittest, pytest, or nose")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Discover tests under a project root
    Discover {
        /// Test framework to drive: unittest, pytest, or nosetest
        #[arg(short, long, default_value = "pytest")]
        framework: String,
        /// Discovery root directory
        #[arg(short, long, default_value = ".")]
        root: PathBuf,
        /// Emit the discovered tree as JSON
        #[arg(long)]
        json: bool,
        /// Suppress progress output
        #[arg(short, long)]
        quiet: bool,
        /// Re-discover even if a cached result exists
        #[arg(long)]
        force: bool,
        /// Abandon discovery after this many seconds
        #[arg(long)]
        timeout: Option<u64>,
        /// Framework arguments, framework-specific syntax (after --)
        #[arg(last = true)]
        args: Vec<String>,
    },
    /// List supported frameworks
    Frameworks,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Discover {
            framework,
            root,
            json,
            quiet,
            force,
            timeout,
            args,
        } => {
            discover(&framework, root, json, quiet, force, timeout, args).await?;
        }
        Commands::Frameworks => {
            list_frameworks();
        }
    }

    Ok(())
}

async fn discover(
    framework: &str,
    root: PathBuf,
    json: bool,
    quiet: bool,
    force: bool,
    timeout: Option<u64>,
    args: Vec<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let framework: TestFramework = framework.parse()?;
    let config = DiscoveryConfig::default().with_args(framework, args);
    config.validate()?;

    let manager = TestManager::new(framework, root, config);
    let cancel = CancellationToken::new();

    // Ctrl-C withdraws the discovery instead of leaving the child
    // process behind.
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            interrupt.cancel();
        }
    });

    if let Some(secs) = timeout {
        let deadline = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(secs)).await;
            deadline.cancel();
        });
    }

    match manager
        .discover_tests(CommandSource::Cli, force, quiet, &cancel)
        .await
    {
        Ok(tests) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&*tests)?);
            } else {
                render_tree(&tests);
            }
            Ok(())
        }
        Err(e) if e.is_cancelled() => {
            if !quiet {
                println!("Discovery cancelled.");
            }
            Ok(())
        }
        Err(e) => {
            error!("discovery failed: {e}");
            Err(e.into())
        }
    }
}

fn render_tree(tests: &DiscoveredTests) {
    for file in &tests.test_files {
        println!("{}", file.relative_path.display());
        for suite_key in &file.suite_keys {
            render_suite(tests, suite_key, 1);
        }
        for function_key in &file.function_keys {
            if let Some(function) = tests.function(function_key) {
                println!("  {}", function.name);
            }
        }
    }
    println!(
        "{} files, {} suites, {} functions",
        tests.test_files.len(),
        tests.test_suites.len(),
        tests.test_functions.len()
    );
}

fn render_suite(tests: &DiscoveredTests, key: &str, depth: usize) {
    let Some(suite) = tests.suite(key) else {
        return;
    };
    let indent = "  ".repeat(depth);
    println!("{indent}{}", suite.name);
    for child_key in &suite.suite_keys {
        render_suite(tests, child_key, depth + 1);
    }
    for function_key in &suite.function_keys {
        if let Some(function) = tests.function(function_key) {
            println!("{indent}  {}", function.name);
        }
    }
}

fn list_frameworks() {
    println!("Supported frameworks:");
    for framework in TestFramework::ALL {
        println!("  - {} (runs '{}')", framework, framework.executable());
    }
}

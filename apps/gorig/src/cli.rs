//! CLI command handling for gorig

use crate::app::App;
use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use gorig_config::GoConfig;
use gorig_foundation::{Document, GorigError, GorigResult, TestItem, ALL_TESTS_LABEL};
use gorig_testing::{ItemList, PackageAction, TestAction};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::debug;

/// The main CLI struct.
#[derive(Parser)]
#[command(name = "gorig")]
#[command(about = "Run gopls headless and drive Go tests from the command line")]
#[command(version)]
pub struct Cli {
    /// Configuration file (default: gorig.toml or .gorig/config.toml)
    #[arg(long, global = true, env = "GORIG_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the tests and benchmarks around a test file
    Tests { file: PathBuf },
    /// Run an action on tests of a test file
    ///
    /// Without names the `all` item is used. Actions: run,
    /// yank-as-shell-command, yank-as-async-run-command, yank-name-only,
    /// debug (default).
    Run {
        file: PathBuf,
        names: Vec<String>,
        #[arg(long)]
        action: Option<String>,
    },
    /// List the packages importable from a file
    Packages { file: PathBuf },
    /// Add an import to a file
    Import { file: PathBuf, path: String },
    /// Run `go mod tidy` through gopls
    Tidy { file: PathBuf },
    /// Print the package a file belongs to
    Package { file: PathBuf },
    /// Install gopls into the tools directory
    Install,
}

/// Main CLI entry point
///
/// Failures already shown to the user turn into a failing exit code;
/// anything else is returned for the caller to print.
pub async fn run() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let config = GoConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    gorig_config::logging::initialize(&config);

    let cwd = std::env::current_dir().context("Failed to read working directory")?;
    let document = match cli.command.file() {
        Some(file) => Some(document_for(file)?),
        None => None,
    };

    let app = App::new(config, document, cwd);
    let code = execute(&app, cli.command).await;
    app.shutdown().await;
    code
}

async fn execute(app: &App, command: Commands) -> anyhow::Result<ExitCode> {
    if let Commands::Install = command {
        let path = app.supervisor.install().await?;
        println!("{}", path.display());
        return Ok(ExitCode::SUCCESS);
    }
    if let Commands::Package { .. } = command {
        app.commands.track_current_package().await;
        return Ok(ExitCode::SUCCESS);
    }

    if let Err(e) = app.open_document().await {
        app.dispatcher.surface(&e).await;
        return Ok(ExitCode::FAILURE);
    }

    match command {
        Commands::Tests { .. } => {
            if app.commands.run_tests().await.is_err() {
                return Ok(ExitCode::FAILURE);
            }
            let items = match app.tests.load_items().await {
                Ok(items) => items,
                Err(e) => return Ok(surfaced(app, e).await),
            };
            for item in items {
                println!("{}", item.label);
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Run { names, action, .. } => {
            if app.commands.run_tests().await.is_err() {
                return Ok(ExitCode::FAILURE);
            }
            let action = match action {
                Some(name) => name.parse::<TestAction>()?,
                None => app.tests.default_action(),
            };
            let items = match app.tests.load_items().await {
                Ok(items) => items,
                Err(e) => return Ok(surfaced(app, e).await),
            };
            let item = match select_item(&items, &names) {
                Ok(item) => item,
                Err(e) => return Ok(surfaced(app, e).await),
            };
            debug!(action = %action, tests = ?item.tests, "Running test action");
            Ok(exit_code(
                app.dispatcher.run_action(&app.tests, action, &item).await,
            ))
        }
        Commands::Packages { .. } => {
            if app.commands.list_known_packages().await.is_err() {
                return Ok(ExitCode::FAILURE);
            }
            match app.packages.load_items().await {
                Ok(packages) => {
                    for package in packages {
                        println!("{package}");
                    }
                    Ok(ExitCode::SUCCESS)
                }
                Err(e) => Ok(surfaced(app, e).await),
            }
        }
        Commands::Import { path, .. } => Ok(exit_code(
            app.dispatcher
                .run_action(&app.packages, PackageAction::Import, &path)
                .await,
        )),
        Commands::Tidy { .. } => Ok(exit_code(app.commands.tidy().await)),
        Commands::Package { .. } | Commands::Install => Ok(ExitCode::SUCCESS),
    }
}

impl Commands {
    fn file(&self) -> Option<&Path> {
        match self {
            Self::Tests { file }
            | Self::Run { file, .. }
            | Self::Packages { file }
            | Self::Import { file, .. }
            | Self::Tidy { file }
            | Self::Package { file } => Some(file),
            Self::Install => None,
        }
    }
}

fn document_for(file: &Path) -> anyhow::Result<Document> {
    let path = std::fs::canonicalize(file)
        .with_context(|| format!("Cannot open {}", file.display()))?;
    match Document::from_path(&path) {
        Some(document) => Ok(document),
        None => bail!("Cannot build a file URI for {}", path.display()),
    }
}

async fn surfaced(app: &App, error: GorigError) -> ExitCode {
    app.dispatcher.surface(&error).await;
    ExitCode::FAILURE
}

fn exit_code(result: GorigResult<()>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(_) => ExitCode::FAILURE,
    }
}

/// The item a `run` invocation targets
///
/// No names picks `all` (or the only item); several names form an ad-hoc
/// item carrying the discovery context of the listed tests.
fn select_item(items: &[TestItem], names: &[String]) -> GorigResult<TestItem> {
    let Some(first) = items.first() else {
        return Err(GorigError::EmptySelection);
    };

    match names {
        [] => Ok(items
            .iter()
            .find(|item| item.label == ALL_TESTS_LABEL)
            .unwrap_or(first)
            .clone()),
        [name] => items
            .iter()
            .find(|item| item.label == *name && item.label != ALL_TESTS_LABEL)
            .cloned()
            .ok_or(GorigError::EmptySelection),
        names => {
            let known: Vec<&str> = items
                .iter()
                .filter(|item| item.label != ALL_TESTS_LABEL)
                .map(|item| item.label.as_str())
                .collect();
            let tests: Vec<String> = names
                .iter()
                .filter(|name| known.contains(&name.as_str()))
                .cloned()
                .collect();
            if tests.is_empty() {
                return Err(GorigError::EmptySelection);
            }
            Ok(TestItem {
                label: tests.join(" "),
                document_uri: first.document_uri.clone(),
                container: first.container.clone(),
                tests,
            })
        }
    }
}

//! Brainstormer - guided brainstorming GPS for your terminal.
//!
//! Walks an idea through a crash test, angle generation, prioritization and
//! a seven-day action plan, one completion request per phase.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use brainstormer::ai::OpenAIProvider;
use brainstormer::core::Config;
use brainstormer::security::{SecretValue, SecretsError, SecretsManager, OPENAI_KEY_ENV};
use brainstormer::wizard::{render, snapshot, Phase, WizardError};
use brainstormer::App;

/// Guided brainstorming GPS for your terminal
#[derive(Parser)]
#[command(name = "brainstormer")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the brainstorming wizard (default)
    Wizard {
        /// Model to use (overrides the config)
        #[arg(short, long)]
        model: Option<String>,

        /// Resume from a saved project file
        #[arg(short, long)]
        resume: Option<PathBuf>,

        /// OpenAI API key (defaults to OPENAI_API_KEY or the keychain)
        #[arg(long)]
        api_key: Option<String>,
    },

    /// Show a saved project
    Show {
        /// Project file
        file: PathBuf,
    },

    /// Export the plan of a saved project
    ExportPlan {
        /// Project file
        file: PathBuf,

        /// Output file (defaults to the configured plan path)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Manage the API key stored in the system keychain
    Key {
        /// Key operation
        #[command(subcommand)]
        operation: KeyOperation,
    },

    /// Show configuration
    Config {
        /// Show config file path
        #[arg(long)]
        path: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

/// Keychain operations.
#[derive(Subcommand)]
enum KeyOperation {
    /// Store an API key (read from stdin when omitted)
    Set {
        /// The key
        key: Option<String>,
    },

    /// Show where the key would be read from
    Status,

    /// Remove the stored key
    Delete,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = if cli.verbose { EnvFilter::new("debug") } else { EnvFilter::new("warn") };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(io::stderr))
        .with(filter)
        .init();

    if let Ok(path) = dotenvy::dotenv() {
        tracing::debug!(path = %path.display(), "Loaded .env");
    }

    match cli.command {
        None => cmd_wizard(None, None, None)?,
        Some(Commands::Wizard { model, resume, api_key }) => {
            cmd_wizard(model, resume, api_key.as_deref())?;
        }
        Some(Commands::Show { file }) => {
            cmd_show(&file)?;
        }
        Some(Commands::ExportPlan { file, output }) => {
            cmd_export_plan(&file, output)?;
        }
        Some(Commands::Key { operation }) => {
            cmd_key(operation)?;
        }
        Some(Commands::Config { path }) => {
            cmd_config(path)?;
        }
        Some(Commands::Completions { shell }) => {
            cmd_completions(shell);
        }
    }

    Ok(())
}

/// Run the interactive wizard.
fn cmd_wizard(model: Option<String>, resume: Option<PathBuf>, api_key: Option<&str>) -> Result<()> {
    let config = Config::load()?;
    let api_key = resolve_api_key(api_key)?;

    let model = model.unwrap_or_else(|| config.ai.model.clone());
    if !config.ai.models.contains(&model) {
        tracing::warn!(%model, "Model is not in the configured list");
    }
    let provider = OpenAIProvider::new(api_key).with_model(model).with_base_url(&config.ai.base_url);

    let mut app = App::new(config, Box::new(provider))?;
    if let Some(path) = resume {
        let phase = app.resume(&path).with_context(|| format!("Cannot resume {}", path.display()))?;
        println!("Projet restauré en phase {phase}");
    }

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut output = io::stdout();
    app.run(&mut input, &mut output)
}

/// Credential from the flag, the environment or the keychain, else asked for.
fn resolve_api_key(explicit: Option<&str>) -> Result<SecretValue> {
    let manager = SecretsManager::new();
    match manager.resolve_api_key(explicit) {
        Ok((key, source)) => {
            tracing::debug!(%source, key = %key.hint(), "Using API key");
            Ok(key)
        }
        Err(SecretsError::NotFound(_)) => {
            print!("Clé API OpenAI : ");
            io::stdout().flush()?;
            let mut line = String::new();
            io::stdin().lock().read_line(&mut line)?;
            let key = SecretValue::new(line.trim());
            if key.is_empty() {
                anyhow::bail!("No API key. Set {OPENAI_KEY_ENV}, pass --api-key or run `brainstormer key set`.");
            }
            Ok(key)
        }
        Err(e) => Err(e.into()),
    }
}

/// Print a saved project.
fn cmd_show(file: &Path) -> Result<()> {
    let state = snapshot::load(file)?;
    print!("{}", render::project(&state));
    Ok(())
}

/// Write the plan of a saved project to its own file.
fn cmd_export_plan(file: &Path, output: Option<PathBuf>) -> Result<()> {
    let state = snapshot::load(file)?;
    let plan = state.plan().ok_or(WizardError::MissingResult { phase: Phase::Sequencage })?;

    let output = match output {
        Some(path) => path,
        None => Config::load()?.default_plan_path(),
    };
    snapshot::export_plan(plan, &output)?;
    println!("{}", output.display());
    Ok(())
}

/// Manage the stored API key.
fn cmd_key(operation: KeyOperation) -> Result<()> {
    let manager = SecretsManager::new();

    match operation {
        KeyOperation::Set { key } => {
            let key = match key {
                Some(key) => key,
                None => {
                    let mut line = String::new();
                    io::stdin().lock().read_line(&mut line)?;
                    line
                }
            };
            let secret = SecretValue::new(key.trim());
            if secret.is_empty() {
                anyhow::bail!("Empty API key");
            }
            manager.store_api_key(&secret)?;
            println!("API key stored ({})", secret.hint());
        }
        KeyOperation::Status => match manager.resolve_api_key(None) {
            Ok((key, source)) => println!("API key found in {source} ({})", key.hint()),
            Err(SecretsError::NotFound(_)) => println!("No API key configured"),
            Err(e) => return Err(e.into()),
        },
        KeyOperation::Delete => {
            manager.delete_api_key()?;
            println!("API key deleted");
        }
    }

    Ok(())
}

/// Show configuration.
fn cmd_config(show_path: bool) -> Result<()> {
    if show_path {
        match Config::active_path().or_else(Config::global_config_path) {
            Some(path) => println!("{}", path.display()),
            None => println!("No config directory available"),
        }
        return Ok(());
    }

    let config = Config::load()?;
    let toml = toml::to_string_pretty(&config)?;
    println!("{toml}");

    Ok(())
}

/// Generate shell completions.
fn cmd_completions(shell: Shell) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "brainstormer", &mut io::stdout());
}

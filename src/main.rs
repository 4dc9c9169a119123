//! Termroute - send commands to the terminals you already have open.
//!
//! Discovers Terminal.app, iTerm2, VS Code and Warp targets and routes
//! commands or typed text to them by name.

#![allow(clippy::single_match_else)]

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use termroute::core::{is_local_keyword, Config, LocalExecutor};
use termroute::session::describe_error;
use termroute::{CommandRouter, RouteOutcome, Session, TargetRegistry};

/// Send commands to the terminals you already have open
#[derive(Parser)]
#[command(name = "termroute")]
#[command(author, version, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use this config file instead of the usual lookup
    #[arg(long, global = true, env = "TERMROUTE_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive session (default)
    Repl,

    /// List discovered terminals
    List {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show which target a name resolves to
    Resolve {
        /// Alias, id, name or ordinal ("warp 2")
        name: String,
    },

    /// Suggest targets for a partial name
    Suggest {
        /// Partial name
        query: String,
    },

    /// Show the focused terminal
    Focused,

    /// Route a command
    Send {
        /// The command to run
        command: String,

        /// Target name (defaults to the configured default target)
        #[arg(short, long)]
        to: Option<String>,

        /// Don't confirm flagged commands
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Type raw text into a terminal
    Text {
        /// Text to type
        text: String,

        /// Target name
        #[arg(short, long)]
        to: String,
    },

    /// Split an "in X, do Y" query and resolve its target
    Parse {
        /// The query
        query: String,
    },

    /// Show routing status
    Status {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Manage target aliases
    Alias {
        #[command(subcommand)]
        operation: AliasOperation,
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

#[derive(Subcommand)]
enum AliasOperation {
    /// Name a target
    Set {
        /// Target name or id
        target: String,

        /// New alias
        alias: String,
    },

    /// Remove an alias
    Remove {
        /// Alias to remove
        alias: String,
    },

    /// List persisted aliases
    List,
}

/// Loaded configuration and where it should be saved.
struct LoadedConfig {
    config: Config,
    path: Option<PathBuf>,
}

impl LoadedConfig {
    fn load(explicit: Option<PathBuf>) -> Result<Self> {
        match explicit {
            Some(path) => {
                let config =
                    if path.exists() { Config::load_from_file(&path)? } else { Config::default() };
                Ok(Self { config, path: Some(path) })
            }
            None => Ok(Self { config: Config::load()?, path: Config::existing_path() }),
        }
    }

    fn save(&self) -> Result<()> {
        match &self.path {
            Some(path) => self.config.save_to_file(path),
            None => self.config.save(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = if cli.verbose { EnvFilter::new("debug") } else { EnvFilter::new("warn") };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(io::stderr))
        .with(filter)
        .init();

    let mut loaded = LoadedConfig::load(cli.config)?;

    match cli.command {
        None | Some(Commands::Repl) => cmd_repl(&loaded.config).await?,
        Some(Commands::List { format }) => cmd_list(&loaded.config, &format).await?,
        Some(Commands::Resolve { name }) => cmd_resolve(&loaded.config, &name).await?,
        Some(Commands::Suggest { query }) => cmd_suggest(&loaded.config, &query).await?,
        Some(Commands::Focused) => cmd_focused(&loaded.config).await?,
        Some(Commands::Send { command, to, yes }) => {
            cmd_send(&loaded.config, &command, to.as_deref(), yes).await?;
        }
        Some(Commands::Text { text, to }) => cmd_text(&loaded.config, &text, &to).await?,
        Some(Commands::Parse { query }) => cmd_parse(&loaded.config, &query).await?,
        Some(Commands::Status { format }) => cmd_status(&loaded.config, &format).await?,
        Some(Commands::Alias { operation }) => cmd_alias(&mut loaded, operation).await?,
        Some(Commands::Config { path }) => cmd_config(&loaded, path)?,
        Some(Commands::Completions { shell }) => cmd_completions(shell),
    }

    Ok(())
}

/// Build the router and select the configured default target.
async fn build_router(config: &Config) -> Arc<CommandRouter> {
    let registry = Arc::new(TargetRegistry::from_config(config));
    let router = CommandRouter::from_config(registry, config);

    let default_target = config.router.default_target.as_str();
    if !is_local_keyword(default_target) && !router.set_target(default_target).await {
        tracing::warn!(name = %default_target, "Default target not found, using local");
    }

    Arc::new(router)
}

/// Ask a yes/no question on stdin.
fn confirm(prompt: &str) -> Result<bool> {
    print!("{prompt} [y/N] ");
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().eq_ignore_ascii_case("y"))
}

/// List discovered terminals.
async fn cmd_list(config: &Config, format: &str) -> Result<()> {
    let router = build_router(config).await;
    let targets = router.registry().available_targets(true).await;

    match format {
        "json" => {
            let json = serde_json::to_string_pretty(&targets)?;
            println!("{json}");
        }
        _ => {
            if targets.is_empty() {
                println!("No terminals found");
                return Ok(());
            }
            for info in &targets {
                let target = &info.target;
                let focus = if target.is_focused { "*" } else { " " };
                println!(
                    "{} {}{} [{}] {}",
                    info.status.icon(),
                    focus,
                    target.display_name(),
                    target.id,
                    target.title
                );
            }
            println!("\nTotal: {} terminals", targets.len());
        }
    }

    Ok(())
}

/// Show what a name resolves to.
async fn cmd_resolve(config: &Config, name: &str) -> Result<()> {
    if is_local_keyword(name) {
        println!("local");
        return Ok(());
    }

    let router = build_router(config).await;
    match router.registry().target_by_name(name).await {
        Some(info) => {
            println!("{} ({})", info.target.display_name(), info.id());
            Ok(())
        }
        None => {
            let suggestions: Vec<String> = router
                .registry()
                .suggestions(name)
                .await
                .iter()
                .map(|t| t.target.display_name())
                .collect();
            if suggestions.is_empty() {
                anyhow::bail!("Terminal '{name}' not found");
            }
            anyhow::bail!("Terminal '{name}' not found. Did you mean: {}?", suggestions.join(", "))
        }
    }
}

/// Suggest targets for a partial name.
async fn cmd_suggest(config: &Config, query: &str) -> Result<()> {
    let router = build_router(config).await;
    let suggestions = router.registry().suggestions(query).await;

    if suggestions.is_empty() {
        println!("No suggestions for '{query}'");
        return Ok(());
    }
    for info in &suggestions {
        println!("{} ({})", info.target.display_name(), info.id());
    }
    Ok(())
}

/// Show the focused terminal.
async fn cmd_focused(config: &Config) -> Result<()> {
    let router = build_router(config).await;
    match router.registry().focused_target().await {
        Some(info) => println!("{} ({})", info.target.display_name(), info.id()),
        None => println!("No focused terminal"),
    }
    Ok(())
}

/// Route a command, confirming flagged ones.
async fn cmd_send(config: &Config, command: &str, to: Option<&str>, yes: bool) -> Result<()> {
    let router = build_router(config).await;

    let outcome = match router.route_command(command, to).await {
        Ok(outcome) => outcome,
        Err(e) => anyhow::bail!(describe_error(&e)),
    };

    let outcome = match outcome {
        RouteOutcome::NeedsConfirmation { display_name, warning, .. } => {
            println!("{warning}");
            if !yes && !confirm(&format!("Send '{command}' to {display_name}?"))? {
                println!("Cancelled");
                return Ok(());
            }
            match router.route_confirmed(command, to).await {
                Ok(outcome) => outcome,
                Err(e) => anyhow::bail!(describe_error(&e)),
            }
        }
        other => other,
    };

    match outcome {
        RouteOutcome::Local { command, verdict } => {
            if !verdict.is_safe && config.router.confirm_dangerous && !yes {
                println!("{}", verdict.warning);
                if !confirm(&format!("Execute '{command}' locally?"))? {
                    println!("Cancelled");
                    return Ok(());
                }
            }
            let executor = LocalExecutor::from_config(&config.local);
            let result = executor.execute(&command).await?;
            if !result.stdout.is_empty() {
                print!("{}", result.stdout);
            }
            if !result.stderr.is_empty() {
                eprint!("{}", result.stderr);
            }
            if result.timed_out {
                anyhow::bail!("Command timed out after {} seconds", executor.timeout.as_secs());
            }
            if !result.success() {
                std::process::exit(result.code().unwrap_or(1));
            }
        }
        RouteOutcome::Dispatched { message, .. } => println!("{message}"),
        RouteOutcome::NeedsConfirmation { warning, .. } => anyhow::bail!(warning),
    }

    Ok(())
}

/// Type raw text into a target.
async fn cmd_text(config: &Config, text: &str, to: &str) -> Result<()> {
    let router = build_router(config).await;
    match router.send_raw_text(text, Some(to)).await {
        Ok(message) => {
            println!("{message}");
            Ok(())
        }
        Err(e) => anyhow::bail!(describe_error(&e)),
    }
}

/// Split and resolve a contextual query.
async fn cmd_parse(config: &Config, query: &str) -> Result<()> {
    let router = build_router(config).await;
    match router.parse_contextual(query).await {
        (Some(id), command) => {
            println!("target: {id}");
            println!("command: {command}");
        }
        (None, command) => {
            println!("target: (current)");
            println!("command: {command}");
        }
    }
    Ok(())
}

/// Show routing status.
async fn cmd_status(config: &Config, format: &str) -> Result<()> {
    let router = build_router(config).await;
    let status = router.status().await;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&status)?),
        _ => {
            println!("Current target: {}", status.current);
            println!("Available: {}", status.available.join(", "));
            println!("Terminals: {}", status.total_targets);
            println!("Dispatches: {}", status.history_size);
        }
    }
    Ok(())
}

/// Manage aliases.
async fn cmd_alias(loaded: &mut LoadedConfig, operation: AliasOperation) -> Result<()> {
    match operation {
        AliasOperation::Set { target, alias } => {
            let router = build_router(&loaded.config).await;
            let registry = router.registry();
            let Some(info) = registry.target_by_name(&target).await else {
                anyhow::bail!("Terminal '{target}' not found");
            };
            if !registry.set_alias(info.id(), &alias).await {
                anyhow::bail!("Invalid alias '{alias}'");
            }
            loaded.config.set_alias(&alias, info.id());
            loaded.save()?;
            println!("Alias '{}' -> {}", alias.trim(), info.id());
        }
        AliasOperation::Remove { alias } => {
            if !loaded.config.remove_alias(alias.trim()) {
                anyhow::bail!("No alias named '{alias}'");
            }
            loaded.save()?;
            println!("Removed alias '{alias}'");
        }
        AliasOperation::List => {
            if loaded.config.aliases.is_empty() {
                println!("No aliases configured");
            }
            for entry in &loaded.config.aliases {
                println!("{} -> {}", entry.name, entry.target);
            }
        }
    }
    Ok(())
}

/// Run an interactive session on stdin.
async fn cmd_repl(config: &Config) -> Result<()> {
    let router = build_router(config).await;
    let session = Session::new(router, LocalExecutor::from_config(&config.local))
        .with_confirm_local(config.router.confirm_dangerous);

    println!("termroute {} - type 'list terminals', 'switch to <name>' or 'exit'", termroute::VERSION);

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        let current = session.router().current_target().await;
        if let Some(id) = &current.fallback_from {
            println!("Terminal {id} is gone, switched to local");
        }
        print!("[{}] > ", current.target);
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            break;
        };
        let line = line?;

        let Some(reply) = session.handle_line(&line).await else {
            continue;
        };
        println!("{reply}");
        if reply.exit {
            break;
        }

        if let Some(pending) = &reply.pending {
            print!("Confirm? [y/N] ");
            io::stdout().flush()?;
            let answer = match lines.next() {
                Some(answer) => answer?,
                None => break,
            };
            if answer.trim().eq_ignore_ascii_case("y") {
                println!("{}", session.confirm(pending).await);
            } else {
                println!("Cancelled");
            }
        }
    }

    Ok(())
}

/// Show configuration.
fn cmd_config(loaded: &LoadedConfig, show_path: bool) -> Result<()> {
    if show_path {
        match &loaded.path {
            Some(path) => println!("{}", path.display()),
            None => {
                if let Some(dir) = Config::config_dir() {
                    println!("{}", dir.join("config.toml").display());
                }
            }
        }
        return Ok(());
    }

    let toml = toml::to_string_pretty(&loaded.config)?;
    println!("{toml}");
    Ok(())
}

/// Generate shell completions.
fn cmd_completions(shell: Shell) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "termroute", &mut io::stdout());
}

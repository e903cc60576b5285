//! Binary entry point for symmem.
//!
//! Client commands talk to a running gateway over HTTP by default; `--local`
//! opens the configured database directly instead.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print_stderr in main binary for CLI output
#![allow(clippy::print_stderr)]
#![allow(clippy::print_stdout)]
// Allow needless_pass_by_value for command functions
#![allow(clippy::needless_pass_by_value)]
// Allow multiple crate versions from transitive dependencies
#![allow(clippy::multiple_crate_versions)]

use clap::{Parser, Subcommand, ValueEnum};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use symmem::bridge::{BackendKind, ToolBridge};
use symmem::config::SymmemConfig;
use symmem::mcp::{McpServer, RpcClient, Transport};
use symmem::models::{ApplyOutcome, Decision};
use symmem::observability;
use symmem::services::{
    ApplyWorkflow, DefineBlock, PendingDecision, SymbolGateway, SymbolService, TaxonomySuggester,
};
use symmem::storage::{FileApplyJournal, SqliteSymbolStore};

/// Symmem - a symbolic memory store with taxonomy suggestions.
#[derive(Parser)]
#[command(name = "symmem")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Gateway endpoint URL (overrides config).
    #[arg(long, global = true, env = "SYMMEM_URL")]
    url: Option<String>,

    /// Use the local database instead of a running gateway.
    #[arg(long, global = true)]
    local: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Run the JSON-RPC gateway.
    Serve {
        /// Transport type.
        #[arg(short, long, value_enum, default_value_t = TransportArg::Stdio)]
        transport: TransportArg,

        /// Port for HTTP transport.
        #[arg(short, long, default_value = "8000")]
        port: u16,
    },

    /// Run the initialize handshake and print the server identity.
    Init,

    /// Save the last DEFINE block of a markdown file.
    Save {
        /// Markdown file containing a DEFINE block.
        file: PathBuf,

        /// Symbol override.
        symbol: Option<String>,

        /// Apply the recommended decision without prompting.
        #[arg(short, long)]
        yes: bool,
    },

    /// Print the body stored under a symbol or alias.
    Get {
        /// Symbol or alias.
        symbol: String,
    },

    /// Revert the most recently applied taxonomy.
    Undo,

    /// Run a tool-calling chat model against the store.
    Ask {
        /// User prompt.
        #[arg(short, long)]
        prompt: String,

        /// Chat backend: ollama or openai_compat.
        #[arg(long)]
        backend: Option<BackendKind>,

        /// Model name.
        #[arg(long)]
        model: Option<String>,

        /// Print only the text of the first successful `sm_get`.
        #[arg(long)]
        strict_get: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum TransportArg {
    Stdio,
    Http,
}

/// Main entry point.
fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let mut config = match SymmemConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        },
    };
    if let Some(url) = &cli.url {
        config.server_url.clone_from(url);
    }

    if let Err(e) = observability::init_from_settings(&config.logging, cli.verbose) {
        eprintln!("Failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    match run_command(cli, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(error = %e, "Command failed");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        },
    }
}

/// Runs the selected command.
fn run_command(cli: Cli, config: &SymmemConfig) -> symmem::Result<()> {
    match cli.command {
        Commands::Serve { transport, port } => return cmd_serve(config, transport, port),
        Commands::Init => return cmd_init(config, cli.local),
        _ => {},
    }

    let gateway = open_gateway(config, cli.local)?;
    let gateway = gateway.as_ref();

    match cli.command {
        Commands::Serve { .. } | Commands::Init => Ok(()),
        Commands::Save { file, symbol, yes } => {
            cmd_save(gateway, config, &file, symbol.as_deref(), yes)
        },
        Commands::Get { symbol } => cmd_get(gateway, &symbol),
        Commands::Undo => cmd_undo(gateway, config),
        Commands::Ask {
            prompt,
            backend,
            model,
            strict_get,
        } => cmd_ask(gateway, config, &prompt, backend, model, strict_get),
    }
}

fn local_service(config: &SymmemConfig) -> symmem::Result<SymbolService> {
    let store = SqliteSymbolStore::new(&config.db_path)?;
    Ok(SymbolService::new(Arc::new(store))
        .with_suggester(TaxonomySuggester::new(config.suggestion.clone())))
}

/// Opens the gateway the client commands use, performing the handshake.
fn open_gateway(config: &SymmemConfig, local: bool) -> symmem::Result<Box<dyn SymbolGateway>> {
    if local {
        return Ok(Box::new(local_service(config)?));
    }
    let client = RpcClient::http(&config.server_url, config.request_timeout())?;
    client.initialize()?;
    Ok(Box::new(client))
}

/// Serve command.
fn cmd_serve(config: &SymmemConfig, transport: TransportArg, port: u16) -> symmem::Result<()> {
    let transport = match transport {
        TransportArg::Stdio => Transport::Stdio,
        TransportArg::Http => Transport::Http,
    };

    McpServer::new(local_service(config)?)
        .with_transport(transport)
        .with_port(port)
        .start()
}

/// Init command.
fn cmd_init(config: &SymmemConfig, local: bool) -> symmem::Result<()> {
    let result = if local {
        RpcClient::local(McpServer::new(local_service(config)?)).initialize()?
    } else {
        RpcClient::http(&config.server_url, config.request_timeout())?.initialize()?
    };
    println!("{}", to_pretty(&result));
    Ok(())
}

/// Save command.
fn cmd_save(
    gateway: &dyn SymbolGateway,
    config: &SymmemConfig,
    file: &std::path::Path,
    symbol: Option<&str>,
    yes: bool,
) -> symmem::Result<()> {
    let markdown = std::fs::read_to_string(file).map_err(|e| {
        symmem::Error::InvalidInput(format!("cannot read {}: {e}", file.display()))
    })?;
    let request = DefineBlock::parse_last(&markdown)?.into_save_request(symbol)?;

    let workflow = ApplyWorkflow::new(gateway, FileApplyJournal::new(&config.journal_path));
    let (response, pending) = workflow.submit(&request)?;
    println!("{}", to_pretty(&response));

    let Some(pending) = pending else {
        return Ok(());
    };

    let decision = if yes {
        pending.default_decision()
    } else {
        prompt_decision(&pending)?
    };

    let outcome = workflow.resolve(&pending, decision)?;
    print_outcome(&outcome);
    Ok(())
}

/// Get command.
fn cmd_get(gateway: &dyn SymbolGateway, symbol: &str) -> symmem::Result<()> {
    println!("{}", gateway.read(symbol)?);
    Ok(())
}

/// Undo command.
fn cmd_undo(gateway: &dyn SymbolGateway, config: &SymmemConfig) -> symmem::Result<()> {
    let workflow = ApplyWorkflow::new(gateway, FileApplyJournal::new(&config.journal_path));
    let outcome = workflow.undo(&[])?;
    print_outcome(&outcome);
    Ok(())
}

/// Ask command.
fn cmd_ask(
    gateway: &dyn SymbolGateway,
    config: &SymmemConfig,
    prompt: &str,
    backend: Option<BackendKind>,
    model: Option<String>,
    strict_get: bool,
) -> symmem::Result<()> {
    let mut settings = config.bridge.clone();
    if let Some(backend) = backend {
        settings.backend = backend;
    }
    if let Some(model) = model {
        settings.model = model;
    }

    let bridge = ToolBridge::new(gateway, settings.client())
        .with_max_steps(settings.max_steps)
        .with_strict_get(strict_get);
    let outcome = bridge.run(prompt)?;
    println!("{}", outcome.text());
    Ok(())
}

/// Asks `[Y/n/e/u]` on stderr and reads the answer from stdin.
///
/// A blank answer takes the recommended default.
fn prompt_decision(pending: &PendingDecision) -> symmem::Result<Decision> {
    let selection = pending.selection();
    let default = if pending.recommends_accept() { "Y" } else { "n" };
    let answer = ask(&format!(
        "Apply suggested taxonomy cat={:?} subcat={:?} (score={:.2})? [Y/n/e/u] (default {default}): ",
        selection.category.as_deref().unwrap_or(""),
        selection.subcategory.as_deref().unwrap_or(""),
        selection.score,
    ))?;

    if answer.is_empty() {
        return Ok(pending.default_decision());
    }

    match Decision::parse_answer(&answer) {
        Decision::Edit { .. } => {
            let category = ask(&format!(
                "cat [{}]: ",
                selection.category.as_deref().unwrap_or("")
            ))?;
            let subcategory = ask(&format!(
                "subcat [{}]: ",
                selection.subcategory.as_deref().unwrap_or("")
            ))?;
            Ok(Decision::Edit {
                category: Some(category).filter(|s| !s.is_empty()),
                subcategory: Some(subcategory).filter(|s| !s.is_empty()),
            })
        },
        decision => Ok(decision),
    }
}

fn ask(prompt: &str) -> symmem::Result<String> {
    let mut stderr = std::io::stderr();
    write!(stderr, "{prompt}").map_err(|e| symmem::Error::operation("write_prompt", e))?;
    stderr
        .flush()
        .map_err(|e| symmem::Error::operation("flush_prompt", e))?;

    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .map_err(|e| symmem::Error::operation("read_answer", e))?;
    Ok(line.trim().to_string())
}

fn print_outcome(outcome: &ApplyOutcome) {
    match outcome {
        ApplyOutcome::Accepted { response, .. } | ApplyOutcome::Edited { response, .. } => {
            println!("APPLIED: {}", to_pretty(response));
        },
        ApplyOutcome::Undone { response, .. } => println!("UNDO: {}", to_pretty(response)),
        ApplyOutcome::NothingToUndo => println!("Nothing to undo."),
        ApplyOutcome::Rejected => {},
    }
}

fn to_pretty<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}

//! murmur - stream answers from a chat inference endpoint

mod config;
mod interrupt;
mod render;
mod utils;

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use clap::Parser;
use futures::StreamExt;
use murmur_ai::{MessageUpdateRequestOptions, UpdateSource};
use murmur_store::{ConversationPage, Database, load_conversation, save_conversation};
use tokio_util::sync::CancellationToken;

use crate::interrupt::Interrupts;
use crate::render::Renderer;

/// murmur - stream answers from a chat inference endpoint
#[derive(Parser, Debug)]
#[command(name = "murmur")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Prompt to send; starts an interactive session when omitted
    prompt: Option<String>,

    /// Inference endpoint URL (overrides config)
    #[arg(short, long)]
    endpoint: Option<String>,

    /// Ask the endpoint to search the web
    #[arg(short, long)]
    web_search: bool,

    /// Enable a tool by name (repeatable)
    #[arg(short, long = "tool")]
    tools: Vec<String>,

    /// Attach a file (repeatable)
    #[arg(short, long = "attach")]
    attachments: Vec<PathBuf>,

    /// Regenerate the answer to this message ID
    #[arg(long, value_name = "MESSAGE_ID")]
    retry: Option<String>,

    /// Continue the answer of this message ID
    #[arg(long = "continue", value_name = "MESSAGE_ID")]
    continue_from: Option<String>,

    /// Conversation ID to load
    #[arg(long)]
    conversation: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Initialize config file
    #[arg(long)]
    init_config: bool,
}

impl Args {
    fn request_options(&self, prompt: &str) -> anyhow::Result<MessageUpdateRequestOptions> {
        let mut opts = MessageUpdateRequestOptions::new(prompt).with_web_search(self.web_search);
        for tool in &self.tools {
            opts = opts.with_tool(tool);
        }
        for path in &self.attachments {
            opts = opts.with_file(utils::read_attachment(path)?);
        }
        if let Some(ref id) = self.retry {
            opts = opts.retry(id);
        }
        if let Some(ref id) = self.continue_from {
            opts = opts.continuation(id);
        }
        Ok(opts)
    }
}

/// What became of a turn
#[derive(Debug, PartialEq, Eq)]
enum TurnOutcome {
    Completed,
    Failed,
    Cancelled,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Setup tracing
    if args.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("murmur=debug,murmur_ai=debug,murmur_store=debug")
            .with_writer(io::stderr)
            .init();
    }

    // Initialize config and exit
    if args.init_config {
        match config::Config::init() {
            Ok(path) => {
                println!("Config file created at: {}", path.display());
                println!("\nExample config:\n{}", config::example_config());
            }
            Err(e) => {
                eprintln!("Error creating config: {}", e);
                std::process::exit(1);
            }
        }
        return Ok(());
    }

    let mut cfg = config::Config::load();
    if let Some(ref endpoint) = args.endpoint {
        cfg.endpoint = endpoint.clone();
    }

    let source = UpdateSource::http(cfg.source_config())?;
    let db = Database::connect(cfg.store);

    let conversation_id = args
        .conversation
        .clone()
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let mut page = load_conversation(db.collections(), &conversation_id).await?;
    tracing::debug!(
        conversation_id,
        messages = page.messages.len(),
        "Loaded conversation"
    );

    let interrupts = Interrupts::install();

    // Non-interactive mode
    if let Some(ref prompt) = args.prompt {
        let opts = args.request_options(prompt)?;
        let outcome = run_turn(&source, &db, &mut page, &opts, &interrupts).await?;
        if outcome == TurnOutcome::Failed {
            std::process::exit(1);
        }
        return Ok(());
    }

    // Show minimal startup info (only if TTY)
    if std::io::IsTerminal::is_terminal(&std::io::stderr()) {
        eprintln!("murmur ({}) conversation: {}", source.config().endpoint, page.id);
        eprintln!("Empty line asks the default question; Ctrl-D exits.");
        eprintln!();
    }

    run_interactive(
        &args,
        &source,
        &db,
        &mut page,
        &interrupts,
        io::stdin().lock(),
    )
    .await
}

/// Stream one turn to stdout and save the conversation
async fn run_turn(
    source: &UpdateSource,
    db: &Database,
    page: &mut ConversationPage,
    opts: &MessageUpdateRequestOptions,
    interrupts: &Interrupts,
) -> anyhow::Result<TurnOutcome> {
    let cancel = interrupts.begin_turn();
    let result = stream_turn(source, page, opts, &cancel).await;
    interrupts.end_turn();

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(e) if e.is_aborted() => {
            println!("[Cancelled]");
            return Ok(TurnOutcome::Cancelled);
        }
        Err(murmur_ai::Error::Rejected { status, message }) => {
            eprintln!("Error: {} (status {})", message, status);
            return Ok(TurnOutcome::Failed);
        }
        Err(e) => return Err(e.into()),
    };

    page.touch();
    save_conversation(db.collections(), page).await?;

    Ok(outcome)
}

async fn stream_turn(
    source: &UpdateSource,
    page: &ConversationPage,
    opts: &MessageUpdateRequestOptions,
    cancel: &CancellationToken,
) -> murmur_ai::Result<TurnOutcome> {
    let mut updates = source.fetch_message_updates(&page.id, opts, cancel).await?;

    let mut renderer = Renderer::new(io::stdout().lock());
    while let Some(update) = updates.next().await {
        if let Err(e) = renderer.render(&update) {
            tracing::warn!("Failed to write update: {}", e);
            cancel.cancel();
            break;
        }
    }
    let response = match renderer.finish() {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!("Failed to write update: {}", e);
            return Ok(TurnOutcome::Failed);
        }
    };

    if response.error().is_some() {
        Ok(TurnOutcome::Failed)
    } else if response.is_complete() {
        Ok(TurnOutcome::Completed)
    } else {
        println!("[Cancelled]");
        Ok(TurnOutcome::Cancelled)
    }
}

async fn run_interactive(
    args: &Args,
    source: &UpdateSource,
    db: &Database,
    page: &mut ConversationPage,
    interrupts: &Interrupts,
    mut input: impl BufRead,
) -> anyhow::Result<()> {
    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            // EOF
            break;
        }

        let line = line.trim();
        if line == "/exit" || line == "/quit" {
            break;
        }

        let opts = match args.request_options(line) {
            Ok(opts) => opts,
            Err(e) => {
                eprintln!("Error: {:#}", e);
                continue;
            }
        };
        if let Err(e) = run_turn(source, db, page, &opts, interrupts).await {
            eprintln!("Error: {:#}", e);
        }
        println!();
    }

    Ok(())
}

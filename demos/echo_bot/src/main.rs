//! Echo Bot Example
//!
//! A terminal bot showing routes, aliases, middleware, per-chat
//! conversation state and clap-parsed arguments. Type commands on stdin;
//! prefix a line with `#<chat_id>` to speak as another chat, or use
//! `!file <id> [caption]` to upload a file.
//!
//! # Usage
//!
//! ```bash
//! cargo run --package echo-bot
//! cargo run --package echo-bot -- --username echo_bot --max-concurrency 4
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::Parser;
use tbot::core::BoxedTransport;
use tbot::framework::ExtractError;
use tbot::prelude::*;
use tbot::runtime::config::LogOutput;
use tbot_adapter_console::{ConsoleConfig, ConsoleTransport};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(version, about = "An echo bot for the terminal")]
struct Cli {
    /// Configuration file (defaults to searching for tbot.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Configuration profile
    #[arg(short, long)]
    profile: Option<String>,

    /// Bot username, so `/cmd@username` is understood
    #[arg(short, long)]
    username: Option<String>,

    /// Maximum number of handlers running at once
    #[arg(long)]
    max_concurrency: Option<usize>,

    /// Chat id attributed to input lines
    #[arg(long, default_value_t = 1)]
    chat_id: ChatId,

    /// Chats whose messages are ignored
    #[arg(long = "mute", value_name = "CHAT_ID")]
    muted: Vec<ChatId>,
}

// ============================================================================
// Handler Functions
// ============================================================================

async fn echo(Args(text): Args) -> String {
    if text.is_empty() {
        "Nothing to echo. Try /echo hello".to_string()
    } else {
        text
    }
}

async fn whoami(Chat(chat): Chat, ctx: Arc<Context>) -> String {
    let via = match (ctx.match_kind(), ctx.route()) {
        (MatchKind::Alias, Some(route)) => format!(" (via alias of {route})"),
        _ => String::new(),
    };
    format!("You are chat {chat}{via}")
}

#[derive(Clone, Default)]
struct Counter(u64);

async fn count(conversation: Conversation) -> String {
    let Counter(n) = conversation.update(|c: &mut Counter| c.0 += 1);
    format!("Count for this chat: {n}")
}

async fn reset(conversation: Conversation) -> &'static str {
    if conversation.reset() {
        "Conversation cleared"
    } else {
        "Nothing to clear"
    }
}

/// Sends a reminder after a delay.
#[derive(Parser, Debug)]
struct Remind {
    /// Delay in seconds
    seconds: u64,
    /// Reminder text
    #[arg(required = true)]
    text: Vec<String>,
}

async fn remind(
    args: Result<CommandArgs<Remind>, ExtractError>,
    Chat(chat): Chat,
    transport: BoxedTransport,
) -> String {
    let Remind { seconds, text } = match args {
        Ok(args) => args.into_inner(),
        Err(err) => return err.to_string(),
    };
    let text = text.join(" ");

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(seconds)).await;
        if let Err(e) = transport
            .send(OutboundMessage::text(chat, format!("⏰ {text}")))
            .await
        {
            error!(chat_id = chat, "Failed to deliver reminder: {e}");
        }
    });

    format!("I'll remind you in {seconds}s")
}

async fn stored(File(upload): File) -> String {
    let name = upload.file_name.as_deref().unwrap_or(&upload.file_id);
    match upload.caption {
        Some(caption) => format!("Stored {name} ({caption})"),
        None => format!("Stored {name}"),
    }
}

async fn unknown(ctx: Arc<Context>) -> String {
    if ctx.command().is_empty() {
        "Send a command, or /help to see them all".to_string()
    } else {
        format!("Unknown command {}. Try /help", ctx.command())
    }
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Console output goes to stdout, so logs go to stderr.
    let mut defaults = BotConfig::default();
    defaults.logging.output = LogOutput::Stderr;
    defaults.bot.username = cli.username;
    defaults.dispatch.max_concurrency = cli.max_concurrency;

    let mut builder = BotServer::builder().merge(defaults);
    if let Some(path) = &cli.config {
        builder = builder.config_file(path);
    }
    if let Some(profile) = &cli.profile {
        builder = builder.profile(profile);
    }

    let transport = ConsoleTransport::with_config(ConsoleConfig {
        chat_id: cli.chat_id,
        ..Default::default()
    });
    let server = builder.build(transport)?;

    // ========================================================================
    // Middlewares: first added is outermost
    // ========================================================================

    server.add_middleware(middleware::from_fn(|ctx: Arc<Context>, next| async move {
        let started = Instant::now();
        let command = ctx.command().to_string();
        let res = next.run(ctx).await;
        info!(%command, elapsed = ?started.elapsed(), ok = res.is_ok(), "Handled");
        res
    }));

    let muted = Arc::new(cli.muted);
    server.add_middleware(middleware::from_fn(move |ctx: Arc<Context>, next| {
        let muted = Arc::clone(&muted);
        async move {
            if muted.contains(&ctx.chat_id()) {
                return Ok(());
            }
            next.run(ctx).await
        }
    }));

    // ========================================================================
    // Routes
    // ========================================================================

    server.handle("/start", "Hello! I echo things. Try /help")?.describe("say hello");
    server.handle("/ping", "Pong! 🏓")?.describe("check the bot is alive");
    server.handle_func("/echo", echo)?.describe("repeat the arguments");
    server.handle_func("/whoami", whoami)?.describe("show your chat id");
    server.handle_func("/count", count)?.describe("count messages in this chat");
    server.handle_func("/reset", reset)?.describe("clear this chat's state");
    server
        .handle_func("/remind", remind)?
        .describe("remind <seconds> <text>");
    server.handle_file(stored).describe("store an uploaded file");
    server.handle_default(unknown);

    server.set_alias("/start", ["/go"])?;
    server.set_alias("/echo", ["/e", "/say"])?;
    server.set_alias("/whoami", ["/me"])?;

    info!(
        routes = server.router().routes().len(),
        "Echo bot ready, type /help"
    );
    server.serve().await?;

    Ok(())
}

//! BookingAI Chat
//!
//! Terminal front-end for the BookingAI travel assistant. The conversation is
//! encrypted and kept in a local data directory, one file per storage slot:
//!
//! 1. **Device-key mode** (default): a random key is kept next to the history.
//!
//! 2. **Passphrase mode** (`/secure`): the key is derived from a passphrase
//!    that is asked for on every start and never written to disk.
//!
//! Replies come from the BookingAI API (`POST /api/ai/chat/`). When it is
//! unreachable, or with `--offline`, canned travel suggestions are used.

mod commands;
mod terminal;

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use bookingai_core::assistant::SUGGESTED_QUESTIONS;
use bookingai_core::identity::IdentityProvider;
use bookingai_core::time::format_clock;
use bookingai_core::{
    Assistant, ChatConfig, ChatMessage, ConversationController, ConversationStore, Error,
    FileStore, HttpIdentityProvider, HttpReplyBackend, Identity, LoadOutcome, ReadyMode, Role,
    StaticIdentity, UserNotice,
};
use clap::Parser;
use color_eyre::eyre::{eyre, WrapErr};

use commands::{Input, HELP};
use terminal::{read_line, TerminalPrompt};

// ── CLI Arguments ─────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "bookingai-chat", version, about = "Chat with the BookingAI travel assistant")]
struct Args {
    /// Base URL of the BookingAI API
    #[arg(long, default_value = "http://localhost:8000", env = "BOOKINGAI_API_BASE_URL")]
    api_base_url: String,

    /// Directory for the encrypted history (defaults to the platform data dir)
    #[arg(long, env = "BOOKINGAI_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Use this user id instead of asking the API who is signed in
    #[arg(long)]
    user: Option<String>,

    /// Never call the API; answer with canned suggestions
    #[arg(long)]
    offline: bool,

    /// HTTP request timeout in seconds
    #[arg(long, default_value_t = 30, env = "BOOKINGAI_REQUEST_TIMEOUT_SECS")]
    timeout_secs: u64,
}

// ── Entry Point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bookingai_core=info,bookingai_chat=info".into()),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let config = ChatConfig::from_env()
        .with_api_base_url(&args.api_base_url)
        .with_request_timeout(Duration::from_secs(args.timeout_secs));

    let data_dir = match args.data_dir {
        Some(dir) => dir,
        None => dirs::data_dir()
            .map(|dir| dir.join("bookingai").join("history"))
            .ok_or_else(|| eyre!("no platform data directory; pass --data-dir"))?,
    };
    let kv = Arc::new(
        FileStore::new(&data_dir)
            .wrap_err_with(|| format!("opening history in {}", data_dir.display()))?,
    );

    let identity: Arc<dyn IdentityProvider> = match (&args.user, args.offline) {
        (Some(user), _) => Arc::new(StaticIdentity(Identity::user(user.clone()))),
        (None, true) => Arc::new(StaticIdentity(Identity::Anonymous)),
        (None, false) => Arc::new(HttpIdentityProvider::new(&config)?),
    };

    let assistant = if args.offline {
        Assistant::offline()
    } else {
        Assistant::new(Arc::new(HttpReplyBackend::new(&config)?))
    };

    tracing::info!(
        data_dir = %data_dir.display(),
        api = %config.api_base_url,
        offline = args.offline,
        "Starting BookingAI chat"
    );

    let store = ConversationStore::new(kv, identity, Arc::new(TerminalPrompt), config);
    let chat = store.init().await?;

    print_banner(&chat, &data_dir);
    print_history(&chat);

    run(&chat, &assistant, &data_dir).await?;

    store.teardown().await?;
    println!("Goodbye!");
    Ok(())
}

// ── Chat Loop ─────────────────────────────────────────────────────────────────

async fn run(
    chat: &ConversationController,
    assistant: &Assistant,
    data_dir: &std::path::Path,
) -> color_eyre::Result<()> {
    loop {
        print!("> ");
        io::stdout().flush()?;

        let Some(line) = read_line().await? else {
            println!();
            return Ok(());
        };

        match Input::parse(&line) {
            Input::Empty => {}
            Input::Quit => return Ok(()),
            Input::Help => println!("{}", HELP),
            Input::Unknown(name) => println!("Unknown command /{}. Type /help.", name),
            Input::History => print_history(chat),
            Input::Status => print_status(chat, assistant, data_dir),
            Input::Message(text) => match chat.send(&text, assistant).await {
                Ok(reply) => print_message(&reply),
                Err(e) => report(e),
            },
            Input::Secure => match chat.secure_with_passphrase().await {
                Ok(()) => println!("Your chat history is now protected by your passphrase."),
                Err(e) => report(e),
            },
            Input::Unlock => {
                if chat.mode() != Some(ReadyMode::Locked) {
                    println!("History is not locked.");
                    continue;
                }
                match chat.unlock().await {
                    Ok(()) => {
                        println!("History unlocked.");
                        print_history(chat);
                    }
                    Err(e) => report(e),
                }
            }
            Input::Clear => match chat.clear_history().await {
                Ok(true) => println!("Chat history deleted."),
                Ok(false) => println!("Kept your chat history."),
                Err(e) => report(e),
            },
        }
    }
}

// ── Output ────────────────────────────────────────────────────────────────────

fn print_banner(chat: &ConversationController, data_dir: &std::path::Path) {
    println!("BookingAI Travel Assistant v{}", bookingai_core::version());
    println!("History: {} ({})", chat.identity(), data_dir.display());

    match chat.load_outcome() {
        LoadOutcome::Fresh => {
            println!("\nTry asking:");
            for question in SUGGESTED_QUESTIONS {
                println!("  • {}", question);
            }
        }
        LoadOutcome::Restored => {}
        LoadOutcome::Locked => println!(
            "\nYour saved history is locked. New messages are not saved until you /unlock it."
        ),
        LoadOutcome::Unreadable => {
            println!("\nYour saved history could not be read and has been set aside.")
        }
        LoadOutcome::Unavailable => println!(
            "\nStorage is not responding. New messages are not saved until you /unlock it."
        ),
    }
    println!("Type /help for commands.\n");
}

fn print_message(message: &ChatMessage) {
    let who = match message.role {
        Role::User => "You",
        Role::Assistant => "Assistant",
    };
    println!("[{}] {}: {}", format_clock(&message.timestamp), who, message.content);
}

fn print_history(chat: &ConversationController) {
    for message in chat.messages() {
        print_message(&message);
    }
}

fn print_status(chat: &ConversationController, assistant: &Assistant, data_dir: &std::path::Path) {
    let mode = match chat.mode() {
        Some(ReadyMode::Key) => "device key",
        Some(ReadyMode::Passphrase) => "passphrase",
        Some(ReadyMode::Locked) => "locked (not saving)",
        None => "closed",
    };
    println!("Identity:  {}", chat.identity());
    println!("Storage:   {}", data_dir.display());
    println!("Protected: {}", mode);
    println!("Messages:  {}", chat.messages().len());
    println!(
        "Assistant: {}",
        if assistant.is_online() { "online" } else { "offline" }
    );
}

fn report(error: Error) {
    let notice = UserNotice::from(error);
    if notice.recoverable {
        println!("! {}", notice.message);
    } else {
        println!("! [{}] {}", notice.code, notice.message);
    }
}

// Entry point: a console front-end for the COVID-19 chart and report bot.
//
// Each stdin line is one chat message, optionally prefixed with `author:`.
// With `--command` a single command runs and the process exits once it has
// been answered; stdin is then only read for follow-up answers.
mod aggregate;
mod bot;
mod chart;
mod command;
mod config;
mod error;
mod loader;
mod normalize;
mod output;
mod reports;
mod series;
mod types;
mod util;
mod window;

use std::io::BufRead;
use std::sync::Arc;

use async_trait::async_trait;
use clap::Parser;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use bot::{Bot, Message, Reply, Responder};
use chart::SvgChartRenderer;
use error::BotError;
use loader::RemoteSource;

const CONSOLE_CHANNEL: &str = "console";

#[derive(Debug, Parser)]
#[command(name = "covid_report_bot")]
#[command(about = "Chat-style bot answering COVID-19 chart and ranking requests")]
struct Cli {
    /// Run one command (e.g. "~covid total Vermont") and exit.
    #[arg(long)]
    command: Option<String>,

    /// Author for lines without an `author:` prefix.
    #[arg(long, default_value = "console")]
    author: String,

    /// Print each reply as a JSON object on its own line.
    #[arg(long)]
    json: bool,
}

/// Prints replies to stdout.
struct ConsoleResponder {
    json: bool,
}

#[async_trait]
impl Responder for ConsoleResponder {
    async fn send(&self, reply: Reply) -> Result<(), BotError> {
        if self.json {
            let line = output::to_json_line(&reply).map_err(|e| BotError::Send(e.to_string()))?;
            println!("{line}");
        } else {
            println!("{}", reply.text);
            if let Some(path) = &reply.chart {
                println!("[chart: {}]", path.display());
            }
            println!();
        }
        Ok(())
    }
}

/// Split `alice: ~covid total Maine` into author and content.
fn console_message(line: &str, default_author: &str) -> Message {
    let (author, content) = match line.split_once(':') {
        Some((name, rest)) if !name.trim().is_empty() && !name.trim().contains(char::is_whitespace) => {
            (name.trim(), rest.trim())
        }
        _ => (default_author, line.trim()),
    };
    Message {
        author: author.to_string(),
        channel: CONSOLE_CHANNEL.to_string(),
        content: content.to_string(),
    }
}

/// Forward stdin lines as messages on a plain thread; a blocking stdin read
/// cannot be cancelled, so it must not hold up runtime shutdown.
fn spawn_stdin_reader(default_author: String) -> mpsc::Receiver<Message> {
    let (tx, rx) = mpsc::channel(32);
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if line.trim().is_empty() {
                continue;
            }
            if tx.blocking_send(console_message(&line, &default_author)).is_err() {
                break;
            }
        }
    });
    rx
}

fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = config::load_app_config()?;
    init_tracing(&config.log_level);

    let source = Arc::new(RemoteSource::new(&config)?);
    let renderer = Arc::new(SvgChartRenderer::new(config.chart_dir.clone()));
    let responder = Arc::new(ConsoleResponder { json: cli.json });
    info!(prefix = %config.prefix, "bot ready");
    let bot = Bot::new(config, source, renderer, responder);

    let mut inbox = spawn_stdin_reader(cli.author.clone());

    if let Some(content) = cli.command {
        let router = bot.clone();
        tokio::spawn(async move {
            while let Some(message) = inbox.recv().await {
                router.route_follow_up(&message);
            }
        });
        let outcome = bot
            .handle(Message {
                author: cli.author,
                channel: CONSOLE_CHANNEL.to_string(),
                content,
            })
            .await;
        info!(?outcome, "command finished");
        return Ok(());
    }

    bot.run(inbox).await;
    Ok(())
}

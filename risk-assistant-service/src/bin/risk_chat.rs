//! Terminal chat against the prediction service, without the HTTP layer.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use clap::Parser;
use risk_flow::{AssistantConfig, ChatMessage, FlowRunner, InMemorySessionStorage, MessageKind};
use tokio::io::{AsyncBufReadExt, BufReader};

/// Chat with the construction risk assistant from the terminal
#[derive(Debug, Parser)]
#[command(name = "risk-chat", version)]
struct Cli {
    /// Base URL of the prediction API (overrides PREDICTION_API_URL)
    #[arg(long = "api-url")]
    api_url: Option<String>,

    /// Seconds to wait for a prediction (overrides PREDICTION_TIMEOUT_SECS)
    #[arg(long = "timeout-secs")]
    timeout_secs: Option<u64>,

    /// YAML file with default rules for optional fields
    #[arg(long = "imputation-table", value_name = "FILE")]
    imputation_table: Option<PathBuf>,

    /// Pause before each reply
    #[arg(long = "reply-delay-ms", default_value = "0")]
    reply_delay_ms: u64,
}

impl Cli {
    fn apply(self, mut config: AssistantConfig) -> anyhow::Result<AssistantConfig> {
        if let Some(url) = self.api_url {
            config.prediction.base_url = url;
        }
        if let Some(secs) = self.timeout_secs {
            config.prediction.timeout = Duration::from_secs(secs);
        }
        if self.imputation_table.is_some() {
            config.imputation_table = self.imputation_table;
        }
        config.reply_delay = Duration::from_millis(self.reply_delay_ms);
        config.validate()?;
        Ok(config)
    }
}

fn print_message(message: &ChatMessage) {
    match message.kind {
        MessageKind::Result => println!("\n{}\n", message.text),
        MessageKind::Text => println!("assistant> {}", message.text),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "risk_flow=warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Cli::parse().apply(AssistantConfig::from_env()?)?;
    let runner = FlowRunner::from_config(&config, Arc::new(InMemorySessionStorage::new()))
        .context("failed to build flow runner")?;

    let mut session = runner.open().await?;
    session.transcript.iter().for_each(print_message);
    println!("(type /reset to start over, /quit to exit)");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match line.trim() {
            "" => continue,
            "/quit" | "/exit" => break,
            "/reset" => {
                runner.close(&session.id).await?;
                session = runner.open().await?;
                session.transcript.iter().for_each(print_message);
            }
            text => {
                for reply in runner.send(&session.id, text).await? {
                    print_message(&reply);
                }
            }
        }
    }

    runner.close(&session.id).await?;
    Ok(())
}

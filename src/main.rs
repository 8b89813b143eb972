//! teams-proactive - proactive Microsoft Teams messages from the command line
//!
//! Each invocation performs one connector operation (send to a
//! conversation, reply in a channel thread, or start a channel thread)
//! behind a layered retry and circuit-breaker policy.

mod cli;
mod config;
mod connector;
mod dispatch;
mod resilience;
#[cfg(test)]
mod testing;

use clap::Parser;
use cli::{Cli, Command};
use config::{ConnectorConfig, PolicyConfig};
use connector::{AppCredentials, BotConnectorClient, ConnectorError, LoggingService, Message};
use dispatch::Dispatcher;
use resilience::{Jitter, ResiliencePolicy};
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli.log_level, cli.json_logs);

    let operation = cli.command.name();
    let policy_config = PolicyConfig::from_env();
    let policy = Arc::new(resilience::compose(
        &policy_config,
        Jitter::new(policy_config.jitter_max),
    ));

    match run(cli.command, ConnectorConfig::from_env(), Arc::clone(&policy)).await {
        Ok(id) => {
            tracing::info!(operation, id = %id, "Operation succeeded");
            println!("{id}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(
                operation,
                kind = e.kind.as_str(),
                circuit = ?policy.inner().status(),
                error = %e,
                "Operation failed"
            );
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("teams_proactive={level}").into());
    let registry = tracing_subscriber::registry().with(filter);

    // stdout carries the result id only
    if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(false)
                    .with_span_list(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

/// Execute one command; returns the id assigned by the service.
async fn run(
    command: Command,
    config: ConnectorConfig,
    policy: Arc<ResiliencePolicy>,
) -> Result<String, ConnectorError> {
    let bot = command.bot();
    let credentials = Arc::new(AppCredentials::new(
        bot.app_id.clone(),
        bot.app_password.clone(),
        &config,
    ));
    let client = BotConnectorClient::new(&bot.service_url, credentials, &config)?;
    let dispatcher = Dispatcher::new(Arc::new(LoggingService::new(Arc::new(client))), policy);

    match command {
        Command::SendUserMessage {
            conversation_id,
            message,
            notify,
            ..
        }
        | Command::SendChannelThread {
            conversation_id,
            message,
            notify,
            ..
        } => {
            let message = Message::text(message).with_notify(notify);
            let resp = dispatcher
                .send_to_conversation(&conversation_id, &message)
                .await?;
            Ok(resp.id)
        }
        Command::CreateThread {
            channel_id,
            message,
            ..
        } => {
            let resp = dispatcher
                .create_thread(&channel_id, &Message::text(message))
                .await?;
            tracing::debug!(
                activity_id = ?resp.activity_id,
                service_url = ?resp.service_url,
                "Thread created"
            );
            Ok(resp.id)
        }
    }
}

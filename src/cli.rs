//! Command line surface

use clap::{ArgAction, Args, Parser, Subcommand};
use secrecy::SecretString;

#[derive(Debug, Parser)]
#[command(
    name = "teams-proactive",
    version,
    about = "Send proactive bot messages into Microsoft Teams conversations"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    pub json_logs: bool,
}

/// Bot identity and the connector endpoint to talk to
#[derive(Debug, Args)]
pub struct BotArgs {
    /// Microsoft app id of the bot.
    #[arg(long, env = "MICROSOFT_APP_ID", value_parser = non_blank)]
    pub app_id: String,

    /// Microsoft app password of the bot.
    #[arg(long, env = "MICROSOFT_APP_PASSWORD", hide_env_values = true, value_parser = secret)]
    pub app_password: SecretString,

    /// Service URL of the bot connector (from a previous activity).
    #[arg(long, value_parser = non_blank)]
    pub service_url: String,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Send a message into a one-on-one conversation with a user.
    #[command(name = "sendUserMessage")]
    SendUserMessage {
        #[command(flatten)]
        bot: BotArgs,
        /// Conversation id of the user chat.
        #[arg(long, value_parser = non_blank)]
        conversation_id: String,
        /// Message text.
        #[arg(long, value_parser = non_blank)]
        message: String,
        /// Alert the recipient.
        #[arg(long, action = ArgAction::Set, num_args = 0..=1, default_value_t = false, default_missing_value = "true")]
        notify: bool,
    },
    /// Start a new thread in a channel.
    #[command(name = "createThread")]
    CreateThread {
        #[command(flatten)]
        bot: BotArgs,
        /// Channel id to create the thread in.
        #[arg(long, value_parser = non_blank)]
        channel_id: String,
        /// First message of the thread.
        #[arg(long, value_parser = non_blank)]
        message: String,
    },
    /// Reply into an existing channel thread.
    #[command(name = "sendChannelThread")]
    SendChannelThread {
        #[command(flatten)]
        bot: BotArgs,
        /// Conversation id of the thread.
        #[arg(long, value_parser = non_blank)]
        conversation_id: String,
        /// Message text.
        #[arg(long, value_parser = non_blank)]
        message: String,
        /// Alert the thread participants.
        #[arg(long, action = ArgAction::Set, num_args = 0..=1, default_value_t = false, default_missing_value = "true")]
        notify: bool,
    },
}

impl Command {
    pub fn bot(&self) -> &BotArgs {
        match self {
            Command::SendUserMessage { bot, .. }
            | Command::CreateThread { bot, .. }
            | Command::SendChannelThread { bot, .. } => bot,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Command::SendUserMessage { .. } => "sendUserMessage",
            Command::CreateThread { .. } => "createThread",
            Command::SendChannelThread { .. } => "sendChannelThread",
        }
    }
}

fn non_blank(value: &str) -> Result<String, String> {
    if value.trim().is_empty() {
        Err("must not be blank".to_string())
    } else {
        Ok(value.to_string())
    }
}

fn secret(value: &str) -> Result<SecretString, String> {
    non_blank(value).map(SecretString::new)
}

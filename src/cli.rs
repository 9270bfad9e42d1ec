use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(name = "agent-patch")]
#[command(
    about = "Register an agent, its Telegram binding and bot account in the OpenClaw config",
    long_about = None
)]
#[command(version)]
pub struct Cli {
    /// Agent id, also used as the Telegram account id
    pub agent_id: String,

    /// Display name of the agent
    pub agent_name: String,

    /// Telegram bot token for the agent's account
    pub bot_token: String,

    /// Model identifier (default: anthropic/claude-sonnet-4-5)
    pub model: Option<String>,

    /// Config file to patch (default: ~/.openclaw/openclaw.json)
    #[arg(long = "config", env = "OPENCLAW_CONFIG_PATH")]
    pub config: Option<PathBuf>,

    /// Operator home directory used for the config and workspace paths
    #[arg(long = "home", env = "OPENCLAW_HOME")]
    pub home: Option<PathBuf>,

    /// Print the patched config instead of writing it
    #[arg(long = "dry-run")]
    pub dry_run: bool,

    /// Show debug logging
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

use serde::Deserialize;
use serde_json::{json, Value};
use std::path::Path;

/// Agent id of the catch-all binding that must stay last in `bindings`
pub const MAIN_AGENT_ID: &str = "main";

/// Channel every binding and account produced here belongs to
pub const TELEGRAM_CHANNEL: &str = "telegram";

/// Model used when the operator does not name one
pub const DEFAULT_MODEL: &str = "anthropic/claude-sonnet-4-5";

/// Entry of `agents.list`
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct AgentRecord {
    pub id: String,
    pub name: String,
    pub workspace: String,
    pub model: String,
}

impl AgentRecord {
    pub fn new(id: &str, name: &str, home: &Path, model: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            workspace: workspace_path(home, id),
            model: model.to_string(),
        }
    }

    pub fn to_json(&self) -> Value {
        json!({
            "id": self.id,
            "name": self.name,
            "workspace": self.workspace,
            "model": self.model,
        })
    }
}

/// Workspace directory of an agent: `<home>/.openclaw/workspace-<id>`
pub fn workspace_path(home: &Path, agent_id: &str) -> String {
    home.join(".openclaw")
        .join(format!("workspace-{}", agent_id))
        .to_string_lossy()
        .to_string()
}

/// Entry of `bindings`
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BindingRecord {
    pub agent_id: String,
    #[serde(rename = "match")]
    pub match_rule: BindingMatch,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BindingMatch {
    pub channel: String,
    pub account_id: String,
}

impl BindingRecord {
    /// Route Telegram traffic for the account named after the agent
    pub fn telegram(agent_id: &str) -> Self {
        Self {
            agent_id: agent_id.to_string(),
            match_rule: BindingMatch {
                channel: TELEGRAM_CHANNEL.to_string(),
                account_id: agent_id.to_string(),
            },
        }
    }

    pub fn to_json(&self) -> Value {
        json!({
            "agentId": self.agent_id,
            "match": {
                "channel": self.match_rule.channel,
                "accountId": self.match_rule.account_id,
            },
        })
    }
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DmPolicy {
    /// Unknown senders must complete a pairing handshake
    Pairing,
    Open,
    Closed,
}

impl DmPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            DmPolicy::Pairing => "pairing",
            DmPolicy::Open => "open",
            DmPolicy::Closed => "closed",
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GroupPolicy {
    /// Only explicitly allowed groups are served
    Allowlist,
    Open,
    Closed,
}

impl GroupPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupPolicy::Allowlist => "allowlist",
            GroupPolicy::Open => "open",
            GroupPolicy::Closed => "closed",
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StreamMode {
    Partial,
    Full,
}

impl StreamMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamMode::Partial => "partial",
            StreamMode::Full => "full",
        }
    }
}

/// Entry of `channels.telegram.accounts`
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChannelAccount {
    pub dm_policy: DmPolicy,
    pub bot_token: String,
    pub group_policy: GroupPolicy,
    pub stream_mode: StreamMode,
}

impl ChannelAccount {
    pub fn telegram(bot_token: &str) -> Self {
        Self {
            dm_policy: DmPolicy::Pairing,
            bot_token: bot_token.to_string(),
            group_policy: GroupPolicy::Allowlist,
            stream_mode: StreamMode::Partial,
        }
    }

    pub fn to_json(&self) -> Value {
        json!({
            "dmPolicy": self.dm_policy.as_str(),
            "botToken": self.bot_token,
            "groupPolicy": self.group_policy.as_str(),
            "streamMode": self.stream_mode.as_str(),
        })
    }
}

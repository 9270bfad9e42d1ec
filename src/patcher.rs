//! The three idempotent upserts that register an agent in an OpenClaw
//! config document.
//!
//! Agent records and bindings are first-write-wins: re-running a patch for
//! an id that is already present leaves them untouched. The Telegram
//! account is always replaced, so re-running with a new token rotates it.

use crate::document::ConfigDocument;
use crate::error::{PatchError, Result};
use crate::records::{
    AgentRecord, BindingRecord, ChannelAccount, DEFAULT_MODEL, MAIN_AGENT_ID, TELEGRAM_CHANNEL,
};
use serde_json::{Map, Value};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// A region of the document that is absent or has the wrong JSON type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("`{region}` {problem}")]
pub struct StructureError {
    pub region: String,
    pub problem: String,
}

impl StructureError {
    pub fn missing(region: &str) -> Self {
        Self {
            region: region.to_string(),
            problem: "is missing".to_string(),
        }
    }

    pub fn wrong_type(region: &str, expected: &str, found: &Value) -> Self {
        Self {
            region: region.to_string(),
            problem: format!("must be {}, found {}", expected, json_type_name(found)),
        }
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// The agent an operator asks to register
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentSpec {
    pub id: String,
    pub name: String,
    pub bot_token: String,
    pub model: String,
}

impl AgentSpec {
    pub fn new(id: &str, name: &str, bot_token: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            bot_token: bot_token.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    /// Reject ids that cannot be embedded in a workspace path.
    pub fn validate(&self) -> Result<()> {
        let reason = if self.id.is_empty() {
            Some("must not be empty")
        } else if self.id.starts_with('.') {
            Some("must not start with '.'")
        } else if self.id.contains('/') || self.id.contains('\\') {
            Some("must not contain path separators")
        } else if self.id.chars().any(char::is_whitespace) {
            Some("must not contain whitespace")
        } else {
            None
        };

        match reason {
            Some(reason) => Err(PatchError::InvalidAgentId {
                id: self.id.clone(),
                reason: reason.to_string(),
            }),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountChange {
    Created,
    Replaced,
}

/// What a patch changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatchReport {
    pub agent_added: bool,
    pub binding_added: bool,
    pub account: AccountChange,
}

/// Apply the agent, binding and account upserts to `document`.
///
/// `home` is the operator home directory the workspace path is derived
/// from. The document is consumed: on error it is dropped, so a caller can
/// never persist a half-applied patch.
pub fn patch(
    mut document: ConfigDocument,
    spec: &AgentSpec,
    home: &Path,
) -> Result<(ConfigDocument, PatchReport)> {
    let path = document.path().to_path_buf();
    let in_document = |source: StructureError| PatchError::StructuralMismatch {
        path: path.clone(),
        source,
    };

    let root = match document.root_mut() {
        Value::Object(map) => map,
        other => return Err(in_document(StructureError::wrong_type("$", "an object", other))),
    };

    let agent_added = upsert_agent(root, spec, home).map_err(&in_document)?;
    let binding_added = upsert_binding(root, &spec.id).map_err(&in_document)?;
    let account = upsert_account(root, &spec.id, &spec.bot_token).map_err(&in_document)?;

    let report = PatchReport {
        agent_added,
        binding_added,
        account,
    };
    debug!(agent_id = %spec.id, ?report, "patch computed");

    Ok((document, report))
}

type Step<T> = std::result::Result<T, StructureError>;

fn upsert_agent(root: &mut Map<String, Value>, spec: &AgentSpec, home: &Path) -> Step<bool> {
    let agents = child_object(root, "agents", "agents")?;
    let list = child_array(agents, "list", "agents.list")?;

    if list.iter().any(|entry| string_field(entry, "id") == Some(spec.id.as_str())) {
        debug!(agent_id = %spec.id, "agent already registered, keeping existing record");
        return Ok(false);
    }

    let record = AgentRecord::new(&spec.id, &spec.name, home, &spec.model);
    list.push(record.to_json());
    Ok(true)
}

fn upsert_binding(root: &mut Map<String, Value>, agent_id: &str) -> Step<bool> {
    let bindings = child_array(root, "bindings", "bindings")?;

    if bindings
        .iter()
        .any(|entry| string_field(entry, "agentId") == Some(agent_id))
    {
        debug!(agent_id, "binding already present");
        return Ok(false);
    }

    let binding = BindingRecord::telegram(agent_id).to_json();

    // The catch-all binding is evaluated last by the router
    match bindings
        .iter()
        .position(|entry| string_field(entry, "agentId") == Some(MAIN_AGENT_ID))
    {
        Some(index) => {
            debug!(agent_id, index, "inserting binding before main");
            bindings.insert(index, binding);
        }
        None => bindings.push(binding),
    }

    Ok(true)
}

fn upsert_account(
    root: &mut Map<String, Value>,
    agent_id: &str,
    bot_token: &str,
) -> Step<AccountChange> {
    let channels = child_object(root, "channels", "channels")?;
    let telegram = child_object(channels, TELEGRAM_CHANNEL, "channels.telegram")?;

    let accounts = telegram
        .entry("accounts")
        .or_insert_with(|| Value::Object(Map::new()));
    let accounts = match accounts {
        Value::Object(map) => map,
        other => {
            return Err(StructureError::wrong_type(
                "channels.telegram.accounts",
                "an object",
                other,
            ))
        }
    };

    let account = ChannelAccount::telegram(bot_token).to_json();
    let change = match accounts.insert(agent_id.to_string(), account) {
        Some(_) => AccountChange::Replaced,
        None => AccountChange::Created,
    };
    debug!(agent_id, ?change, "telegram account written");

    Ok(change)
}

fn child_object<'a>(
    parent: &'a mut Map<String, Value>,
    key: &str,
    region: &str,
) -> Step<&'a mut Map<String, Value>> {
    match parent.get_mut(key) {
        Some(Value::Object(map)) => Ok(map),
        Some(other) => Err(StructureError::wrong_type(region, "an object", other)),
        None => Err(StructureError::missing(region)),
    }
}

fn child_array<'a>(
    parent: &'a mut Map<String, Value>,
    key: &str,
    region: &str,
) -> Step<&'a mut Vec<Value>> {
    match parent.get_mut(key) {
        Some(Value::Array(items)) => Ok(items),
        Some(other) => Err(StructureError::wrong_type(region, "an array", other)),
        None => Err(StructureError::missing(region)),
    }
}

fn string_field<'a>(entry: &'a Value, key: &str) -> Option<&'a str> {
    entry.get(key).and_then(Value::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const HOME: &str = "/home/op";

    fn doc(value: Value) -> ConfigDocument {
        ConfigDocument::from_value("/home/op/.openclaw/openclaw.json", value)
    }

    fn run(value: Value, spec: &AgentSpec) -> Result<(Value, PatchReport)> {
        patch(doc(value), spec, Path::new(HOME))
            .map(|(document, report)| (document.into_value(), report))
    }

    fn base() -> Value {
        json!({
            "agents": {"list": []},
            "bindings": [{"agentId": "main", "match": {}}],
            "channels": {"telegram": {}}
        })
    }

    fn binding_ids(value: &Value) -> Vec<&str> {
        value["bindings"]
            .as_array()
            .unwrap()
            .iter()
            .map(|b| b["agentId"].as_str().unwrap())
            .collect()
    }

    #[test]
    fn test_scenario_alice() {
        let (value, report) = run(base(), &AgentSpec::new("alice", "Alice", "TOK123")).unwrap();

        assert_eq!(
            value["agents"]["list"],
            json!([{
                "id": "alice",
                "name": "Alice",
                "workspace": "/home/op/.openclaw/workspace-alice",
                "model": "anthropic/claude-sonnet-4-5"
            }])
        );
        assert_eq!(
            value["bindings"],
            json!([
                {"agentId": "alice", "match": {"channel": "telegram", "accountId": "alice"}},
                {"agentId": "main", "match": {}}
            ])
        );
        assert_eq!(
            value["channels"]["telegram"]["accounts"]["alice"],
            json!({
                "dmPolicy": "pairing",
                "botToken": "TOK123",
                "groupPolicy": "allowlist",
                "streamMode": "partial"
            })
        );
        assert_eq!(
            report,
            PatchReport {
                agent_added: true,
                binding_added: true,
                account: AccountChange::Created,
            }
        );
    }

    #[test]
    fn test_second_run_keeps_first_agent_fields() {
        let first = AgentSpec::new("bob", "Bob", "A").with_model("openai/gpt-5");
        let (value, _) = run(base(), &first).unwrap();

        let second = AgentSpec::new("bob", "Robert", "A");
        let (value, report) = run(value, &second).unwrap();

        let list = value["agents"]["list"].as_array().unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0]["name"], "Bob");
        assert_eq!(list[0]["model"], "openai/gpt-5");
        assert!(!report.agent_added);
        assert!(!report.binding_added);
        assert_eq!(report.account, AccountChange::Replaced);
        assert_eq!(binding_ids(&value), ["bob", "main"]);
    }

    #[test]
    fn test_token_is_last_write_wins() {
        let (value, _) = run(base(), &AgentSpec::new("bob", "Bob", "tokenA")).unwrap();
        let (value, _) = run(value, &AgentSpec::new("bob", "Bob", "tokenB")).unwrap();

        let accounts = value["channels"]["telegram"]["accounts"].as_object().unwrap();
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts["bob"]["botToken"], "tokenB");
    }

    #[test]
    fn test_main_stays_last_across_patches() {
        let mut value = json!({
            "agents": {"list": []},
            "bindings": [
                {"agentId": "ops", "match": {"channel": "slack"}},
                {"agentId": "main", "match": {}}
            ],
            "channels": {"telegram": {"accounts": {}}}
        });
        for id in ["a", "b", "c"] {
            value = run(value, &AgentSpec::new(id, id, "t")).unwrap().0;
        }

        assert_eq!(binding_ids(&value), ["ops", "a", "b", "c", "main"]);
    }

    #[test]
    fn test_inserts_before_first_main_only() {
        let value = json!({
            "agents": {"list": []},
            "bindings": [
                {"agentId": "main", "match": {"channel": "telegram"}},
                {"agentId": "main", "match": {}}
            ],
            "channels": {"telegram": {}}
        });
        let (value, _) = run(value, &AgentSpec::new("x", "X", "t")).unwrap();

        assert_eq!(binding_ids(&value), ["x", "main", "main"]);
    }

    #[test]
    fn test_no_main_binding_appends_and_creates_accounts() {
        let value = json!({
            "agents": {"list": []},
            "bindings": [],
            "channels": {"telegram": {"enabled": true}}
        });
        let (value, report) = run(value, &AgentSpec::new("x", "X", "t")).unwrap();

        assert_eq!(binding_ids(&value), ["x"]);
        assert_eq!(value["channels"]["telegram"]["enabled"], true);
        assert!(value["channels"]["telegram"]["accounts"]["x"].is_object());
        assert_eq!(report.account, AccountChange::Created);
    }

    #[test]
    fn test_existing_binding_for_other_channel_counts_as_present() {
        let value = json!({
            "agents": {"list": [{"id": "x", "name": "X"}]},
            "bindings": [{"agentId": "x", "match": {"channel": "discord"}}],
            "channels": {"telegram": {}}
        });
        let (value, report) = run(value, &AgentSpec::new("x", "X", "t")).unwrap();

        assert!(!report.binding_added);
        assert_eq!(value["bindings"].as_array().unwrap().len(), 1);
        assert_eq!(value["agents"]["list"][0], json!({"id": "x", "name": "X"}));
    }

    #[test]
    fn test_unrelated_keys_keep_their_order() {
        let value = json!({
            "meta": {"version": 3},
            "agents": {"defaults": {"model": "m"}, "list": []},
            "bindings": [],
            "channels": {"telegram": {}, "discord": {"enabled": false}},
            "gateway": {"port": 18789}
        });
        let (value, _) = run(value, &AgentSpec::new("x", "X", "t")).unwrap();

        let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
        assert_eq!(keys, ["meta", "agents", "bindings", "channels", "gateway"]);
        assert_eq!(value["gateway"]["port"], 18789);
        assert_eq!(value["agents"]["defaults"]["model"], "m");
    }

    #[test]
    fn test_non_object_entries_are_skipped() {
        let value = json!({
            "agents": {"list": ["junk", {"name": "no id"}]},
            "bindings": [42],
            "channels": {"telegram": {}}
        });
        let (value, report) = run(value, &AgentSpec::new("x", "X", "t")).unwrap();

        assert!(report.agent_added);
        assert_eq!(value["agents"]["list"].as_array().unwrap().len(), 3);
        assert_eq!(value["bindings"][1]["agentId"], "x");
    }

    fn mismatch_region(value: Value) -> String {
        match run(value, &AgentSpec::new("x", "X", "t")) {
            Err(PatchError::StructuralMismatch { source, .. }) => source.region,
            other => panic!("expected structural mismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_regions_are_structural_mismatches() {
        assert_eq!(
            mismatch_region(json!({"bindings": [], "channels": {"telegram": {}}})),
            "agents"
        );
        assert_eq!(
            mismatch_region(json!({"agents": {}, "bindings": [], "channels": {"telegram": {}}})),
            "agents.list"
        );
        assert_eq!(
            mismatch_region(json!({"agents": {"list": []}, "channels": {"telegram": {}}})),
            "bindings"
        );
        assert_eq!(
            mismatch_region(json!({"agents": {"list": []}, "bindings": [], "channels": {}})),
            "channels.telegram"
        );
    }

    #[test]
    fn test_wrong_types_are_structural_mismatches() {
        assert_eq!(mismatch_region(json!([])), "$");
        assert_eq!(
            mismatch_region(json!({"agents": {"list": {}}, "bindings": [], "channels": {"telegram": {}}})),
            "agents.list"
        );
        assert_eq!(
            mismatch_region(json!({
                "agents": {"list": []},
                "bindings": [],
                "channels": {"telegram": {"accounts": []}}
            })),
            "channels.telegram.accounts"
        );
    }

    #[test]
    fn test_wrong_type_message() {
        let err = StructureError::wrong_type("bindings", "an array", &json!("nope"));
        assert_eq!(err.to_string(), "`bindings` must be an array, found a string");
    }

    #[test]
    fn test_validate_agent_id() {
        assert!(AgentSpec::new("alice", "A", "t").validate().is_ok());
        assert!(AgentSpec::new("team_bot-2", "A", "t").validate().is_ok());

        for bad in ["", ".hidden", "a/b", "a\\b", "a b"] {
            let err = AgentSpec::new(bad, "A", "t").validate().unwrap_err();
            assert!(matches!(err, PatchError::InvalidAgentId { .. }), "{bad:?}");
        }
    }
}

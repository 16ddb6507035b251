//! Relay wire protocol
//!
//! JSON text frames tagged by `type`. Outbound frames are built by the pad,
//! inbound frames are decoded in two steps so that an unknown or missing
//! `type` can be told apart from a malformed body.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

use crate::config::profile::{Action, ActionKind, ConfigDocument};
use crate::constants::protocol;
use crate::error::ParseError;

/// Frames sent from the pad to the relay
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Outbound {
    /// Identification, sent once right after the socket opens
    Hello { client: String },

    /// Command for one host
    Cmd(CommandFrame),

    /// Full document for the relay to store and broadcast
    SaveConfig { config: ConfigDocument },
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CommandFrame {
    #[serde(flatten)]
    pub command: WireCommand,
    pub target: String,
    pub id: String,
}

/// Command body, tagged by `cmd`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "cmd", rename_all = "lowercase")]
pub enum WireCommand {
    Keys { keys: String },
    Run { path: String, args: Vec<String> },
    Shell { command: String },
}

impl CommandFrame {
    pub fn new(target: impl Into<String>, command: WireCommand) -> Self {
        Self {
            command,
            target: target.into(),
            id: uuid::Uuid::new_v4().to_string(),
        }
    }
}

impl WireCommand {
    /// Map a button action to its wire form; noop actions have none
    pub fn from_action(action: &Action) -> Option<Self> {
        match &action.kind {
            ActionKind::Keys | ActionKind::Hotkey => Some(WireCommand::Keys {
                keys: action.payload.clone(),
            }),
            ActionKind::Run => Some(WireCommand::Run {
                path: action.payload.clone(),
                args: Vec::new(),
            }),
            ActionKind::Shell => Some(WireCommand::Shell {
                command: action.payload.clone(),
            }),
            ActionKind::Noop | ActionKind::Other(_) => None,
        }
    }
}

impl Outbound {
    pub fn hello() -> Self {
        Outbound::Hello {
            client: protocol::CLIENT_KIND.to_string(),
        }
    }

    /// Command frame with a fresh unique id
    pub fn command(target: impl Into<String>, command: WireCommand) -> Self {
        Outbound::Cmd(CommandFrame::new(target, command))
    }

    pub fn save_config(config: ConfigDocument) -> Self {
        Outbound::SaveConfig { config }
    }

    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Frames received from the relay
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Inbound {
    Status(StatusFrame),
    ConfigUpdated(ConfigPush),
    Ack(Notice),
    Error(Notice),
}

#[derive(Deserialize, Debug, Clone, PartialEq, Default)]
pub struct StatusFrame {
    #[serde(default)]
    pub online: bool,
    #[serde(default, deserialize_with = "deserialize_hosts")]
    pub hosts: Vec<String>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct ConfigPush {
    pub config: ConfigDocument,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Default)]
pub struct Notice {
    #[serde(default)]
    pub message: Option<String>,
}

fn deserialize_hosts<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Inbound message categories, one handler each
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Status,
    ConfigUpdated,
    Ack,
    Error,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Status => "status",
            MessageKind::ConfigUpdated => "config_updated",
            MessageKind::Ack => "ack",
            MessageKind::Error => "error",
        }
    }

    pub fn from_type(value: &str) -> Option<Self> {
        match value {
            "status" => Some(MessageKind::Status),
            "config_updated" => Some(MessageKind::ConfigUpdated),
            "ack" => Some(MessageKind::Ack),
            "error" => Some(MessageKind::Error),
            _ => None,
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Inbound {
    pub fn kind(&self) -> MessageKind {
        match self {
            Inbound::Status(_) => MessageKind::Status,
            Inbound::ConfigUpdated(_) => MessageKind::ConfigUpdated,
            Inbound::Ack(_) => MessageKind::Ack,
            Inbound::Error(_) => MessageKind::Error,
        }
    }
}

/// Decode one text frame
pub fn decode_frame(text: &str) -> Result<Inbound, ParseError> {
    let value: Value = serde_json::from_str(text)?;
    let kind = match value.get("type") {
        Some(Value::String(kind)) => kind.as_str(),
        _ => return Err(ParseError::MissingType),
    };
    if MessageKind::from_type(kind).is_none() {
        return Err(ParseError::UnknownType(kind.to_string()));
    }

    let frame: Inbound = serde_json::from_value(value)?;
    if let Inbound::ConfigUpdated(push) = &frame {
        push.config.validate()?;
    }
    Ok(frame)
}

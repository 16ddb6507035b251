//! Profile document model
//!
//! The configuration document is an ordered list of profiles, each holding an
//! ordered list of buttons. Array position is the layout: buttons render
//! left-to-right, top-to-bottom by the profile's column count.
//!
//! Fields this client does not know about are kept in `extra` maps so a
//! document written by another editor survives a load/save cycle intact.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fmt;

use crate::constants::layout;
use crate::error::ParseError;

/// Top-level configuration document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigDocument {
    #[serde(default)]
    pub profiles: Vec<Profile>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One screen of buttons
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub grid: Grid,
    #[serde(default)]
    pub buttons: Vec<Button>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    #[serde(default = "default_cols")]
    pub cols: u32,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One actionable grid cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Button {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub hint: String,
    #[serde(default)]
    pub accent: Accent,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Data URI; an empty string means "no image"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default)]
    pub action: Action,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Accent palette for button borders/glow
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum Accent {
    #[default]
    Cyan,
    Purple,
    Green,
    Amber,
    Red,
    Slate,
    /// Written by a newer editor; drawn like the default, saved back verbatim
    Other(String),
}

/// What a button asks the remote host to do
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Action {
    #[serde(rename = "type", default)]
    pub kind: ActionKind,
    /// Key combo (keys/hotkey), executable path (run), command line (shell)
    #[serde(default, deserialize_with = "deserialize_payload")]
    pub payload: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Keys,
    Hotkey,
    Run,
    Shell,
    #[default]
    Noop,
    /// Unknown type; executes as noop but is saved back verbatim
    Other(String),
}

fn default_cols() -> u32 {
    layout::DEFAULT_GRID_COLS
}

impl Default for Grid {
    fn default() -> Self {
        Self {
            cols: default_cols(),
            extra: Map::new(),
        }
    }
}

impl Grid {
    /// Column count used for layout (never zero)
    pub fn columns(&self) -> usize {
        self.cols.max(1) as usize
    }
}

impl Accent {
    pub const ALL: [Accent; 6] = [
        Accent::Cyan,
        Accent::Purple,
        Accent::Green,
        Accent::Amber,
        Accent::Red,
        Accent::Slate,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Accent::Cyan => "cyan",
            Accent::Purple => "purple",
            Accent::Green => "green",
            Accent::Amber => "amber",
            Accent::Red => "red",
            Accent::Slate => "slate",
            Accent::Other(raw) => raw,
        }
    }

    /// Known palette entry, case-insensitive
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|accent| accent.as_str().eq_ignore_ascii_case(value.trim()))
    }

    fn from_raw(raw: Option<String>) -> Self {
        match raw {
            Some(raw) if !raw.trim().is_empty() => {
                Accent::parse(&raw).unwrap_or(Accent::Other(raw))
            }
            _ => Accent::default(),
        }
    }
}

impl fmt::Display for Accent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Accent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Accent {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Accent::from_raw(Option::<String>::deserialize(deserializer)?))
    }
}

impl ActionKind {
    pub const ALL: [ActionKind; 5] = [
        ActionKind::Keys,
        ActionKind::Hotkey,
        ActionKind::Run,
        ActionKind::Shell,
        ActionKind::Noop,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            ActionKind::Keys => "keys",
            ActionKind::Hotkey => "hotkey",
            ActionKind::Run => "run",
            ActionKind::Shell => "shell",
            ActionKind::Noop => "noop",
            ActionKind::Other(raw) => raw,
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(value.trim()))
    }

    fn from_raw(raw: Option<String>) -> Self {
        match raw {
            Some(raw) if !raw.trim().is_empty() => {
                ActionKind::parse(&raw).unwrap_or(ActionKind::Other(raw))
            }
            _ => ActionKind::default(),
        }
    }

    /// Whether the payload is a key combo (recordable from the keyboard)
    pub fn takes_key_combo(&self) -> bool {
        matches!(self, ActionKind::Keys | ActionKind::Hotkey)
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ActionKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ActionKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(ActionKind::from_raw(Option::<String>::deserialize(deserializer)?))
    }
}

/// Accepts string, number or boolean payloads (hand-edited documents)
fn deserialize_payload<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum LoosePayload {
        Text(String),
        Number(serde_json::Number),
        Flag(bool),
    }

    Ok(match Option::<LoosePayload>::deserialize(deserializer)? {
        Some(LoosePayload::Text(text)) => text,
        Some(LoosePayload::Number(number)) => number.to_string(),
        Some(LoosePayload::Flag(flag)) => flag.to_string(),
        None => String::new(),
    })
}

impl Action {
    pub fn new(kind: ActionKind, payload: impl Into<String>) -> Self {
        Self {
            kind,
            payload: payload.into(),
        }
    }
}

impl Button {
    pub fn new(label: impl Into<String>, action: Action) -> Self {
        Self {
            label: label.into(),
            hint: String::new(),
            accent: Accent::default(),
            icon: None,
            image: None,
            action,
            extra: Map::new(),
        }
    }

    /// Button appended by the "add" slot in edit mode
    pub fn placeholder() -> Self {
        Self::new(layout::NEW_BUTTON_LABEL, Action::default())
    }

    /// Image data URI, ignoring the empty-string "cleared" marker
    pub fn image_uri(&self) -> Option<&str> {
        self.image.as_deref().filter(|uri| !uri.trim().is_empty())
    }

    /// Explicit icon name, ignoring blanks
    pub fn icon_name(&self) -> Option<&str> {
        self.icon.as_deref().map(str::trim).filter(|icon| !icon.is_empty())
    }
}

impl Profile {
    pub fn new(id: impl Into<String>, label: impl Into<String>, cols: u32) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            grid: Grid {
                cols: cols.max(1),
                extra: Map::new(),
            },
            buttons: Vec::new(),
            extra: Map::new(),
        }
    }

    /// Label shown in the profile selector
    pub fn display_label(&self) -> &str {
        if self.label.trim().is_empty() {
            &self.id
        } else {
            &self.label
        }
    }
}

impl ConfigDocument {
    /// Parse and validate a JSON document
    pub fn from_json(text: &str) -> Result<Self, ParseError> {
        let document: ConfigDocument = serde_json::from_str(text)?;
        document.validate()?;
        Ok(document)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Profile ids must be unique within a document
    pub fn validate(&self) -> Result<(), ParseError> {
        let mut seen = HashSet::new();
        for profile in &self.profiles {
            if !seen.insert(profile.id.as_str()) {
                return Err(ParseError::DuplicateProfileId(profile.id.clone()));
            }
        }
        Ok(())
    }

    pub fn profile(&self, id: &str) -> Option<&Profile> {
        self.profiles.iter().find(|p| p.id == id)
    }

    pub fn profile_mut(&mut self, id: &str) -> Option<&mut Profile> {
        self.profiles.iter_mut().find(|p| p.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.profile(id).is_some()
    }

    /// Derive an id from `label` that no profile uses yet
    pub fn unique_profile_id(&self, label: &str) -> String {
        let mut base: String = label
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { '-' })
            .collect();
        base = base.trim_matches('-').to_string();
        if base.is_empty() {
            base = "profile".to_string();
        }

        if !self.contains(&base) {
            return base;
        }
        (2..)
            .map(|n| format!("{base}-{n}"))
            .find(|candidate| !self.contains(candidate))
            .unwrap_or(base)
    }
}

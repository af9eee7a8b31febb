//! Operator commands posted to the backend's `/command` endpoint.
//!
//! Wire shape: `{"action": "CMD_MOVE", "value": "FWD"}`; `value` is omitted
//! when the action takes none.

use std::fmt;

use serde::{Deserialize, Serialize};

pub const ACTION_MODE: &str = "CMD_MODE";
pub const ACTION_MOVE: &str = "CMD_MOVE";
pub const ACTION_TERMINATE: &str = "CMD_TERMINATE";

/// Mode labels offered by the console's mode buttons.
pub const MODE_MANUAL: &str = "MANUAL";
pub const MODE_AUTO: &str = "AUTO";
pub const MODE_DOCKING: &str = "DOCKING";

/// A single operator command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl Command {
    pub fn new(action: impl Into<String>, value: Option<String>) -> Self {
        Self {
            action: action.into(),
            value,
        }
    }

    /// Switch the rover's operating mode.
    pub fn mode(label: impl Into<String>) -> Self {
        Self::new(ACTION_MODE, Some(label.into()))
    }

    pub fn movement(direction: Direction) -> Self {
        Self::new(ACTION_MOVE, Some(direction.as_str().to_string()))
    }

    /// Emergency stop.
    pub fn terminate() -> Self {
        Self::new(ACTION_TERMINATE, None)
    }

    /// The parsed action, if it is one the console knows.
    pub fn kind(&self) -> Option<CommandKind> {
        match self.action.as_str() {
            ACTION_MODE => Some(CommandKind::Mode),
            ACTION_MOVE => Some(CommandKind::Move),
            ACTION_TERMINATE => Some(CommandKind::Terminate),
            _ => None,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(v) => write!(f, "{} -> {v}", self.action),
            None => f.write_str(&self.action),
        }
    }
}

/// Known command actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Mode,
    Move,
    Terminate,
}

/// Drive directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
    Left,
    Right,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Forward => "FWD",
            Self::Backward => "BWD",
            Self::Left => "LEFT",
            Self::Right => "RIGHT",
        }
    }

    /// WASD mapping, case-insensitive.
    pub fn from_key(key: char) -> Option<Self> {
        match key.to_ascii_lowercase() {
            'w' => Some(Self::Forward),
            's' => Some(Self::Backward),
            'a' => Some(Self::Left),
            'd' => Some(Self::Right),
            _ => None,
        }
    }
}

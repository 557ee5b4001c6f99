use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque task identifier. Stored ids from older data (e.g. millisecond
/// timestamps) are accepted as-is; fresh ids are UUID v4 strings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct TaskId(pub String);

impl TaskId {
    pub fn generate() -> Self { Self(Uuid::new_v4().to_string()) }
    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self { Self(s.to_string()) }
}

/// Card color tag. Serialized as the lowercase hex value; an unknown stored
/// value loads as the default so one bad record can't wipe the collection.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(from = "String", into = "String")]
pub enum TaskColor {
    #[default]
    Blue,
    Green,
    Purple,
    Orange,
    Pink,
    Cyan,
    Red,
    Yellow,
}

impl TaskColor {
    /// Picker order.
    pub const ALL: [TaskColor; 8] = [
        TaskColor::Blue,
        TaskColor::Green,
        TaskColor::Purple,
        TaskColor::Orange,
        TaskColor::Pink,
        TaskColor::Cyan,
        TaskColor::Red,
        TaskColor::Yellow,
    ];

    pub fn hex(self) -> &'static str {
        match self {
            TaskColor::Blue => "#4a90e2",
            TaskColor::Green => "#52c41a",
            TaskColor::Purple => "#9254de",
            TaskColor::Orange => "#fa8c16",
            TaskColor::Pink => "#eb2f96",
            TaskColor::Cyan => "#13c2c2",
            TaskColor::Red => "#ff4d4f",
            TaskColor::Yellow => "#fadb14",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            TaskColor::Blue => "Blue",
            TaskColor::Green => "Green",
            TaskColor::Purple => "Purple",
            TaskColor::Orange => "Orange",
            TaskColor::Pink => "Pink",
            TaskColor::Cyan => "Cyan",
            TaskColor::Red => "Red",
            TaskColor::Yellow => "Yellow",
        }
    }

    /// RGB components of the hex value, for renderers.
    pub fn rgb(self) -> (u8, u8, u8) {
        let hex = &self.hex()[1..];
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).unwrap_or(0);
        (channel(0), channel(2), channel(4))
    }

    /// Next color in picker order, wrapping around.
    pub fn next(self) -> Self {
        let pos = Self::ALL.iter().position(|c| *c == self).unwrap_or(0);
        Self::ALL[(pos + 1) % Self::ALL.len()]
    }
}

impl fmt::Display for TaskColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.hex()) }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown task color `{0}`")]
pub struct UnknownColor(pub String);

impl FromStr for TaskColor {
    type Err = UnknownColor;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.hex().eq_ignore_ascii_case(s) || c.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownColor(s.to_string()))
    }
}

impl From<String> for TaskColor {
    fn from(s: String) -> Self { s.parse().unwrap_or_default() }
}

impl From<TaskColor> for String {
    fn from(c: TaskColor) -> Self { c.hex().to_string() }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub text: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub color: TaskColor,
    #[serde(default)]
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Task {
    /// True once a field update has landed after creation.
    pub fn was_edited(&self) -> bool {
        self.updated_at.is_some_and(|at| at != self.created_at)
    }

    /// Case-insensitive substring match on title or description.
    /// `needle` must already be lowercased.
    pub fn matches(&self, needle: &str) -> bool {
        self.text.to_lowercase().contains(needle) || self.description.to_lowercase().contains(needle)
    }
}

/// Field patch for an update; `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub text: Option<String>,
    pub description: Option<String>,
    pub color: Option<TaskColor>,
    pub completed: Option<bool>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.description.is_none() && self.color.is_none() && self.completed.is_none()
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct TaskStats {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
}

/// Completion-state selector for the displayed list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Filter {
    #[default]
    All,
    Pending,
    Completed,
}

impl Filter {
    pub fn as_str(self) -> &'static str {
        match self {
            Filter::All => "all",
            Filter::Pending => "pending",
            Filter::Completed => "completed",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Filter::All => "All",
            Filter::Pending => "Pending",
            Filter::Completed => "Completed",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Filter::All => Filter::Pending,
            Filter::Pending => Filter::Completed,
            Filter::Completed => Filter::All,
        }
    }

    pub fn includes(self, task: &Task) -> bool {
        match self {
            Filter::All => true,
            Filter::Pending => !task.completed,
            Filter::Completed => task.completed,
        }
    }
}

/// Unrecognized names fall back to `All`.
impl From<&str> for Filter {
    fn from(s: &str) -> Self {
        match s.trim() {
            "pending" => Filter::Pending,
            "completed" => Filter::Completed,
            _ => Filter::All,
        }
    }
}

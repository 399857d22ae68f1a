use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The journal entity kinds kept in the local store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Reflections,
    Virtues,
    Reframes,
    Challenges,
    MoodLogs,
}

impl EntityKind {
    pub const ALL: [EntityKind; 5] = [
        EntityKind::Reflections,
        EntityKind::Virtues,
        EntityKind::Reframes,
        EntityKind::Challenges,
        EntityKind::MoodLogs,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Reflections => "reflections",
            EntityKind::Virtues => "virtues",
            EntityKind::Reframes => "reframes",
            EntityKind::Challenges => "challenges",
            EntityKind::MoodLogs => "mood_logs",
        }
    }

    /// Local SQLite table holding this kind.
    pub fn table_name(&self) -> &'static str {
        self.as_str()
    }

    /// Remote table the backend stores this kind in.
    pub fn remote_table(&self) -> &'static str {
        self.as_str()
    }

    /// Field the by-date index is built from.
    pub fn date_field(&self) -> &'static str {
        match self {
            EntityKind::Reflections | EntityKind::Reframes => "created_at",
            EntityKind::Virtues | EntityKind::Challenges | EntityKind::MoodLogs => "date",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "reflections" => Ok(EntityKind::Reflections),
            "virtues" => Ok(EntityKind::Virtues),
            "reframes" => Ok(EntityKind::Reframes),
            "challenges" => Ok(EntityKind::Challenges),
            "mood_logs" | "moodLogs" => Ok(EntityKind::MoodLogs),
            other => Err(format!("Unknown entity kind: {other}")),
        }
    }
}

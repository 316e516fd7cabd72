use serde::{Deserialize, Serialize};
use std::fmt;

/// Newtype wrapper for scene IDs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SceneId(pub String);

/// Newtype wrapper for choice IDs. Unique within a scene.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChoiceId(pub String);

impl SceneId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl ChoiceId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SceneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for ChoiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SceneId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<&str> for ChoiceId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// One block of narration inside a scene, revealed with the typewriter effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryText {
    pub id: String,
    pub text: String,
    /// Milliseconds to wait before the first character appears.
    #[serde(default)]
    pub delay_ms: u64,
    /// Milliseconds per character. `None` falls back to the playback default.
    #[serde(default)]
    pub speed_ms: Option<u64>,
}

impl StoryText {
    pub fn new(id: &str, text: &str) -> Self {
        Self {
            id: id.to_string(),
            text: text.to_string(),
            delay_ms: 0,
            speed_ms: None,
        }
    }
}

/// A player-facing edge from one scene to another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub id: ChoiceId,
    pub label: String,
    pub target: SceneId,
    /// Reserved for conditional branching. Parsed and kept, never evaluated.
    #[serde(default)]
    pub condition: Option<String>,
}

impl Choice {
    pub fn new(id: &str, label: &str, target: &str) -> Self {
        Self {
            id: ChoiceId::from(id),
            label: label.to_string(),
            target: SceneId::from(target),
            condition: None,
        }
    }
}

/// A node in the story graph: sequential text followed by choices or an
/// ending marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scene {
    pub id: SceneId,
    #[serde(default)]
    pub title: Option<String>,
    pub texts: Vec<StoryText>,
    #[serde(default)]
    pub choices: Vec<Choice>,
    /// Style token the presentation shell derives colours from.
    #[serde(default)]
    pub background: Option<String>,
    /// Background music reference. Carried through, not played.
    #[serde(default)]
    pub music: Option<String>,
    #[serde(default)]
    pub is_ending: bool,
}

impl Scene {
    pub fn choice(&self, id: &ChoiceId) -> Option<&Choice> {
        self.choices.iter().find(|c| &c.id == id)
    }

    /// Returns true if the scene has neither choices nor an ending flag.
    pub fn is_dead_end(&self) -> bool {
        self.choices.is_empty() && !self.is_ending
    }
}

/// A whole authored story, as handed over by the content loader.
///
/// Scenes keep their declaration order; `StoryGraph` indexes them by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Story {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub start_scene: SceneId,
    pub scenes: Vec<Scene>,
}

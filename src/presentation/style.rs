use serde::Serialize;

use crate::schema::story::{Choice, ChoiceId};

/// How a text block should be typeset, inferred from its punctuation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TextStyle {
    Normal,
    /// Exclamations: larger, emphasised.
    Dramatic,
    /// Quoted speech: italic, softer.
    Whisper,
}

impl TextStyle {
    pub fn classify(text: &str) -> Self {
        if text.contains('!') || text.contains('！') {
            return Self::Dramatic;
        }
        let bracketed = text.contains('「') && text.contains('」');
        if bracketed || text.matches('"').count() >= 2 {
            return Self::Whisper;
        }
        Self::Normal
    }
}

const CHOICE_ICONS: [&str; 8] = ["🌟", "⚡", "🔮", "🌙", "☀️", "🌸", "⭐", "🎭"];

const CHOICE_ACCENTS: [&str; 6] = [
    "from-blue-500 to-purple-600",
    "from-green-500 to-teal-600",
    "from-red-500 to-pink-600",
    "from-yellow-500 to-orange-600",
    "from-indigo-500 to-blue-600",
    "from-purple-500 to-pink-600",
];

/// A choice button as the shell draws it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChoiceDecoration {
    pub id: ChoiceId,
    pub label: String,
    pub icon: &'static str,
    pub accent: &'static str,
    pub selected: bool,
}

impl ChoiceDecoration {
    /// Decorations cycle by position, so the same scene always looks the same.
    pub fn for_choices(choices: &[Choice], selected: Option<&ChoiceId>) -> Vec<Self> {
        choices
            .iter()
            .enumerate()
            .map(|(i, choice)| Self {
                id: choice.id.clone(),
                label: choice.label.clone(),
                icon: CHOICE_ICONS[i % CHOICE_ICONS.len()],
                accent: CHOICE_ACCENTS[i % CHOICE_ACCENTS.len()],
                selected: selected == Some(&choice.id),
            })
            .collect()
    }
}

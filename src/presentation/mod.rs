//! Presentation shell: everything a renderer draws, derived from a
//! `PlaybackSnapshot`. Nothing here feeds back into playback.

pub mod palette;
pub mod particles;
pub mod progress;
pub mod style;

use serde::{Deserialize, Serialize};

use crate::core::playback::{Phase, PlaybackSnapshot};
use crate::presentation::palette::PaletteKind;
use crate::presentation::particles::ParticleField;
use crate::presentation::progress::ProgressIndicator;
use crate::presentation::style::{ChoiceDecoration, TextStyle};

/// Backdrop for scenes that do not name one.
pub const DEFAULT_BACKGROUND: &str = "bg-gray-900";

/// Backdrop shown before the first scene is entered.
pub const LOADING_BACKGROUND: &str = "bg-gradient-to-br from-indigo-900 via-purple-900 to-pink-900";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    pub particle_count: usize,
    pub seed: u64,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            particle_count: 40,
            seed: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StyledText {
    pub id: String,
    pub text: String,
    pub style: TextStyle,
    /// False while the block is still being typed out.
    pub complete: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneVisuals {
    pub title: Option<String>,
    pub background: String,
    pub particles: ParticleField,
    pub progress: ProgressIndicator,
    pub texts: Vec<StyledText>,
    pub choices: Vec<ChoiceDecoration>,
    pub transitioning: bool,
    pub show_ending_banner: bool,
}

impl SceneVisuals {
    pub fn derive(snapshot: &PlaybackSnapshot, shell: &ShellConfig) -> Self {
        let scene = snapshot.scene.as_ref();
        let background = match scene {
            None => LOADING_BACKGROUND.to_string(),
            Some(s) => s
                .background
                .clone()
                .unwrap_or_else(|| DEFAULT_BACKGROUND.to_string()),
        };
        let palette = PaletteKind::for_background(scene.and_then(|s| s.background.as_deref()));
        let particles = ParticleField::generate(
            scene.map(|s| &s.id),
            palette,
            shell.particle_count,
            shell.seed,
        );

        let mut texts: Vec<StyledText> = snapshot
            .revealed_texts
            .iter()
            .map(|block| StyledText {
                id: block.id.clone(),
                text: block.text.clone(),
                style: TextStyle::classify(&block.text),
                complete: true,
            })
            .collect();
        // Classify on the full text so the style does not flip mid-reveal
        if let Some(active) = &snapshot.active_text {
            texts.push(StyledText {
                id: active.id.clone(),
                text: active.visible.clone(),
                style: TextStyle::classify(&active.full_text),
                complete: false,
            });
        }

        Self {
            title: scene.and_then(|s| s.title.clone()),
            background,
            particles,
            progress: ProgressIndicator::from_snapshot(snapshot),
            texts,
            choices: ChoiceDecoration::for_choices(
                &snapshot.choices,
                snapshot.selected_choice.as_ref(),
            ),
            transitioning: snapshot.phase == Phase::Transitioning,
            show_ending_banner: snapshot.phase == Phase::Ended,
        }
    }
}

//! WASM bindings for narrative-player: drives the browser story shell.

use std::sync::Arc;
use wasm_bindgen::prelude::*;

use narrative_player::core::config::PlaybackConfig;
use narrative_player::core::graph::StoryGraph;
use narrative_player::core::observer::NotificationQueue;
use narrative_player::core::playback::Playback;
use narrative_player::presentation::{SceneVisuals, ShellConfig};
use narrative_player::schema::story::ChoiceId;

// ---------------------------------------------------------------------------
// Embedded story: compiled into the WASM binary
// ---------------------------------------------------------------------------
mod data {
    pub const ENCHANTED_FOREST: &str = include_str!("../../stories/enchanted_forest.ron");
}

#[derive(serde::Serialize)]
struct StoryInfo<'a> {
    id: &'a str,
    title: &'a str,
    description: &'a str,
    start_scene: &'a str,
    scene_count: usize,
}

fn serialize<T: serde::Serialize>(value: &T) -> Result<String, JsError> {
    serde_json::to_string(value).map_err(|e| JsError::new(&format!("Serialization error: {e}")))
}

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    tracing_wasm::set_as_global_default();
}

// ---------------------------------------------------------------------------
// StoryPlayer: the main exported struct
// ---------------------------------------------------------------------------
#[wasm_bindgen]
pub struct StoryPlayer {
    playback: Playback,
    notifications: NotificationQueue,
    shell: ShellConfig,
}

#[wasm_bindgen]
impl StoryPlayer {
    /// Create a player for the bundled enchanted forest story.
    ///
    /// `config_json` may override any `PlaybackConfig` field, e.g.
    /// `{"choice_confirm_ms": 800}`.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>, seed: u64) -> Result<StoryPlayer, JsError> {
        Self::from_ron(data::ENCHANTED_FOREST, config_json, seed)
    }

    /// Create a player for a story supplied as RON text.
    pub fn from_ron(
        story_ron: &str,
        config_json: Option<String>,
        seed: u64,
    ) -> Result<StoryPlayer, JsError> {
        let graph = StoryGraph::parse_ron(story_ron)
            .map_err(|e| JsError::new(&format!("Story load error: {e}")))?;

        let config: PlaybackConfig = match config_json {
            Some(json) => serde_json::from_str(&json)
                .map_err(|e| JsError::new(&format!("Invalid config JSON: {e}")))?,
            None => PlaybackConfig::default(),
        };

        let notifications = NotificationQueue::new();
        let playback = Playback::builder(Arc::new(graph))
            .config(config)
            .observer(notifications.clone())
            .build();

        Ok(StoryPlayer {
            playback,
            notifications,
            shell: ShellConfig {
                seed,
                ..ShellConfig::default()
            },
        })
    }

    /// Move the clock forward by `elapsed_ms`, typically once per animation frame.
    pub fn advance(&mut self, elapsed_ms: u64) -> Result<(), JsError> {
        self.playback
            .advance(elapsed_ms)
            .map_err(|e| JsError::new(&format!("Playback error: {e}")))
    }

    /// Advance until the player must act. Returns the milliseconds skipped.
    pub fn run_until_input(&mut self) -> Result<u64, JsError> {
        self.playback
            .run_until_input()
            .map_err(|e| JsError::new(&format!("Playback error: {e}")))
    }

    /// Select a choice by id. Returns false if the selection was rejected;
    /// a rejected selection changes nothing.
    pub fn select_choice(&mut self, choice_id: &str) -> Result<bool, JsError> {
        match self.playback.select_choice(&ChoiceId::from(choice_id)) {
            Ok(()) => Ok(true),
            Err(e) if e.is_invalid_selection() => Ok(false),
            Err(e) => Err(JsError::new(&format!("Playback error: {e}"))),
        }
    }

    /// Finish the text currently revealing. Returns true if anything was skipped.
    pub fn skip(&mut self) -> Result<bool, JsError> {
        self.playback
            .skip()
            .map_err(|e| JsError::new(&format!("Playback error: {e}")))
    }

    pub fn restart(&mut self) {
        self.playback.restart();
        self.notifications.drain();
    }

    /// JSON `PlaybackSnapshot` of the current instant.
    pub fn snapshot(&self) -> Result<String, JsError> {
        serialize(&self.playback.snapshot())
    }

    /// JSON `SceneVisuals`: backdrop, particles, progress, styled text, choices.
    pub fn visuals(&self) -> Result<String, JsError> {
        serialize(&SceneVisuals::derive(&self.playback.snapshot(), &self.shell))
    }

    /// JSON array of notifications raised since the last call.
    pub fn drain_notifications(&self) -> Result<String, JsError> {
        serialize(&self.notifications.drain())
    }

    /// JSON summary of the loaded story.
    pub fn story_info(&self) -> Result<String, JsError> {
        let graph = self.playback.graph();
        serialize(&StoryInfo {
            id: graph.id(),
            title: graph.title(),
            description: graph.description(),
            start_scene: graph.start_scene().as_str(),
            scene_count: graph.scene_count(),
        })
    }

    /// JSON array of authoring warnings for the loaded story.
    pub fn lint(&self) -> Result<String, JsError> {
        let warnings: Vec<String> = self
            .playback
            .graph()
            .lint()
            .iter()
            .map(|w| w.to_string())
            .collect();
        serialize(&warnings)
    }

    pub fn set_particle_count(&mut self, count: usize) {
        self.shell.particle_count = count;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok<T>(result: Result<T, JsError>) -> T {
        match result {
            Ok(value) => value,
            Err(_) => panic!("wasm binding call failed"),
        }
    }

    #[test]
    fn embedded_story_plays() {
        let mut player = ok(StoryPlayer::from_ron(data::ENCHANTED_FOREST, None, 7));
        ok(player.run_until_input());
        assert!(ok(player.select_choice("choice-light")));
        assert!(!ok(player.select_choice("choice-dark")));

        let notes = ok(player.drain_notifications());
        assert!(notes.contains("\"type\":\"scene_changed\""));
        assert!(notes.contains("forest-entrance"));
        assert_eq!(ok(player.drain_notifications()), "[]");
    }

    #[test]
    fn snapshot_and_visuals_serialize() {
        let mut player = ok(StoryPlayer::from_ron(
            data::ENCHANTED_FOREST,
            Some(r#"{"settle_ms": 0}"#.to_string()),
            7,
        ));
        ok(player.advance(10));

        let snapshot = ok(player.snapshot());
        assert!(snapshot.contains("forest-entrance"));
        let visuals = ok(player.visuals());
        assert!(visuals.contains("from-green-400"));
        assert!(ok(player.story_info()).contains("\"scene_count\":8"));
        assert_eq!(ok(player.lint()), "[]");
    }
}

use serde::{Deserialize, Serialize};

use super::story::SceneId;

/// The mutable per-session record the playback controller owns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackState {
    pub current_scene_id: SceneId,
    pub current_text_index: usize,
    pub is_text_complete: bool,
    /// Visited scene ids, deduplicated. A revisit moves the id to the tail.
    pub history: Vec<SceneId>,
}

impl PlaybackState {
    /// The state a fresh session (or a restart) begins with.
    pub fn initial(start_scene: SceneId) -> Self {
        Self {
            current_scene_id: start_scene,
            current_text_index: 0,
            is_text_complete: false,
            history: Vec::new(),
        }
    }

    /// Record a visit, removing any earlier occurrence of the same scene first.
    pub fn record_visit(&mut self, scene: &SceneId) {
        self.history.retain(|id| id != scene);
        self.history.push(scene.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(names: &[&str]) -> Vec<SceneId> {
        names.iter().map(|n| SceneId::from(*n)).collect()
    }

    #[test]
    fn initial_state_is_empty() {
        let state = PlaybackState::initial(SceneId::from("start"));
        assert_eq!(state.current_scene_id, SceneId::from("start"));
        assert_eq!(state.current_text_index, 0);
        assert!(!state.is_text_complete);
        assert!(state.history.is_empty());
    }

    #[test]
    fn revisit_moves_to_tail() {
        let mut state = PlaybackState::initial(SceneId::from("a"));
        for name in ["a", "b", "c", "a"] {
            state.record_visit(&SceneId::from(name));
        }
        assert_eq!(state.history, ids(&["b", "c", "a"]));
    }

    #[test]
    fn immediate_reentry_appears_once() {
        let mut state = PlaybackState::initial(SceneId::from("a"));
        state.record_visit(&SceneId::from("a"));
        state.record_visit(&SceneId::from("a"));
        assert_eq!(state.history, ids(&["a"]));
    }
}

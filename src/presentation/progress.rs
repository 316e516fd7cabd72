use serde::Serialize;

use crate::core::playback::PlaybackSnapshot;

/// Most chapter pips drawn before collapsing the rest into a count.
pub const MAX_PIPS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReadingStatus {
    Reading,
    Choosing,
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Pip {
    Unvisited,
    Visited,
    Current,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressIndicator {
    /// Share of the story's scenes visited so far, 0.0..=100.0.
    pub percent: f64,
    pub percent_label: u32,
    pub visited: usize,
    pub total: usize,
    pub status: ReadingStatus,
    pub pips: Vec<Pip>,
    /// Scenes beyond the drawn pips.
    pub overflow: usize,
}

impl ProgressIndicator {
    pub fn from_snapshot(snapshot: &PlaybackSnapshot) -> Self {
        let visited = snapshot.state.history.len();
        let total = snapshot.total_scenes;
        let percent = if total == 0 {
            0.0
        } else {
            (visited as f64 / total as f64 * 100.0).min(100.0)
        };

        let is_ending = snapshot.scene.as_ref().is_some_and(|s| s.is_ending);
        let status = if is_ending {
            ReadingStatus::Complete
        } else if snapshot.is_text_complete {
            ReadingStatus::Choosing
        } else {
            ReadingStatus::Reading
        };

        let pips = (0..total.min(MAX_PIPS))
            .map(|i| {
                if visited > 0 && i == visited - 1 {
                    Pip::Current
                } else if i < visited {
                    Pip::Visited
                } else {
                    Pip::Unvisited
                }
            })
            .collect();

        Self {
            percent,
            percent_label: percent.round() as u32,
            visited,
            total,
            status,
            pips,
            overflow: total.saturating_sub(MAX_PIPS),
        }
    }
}

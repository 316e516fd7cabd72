/// Typewriter text reveal: one character per tick, with skip-to-complete.

use serde::Serialize;

use crate::core::timer::{Scheduler, TimerId, TimerSlot};
use crate::schema::story::SceneId;

/// Identity of one text block activation. A reveal only restarts when it is
/// handed a key it is not already playing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RevealKey {
    pub scene: SceneId,
    pub text_index: usize,
    /// Scene-entry counter, so re-entering the same scene is a new identity.
    pub epoch: u64,
}

/// Observable states of a reveal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RevealPhase {
    Idle,
    Delaying,
    Revealing,
    Complete,
}

/// Timer payload for reveal wake-ups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevealTick {
    pub activation: u64,
}

/// What a call into the reveal engine did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealStep {
    /// Nothing changed (stale tick, redundant skip, redundant activation).
    Ignored,
    /// The reveal moved forward but has not finished.
    Progressed,
    /// The reveal just finished. Returned once per activation.
    Completed,
}

#[derive(Debug, Clone)]
pub struct TextReveal {
    key: Option<RevealKey>,
    text: String,
    total_chars: usize,
    revealed: usize,
    speed_ms: u64,
    phase: RevealPhase,
    activation: u64,
    timer: TimerSlot,
}

impl Default for TextReveal {
    fn default() -> Self {
        Self::new()
    }
}

impl TextReveal {
    pub fn new() -> Self {
        Self {
            key: None,
            text: String::new(),
            total_chars: 0,
            revealed: 0,
            speed_ms: 0,
            phase: RevealPhase::Idle,
            activation: 0,
            timer: TimerSlot::default(),
        }
    }

    /// Start revealing `text` after `delay_ms`, one character every `speed_ms`.
    ///
    /// Returns false without touching anything if `key` is already
    /// delaying, revealing, or complete.
    pub fn activate<W: From<RevealTick>>(
        &mut self,
        key: RevealKey,
        text: &str,
        speed_ms: u64,
        delay_ms: u64,
        scheduler: &mut Scheduler<W>,
    ) -> bool {
        if self.phase != RevealPhase::Idle && self.key.as_ref() == Some(&key) {
            tracing::trace!(scene = %key.scene, index = key.text_index, "redundant reveal activation");
            return false;
        }

        self.timer.release(scheduler);
        self.activation += 1;
        self.key = Some(key);
        self.text = text.to_string();
        self.total_chars = text.chars().count();
        self.revealed = 0;
        self.speed_ms = speed_ms;
        self.phase = RevealPhase::Delaying;
        self.timer.arm(
            scheduler,
            delay_ms,
            W::from(RevealTick {
                activation: self.activation,
            }),
        );
        true
    }

    /// Handle a fired reveal timer.
    ///
    /// The tick that reveals the final character completes the reveal;
    /// completion does not wait for a trailing tick.
    pub fn on_tick<W: From<RevealTick>>(
        &mut self,
        fired: TimerId,
        tick: RevealTick,
        scheduler: &mut Scheduler<W>,
    ) -> RevealStep {
        if tick.activation != self.activation {
            return RevealStep::Ignored;
        }
        self.timer.clear_fired(fired);

        match self.phase {
            RevealPhase::Delaying => {
                self.phase = RevealPhase::Revealing;
                if self.speed_ms == 0 || self.total_chars == 0 {
                    return self.finish(scheduler);
                }
                self.arm_next(scheduler);
                RevealStep::Progressed
            }
            RevealPhase::Revealing => {
                self.revealed += 1;
                if self.revealed >= self.total_chars {
                    return self.finish(scheduler);
                }
                self.arm_next(scheduler);
                RevealStep::Progressed
            }
            RevealPhase::Idle | RevealPhase::Complete => RevealStep::Ignored,
        }
    }

    /// Reveal everything at once. Only honoured while revealing.
    pub fn skip<W>(&mut self, scheduler: &mut Scheduler<W>) -> RevealStep {
        if self.phase != RevealPhase::Revealing {
            return RevealStep::Ignored;
        }
        self.finish(scheduler)
    }

    /// Drop the current activation and return to `Idle`.
    pub fn cancel<W>(&mut self, scheduler: &mut Scheduler<W>) {
        self.timer.release(scheduler);
        self.key = None;
        self.text.clear();
        self.total_chars = 0;
        self.revealed = 0;
        self.phase = RevealPhase::Idle;
    }

    fn arm_next<W: From<RevealTick>>(&mut self, scheduler: &mut Scheduler<W>) {
        self.timer.arm(
            scheduler,
            self.speed_ms,
            W::from(RevealTick {
                activation: self.activation,
            }),
        );
    }

    fn finish<W>(&mut self, scheduler: &mut Scheduler<W>) -> RevealStep {
        self.timer.release(scheduler);
        self.revealed = self.total_chars;
        self.phase = RevealPhase::Complete;
        RevealStep::Completed
    }

    pub fn phase(&self) -> RevealPhase {
        self.phase
    }

    pub fn key(&self) -> Option<&RevealKey> {
        self.key.as_ref()
    }

    pub fn is_complete(&self) -> bool {
        self.phase == RevealPhase::Complete
    }

    pub fn revealed_chars(&self) -> usize {
        self.revealed
    }

    pub fn total_chars(&self) -> usize {
        self.total_chars
    }

    /// The currently visible prefix, cut on a char boundary.
    pub fn visible_text(&self) -> &str {
        self.text
            .char_indices()
            .nth(self.revealed)
            .map(|(i, _)| &self.text[..i])
            .unwrap_or(&self.text)
    }
}

/// Scene playback controller: text sequencing, choices, and transitions.
///
/// One `Playback` drives one session. All state changes happen in
/// response to user input (`select_choice`, `skip`, `restart`) or to timers
/// firing while the owner moves the clock with `advance`.

use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

use crate::core::config::PlaybackConfig;
use crate::core::graph::{StoryError, StoryGraph};
use crate::core::observer::PlaybackObserver;
use crate::core::reveal::{RevealKey, RevealPhase, RevealStep, RevealTick, TextReveal};
use crate::core::timer::{Scheduler, TimerId, TimerSlot};
use crate::schema::playback_state::PlaybackState;
use crate::schema::story::{Choice, ChoiceId, Scene, SceneId, StoryText};

#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("choice '{choice}' is not offered by scene '{scene}'")]
    UnknownChoice { choice: ChoiceId, scene: SceneId },
    #[error("choice '{choice}' rejected: playback is {phase:?}, not awaiting a choice")]
    NotAwaitingChoice { choice: ChoiceId, phase: Phase },
    #[error("choice '{choice}' rejected: '{pending}' is already selected")]
    SelectionLocked { choice: ChoiceId, pending: ChoiceId },
    #[error("story graph error: {0}")]
    Graph(#[from] StoryError),
}

impl PlaybackError {
    /// True for rejected user selections, which leave playback untouched.
    pub fn is_invalid_selection(&self) -> bool {
        !matches!(self, Self::Graph(_))
    }
}

/// Where the controller is in a scene's lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    /// No scene entered yet (fresh session or just restarted).
    Loading,
    /// A scene was entered and is settling before its first text.
    Transitioning,
    /// Revealing the text block at this index.
    Presenting(usize),
    /// All text shown; waiting for the player. Dead-end scenes idle here
    /// with no choices.
    AwaitingChoice,
    /// An ending scene finished.
    Ended,
}

/// Inputs to the playback state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackEvent {
    Start,
    SelectChoice(ChoiceId),
    Skip,
    Restart,
    /// Move the clock forward by this many milliseconds.
    Advance(u64),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Wake {
    Settle { epoch: u64 },
    Reveal(RevealTick),
    ConfirmChoice { epoch: u64, target: SceneId },
}

impl From<RevealTick> for Wake {
    fn from(tick: RevealTick) -> Self {
        Wake::Reveal(tick)
    }
}

/// Scene details the presentation layer needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SceneView {
    pub id: SceneId,
    pub title: Option<String>,
    pub background: Option<String>,
    pub is_ending: bool,
}

/// The text block currently being revealed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActiveText {
    pub index: usize,
    pub id: String,
    pub visible: String,
    pub full_text: String,
    pub phase: RevealPhase,
}

/// Read-only view of everything a renderer needs at one instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlaybackSnapshot {
    pub phase: Phase,
    pub state: PlaybackState,
    pub scene: Option<SceneView>,
    /// Completed text blocks of the current scene, in order.
    pub revealed_texts: Vec<StoryText>,
    pub active_text: Option<ActiveText>,
    pub is_text_complete: bool,
    pub show_choices: bool,
    pub choices: Vec<Choice>,
    pub selected_choice: Option<ChoiceId>,
    pub total_scenes: usize,
    pub now_ms: u64,
}

/// The playback controller. Built via `Playback::builder()`.
pub struct Playback {
    graph: Arc<StoryGraph>,
    config: PlaybackConfig,
    scheduler: Scheduler<Wake>,
    state: PlaybackState,
    phase: Phase,
    displayed: Vec<StoryText>,
    show_choices: bool,
    selected: Option<ChoiceId>,
    reveal: TextReveal,
    transition: TimerSlot,
    epoch: u64,
    observers: Vec<Box<dyn PlaybackObserver>>,
}

/// Builder for constructing a `Playback`.
pub struct PlaybackBuilder {
    graph: Arc<StoryGraph>,
    config: PlaybackConfig,
    observers: Vec<Box<dyn PlaybackObserver>>,
}

impl Playback {
    pub fn builder(graph: Arc<StoryGraph>) -> PlaybackBuilder {
        PlaybackBuilder {
            graph,
            config: PlaybackConfig::default(),
            observers: Vec::new(),
        }
    }

    /// Apply one event. Every public input funnels through here.
    pub fn apply(&mut self, event: PlaybackEvent) -> Result<(), PlaybackError> {
        match event {
            PlaybackEvent::Start => self.start(),
            PlaybackEvent::SelectChoice(id) => self.select_choice(&id),
            PlaybackEvent::Skip => self.skip().map(|_| ()),
            PlaybackEvent::Restart => {
                self.restart();
                Ok(())
            }
            PlaybackEvent::Advance(ms) => self.advance(ms),
        }
    }

    /// Enter the current scene if nothing has been entered yet.
    pub fn start(&mut self) -> Result<(), PlaybackError> {
        if self.phase != Phase::Loading {
            return Ok(());
        }
        let start = self.state.current_scene_id.clone();
        self.enter_scene(start)
    }

    /// Move the clock forward, firing every timer that falls due in order.
    /// Starts the session first if it is still loading.
    pub fn advance(&mut self, elapsed_ms: u64) -> Result<(), PlaybackError> {
        self.start()?;
        let target = self.scheduler.now().saturating_add(elapsed_ms);
        while let Some((id, wake)) = self.scheduler.pop_due(target) {
            self.dispatch(id, wake)?;
        }
        self.scheduler.set_now(target);
        Ok(())
    }

    /// Advance until no timer is pending, i.e. until playback needs input
    /// or has ended. Returns the milliseconds that elapsed.
    pub fn run_until_input(&mut self) -> Result<u64, PlaybackError> {
        self.start()?;
        let began = self.scheduler.now();
        while let Some(deadline) = self.scheduler.next_deadline() {
            let step = deadline.saturating_sub(self.scheduler.now());
            self.advance(step)?;
        }
        Ok(self.scheduler.now() - began)
    }

    /// Select one of the current scene's choices.
    ///
    /// Rejected selections return an error and change nothing.
    pub fn select_choice(&mut self, id: &ChoiceId) -> Result<(), PlaybackError> {
        let result = self.try_select(id);
        if let Err(ref e) = result {
            tracing::warn!(error = %e, "choice selection rejected");
        }
        result
    }

    fn try_select(&mut self, id: &ChoiceId) -> Result<(), PlaybackError> {
        if self.phase != Phase::AwaitingChoice {
            return Err(PlaybackError::NotAwaitingChoice {
                choice: id.clone(),
                phase: self.phase,
            });
        }
        if let Some(ref pending) = self.selected {
            return Err(PlaybackError::SelectionLocked {
                choice: id.clone(),
                pending: pending.clone(),
            });
        }

        let graph = Arc::clone(&self.graph);
        let scene = graph.resolve_scene(&self.state.current_scene_id)?;
        let choice = scene
            .choice(id)
            .ok_or_else(|| PlaybackError::UnknownChoice {
                choice: id.clone(),
                scene: scene.id.clone(),
            })?;

        tracing::info!(scene = %scene.id, choice = %choice.id, target = %choice.target, "choice selected");
        self.selected = Some(choice.id.clone());

        if self.config.choice_confirm_ms == 0 {
            return self.enter_scene(choice.target.clone());
        }
        self.transition.arm(
            &mut self.scheduler,
            self.config.choice_confirm_ms,
            Wake::ConfirmChoice {
                epoch: self.epoch,
                target: choice.target.clone(),
            },
        );
        Ok(())
    }

    /// Collapse the text currently revealing. Returns true if a reveal was
    /// completed by this call.
    pub fn skip(&mut self) -> Result<bool, PlaybackError> {
        match self.reveal.skip(&mut self.scheduler) {
            RevealStep::Completed => {
                tracing::debug!(index = self.state.current_text_index, "reveal skipped");
                self.on_reveal_complete()?;
                Ok(true)
            }
            RevealStep::Progressed | RevealStep::Ignored => Ok(false),
        }
    }

    /// Return to the initial state from any phase, cancelling every timer.
    pub fn restart(&mut self) {
        self.scheduler.cancel_all();
        self.reveal.cancel(&mut self.scheduler);
        self.transition.release(&mut self.scheduler);
        self.epoch += 1;
        self.state = PlaybackState::initial(self.graph.start_scene().clone());
        self.phase = Phase::Loading;
        self.displayed.clear();
        self.show_choices = false;
        self.selected = None;
        tracing::info!(story = %self.graph.id(), "playback restarted");
    }

    fn dispatch(&mut self, fired: TimerId, wake: Wake) -> Result<(), PlaybackError> {
        match wake {
            Wake::Settle { epoch } => {
                if epoch != self.epoch || self.phase != Phase::Transitioning {
                    tracing::trace!(epoch, "stale settle timer ignored");
                    return Ok(());
                }
                self.transition.clear_fired(fired);
                self.phase = Phase::Presenting(0);
                let scene = self.state.current_scene_id.clone();
                tracing::info!(scene = %scene, "scene changed");
                for observer in &mut self.observers {
                    observer.scene_changed(&scene);
                }
                self.begin_text(0)
            }
            Wake::Reveal(tick) => match self.reveal.on_tick(fired, tick, &mut self.scheduler) {
                RevealStep::Completed => self.on_reveal_complete(),
                RevealStep::Progressed | RevealStep::Ignored => Ok(()),
            },
            Wake::ConfirmChoice { epoch, target } => {
                if epoch != self.epoch {
                    tracing::trace!(epoch, "stale choice confirmation ignored");
                    return Ok(());
                }
                self.transition.clear_fired(fired);
                self.enter_scene(target)
            }
        }
    }

    fn enter_scene(&mut self, target: SceneId) -> Result<(), PlaybackError> {
        let graph = Arc::clone(&self.graph);
        let scene = graph.resolve_scene(&target)?;

        self.reveal.cancel(&mut self.scheduler);
        self.transition.release(&mut self.scheduler);
        self.epoch += 1;

        self.state.current_scene_id = scene.id.clone();
        self.state.current_text_index = 0;
        self.state.is_text_complete = false;
        self.state.record_visit(&scene.id);
        self.displayed.clear();
        self.show_choices = false;
        self.selected = None;
        self.phase = Phase::Transitioning;

        tracing::debug!(scene = %scene.id, epoch = self.epoch, "entering scene");
        self.transition.arm(
            &mut self.scheduler,
            self.config.settle_ms,
            Wake::Settle { epoch: self.epoch },
        );
        Ok(())
    }

    fn begin_text(&mut self, index: usize) -> Result<(), PlaybackError> {
        let graph = Arc::clone(&self.graph);
        let scene = graph.resolve_scene(&self.state.current_scene_id)?;
        let Some(block) = scene.texts.get(index) else {
            return Ok(());
        };

        let key = RevealKey {
            scene: scene.id.clone(),
            text_index: index,
            epoch: self.epoch,
        };
        let speed = block.speed_ms.unwrap_or(self.config.default_speed_ms);
        tracing::debug!(scene = %scene.id, index, text = %block.id, "revealing text");
        self.reveal
            .activate(key, &block.text, speed, block.delay_ms, &mut self.scheduler);
        Ok(())
    }

    fn on_reveal_complete(&mut self) -> Result<(), PlaybackError> {
        let Phase::Presenting(index) = self.phase else {
            return Ok(());
        };
        let graph = Arc::clone(&self.graph);
        let scene = graph.resolve_scene(&self.state.current_scene_id)?;
        if let Some(block) = scene.texts.get(index) {
            self.displayed.push(block.clone());
        }

        let next = index + 1;
        if next < scene.texts.len() {
            self.state.current_text_index = next;
            self.phase = Phase::Presenting(next);
            return self.begin_text(next);
        }

        self.state.is_text_complete = true;
        if !scene.choices.is_empty() {
            self.show_choices = true;
            self.phase = Phase::AwaitingChoice;
            tracing::debug!(scene = %scene.id, choices = scene.choices.len(), "awaiting choice");
        } else if scene.is_ending {
            self.phase = Phase::Ended;
            tracing::info!(scene = %scene.id, "story ended");
            for observer in &mut self.observers {
                observer.story_ended();
            }
        } else {
            self.phase = Phase::AwaitingChoice;
            tracing::warn!(scene = %scene.id, "scene has no choices and is not an ending; playback is idle");
        }
        Ok(())
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn graph(&self) -> &Arc<StoryGraph> {
        &self.graph
    }

    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    pub fn now_ms(&self) -> u64 {
        self.scheduler.now()
    }

    pub fn pending_timers(&self) -> usize {
        self.scheduler.pending_count()
    }

    /// The entered scene, or `None` while loading.
    pub fn current_scene(&self) -> Option<&Scene> {
        if self.phase == Phase::Loading {
            return None;
        }
        self.graph.resolve_scene(&self.state.current_scene_id).ok()
    }

    pub fn displayed_texts(&self) -> &[StoryText] {
        &self.displayed
    }

    pub fn show_choices(&self) -> bool {
        self.show_choices
    }

    /// Choices the player may pick right now; empty unless they are shown.
    pub fn available_choices(&self) -> &[Choice] {
        match self.current_scene() {
            Some(scene) if self.show_choices => &scene.choices[..],
            _ => &[],
        }
    }

    pub fn reveal(&self) -> &TextReveal {
        &self.reveal
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        let scene = self.current_scene();
        let active_text = match (self.phase, scene) {
            (Phase::Presenting(index), Some(scene)) => scene.texts.get(index).map(|block| {
                ActiveText {
                    index,
                    id: block.id.clone(),
                    visible: self.reveal.visible_text().to_string(),
                    full_text: block.text.clone(),
                    phase: self.reveal.phase(),
                }
            }),
            _ => None,
        };

        PlaybackSnapshot {
            phase: self.phase,
            state: self.state.clone(),
            scene: scene.map(|s| SceneView {
                id: s.id.clone(),
                title: s.title.clone(),
                background: s.background.clone(),
                is_ending: s.is_ending,
            }),
            revealed_texts: self.displayed.clone(),
            active_text,
            is_text_complete: self.state.is_text_complete,
            show_choices: self.show_choices,
            choices: self.available_choices().to_vec(),
            selected_choice: self.selected.clone(),
            total_scenes: self.graph.scene_count(),
            now_ms: self.scheduler.now(),
        }
    }
}

impl PlaybackBuilder {
    pub fn config(mut self, config: PlaybackConfig) -> Self {
        self.config = config;
        self
    }

    pub fn settle_ms(mut self, ms: u64) -> Self {
        self.config.settle_ms = ms;
        self
    }

    pub fn default_speed_ms(mut self, ms: u64) -> Self {
        self.config.default_speed_ms = ms;
        self
    }

    pub fn choice_confirm_ms(mut self, ms: u64) -> Self {
        self.config.choice_confirm_ms = ms;
        self
    }

    pub fn observer(mut self, observer: impl PlaybackObserver + 'static) -> Self {
        self.observers.push(Box::new(observer));
        self
    }

    pub fn build(self) -> Playback {
        let state = PlaybackState::initial(self.graph.start_scene().clone());
        Playback {
            graph: self.graph,
            config: self.config,
            scheduler: Scheduler::new(),
            state,
            phase: Phase::Loading,
            displayed: Vec::new(),
            show_choices: false,
            selected: None,
            reveal: TextReveal::new(),
            transition: TimerSlot::default(),
            epoch: 0,
            observers: self.observers,
        }
    }
}

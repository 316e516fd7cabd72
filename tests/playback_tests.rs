/// Playback integration tests: end-to-end runs over the bundled story.

use narrative_player::core::config::PlaybackConfig;
use narrative_player::core::graph::StoryGraph;
use narrative_player::core::observer::{Notification, NotificationQueue};
use narrative_player::core::playback::{Phase, Playback, PlaybackError};
use narrative_player::core::reveal::{RevealKey, RevealStep, RevealTick, TextReveal};
use narrative_player::core::timer::Scheduler;
use narrative_player::presentation::{SceneVisuals, ShellConfig};
use narrative_player::schema::playback_state::PlaybackState;
use narrative_player::schema::story::{ChoiceId, SceneId};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::path::Path;
use std::sync::Arc;

fn forest() -> Arc<StoryGraph> {
    Arc::new(StoryGraph::load_from_ron(Path::new("stories/enchanted_forest.ron")).unwrap())
}

fn forest_playback(queue: &NotificationQueue) -> Playback {
    Playback::builder(forest()).observer(queue.clone()).build()
}

fn scenes(ids: &[&str]) -> Vec<SceneId> {
    ids.iter().map(|id| SceneId::from(*id)).collect()
}

fn choose(playback: &mut Playback, id: &str) {
    playback.select_choice(&ChoiceId::from(id)).unwrap();
    playback.run_until_input().unwrap();
}

#[test]
fn scenario_a_choices_appear_after_last_text() {
    let mut playback = forest_playback(&NotificationQueue::new());
    playback.start().unwrap();

    let mut saw_choices_at = None;
    for step in 0..2_000u32 {
        playback.advance(10).unwrap();
        let shown = playback.displayed_texts().len();
        if playback.show_choices() {
            assert_eq!(shown, 3, "choices visible after only {shown} texts");
            saw_choices_at = Some(step);
            break;
        }
        assert!(playback.available_choices().is_empty());
    }
    assert!(saw_choices_at.is_some(), "choices never appeared");
    assert_eq!(playback.available_choices().len(), 3);

    playback
        .select_choice(&ChoiceId::from("choice-light"))
        .unwrap();
    assert_eq!(
        playback.state().current_scene_id,
        SceneId::from("fairy-grove")
    );
    assert_eq!(
        playback.state().history,
        scenes(&["forest-entrance", "fairy-grove"])
    );
}

#[test]
fn scenario_b_humble_ending_fires_once() {
    let queue = NotificationQueue::new();
    let mut playback = forest_playback(&queue);
    playback.run_until_input().unwrap();
    choose(&mut playback, "choice-light");
    choose(&mut playback, "decline-gift");

    assert_eq!(
        playback.state().current_scene_id,
        SceneId::from("humble-ending")
    );
    assert_eq!(playback.phase(), Phase::Ended);
    assert_eq!(playback.displayed_texts().len(), 3);

    let notes = queue.drain();
    let ended = notes
        .iter()
        .filter(|n| **n == Notification::StoryEnded)
        .count();
    assert_eq!(ended, 1);
    assert_eq!(notes.last(), Some(&Notification::StoryEnded));

    let snapshot = playback.snapshot();
    assert!(snapshot.choices.is_empty());
    assert!(!snapshot.show_choices);
    let visuals = SceneVisuals::derive(&snapshot, &ShellConfig::default());
    assert!(visuals.choices.is_empty());
    assert!(visuals.show_ending_banner);

    // Nothing further fires, however long the clock runs
    playback.advance(60_000).unwrap();
    assert!(queue.is_empty());
}

#[test]
fn scenario_c_rest_loop_moves_entrance_to_tail() {
    let queue = NotificationQueue::new();
    let mut playback = forest_playback(&queue);
    playback.run_until_input().unwrap();
    choose(&mut playback, "choice-rest");
    assert_eq!(
        playback.state().history,
        scenes(&["forest-entrance", "rest-area"])
    );

    choose(&mut playback, "restart");
    assert_eq!(
        playback.state().current_scene_id,
        SceneId::from("forest-entrance")
    );
    assert_eq!(
        playback.state().history,
        scenes(&["rest-area", "forest-entrance"])
    );
    assert_eq!(playback.phase(), Phase::AwaitingChoice);
    assert_eq!(playback.displayed_texts().len(), 3);

    let changes: Vec<Notification> = queue.drain();
    assert_eq!(
        changes,
        vec![
            Notification::SceneChanged { scene: SceneId::from("forest-entrance") },
            Notification::SceneChanged { scene: SceneId::from("rest-area") },
            Notification::SceneChanged { scene: SceneId::from("forest-entrance") },
        ]
    );
}

#[test]
fn scenario_d_second_rapid_selection_rejected() {
    let mut playback = forest_playback(&NotificationQueue::new());
    playback.run_until_input().unwrap();

    playback
        .select_choice(&ChoiceId::from("choice-dark"))
        .unwrap();
    let after_first = playback.state().clone();
    let err = playback
        .select_choice(&ChoiceId::from("choice-light"))
        .unwrap_err();
    assert!(err.is_invalid_selection());
    assert_eq!(playback.state(), &after_first);
    assert_eq!(playback.state().current_scene_id, SceneId::from("dark-path"));
}

#[test]
fn scenario_d_with_confirm_delay() {
    let mut playback = Playback::builder(forest()).choice_confirm_ms(800).build();
    playback.run_until_input().unwrap();

    playback
        .select_choice(&ChoiceId::from("choice-dark"))
        .unwrap();
    let before = playback.state().clone();
    let err = playback
        .select_choice(&ChoiceId::from("choice-light"))
        .unwrap_err();
    assert!(matches!(err, PlaybackError::SelectionLocked { .. }));
    assert_eq!(playback.state(), &before);

    playback.advance(800).unwrap();
    assert_eq!(playback.state().current_scene_id, SceneId::from("dark-path"));
}

#[test]
fn unknown_choice_leaves_state_unchanged() {
    let mut playback = forest_playback(&NotificationQueue::new());
    playback.run_until_input().unwrap();
    let before = playback.snapshot();

    // Belongs to another scene
    let err = playback
        .select_choice(&ChoiceId::from("accept-gift"))
        .unwrap_err();
    assert!(matches!(err, PlaybackError::UnknownChoice { .. }));
    assert_eq!(playback.snapshot(), before);
}

#[test]
fn default_settle_matches_bundled_intro_timing() {
    assert_eq!(PlaybackConfig::default().settle_ms, 300);

    let mut playback = forest_playback(&NotificationQueue::new());
    playback.advance(299).unwrap();
    assert_eq!(playback.phase(), Phase::Transitioning);

    // settle 300, intro-1 waits 1000, then its first 50ms tick
    playback.advance(1_050).unwrap();
    assert_eq!(playback.phase(), Phase::Presenting(0));
    let active = playback.snapshot().active_text.unwrap();
    assert_eq!(active.id, "intro-1");
    assert_eq!(active.visible, "C");
}

#[test]
fn restart_from_any_phase_matches_fresh_session() {
    let fresh = PlaybackState::initial(SceneId::from("forest-entrance"));

    let mut loading = forest_playback(&NotificationQueue::new());
    loading.restart();
    assert_eq!(loading.state(), &fresh);

    let mut presenting = forest_playback(&NotificationQueue::new());
    presenting.advance(2_000).unwrap();
    assert!(matches!(presenting.phase(), Phase::Presenting(_)));
    presenting.restart();
    assert_eq!(presenting.state(), &fresh);

    let mut awaiting = forest_playback(&NotificationQueue::new());
    awaiting.run_until_input().unwrap();
    assert_eq!(awaiting.phase(), Phase::AwaitingChoice);
    awaiting.restart();
    assert_eq!(awaiting.state(), &fresh);

    let mut ended = forest_playback(&NotificationQueue::new());
    ended.run_until_input().unwrap();
    choose(&mut ended, "choice-light");
    choose(&mut ended, "accept-gift");
    assert_eq!(ended.phase(), Phase::Ended);
    ended.restart();
    assert_eq!(ended.state(), &fresh);
    assert_eq!(ended.phase(), Phase::Loading);
    assert_eq!(ended.pending_timers(), 0);

    // A restarted session plays through exactly like a new one
    ended.run_until_input().unwrap();
    let mut new = forest_playback(&NotificationQueue::new());
    new.run_until_input().unwrap();
    assert_eq!(ended.state(), new.state());
    assert_eq!(ended.displayed_texts(), new.displayed_texts());
}

#[test]
fn history_stays_deduplicated_on_random_walks() {
    let graph = forest();
    for seed in 0..25u64 {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut playback = Playback::builder(Arc::clone(&graph)).build();
        playback.run_until_input().unwrap();

        for _ in 0..12 {
            let choices: Vec<ChoiceId> = playback
                .available_choices()
                .iter()
                .map(|c| c.id.clone())
                .collect();
            let Some(pick) = choices.choose(&mut rng) else {
                break;
            };
            choose(&mut playback, pick.as_str());

            let history = &playback.state().history;
            let mut unique = history.clone();
            unique.sort();
            unique.dedup();
            assert_eq!(unique.len(), history.len(), "seed {seed}: {history:?}");
            assert_eq!(history.last(), Some(&playback.state().current_scene_id));
        }
    }
}

#[test]
fn instant_and_empty_texts_complete() {
    let graph =
        Arc::new(StoryGraph::load_from_ron(Path::new("tests/fixtures/instant_story.ron")).unwrap());
    let mut playback = Playback::builder(graph).settle_ms(100).build();

    // settle 100 + delay 20, zero speed: whole text at once
    playback.advance(119).unwrap();
    assert!(playback.displayed_texts().is_empty());
    playback.advance(1).unwrap();
    assert_eq!(playback.displayed_texts().len(), 1);
    assert_eq!(playback.displayed_texts()[0].text, "All at once.");

    // Empty block completes when its delay elapses
    playback.advance(5).unwrap();
    assert_eq!(playback.displayed_texts().len(), 2);
    assert_eq!(playback.phase(), Phase::Presenting(2));

    playback.advance(6).unwrap();
    assert_eq!(playback.snapshot().active_text.unwrap().visible, "森の");
    playback.run_until_input().unwrap();
    let shown: Vec<&str> = playback
        .displayed_texts()
        .iter()
        .map(|t| t.text.as_str())
        .collect();
    assert_eq!(shown, vec!["All at once.", "", "森の奥へ"]);
    assert!(playback.show_choices());
}

fn run_reveal(text: &str, speed_ms: u64, skip_after: Option<usize>) -> (usize, String) {
    let mut scheduler: Scheduler<RevealTick> = Scheduler::new();
    let mut reveal = TextReveal::new();
    let key = RevealKey {
        scene: SceneId::from("s"),
        text_index: 0,
        epoch: 1,
    };
    reveal.activate(key, text, speed_ms, 7, &mut scheduler);

    let mut completions = 0;
    while let Some((id, tick)) = scheduler.pop_due(u64::MAX) {
        if reveal.on_tick(id, tick, &mut scheduler) == RevealStep::Completed {
            completions += 1;
        }
        if skip_after == Some(reveal.revealed_chars())
            && reveal.skip(&mut scheduler) == RevealStep::Completed
        {
            completions += 1;
        }
    }
    (completions, reveal.visible_text().to_string())
}

#[test]
fn reveal_completes_once_with_exact_text() {
    let texts = ["", "a", "Suddenly, a huge wolf appears!", "「ようこそ」"];
    for text in texts {
        for speed in [0, 1, 35, 120] {
            let (completions, visible) = run_reveal(text, speed, None);
            assert_eq!(completions, 1, "{text:?} at {speed}ms");
            assert_eq!(visible, text);
        }
    }
}

#[test]
fn skip_matches_natural_completion() {
    let text = "Deep within the green, a faint light glimmers.";
    let natural = run_reveal(text, 50, None);
    for at in [1, 5, 20] {
        assert_eq!(run_reveal(text, 50, Some(at)), natural, "skip after {at} chars");
    }
}

#[test]
fn skip_in_playback_matches_natural_run() {
    let mut skipped = forest_playback(&NotificationQueue::new());
    skipped.start().unwrap();
    while skipped.phase() != Phase::AwaitingChoice {
        skipped.advance(100).unwrap();
        skipped.skip().unwrap();
    }

    let mut natural = forest_playback(&NotificationQueue::new());
    natural.run_until_input().unwrap();

    assert_eq!(skipped.displayed_texts(), natural.displayed_texts());
    assert_eq!(skipped.state(), natural.state());
    assert!(skipped.now_ms() < natural.now_ms());
}

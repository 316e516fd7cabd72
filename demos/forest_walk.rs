/// Forest Walk demo: scripted playthroughs of the bundled story.
///
/// Walks every ending of the enchanted forest, once letting text reveal at
/// its authored pace and once skipping, and prints a timestamped transcript
/// with the scene visuals the shell would draw.
///
/// Run with: cargo run --example forest_walk

use narrative_player::core::graph::StoryGraph;
use narrative_player::core::observer::{Notification, NotificationQueue};
use narrative_player::core::playback::{Phase, Playback};
use narrative_player::presentation::{SceneVisuals, ShellConfig};
use narrative_player::schema::story::ChoiceId;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

const ROUTES: [(&str, &[&str]); 4] = [
    ("Magical ending", &["choice-light", "accept-gift"]),
    ("Humble ending", &["choice-light", "decline-gift"]),
    ("Wisdom ending", &["choice-dark", "talk-wolf", "learn-secret"]),
    (
        "The long way round",
        &["choice-rest", "restart", "choice-dark", "run-away", "choice-light", "decline-gift"],
    ),
];

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("narrative_player=warn")),
        )
        .with_target(false)
        .init();

    let graph = Arc::new(
        StoryGraph::load_from_ron(std::path::Path::new("stories/enchanted_forest.ron"))
            .expect("Failed to load the enchanted forest story"),
    );
    println!("=== {} ===", graph.title());
    println!("{}\n", graph.description());

    let shell = ShellConfig {
        particle_count: 12,
        seed: 2026,
    };

    for (name, route) in ROUTES {
        println!("--- {} ---", name);
        walk(&graph, route, &shell, false);
        println!();
    }

    println!("--- Skipping through the wisdom ending ---");
    walk(&graph, ROUTES[2].1, &shell, true);
}

fn walk(graph: &Arc<StoryGraph>, route: &[&str], shell: &ShellConfig, skip: bool) {
    let queue = NotificationQueue::new();
    let mut playback = Playback::builder(Arc::clone(graph))
        .observer(queue.clone())
        .build();

    settle(&mut playback, &queue, shell, skip);
    for choice in route {
        println!("  > {}", choice);
        playback
            .select_choice(&ChoiceId::from(*choice))
            .expect("Scripted choice was rejected");
        settle(&mut playback, &queue, shell, skip);
    }

    let state = playback.state();
    let visited: Vec<&str> = state.history.iter().map(|s| s.as_str()).collect();
    println!(
        "  Finished at {:.1}s in '{}', history: {}",
        playback.now_ms() as f64 / 1000.0,
        state.current_scene_id,
        visited.join(" -> ")
    );
}

/// Play until input is needed, printing texts as they complete.
fn settle(playback: &mut Playback, queue: &NotificationQueue, shell: &ShellConfig, skip: bool) {
    let mut printed = 0;
    loop {
        if skip {
            playback.skip().expect("Skip failed");
        }
        playback.advance(50).expect("Playback failed");

        for note in queue.drain() {
            match note {
                Notification::SceneChanged { .. } => {
                    printed = 0;
                    let visuals = SceneVisuals::derive(&playback.snapshot(), shell);
                    println!(
                        "  [{:>6}ms] {} ({:?} palette, {} of {} scenes)",
                        playback.now_ms(),
                        visuals.title.as_deref().unwrap_or("untitled"),
                        visuals.particles.palette,
                        visuals.progress.visited,
                        visuals.progress.total
                    );
                }
                Notification::StoryEnded => println!("  ~ THE END ~"),
            }
        }

        let texts = playback.displayed_texts();
        for block in texts.iter().skip(printed) {
            println!("  [{:>6}ms]   {}", playback.now_ms(), block.text);
        }
        printed = texts.len();

        match playback.phase() {
            Phase::AwaitingChoice | Phase::Ended if playback.pending_timers() == 0 => break,
            _ => {}
        }
    }
}

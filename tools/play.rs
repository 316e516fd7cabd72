/// Play: interactive terminal player for story files.
///
/// Usage: play [--story <path>] [--config <path>] [--confirm-ms <n>]
///
/// Commands:
///   <n> | choose <n|id>    pick a choice by number or id
///   skip                   finish the text currently revealing
///   wait <ms>              advance the clock and show partial text
///   run                    advance until input is needed
///   state                  dump the playback snapshot as RON
///   restart                start over from the first scene
///   help                   list commands
///   quit                   exit

use narrative_player::core::config::PlaybackConfig;
use narrative_player::core::graph::StoryGraph;
use narrative_player::core::observer::{Notification, NotificationQueue};
use narrative_player::core::playback::{Phase, Playback};
use narrative_player::presentation::progress::{Pip, ProgressIndicator};
use narrative_player::presentation::style::{ChoiceDecoration, TextStyle};
use narrative_player::schema::story::ChoiceId;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

const DEFAULT_STORY: &str = "stories/enchanted_forest.ron";

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("narrative_player=warn")),
        )
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return;
    }

    let mut story_path = DEFAULT_STORY.to_string();
    let mut config_path = None;
    let mut confirm_ms = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--story" if i + 1 < args.len() => {
                i += 1;
                story_path = args[i].clone();
            }
            "--config" if i + 1 < args.len() => {
                i += 1;
                config_path = Some(args[i].clone());
            }
            "--confirm-ms" if i + 1 < args.len() => {
                i += 1;
                confirm_ms = args[i].parse().ok();
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    let graph = match StoryGraph::load_from_ron(Path::new(&story_path)) {
        Ok(g) => Arc::new(g),
        Err(e) => {
            eprintln!("ERROR: Failed to load story '{}': {}", story_path, e);
            std::process::exit(1);
        }
    };

    let mut config = match config_path {
        Some(ref path) => match PlaybackConfig::load_from_ron(Path::new(path)) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("ERROR: Failed to load config '{}': {}", path, e);
                std::process::exit(1);
            }
        },
        None => PlaybackConfig::default(),
    };
    if let Some(ms) = confirm_ms {
        config.choice_confirm_ms = ms;
    }

    println!("{}", graph.title());
    if !graph.description().is_empty() {
        println!("{}", graph.description());
    }
    println!("{} scenes. Type 'help' for commands.", graph.scene_count());

    let queue = NotificationQueue::new();
    let mut playback = Playback::builder(Arc::clone(&graph))
        .config(config)
        .observer(queue.clone())
        .build();
    let mut transcript = Transcript::default();

    if let Err(e) = playback.run_until_input() {
        eprintln!("ERROR: {}", e);
        std::process::exit(1);
    }
    transcript.render(&playback, &queue);

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("play> ");
        stdout.flush().ok();

        let mut line = String::new();
        if stdin.lock().read_line(&mut line).is_err() || line.is_empty() {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        let cmd = parts[0].to_lowercase();

        let result = match cmd.as_str() {
            "quit" | "exit" | "q" => {
                println!("Goodbye.");
                break;
            }
            "help" | "h" | "?" => {
                print_help();
                continue;
            }
            "choose" | "c" => {
                if parts.len() < 2 {
                    println!("Usage: choose <number|id>");
                    continue;
                }
                select(&mut playback, parts[1])
            }
            "skip" | "s" => playback.skip().map(|skipped| {
                if !skipped {
                    println!("(nothing to skip)");
                }
            }),
            "wait" | "w" => {
                let ms = parts.get(1).and_then(|p| p.parse().ok()).unwrap_or(100);
                playback.advance(ms)
            }
            "run" | "r" => playback.run_until_input().map(|_| ()),
            "state" => {
                match ron::ser::to_string_pretty(&playback.snapshot(), ron::ser::PrettyConfig::default()) {
                    Ok(text) => println!("{}", text),
                    Err(e) => println!("ERROR: {}", e),
                }
                continue;
            }
            "restart" => {
                playback.restart();
                transcript = Transcript::default();
                playback.run_until_input().map(|_| ())
            }
            _ if cmd.parse::<usize>().is_ok() => select(&mut playback, &cmd),
            _ => {
                println!("Unknown command '{}'. Type 'help'.", cmd);
                continue;
            }
        };

        match result {
            Ok(()) => transcript.render(&playback, &queue),
            Err(e) => println!("ERROR: {}", e),
        }
    }
}

/// Select by 1-based number or by id, then play until input is needed.
fn select(
    playback: &mut Playback,
    arg: &str,
) -> Result<(), narrative_player::core::playback::PlaybackError> {
    let id = match arg.parse::<usize>() {
        Ok(n) if n >= 1 => playback
            .available_choices()
            .get(n - 1)
            .map(|c| c.id.clone())
            .unwrap_or_else(|| ChoiceId::from(arg)),
        _ => ChoiceId::from(arg),
    };
    playback.select_choice(&id)?;
    playback.run_until_input().map(|_| ())
}

/// Tracks what has already been printed so each render only adds new lines.
#[derive(Default)]
struct Transcript {
    printed: usize,
}

impl Transcript {
    fn render(&mut self, playback: &Playback, queue: &NotificationQueue) {
        let snapshot = playback.snapshot();

        for note in queue.drain() {
            match note {
                Notification::SceneChanged { scene } => {
                    self.printed = 0;
                    let title = playback
                        .graph()
                        .resolve_scene(&scene)
                        .ok()
                        .and_then(|s| s.title.clone())
                        .unwrap_or_else(|| scene.to_string());
                    println!("\n=== {} ===", title);
                }
                Notification::StoryEnded => {}
            }
        }

        for block in snapshot.revealed_texts.iter().skip(self.printed) {
            println!("{}", styled(&block.text, TextStyle::classify(&block.text)));
        }
        self.printed = snapshot.revealed_texts.len();

        if let Some(active) = &snapshot.active_text {
            println!("{}_", active.visible);
        }

        match snapshot.phase {
            Phase::Loading | Phase::Transitioning => println!("..."),
            Phase::Ended => println!("\n~ THE END ~  (type 'restart' to play again)"),
            Phase::AwaitingChoice if !snapshot.show_choices => {
                println!("\n(The story stops here. Type 'restart'.)")
            }
            _ => {}
        }

        if snapshot.show_choices {
            println!();
            let decorated =
                ChoiceDecoration::for_choices(&snapshot.choices, snapshot.selected_choice.as_ref());
            for (n, choice) in decorated.iter().enumerate() {
                let marker = if choice.selected { " (selected)" } else { "" };
                println!("  {}. {} {}{}", n + 1, choice.icon, choice.label, marker);
            }
        }

        println!("{}", progress_line(&ProgressIndicator::from_snapshot(&snapshot)));
    }
}

fn styled(text: &str, style: TextStyle) -> String {
    match style {
        TextStyle::Normal => text.to_string(),
        TextStyle::Dramatic => format!("** {} **", text),
        TextStyle::Whisper => format!("  {}", text),
    }
}

fn progress_line(progress: &ProgressIndicator) -> String {
    let pips: String = progress
        .pips
        .iter()
        .map(|p| match p {
            Pip::Current => '◆',
            Pip::Visited => '■',
            Pip::Unvisited => '□',
        })
        .collect();
    let overflow = if progress.overflow > 0 {
        format!(" +{}", progress.overflow)
    } else {
        String::new()
    };
    format!(
        "[{}{}] {}% {:?}",
        pips, overflow, progress.percent_label, progress.status
    )
}

fn print_usage() {
    println!("Usage: play [--story <path>] [--config <path>] [--confirm-ms <n>]");
    println!();
    println!("  --story <path>     Story RON file (default: {})", DEFAULT_STORY);
    println!("  --config <path>    PlaybackConfig RON file");
    println!("  --confirm-ms <n>   Delay between picking a choice and the scene changing");
}

fn print_help() {
    println!("Commands:");
    println!("  <n> | choose <n|id>  Pick a choice by number or id");
    println!("  skip                 Finish the text currently revealing");
    println!("  wait <ms>            Advance the clock and show partial text");
    println!("  run                  Advance until input is needed");
    println!("  state                Dump the playback snapshot as RON");
    println!("  restart              Start over from the first scene");
    println!("  help                 This list");
    println!("  quit                 Exit");
}

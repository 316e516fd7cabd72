/// Story Linter: validates story files and reports authoring problems.
///
/// Usage: story_linter <story_file_or_dir> [--strict]
///
/// Load failures (dangling choices, duplicate ids, empty scenes, bad RON)
/// are errors. Dead ends, unreachable scenes, endings with choices and
/// unevaluated conditions are warnings, promoted to errors by `--strict`.

use narrative_player::core::graph::StoryGraph;
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("narrative_player=info")),
        )
        .with_target(false)
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        println!("Usage: story_linter <story_file_or_dir> [--strict]");
        process::exit(0);
    }

    let target = Path::new(&args[1]);
    let strict = args[2..].iter().any(|a| a == "--strict");

    let files = if target.is_file() {
        vec![target.to_path_buf()]
    } else if target.is_dir() {
        let mut found = Vec::new();
        collect_stories(target, &mut found);
        found.sort();
        found
    } else {
        eprintln!("ERROR: Path '{}' does not exist", args[1]);
        process::exit(1);
    };

    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    for path in &files {
        match StoryGraph::load_from_ron(path) {
            Ok(graph) => {
                println!(
                    "  Loaded: {} ('{}', {} scenes)",
                    path.display(),
                    graph.title(),
                    graph.scene_count()
                );
                for warning in graph.lint() {
                    warnings.push(format!("{}: {}", path.display(), warning));
                }
            }
            Err(e) => errors.push(format!("{}: {}", path.display(), e)),
        }
    }

    println!("\n=== Story Lint Report ===\n");

    if files.is_empty() {
        println!("No .ron story files found.");
    } else if errors.is_empty() && warnings.is_empty() {
        println!("All checks passed!");
    }

    for warning in &warnings {
        println!("WARNING: {}", warning);
    }

    for error in &errors {
        println!("ERROR: {}", error);
    }

    println!(
        "\nSummary: {} files, {} errors, {} warnings",
        files.len(),
        errors.len(),
        warnings.len()
    );

    if !errors.is_empty() || (strict && !warnings.is_empty()) {
        process::exit(1);
    }
}

fn collect_stories(dir: &Path, found: &mut Vec<PathBuf>) {
    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                collect_stories(&path, found);
            } else if path.extension().and_then(|s| s.to_str()) == Some("ron") {
                found.push(path);
            }
        }
    }
}

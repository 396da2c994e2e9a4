//! Demo: analyze a directory of feature files in parallel
//!
//! All engine state is local to one `analyze_track` call, so independent
//! tracks parallelize with a plain rayon iterator.
//!
//! Usage: `cargo run --example batch_analyze -- features_dir/`

use rayon::prelude::*;

use harmonia_dsp::{analyze_track, AnalyzerConfig, LinearAnalysis};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let dir = std::env::args()
        .nth(1)
        .ok_or("usage: batch_analyze <features_dir>")?;

    let mut paths: Vec<std::path::PathBuf> = std::fs::read_dir(&dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    paths.sort();

    if paths.is_empty() {
        eprintln!("no .json feature files found in {}", dir);
        return Ok(());
    }

    // One immutable config snapshot shared by every worker.
    let config = AnalyzerConfig::default();

    let results: Vec<(String, Result<String, String>)> = paths
        .par_iter()
        .map(|path| {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let outcome = std::fs::read_to_string(path)
                .map_err(|e| e.to_string())
                .and_then(|json| {
                    serde_json::from_str::<LinearAnalysis>(&json).map_err(|e| e.to_string())
                })
                .and_then(|features| {
                    analyze_track(&features, &config, |_| {}).map_err(|e| e.to_string())
                })
                .map(|result| {
                    format!(
                        "key {} ({:.2}), {} chords, {} sections",
                        result.key.name(),
                        result.key.confidence,
                        result.chords.len(),
                        result.structure.sections.len()
                    )
                });
            (name, outcome)
        })
        .collect();

    let mut failures = 0usize;
    for (name, outcome) in results {
        match outcome {
            Ok(summary) => println!("{:32} {}", name, summary),
            Err(error) => {
                failures += 1;
                eprintln!("{:32} analysis failed: {}", name, error);
            }
        }
    }

    if failures > 0 {
        eprintln!("{} of {} tracks failed", failures, paths.len());
    }

    Ok(())
}

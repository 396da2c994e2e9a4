//! Demo: analyze one pre-extracted feature file
//!
//! Reads a LinearAnalysis JSON file (as emitted by the Feature Adapter) and
//! prints the key, chord timeline, and section map.
//!
//! Usage: `cargo run --example analyze_track -- track_features.json`

use harmonia_dsp::{analyze_track, AnalyzerConfig, LinearAnalysis};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let path = std::env::args()
        .nth(1)
        .ok_or("usage: analyze_track <features.json>")?;

    let json = std::fs::read_to_string(&path)?;
    let features: LinearAnalysis = serde_json::from_str(&json)?;

    let config = AnalyzerConfig::default();
    let result = analyze_track(&features, &config, |stage| {
        eprintln!("  [{}]", stage);
    })?;

    println!("Analysis Results for {}:", path);
    println!(
        "  Key: {} (confidence: {:.2})",
        result.key.name(),
        result.key.confidence
    );
    println!("  Processing time: {:.1} ms", result.summary.processing_time_ms);

    println!("\nChord timeline ({} events):", result.chords.len());
    for event in &result.chords {
        println!(
            "  {:7.2}s - {:7.2}s  {:8} {}",
            event.start_time,
            event.end_time,
            event.chord,
            event.function.as_deref().unwrap_or("")
        );
    }

    println!("\nStructure ({} sections):", result.structure.sections.len());
    for section in &result.structure.sections {
        println!(
            "  {:7.2}s - {:7.2}s  {} {} ({:.2}: {})",
            section.time_range.start_time,
            section.time_range.end_time,
            section.section_label.as_str(),
            section.section_variant,
            section.label_confidence,
            section.label_reason
        );
    }

    for warning in &result.summary.warnings {
        eprintln!("warning: {}", warning);
    }

    Ok(())
}

//! Analysis orchestration and result aggregation
//!
//! Runs the full pipeline for one track: key estimation, chord decoding, and
//! structure segmentation, combined into a [`TrackAnalysis`]. Each stage runs
//! to completion over the in-memory feature set; all state is local to the
//! call, so independent tracks can be analyzed in parallel by independent
//! callers.

pub mod progress;
pub mod result;

use std::time::Instant;

use crate::chords::{detect_chords, DecodeOptions};
use crate::config::AnalyzerConfig;
use crate::error::AnalysisError;
use crate::input::LinearAnalysis;
use crate::key::{estimate_key, parse_key};
use crate::structure::analyze_structure;
use progress::ProgressStage;
use result::{AnalysisSummary, TrackAnalysis};

/// Engine version stamped into every result
pub const ALGORITHM_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Run the full harmonic and structural analysis for one track
///
/// The key context comes from the track metadata when the Feature Adapter (or
/// a user override) supplied one, otherwise from the key estimator; the chord
/// decoder consumes it as diatonic bias. `progress` receives coarse
/// milestones and is advisory only.
///
/// # Errors
///
/// Returns [`AnalysisError::InvalidInput`] when the input record violates the
/// Feature Adapter contract and [`AnalysisError::Config`] for invalid
/// configuration. Degenerate musical input (silence, missing MFCC) never
/// errors; the affected stages return their documented fallbacks.
///
/// # Example
///
/// ```no_run
/// use harmonia_dsp::{analyze_track, AnalyzerConfig, LinearAnalysis};
///
/// let json = std::fs::read_to_string("track_features.json")?;
/// let features: LinearAnalysis = serde_json::from_str(&json)?;
/// let result = analyze_track(&features, &AnalyzerConfig::default(), |_| {})?;
///
/// println!("Key: {} ({:.2})", result.key.name(), result.key.confidence);
/// println!("{} chords, {} sections", result.chords.len(), result.structure.sections.len());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn analyze_track<F>(
    analysis: &LinearAnalysis,
    config: &AnalyzerConfig,
    mut progress: F,
) -> Result<TrackAnalysis, AnalysisError>
where
    F: FnMut(ProgressStage),
{
    let start_time = Instant::now();
    let config = config.validated()?;
    analysis.validate()?;

    let mut warnings = Vec::new();

    log::debug!(
        "Starting track analysis: {:.1}s, {} chroma frames, {} beats",
        analysis.metadata.duration_seconds,
        analysis.chroma_frames.len(),
        analysis.beat_grid.beat_timestamps.len()
    );

    // Key context: a key supplied upstream wins so user overrides survive a
    // re-decode; otherwise estimate from aggregate chroma.
    let key = match (
        analysis.metadata.detected_key.as_deref(),
        analysis.metadata.detected_mode.as_deref(),
    ) {
        (Some(name), Some(mode)) => match parse_key(name, mode) {
            Some(supplied) => supplied,
            None => {
                warnings.push(format!(
                    "unrecognized upstream key '{} {}'; re-estimating",
                    name, mode
                ));
                estimate_key(&analysis.chroma_frames, &config)
            }
        },
        _ => estimate_key(&analysis.chroma_frames, &config),
    };
    progress(ProgressStage::KeyEstimated);

    if key.confidence == 0.0 {
        warnings.push("key estimate defaulted on near-silent chroma".to_string());
    }

    let options = DecodeOptions {
        key: Some(key),
        ..DecodeOptions::from_config(&config)
    };
    let chords = detect_chords(analysis, &options, &config)?;
    progress(ProgressStage::ChordsDecoded);

    if chords.len() == 1 && chords[0].chord == "N" {
        warnings.push("chord timeline degenerated to a single no-chord event".to_string());
    }

    let structure = analyze_structure(analysis, &config, &mut progress)?;
    if structure.sections.is_empty() {
        warnings.push("structure analysis returned no sections (missing chroma)".to_string());
    }

    let processing_time_ms = start_time.elapsed().as_secs_f32() * 1000.0;
    log::debug!(
        "Track analysis complete in {:.1} ms ({} chords, {} sections)",
        processing_time_ms,
        chords.len(),
        structure.sections.len()
    );

    Ok(TrackAnalysis {
        key,
        chords,
        structure,
        summary: AnalysisSummary {
            duration_seconds: analysis.metadata.duration_seconds,
            frame_count: analysis.chroma_frames.len(),
            algorithm_version: ALGORITHM_VERSION.to_string(),
            processing_time_ms,
            warnings,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::result::KeyMode;
    use crate::input::{BeatGrid, ChromaFrame, TrackMetadata};

    fn c_major_analysis() -> LinearAnalysis {
        let mut chroma = [0.0f32; 12];
        chroma[0] = 1.0;
        chroma[4] = 0.9;
        chroma[7] = 0.85;
        LinearAnalysis {
            metadata: TrackMetadata {
                duration_seconds: 20.0,
                sample_rate: 22050,
                detected_key: None,
                detected_mode: None,
            },
            chroma_frames: (0..200)
                .map(|i| ChromaFrame {
                    timestamp: i as f32 * 0.1,
                    chroma,
                })
                .collect(),
            mfcc_frames: vec![],
            beat_grid: BeatGrid {
                tempo_bpm: 120.0,
                beat_timestamps: (0..40).map(|i| i as f32 * 0.5).collect(),
                ..Default::default()
            },
            events: vec![],
        }
    }

    #[test]
    fn test_full_pipeline_on_c_major() {
        let result =
            analyze_track(&c_major_analysis(), &AnalyzerConfig::default(), |_| {}).unwrap();
        assert_eq!(result.key.tonic, 0);
        assert_eq!(result.key.mode, KeyMode::Major);
        assert_eq!(result.chords[0].chord, "C");
        assert_eq!(result.chords[0].function.as_deref(), Some("I"));
        assert!(!result.structure.sections.is_empty());
        assert_eq!(result.summary.frame_count, 200);
    }

    #[test]
    fn test_upstream_key_overrides_estimator() {
        let mut analysis = c_major_analysis();
        analysis.metadata.detected_key = Some("A".to_string());
        analysis.metadata.detected_mode = Some("minor".to_string());
        let result = analyze_track(&analysis, &AnalyzerConfig::default(), |_| {}).unwrap();
        assert_eq!(result.key.tonic, 9);
        assert_eq!(result.key.mode, KeyMode::Minor);
    }

    #[test]
    fn test_invalid_config_rejected_at_entry() {
        let config = AnalyzerConfig {
            min_section_duration: -1.0,
            ..Default::default()
        };
        let err = analyze_track(&c_major_analysis(), &config, |_| {}).unwrap_err();
        assert!(matches!(err, AnalysisError::Config(_)));
    }

    #[test]
    fn test_progress_covers_all_stages() {
        let mut stages = Vec::new();
        analyze_track(&c_major_analysis(), &AnalyzerConfig::default(), |s| {
            stages.push(s)
        })
        .unwrap();
        assert_eq!(stages[0], ProgressStage::KeyEstimated);
        assert_eq!(stages[1], ProgressStage::ChordsDecoded);
        assert!(stages.contains(&ProgressStage::SectionsLabeled));
    }

    #[test]
    fn test_silent_track_collects_warnings() {
        let mut analysis = c_major_analysis();
        for frame in &mut analysis.chroma_frames {
            frame.chroma = [0.0; 12];
        }
        let result = analyze_track(&analysis, &AnalyzerConfig::default(), |_| {}).unwrap();
        assert!(!result.summary.warnings.is_empty());
        assert_eq!(result.chords.len(), 1);
        assert_eq!(result.chords[0].chord, "N");
    }
}

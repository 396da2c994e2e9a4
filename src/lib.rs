//! # Harmonia DSP
//!
//! A harmonic and structural analysis engine for recorded music: given a
//! pre-extracted feature set for one track, it produces a beat-aligned chord
//! timeline, a global key estimate, and a section map (intro/verse/chorus/
//! bridge/outro).
//!
//! ## Features
//!
//! - **Chord Decoding**: Viterbi sequence decoder over a configurable chord
//!   template table, with bass-note and diatonic evidence weighting
//! - **Key Estimation**: Krumhansl-Kessler template matching over aggregate
//!   chroma statistics
//! - **Structure Segmentation**: Checkerboard-kernel novelty detection on a
//!   combined harmonic/timbral self-similarity matrix, with clustering-based
//!   section labeling
//!
//! ## Quick Start
//!
//! ```no_run
//! use harmonia_dsp::{analyze_track, AnalyzerConfig, LinearAnalysis};
//!
//! // Feature sets come from the external Feature Adapter as JSON.
//! let json = std::fs::read_to_string("track_features.json")?;
//! let features: LinearAnalysis = serde_json::from_str(&json)?;
//!
//! let result = analyze_track(&features, &AnalyzerConfig::default(), |stage| {
//!     println!("stage: {}", stage);
//! })?;
//!
//! println!("Key: {} (confidence: {:.2})", result.key.name(), result.key.confidence);
//! for event in &result.chords {
//!     println!("{:7.2}s  {}", event.start_time, event.chord);
//! }
//! for section in &result.structure.sections {
//!     println!(
//!         "{:7.2}s-{:7.2}s  {} {}",
//!         section.time_range.start_time,
//!         section.time_range.end_time,
//!         section.section_label.as_str(),
//!         section.section_variant
//!     );
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! The analysis pipeline follows this flow:
//!
//! ```text
//! LinearAnalysis (features) → Key Estimator → Chord Decoder → Structure Segmenter → TrackAnalysis
//! ```
//!
//! The core is synchronous and batch: each stage runs to completion over the
//! in-memory feature set. Audio decoding, feature extraction, persistence,
//! and UI all live outside this crate.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod analysis;
pub mod chords;
pub mod config;
pub mod dsp;
pub mod error;
pub mod eval;
pub mod input;
pub mod key;
pub mod structure;

// Re-export main types
pub use analysis::progress::ProgressStage;
pub use analysis::result::{
    ChordEvent, ChordQuality, KeyEstimate, KeyMode, Section, SectionLabel, SemanticSignature,
    StructuralMap, TrackAnalysis,
};
pub use analysis::{analyze_track, ALGORITHM_VERSION};
pub use chords::{detect_chords, DecodeOptions};
pub use config::{AnalyzerConfig, RhythmMethod};
pub use error::AnalysisError;
pub use input::{BeatGrid, ChordCandidate, ChromaFrame, LinearAnalysis, MfccFrame, TrackMetadata};
pub use key::{detect_key_changes, estimate_key, KeyChange, KeyChangeResult};
pub use structure::analyze_structure;

//! Input feature records produced by the external Feature Adapter
//!
//! The core consumes a complete, pre-extracted [`LinearAnalysis`] for one
//! track: chroma frames, optional MFCC frames, a beat grid, and per-beat chord
//! candidates. All types deserialize from the Feature Adapter's JSON feed.
//! The core only reads these records; it never produces or mutates them.

use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

/// A 12-dimensional pitch-class energy vector at one analysis frame
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChromaFrame {
    /// Frame timestamp in seconds
    pub timestamp: f32,

    /// Per-semitone energy, index 0 = C
    pub chroma: [f32; 12],
}

/// A 13-dimensional MFCC timbre vector at one analysis frame
///
/// Shares the timestamp grid with [`ChromaFrame`]. The stream is optional;
/// absence degrades structure detection to harmony-only similarity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MfccFrame {
    /// Frame timestamp in seconds
    pub timestamp: f32,

    /// Mel-frequency cepstral coefficients
    pub mfcc: [f32; 13],
}

/// Per-beat drum hits detected by the Feature Adapter
///
/// Carried through for the external rendering layer; the chord/structure math
/// never reads it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrumBeat {
    /// Beat timestamp in seconds
    pub time: f32,

    /// Kick drum detected on this beat
    #[serde(rename = "hasKick")]
    pub has_kick: bool,

    /// Snare detected on this beat
    #[serde(rename = "hasSnare")]
    pub has_snare: bool,

    /// Kick detection confidence (0.0-1.0)
    #[serde(rename = "kickConfidence", default)]
    pub kick_confidence: f32,

    /// Snare detection confidence (0.0-1.0)
    #[serde(rename = "snareConfidence", default)]
    pub snare_confidence: f32,
}

/// Time signature as numerator/denominator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSignature {
    /// Beats per bar
    pub numerator: u8,
    /// Beat unit
    pub denominator: u8,
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self {
            numerator: 4,
            denominator: 4,
        }
    }
}

/// Beat and downbeat grid for one track
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BeatGrid {
    /// Tempo estimate in BPM
    pub tempo_bpm: f32,

    /// Time signature (default 4/4)
    #[serde(default)]
    pub time_signature: TimeSignature,

    /// All beat times in seconds, ascending
    pub beat_timestamps: Vec<f32>,

    /// Downbeat (bar start) times in seconds, subset of the beats
    #[serde(default)]
    pub downbeat_timestamps: Vec<f32>,

    /// Per-beat drum hits (rendering only)
    #[serde(default)]
    pub drum_grid: Vec<DrumBeat>,
}

/// A ranked chord hypothesis for one beat, from the Feature Adapter
///
/// This is per-observation emission evidence: the decoder consumes the bass
/// pitch class for inversion scoring and may use the candidate as a prior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChordCandidate {
    /// Beat timestamp in seconds
    pub timestamp: f32,

    /// Candidate chord label (Feature Adapter spelling, e.g. "Cmaj7")
    pub chord: String,

    /// Candidate quality name, if the adapter resolved one
    #[serde(default)]
    pub quality: Option<String>,

    /// Detected bass pitch class (0 = C), if the adapter found a clear bass
    #[serde(default)]
    pub bass_pitch_class: Option<u8>,

    /// Candidate confidence (0.0-1.0)
    #[serde(default)]
    pub confidence: f32,
}

/// Track-level metadata from the Feature Adapter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackMetadata {
    /// Track duration in seconds
    pub duration_seconds: f32,

    /// Source sample rate in Hz
    pub sample_rate: u32,

    /// Key detected upstream, if any (e.g. "D")
    #[serde(default)]
    pub detected_key: Option<String>,

    /// Mode detected upstream, if any ("major"/"minor")
    #[serde(default)]
    pub detected_mode: Option<String>,
}

/// Complete pre-extracted feature set for one track
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearAnalysis {
    /// Track-level metadata
    pub metadata: TrackMetadata,

    /// Chroma stream, one frame per hop
    pub chroma_frames: Vec<ChromaFrame>,

    /// Optional MFCC stream on the same timestamp grid
    #[serde(default)]
    pub mfcc_frames: Vec<MfccFrame>,

    /// Beat/downbeat grid
    pub beat_grid: BeatGrid,

    /// Per-beat chord candidates
    #[serde(default)]
    pub events: Vec<ChordCandidate>,
}

impl LinearAnalysis {
    /// Validate the Feature Adapter contract
    ///
    /// Checks structural invariants that indicate an upstream bug rather than
    /// a musical edge case: a positive finite duration, a valid sample rate,
    /// ascending beat and frame timestamps. An *empty* chroma stream is not an
    /// error here; each component documents its own degenerate fallback.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if !self.metadata.duration_seconds.is_finite() || self.metadata.duration_seconds <= 0.0 {
            return Err(AnalysisError::InvalidInput(format!(
                "duration_seconds must be positive, got {}",
                self.metadata.duration_seconds
            )));
        }
        if self.metadata.sample_rate == 0 {
            return Err(AnalysisError::InvalidInput(
                "sample_rate must be non-zero".to_string(),
            ));
        }

        for pair in self.beat_grid.beat_timestamps.windows(2) {
            if pair[1] < pair[0] {
                return Err(AnalysisError::InvalidInput(format!(
                    "beat_timestamps must be ascending ({} before {})",
                    pair[0], pair[1]
                )));
            }
        }
        for pair in self.chroma_frames.windows(2) {
            if pair[1].timestamp < pair[0].timestamp {
                return Err(AnalysisError::InvalidInput(format!(
                    "chroma frame timestamps must be ascending ({} before {})",
                    pair[0].timestamp, pair[1].timestamp
                )));
            }
        }
        for frame in &self.chroma_frames {
            if frame.chroma.iter().any(|v| !v.is_finite()) {
                return Err(AnalysisError::InvalidInput(format!(
                    "non-finite chroma value at t={}",
                    frame.timestamp
                )));
            }
        }

        Ok(())
    }

    /// Frame hop in seconds, estimated from the chroma timestamp grid
    ///
    /// Falls back to 23 ms (the reference extractor's hop) when fewer than two
    /// frames are present.
    pub fn frame_hop(&self) -> f32 {
        if self.chroma_frames.len() >= 2 {
            let span = self.chroma_frames[self.chroma_frames.len() - 1].timestamp
                - self.chroma_frames[0].timestamp;
            let hop = span / (self.chroma_frames.len() - 1) as f32;
            if hop.is_finite() && hop > 0.0 {
                return hop;
            }
        }
        0.023
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_analysis() -> LinearAnalysis {
        LinearAnalysis {
            metadata: TrackMetadata {
                duration_seconds: 10.0,
                sample_rate: 22050,
                detected_key: None,
                detected_mode: None,
            },
            chroma_frames: (0..100)
                .map(|i| ChromaFrame {
                    timestamp: i as f32 * 0.1,
                    chroma: [0.0; 12],
                })
                .collect(),
            mfcc_frames: vec![],
            beat_grid: BeatGrid {
                tempo_bpm: 120.0,
                beat_timestamps: (0..20).map(|i| i as f32 * 0.5).collect(),
                ..Default::default()
            },
            events: vec![],
        }
    }

    #[test]
    fn test_validate_ok() {
        assert!(minimal_analysis().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_duration() {
        let mut analysis = minimal_analysis();
        analysis.metadata.duration_seconds = 0.0;
        assert!(analysis.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_unsorted_beats() {
        let mut analysis = minimal_analysis();
        analysis.beat_grid.beat_timestamps = vec![0.0, 1.0, 0.5];
        assert!(analysis.validate().is_err());
    }

    #[test]
    fn test_frame_hop_estimate() {
        let analysis = minimal_analysis();
        assert!((analysis.frame_hop() - 0.1).abs() < 1e-4);
    }

    #[test]
    fn test_deserialize_adapter_json() {
        let json = r#"{
            "metadata": {"duration_seconds": 4.0, "sample_rate": 22050},
            "chroma_frames": [
                {"timestamp": 0.0, "chroma": [1,0,0,0,0,0,0,0,0,0,0,0]}
            ],
            "beat_grid": {
                "tempo_bpm": 120.0,
                "beat_timestamps": [0.0, 0.5],
                "drum_grid": [
                    {"time": 0.0, "hasKick": true, "hasSnare": false,
                     "kickConfidence": 0.8, "snareConfidence": 0.0}
                ]
            },
            "events": [
                {"timestamp": 0.0, "chord": "C", "bass_pitch_class": 0, "confidence": 0.9}
            ]
        }"#;
        let analysis: LinearAnalysis = serde_json::from_str(json).unwrap();
        assert_eq!(analysis.chroma_frames.len(), 1);
        assert!(analysis.beat_grid.drum_grid[0].has_kick);
        assert_eq!(analysis.events[0].bass_pitch_class, Some(0));
        assert_eq!(analysis.beat_grid.time_signature, TimeSignature::default());
    }

    #[test]
    fn test_missing_chroma_frames_is_contract_violation() {
        let json = r#"{
            "metadata": {"duration_seconds": 4.0, "sample_rate": 22050},
            "beat_grid": {"tempo_bpm": 120.0, "beat_timestamps": []}
        }"#;
        assert!(serde_json::from_str::<LinearAnalysis>(json).is_err());
    }
}

//! Configuration parameters for harmonic and structural analysis
//!
//! `AnalyzerConfig` is a flat record of tunables loaded once per analysis run.
//! The core never mutates it; the external tuning harness owns read-modify-write
//! cycles on the persisted file between runs. Entry points call
//! [`AnalyzerConfig::validated`] to clamp soft ranges and reject nonsensical
//! values before any math runs.

use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

/// Rhythm extraction method requested from the Feature Adapter
///
/// Carried in the shared config so the tuning harness can sweep it; the core
/// itself only reads the resulting beat grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RhythmMethod {
    /// Onset-driven beat tracking
    Onset,
    /// Tempogram-based periodicity estimate
    Tempogram,
    /// Blend of onset and tempogram evidence
    Hybrid,
}

/// Analysis configuration parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    // Feature conditioning (consumed by the external Feature Adapter,
    // swept by the tuning harness alongside the core parameters)
    /// Temporal chroma smoothing window in frames (default: 5)
    pub chroma_smoothing_window: usize,

    /// Rhythm extraction method (default: Onset)
    pub rhythm_method: RhythmMethod,

    /// Onset detection sensitivity, 0.0-1.0 (default: 0.5)
    pub onset_sensitivity: f32,

    /// Spectral whitening amount, 0.0-1.0 (default: 0.3)
    pub spectral_whitening: f32,

    /// Adapt the RMS silence threshold to the track's level distribution (default: true)
    pub rms_threshold_adaptive: bool,

    // Key estimation
    /// Additive bias applied to major-key template scores (default: 0.02)
    ///
    /// Compensates systematic minor/major confusion on chromatic passages.
    pub key_detection_major_bias: f32,

    // Chord decoding
    /// Bass-note match boost, 0.0-1.0+ (default: 0.3)
    ///
    /// Rewards states whose expected bass matches the detected bass pitch
    /// class, enabling inversion/slash-chord evidence.
    pub bass_weight: f32,

    /// Reward for chords diatonic to the estimated key (default: 0.05)
    pub diatonic_bonus: f32,

    /// Penalty for chords outside the estimated key (default: 0.05)
    pub non_diatonic_penalty: f32,

    /// Self-transition probability of the decoder's stickiness prior (default: 0.9)
    pub transition_prob: f32,

    /// Softmax temperature for emission scores (default: 0.25)
    ///
    /// Lower values sharpen the distribution (winner-take-all), higher values
    /// smooth it. The default keeps template-fit differences decisive against
    /// the transition stickiness at beat rate.
    pub temperature: f32,

    /// Minimum chord dwell time in seconds (default: 0.5)
    pub chord_duration_min: f32,

    /// Include dominant-7/major-7/minor-7 qualities in the candidate set (default: true)
    pub include_sevenths: bool,

    /// Decode root pitch-class only, collapsing qualities (default: false)
    ///
    /// Used for fast tuning sweeps and coarse scoring.
    pub root_only: bool,

    /// Observation window in seconds when no beat grid is available (default: 0.5)
    pub chord_window_seconds: f32,

    // Structure segmentation
    /// Novelty peak threshold, reference range 0.05-0.5 (default: 0.15)
    pub novelty_threshold: f32,

    /// Moving-average window over the novelty curve, in seconds (default: 10.0)
    pub structure_smoothing_seconds: f32,

    /// Minimum section duration in seconds (default: 12.0)
    pub min_section_duration: f32,

    /// Cosine similarity threshold for clustering section signatures (default: 0.65)
    pub similarity_threshold: f32,

    /// Upper bound on similarity-matrix side length; longer tracks are
    /// aggregated down to this many frames before the O(N^2) stage (default: 2000)
    pub max_similarity_frames: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            chroma_smoothing_window: 5,
            rhythm_method: RhythmMethod::Onset,
            onset_sensitivity: 0.5,
            spectral_whitening: 0.3,
            rms_threshold_adaptive: true,
            key_detection_major_bias: 0.02,
            bass_weight: 0.3,
            diatonic_bonus: 0.05,
            non_diatonic_penalty: 0.05,
            transition_prob: 0.9,
            temperature: 0.25,
            chord_duration_min: 0.5,
            include_sevenths: true,
            root_only: false,
            chord_window_seconds: 0.5,
            novelty_threshold: 0.15,
            structure_smoothing_seconds: 10.0,
            min_section_duration: 12.0,
            similarity_threshold: 0.65,
            max_similarity_frames: 2000,
        }
    }
}

impl AnalyzerConfig {
    /// Validate the configuration, returning a clamped copy
    ///
    /// Soft ranges are clamped (sensitivities, weights, probabilities);
    /// structurally nonsensical values (non-positive windows or durations,
    /// a zero similarity-frame budget) are rejected with a descriptive
    /// [`AnalysisError::Config`] rather than propagated into numerically
    /// unstable behavior.
    pub fn validated(&self) -> Result<AnalyzerConfig, AnalysisError> {
        if self.chroma_smoothing_window == 0 {
            return Err(AnalysisError::Config(
                "chroma_smoothing_window must be at least 1 frame".to_string(),
            ));
        }
        if !self.chord_duration_min.is_finite() || self.chord_duration_min < 0.0 {
            return Err(AnalysisError::Config(format!(
                "chord_duration_min must be a non-negative number of seconds, got {}",
                self.chord_duration_min
            )));
        }
        if !self.chord_window_seconds.is_finite() || self.chord_window_seconds <= 0.0 {
            return Err(AnalysisError::Config(format!(
                "chord_window_seconds must be positive, got {}",
                self.chord_window_seconds
            )));
        }
        if !self.structure_smoothing_seconds.is_finite() || self.structure_smoothing_seconds <= 0.0 {
            return Err(AnalysisError::Config(format!(
                "structure_smoothing_seconds must be positive, got {}",
                self.structure_smoothing_seconds
            )));
        }
        if !self.min_section_duration.is_finite() || self.min_section_duration <= 0.0 {
            return Err(AnalysisError::Config(format!(
                "min_section_duration must be positive, got {}",
                self.min_section_duration
            )));
        }
        if !self.novelty_threshold.is_finite() || self.novelty_threshold <= 0.0 {
            return Err(AnalysisError::Config(format!(
                "novelty_threshold must be positive, got {}",
                self.novelty_threshold
            )));
        }
        if self.max_similarity_frames < 2 {
            return Err(AnalysisError::Config(format!(
                "max_similarity_frames must be at least 2, got {}",
                self.max_similarity_frames
            )));
        }

        let mut cfg = self.clone();
        cfg.onset_sensitivity = cfg.onset_sensitivity.clamp(0.0, 1.0);
        cfg.spectral_whitening = cfg.spectral_whitening.clamp(0.0, 1.0);
        cfg.bass_weight = cfg.bass_weight.clamp(0.0, 2.0);
        cfg.diatonic_bonus = cfg.diatonic_bonus.clamp(0.0, 1.0);
        cfg.non_diatonic_penalty = cfg.non_diatonic_penalty.clamp(0.0, 1.0);
        // Keep the stickiness prior strictly inside (0, 1) so both the
        // self-transition and switch log-probabilities stay finite.
        cfg.transition_prob = cfg.transition_prob.clamp(0.01, 0.999);
        cfg.temperature = cfg.temperature.clamp(0.05, 10.0);
        cfg.novelty_threshold = cfg.novelty_threshold.min(1.0);
        cfg.similarity_threshold = cfg.similarity_threshold.clamp(0.0, 1.0);
        cfg.key_detection_major_bias = cfg.key_detection_major_bias.clamp(-0.5, 0.5);

        Ok(cfg)
    }
}

//! Global key estimation
//!
//! Aggregates chroma energy across a track into a 12-bin pitch-class profile
//! and correlates it against the 24 Krumhansl-Schmuckler key templates. The
//! best-correlating template gives tonic and mode; the margin over the
//! runner-up gives confidence.

pub mod templates;

pub use templates::KeyTemplates;

use crate::analysis::result::{KeyEstimate, KeyMode, NOTE_NAMES};
use crate::config::AnalyzerConfig;
use crate::dsp::{pearson_correlation, EPSILON};
use crate::input::ChromaFrame;

/// Estimate the global key of a track from its chroma stream
///
/// Aggregates chroma energy over all frames into a normalized pitch-class
/// profile, correlates it against all 24 major/minor templates, and applies
/// `key_detection_major_bias` to the major scores before ranking.
///
/// Confidence is the margin of the best correlation over the runner-up,
/// normalized by the headroom the runner-up leaves: a profile matching one
/// template exactly scores near 1.0, an ambiguous profile near 0.0.
///
/// Near-silent input (aggregate chroma energy below epsilon) is a recoverable
/// degenerate case and returns C major with confidence 0.0 rather than an
/// error.
pub fn estimate_key(chroma_frames: &[ChromaFrame], config: &AnalyzerConfig) -> KeyEstimate {
    let profile = aggregate_profile(chroma_frames);
    estimate_key_from_profile(&profile, config)
}

/// Estimate the key from an already-aggregated pitch-class profile
pub fn estimate_key_from_profile(profile: &[f32; 12], config: &AnalyzerConfig) -> KeyEstimate {
    let energy: f32 = profile.iter().sum();
    if energy < EPSILON {
        log::warn!("Key estimation on near-silent chroma; defaulting to C major");
        return KeyEstimate {
            tonic: 0,
            mode: KeyMode::Major,
            confidence: 0.0,
        };
    }

    let mut normalized = *profile;
    for v in &mut normalized {
        *v /= energy;
    }

    let templates = KeyTemplates::new();
    let mut scores: Vec<(u8, KeyMode, f32)> = Vec::with_capacity(24);
    for tonic in 0..12u8 {
        let major_corr = pearson_correlation(&normalized, templates.major_template(tonic as usize))
            + config.key_detection_major_bias;
        scores.push((tonic, KeyMode::Major, major_corr));

        let minor_corr =
            pearson_correlation(&normalized, templates.minor_template(tonic as usize));
        scores.push((tonic, KeyMode::Minor, minor_corr));
    }

    // Rank by correlation; ties resolve to the lower tonic, major first,
    // keeping the estimate deterministic.
    scores.sort_by(|a, b| b.2.partial_cmp(&a.2).unwrap_or(std::cmp::Ordering::Equal));
    let (tonic, mode, best) = scores[0];
    let second = scores[1].2;

    let headroom = 1.0 - second;
    let confidence = if headroom > EPSILON {
        ((best - second) / headroom).clamp(0.0, 1.0)
    } else {
        0.0
    };

    log::debug!(
        "Key estimate: {}{} (corr {:.3}, runner-up {:.3}, confidence {:.3})",
        NOTE_NAMES[tonic as usize],
        if mode == KeyMode::Minor { "m" } else { "" },
        best,
        second,
        confidence
    );

    KeyEstimate {
        tonic,
        mode,
        confidence,
    }
}

/// A key modulation between two track segments
#[derive(Debug, Clone)]
pub struct KeyChange {
    /// Timestamp of the change in seconds
    pub timestamp: f32,

    /// Key before the change
    pub from_key: KeyEstimate,

    /// Key after the change
    pub to_key: KeyEstimate,

    /// Mean confidence of the two segment estimates (0.0-1.0)
    pub confidence: f32,
}

/// Time-varying key detection result
#[derive(Debug, Clone)]
pub struct KeyChangeResult {
    /// Most common key across all segments
    pub primary_key: KeyEstimate,

    /// Detected modulations, sorted by timestamp
    pub key_changes: Vec<KeyChange>,

    /// Per-segment estimates as (start timestamp, estimate) pairs
    pub segment_keys: Vec<(f32, KeyEstimate)>,
}

/// Change reports below this mean segment confidence are suppressed
const KEY_CHANGE_CONFIDENCE_FLOOR: f32 = 0.2;

/// Detect key modulations across overlapping track segments
///
/// Divides the chroma stream into overlapping windows, estimates the key of
/// each, and reports the most common key plus the points where consecutive
/// windows disagree. Tracks shorter than one window fall back to a single
/// whole-track estimate with no changes.
pub fn detect_key_changes(
    chroma_frames: &[ChromaFrame],
    config: &AnalyzerConfig,
    segment_duration: f32,
    segment_overlap: f32,
) -> KeyChangeResult {
    let hop = segment_duration - segment_overlap;
    let whole_track = |frames: &[ChromaFrame]| {
        let estimate = estimate_key(frames, config);
        KeyChangeResult {
            primary_key: estimate,
            key_changes: Vec::new(),
            segment_keys: vec![(0.0, estimate)],
        }
    };
    if chroma_frames.len() < 2 || segment_duration <= 0.0 || hop <= 0.0 {
        return whole_track(chroma_frames);
    }

    let start_time = chroma_frames[0].timestamp;
    let end_time = chroma_frames[chroma_frames.len() - 1].timestamp;
    if end_time - start_time < segment_duration {
        return whole_track(chroma_frames);
    }

    log::debug!(
        "Detecting key changes: {} frames, {:.1}s segments with {:.1}s overlap",
        chroma_frames.len(),
        segment_duration,
        segment_overlap
    );

    let mut segment_keys = Vec::new();
    let mut segment_start = start_time;
    while segment_start + segment_duration <= end_time {
        let segment_end = segment_start + segment_duration;
        let segment: Vec<ChromaFrame> = chroma_frames
            .iter()
            .filter(|f| f.timestamp >= segment_start && f.timestamp < segment_end)
            .cloned()
            .collect();
        if !segment.is_empty() {
            segment_keys.push((segment_start, estimate_key(&segment, config)));
        }
        segment_start += hop;
    }

    if segment_keys.is_empty() {
        return whole_track(chroma_frames);
    }

    // Most common (tonic, mode) wins; counts accumulate in a fixed 24-slot
    // table so ties resolve deterministically (lower tonic, major first).
    let mut counts = [0usize; 24];
    let mut confidence_sums = [0.0f32; 24];
    for (_, estimate) in &segment_keys {
        let slot = slot_of(estimate);
        counts[slot] += 1;
        confidence_sums[slot] += estimate.confidence;
    }
    let mut best_slot = 0usize;
    for slot in 1..24 {
        if counts[slot] > counts[best_slot] {
            best_slot = slot;
        }
    }
    let primary_key = KeyEstimate {
        tonic: (best_slot % 12) as u8,
        mode: if best_slot < 12 {
            KeyMode::Major
        } else {
            KeyMode::Minor
        },
        confidence: confidence_sums[best_slot] / counts[best_slot] as f32,
    };

    let mut key_changes = Vec::new();
    for pair in segment_keys.windows(2) {
        let (_, prev) = pair[0];
        let (curr_time, curr) = pair[1];
        if prev.tonic != curr.tonic || prev.mode != curr.mode {
            let confidence = (prev.confidence + curr.confidence) / 2.0;
            if confidence > KEY_CHANGE_CONFIDENCE_FLOOR {
                key_changes.push(KeyChange {
                    timestamp: curr_time,
                    from_key: prev,
                    to_key: curr,
                    confidence,
                });
            }
        }
    }

    log::debug!(
        "Detected {} key changes, primary key {}",
        key_changes.len(),
        primary_key.name()
    );

    KeyChangeResult {
        primary_key,
        key_changes,
        segment_keys,
    }
}

fn slot_of(estimate: &KeyEstimate) -> usize {
    let mode_offset = match estimate.mode {
        KeyMode::Major => 0,
        KeyMode::Minor => 12,
    };
    mode_offset + (estimate.tonic as usize % 12)
}

/// Sum chroma energy across frames into one 12-bin profile
pub fn aggregate_profile(chroma_frames: &[ChromaFrame]) -> [f32; 12] {
    let mut profile = [0.0f32; 12];
    for frame in chroma_frames {
        for (acc, v) in profile.iter_mut().zip(frame.chroma.iter()) {
            *acc += v.max(0.0);
        }
    }
    profile
}

/// Parse a Feature Adapter key name ("D") and mode ("minor") into an estimate
///
/// Used when the caller supplies a ground-truth or user-overridden key; the
/// resulting estimate carries full confidence. Returns `None` for unknown
/// spellings.
pub fn parse_key(name: &str, mode: &str) -> Option<KeyEstimate> {
    let tonic = NOTE_NAMES.iter().position(|n| n.eq_ignore_ascii_case(name))? as u8;
    let mode = match mode.to_ascii_lowercase().as_str() {
        "major" | "maj" => KeyMode::Major,
        "minor" | "min" => KeyMode::Minor,
        _ => return None,
    };
    Some(KeyEstimate {
        tonic,
        mode,
        confidence: 1.0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::templates::KeyTemplates;

    fn frames_from_profile(profile: [f32; 12], count: usize) -> Vec<ChromaFrame> {
        (0..count)
            .map(|i| ChromaFrame {
                timestamp: i as f32 * 0.1,
                chroma: profile,
            })
            .collect()
    }

    #[test]
    fn test_c_major_triad_profile() {
        let mut profile = [0.0f32; 12];
        profile[0] = 1.0; // C
        profile[4] = 0.8; // E
        profile[7] = 0.9; // G
        let frames = frames_from_profile(profile, 10);
        let estimate = estimate_key(&frames, &AnalyzerConfig::default());
        assert_eq!(estimate.tonic, 0);
        assert_eq!(estimate.mode, KeyMode::Major);
    }

    #[test]
    fn test_exact_template_scores_high_confidence() {
        let templates = KeyTemplates::new();
        let profile = *templates.minor_template(2); // D minor
        let config = AnalyzerConfig {
            key_detection_major_bias: 0.0,
            ..Default::default()
        };
        let estimate = estimate_key_from_profile(&profile, &config);
        assert_eq!(estimate.tonic, 2);
        assert_eq!(estimate.mode, KeyMode::Minor);
        assert!(estimate.confidence > 0.5);
    }

    #[test]
    fn test_silence_defaults_to_c_major() {
        let frames = frames_from_profile([0.0; 12], 50);
        let estimate = estimate_key(&frames, &AnalyzerConfig::default());
        assert_eq!(estimate.tonic, 0);
        assert_eq!(estimate.mode, KeyMode::Major);
        assert_eq!(estimate.confidence, 0.0);
    }

    #[test]
    fn test_major_bias_shifts_borderline_profiles() {
        // Blend C-major and C-minor templates so the modes nearly tie, then
        // check a strong major bias resolves the tie toward major.
        let templates = KeyTemplates::new();
        let major = templates.major_template(0);
        let minor = templates.minor_template(0);
        let mut blend = [0.0f32; 12];
        for i in 0..12 {
            blend[i] = 0.49 * major[i] + 0.51 * minor[i];
        }
        let biased = AnalyzerConfig {
            key_detection_major_bias: 0.3,
            ..Default::default()
        };
        let estimate = estimate_key_from_profile(&blend, &biased);
        assert_eq!(estimate.mode, KeyMode::Major);
    }

    #[test]
    fn test_parse_key() {
        let estimate = parse_key("D", "minor").unwrap();
        assert_eq!(estimate.tonic, 2);
        assert_eq!(estimate.mode, KeyMode::Minor);
        assert_eq!(parse_key("H", "major"), None);
        assert_eq!(parse_key("C", "dorian"), None);
    }

    #[test]
    fn test_key_changes_on_modulating_track() {
        let templates = KeyTemplates::new();
        // 20 seconds of C major, then 20 seconds of G major, 10 fps.
        let mut frames = Vec::new();
        for i in 0..400 {
            let profile = if i < 200 {
                *templates.major_template(0)
            } else {
                *templates.major_template(7)
            };
            frames.push(ChromaFrame {
                timestamp: i as f32 * 0.1,
                chroma: profile,
            });
        }
        let config = AnalyzerConfig {
            key_detection_major_bias: 0.0,
            ..Default::default()
        };
        let result = detect_key_changes(&frames, &config, 8.0, 2.0);
        assert_eq!(result.key_changes.len(), 1);
        let change = &result.key_changes[0];
        assert_eq!(change.from_key.tonic, 0);
        assert_eq!(change.to_key.tonic, 7);
        assert!((change.timestamp - 20.0).abs() <= 8.0);
    }

    #[test]
    fn test_key_changes_stable_track_reports_none() {
        let templates = KeyTemplates::new();
        let profile = *templates.minor_template(9);
        let frames = frames_from_profile(profile, 300);
        let config = AnalyzerConfig {
            key_detection_major_bias: 0.0,
            ..Default::default()
        };
        let result = detect_key_changes(&frames, &config, 8.0, 2.0);
        assert!(result.key_changes.is_empty());
        assert_eq!(result.primary_key.tonic, 9);
        assert_eq!(result.primary_key.mode, KeyMode::Minor);
    }

    #[test]
    fn test_key_changes_short_track_falls_back() {
        let profile = [0.2f32; 12];
        let frames = frames_from_profile(profile, 10);
        let result = detect_key_changes(&frames, &AnalyzerConfig::default(), 8.0, 2.0);
        assert_eq!(result.segment_keys.len(), 1);
        assert!(result.key_changes.is_empty());
    }

    #[test]
    fn test_determinism() {
        let mut profile = [0.1f32; 12];
        profile[5] = 0.9;
        profile[9] = 0.7;
        let frames = frames_from_profile(profile, 20);
        let config = AnalyzerConfig::default();
        let a = estimate_key(&frames, &config);
        let b = estimate_key(&frames, &config);
        assert_eq!(a, b);
    }
}

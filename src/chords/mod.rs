//! Beat-aligned chord sequence decoding
//!
//! Converts the chroma stream into a temporally coherent chord timeline with
//! a Viterbi decoder over a configurable chord state space. Emission scores
//! balance template fit, bass-note evidence, and diatonic bias against a
//! stickiness transition prior; a post pass enforces the minimum chord dwell
//! time. The decoder always returns a timeline tiling the full track duration
//! and never fails on degenerate (silent) input.

pub mod emission;
pub mod templates;
pub mod viterbi;

pub use emission::EmissionParams;
pub use templates::{ChordTemplates, QualitySpec};

use crate::analysis::result::{ChordEvent, ChordQuality, KeyEstimate, KeyMode};
use crate::config::AnalyzerConfig;
use crate::error::AnalysisError;
use crate::input::{ChromaFrame, LinearAnalysis};
use emission::{emission_log_probs, Observation};

/// Shortest representable observation interval in seconds
const MIN_INTERVAL: f32 = 1e-3;

/// Hard silence floor on observation energy
const ABSOLUTE_SILENCE_FLOOR: f32 = 1e-6;

/// Fraction of the median observation energy used as the adaptive silence floor
const ADAPTIVE_SILENCE_RATIO: f32 = 0.02;

/// Key estimates below this confidence contribute no diatonic bias
const KEY_CONFIDENCE_FLOOR: f32 = 0.05;

/// Decoder options resolved per decode pass
///
/// `root_only` and `include_sevenths` reshape the state space for tuning
/// sweeps; `key` supplies the tonal context for diatonic bias and Roman
/// numeral annotation.
#[derive(Debug, Clone)]
pub struct DecodeOptions {
    /// Decode root pitch class only, collapsing qualities
    pub root_only: bool,

    /// Include seventh-chord qualities in the candidate set
    pub include_sevenths: bool,

    /// Key context for diatonic bias, usually from the key estimator
    pub key: Option<KeyEstimate>,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            root_only: false,
            include_sevenths: true,
            key: None,
        }
    }
}

impl DecodeOptions {
    /// Options matching the config's decoder flags, with no key context
    pub fn from_config(config: &AnalyzerConfig) -> Self {
        Self {
            root_only: config.root_only,
            include_sevenths: config.include_sevenths,
            key: None,
        }
    }
}

/// Decode a beat-aligned chord timeline for one track
///
/// Observations are chroma means over beat intervals (or fixed
/// `chord_window_seconds` windows when the beat grid is empty). The returned
/// events tile `[0, duration]` exactly: each event's end is the next event's
/// start. Degenerate input (all-silent chroma, or no chroma frames at all)
/// yields a single full-length "N" event rather than an error.
///
/// # Errors
///
/// Returns [`AnalysisError::InvalidInput`] for Feature Adapter contract
/// violations and [`AnalysisError::Config`] for invalid configuration.
pub fn detect_chords(
    analysis: &LinearAnalysis,
    options: &DecodeOptions,
    config: &AnalyzerConfig,
) -> Result<Vec<ChordEvent>, AnalysisError> {
    let config = config.validated()?;
    analysis.validate()?;

    let duration = analysis.metadata.duration_seconds;

    if analysis.chroma_frames.is_empty() {
        log::warn!("Chord decoding without chroma frames; emitting a single no-chord event");
        return Ok(vec![no_chord_event(0.0, duration)]);
    }

    let frames = smooth_chroma(&analysis.chroma_frames, config.chroma_smoothing_window);
    let intervals = observation_intervals(analysis, config.chord_window_seconds);
    let mut observations = aggregate_observations(&frames, &analysis.events, &intervals);
    mark_silence(&mut observations, config.rms_threshold_adaptive);

    let templates = if options.root_only {
        ChordTemplates::root_only()
    } else {
        ChordTemplates::new(options.include_sevenths)
    };
    let states = templates.states();

    let key = options
        .key
        .filter(|k| k.confidence >= KEY_CONFIDENCE_FLOOR);
    let params = EmissionParams::resolve(&config, key.as_ref());

    log::debug!(
        "Decoding {} observations over {} states (key context: {})",
        observations.len(),
        states.len(),
        key.map(|k| k.name()).unwrap_or_else(|| "none".to_string())
    );

    let emissions: Vec<Vec<f32>> = observations
        .iter()
        .map(|obs| emission_log_probs(obs, states, &params))
        .collect();

    // Stickiness prior: one score for staying, one for any change, independent
    // of the target chord's identity. Not normalized over targets; the decoder
    // compares path scores, not probabilities.
    let self_log = config.transition_prob.ln();
    let switch_log = (1.0 - config.transition_prob).ln();
    let path = viterbi::viterbi_path(&emissions, self_log, switch_log);

    let mut segments = collapse_path(&intervals, &path, &emissions);
    enforce_min_duration(&mut segments, config.chord_duration_min);

    let events = segments
        .into_iter()
        .map(|seg| {
            let state = &states[seg.state];
            let function = match (key.as_ref(), state.root, state.quality) {
                (Some(k), Some(root), Some(quality)) => Some(roman_numeral(root, quality, k)),
                _ => None,
            };
            ChordEvent {
                start_time: seg.start,
                end_time: seg.end,
                chord: state.label.clone(),
                root: state.root,
                quality: state.quality,
                confidence: seg.confidence.clamp(0.0, 1.0),
                function,
            }
        })
        .collect();

    Ok(events)
}

/// One contiguous run of a single decoded state
#[derive(Debug, Clone)]
struct Segment {
    start: f32,
    end: f32,
    state: usize,
    confidence: f32,
}

impl Segment {
    fn duration(&self) -> f32 {
        self.end - self.start
    }
}

fn no_chord_event(start: f32, end: f32) -> ChordEvent {
    ChordEvent {
        start_time: start,
        end_time: end,
        chord: "N".to_string(),
        root: None,
        quality: None,
        confidence: 1.0,
        function: None,
    }
}

/// Observation interval boundaries from the beat grid, or fixed windows
fn observation_intervals(analysis: &LinearAnalysis, window_seconds: f32) -> Vec<(f32, f32)> {
    let duration = analysis.metadata.duration_seconds;
    let mut bounds = vec![0.0f32];

    let mut last = 0.0f32;
    for &beat in &analysis.beat_grid.beat_timestamps {
        if beat > last + MIN_INTERVAL && beat < duration - MIN_INTERVAL {
            bounds.push(beat);
            last = beat;
        }
    }

    if bounds.len() == 1 {
        // No usable beat grid; fall back to fixed windows.
        let mut t = window_seconds;
        while t < duration - MIN_INTERVAL {
            bounds.push(t);
            t += window_seconds;
        }
    }

    bounds.push(duration);
    bounds.windows(2).map(|w| (w[0], w[1])).collect()
}

/// Temporal chroma smoothing over a centered frame window
///
/// Stabilizes per-beat observations against transients before aggregation.
/// A window of 0 or 1 returns the input unchanged.
fn smooth_chroma(frames: &[ChromaFrame], window: usize) -> Vec<ChromaFrame> {
    if frames.len() < 3 || window <= 1 {
        return frames.to_vec();
    }
    let half = window / 2;
    let mut out = Vec::with_capacity(frames.len());
    for i in 0..frames.len() {
        let start = i.saturating_sub(half);
        let end = (i + half + 1).min(frames.len());
        let mut chroma = [0.0f32; 12];
        for frame in &frames[start..end] {
            for (acc, v) in chroma.iter_mut().zip(frame.chroma.iter()) {
                *acc += v;
            }
        }
        for v in &mut chroma {
            *v /= (end - start) as f32;
        }
        out.push(ChromaFrame {
            timestamp: frames[i].timestamp,
            chroma,
        });
    }
    out
}

/// Mean chroma, energy, and bass evidence per interval
fn aggregate_observations(
    frames: &[ChromaFrame],
    candidates: &[crate::input::ChordCandidate],
    intervals: &[(f32, f32)],
) -> Vec<Observation> {
    let mut cursor = 0usize;
    let mut observations = Vec::with_capacity(intervals.len());

    for &(start, end) in intervals {
        while cursor < frames.len() && frames[cursor].timestamp < start {
            cursor += 1;
        }
        let mut sum = [0.0f32; 12];
        let mut count = 0usize;
        let mut idx = cursor;
        while idx < frames.len() && frames[idx].timestamp < end {
            for (acc, v) in sum.iter_mut().zip(frames[idx].chroma.iter()) {
                *acc += v.max(0.0);
            }
            count += 1;
            idx += 1;
        }
        let mut chroma = [0.0f32; 12];
        if count > 0 {
            for (out, v) in chroma.iter_mut().zip(sum.iter()) {
                *out = v / count as f32;
            }
        }
        let energy = chroma.iter().map(|v| v * v).sum::<f32>().sqrt();

        let bass_pitch_class = candidates
            .iter()
            .find(|c| c.timestamp >= start && c.timestamp < end)
            .and_then(|c| c.bass_pitch_class)
            .map(|pc| pc % 12);

        observations.push(Observation {
            chroma,
            energy,
            bass_pitch_class,
            silent: false,
        });
    }
    observations
}

/// Flag observations below the silence floor
///
/// The floor is absolute by default; with `rms_threshold_adaptive` it scales
/// with the median non-zero observation energy, so uniformly quiet tracks
/// are not decoded as wall-to-wall silence.
fn mark_silence(observations: &mut [Observation], adaptive: bool) {
    let mut floor = ABSOLUTE_SILENCE_FLOOR;
    if adaptive {
        let mut energies: Vec<f32> = observations
            .iter()
            .map(|o| o.energy)
            .filter(|&e| e > ABSOLUTE_SILENCE_FLOOR)
            .collect();
        if !energies.is_empty() {
            energies.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
            let median = energies[energies.len() / 2];
            floor = floor.max(median * ADAPTIVE_SILENCE_RATIO);
        }
    }
    for obs in observations.iter_mut() {
        obs.silent = obs.energy < floor;
    }
}

/// Collapse the Viterbi path into runs of identical states
///
/// Segment confidence is the duration-weighted mean posterior of the chosen
/// state over the run.
fn collapse_path(
    intervals: &[(f32, f32)],
    path: &[usize],
    emissions: &[Vec<f32>],
) -> Vec<Segment> {
    let mut segments: Vec<Segment> = Vec::new();
    for (i, &state) in path.iter().enumerate() {
        let (start, end) = intervals[i];
        let weight = (end - start).max(MIN_INTERVAL);
        let posterior = emissions[i][state].exp();
        match segments.last_mut() {
            Some(last) if last.state == state => {
                let total = last.duration() + weight;
                last.confidence = (last.confidence * last.duration() + posterior * weight) / total;
                last.end = end;
            }
            _ => segments.push(Segment {
                start,
                end,
                state,
                confidence: posterior,
            }),
        }
    }
    segments
}

/// Merge segments shorter than the minimum dwell time into a neighbor
///
/// The short segment is absorbed by whichever neighbor has the higher
/// confidence (the earlier neighbor on ties), then equal-state neighbors are
/// re-merged. Deterministic by construction.
fn enforce_min_duration(segments: &mut Vec<Segment>, min_duration: f32) {
    if min_duration <= 0.0 {
        return;
    }
    while segments.len() > 1 {
        let short = segments
            .iter()
            .position(|s| s.duration() < min_duration - MIN_INTERVAL);
        let idx = match short {
            Some(idx) => idx,
            None => break,
        };

        let absorb_left = if idx == 0 {
            false
        } else if idx == segments.len() - 1 {
            true
        } else {
            segments[idx - 1].confidence >= segments[idx + 1].confidence
        };

        if absorb_left {
            let removed = segments.remove(idx);
            let target = &mut segments[idx - 1];
            let total = target.duration() + removed.duration();
            target.confidence =
                (target.confidence * target.duration() + removed.confidence * removed.duration())
                    / total;
            target.end = removed.end;
        } else {
            let removed = segments.remove(idx);
            let target = &mut segments[idx];
            let total = target.duration() + removed.duration();
            target.confidence =
                (target.confidence * target.duration() + removed.confidence * removed.duration())
                    / total;
            target.start = removed.start;
        }

        merge_equal_neighbors(segments);
    }
}

fn merge_equal_neighbors(segments: &mut Vec<Segment>) {
    let mut i = 0;
    while i + 1 < segments.len() {
        if segments[i].state == segments[i + 1].state {
            let next = segments.remove(i + 1);
            let target = &mut segments[i];
            let total = target.duration() + next.duration();
            target.confidence =
                (target.confidence * target.duration() + next.confidence * next.duration()) / total;
            target.end = next.end;
        } else {
            i += 1;
        }
    }
}

/// Roman-numeral function of a chord relative to a key
///
/// Chromatic roots are spelled with a flat prefix; minor and diminished
/// qualities lowercase the numeral.
pub fn roman_numeral(root: u8, quality: ChordQuality, key: &KeyEstimate) -> String {
    const DEGREES: [&str; 12] = [
        "I", "bII", "II", "bIII", "III", "IV", "bV", "V", "bVI", "VI", "bVII", "VII",
    ];
    let degree = ((root + 12 - key.tonic) % 12) as usize;
    // In minor keys the numeral is spelled against the natural-minor scale,
    // so the flat third/sixth/seventh are the plain degrees.
    let adjusted = match key.mode {
        KeyMode::Major => DEGREES[degree].to_string(),
        KeyMode::Minor => match degree {
            3 => "III".to_string(),
            8 => "VI".to_string(),
            10 => "VII".to_string(),
            4 => "bIV".to_string(),
            9 => "bVII".to_string(),
            11 => "#VII".to_string(),
            _ => DEGREES[degree].to_string(),
        },
    };

    let lowercase = matches!(
        quality,
        ChordQuality::Minor | ChordQuality::Minor7 | ChordQuality::Diminished
    );
    let numeral = if lowercase {
        adjusted.to_lowercase()
    } else {
        adjusted
    };

    let suffix = match quality {
        ChordQuality::Dominant7 | ChordQuality::Minor7 => "7",
        ChordQuality::Major7 => "maj7",
        ChordQuality::Sus4 => "sus4",
        ChordQuality::Diminished => "\u{b0}",
        ChordQuality::Augmented => "+",
        _ => "",
    };
    format!("{}{}", numeral, suffix)
}

//! Emission scoring for the chord decoder
//!
//! Converts one observation (aggregated chroma over a beat interval) into
//! per-state log-probabilities. All evidence weighting is threaded through an
//! explicit [`EmissionParams`] struct resolved once at decode entry, so the
//! scoring itself stays a pure function.

use crate::analysis::result::KeyEstimate;
use crate::chords::templates::ChordState;
use crate::config::AnalyzerConfig;
use crate::dsp::cosine_similarity;

/// Baseline template-match score for the no-chord state on pitched frames
const NO_CHORD_SCORE: f32 = 0.2;

/// Pre-temperature logit given to the no-chord state on silent frames
const SILENT_N_SCORE: f32 = 5.0;

/// Pre-temperature logit given to pitched states on silent frames
const SILENT_OTHER_SCORE: f32 = -5.0;

/// Score bonus when the detected bass matches the chord root
const BASS_ROOT_BONUS: f32 = 0.15;

/// Score bonus when the detected bass is another strong chord tone (inversion)
const BASS_CHORD_TONE_BONUS: f32 = 0.08;

/// Template weight above which a pitch class counts as a strong chord tone
const CHORD_TONE_FLOOR: f32 = 0.7;

/// One decoder observation: chroma aggregated over a beat interval
#[derive(Debug, Clone)]
pub struct Observation {
    /// Mean chroma over the interval
    pub chroma: [f32; 12],

    /// L2 norm of the mean chroma (energy proxy)
    pub energy: f32,

    /// Bass pitch class reported by the Feature Adapter for this interval
    pub bass_pitch_class: Option<u8>,

    /// Marked by the decoder when energy falls below the silence floor
    pub silent: bool,
}

/// Resolved evidence-weighting parameters for one decode pass
#[derive(Debug, Clone)]
pub struct EmissionParams {
    /// Bass-note match boost
    pub bass_weight: f32,

    /// Reward for roots diatonic to the key context
    pub diatonic_bonus: f32,

    /// Penalty for roots outside the key context
    pub non_diatonic_penalty: f32,

    /// Diatonic pitch-class mask from the key context, if any
    pub key_mask: Option<[bool; 12]>,

    /// Softmax temperature
    pub temperature: f32,
}

impl EmissionParams {
    /// Resolve parameters from the validated config and an optional key context
    pub fn resolve(config: &AnalyzerConfig, key: Option<&KeyEstimate>) -> Self {
        Self {
            bass_weight: config.bass_weight,
            diatonic_bonus: config.diatonic_bonus,
            non_diatonic_penalty: config.non_diatonic_penalty,
            key_mask: key.map(|k| k.diatonic_mask()),
            temperature: config.temperature,
        }
    }
}

/// Raw evidence score for one state
fn raw_score(obs: &Observation, state: &ChordState, params: &EmissionParams) -> f32 {
    let root = match state.root {
        Some(root) => root,
        // No-chord competes with a fixed floor; it wins only when no template
        // fits the observation well.
        None => return NO_CHORD_SCORE,
    };

    let mut score = cosine_similarity(&obs.chroma, &state.template);

    if let Some(bass) = obs.bass_pitch_class {
        if bass == root {
            score += BASS_ROOT_BONUS * params.bass_weight;
        } else if state.template[bass as usize % 12] >= CHORD_TONE_FLOOR {
            score += BASS_CHORD_TONE_BONUS * params.bass_weight;
        }
    }

    if let Some(mask) = &params.key_mask {
        if mask[root as usize] {
            score += params.diatonic_bonus;
        } else {
            score -= params.non_diatonic_penalty;
        }
    }

    score
}

/// Per-state log-probabilities for one observation
///
/// Scores are divided by the temperature and log-softmax normalized, so the
/// result is directly usable as Viterbi emission terms and, exponentiated,
/// as a posterior for confidence reporting. Silent observations emit the
/// no-chord state with near-certainty.
pub fn emission_log_probs(
    obs: &Observation,
    states: &[ChordState],
    params: &EmissionParams,
) -> Vec<f32> {
    let mut logits: Vec<f32> = if obs.silent {
        states
            .iter()
            .map(|s| {
                if s.root.is_none() {
                    SILENT_N_SCORE
                } else {
                    SILENT_OTHER_SCORE
                }
            })
            .collect()
    } else {
        states.iter().map(|s| raw_score(obs, s, params)).collect()
    };

    let inv_t = 1.0 / params.temperature;
    for v in &mut logits {
        *v *= inv_t;
    }

    // Log-softmax via the usual max-shifted logsumexp.
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let lse = max + logits.iter().map(|&v| (v - max).exp()).sum::<f32>().ln();
    for v in &mut logits {
        *v -= lse;
    }
    logits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chords::templates::ChordTemplates;

    fn params() -> EmissionParams {
        EmissionParams {
            bass_weight: 0.3,
            diatonic_bonus: 0.05,
            non_diatonic_penalty: 0.05,
            key_mask: None,
            temperature: 1.0,
        }
    }

    fn c_major_obs() -> Observation {
        let mut chroma = [0.0f32; 12];
        chroma[0] = 1.0;
        chroma[4] = 0.9;
        chroma[7] = 0.85;
        Observation {
            chroma,
            energy: 1.6,
            bass_pitch_class: None,
            silent: false,
        }
    }

    fn argmax(v: &[f32]) -> usize {
        v.iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .map(|(i, _)| i)
            .unwrap()
    }

    #[test]
    fn test_c_major_wins() {
        let templates = ChordTemplates::new(true);
        let log_probs = emission_log_probs(&c_major_obs(), templates.states(), &params());
        let best = argmax(&log_probs);
        assert_eq!(templates.states()[best].label, "C");
    }

    #[test]
    fn test_log_probs_normalize() {
        let templates = ChordTemplates::new(true);
        let log_probs = emission_log_probs(&c_major_obs(), templates.states(), &params());
        let total: f32 = log_probs.iter().map(|v| v.exp()).sum();
        assert!((total - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_silent_obs_emits_no_chord() {
        let templates = ChordTemplates::new(true);
        let obs = Observation {
            chroma: [0.0; 12],
            energy: 0.0,
            bass_pitch_class: None,
            silent: true,
        };
        let log_probs = emission_log_probs(&obs, templates.states(), &params());
        let best = argmax(&log_probs);
        assert_eq!(best, templates.no_chord_index());
        assert!(log_probs[best].exp() > 0.9);
    }

    #[test]
    fn test_bass_match_boosts_root() {
        let templates = ChordTemplates::new(true);
        // Ambiguous chroma: C and A minor share C/E, G vs A differ.
        let mut chroma = [0.0f32; 12];
        chroma[0] = 0.9;
        chroma[4] = 0.9;
        chroma[7] = 0.6;
        chroma[9] = 0.6;
        let mut obs = Observation {
            chroma,
            energy: 1.5,
            bass_pitch_class: Some(9), // A in the bass
            silent: false,
        };
        let mut p = params();
        p.bass_weight = 1.0;
        let with_bass = emission_log_probs(&obs, templates.states(), &p);
        obs.bass_pitch_class = None;
        let without_bass = emission_log_probs(&obs, templates.states(), &p);

        let am = templates
            .states()
            .iter()
            .position(|s| s.label == "Am")
            .unwrap();
        assert!(with_bass[am] > without_bass[am]);
    }

    #[test]
    fn test_diatonic_bias_penalizes_chromatic_roots() {
        let templates = ChordTemplates::new(true);
        let obs = c_major_obs();
        let mut p = params();
        // C major key context: C# is chromatic.
        let mut mask = [false; 12];
        for d in [0usize, 2, 4, 5, 7, 9, 11] {
            mask[d] = true;
        }
        p.key_mask = Some(mask);
        let biased = emission_log_probs(&obs, templates.states(), &p);
        p.key_mask = None;
        let unbiased = emission_log_probs(&obs, templates.states(), &p);

        let c_sharp = templates
            .states()
            .iter()
            .position(|s| s.label == "C#")
            .unwrap();
        assert!(biased[c_sharp] < unbiased[c_sharp]);
    }

    #[test]
    fn test_lower_temperature_sharpens() {
        let templates = ChordTemplates::new(true);
        let obs = c_major_obs();
        let mut p = params();
        let normal = emission_log_probs(&obs, templates.states(), &p);
        p.temperature = 0.2;
        let sharp = emission_log_probs(&obs, templates.states(), &p);
        let best = argmax(&normal);
        assert!(sharp[best].exp() > normal[best].exp());
    }
}

//! Boundary detection from the smoothed novelty curve
//!
//! Peak-picks the conditioned novelty curve and enforces the minimum section
//! duration with one deterministic rule: when two boundaries are too close,
//! the later one is dropped. Only the final trailing section may come out
//! shorter than the minimum.

/// Detect section boundaries above a novelty threshold
///
/// Peaks are plateau-aware local maxima: a run of equal values counts as one
/// peak when the curve rises into it and falls after it, and the run's center
/// becomes the boundary. Smoothing a symmetric peak produces exactly this
/// kind of flat top, so a strict three-point test would miss it.
///
/// # Arguments
///
/// * `novelty` - Smoothed, spike-filtered novelty curve normalized to [0, 1]
/// * `hop` - Seconds per novelty frame
/// * `threshold` - Minimum peak height
/// * `min_section` - Minimum section duration in seconds
/// * `duration` - Track duration in seconds
///
/// # Returns
///
/// Ascending interior boundary timestamps, excluding 0 and the track end.
/// Empty when no peak clears the threshold.
pub fn pick_boundaries(
    novelty: &[f32],
    hop: f32,
    threshold: f32,
    min_section: f32,
    duration: f32,
) -> Vec<f32> {
    let n = novelty.len();
    let mut candidates = Vec::new();

    let mut i = 1usize;
    while n >= 3 && i < n - 1 {
        let value = novelty[i];
        if value < threshold || value <= novelty[i - 1] {
            i += 1;
            continue;
        }
        // Rising edge found; scan the plateau of equal values.
        let mut j = i;
        while j + 1 < n && novelty[j + 1] == value {
            j += 1;
        }
        let falls = j + 1 < n && novelty[j + 1] < value;
        if falls {
            let center = (i + j) / 2;
            let time = center as f32 * hop;
            if time > 0.0 && time < duration {
                candidates.push(time);
            }
        }
        i = j + 1;
    }

    log::debug!(
        "Peak picking: {} candidates above threshold {:.3}",
        candidates.len(),
        threshold
    );

    // Enforce the minimum section duration. Walking in ascending order and
    // dropping the later boundary of any too-close pair is the deterministic
    // merge rule; the section after the last kept boundary may remain short.
    let mut kept: Vec<f32> = Vec::with_capacity(candidates.len());
    let mut previous = 0.0f32;
    for time in candidates {
        if time - previous >= min_section {
            kept.push(time);
            previous = time;
        }
    }
    kept
}

//! Viterbi sequence decoding
//!
//! Classical max-sum dynamic programming over the chord state space. The
//! transition model is a stickiness prior: one log-probability for staying in
//! the same state, one (smaller) for switching to any other state, independent
//! of the target's identity. Ties break toward the lowest state index, which
//! keeps repeated decodes byte-identical.

/// Decode the best state path through a sequence of emission scores
///
/// # Arguments
///
/// * `emissions` - Per-step emission log-probabilities, `emissions[t][s]`
/// * `self_log` - Log-probability of a self-transition
/// * `switch_log` - Log-probability of switching to any one other state
///
/// # Returns
///
/// The highest-scoring state index per step. The first step has no
/// predecessor and uses its emission score alone. Returns an empty path for
/// empty input.
pub fn viterbi_path(emissions: &[Vec<f32>], self_log: f32, switch_log: f32) -> Vec<usize> {
    let steps = emissions.len();
    if steps == 0 {
        return Vec::new();
    }
    let n_states = emissions[0].len();
    if n_states == 0 {
        return Vec::new();
    }
    if n_states == 1 {
        return vec![0; steps];
    }

    let mut delta = emissions[0].clone();
    let mut backpointers: Vec<Vec<u32>> = Vec::with_capacity(steps.saturating_sub(1));

    let mut next = vec![0.0f32; n_states];
    for emission in emissions.iter().skip(1) {
        // The switch score is identical for every predecessor, so the best
        // switching predecessor is just the global best of `delta` (with the
        // runner-up covering the case where the global best is the state
        // itself). Strict comparisons keep the lowest index on ties.
        let (best_idx, second_idx) = best_two(&delta);

        let mut psi = vec![0u32; n_states];
        for s in 0..n_states {
            let stay = delta[s] + self_log;
            let jump_idx = if best_idx == s { second_idx } else { best_idx };
            let jump = delta[jump_idx] + switch_log;

            // Lowest-index tie-break between staying and jumping.
            let (score, prev) = if jump > stay || (jump == stay && jump_idx < s) {
                (jump, jump_idx)
            } else {
                (stay, s)
            };
            next[s] = emission[s] + score;
            psi[s] = prev as u32;
        }
        delta.copy_from_slice(&next);
        backpointers.push(psi);
    }

    // Backtrack from the best final state.
    let mut state = argmax_lowest(&delta);
    let mut path = vec![0usize; steps];
    path[steps - 1] = state;
    for t in (0..steps - 1).rev() {
        state = backpointers[t][state] as usize;
        path[t] = state;
    }
    path
}

/// Indices of the largest and second-largest values, lowest index on ties
fn best_two(values: &[f32]) -> (usize, usize) {
    let mut best = 0usize;
    for (i, &v) in values.iter().enumerate().skip(1) {
        if v > values[best] {
            best = i;
        }
    }
    let mut second = if best == 0 { 1 } else { 0 };
    for (i, &v) in values.iter().enumerate() {
        if i != best && v > values[second] {
            second = i;
        }
    }
    (best, second)
}

/// Index of the maximum value, lowest index on ties
fn argmax_lowest(values: &[f32]) -> usize {
    let mut best = 0usize;
    for (i, &v) in values.iter().enumerate().skip(1) {
        if v > values[best] {
            best = i;
        }
    }
    best
}

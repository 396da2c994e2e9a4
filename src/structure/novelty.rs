//! Checkerboard-kernel novelty detection
//!
//! Correlates a checkerboard kernel against the self-similarity matrix along
//! its diagonal. The kernel is positive on the two same-block quadrants and
//! negative on the two cross-block quadrants, so the response peaks exactly
//! where the music is self-similar on each side of a point but dissimilar
//! across it.
//!
//! # Reference
//!
//! Foote, J. (2000). Automatic Audio Segmentation Using a Measure of Audio
//! Novelty. *Proceedings of IEEE ICME*, 452-455.

use super::similarity::SimilarityMatrix;
use crate::dsp::normalize_in_place;

/// Build a Gaussian-tapered checkerboard kernel
///
/// Returns a `(2w+1) x (2w+1)` kernel flattened row-major, centered on the
/// boundary under test. The center row and column are zero; quadrant sign is
/// `sign(u) * sign(v)`.
pub fn checkerboard_kernel(half_width: usize) -> Vec<f32> {
    let w = half_width as i32;
    let size = (2 * w + 1) as usize;
    let sigma = (half_width as f32 / 2.0).max(1.0);
    let mut kernel = vec![0.0f32; size * size];

    for u in -w..=w {
        for v in -w..=w {
            if u == 0 || v == 0 {
                continue;
            }
            let taper = (-((u * u + v * v) as f32) / (2.0 * sigma * sigma)).exp();
            let sign = if (u > 0) == (v > 0) { 1.0 } else { -1.0 };
            let row = (u + w) as usize;
            let col = (v + w) as usize;
            kernel[row * size + col] = sign * taper;
        }
    }
    kernel
}

/// Correlate the checkerboard kernel along the matrix diagonal
///
/// Produces one novelty value per frame, half-wave rectified and normalized
/// to [0, 1]. Positions near the matrix edges correlate over the available
/// part of the kernel.
pub fn novelty_curve(matrix: &SimilarityMatrix, half_width: usize) -> Vec<f32> {
    let n = matrix.n();
    if n == 0 {
        return Vec::new();
    }

    let w = half_width as i32;
    let size = (2 * w + 1) as usize;
    let kernel = checkerboard_kernel(half_width);

    log::debug!(
        "Computing novelty curve over {} frames (kernel half-width {})",
        n,
        half_width
    );

    let mut curve = Vec::with_capacity(n);
    for center in 0..n as i32 {
        let mut acc = 0.0f32;
        for u in -w..=w {
            let i = center + u;
            if i < 0 || i >= n as i32 {
                continue;
            }
            for v in -w..=w {
                let j = center + v;
                if j < 0 || j >= n as i32 {
                    continue;
                }
                let k = kernel[((u + w) as usize) * size + (v + w) as usize];
                if k != 0.0 {
                    acc += k * matrix.get(i as usize, j as usize);
                }
            }
        }
        curve.push(acc.max(0.0));
    }

    normalize_in_place(&mut curve);
    curve
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structure::similarity::{build_similarity, FrameSequence};

    fn block_sequence(block_len: usize, blocks: usize) -> FrameSequence {
        // Alternating A/B blocks with orthogonal chroma.
        let mut chroma = Vec::new();
        for b in 0..blocks {
            let mut vector = [0.05f32; 12];
            if b % 2 == 0 {
                vector[0] = 1.0;
                vector[4] = 0.8;
            } else {
                vector[6] = 1.0;
                vector[10] = 0.8;
            }
            for _ in 0..block_len {
                chroma.push(vector);
            }
        }
        let energy = chroma
            .iter()
            .map(|c| c.iter().map(|v| v * v).sum::<f32>().sqrt())
            .collect();
        let n = chroma.len();
        FrameSequence {
            chroma,
            mfcc: None,
            energy,
            hop: 1.0,
            duration: n as f32,
        }
    }

    #[test]
    fn test_kernel_is_antisymmetric_across_quadrants() {
        let w = 4;
        let size = 2 * w + 1;
        let kernel = checkerboard_kernel(w);
        // Same-block quadrant positive, cross-block negative.
        assert!(kernel[(w - 1) * size + (w - 1)] > 0.0);
        assert!(kernel[(w + 1) * size + (w + 1)] > 0.0);
        assert!(kernel[(w - 1) * size + (w + 1)] < 0.0);
        // Center row and column are zero.
        assert_eq!(kernel[w * size + w], 0.0);
        assert_eq!(kernel[w * size], 0.0);
    }

    #[test]
    fn test_novelty_peaks_at_block_boundary() {
        let seq = block_sequence(20, 2);
        let matrix = build_similarity(&seq);
        let curve = novelty_curve(&matrix, 8);
        assert_eq!(curve.len(), 40);

        let peak = curve
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .map(|(i, _)| i)
            .unwrap();
        assert!((peak as i32 - 20).abs() <= 2, "peak at {}", peak);
    }

    #[test]
    fn test_homogeneous_music_has_flat_novelty() {
        let seq = block_sequence(40, 1);
        let matrix = build_similarity(&seq);
        let curve = novelty_curve(&matrix, 8);
        assert_eq!(curve.len(), 40);
        // Everything is self-similar: the positive and negative quadrants
        // cancel in the interior, so only edge effects carry energy.
        let interior_max = curve[12..28].iter().copied().fold(0.0f32, f32::max);
        assert!(interior_max < 0.1, "interior novelty {}", interior_max);
    }

    #[test]
    fn test_empty_matrix() {
        let matrix = SimilarityMatrix::new(0);
        assert!(novelty_curve(&matrix, 8).is_empty());
    }
}

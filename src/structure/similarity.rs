//! Downsampled feature sequence and self-similarity matrix
//!
//! The O(N^2) similarity stage never sees the raw frame rate: frames are
//! mean-aggregated down to a bounded count first, which caps matrix memory
//! for arbitrarily long tracks. Cell (i, j) combines harmonic and timbral
//! cosine similarity with fixed harmony-over-timbre weights.

use crate::dsp::cosine_similarity;
use crate::input::LinearAnalysis;

/// Weight of chroma similarity in the combined matrix
pub const CHROMA_WEIGHT: f32 = 0.6;

/// Weight of MFCC similarity in the combined matrix
pub const MFCC_WEIGHT: f32 = 0.4;

/// Beat-rate feature sequence after downsampling
#[derive(Debug, Clone)]
pub struct FrameSequence {
    /// Mean chroma per downsampled frame
    pub chroma: Vec<[f32; 12]>,

    /// Mean MFCC per downsampled frame; `None` when the adapter supplied none
    pub mfcc: Option<Vec<[f32; 13]>>,

    /// Chroma L2 norm per downsampled frame (energy proxy)
    pub energy: Vec<f32>,

    /// Seconds per downsampled frame
    pub hop: f32,

    /// Track duration in seconds
    pub duration: f32,
}

impl FrameSequence {
    /// Aggregate a track's feature streams down to at most `max_frames`
    ///
    /// Consecutive raw frames are mean-pooled in groups so the sequence
    /// length never exceeds the cap. Returns `None` when the chroma stream is
    /// empty; that is the documented degenerate path where the caller falls
    /// back to a placeholder structure.
    pub fn build(analysis: &LinearAnalysis, max_frames: usize) -> Option<Self> {
        let raw = &analysis.chroma_frames;
        if raw.is_empty() {
            return None;
        }

        let factor = raw.len().div_ceil(max_frames).max(1);
        let raw_hop = analysis.frame_hop();

        let n = raw.len().div_ceil(factor);
        let mut chroma = Vec::with_capacity(n);
        let mut energy = Vec::with_capacity(n);
        for group in raw.chunks(factor) {
            let mut mean = [0.0f32; 12];
            for frame in group {
                for (acc, v) in mean.iter_mut().zip(frame.chroma.iter()) {
                    *acc += v.max(0.0);
                }
            }
            for v in &mut mean {
                *v /= group.len() as f32;
            }
            energy.push(mean.iter().map(|v| v * v).sum::<f32>().sqrt());
            chroma.push(mean);
        }

        let mfcc = if analysis.mfcc_frames.is_empty() {
            None
        } else {
            let mut pooled = Vec::with_capacity(n);
            for group in analysis.mfcc_frames.chunks(factor) {
                let mut mean = [0.0f32; 13];
                for frame in group {
                    for (acc, v) in mean.iter_mut().zip(frame.mfcc.iter()) {
                        *acc += v;
                    }
                }
                for v in &mut mean {
                    *v /= group.len() as f32;
                }
                pooled.push(mean);
            }
            // Streams can disagree by a frame or two at the tail; truncate to
            // the chroma grid rather than guessing an alignment.
            pooled.truncate(chroma.len());
            while pooled.len() < chroma.len() {
                pooled.push([0.0; 13]);
            }
            Some(pooled)
        };

        Some(Self {
            chroma,
            mfcc,
            energy,
            hop: raw_hop * factor as f32,
            duration: analysis.metadata.duration_seconds,
        })
    }

    /// Number of downsampled frames
    pub fn len(&self) -> usize {
        self.chroma.len()
    }

    /// True when the sequence holds no frames
    pub fn is_empty(&self) -> bool {
        self.chroma.is_empty()
    }

    /// Start time of the downsampled frame at `idx`
    pub fn time_of(&self, idx: usize) -> f32 {
        idx as f32 * self.hop
    }
}

/// N x N symmetric self-similarity matrix, row-major, unit diagonal
#[derive(Debug, Clone)]
pub struct SimilarityMatrix {
    n: usize,
    data: Vec<f32>,
}

impl SimilarityMatrix {
    /// Allocate an all-zero n x n matrix
    ///
    /// Sized once at entry; never grown.
    pub fn new(n: usize) -> Self {
        Self {
            n,
            data: vec![0.0; n * n],
        }
    }

    /// Side length
    pub fn n(&self) -> usize {
        self.n
    }

    /// Cell (i, j)
    pub fn get(&self, i: usize, j: usize) -> f32 {
        self.data[i * self.n + j]
    }

    fn set_symmetric(&mut self, i: usize, j: usize, value: f32) {
        self.data[i * self.n + j] = value;
        self.data[j * self.n + i] = value;
    }
}

/// Build the combined self-similarity matrix for a frame sequence
///
/// `combined = 0.6 * chroma_sim + 0.4 * mfcc_sim`; harmony-only when no MFCC
/// stream is present.
pub fn build_similarity(seq: &FrameSequence) -> SimilarityMatrix {
    let n = seq.len();
    let mut matrix = SimilarityMatrix::new(n);

    log::debug!(
        "Building {}x{} similarity matrix ({})",
        n,
        n,
        if seq.mfcc.is_some() {
            "chroma + mfcc"
        } else {
            "chroma only"
        }
    );

    for i in 0..n {
        matrix.set_symmetric(i, i, 1.0);
        for j in (i + 1)..n {
            let chroma_sim = cosine_similarity(&seq.chroma[i], &seq.chroma[j]);
            let combined = match &seq.mfcc {
                Some(mfcc) => {
                    let mfcc_sim = cosine_similarity(&mfcc[i], &mfcc[j]);
                    CHROMA_WEIGHT * chroma_sim + MFCC_WEIGHT * mfcc_sim
                }
                None => chroma_sim,
            };
            matrix.set_symmetric(i, j, combined);
        }
    }
    matrix
}

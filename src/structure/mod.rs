//! Self-similarity structure segmentation
//!
//! Pipeline: downsample features, build the combined self-similarity matrix,
//! correlate a checkerboard kernel along the diagonal into a novelty curve,
//! smooth and spike-filter it, peak-pick boundaries with a minimum section
//! duration, then cluster and label the resulting sections.

pub mod boundaries;
pub mod novelty;
pub mod sections;
pub mod similarity;

pub use sections::{SignatureClusterer, UnionFindClusterer};
pub use similarity::{FrameSequence, SimilarityMatrix};

use crate::analysis::progress::ProgressStage;
use crate::analysis::result::StructuralMap;
use crate::config::AnalyzerConfig;
use crate::dsp::smoothing::{median_filter, moving_average};
use crate::error::AnalysisError;
use crate::input::LinearAnalysis;

/// Median filter width for novelty spike rejection, in frames
const SPIKE_FILTER_WINDOW: usize = 5;

/// Segment one track into labeled structural sections
///
/// `progress` receives coarse milestones; it is advisory only and never gates
/// correctness. Degenerate paths are explicit: a track with no novelty peaks
/// returns a single whole-track section, and a track with no chroma data at
/// all returns an empty section list for the caller's placeholder fallback.
///
/// # Errors
///
/// Returns [`AnalysisError::InvalidInput`] for Feature Adapter contract
/// violations and [`AnalysisError::Config`] for invalid configuration.
pub fn analyze_structure<F>(
    analysis: &LinearAnalysis,
    config: &AnalyzerConfig,
    mut progress: F,
) -> Result<StructuralMap, AnalysisError>
where
    F: FnMut(ProgressStage),
{
    let config = config.validated()?;
    analysis.validate()?;

    let seq = match FrameSequence::build(analysis, config.max_similarity_frames) {
        Some(seq) => seq,
        None => {
            log::warn!("Structure analysis without chroma data; returning empty section list");
            return Ok(StructuralMap {
                sections: Vec::new(),
            });
        }
    };

    // A track with no measurable energy has no structure to find; the unit
    // diagonal would otherwise dominate the novelty curve and fabricate a
    // boundary in the middle of the silence.
    let max_energy = seq.energy.iter().copied().fold(0.0f32, f32::max);
    if max_energy < crate::dsp::EPSILON {
        log::warn!("Structure analysis on silent chroma; returning a single whole-track section");
        progress(ProgressStage::SimilarityMatrix);
        progress(ProgressStage::NoveltyCurve);
        progress(ProgressStage::BoundariesDetected);
        let clusterer = UnionFindClusterer {
            threshold: config.similarity_threshold,
        };
        let sections = sections::build_sections(&seq, &[], &clusterer);
        progress(ProgressStage::SectionsLabeled);
        return Ok(StructuralMap { sections });
    }

    let matrix = similarity::build_similarity(&seq);
    progress(ProgressStage::SimilarityMatrix);

    // Kernel half-width spans roughly half the smoothing horizon so block
    // transitions at section scale dominate the response.
    let kernel_half_width = ((config.structure_smoothing_seconds / 2.0 / seq.hop).round()
        as usize)
        .clamp(2, seq.len().max(4) / 2);
    let raw_novelty = novelty::novelty_curve(&matrix, kernel_half_width);

    let smoothing_frames = ((config.structure_smoothing_seconds / seq.hop).round() as usize).max(1);
    let smoothed = moving_average(&raw_novelty, smoothing_frames);
    let conditioned = median_filter(&smoothed, SPIKE_FILTER_WINDOW);
    progress(ProgressStage::NoveltyCurve);

    let bounds = boundaries::pick_boundaries(
        &conditioned,
        seq.hop,
        config.novelty_threshold,
        config.min_section_duration,
        seq.duration,
    );
    progress(ProgressStage::BoundariesDetected);

    if bounds.is_empty() {
        log::debug!("No novelty peaks above threshold; returning a single whole-track section");
    }

    let clusterer = UnionFindClusterer {
        threshold: config.similarity_threshold,
    };
    let sections = sections::build_sections(&seq, &bounds, &clusterer);
    progress(ProgressStage::SectionsLabeled);

    log::debug!("Structure analysis produced {} sections", sections.len());

    Ok(StructuralMap { sections })
}

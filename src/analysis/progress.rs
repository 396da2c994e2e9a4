//! Coarse-grained progress reporting
//!
//! Components report milestones through a caller-supplied callback. Reporting
//! is advisory only and never gates correctness; callers that don't care pass
//! a no-op closure.

use std::fmt;

/// Milestones reported during one analysis run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressStage {
    /// Global key estimate computed
    KeyEstimated,
    /// Chord timeline decoded
    ChordsDecoded,
    /// Self-similarity matrix built
    SimilarityMatrix,
    /// Novelty curve computed and smoothed
    NoveltyCurve,
    /// Section boundaries detected
    BoundariesDetected,
    /// Sections clustered and labeled
    SectionsLabeled,
}

impl fmt::Display for ProgressStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProgressStage::KeyEstimated => "key_estimated",
            ProgressStage::ChordsDecoded => "chords_decoded",
            ProgressStage::SimilarityMatrix => "similarity_matrix",
            ProgressStage::NoveltyCurve => "novelty_curve",
            ProgressStage::BoundariesDetected => "boundaries_detected",
            ProgressStage::SectionsLabeled => "sections_labeled",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_display() {
        assert_eq!(ProgressStage::SimilarityMatrix.to_string(), "similarity_matrix");
        assert_eq!(ProgressStage::KeyEstimated.to_string(), "key_estimated");
    }
}

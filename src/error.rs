//! Error types for the analysis engine

use std::fmt;

/// Errors that can occur during harmonic/structural analysis
///
/// Degenerate *musical* input (silence, all-zero chroma, missing MFCC) never
/// produces an error; those cases return documented fallback values instead.
/// Errors are reserved for contract violations and invalid configuration.
#[derive(Debug, Clone)]
pub enum AnalysisError {
    /// Feature Adapter contract violation (missing or malformed input structure)
    InvalidInput(String),

    /// Configuration parameter outside its valid range
    Config(String),

    /// Key estimation stage failed
    KeyEstimation(String),

    /// Chord decoding stage failed
    ChordDecoding(String),

    /// Structure segmentation stage failed
    Segmentation(String),

    /// Numerical error (overflow, NaN, etc.)
    Numerical(String),
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            AnalysisError::Config(msg) => write!(f, "Configuration error: {}", msg),
            AnalysisError::KeyEstimation(msg) => write!(f, "Key estimation error: {}", msg),
            AnalysisError::ChordDecoding(msg) => write!(f, "Chord decoding error: {}", msg),
            AnalysisError::Segmentation(msg) => write!(f, "Segmentation error: {}", msg),
            AnalysisError::Numerical(msg) => write!(f, "Numerical error: {}", msg),
        }
    }
}

impl std::error::Error for AnalysisError {}

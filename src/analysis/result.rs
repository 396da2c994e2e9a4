//! Analysis result types
//!
//! Value objects produced by the key estimator, chord decoder, and structure
//! segmenter. All results are immutable after an analysis pass; re-analysis
//! recomputes them wholesale.

use serde::{Deserialize, Serialize};

/// Pitch-class names, index 0 = C
pub const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Mode of a musical key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyMode {
    /// Major mode
    Major,
    /// Minor (natural/aeolian) mode
    Minor,
}

/// Global tonal-center estimate for one track
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KeyEstimate {
    /// Tonic pitch class (0 = C, 11 = B)
    pub tonic: u8,

    /// Major or minor mode
    pub mode: KeyMode,

    /// Confidence (0.0-1.0): margin of the best template over the runner-up,
    /// normalized by the remaining headroom above the runner-up
    pub confidence: f32,
}

impl KeyEstimate {
    /// Key name in musical notation (e.g. "C", "F#", "Dm")
    pub fn name(&self) -> String {
        let note = NOTE_NAMES[self.tonic as usize % 12];
        match self.mode {
            KeyMode::Major => note.to_string(),
            KeyMode::Minor => format!("{}m", note),
        }
    }

    /// Diatonic pitch-class mask for this key
    ///
    /// Major uses the ionian scale, minor the natural-minor scale. Index 0 = C.
    pub fn diatonic_mask(&self) -> [bool; 12] {
        let degrees: [u8; 7] = match self.mode {
            KeyMode::Major => [0, 2, 4, 5, 7, 9, 11],
            KeyMode::Minor => [0, 2, 3, 5, 7, 8, 10],
        };
        let mut mask = [false; 12];
        for d in degrees {
            mask[((self.tonic + d) % 12) as usize] = true;
        }
        mask
    }
}

/// Chord quality of a decoded state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChordQuality {
    /// Major triad
    Major,
    /// Minor triad
    Minor,
    /// Dominant seventh
    Dominant7,
    /// Major seventh
    Major7,
    /// Minor seventh
    Minor7,
    /// Suspended fourth
    Sus4,
    /// Diminished triad
    Diminished,
    /// Augmented triad
    Augmented,
}

impl ChordQuality {
    /// Label suffix in the Feature Adapter's spelling ("", "m", "7", "maj7", ...)
    pub fn suffix(&self) -> &'static str {
        match self {
            ChordQuality::Major => "",
            ChordQuality::Minor => "m",
            ChordQuality::Dominant7 => "7",
            ChordQuality::Major7 => "maj7",
            ChordQuality::Minor7 => "m7",
            ChordQuality::Sus4 => "sus4",
            ChordQuality::Diminished => "dim",
            ChordQuality::Augmented => "aug",
        }
    }

    /// Quality suffix in Isophonics `.lab` syntax (":min", ":maj7", ...)
    ///
    /// Major triads carry no suffix in that format.
    pub fn lab_suffix(&self) -> &'static str {
        match self {
            ChordQuality::Major => "",
            ChordQuality::Minor => ":min",
            ChordQuality::Dominant7 => ":7",
            ChordQuality::Major7 => ":maj7",
            ChordQuality::Minor7 => ":min7",
            ChordQuality::Sus4 => ":sus4",
            ChordQuality::Diminished => ":dim",
            ChordQuality::Augmented => ":aug",
        }
    }
}

/// One decoded chord spanning a time interval
///
/// Consecutive events tile the full track duration exactly: each event's end
/// is the next event's start, the first starts at 0, the last ends at the
/// track duration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChordEvent {
    /// Interval start in seconds
    pub start_time: f32,

    /// Interval end in seconds
    pub end_time: f32,

    /// Resolved chord label (e.g. "Cmaj7"), or "N" for no-chord/silence
    pub chord: String,

    /// Root pitch class (0 = C); `None` for the no-chord state
    pub root: Option<u8>,

    /// Chord quality; `None` for the no-chord state
    pub quality: Option<ChordQuality>,

    /// Decoder confidence (0.0-1.0): posterior of the chosen state
    pub confidence: f32,

    /// Functional role as a Roman numeral relative to the key (e.g. "V7"),
    /// when a key context was available
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function: Option<String>,
}

/// Semantic label assigned to a structural section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionLabel {
    /// Opening section with low energy and no vocal activity
    Intro,
    /// Repeated verse
    Verse,
    /// Most energetic, most repeated section
    Chorus,
    /// One-off contrasting section late in the song
    Bridge,
    /// Closing section
    Outro,
    /// Non-vocal section that fits no other role
    Instrumental,
    /// Section with no measurable energy
    Silence,
    /// No heuristic matched
    Unknown,
}

impl SectionLabel {
    /// Lowercase display name
    pub fn as_str(&self) -> &'static str {
        match self {
            SectionLabel::Intro => "intro",
            SectionLabel::Verse => "verse",
            SectionLabel::Chorus => "chorus",
            SectionLabel::Bridge => "bridge",
            SectionLabel::Outro => "outro",
            SectionLabel::Instrumental => "instrumental",
            SectionLabel::Silence => "silence",
            SectionLabel::Unknown => "unknown",
        }
    }
}

/// Start/end pair in seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    /// Start in seconds
    pub start_time: f32,
    /// End in seconds
    pub end_time: f32,
}

impl TimeRange {
    /// Duration of the range in seconds
    pub fn duration(&self) -> f32 {
        self.end_time - self.start_time
    }
}

/// Averaged acoustic fingerprint of one section
///
/// Used for cross-section clustering and label assignment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SemanticSignature {
    /// Mean chroma over the section
    pub mean_chroma: [f32; 12],

    /// Mean MFCC over the section; all-zero when no MFCC stream was supplied
    pub mean_mfcc: [f32; 13],

    /// Mean energy, normalized across the track's sections (0.0-1.0)
    pub mean_rms: f32,

    /// Vocal-activity proxy from mid-coefficient MFCC energy (0.0-1.0)
    pub vocal_proxy: f32,
}

/// One labeled structural section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    /// Section time span
    pub time_range: TimeRange,

    /// Assigned semantic label
    pub section_label: SectionLabel,

    /// 1-based occurrence index among sections sharing the label
    /// ("verse 2" has variant 2)
    pub section_variant: u32,

    /// Heuristic strength times cluster cohesion (0.0-1.0); not a calibrated
    /// probability
    pub label_confidence: f32,

    /// Which heuristic produced the label (diagnostic text)
    pub label_reason: String,

    /// Acoustic fingerprint used for clustering/labeling
    pub semantic_signature: SemanticSignature,

    /// Cluster id grouping acoustically similar sections; `None` for
    /// singletons that joined no cluster
    pub cluster_id: Option<usize>,
}

/// Structural map of one track
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuralMap {
    /// Sections, sorted by start time, non-overlapping, tiling the track
    pub sections: Vec<Section>,
}

/// Processing metadata for one analysis run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisSummary {
    /// Track duration in seconds
    pub duration_seconds: f32,

    /// Number of chroma frames consumed
    pub frame_count: usize,

    /// Engine version string
    pub algorithm_version: String,

    /// Wall-clock processing time in milliseconds
    pub processing_time_ms: f32,

    /// Degenerate-input fallbacks taken during the run
    pub warnings: Vec<String>,
}

/// Combined result of one full analysis pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackAnalysis {
    /// Global key estimate
    pub key: KeyEstimate,

    /// Beat-aligned chord timeline
    pub chords: Vec<ChordEvent>,

    /// Structural section map
    pub structure: StructuralMap,

    /// Processing metadata
    pub summary: AnalysisSummary,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_name() {
        let key = KeyEstimate {
            tonic: 2,
            mode: KeyMode::Minor,
            confidence: 0.8,
        };
        assert_eq!(key.name(), "Dm");
        let key = KeyEstimate {
            tonic: 6,
            mode: KeyMode::Major,
            confidence: 0.8,
        };
        assert_eq!(key.name(), "F#");
    }

    #[test]
    fn test_diatonic_mask_c_major() {
        let key = KeyEstimate {
            tonic: 0,
            mode: KeyMode::Major,
            confidence: 1.0,
        };
        let mask = key.diatonic_mask();
        let expected = [
            true, false, true, false, true, true, false, true, false, true, false, true,
        ];
        assert_eq!(mask, expected);
    }

    #[test]
    fn test_diatonic_mask_a_minor_matches_c_major() {
        let c_major = KeyEstimate {
            tonic: 0,
            mode: KeyMode::Major,
            confidence: 1.0,
        };
        let a_minor = KeyEstimate {
            tonic: 9,
            mode: KeyMode::Minor,
            confidence: 1.0,
        };
        assert_eq!(c_major.diatonic_mask(), a_minor.diatonic_mask());
    }

    #[test]
    fn test_quality_suffixes() {
        assert_eq!(ChordQuality::Major.suffix(), "");
        assert_eq!(ChordQuality::Minor7.suffix(), "m7");
        assert_eq!(ChordQuality::Minor.lab_suffix(), ":min");
        assert_eq!(ChordQuality::Major.lab_suffix(), "");
    }

    #[test]
    fn test_section_serializes_with_interface_names() {
        let section = Section {
            time_range: TimeRange {
                start_time: 0.0,
                end_time: 15.0,
            },
            section_label: SectionLabel::Intro,
            section_variant: 1,
            label_confidence: 0.7,
            label_reason: "first section, low energy".to_string(),
            semantic_signature: SemanticSignature {
                mean_chroma: [0.0; 12],
                mean_mfcc: [0.0; 13],
                mean_rms: 0.1,
                vocal_proxy: 0.0,
            },
            cluster_id: None,
        };
        let json = serde_json::to_string(&section).unwrap();
        assert!(json.contains("\"section_label\":\"intro\""));
        assert!(json.contains("\"time_range\""));
        assert!(json.contains("\"semantic_signature\""));
    }
}

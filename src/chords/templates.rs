//! Chord state space and template table
//!
//! The decoder's states come from a configurable table of quality specs, each
//! naming the scale-degree intervals that count as evidence and their weights.
//! Default weights follow the natural overtone series: thirds and fifths are
//! strong evidence, sevenths weaker, and triad templates carry a faint
//! seventh overtone. Swapping the table changes the decodable vocabulary
//! without touching the decoder.

use crate::analysis::result::{ChordQuality, NOTE_NAMES};

/// Evidence intervals for one chord quality
///
/// `intervals` holds (semitone offset from root, weight) pairs.
#[derive(Debug, Clone)]
pub struct QualitySpec {
    /// The quality this spec describes
    pub quality: ChordQuality,

    /// Semitone offsets and their evidence weights
    pub intervals: Vec<(u8, f32)>,
}

/// One decodable chord state
#[derive(Debug, Clone)]
pub struct ChordState {
    /// Root pitch class (0 = C); `None` for the no-chord state
    pub root: Option<u8>,

    /// Chord quality; `None` for the no-chord state and for root-only states
    pub quality: Option<ChordQuality>,

    /// Ideal pitch-class template
    pub template: [f32; 12],

    /// Display label ("Cmaj7", "N", ...)
    pub label: String,
}

/// The decoder's full state space: 12 roots x quality set, plus no-chord
#[derive(Debug, Clone)]
pub struct ChordTemplates {
    states: Vec<ChordState>,
}

/// Default quality table with psychoacoustic evidence weights
pub fn default_qualities(include_sevenths: bool) -> Vec<QualitySpec> {
    let mut specs = vec![
        QualitySpec {
            quality: ChordQuality::Major,
            // Root, major 3rd, perfect 5th, faint major-7th overtone
            intervals: vec![(0, 1.0), (4, 0.9), (7, 0.85), (11, 0.25)],
        },
        QualitySpec {
            quality: ChordQuality::Minor,
            intervals: vec![(0, 1.0), (3, 0.9), (7, 0.85), (10, 0.2)],
        },
        QualitySpec {
            quality: ChordQuality::Sus4,
            intervals: vec![(0, 1.0), (5, 0.9), (7, 0.85)],
        },
        QualitySpec {
            quality: ChordQuality::Diminished,
            intervals: vec![(0, 1.0), (3, 0.9), (6, 0.85)],
        },
        QualitySpec {
            quality: ChordQuality::Augmented,
            intervals: vec![(0, 1.0), (4, 0.9), (8, 0.85)],
        },
    ];
    if include_sevenths {
        specs.push(QualitySpec {
            quality: ChordQuality::Dominant7,
            // The minor 7th is strong evidence here, unlike the triad overtone
            intervals: vec![(0, 1.0), (4, 0.85), (7, 0.8), (10, 0.75)],
        });
        specs.push(QualitySpec {
            quality: ChordQuality::Major7,
            intervals: vec![(0, 1.0), (4, 0.85), (7, 0.8), (11, 0.7)],
        });
        specs.push(QualitySpec {
            quality: ChordQuality::Minor7,
            intervals: vec![(0, 1.0), (3, 0.85), (7, 0.8), (10, 0.75)],
        });
    }
    specs
}

impl ChordTemplates {
    /// Build the default state space
    pub fn new(include_sevenths: bool) -> Self {
        Self::from_qualities(&default_qualities(include_sevenths))
    }

    /// Build a state space from a custom quality table
    ///
    /// States are ordered root-major: all qualities of C, then all of C#, and
    /// so on, with the no-chord state appended last. The ordering is part of
    /// the decoder's deterministic tie-break contract.
    pub fn from_qualities(qualities: &[QualitySpec]) -> Self {
        let mut states = Vec::with_capacity(12 * qualities.len() + 1);
        for root in 0..12u8 {
            for spec in qualities {
                let mut template = [0.0f32; 12];
                for &(offset, weight) in &spec.intervals {
                    template[((root + offset) % 12) as usize] = weight;
                }
                states.push(ChordState {
                    root: Some(root),
                    quality: Some(spec.quality),
                    template,
                    label: format!("{}{}", NOTE_NAMES[root as usize], spec.quality.suffix()),
                });
            }
        }
        states.push(ChordState {
            root: None,
            quality: None,
            template: [0.0; 12],
            label: "N".to_string(),
        });
        Self { states }
    }

    /// Build a root-only state space (12 quality-agnostic states + no-chord)
    ///
    /// Each root's template carries both thirds at reduced weight so major and
    /// minor voicings match equally. Used for fast tuning sweeps and coarse
    /// scoring.
    pub fn root_only() -> Self {
        let mut states = Vec::with_capacity(13);
        for root in 0..12u8 {
            let mut template = [0.0f32; 12];
            template[root as usize] = 1.0;
            template[((root + 3) % 12) as usize] = 0.45;
            template[((root + 4) % 12) as usize] = 0.45;
            template[((root + 7) % 12) as usize] = 0.85;
            states.push(ChordState {
                root: Some(root),
                quality: None,
                template,
                label: NOTE_NAMES[root as usize].to_string(),
            });
        }
        states.push(ChordState {
            root: None,
            quality: None,
            template: [0.0; 12],
            label: "N".to_string(),
        });
        Self { states }
    }

    /// All decodable states, no-chord last
    pub fn states(&self) -> &[ChordState] {
        &self.states
    }

    /// Index of the no-chord state
    pub fn no_chord_index(&self) -> usize {
        self.states.len() - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state_count() {
        let with_sevenths = ChordTemplates::new(true);
        assert_eq!(with_sevenths.states().len(), 12 * 8 + 1);

        let triads_only = ChordTemplates::new(false);
        assert_eq!(triads_only.states().len(), 12 * 5 + 1);
    }

    #[test]
    fn test_no_chord_is_last() {
        let templates = ChordTemplates::new(true);
        let n = &templates.states()[templates.no_chord_index()];
        assert_eq!(n.label, "N");
        assert!(n.root.is_none());
    }

    #[test]
    fn test_c_major_template_pitches() {
        let templates = ChordTemplates::new(true);
        let c_major = templates
            .states()
            .iter()
            .find(|s| s.label == "C")
            .unwrap();
        assert_eq!(c_major.template[0], 1.0); // C
        assert_eq!(c_major.template[4], 0.9); // E
        assert_eq!(c_major.template[7], 0.85); // G
        assert_eq!(c_major.template[1], 0.0);
    }

    #[test]
    fn test_labels_follow_adapter_spelling() {
        let templates = ChordTemplates::new(true);
        let labels: Vec<&str> = templates.states().iter().map(|s| s.label.as_str()).collect();
        assert!(labels.contains(&"Am"));
        assert!(labels.contains(&"G7"));
        assert!(labels.contains(&"Fmaj7"));
        assert!(labels.contains(&"Dm7"));
        assert!(labels.contains(&"Bdim"));
    }

    #[test]
    fn test_root_only_collapses_qualities() {
        let templates = ChordTemplates::root_only();
        assert_eq!(templates.states().len(), 13);
        let c = &templates.states()[0];
        assert!(c.quality.is_none());
        assert!(c.template[3] > 0.0 && c.template[4] > 0.0);
    }

    #[test]
    fn test_custom_quality_table() {
        let power_chord = QualitySpec {
            quality: ChordQuality::Major,
            intervals: vec![(0, 1.0), (7, 1.0)],
        };
        let templates = ChordTemplates::from_qualities(&[power_chord]);
        assert_eq!(templates.states().len(), 13);
        assert_eq!(templates.states()[0].template[7], 1.0);
        assert_eq!(templates.states()[0].template[4], 0.0);
    }
}

//! Isophonics-style `.lab` ground-truth interchange
//!
//! Whitespace-separated `start_seconds end_seconds label` lines, one file for
//! section labels and a `_chord`-suffixed sibling for chords. Chord syntax is
//! `Root[:quality]` (`C`, `D:min`, `G:maj7`); no-chord is `N` or `silence`.
//! The core itself never touches this format at analysis time; it exists for
//! the test/benchmark harness that scores decoder and segmenter output.

use crate::analysis::result::{ChordEvent, ChordQuality, NOTE_NAMES};
use crate::error::AnalysisError;

/// One labeled time span from a `.lab` file
#[derive(Debug, Clone, PartialEq)]
pub struct LabSegment {
    /// Start in seconds
    pub start: f32,

    /// End in seconds
    pub end: f32,

    /// Raw label text
    pub label: String,
}

/// Parse `.lab` text into segments
///
/// Blank lines and `#` comments are skipped. Lines must carry at least three
/// whitespace-separated fields; labels containing spaces keep their remaining
/// fields joined.
///
/// # Errors
///
/// Returns [`AnalysisError::InvalidInput`] on malformed numbers or inverted
/// time ranges.
pub fn parse_lab(text: &str) -> Result<Vec<LabSegment>, AnalysisError> {
    let mut segments = Vec::new();
    for (line_no, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let mut parts = trimmed.split_whitespace();
        let (start, end) = match (parts.next(), parts.next()) {
            (Some(s), Some(e)) => {
                let start: f32 = s.parse().map_err(|_| {
                    AnalysisError::InvalidInput(format!(
                        "lab line {}: bad start time '{}'",
                        line_no + 1,
                        s
                    ))
                })?;
                let end: f32 = e.parse().map_err(|_| {
                    AnalysisError::InvalidInput(format!(
                        "lab line {}: bad end time '{}'",
                        line_no + 1,
                        e
                    ))
                })?;
                (start, end)
            }
            _ => {
                return Err(AnalysisError::InvalidInput(format!(
                    "lab line {}: expected 'start end label'",
                    line_no + 1
                )))
            }
        };
        if end < start {
            return Err(AnalysisError::InvalidInput(format!(
                "lab line {}: end {} before start {}",
                line_no + 1,
                end,
                start
            )));
        }
        let label = parts.collect::<Vec<_>>().join(" ");
        if label.is_empty() {
            return Err(AnalysisError::InvalidInput(format!(
                "lab line {}: missing label",
                line_no + 1
            )));
        }
        segments.push(LabSegment { start, end, label });
    }
    Ok(segments)
}

/// Format segments as `.lab` text
pub fn format_lab(segments: &[LabSegment]) -> String {
    let mut out = String::new();
    for seg in segments {
        out.push_str(&format!("{:.6} {:.6} {}\n", seg.start, seg.end, seg.label));
    }
    out
}

/// Convert a decoded chord timeline to `.lab` segments
pub fn chord_events_to_lab(events: &[ChordEvent]) -> Vec<LabSegment> {
    events
        .iter()
        .map(|e| {
            let label = match (e.root, e.quality) {
                (Some(root), quality) => format!(
                    "{}{}",
                    NOTE_NAMES[root as usize % 12],
                    quality.map(|q| q.lab_suffix()).unwrap_or("")
                ),
                (None, _) => "N".to_string(),
            };
            LabSegment {
                start: e.start_time,
                end: e.end_time,
                label,
            }
        })
        .collect()
}

/// Parse a `.lab` chord symbol into root and quality
///
/// Accepts `C`, `D:min`, `G:maj7`, flat spellings (`Bb`), and the no-chord
/// symbols `N` and `silence` (any case), which map to `(None, None)`.
/// Returns `None` for unparseable symbols.
#[allow(clippy::type_complexity)]
pub fn parse_chord_symbol(symbol: &str) -> Option<(Option<u8>, Option<ChordQuality>)> {
    let trimmed = symbol.trim();
    if trimmed.eq_ignore_ascii_case("N") || trimmed.eq_ignore_ascii_case("silence") {
        return Some((None, None));
    }

    let (root_text, quality_text) = match trimmed.split_once(':') {
        Some((r, q)) => (r, Some(q)),
        None => (trimmed, None),
    };

    let root = parse_root(root_text)?;
    let quality = match quality_text {
        None | Some("maj") => ChordQuality::Major,
        Some("min") => ChordQuality::Minor,
        Some("7") => ChordQuality::Dominant7,
        Some("maj7") => ChordQuality::Major7,
        Some("min7") => ChordQuality::Minor7,
        Some("sus4") => ChordQuality::Sus4,
        Some("dim") => ChordQuality::Diminished,
        Some("aug") => ChordQuality::Augmented,
        Some(_) => return None,
    };
    Some((Some(root), Some(quality)))
}

fn parse_root(text: &str) -> Option<u8> {
    let mut chars = text.chars();
    let letter = chars.next()?.to_ascii_uppercase();
    let base: i32 = match letter {
        'C' => 0,
        'D' => 2,
        'E' => 4,
        'F' => 5,
        'G' => 7,
        'A' => 9,
        'B' => 11,
        _ => return None,
    };
    let mut pc = base;
    for accidental in chars {
        match accidental {
            '#' => pc += 1,
            'b' => pc -= 1,
            _ => return None,
        }
    }
    Some(pc.rem_euclid(12) as u8)
}

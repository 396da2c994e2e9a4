//! Ground-truth scoring for the test/benchmark harness
//!
//! Time-weighted chord overlap against a `.lab` reference, boundary hit
//! scoring, and the fragmentation index used to diagnose over- and
//! under-segmentation.

use super::lab::{parse_chord_symbol, LabSegment};
use crate::analysis::result::ChordEvent;
use crate::dsp::EPSILON;

/// Time-weighted fraction of the reference where the decoded chord matches
///
/// With `root_only` set, only root pitch classes are compared; otherwise root
/// and quality must both match. No-chord reference spans count as matched
/// when the decoder also emitted no-chord. Reference spans with unparseable
/// labels are skipped. Returns 1.0 on an empty reference.
pub fn chord_overlap_ratio(
    reference: &[LabSegment],
    events: &[ChordEvent],
    root_only: bool,
) -> f32 {
    let mut matched = 0.0f32;
    let mut total = 0.0f32;

    for segment in reference {
        let (ref_root, ref_quality) = match parse_chord_symbol(&segment.label) {
            Some(parsed) => parsed,
            None => continue,
        };
        total += segment.end - segment.start;

        for event in events {
            let overlap =
                (segment.end.min(event.end_time) - segment.start.max(event.start_time)).max(0.0);
            if overlap <= 0.0 {
                continue;
            }
            let roots_match = event.root == ref_root;
            let qualities_match = root_only || event.quality == ref_quality;
            if roots_match && qualities_match {
                matched += overlap;
            }
        }
    }

    if total < EPSILON {
        return 1.0;
    }
    matched / total
}

/// Ratio of detected to expected section count
///
/// 1.0 is ideal; above 1.0 indicates over-segmentation, below 1.0
/// under-segmentation. Returns 0.0 when the expected count is zero.
pub fn fragmentation_index(detected: usize, expected: usize) -> f32 {
    if expected == 0 {
        return 0.0;
    }
    detected as f32 / expected as f32
}

/// Fraction of reference boundaries matched by a detection within tolerance
///
/// Each detected boundary can satisfy at most one reference boundary; matches
/// greedily pair in ascending time order.
pub fn boundary_hit_rate(detected: &[f32], reference: &[f32], tolerance: f32) -> f32 {
    if reference.is_empty() {
        return 1.0;
    }
    let mut used = vec![false; detected.len()];
    let mut hits = 0usize;
    for &ref_time in reference {
        let candidate = detected
            .iter()
            .enumerate()
            .filter(|(i, &d)| !used[*i] && (d - ref_time).abs() <= tolerance)
            .min_by(|a, b| {
                let da = (a.1 - ref_time).abs();
                let db = (b.1 - ref_time).abs();
                da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|(i, _)| i);
        if let Some(i) = candidate {
            used[i] = true;
            hits += 1;
        }
    }
    hits as f32 / reference.len() as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::result::ChordQuality;

    fn event(start: f32, end: f32, root: Option<u8>, quality: Option<ChordQuality>) -> ChordEvent {
        ChordEvent {
            start_time: start,
            end_time: end,
            chord: String::new(),
            root,
            quality,
            confidence: 1.0,
            function: None,
        }
    }

    fn segment(start: f32, end: f32, label: &str) -> LabSegment {
        LabSegment {
            start,
            end,
            label: label.to_string(),
        }
    }

    #[test]
    fn test_perfect_overlap() {
        let reference = vec![
            segment(0.0, 2.0, "C"),
            segment(2.0, 4.0, "G"),
            segment(4.0, 6.0, "A:min"),
        ];
        let events = vec![
            event(0.0, 2.0, Some(0), Some(ChordQuality::Major)),
            event(2.0, 4.0, Some(7), Some(ChordQuality::Major)),
            event(4.0, 6.0, Some(9), Some(ChordQuality::Minor)),
        ];
        assert!((chord_overlap_ratio(&reference, &events, false) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_half_overlap() {
        let reference = vec![segment(0.0, 4.0, "C")];
        let events = vec![
            event(0.0, 2.0, Some(0), Some(ChordQuality::Major)),
            event(2.0, 4.0, Some(7), Some(ChordQuality::Major)),
        ];
        assert!((chord_overlap_ratio(&reference, &events, false) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_root_only_ignores_quality() {
        let reference = vec![segment(0.0, 2.0, "C:maj7")];
        let events = vec![event(0.0, 2.0, Some(0), Some(ChordQuality::Major))];
        assert!(chord_overlap_ratio(&reference, &events, false) < 1e-6);
        assert!((chord_overlap_ratio(&reference, &events, true) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_no_chord_matches_no_chord() {
        let reference = vec![segment(0.0, 5.0, "N")];
        let events = vec![event(0.0, 5.0, None, None)];
        assert!((chord_overlap_ratio(&reference, &events, false) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_fragmentation_index() {
        assert!((fragmentation_index(4, 4) - 1.0).abs() < 1e-6);
        assert!((fragmentation_index(8, 4) - 2.0).abs() < 1e-6);
        assert_eq!(fragmentation_index(3, 0), 0.0);
    }

    #[test]
    fn test_boundary_hit_rate() {
        let reference = vec![20.0, 40.0, 60.0];
        let detected = vec![19.0, 41.5, 75.0];
        let rate = boundary_hit_rate(&detected, &reference, 3.0);
        assert!((rate - 2.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_boundary_detection_not_double_counted() {
        // One detection cannot satisfy two reference boundaries.
        let reference = vec![20.0, 22.0];
        let detected = vec![21.0];
        let rate = boundary_hit_rate(&detected, &reference, 3.0);
        assert!((rate - 0.5).abs() < 1e-6);
    }
}

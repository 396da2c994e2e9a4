//! Section signatures, clustering, and semantic labeling
//!
//! Each section gets an averaged acoustic fingerprint, acoustically similar
//! sections are grouped behind the [`SignatureClusterer`] interface, and
//! labels come from position/energy/repetition heuristics. Heuristic
//! constants live here, swappable without touching the segmentation pipeline.

use super::similarity::{FrameSequence, CHROMA_WEIGHT, MFCC_WEIGHT};
use crate::analysis::result::{Section, SectionLabel, SemanticSignature, TimeRange};
use crate::dsp::{cosine_similarity, EPSILON};

/// Vocal-proxy level below which a section counts as non-vocal
const VOCAL_FLOOR: f32 = 0.5;

/// Vocal-proxy level below which an unmatched section reads as instrumental
const INSTRUMENTAL_VOCAL_CEILING: f32 = 0.3;

/// Earliest position fraction at which a one-off section reads as a bridge
const BRIDGE_POSITION_MIN: f32 = 0.4;

/// Latest position fraction at which a one-off section reads as a bridge
const BRIDGE_POSITION_MAX: f32 = 0.95;

/// MFCC coefficient range treated as the vocal band
const VOCAL_MFCC_RANGE: std::ops::Range<usize> = 2..7;

/// Groups acoustically similar sections
///
/// Implementations must be deterministic: identical input signatures yield
/// identical cluster assignments.
pub trait SignatureClusterer {
    /// Assign a cluster id to each signature
    ///
    /// Ids are arbitrary but stable; sections sharing an id belong to one
    /// acoustic group.
    fn cluster(&self, signatures: &[SemanticSignature]) -> Vec<usize>;
}

/// Greedy union-find clustering over pairwise signature similarity
#[derive(Debug, Clone)]
pub struct UnionFindClusterer {
    /// Cosine similarity at or above which two sections join one cluster
    pub threshold: f32,
}

impl SignatureClusterer for UnionFindClusterer {
    fn cluster(&self, signatures: &[SemanticSignature]) -> Vec<usize> {
        let n = signatures.len();
        let mut parent: Vec<usize> = (0..n).collect();

        fn find(parent: &mut Vec<usize>, i: usize) -> usize {
            let mut root = i;
            while parent[root] != root {
                root = parent[root];
            }
            let mut walk = i;
            while parent[walk] != root {
                let next = parent[walk];
                parent[walk] = root;
                walk = next;
            }
            root
        }

        for i in 0..n {
            for j in (i + 1)..n {
                if signature_similarity(&signatures[i], &signatures[j]) >= self.threshold {
                    let ri = find(&mut parent, i);
                    let rj = find(&mut parent, j);
                    if ri != rj {
                        // Attach the higher root to the lower for determinism.
                        let (low, high) = if ri < rj { (ri, rj) } else { (rj, ri) };
                        parent[high] = low;
                    }
                }
            }
        }

        // Renumber cluster ids by first occurrence.
        let mut ids = Vec::with_capacity(n);
        let mut next_id = 0usize;
        let mut assigned: Vec<Option<usize>> = vec![None; n];
        for i in 0..n {
            let root = find(&mut parent, i);
            let id = match assigned[root] {
                Some(id) => id,
                None => {
                    let id = next_id;
                    assigned[root] = Some(id);
                    next_id += 1;
                    id
                }
            };
            ids.push(id);
        }
        ids
    }
}

/// Cosine similarity between two section signatures
///
/// Harmonic and timbral parts combine with the same harmony-over-timbre
/// weights as the similarity matrix; sections without MFCC data compare on
/// chroma alone.
pub fn signature_similarity(a: &SemanticSignature, b: &SemanticSignature) -> f32 {
    let chroma_sim = cosine_similarity(&a.mean_chroma, &b.mean_chroma);
    let a_has_mfcc = a.mean_mfcc.iter().any(|v| v.abs() > EPSILON);
    let b_has_mfcc = b.mean_mfcc.iter().any(|v| v.abs() > EPSILON);
    if a_has_mfcc && b_has_mfcc {
        CHROMA_WEIGHT * chroma_sim + MFCC_WEIGHT * cosine_similarity(&a.mean_mfcc, &b.mean_mfcc)
    } else {
        chroma_sim
    }
}

/// Build labeled sections from interior boundary timestamps
///
/// Computes a semantic signature per section, clusters signatures, and
/// assigns labels with the position/energy/repetition heuristics. Sections
/// tile `[0, duration]` and are immutable value objects; re-analysis
/// recomputes them wholesale.
pub fn build_sections(
    seq: &FrameSequence,
    boundaries: &[f32],
    clusterer: &dyn SignatureClusterer,
) -> Vec<Section> {
    if seq.is_empty() {
        return Vec::new();
    }

    let duration = seq.duration;
    let mut cuts = vec![0.0f32];
    cuts.extend_from_slice(boundaries);
    cuts.push(duration);

    // Frame ranges per section, quantized to the downsampled grid.
    let n_frames = seq.len();
    let mut ranges: Vec<(usize, usize)> = Vec::with_capacity(cuts.len() - 1);
    for w in cuts.windows(2) {
        let start = ((w[0] / seq.hop).round() as usize).min(n_frames - 1);
        let end = (((w[1] / seq.hop).round() as usize).max(start + 1)).min(n_frames);
        ranges.push((start, end.max(start + 1)));
    }

    let raw: Vec<RawSignature> = ranges
        .iter()
        .map(|&(start, end)| raw_signature(seq, start, end))
        .collect();

    // Normalize energy and vocal proxy across the track's sections.
    let max_energy = raw.iter().map(|r| r.energy).fold(0.0f32, f32::max);
    let max_vocal = raw.iter().map(|r| r.vocal).fold(0.0f32, f32::max);
    let signatures: Vec<SemanticSignature> = raw
        .iter()
        .map(|r| SemanticSignature {
            mean_chroma: r.chroma,
            mean_mfcc: r.mfcc,
            mean_rms: if max_energy > EPSILON {
                r.energy / max_energy
            } else {
                0.0
            },
            vocal_proxy: if max_vocal > EPSILON {
                r.vocal / max_vocal
            } else {
                0.0
            },
        })
        .collect();

    let clusters = clusterer.cluster(&signatures);
    let cohesion = cluster_cohesion(&signatures, &clusters);
    let assignments = assign_labels(&cuts, &raw, &signatures, &clusters, duration);

    // Variant numbering per label, in time order.
    let mut label_counts: std::collections::HashMap<SectionLabel, u32> =
        std::collections::HashMap::new();
    let mut sections = Vec::with_capacity(assignments.len());
    for (i, (label, strength, reason)) in assignments.into_iter().enumerate() {
        let variant = label_counts.entry(label).or_insert(0);
        *variant += 1;

        let cluster_size = clusters.iter().filter(|&&c| c == clusters[i]).count();
        sections.push(Section {
            time_range: TimeRange {
                start_time: cuts[i],
                end_time: cuts[i + 1],
            },
            section_label: label,
            section_variant: *variant,
            label_confidence: (strength * cohesion[i]).clamp(0.0, 1.0),
            label_reason: reason,
            semantic_signature: signatures[i].clone(),
            cluster_id: if cluster_size >= 2 {
                Some(clusters[i])
            } else {
                None
            },
        });
    }
    sections
}

struct RawSignature {
    chroma: [f32; 12],
    mfcc: [f32; 13],
    energy: f32,
    vocal: f32,
}

fn raw_signature(seq: &FrameSequence, start: usize, end: usize) -> RawSignature {
    let count = (end - start).max(1) as f32;

    let mut chroma = [0.0f32; 12];
    for frame in &seq.chroma[start..end] {
        for (acc, v) in chroma.iter_mut().zip(frame.iter()) {
            *acc += v;
        }
    }
    for v in &mut chroma {
        *v /= count;
    }

    let mut mfcc = [0.0f32; 13];
    let mut vocal = 0.0f32;
    if let Some(frames) = &seq.mfcc {
        for frame in &frames[start..end] {
            for (acc, v) in mfcc.iter_mut().zip(frame.iter()) {
                *acc += v;
            }
            let band: f32 = frame[VOCAL_MFCC_RANGE].iter().map(|v| v.abs()).sum();
            vocal += band / VOCAL_MFCC_RANGE.len() as f32;
        }
        for v in &mut mfcc {
            *v /= count;
        }
        vocal /= count;
    }

    let energy = seq.energy[start..end].iter().sum::<f32>() / count;

    RawSignature {
        chroma,
        mfcc,
        energy,
        vocal,
    }
}

/// Mean pairwise similarity within each section's cluster (singletons = 1.0)
fn cluster_cohesion(signatures: &[SemanticSignature], clusters: &[usize]) -> Vec<f32> {
    let n = signatures.len();
    let mut cohesion = vec![1.0f32; n];
    for i in 0..n {
        let members: Vec<usize> = (0..n).filter(|&j| clusters[j] == clusters[i]).collect();
        if members.len() < 2 {
            continue;
        }
        let mut total = 0.0f32;
        let mut pairs = 0usize;
        for (a_idx, &a) in members.iter().enumerate() {
            for &b in &members[a_idx + 1..] {
                total += signature_similarity(&signatures[a], &signatures[b]);
                pairs += 1;
            }
        }
        cohesion[i] = (total / pairs as f32).clamp(0.0, 1.0);
    }
    cohesion
}

/// Assign a label, heuristic strength, and reason per section
fn assign_labels(
    cuts: &[f32],
    raw: &[RawSignature],
    signatures: &[SemanticSignature],
    clusters: &[usize],
    duration: f32,
) -> Vec<(SectionLabel, f32, String)> {
    let n = signatures.len();
    let energies: Vec<f32> = signatures.iter().map(|s| s.mean_rms).collect();
    let vocals: Vec<f32> = signatures.iter().map(|s| s.vocal_proxy).collect();

    let mut sorted_energy = energies.clone();
    sorted_energy.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let median_energy = sorted_energy[sorted_energy.len() / 2];

    // Per-cluster stats for the chorus/verse decisions.
    let n_clusters = clusters.iter().copied().max().map_or(0, |m| m + 1);
    let mut counts = vec![0usize; n_clusters];
    let mut cluster_energy = vec![0.0f32; n_clusters];
    for (i, &c) in clusters.iter().enumerate() {
        counts[c] += 1;
        cluster_energy[c] += energies[i];
    }
    for c in 0..n_clusters {
        cluster_energy[c] /= counts[c].max(1) as f32;
    }

    // The chorus is the most energetic repeated cluster; repetition breaks
    // energy ties, lower cluster id breaks exact ties.
    let chorus_cluster = (0..n_clusters)
        .filter(|&c| counts[c] >= 2)
        .max_by(|&a, &b| {
            let score_a = cluster_energy[a] + 0.05 * counts[a] as f32;
            let score_b = cluster_energy[b] + 0.05 * counts[b] as f32;
            score_a
                .partial_cmp(&score_b)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(b.cmp(&a))
        });

    (0..n)
        .map(|i| {
            if raw[i].energy < EPSILON {
                return (
                    SectionLabel::Silence,
                    0.9,
                    "no measurable energy".to_string(),
                );
            }
            if i == 0 && n > 1 && energies[i] <= median_energy && vocals[i] < VOCAL_FLOOR {
                return (
                    SectionLabel::Intro,
                    0.7,
                    "first section, low energy, no vocal activity".to_string(),
                );
            }
            if i == n - 1 && n > 1 && energies[i] <= median_energy && vocals[i] < VOCAL_FLOOR {
                return (
                    SectionLabel::Outro,
                    0.7,
                    "last section, low energy, no vocal activity".to_string(),
                );
            }
            if Some(clusters[i]) == chorus_cluster {
                return (
                    SectionLabel::Chorus,
                    0.8,
                    "most energetic repeated cluster".to_string(),
                );
            }
            if counts[clusters[i]] >= 2 {
                return (
                    SectionLabel::Verse,
                    0.6,
                    "repeated cluster alternating with the chorus".to_string(),
                );
            }
            let midpoint = (cuts[i] + cuts[i + 1]) / 2.0;
            let position = midpoint / duration.max(EPSILON);
            if n >= 4 && position > BRIDGE_POSITION_MIN && position < BRIDGE_POSITION_MAX {
                return (
                    SectionLabel::Bridge,
                    0.5,
                    "one-off contrasting section late in the song".to_string(),
                );
            }
            if vocals[i] < INSTRUMENTAL_VOCAL_CEILING {
                return (
                    SectionLabel::Instrumental,
                    0.4,
                    "unclustered section without vocal activity".to_string(),
                );
            }
            (
                SectionLabel::Unknown,
                0.2,
                "no labeling heuristic matched".to_string(),
            )
        })
        .collect()
}

//! Performance benchmarks for the analysis engine

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use harmonia_dsp::{analyze_track, AnalyzerConfig, BeatGrid, ChromaFrame, LinearAnalysis, MfccFrame};

/// Synthetic 3-minute track with a verse/chorus-like alternating structure
fn synthetic_track() -> LinearAnalysis {
    let hop = 0.1f32;
    let duration = 180.0f32;
    let n_frames = (duration / hop) as usize;

    let chroma_frames = (0..n_frames)
        .map(|i| {
            let t = i as f32 * hop;
            let block = (t / 20.0) as usize;
            let mut chroma = [0.05f32; 12];
            let root = if block % 2 == 0 { 0 } else { 7 };
            chroma[root] = 1.0;
            chroma[(root + 4) % 12] = 0.8;
            chroma[(root + 7) % 12] = 0.7;
            ChromaFrame {
                timestamp: t,
                chroma,
            }
        })
        .collect();

    let mfcc_frames = (0..n_frames)
        .map(|i| {
            let t = i as f32 * hop;
            let block = (t / 20.0) as usize;
            let mut mfcc = [0.0f32; 13];
            for (c, v) in mfcc.iter_mut().enumerate() {
                *v = ((block * 13 + c) % 7) as f32 * 0.1;
            }
            MfccFrame { timestamp: t, mfcc }
        })
        .collect();

    LinearAnalysis {
        metadata: harmonia_dsp::TrackMetadata {
            duration_seconds: duration,
            sample_rate: 22050,
            detected_key: None,
            detected_mode: None,
        },
        chroma_frames,
        mfcc_frames,
        beat_grid: BeatGrid {
            tempo_bpm: 120.0,
            beat_timestamps: (0..(duration * 2.0) as usize)
                .map(|i| i as f32 * 0.5)
                .collect(),
            ..Default::default()
        },
        events: vec![],
    }
}

fn bench_analyze_track(c: &mut Criterion) {
    let analysis = synthetic_track();
    let config = AnalyzerConfig::default();

    c.bench_function("analyze_track_3min", |b| {
        b.iter(|| {
            let _ = analyze_track(black_box(&analysis), black_box(&config), |_| {});
        });
    });
}

fn bench_structure_only(c: &mut Criterion) {
    let analysis = synthetic_track();
    let config = AnalyzerConfig::default();

    c.bench_function("analyze_structure_3min", |b| {
        b.iter(|| {
            let _ = harmonia_dsp::analyze_structure(
                black_box(&analysis),
                black_box(&config),
                |_| {},
            );
        });
    });
}

criterion_group!(benches, bench_analyze_track, bench_structure_only);
criterion_main!(benches);

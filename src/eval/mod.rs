//! Ground-truth interchange and scoring utilities
//!
//! Shared by the integration tests and the external tuning harness. Nothing
//! here runs during a normal analysis pass.

pub mod lab;
pub mod scoring;

pub use lab::{chord_events_to_lab, format_lab, parse_chord_symbol, parse_lab, LabSegment};
pub use scoring::{boundary_hit_rate, chord_overlap_ratio, fragmentation_index};

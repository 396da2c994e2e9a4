//! Krumhansl-Schmuckler key templates
//!
//! Tonal profiles for 24 keys (12 major + 12 minor), rotated from the
//! Krumhansl-Kessler probe-tone ratings.
//!
//! # Reference
//!
//! Krumhansl, C. L., & Kessler, E. J. (1982). Tracing the Dynamic Changes in
//! Perceived Tonal Organization in a Spatial Representation of Musical Keys.
//! *Psychological Review*, 89(4), 334-368.

/// Major probe-tone profile, tonic at index 0
const MAJOR_PROFILE: [f32; 12] = [
    6.35, 2.23, 3.48, 2.33, 4.38, 4.09, 2.52, 5.19, 2.39, 3.66, 2.29, 2.88,
];

/// Minor probe-tone profile, tonic at index 0
const MINOR_PROFILE: [f32; 12] = [
    6.33, 2.68, 3.52, 5.38, 2.60, 3.53, 2.54, 4.75, 3.98, 2.69, 3.34, 3.17,
];

/// Key templates for all 24 keys
#[derive(Debug, Clone)]
pub struct KeyTemplates {
    /// Major key templates (tonic 0 = C through 11 = B)
    major: [[f32; 12]; 12],

    /// Minor key templates (tonic 0 = C through 11 = B)
    minor: [[f32; 12]; 12],
}

impl KeyTemplates {
    /// Build the 24 rotated, sum-normalized Krumhansl-Kessler templates
    pub fn new() -> Self {
        let major_base = normalize(MAJOR_PROFILE);
        let minor_base = normalize(MINOR_PROFILE);

        let mut major = [[0.0f32; 12]; 12];
        let mut minor = [[0.0f32; 12]; 12];
        for tonic in 0..12 {
            for pc in 0..12 {
                // Rotate so the profile's tonic lands on pitch class `tonic`.
                let src = (pc + 12 - tonic) % 12;
                major[tonic][pc] = major_base[src];
                minor[tonic][pc] = minor_base[src];
            }
        }

        Self { major, minor }
    }

    /// Template for the major key with the given tonic pitch class
    pub fn major_template(&self, tonic: usize) -> &[f32; 12] {
        &self.major[tonic % 12]
    }

    /// Template for the minor key with the given tonic pitch class
    pub fn minor_template(&self, tonic: usize) -> &[f32; 12] {
        &self.minor[tonic % 12]
    }
}

impl Default for KeyTemplates {
    fn default() -> Self {
        Self::new()
    }
}

fn normalize(profile: [f32; 12]) -> [f32; 12] {
    let sum: f32 = profile.iter().sum();
    let mut out = profile;
    for v in &mut out {
        *v /= sum;
    }
    out
}

//! IELTS band-score conversion tables.
//!
//! Raw correct-answer counts (out of 40) convert to bands 1.0–9.0 in 0.5
//! steps through fixed, non-uniform lookup tables, one for reading and one
//! for listening. The tables are data, not behavior: the bucket boundaries are
//! reproduced exactly. Writing is not auto-banded (see the grading engine).

use crate::model::Section;

/// Inclusive raw-score ranges: `(low, high, band)`.
const READING_BANDS: &[(u32, u32, f64)] = &[
    (39, 40, 9.0),
    (37, 38, 8.5),
    (35, 36, 8.0),
    (33, 34, 7.5),
    (30, 32, 7.0),
    (27, 29, 6.5),
    (23, 26, 6.0),
    (19, 22, 5.5),
    (15, 18, 5.0),
    (13, 14, 4.5),
    (10, 12, 4.0),
    (8, 9, 3.5),
    (6, 7, 3.0),
    (4, 5, 2.5),
    (3, 3, 2.0),
    (2, 2, 1.5),
    (0, 1, 1.0),
];

const LISTENING_BANDS: &[(u32, u32, f64)] = &[
    (39, 40, 9.0),
    (37, 38, 8.5),
    (35, 36, 8.0),
    (32, 34, 7.5),
    (30, 31, 7.0),
    (26, 29, 6.5),
    (23, 25, 6.0),
    (18, 22, 5.5),
    (16, 17, 5.0),
    (13, 15, 4.5),
    (10, 12, 4.0),
    (8, 9, 3.5),
    (6, 7, 3.0),
    (4, 5, 2.5),
    (3, 3, 2.0),
    (2, 2, 1.5),
    (0, 1, 1.0),
];

fn lookup(table: &[(u32, u32, f64)], correct: u32) -> f64 {
    for &(low, high, band) in table {
        if correct >= low && correct <= high {
            return band;
        }
    }
    // Above the table means a raw score past 40; clamp to the top band.
    if table.iter().any(|&(_, high, _)| correct > high) {
        return 9.0;
    }
    1.0
}

/// Reading raw score → band.
pub fn reading_band(correct: u32) -> f64 {
    lookup(READING_BANDS, correct)
}

/// Listening raw score → band.
pub fn listening_band(correct: u32) -> f64 {
    lookup(LISTENING_BANDS, correct)
}

/// The auto-band for a section's raw score. Writing is never auto-banded;
/// it returns 0.0 and is excluded from the overall mean.
pub fn band_for(section: Section, correct: u32) -> f64 {
    match section {
        Section::Reading => reading_band(correct),
        Section::Listening => listening_band(correct),
        Section::Writing => 0.0,
    }
}

/// Round to the nearest half band, halves away from zero.
pub fn round_half(band: f64) -> f64 {
    (band * 2.0).round() / 2.0
}

/// Combine section bands into the overall band: the arithmetic mean of all
/// positive section bands, rounded to the nearest 0.5; 1.0 when no section
/// has a positive band.
pub fn overall_band(section_bands: &[f64]) -> f64 {
    let positive: Vec<f64> = section_bands.iter().copied().filter(|&b| b > 0.0).collect();
    if positive.is_empty() {
        return 1.0;
    }
    round_half(positive.iter().sum::<f64>() / positive.len() as f64)
}

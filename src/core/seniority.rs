/// Ordinal level for each known seniority label
///
/// Staff and lead share a level, as do principal and director.
const SENIORITY_LEVELS: [(&str, u8); 7] = [
    ("junior", 1),
    ("mid", 2),
    ("senior", 3),
    ("staff", 4),
    ("principal", 5),
    ("lead", 4),
    ("director", 5),
];

/// Level used for labels outside the table
pub const DEFAULT_SENIORITY_LEVEL: u8 = 2;

/// Map a seniority label to its ordinal level (1-5)
///
/// Comparison ignores case only; padded labels such as `" senior"` are
/// unknown. Unknown labels fall back to [`DEFAULT_SENIORITY_LEVEL`] without
/// any diagnostic.
pub fn seniority_level(label: &str) -> u8 {
    SENIORITY_LEVELS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(label))
        .map(|(_, level)| *level)
        .unwrap_or(DEFAULT_SENIORITY_LEVEL)
}

/// Absolute distance between two seniority labels' levels
#[inline]
pub fn seniority_gap(a: &str, b: &str) -> u8 {
    seniority_level(a).abs_diff(seniority_level(b))
}

//! Declared checksum extraction from release file names
//!
//! Release groups conventionally put the CRC-32 of a file in its name,
//! usually in brackets just before the extension:
//! `Show.S01E01.1080p.x264 [A016D394].mkv`.

use crate::checksum::Crc32;
use regex::Regex;
use std::sync::LazyLock;

/// Maximal runs of hex digits; only runs of exactly 8 are candidates
static HEX_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9A-Fa-f]+").expect("static regex is valid"));

/// Extract the declared CRC-32 from a file name
///
/// Returns the last run of exactly 8 hex digits bounded by non-hex
/// characters or the ends of the name. Longer and shorter runs never match.
/// Absence of a token is a normal outcome, not an error.
pub fn extract(name: &str) -> Option<Crc32> {
    extract_token(name).and_then(|token| token.parse().ok())
}

/// The raw text of the declared checksum token, as written in the name
pub fn extract_token(name: &str) -> Option<&str> {
    HEX_RUN
        .find_iter(name)
        .filter(|m| m.len() == Crc32::HEX_LENGTH)
        .last()
        .map(|m| m.as_str())
}

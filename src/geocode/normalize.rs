//! Place-name cleanup applied before building geocoding queries.
//!
//! The listing is sometimes served with UTF-8 text that went through a
//! Latin-1 or Windows-1252 decode somewhere upstream, so "Rivière" shows up as
//! "RiviÃ¨re" (or worse, "RiviÃƒÂ¨re"). Every function here is pure and
//! idempotent.

use crate::common::types::RinkIdentity;
use once_cell::sync::Lazy;

/// Characters we know how to recover. Ü, Ì and Ÿ are left out on purpose:
/// their mis-decoded forms end in Œ/œ, which would let a repaired œ combine
/// with a stray "Ã" on a second pass.
const FRENCH_CHARS: &str = "àâäçéèêëîïôöùûüÿœæÀÂÇÉÈÊËÎÏÔÙÛŒÆ";

/// Windows-1252 code points for 0x80..=0x9F. Undefined slots fall back to
/// the Latin-1 control character, like browsers do.
const CP1252_HIGH: [char; 32] = [
    '\u{20AC}', '\u{81}', '\u{201A}', '\u{192}', '\u{201E}', '\u{2026}', '\u{2020}', '\u{2021}',
    '\u{2C6}', '\u{2030}', '\u{160}', '\u{2039}', '\u{152}', '\u{8D}', '\u{17D}', '\u{8F}',
    '\u{90}', '\u{2018}', '\u{2019}', '\u{201C}', '\u{201D}', '\u{2022}', '\u{2013}', '\u{2014}',
    '\u{2DC}', '\u{2122}', '\u{161}', '\u{203A}', '\u{153}', '\u{9D}', '\u{17E}', '\u{178}',
];

fn cp1252_char(byte: u8) -> char {
    match byte {
        0x80..=0x9F => CP1252_HIGH[(byte - 0x80) as usize],
        _ => byte as char,
    }
}

fn latin1_char(byte: u8) -> char {
    byte as char
}

/// Re-reads the UTF-8 bytes of `text` one byte per character.
fn misdecode(text: &str, decode: fn(u8) -> char) -> String {
    text.bytes().map(decode).collect()
}

/// Mojibake pattern -> intended character, longest patterns first.
static SUBSTITUTIONS: Lazy<Vec<(String, char)>> = Lazy::new(|| {
    let mut table: Vec<(String, char)> = Vec::new();
    for c in FRENCH_CHARS.chars() {
        let original = c.to_string();
        let as_cp1252 = misdecode(&original, cp1252_char);
        let as_latin1 = misdecode(&original, latin1_char);
        let double = misdecode(&as_cp1252, cp1252_char);
        for pattern in [double, as_cp1252, as_latin1] {
            if !table.iter().any(|(p, _)| *p == pattern) {
                table.push((pattern, c));
            }
        }
    }
    table.sort_by(|a, b| b.0.chars().count().cmp(&a.0.chars().count()));
    table
});

/// Replaces known mojibake sequences in a single left-to-right pass.
pub fn repair_encoding(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    'scan: while let Some(c) = rest.chars().next() {
        if c == 'Ã' || c == 'Å' {
            for (pattern, replacement) in SUBSTITUTIONS.iter() {
                if let Some(tail) = rest.strip_prefix(pattern.as_str()) {
                    out.push(*replacement);
                    rest = tail;
                    continue 'scan;
                }
            }
        }
        out.push(c);
        rest = &rest[c.len_utf8()..];
    }
    out
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_park_token(word: &str) -> bool {
    word.eq_ignore_ascii_case("parc") || word.eq_ignore_ascii_case("park")
}

/// Drops leading "Parc"/"Park" words. The last word is always kept, so a rink
/// literally named "Parc" stays "Parc".
pub fn strip_park_prefix(name: &str) -> String {
    let mut rest = name.trim();
    while let Some((word, tail)) = rest.split_once(char::is_whitespace) {
        let tail = tail.trim_start();
        if !is_park_token(word) || tail.is_empty() {
            break;
        }
        rest = tail;
    }
    rest.to_string()
}

/// Encoding repair, whitespace cleanup, and duplicated park tokens folded
/// into one ("Parc parc Jarry" -> "Parc Jarry").
pub fn normalize_name(name: &str) -> String {
    let cleaned = collapse_whitespace(&repair_encoding(name));
    match cleaned.split_once(' ') {
        Some((first, tail)) if is_park_token(first) => {
            format!("{} {}", first, strip_park_prefix(tail))
        }
        _ => cleaned,
    }
}

pub fn normalize_borough(borough: &str) -> String {
    collapse_whitespace(&repair_encoding(borough))
}

/// An identity ready to be turned into provider queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedIdentity {
    pub name: String,
    /// `name` without its leading park token.
    pub bare_name: String,
    pub borough: String,
}

pub fn normalize_identity(identity: &RinkIdentity) -> NormalizedIdentity {
    let name = normalize_name(&identity.name);
    let bare_name = strip_park_prefix(&name);
    NormalizedIdentity {
        name,
        bare_name,
        borough: normalize_borough(&identity.borough),
    }
}

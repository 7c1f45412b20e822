//! Font Metrics
//!
//! Helvetica advance widths and WinAnsi encoding for the text layer. The
//! overlay never embeds a font, so width measurement uses the standard
//! Helvetica AFM table (1/1000 em units, indexed from the first encoded
//! character).

const FIRST_CHAR: u8 = 32;

/// Helvetica advance widths for WinAnsi codes 32..=255, in 1/1000 em.
/// Unencoded slots carry 0.
#[rustfmt::skip]
const HELVETICA_WIDTHS: [u16; 224] = [
    // 32-63:  space ! " # $ % & ' ( ) * + , - . / 0-9 : ; < = > ?
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    // 64-95:  @ A-Z [ \ ] ^ _
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    // 96-127: ` a-z { | } ~
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, 0,
    // 128-159: WinAnsi extras (euro, quotes, dashes, bullet, ellipsis, ...)
    556, 0, 222, 556, 333, 1000, 556, 556, 333, 1000, 667, 333, 1000, 0, 611, 0,
    0, 222, 222, 333, 333, 350, 556, 1000, 333, 1000, 500, 333, 944, 0, 500, 667,
    // 160-191
    278, 333, 556, 556, 556, 556, 260, 556, 333, 737, 370, 556, 584, 333, 737, 333,
    400, 584, 333, 333, 333, 556, 537, 278, 333, 333, 365, 556, 834, 834, 834, 611,
    // 192-223
    667, 667, 667, 667, 667, 667, 1000, 722, 667, 667, 667, 667, 278, 278, 278, 278,
    722, 722, 778, 778, 778, 778, 778, 584, 778, 722, 722, 722, 722, 667, 667, 611,
    // 224-255
    556, 556, 556, 556, 556, 556, 889, 500, 556, 556, 556, 556, 278, 278, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 584, 611, 556, 556, 556, 556, 500, 556, 500,
];

/// Advance width of one WinAnsi code, in 1/1000 em
fn advance(code: u8) -> f64 {
    if code < FIRST_CHAR {
        return 0.0;
    }
    f64::from(HELVETICA_WIDTHS[(code - FIRST_CHAR) as usize])
}

/// Map a char to its WinAnsi code, or `None` for unencodable glyphs
pub fn win_ansi_code(c: char) -> Option<u8> {
    match c {
        // Latin-1 range minus the C1 controls WinAnsi repurposes
        '\u{20}'..='\u{7e}' => Some(c as u8),
        '\u{a0}'..='\u{ff}' => Some(c as u8),
        '\u{20ac}' => Some(0x80),
        '\u{201a}' => Some(0x82),
        '\u{0192}' => Some(0x83),
        '\u{201e}' => Some(0x84),
        '\u{2026}' => Some(0x85),
        '\u{2020}' => Some(0x86),
        '\u{2021}' => Some(0x87),
        '\u{02c6}' => Some(0x88),
        '\u{2030}' => Some(0x89),
        '\u{0160}' => Some(0x8a),
        '\u{2039}' => Some(0x8b),
        '\u{0152}' => Some(0x8c),
        '\u{017d}' => Some(0x8e),
        '\u{2018}' => Some(0x91),
        '\u{2019}' => Some(0x92),
        '\u{201c}' => Some(0x93),
        '\u{201d}' => Some(0x94),
        '\u{2022}' => Some(0x95),
        '\u{2013}' => Some(0x96),
        '\u{2014}' => Some(0x97),
        '\u{02dc}' => Some(0x98),
        '\u{2122}' => Some(0x99),
        '\u{0161}' => Some(0x9a),
        '\u{203a}' => Some(0x9b),
        '\u{0153}' => Some(0x9c),
        '\u{017e}' => Some(0x9e),
        '\u{0178}' => Some(0x9f),
        _ => None,
    }
}

/// Encode a string to WinAnsi bytes.
///
/// Returns `None` if any glyph is unencodable; the caller skips such runs
/// rather than emitting a corrupt one.
pub fn encode_win_ansi(text: &str) -> Option<Vec<u8>> {
    text.chars().map(win_ansi_code).collect()
}

/// Natural rendered width of WinAnsi-encoded text at a font size, in the
/// same units as the font size (page units here).
pub fn string_width(encoded: &[u8], font_size: f64) -> f64 {
    let em: f64 = encoded.iter().map(|&b| advance(b)).sum();
    em / 1000.0 * font_size
}

//! Helvetica metrics for the base-14 font used by every overlay.

/// Advance widths for printable ASCII (0x20..=0x7E), in 1/1000 em,
/// from the standard Helvetica AFM with WinAnsi encoding.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // '0'..'?'
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // '@'..'O'
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // 'P'..'_'
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // '`'..'o'
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // 'p'..'~'
];

const REPLACEMENT: char = '?';

/// Replace everything outside printable ASCII with `?`.
pub fn sanitize(text: &str) -> String {
    text.chars()
        .map(|c| if (' '..='~').contains(&c) { c } else { REPLACEMENT })
        .collect()
}

/// Width of `text` in points at `size`. Expects sanitized text; anything
/// else is measured as `?`.
pub fn text_width(text: &str, size: f32) -> f32 {
    let units: u32 = text.chars().map(|c| u32::from(glyph_width(c))).sum();
    units as f32 * size / 1000.0
}

fn glyph_width(c: char) -> u16 {
    let index = match c {
        ' '..='~' => c as usize - 0x20,
        _ => REPLACEMENT as usize - 0x20,
    };
    HELVETICA_WIDTHS[index]
}

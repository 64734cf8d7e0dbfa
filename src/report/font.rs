//! Metrics and text encoding for the two standard Helvetica faces used in reports.
//!
//! Standard 14 fonts are not embedded, so the widths below are the published
//! Adobe font metrics (in thousandths of the font size) for printable ASCII.

use pdf_writer::Name;

/// Advance width used for characters outside printable ASCII.
const FALLBACK_WIDTH: u16 = 556;

/// Widths for Helvetica, indexed by `byte - 0x20`.
#[rustfmt::skip]
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

/// Widths for Helvetica-Bold, indexed by `byte - 0x20`.
#[rustfmt::skip]
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

/// A typeface the report draws text with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Font {
    /// Helvetica, used for table rows.
    Regular,
    /// Helvetica-Bold, used for the title, column headers and total.
    Bold,
}

impl Font {
    /// The PostScript name of the standard font.
    pub(crate) fn base_font(self) -> Name<'static> {
        match self {
            Font::Regular => Name(b"Helvetica"),
            Font::Bold => Name(b"Helvetica-Bold"),
        }
    }

    /// The name the font is registered under in each page's resources.
    pub(crate) fn resource_name(self) -> Name<'static> {
        match self {
            Font::Regular => Name(b"F1"),
            Font::Bold => Name(b"F2"),
        }
    }

    fn glyph_width(self, byte: u8) -> u16 {
        let widths = match self {
            Font::Regular => &HELVETICA_WIDTHS,
            Font::Bold => &HELVETICA_BOLD_WIDTHS,
        };

        byte.checked_sub(0x20)
            .and_then(|index| widths.get(usize::from(index)))
            .copied()
            .unwrap_or(FALLBACK_WIDTH)
    }
}

/// The width of `text` in user units when set in `font` at `size`.
pub fn text_width(text: &str, font: Font, size: f32) -> f32 {
    let units: u32 = encode_win_ansi(text)
        .into_iter()
        .map(|byte| u32::from(font.glyph_width(byte)))
        .sum();

    units as f32 * size / 1000.0
}

/// Encode `text` for a font using `WinAnsiEncoding`.
///
/// Characters the encoding has no code for become `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars().map(win_ansi_byte).collect()
}

fn win_ansi_byte(character: char) -> u8 {
    match u32::from(character) {
        code @ (0x20..=0x7E | 0xA0..=0xFF) => code as u8,
        _ => match character {
            '€' => 0x80,
            '‚' => 0x82,
            'ƒ' => 0x83,
            '„' => 0x84,
            '…' => 0x85,
            '†' => 0x86,
            '‡' => 0x87,
            'ˆ' => 0x88,
            '‰' => 0x89,
            'Š' => 0x8A,
            '‹' => 0x8B,
            'Œ' => 0x8C,
            'Ž' => 0x8E,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '•' => 0x95,
            '–' => 0x96,
            '—' => 0x97,
            '˜' => 0x98,
            '™' => 0x99,
            'š' => 0x9A,
            '›' => 0x9B,
            'œ' => 0x9C,
            'ž' => 0x9E,
            'Ÿ' => 0x9F,
            '\t' => b' ',
            _ => b'?',
        },
    }
}

#[cfg(test)]
mod tests {
    use super::{Font, encode_win_ansi, text_width};

    #[test]
    fn digits_and_separators_have_expected_widths() {
        // 4 digits at 556, '.' at 278, 2 digits at 556.
        let want = (6.0 * 556.0 + 278.0) * 11.0 / 1000.0;

        let got = text_width("1234.50", Font::Regular, 11.0);

        assert!((got - want).abs() < 1e-4, "want {want}, got {got}");
    }

    #[test]
    fn minus_sign_is_wider_than_period() {
        assert!(text_width("-", Font::Regular, 10.0) > text_width(".", Font::Regular, 10.0));
    }

    #[test]
    fn bold_lowercase_is_wider_than_regular() {
        assert!(text_width("Total", Font::Bold, 12.0) > text_width("Total", Font::Regular, 12.0));
    }

    #[test]
    fn empty_text_has_no_width() {
        assert_eq!(text_width("", Font::Bold, 18.0), 0.0);
    }

    #[test]
    fn encodes_latin_and_windows_specific_characters() {
        assert_eq!(encode_win_ansi("Café"), b"Caf\xE9".to_vec());
        assert_eq!(encode_win_ansi("€5 – ok"), b"\x805 \x96 ok".to_vec());
    }

    #[test]
    fn replaces_unencodable_characters() {
        assert_eq!(encode_win_ansi("₹100"), b"?100".to_vec());
        assert_eq!(encode_win_ansi("a\nb"), b"a?b".to_vec());
    }
}

// zipdelta-parsers/src/zip/cp437.rs
//! IBM code page 437, the encoding of ZIP names stored without the UTF-8 flag

/// Characters for bytes 0x80..=0xFF; the lower half is ASCII
const HIGH_HALF: [char; 128] = [
    'Ç', 'ü', 'é', 'â', 'ä', 'à', 'å', 'ç', 'ê', 'ë', 'è', 'ï', 'î', 'ì', 'Ä', 'Å',
    'É', 'æ', 'Æ', 'ô', 'ö', 'ò', 'û', 'ù', 'ÿ', 'Ö', 'Ü', '¢', '£', '¥', '₧', 'ƒ',
    'á', 'í', 'ó', 'ú', 'ñ', 'Ñ', 'ª', 'º', '¿', '⌐', '¬', '½', '¼', '¡', '«', '»',
    '░', '▒', '▓', '│', '┤', '╡', '╢', '╖', '╕', '╣', '║', '╗', '╝', '╜', '╛', '┐',
    '└', '┴', '┬', '├', '─', '┼', '╞', '╟', '╚', '╔', '╩', '╦', '╠', '═', '╬', '╧',
    '╨', '╤', '╥', '╙', '╘', '╒', '╓', '╫', '╪', '┘', '┌', '█', '▄', '▌', '▐', '▀',
    'α', 'ß', 'Γ', 'π', 'Σ', 'σ', 'µ', 'τ', 'Φ', 'Θ', 'Ω', 'δ', '∞', 'φ', 'ε', '∩',
    '≡', '±', '≥', '≤', '⌠', '⌡', '÷', '≈', '°', '∙', '·', '√', 'ⁿ', '²', '■', '\u{A0}',
];

/// Decode CP437 bytes; every byte maps to exactly one character
pub(crate) fn decode(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|&b| match b {
            0x00..=0x7F => char::from(b),
            _ => HIGH_HALF[usize::from(b - 0x80)],
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_passthrough() {
        assert_eq!(decode(b"project/src/main.py"), "project/src/main.py");
    }

    #[test]
    fn test_high_half() {
        assert_eq!(decode(&[0x82, 0x83]), "éâ");
        assert_eq!(decode(b"na\xA4o.txt"), "naño.txt");
        assert_eq!(decode(&[0x80, 0xE1, 0xFF]), "Çß\u{A0}");
    }

    #[test]
    fn test_distinct_bytes_stay_distinct() {
        let decoded: std::collections::HashSet<String> =
            (0x80..=0xFFu8).map(|b| decode(&[b])).collect();
        assert_eq!(decoded.len(), 128);
    }
}

//! Text helpers for overlay text: font-safe transliteration and a greedy
//! fixed-width word wrap.

use std::collections::HashMap;
use std::sync::LazyLock;

/// Line length used by [`wordwrap_default`].
pub const DEFAULT_LINE_LENGTH: usize = 65;

/// Replacements that turn accented Latin (and a little Cyrillic) into
/// characters the standard 14 fonts can show. Lowercase only.
pub static SAFE_FOR_FONT: LazyLock<HashMap<char, &'static str>> = LazyLock::new(|| {
    HashMap::from([
        ('ß', "b"), ('à', "a"), ('á', "a"), ('â', "a"), ('ã', "a"), ('ä', "a"),
        ('å', "a"), ('æ', "ae"), ('ç', "c"), ('è', "e"), ('é', "e"), ('ê', "e"),
        ('ë', "e"), ('ì', "i"), ('í', "i"), ('î', "i"), ('ï', "i"), ('ð', "o"),
        ('ñ', "n"), ('ò', "o"), ('ó', "o"), ('ô', "o"), ('õ', "o"), ('ö', "o"),
        ('ø', "o"), ('ù', "u"), ('ú', "u"), ('û', "u"), ('ü', "u"), ('ý', "y"),
        ('þ', "p"), ('ÿ', "y"), ('ā', "a"), ('ă', "a"), ('ĉ', "c"), ('č', "c"),
        ('ď', "d"), ('ē', "e"), ('ě', "e"), ('ĝ', "g"), ('ĥ', "h"), ('ī', "i"),
        ('ĵ', "j"), ('ň', "n"), ('ō', "o"), ('ő', "o"), ('œ', "ae"), ('ř', "r"),
        ('ŝ', "s"), ('ş', "s"), ('š', "s"), ('ţ', "t"), ('ť', "t"), ('ū', "u"),
        ('ŭ', "u"), ('ů', "u"), ('ű', "u"), ('ŵ', "w"), ('ŷ', "y"), ('ž', "z"),
        ('ș', "s"), ('ț', "t"), ('ё', "e"),
    ])
});

/// Replace every character found in `table` with its replacement.
pub fn transliterate(text: &str, table: &HashMap<char, &str>) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match table.get(&ch) {
            Some(replacement) => out.push_str(replacement),
            None => out.push(ch),
        }
    }
    out
}

/// Keep only ASCII letters, digits, space and `.,?!`.
pub fn remove_unsupported_characters(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | ',' | '?' | '!' | ' '))
        .collect()
}

pub fn wordwrap_default(text: &str) -> Vec<String> {
    wordwrap(text, DEFAULT_LINE_LENGTH)
}

/// Greedy fixed-width word wrap, measured in characters.
///
/// Each newline-delimited line is broken at the last space at or before
/// `line_length` (the space is dropped); a word longer than `line_length` is
/// cut hard at exactly `line_length`. A newline directly after a break is
/// consumed. A `line_length` of zero is treated as one.
pub fn wordwrap(text: &str, line_length: usize) -> Vec<String> {
    let limit = line_length.max(1);
    let chars: Vec<char> = text.chars().collect();
    let mut lines = Vec::new();
    let mut rest = &chars[..];

    while !rest.is_empty() {
        let line_end = rest.iter().position(|&c| c == '\n').unwrap_or(rest.len());
        let (taken, skip) = next_line_break(&rest[..line_end], limit);

        lines.push(rest[..taken].iter().collect());
        rest = &rest[taken + skip..];
        if rest.first() == Some(&'\n') {
            rest = &rest[1..];
        }
    }
    lines
}

/// Returns how many characters go on the line and how many separator
/// characters to drop after them.
fn next_line_break(line: &[char], limit: usize) -> (usize, usize) {
    if line.len() <= limit {
        return (line.len(), 0);
    }
    match line[..=limit].iter().rposition(|&c| c == ' ') {
        Some(space) if space > 0 => (space, 1),
        _ => (limit, 0),
    }
}

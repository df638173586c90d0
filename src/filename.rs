// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Filesystem-safe names derived from chat titles.
//!
//! Chat titles are free text in any script. [`sanitize_name`] reduces them to
//! a short ASCII stem used for part files and the archive itself:
//!
//! ```
//! use tg2md::filename::{archive_file_name, part_file_name, sanitize_name};
//!
//! let stem = sanitize_name("Книжный клуб: 2024");
//! assert_eq!(stem, "Knizhnyy_klub_2024");
//! assert_eq!(part_file_name(&stem, 3), "Knizhnyy_klub_2024_part_003.md");
//! assert_eq!(archive_file_name(&stem), "Knizhnyy_klub_2024.zip");
//! ```

use deunicode::deunicode_char;

/// Longest stem [`sanitize_name`] returns, in characters.
pub const MAX_NAME_LENGTH: usize = 50;

/// Stem used when nothing printable survives sanitization.
const FALLBACK_NAME: &str = "chat";

/// Characters that are unsafe in paths or URLs.
const FORBIDDEN_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*', '#'];

/// Lowercase Cyrillic letters and their Latin spellings.
const CYRILLIC: &[(char, &str)] = &[
    ('а', "a"),
    ('б', "b"),
    ('в', "v"),
    ('г', "g"),
    ('д', "d"),
    ('е', "e"),
    ('ё', "yo"),
    ('ж', "zh"),
    ('з', "z"),
    ('и', "i"),
    ('й', "y"),
    ('к', "k"),
    ('л', "l"),
    ('м', "m"),
    ('н', "n"),
    ('о', "o"),
    ('п', "p"),
    ('р', "r"),
    ('с', "s"),
    ('т', "t"),
    ('у', "u"),
    ('ф', "f"),
    ('х', "kh"),
    ('ц', "ts"),
    ('ч', "ch"),
    ('ш', "sh"),
    ('щ', "shch"),
    ('ъ', ""),
    ('ы', "y"),
    ('ь', ""),
    ('э', "e"),
    ('ю', "yu"),
    ('я', "ya"),
    ('і', "i"),
    ('ї', "yi"),
    ('є', "ye"),
    ('ґ', "g"),
    ('ў', "u"),
];

/// Reduces a chat name to a short, filesystem-safe ASCII stem.
///
/// In order:
/// 1. Cyrillic letters are transliterated from a fixed table; other
///    non-ASCII letters go through `deunicode`
/// 2. `<>:"/\|?*#` become underscores
/// 3. Remaining non-ASCII and control characters are dropped
/// 4. Whitespace runs become a single underscore, and underscore runs collapse
/// 5. The result is cut to [`MAX_NAME_LENGTH`] characters
///
/// Applying it to its own output changes nothing.
#[must_use]
pub fn sanitize_name(name: &str) -> String {
    let mut ascii = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii() {
            ascii.push(c);
        } else if let Some(latin) = transliterate(c) {
            ascii.push_str(&latin);
        } else if c.is_whitespace() {
            ascii.push(' ');
        }
    }

    let mut result = String::with_capacity(ascii.len());
    for c in ascii.chars() {
        let mapped = if FORBIDDEN_CHARS.contains(&c) || c.is_whitespace() {
            '_'
        } else if c.is_ascii_graphic() {
            c
        } else {
            continue;
        };

        if mapped == '_' && result.ends_with('_') {
            continue;
        }
        result.push(mapped);
    }

    result.truncate(MAX_NAME_LENGTH);

    if result.is_empty() {
        FALLBACK_NAME.to_owned()
    } else {
        result
    }
}

/// Spells a non-ASCII letter in Latin characters.
fn transliterate(c: char) -> Option<String> {
    let lower = c.to_lowercase().next().unwrap_or(c);

    if let Some(&(_, latin)) = CYRILLIC.iter().find(|(cyrillic, _)| *cyrillic == lower) {
        if lower == c {
            return Some(latin.to_owned());
        }
        let mut chars = latin.chars();
        return Some(
            chars
                .next()
                .map(|first| first.to_ascii_uppercase().to_string() + chars.as_str())
                .unwrap_or_default(),
        );
    }

    if c.is_alphabetic() {
        return deunicode_char(c).map(str::to_owned);
    }

    None
}

/// Name of part `index` (1-based) inside the archive.
#[must_use]
pub fn part_file_name(stem: &str, index: usize) -> String {
    format!("{stem}_part_{index:03}.md")
}

/// Suggested file name for the archive itself.
#[must_use]
pub fn archive_file_name(stem: &str) -> String {
    format!("{stem}.zip")
}

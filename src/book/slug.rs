use unicode_normalization::UnicodeNormalization;

/// Turn a title or category name into a sluggified form safe for use in
/// URLs.
///
/// The result contains only lowercase ASCII alphanumerics, `_`, and `-`.
/// Runs of any other characters collapse into a single `-`, and leading or
/// trailing `-`s are stripped. Common non-ASCII letters are transliterated
/// to keep the slug readable (e.g. "Größe" becomes "grosse"); remaining
/// accented characters are decomposed and reduced to their ASCII base.
pub fn slugify(input: &str) -> String {
    let mut translated = String::with_capacity(input.len());
    for ch in input.to_lowercase().chars() {
        match ch {
            'ø' => translated.push('o'),
            'ß' => translated.push_str("ss"),
            'œ' => translated.push_str("ae"),
            '–' | '—' => translated.push('-'),
            '“' | '”' => translated.push('"'),
            '‘' | '’' => translated.push('\''),
            other => translated.push(other),
        }
    }

    let ascii = translated.nfkd().filter(char::is_ascii);

    let mut out = String::with_capacity(input.len());
    for ch in ascii {
        if ch.is_ascii_alphanumeric() || ch == '_' {
            out.push(ch);
        } else if !out.ends_with('-') {
            out.push('-');
        }
    }
    out.trim_matches('-').to_string()
}

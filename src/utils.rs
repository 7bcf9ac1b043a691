// Utility functions

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Converts a display name into a URL slug: lowercase ASCII, accents stripped, runs of
/// anything else collapsed into a single `-`.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    for c in text.nfd().filter(|c| !is_combining_mark(*c)).flat_map(char::to_lowercase) {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_matches('-').to_string()
}

/// Collapses every run of whitespace into a single space and trims the ends.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Cuts `text` to at most `max` characters without splitting a code point.
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_folds_accents_and_separators() {
        assert_eq!(slugify("Apartamentos"), "apartamentos");
        assert_eq!(slugify("  Balcón / Terraza  "), "balcon-terraza");
        assert_eq!(slugify("Área de BBQ!!"), "area-de-bbq");
    }

    #[test]
    fn slugify_strips_marks_from_any_latin_letter() {
        assert_eq!(slugify("São Paulo"), "sao-paulo");
        assert_eq!(slugify("Condomínio Vista Ã"), "condominio-vista-a");
        assert_eq!(slugify("Peñasco Çurrú"), "penasco-curru");
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("jardín", 5), "jardí");
        assert_eq!(truncate_chars("casa", 10), "casa");
    }

    #[test]
    fn collapse_whitespace_joins_runs() {
        assert_eq!(collapse_whitespace("  3 \n recámaras\t 2 baños "), "3 recámaras 2 baños");
    }
}

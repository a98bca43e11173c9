use once_cell::sync::Lazy;
use regex::Regex;

use crate::constants::SLUG_MAX;

static SLUG_RE: Lazy<Regex> = Lazy::new(|| Regex::new("^[a-z0-9-]+$").expect("valid regex"));

/// Whether a string is a well-formed slug: lowercase kebab, `[a-z0-9-]+`.
#[must_use]
pub fn is_valid_slug(s: &str) -> bool {
    SLUG_RE.is_match(s)
}

/// Derive a URL slug from a topic title.
///
/// Lowercases, strips diacritics, collapses every non-alphanumeric run to a
/// single hyphen, and trims leading/trailing hyphens. Falls back to `topic`
/// for titles with no usable characters (e.g. all punctuation), and caps
/// the result at the slug length bound.
#[must_use]
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_hyphen = false;

    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            push_separated(&mut slug, &mut pending_hyphen, c.to_ascii_lowercase());
        } else if let Some(folded) = fold_diacritic(c) {
            for f in folded.chars() {
                push_separated(&mut slug, &mut pending_hyphen, f);
            }
        } else {
            pending_hyphen = true;
        }
    }

    if slug.is_empty() {
        return "topic".to_string();
    }

    if slug.len() > SLUG_MAX {
        slug.truncate(SLUG_MAX);
        while slug.ends_with('-') {
            slug.pop();
        }
    }

    slug
}

fn push_separated(slug: &mut String, pending_hyphen: &mut bool, c: char) {
    if *pending_hyphen && !slug.is_empty() {
        slug.push('-');
    }
    *pending_hyphen = false;
    slug.push(c);
}

/// Fold common Latin diacritics to their ASCII base letters. Characters
/// outside the table are treated as separators.
fn fold_diacritic(c: char) -> Option<&'static str> {
    let folded = match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' => "a",
        'è' | 'é' | 'ê' | 'ë' | 'È' | 'É' | 'Ê' | 'Ë' => "e",
        'ì' | 'í' | 'î' | 'ï' | 'Ì' | 'Í' | 'Î' | 'Ï' => "i",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' => "o",
        'ù' | 'ú' | 'û' | 'ü' | 'Ù' | 'Ú' | 'Û' | 'Ü' => "u",
        'ý' | 'ÿ' | 'Ý' => "y",
        'ñ' | 'Ñ' => "n",
        'ç' | 'Ç' => "c",
        'ß' => "ss",
        'æ' | 'Æ' => "ae",
        'ø' | 'Ø' => "o",
        'œ' | 'Œ' => "oe",
        'đ' | 'Đ' => "d",
        'ł' | 'Ł' => "l",
        'š' | 'Š' => "s",
        'ž' | 'Ž' => "z",
        _ => return None,
    };
    Some(folded)
}

/// The n-th slug candidate for a base: the base itself, then `base-2`,
/// `base-3`, ... Deterministic so concurrent creators converge on the same
/// sequence and the uniqueness constraint arbitrates.
#[must_use]
pub fn candidate(base: &str, attempt: u32) -> String {
    if attempt == 0 {
        base.to_string()
    } else {
        format!("{base}-{}", attempt + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_titles() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("  Spaces   everywhere  "), "spaces-everywhere");
        assert_eq!(slugify("MixedCASE Title"), "mixedcase-title");
    }

    #[test]
    fn test_diacritics_stripped() {
        assert_eq!(slugify("Heurísticas"), "heuristicas");
        assert_eq!(slugify("Évaluation généralisée"), "evaluation-generalisee");
        assert_eq!(slugify("Straße"), "strasse");
    }

    #[test]
    fn test_punctuation_collapsed() {
        assert_eq!(slugify("What?! Really..."), "what-really");
        assert_eq!(slugify("a -- b"), "a-b");
        assert_eq!(slugify("--trimmed--"), "trimmed");
    }

    #[test]
    fn test_non_latin_dropped() {
        assert_eq!(slugify("日本語 title"), "title");
        assert_eq!(slugify("!!!!!"), "topic");
    }

    #[test]
    fn test_length_capped() {
        let long = "a".repeat(300);
        let slug = slugify(&long);
        assert!(slug.len() <= SLUG_MAX);
        assert!(is_valid_slug(&slug));
    }

    #[test]
    fn test_candidates_are_deterministic() {
        assert_eq!(candidate("guide", 0), "guide");
        assert_eq!(candidate("guide", 1), "guide-2");
        assert_eq!(candidate("guide", 4), "guide-5");
    }

    #[test]
    fn test_valid_slug() {
        assert!(is_valid_slug("ux-research"));
        assert!(is_valid_slug("a1-b2"));
        assert!(!is_valid_slug("UX"));
        assert!(!is_valid_slug("with space"));
        assert!(!is_valid_slug(""));
    }
}

//! URL slug derivation.

/// Fallback slug for names that fold to nothing (e.g. all-symbol titles).
const EMPTY_SLUG_FALLBACK: &str = "urun";

/// Derives a URL slug from a display name.
///
/// Lowercases, folds Turkish and common European diacritics to their ASCII
/// base letters and collapses every other character run into a single `-`.
/// Derivation is deterministic and does NOT guarantee uniqueness; callers
/// persisting slugs must probe the store and disambiguate collisions.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut last_dash = false;

    for ch in input.chars() {
        if let Some(folded) = fold_char(ch) {
            slug.push_str(folded);
            last_dash = false;
        } else if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash && !slug.is_empty() {
            slug.push('-');
            last_dash = true;
        }
    }

    let slug = slug.trim_end_matches('-');
    if slug.is_empty() {
        EMPTY_SLUG_FALLBACK.to_string()
    } else {
        slug.to_string()
    }
}

/// Candidate slug for the `n`-th holder of the same base slug.
///
/// The first holder keeps the bare slug; later holders get a numeric
/// suffix starting at `-2`.
pub fn numbered(base: &str, n: usize) -> String {
    if n <= 1 {
        base.to_string()
    } else {
        format!("{base}-{n}")
    }
}

fn fold_char(ch: char) -> Option<&'static str> {
    let folded = match ch {
        'ç' | 'Ç' => "c",
        'ğ' | 'Ğ' => "g",
        'ı' | 'İ' => "i",
        'ö' | 'Ö' => "o",
        'ş' | 'Ş' => "s",
        'ü' | 'Ü' => "u",
        'á' | 'à' | 'â' | 'ä' | 'ã' | 'å' => "a",
        'é' | 'è' | 'ê' | 'ë' => "e",
        'í' | 'ì' | 'î' | 'ï' => "i",
        'ó' | 'ò' | 'ô' | 'õ' => "o",
        'ú' | 'ù' | 'û' => "u",
        'ñ' => "n",
        'ý' => "y",
        'æ' => "ae",
        'ø' => "o",
        'ß' => "ss",
        _ => return None,
    };
    Some(folded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_turkish_characters() {
        assert_eq!(slugify("Kırmızı Kazak"), "kirmizi-kazak");
        assert_eq!(slugify("ÇİĞ KÖFTE"), "cig-kofte");
    }

    #[test]
    fn collapses_separator_runs() {
        assert_eq!(slugify("Yün  --  Atkı (XL)"), "yun-atki-xl");
    }

    #[test]
    fn keeps_digits() {
        assert_eq!(slugify("Tablo 40x60"), "tablo-40x60");
    }

    #[test]
    fn is_deterministic() {
        assert_eq!(slugify("Kırmızı Kazak"), slugify("Kırmızı Kazak"));
    }

    #[test]
    fn falls_back_when_nothing_survives() {
        assert_eq!(slugify("★★★"), "urun");
    }

    #[test]
    fn numbers_later_holders_only() {
        assert_eq!(numbered("kirmizi-kazak", 1), "kirmizi-kazak");
        assert_eq!(numbered("kirmizi-kazak", 2), "kirmizi-kazak-2");
    }
}

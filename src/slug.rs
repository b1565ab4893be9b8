//! Title-to-slug encoding for directory and URL names.
//!
//! Outline titles are mostly Ukrainian, so plain ASCII filtering would erase
//! them entirely. The encoder lowercases the text, transliterates Cyrillic
//! letters through a fixed table (the Ukrainian national romanization, plus
//! the handful of Russian-only letters that show up in pasted outlines),
//! turns whitespace and path separators into dashes, and drops everything else.
//!
//! ```text
//! "Вступ до Rust"        → "vstup-do-rust"
//! "Щоденні звички"       → "shchodenni-zvychky"
//! "C++ / Rust: що далі?" → "c-rust-shcho-dali"
//! ```
//!
//! The output alphabet is `[a-z0-9-]` with no leading, trailing, or doubled
//! dashes, so encoding an already-encoded slug returns it unchanged.

/// Character used to join words in a slug.
pub const JOINER: char = '-';

/// Encode arbitrary title text into a filesystem- and URL-safe token.
///
/// Total and deterministic: characters with no mapping are dropped rather
/// than replaced, so two different titles never collide on a placeholder.
/// May return an empty string when nothing in the input is mappable.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_joiner = false;

    for ch in text.chars().flat_map(char::to_lowercase) {
        if ch.is_ascii_alphanumeric() {
            push_word(&mut slug, &mut pending_joiner, ch.encode_utf8(&mut [0; 4]));
        } else if let Some(latin) = transliterate(ch) {
            if !latin.is_empty() {
                push_word(&mut slug, &mut pending_joiner, latin);
            }
        } else if is_separator(ch) {
            pending_joiner = true;
        }
    }

    slug
}

fn push_word(slug: &mut String, pending_joiner: &mut bool, part: &str) {
    if *pending_joiner && !slug.is_empty() {
        slug.push(JOINER);
    }
    *pending_joiner = false;
    slug.push_str(part);
}

fn is_separator(ch: char) -> bool {
    ch.is_whitespace() || matches!(ch, '-' | '_' | '/' | '\\' | '–' | '—')
}

/// Map one lowercase Cyrillic letter to its Latin spelling.
///
/// `Some("")` marks letters that are deliberately silent (soft sign,
/// apostrophes inside words) so they don't split a word in two.
fn transliterate(ch: char) -> Option<&'static str> {
    let latin = match ch {
        'а' => "a",
        'б' => "b",
        'в' => "v",
        'г' => "h",
        'ґ' => "g",
        'д' => "d",
        'е' => "e",
        'є' => "ie",
        'ж' => "zh",
        'з' => "z",
        'и' => "y",
        'і' => "i",
        'ї' => "i",
        'й' => "i",
        'к' => "k",
        'л' => "l",
        'м' => "m",
        'н' => "n",
        'о' => "o",
        'п' => "p",
        'р' => "r",
        'с' => "s",
        'т' => "t",
        'у' => "u",
        'ф' => "f",
        'х' => "kh",
        'ц' => "ts",
        'ч' => "ch",
        'ш' => "sh",
        'щ' => "shch",
        'ю' => "iu",
        'я' => "ia",
        'ё' => "io",
        'ы' => "y",
        'э' => "e",
        'ь' | 'ъ' | '\'' | '’' | 'ʼ' | '`' => "",
        _ => return None,
    };
    Some(latin)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_words_joined_with_dashes() {
        assert_eq!(slugify("Getting Started"), "getting-started");
    }

    #[test]
    fn ukrainian_title_transliterated() {
        assert_eq!(slugify("Вступ до Rust"), "vstup-do-rust");
    }

    #[test]
    fn digraph_letters() {
        assert_eq!(slugify("Щоденні звички"), "shchodenni-zvychky");
        assert_eq!(slugify("Юність і Яблука"), "iunist-i-iabluka");
        assert_eq!(slugify("Хмара"), "khmara");
    }

    #[test]
    fn apostrophe_and_soft_sign_are_silent() {
        assert_eq!(slugify("П'ять сіль"), "piat-sil");
        assert_eq!(slugify("Пʼять"), "piat");
    }

    #[test]
    fn punctuation_dropped_separators_collapsed() {
        assert_eq!(slugify("C++ / Rust: що далі?"), "c-rust-shcho-dali");
        assert_eq!(slugify("a  -  b__c"), "a-b-c");
    }

    #[test]
    fn edges_trimmed() {
        assert_eq!(slugify("  -- Hello --  "), "hello");
        assert_eq!(slugify("/path/"), "path");
    }

    #[test]
    fn unmappable_characters_dropped() {
        assert_eq!(slugify("日本 Tokyo"), "tokyo");
        assert_eq!(slugify("Q&A"), "qa");
    }

    #[test]
    fn nothing_mappable_yields_empty() {
        assert_eq!(slugify("!!! ???"), "");
        assert_eq!(slugify(""), "");
    }

    #[test]
    fn digits_kept() {
        assert_eq!(slugify("HTTP 2 та HTTP 3"), "http-2-ta-http-3");
    }

    #[test]
    fn second_pass_is_a_no_op() {
        for title in [
            "Вступ до Rust",
            "C++ / Rust: що далі?",
            "  -- Hello --  ",
            "Щоденні  звички — огляд",
        ] {
            let once = slugify(title);
            assert_eq!(slugify(&once), once, "not stable for {title:?}");
        }
    }
}

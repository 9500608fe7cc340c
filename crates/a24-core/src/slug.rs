//! URL-safe slugs for catalog text.
//!
//! Georgian letters are transliterated to Latin first so that category and
//! attribute names coming from API24 produce readable ASCII slugs. The same
//! function re-derives the expected slug of an existing term when checking
//! for drift, so it must stay deterministic.

/// Latin rendering of each Georgian (Mkhedruli) letter.
const GEORGIAN: [(char, &str); 33] = [
    ('ა', "a"),
    ('ბ', "b"),
    ('გ', "g"),
    ('დ', "d"),
    ('ე', "e"),
    ('ვ', "v"),
    ('ზ', "z"),
    ('თ', "t"),
    ('ი', "i"),
    ('კ', "k"),
    ('ლ', "l"),
    ('მ', "m"),
    ('ნ', "n"),
    ('ო', "o"),
    ('პ', "p"),
    ('ჟ', "zh"),
    ('რ', "r"),
    ('ს', "s"),
    ('ტ', "t"),
    ('უ', "u"),
    ('ფ', "f"),
    ('ქ', "q"),
    ('ღ', "gh"),
    ('ყ', "y"),
    ('შ', "sh"),
    ('ჩ', "ch"),
    ('ც', "ts"),
    ('ძ', "dz"),
    ('წ', "w"),
    ('ჭ', "ch"),
    ('ხ', "kh"),
    ('ჯ', "j"),
    ('ჰ', "h"),
];

fn transliterate(c: char) -> Option<&'static str> {
    GEORGIAN
        .iter()
        .find_map(|&(letter, latin)| (letter == c).then_some(latin))
}

/// Converts catalog text into a lowercase, hyphen-delimited ASCII token.
///
/// After transliteration, whitespace and `-` separate words and every other
/// character outside `[A-Za-z0-9]` is dropped, so `"Te##st"` reads as one
/// word. Runs of separators collapse to a single hyphen; leading and trailing
/// hyphens are dropped. Input with nothing convertible yields an empty string.
#[must_use]
pub fn to_slug(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_hyphen = false;

    let mut push = |ch: char, slug: &mut String| {
        if ch.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(ch.to_ascii_lowercase());
        } else if ch.is_whitespace() || ch == '-' {
            pending_hyphen = true;
        }
    };

    for c in text.chars() {
        match transliterate(c) {
            Some(latin) => latin.chars().for_each(|l| push(l, &mut slug)),
            None => push(c, &mut slug),
        }
    }

    slug
}

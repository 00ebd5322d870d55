use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;
use slug::slugify;

static PUNCTUATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[*+~.()'"!:|@$,?^/#&=%{}\[\]<>\\;_`]"#).unwrap());
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

const SALT_LEN: usize = 7;
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Turns a title into a URL slug. With `salt` set, a random base-36 suffix is
/// appended so the result is unique without a lookup.
///
/// ASCII titles go through the regular slugify transform. Titles containing
/// other scripts keep their characters: punctuation is stripped, whitespace
/// runs become single hyphens and one trailing hyphen is dropped. Repeated
/// hyphens are left as they are on that path.
pub fn generate_slug(title: &str, salt: bool) -> String {
    let title = title.trim();
    let stripped = PUNCTUATION.replace_all(title, "");

    let mut slug = if !title.is_empty() && title.is_ascii() {
        slugify(stripped.as_ref())
    } else {
        let mut s = WHITESPACE.replace_all(&stripped, "-").to_lowercase();
        if s.ends_with('-') {
            s.pop();
        }
        s
    };

    if salt {
        slug.push('-');
        slug.push_str(&random_suffix());
    }

    slug
}

fn random_suffix() -> String {
    let mut rng = rand::thread_rng();
    (0..SALT_LEN)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect()
}

/// Whether `slug` is `base` plus the `-xxxxxxx` suffix `generate_slug` adds
/// when salting.
pub fn is_salted_from(slug: &str, base: &str) -> bool {
    slug.strip_prefix(base)
        .and_then(|rest| rest.strip_prefix('-'))
        .map(|suffix| {
            suffix.len() == SALT_LEN
                && suffix.bytes().all(|b| b.is_ascii_digit() || b.is_ascii_lowercase())
        })
        .unwrap_or(false)
}

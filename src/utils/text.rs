// src/utils/text.rs

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

static NON_ALNUM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9]+").unwrap());

/// `@username` where the name uses the characters a username may contain.
/// The mention must start the text or follow a non-word character, so
/// e-mail addresses are not mistaken for mentions.
static MENTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|[^\w@])@([A-Za-z0-9_.+-]{3,150})").unwrap());

/// Derives a URL slug from a tag name.
///
/// Lowercases, keeps ASCII alphanumerics and collapses every other run of
/// characters into a single `-`. A name with nothing usable becomes `tag`.
pub fn slugify(name: &str) -> String {
    let lowered = name.to_lowercase();
    let slug = NON_ALNUM.replace_all(&lowered, "-");
    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        "tag".to_string()
    } else {
        slug.to_string()
    }
}

/// Distinct usernames mentioned in a comment, in sorted order.
pub fn mentioned_usernames(text: &str) -> BTreeSet<String> {
    MENTION
        .captures_iter(text)
        .map(|caps| caps[1].trim_end_matches(['.', '-', '+']).to_string())
        .filter(|name| name.len() >= 3)
        .collect()
}

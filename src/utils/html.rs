use std::collections::{HashMap, HashSet};

use ammonia::Builder;

/// Tags a post body may keep.
pub const ALLOWED_TAGS: &[&str] = &[
    "a", "b", "blockquote", "br", "code", "em", "h1", "h2", "h3", "h4", "h5", "h6", "hr", "i",
    "li", "ol", "p", "pre", "s", "strong", "u", "ul",
];

/// Attributes allowed per tag. Everything else is dropped.
pub const ALLOWED_ATTRIBUTES: &[(&str, &[&str])] = &[("a", &["href", "title"])];

pub const ALLOWED_URL_SCHEMES: &[&str] = &["http", "https", "mailto"];

fn sanitizer() -> Builder<'static> {
    let tags: HashSet<&'static str> = ALLOWED_TAGS.iter().copied().collect();
    let tag_attributes: HashMap<&'static str, HashSet<&'static str>> = ALLOWED_ATTRIBUTES
        .iter()
        .map(|(tag, attrs)| (*tag, attrs.iter().copied().collect()))
        .collect();
    let schemes: HashSet<&'static str> = ALLOWED_URL_SCHEMES.iter().copied().collect();

    let mut builder = Builder::default();
    builder
        .tags(tags)
        .tag_attributes(tag_attributes)
        .generic_attributes(HashSet::new())
        .url_schemes(schemes)
        .link_rel(Some("noopener noreferrer"));
    builder
}

/// Clean post HTML against the fixed allow-list.
///
/// `<script>` and `<style>` are removed together with their content; any
/// other disallowed tag is unwrapped and its text kept. Running the output
/// through again yields the same string.
pub fn clean_html(input: &str) -> String {
    sanitizer().clean(input).to_string()
}

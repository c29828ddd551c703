/*!
 * Narration text extraction from article HTML.
 *
 * Article documents follow a fixed, implicit layout: images, an optional
 * share bar, an optional author box, an `<h2>` title, an optional
 * `<p class="meta">` byline and then the commentary paragraphs. Only the
 * commentary is narrated, so the chrome is cut out before the remaining
 * markup is flattened to plain text.
 *
 * This is pattern-based, not a tree walk. Removals match the shortest span
 * from an opening tag to the first matching close tag, so a nested
 * `<div class="share-bar">` is cut at its first inner `</div>` and the tail
 * is left for tag stripping. The article corpus does not nest these blocks.
 */

use once_cell::sync::Lazy;
use regex::Regex;

/// Structural removals, applied in order. Later patterns are broader and
/// must not run before the narrower ones have taken their blocks out.
static CHROME_PATTERNS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    vec![
        ("image", Regex::new(r"<img[^>]*>").unwrap()),
        ("share bar", Regex::new(r#"(?s)<div class="share-bar"[^>]*>.*?</div>"#).unwrap()),
        ("author box", Regex::new(r#"(?s)<div class="author-box">.*?</div>"#).unwrap()),
        ("title", Regex::new(r"(?s)<h2>.*?</h2>").unwrap()),
        ("meta line", Regex::new(r#"(?s)<p class="meta">.*?</p>"#).unwrap()),
    ]
});

static TAG_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").unwrap());

// Unicode whitespace plus the information separators U+001C..U+001F
static WHITESPACE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\s\x1C-\x1F]+").unwrap());

/// Entities decoded for narration, in replacement order. Anything not listed
/// is passed through untouched.
pub const ENTITY_TABLE: [(&str, &str); 9] = [
    ("&bull;", "."),
    ("&amp;", "&"),
    ("&quot;", "\""),
    ("&#8217;", "'"),
    ("&#8220;", "\""),
    ("&#8221;", "\""),
    ("&nbsp;", " "),
    ("&mdash;", " \u{2014} "),
    ("&ndash;", " \u{2013} "),
];

/// Extract the narration body from an article document.
///
/// Never fails: if the expected elements are missing the matching removal is
/// a no-op, and stray fragments of malformed markup are neutralised by the
/// tag strip.
pub fn extract_narration(html: &str) -> String {
    let text = remove_chrome(html);
    let text = strip_tags(&text);
    let text = decode_entities(&text);
    collapse_whitespace(&text)
}

/// Remove images, share bar, author box, title and meta line
pub fn remove_chrome(html: &str) -> String {
    let mut text = html.to_string();
    for (_, pattern) in CHROME_PATTERNS.iter() {
        text = pattern.replace_all(&text, "").into_owned();
    }
    text
}

/// Replace every remaining tag with a single space
pub fn strip_tags(text: &str) -> String {
    TAG_REGEX.replace_all(text, " ").into_owned()
}

/// Decode the fixed entity set
pub fn decode_entities(text: &str) -> String {
    ENTITY_TABLE
        .iter()
        .fold(text.to_string(), |acc, (entity, literal)| acc.replace(entity, literal))
}

/// Collapse whitespace runs (separators included) to one space and trim both
/// ends
pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE_REGEX.replace_all(text, " ").trim().to_string()
}

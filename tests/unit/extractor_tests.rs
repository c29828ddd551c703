/*!
 * Tests for narration text extraction
 */

use anyhow::Result;
use narrator::extractor::{self, ENTITY_TABLE, extract_narration};
use narrator::narrate_file;
use narrator::phonetics::PhoneticTable;
use crate::common;

fn has_whitespace_run(text: &str) -> bool {
    let chars: Vec<char> = text.chars().collect();
    chars.windows(2).any(|pair| pair[0].is_whitespace() && pair[1].is_whitespace())
}

/// Every chrome element around a single paragraph is removed
#[test]
fn test_extract_narration_withAllChromeElements_shouldReturnOnlyBody() {
    let html = common::article_html("Breaking: a headline", "Hello world.");
    assert_eq!(extract_narration(&html), "Hello world.");
}

/// Several paragraphs are joined with single spaces
#[test]
fn test_extract_narration_withSeveralParagraphs_shouldJoinWithSpaces() {
    let html = "<h2>T</h2>\n<p>First point.</p>\n\n<p>Second\n   point.</p><p>Third&nbsp;point.</p>";
    assert_eq!(extract_narration(html), "First point. Second point. Third point.");
}

/// Whitespace is collapsed and trimmed for arbitrary inputs
#[test]
fn test_extract_narration_withVariousInputs_shouldNeverContainWhitespaceRuns() {
    let inputs = [
        "",
        "   ",
        "<p>  a  </p>  <p>\tb\n</p>",
        "&nbsp;&nbsp;x&nbsp;&nbsp;",
        "a&mdash;&mdash;b",
        "<div>\u{00A0}lead\u{00A0}\u{00A0}</div>",
        "<p>one</p><br/><br/><p>two</p>",
        "<<<>>> broken < tag",
    ];

    for input in inputs {
        let output = extract_narration(input);
        assert!(!has_whitespace_run(&output), "whitespace run in {:?} from {:?}", output, input);
        assert_eq!(output, output.trim(), "untrimmed output from {:?}", input);
    }
}

/// Running the extractor on its own output changes nothing
#[test]
fn test_extract_narration_appliedTwice_shouldBeIdempotent() {
    let html = common::article_html(
        "Title",
        "Kollox bil-qies &mdash; or so they say. &#8220;We&#8217;ll see,&#8221; said the minister &amp; his aide.",
    );
    let once = extract_narration(&html);
    let twice = extract_narration(&once);
    assert_eq!(once, twice);
    assert_eq!(once, "Kollox bil-qies \u{2014} or so they say. \"We'll see,\" said the minister & his aide.");
}

/// Each entity in the fixed table is decoded; others pass through
#[test]
fn test_decode_entities_withFixedTable_shouldReplaceEveryEntity() {
    for (entity, literal) in ENTITY_TABLE {
        let decoded = extractor::decode_entities(&format!("x{}y", entity));
        assert!(!decoded.contains(entity), "{} survived decoding", entity);
        assert_eq!(decoded, format!("x{}y", literal));
    }

    let untouched = extract_narration("<p>caf&eacute; &lt;3 &#8230;</p>");
    assert_eq!(untouched, "caf&eacute; &lt;3 &#8230;");
}

/// The bullet entity becomes a full stop
#[test]
fn test_extract_narration_withBulletEntity_shouldProducePeriod() {
    assert_eq!(extract_narration("<p>Item one &bull; item two</p>"), "Item one . item two");
}

/// Missing chrome is not an error
#[test]
fn test_extract_narration_withoutChrome_shouldKeepAllText() {
    assert_eq!(extract_narration("<p>No title here.</p>"), "No title here.");
}

/// Every occurrence of a removable element is removed, shortest span each
#[test]
fn test_extract_narration_withRepeatedTitles_shouldRemoveEach() {
    let html = "<h2>One</h2><p>keep this</p><h2>Two</h2><p>and this</p>";
    assert_eq!(extract_narration(html), "keep this and this");
}

/// A nested share bar is cut at the first closing div; the tail stays as text
#[test]
fn test_extract_narration_withNestedShareBar_shouldCutAtFirstClose() {
    let html = r#"<div class="share-bar"><div>inner</div>tail</div><p>Body.</p>"#;
    assert_eq!(extract_narration(html), "tail Body.");
}

/// Author box needs the exact class attribute and nothing else
#[test]
fn test_extract_narration_withDecoratedAuthorBox_shouldNotMatch() {
    let html = r#"<div class="author-box" id="a">Name</div><p>Body.</p>"#;
    assert_eq!(extract_narration(html), "Name Body.");
}

/// Malformed markup never panics and leaves readable text
#[test]
fn test_extract_narration_withMalformedMarkup_shouldNotFail() {
    let html = "<h2>Unclosed title <p class=\"meta\">By someone<p>Body text <b>bold";
    let output = extract_narration(html);
    assert!(output.contains("Body text"));
    assert!(!output.contains('<'));
}

/// Meta line with multi-line content is removed entirely
#[test]
fn test_extract_narration_withMultilineMeta_shouldRemoveIt() {
    let html = "<p class=\"meta\">By Someone\n&bull;\n1 May</p><p>Body.</p>";
    assert_eq!(extract_narration(html), "Body.");
}

/// Information separators collapse like any other whitespace
#[test]
fn test_extract_narration_withInformationSeparators_shouldCollapseToSpace() {
    assert_eq!(extract_narration("a\u{1C}b"), "a b");
    assert_eq!(extract_narration("<p>\u{1F}one\u{1D}\u{1E} two\u{1C}</p>"), "one two");
}

/// Fragment-only share links do not leak into the narration
#[test]
fn test_extract_narration_withFragmentShareLink_shouldDropShareBar() {
    let html = r##"<div class="share-bar" id="s"><a href="#">Share</a> <a href="#top">Top</a></div>
<h2>Headline</h2>
<p>Body text.</p>"##;
    assert_eq!(extract_narration(html), "Body text.");
}

/// Narration of an article file, with and without respelling
#[test]
fn test_narrate_file_withArticleOnDisk_shouldReturnSpokenText() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let html = common::article_html("Kollox bil-qies", "Ħabib, the permit was never needed.");
    let path = common::create_test_file(temp_dir.path(), "permit.html", &html)?;

    let table = PhoneticTable::maltese()?;
    assert_eq!(narrate_file(&path, Some(&table))?, "Habib, the permit was never needed.");
    assert_eq!(narrate_file(&path, None)?, "Ħabib, the permit was never needed.");
    assert!(narrate_file(temp_dir.path().join("missing.html"), None).is_err());
    Ok(())
}

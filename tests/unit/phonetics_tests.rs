/*!
 * Tests for phonetic respelling
 */

use anyhow::Result;
use narrator::phonetics::{PhoneticRule, PhoneticTable};
use narrator::prepare_narration;

/// Case-insensitive match on a single rule
#[test]
fn test_apply_withUppercasedPhrase_shouldReplaceCaseInsensitively() -> Result<()> {
    let table = PhoneticTable::from_pairs([("Ħabib", "Habib")])?;
    assert_eq!(table.apply("dear ĦABIB friend"), "dear Habib friend");
    Ok(())
}

/// Longer phrase listed first wins over its own fragment
#[test]
fn test_apply_withLongRuleFirst_shouldNeverUseShortRule() -> Result<()> {
    let table = PhoneticTable::from_pairs([
        ("Il-bniedem jipproponi u l-PA jiddisponi", "X"),
        ("Il-bniedem jipproponi", "Y"),
    ])?;
    let output = table.apply("Il-bniedem jipproponi u l-PA jiddisponi");
    assert!(output.contains('X'));
    assert!(!output.contains('Y'));
    Ok(())
}

/// English-only narration passes through the built-in table untouched
#[test]
fn test_maltese_withEnglishOnlyText_shouldReturnUnchanged() -> Result<()> {
    let table = PhoneticTable::maltese()?;
    let text = "The minister said the project would be finished by summer, again.";
    assert_eq!(table.apply(text), text);
    Ok(())
}

/// Built-in table handles a realistic code-switched sentence
#[test]
fn test_maltese_withCodeSwitchedSentence_shouldRespellPhrases() -> Result<()> {
    let table = PhoneticTable::maltese()?;
    let text = "Mela ejja nifhmu: il-bniedem jipproponi u l-PA jiddisponi. GĦANDNA BŻONN answers, ħabib.";
    assert_eq!(
        table.apply(text),
        "Mela eyya nifhmu: Ill bnyedem yipproponi oo l P A yiddisponi. Andna bzonn answers, Habib."
    );
    Ok(())
}

/// Fragments still fire when the full phrase is absent
#[test]
fn test_maltese_withFragmentOnly_shouldUseFallbackRule() -> Result<()> {
    let table = PhoneticTable::maltese()?;
    assert_eq!(table.apply("They say l-PA jiddisponi."), "They say l P A yiddisponi.");
    assert_eq!(table.apply("X'PAJJIŻ DAN!"), "Sh pajjiz dan!");
    Ok(())
}

/// Duplicate keys collapse without changing the net rule set
#[test]
fn test_from_pairs_withDuplicatePhrase_shouldKeepSingleRule() -> Result<()> {
    let table = PhoneticTable::from_pairs([
        ("Għandna bżonn", "Andna bzonn"),
        ("jgħid", "yid"),
        ("Għandna bżonn", "Andna bzonn"),
    ])?;
    assert_eq!(table.len(), 2);
    assert_eq!(table.rules()[0], PhoneticRule::new("Għandna bżonn", "Andna bzonn"));
    Ok(())
}

/// Rules loaded from configuration keep their order
#[test]
fn test_from_rules_withJsonRules_shouldPreserveOrder() -> Result<()> {
    let rules: Vec<PhoneticRule> = serde_json::from_str(
        r#"[{"phrase": "abc", "phonetic": "1"}, {"phrase": "ab", "phonetic": "2"}]"#,
    )?;
    let table = PhoneticTable::from_rules(&rules)?;
    assert_eq!(table.apply("abc ab"), "1 2");
    Ok(())
}

/// Full narration path: extraction first, respelling second
#[test]
fn test_prepare_narration_withMalteseArticle_shouldRespellBody() -> Result<()> {
    let table = PhoneticTable::maltese()?;
    let html = "<h2>Kollox bil-qies</h2><p class=\"meta\">By X</p><p>Kollox bil-qies, they said.</p>";
    assert_eq!(prepare_narration(html, Some(&table)), "Kollox bil ees, they said.");
    Ok(())
}

/*!
 * Phonetic respelling of code-switched phrases.
 *
 * The narration voice is English-only, so Maltese phrases embedded in the
 * commentary are rewritten into spellings it pronounces acceptably. English
 * text is left alone.
 *
 * Rules are plain case-insensitive substring substitutions applied one after
 * another in table order. A longer phrase listed before one of its own
 * sub-phrases consumes the text first, so the shorter rule never sees it for
 * that input. Precedence is table order, not phrase length.
 */

use anyhow::{Result, anyhow};
use log::debug;
use regex::{NoExpand, Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

/// A literal phrase and the spelling that replaces it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhoneticRule {
    /// Source phrase, matched case-insensitively
    pub phrase: String,
    /// Replacement, inserted literally
    pub phonetic: String,
}

impl PhoneticRule {
    pub fn new(phrase: impl Into<String>, phonetic: impl Into<String>) -> Self {
        Self {
            phrase: phrase.into(),
            phonetic: phonetic.into(),
        }
    }
}

/// Ordered, immutable rule table with one compiled matcher per rule
#[derive(Debug, Clone)]
pub struct PhoneticTable {
    rules: Vec<PhoneticRule>,
    matchers: Vec<Regex>,
}

impl PhoneticTable {
    /// Build a table from ordered pairs.
    ///
    /// Follows insertion-ordered map semantics: a phrase seen again keeps the
    /// position of its first occurrence and takes the replacement of its last.
    pub fn from_pairs<I, P, R>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (P, R)>,
        P: Into<String>,
        R: Into<String>,
    {
        let mut rules: Vec<PhoneticRule> = Vec::new();
        for (phrase, phonetic) in pairs {
            let rule = PhoneticRule::new(phrase, phonetic);
            if rule.phrase.is_empty() {
                return Err(anyhow!("Phonetic rule with empty phrase (replacement: {:?})", rule.phonetic));
            }
            match rules.iter_mut().find(|existing| existing.phrase == rule.phrase) {
                Some(existing) => {
                    debug!("Duplicate phonetic phrase '{}', keeping last replacement", rule.phrase);
                    existing.phonetic = rule.phonetic;
                }
                None => rules.push(rule),
            }
        }

        let matchers = rules
            .iter()
            .map(|rule| {
                RegexBuilder::new(&regex::escape(&rule.phrase))
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| anyhow!("Invalid phonetic phrase '{}': {}", rule.phrase, e))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { rules, matchers })
    }

    /// Build a table from already-shaped rules, same semantics as `from_pairs`
    pub fn from_rules(rules: &[PhoneticRule]) -> Result<Self> {
        Self::from_pairs(rules.iter().map(|r| (r.phrase.clone(), r.phonetic.clone())))
    }

    /// Built-in table for Maltese phrases in the commentary corpus
    pub fn maltese() -> Result<Self> {
        Self::from_pairs(MALTESE_RULES.iter().copied())
    }

    /// Apply every rule in order, replacing all case-insensitive occurrences
    pub fn apply(&self, text: &str) -> String {
        let mut output = text.to_string();
        for (rule, matcher) in self.rules.iter().zip(&self.matchers) {
            if matcher.is_match(&output) {
                debug!("Phonetic rule hit: '{}' -> '{}'", rule.phrase, rule.phonetic);
                output = matcher.replace_all(&output, NoExpand(&rule.phonetic)).into_owned();
            }
        }
        output
    }

    pub fn rules(&self) -> &[PhoneticRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

// Full phrases come before their fragments so the fragments act as fallbacks.
const MALTESE_RULES: [(&str, &str); 12] = [
    ("Mela ejja nifhmu", "Mela eyya nifhmu"),
    ("Il-bniedem jipproponi u l-PA jiddisponi", "Ill bnyedem yipproponi oo l P A yiddisponi"),
    ("Kollox bil-qies", "Kollox bil ees"),
    ("Ħalliha ma tħokx", "Halliha ma thoksh"),
    ("X'pajjiż dan", "Sh pajjiz dan"),
    ("Ħabib", "Habib"),
    ("Għandna bżonn", "Andna bzonn"),
    ("Dak li jgħid il-pjan, u dak li jagħmel il-PA", "Dak li yid il pyan, oo dak li yamel il P A"),
    ("Il-bniedem jipproponi", "Ill bnyedem yipproponi"),
    ("l-PA jiddisponi", "l P A yiddisponi"),
    ("jgħid", "yid"),
    ("jagħmel", "yamel"),
];

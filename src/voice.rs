use anyhow::{Result, anyhow};
use isolang::Language;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Neural voice identifier such as `en-GB-SoniaNeural`.
///
/// The first two dash-separated parts are the locale, the rest is the voice
/// name. The language part must be a known ISO 639-1 code; the second part
/// is kept as written, since it may be a script subtag (`sr-Latn`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VoiceId {
    language: String,
    region: String,
    name: String,
}

impl VoiceId {
    /// Locale as used in SSML `xml:lang`, e.g. `en-GB`
    pub fn locale(&self) -> String {
        format!("{}-{}", self.language, self.region)
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    /// English name of the voice language
    pub fn language_name(&self) -> &'static str {
        Language::from_639_1(&self.language)
            .map(|l| l.to_name())
            .unwrap_or("Unknown")
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl FromStr for VoiceId {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.trim().splitn(3, '-');
        let (Some(language), Some(region), Some(name)) = (parts.next(), parts.next(), parts.next()) else {
            return Err(anyhow!("Voice must look like 'en-GB-SoniaNeural', got '{}'", s));
        };

        let language = language.to_lowercase();
        if language.len() != 2 || Language::from_639_1(&language).is_none() {
            return Err(anyhow!("Unknown voice language '{}' in '{}'", language, s));
        }
        if region.is_empty() || !region.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(anyhow!("Invalid voice region '{}' in '{}'", region, s));
        }
        if name.is_empty() {
            return Err(anyhow!("Missing voice name in '{}'", s));
        }

        Ok(Self {
            language,
            region: region.to_string(),
            name: name.to_string(),
        })
    }
}

impl TryFrom<String> for VoiceId {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<VoiceId> for String {
    fn from(voice: VoiceId) -> Self {
        voice.to_string()
    }
}

impl fmt::Display for VoiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.language, self.region, self.name)
    }
}

impl Default for VoiceId {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            region: "GB".to_string(),
            name: "SoniaNeural".to_string(),
        }
    }
}

//! Article variants and their file naming.
//!
//! Every article exists as a neutral rendering `{slug}.html` plus slanted
//! renderings `{slug}_bias_{n}.html` for n in -3..=3 without zero. Audio
//! artifacts mirror the same stem with the audio extension.

use anyhow::{Result, anyhow};
use std::fmt;

const BIAS_MARKER: &str = "_bias_";

/// Bias values generated for each slug, after the neutral rendering
pub const DEFAULT_BIASES: [i8; 6] = [-3, -2, -1, 1, 2, 3];

/// Rhetorical slant of one rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tone {
    Neutral,
    Bias(i8),
}

impl Tone {
    /// Validated constructor; zero maps to neutral
    pub fn from_bias(bias: i8) -> Result<Self> {
        match bias {
            0 => Ok(Self::Neutral),
            -3..=3 => Ok(Self::Bias(bias)),
            _ => Err(anyhow!("Bias out of range (-3..=3): {}", bias)),
        }
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Neutral => write!(f, "neutral"),
            Self::Bias(n) => write!(f, "bias {:+}", n),
        }
    }
}

/// One (slug, tone) pair
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Variant {
    pub slug: String,
    pub tone: Tone,
}

impl Variant {
    pub fn neutral(slug: impl Into<String>) -> Self {
        Self { slug: slug.into(), tone: Tone::Neutral }
    }

    pub fn biased(slug: impl Into<String>, bias: i8) -> Result<Self> {
        Ok(Self { slug: slug.into(), tone: Tone::from_bias(bias)? })
    }

    /// Shared file stem of input and output
    pub fn stem(&self) -> String {
        match self.tone {
            Tone::Neutral => self.slug.clone(),
            Tone::Bias(n) => format!("{}{}{}", self.slug, BIAS_MARKER, n),
        }
    }

    pub fn input_file_name(&self) -> String {
        format!("{}.html", self.stem())
    }

    pub fn output_file_name(&self, audio_extension: &str) -> String {
        format!("{}.{}", self.stem(), audio_extension.trim_start_matches('.'))
    }

    /// Parse an article file name back into its variant
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let stem = file_name.strip_suffix(".html")?;
        if stem.is_empty() {
            return None;
        }
        match stem.rsplit_once(BIAS_MARKER) {
            Some((slug, bias)) if !slug.is_empty() => {
                let bias = bias.parse::<i8>().ok()?;
                match Tone::from_bias(bias).ok()? {
                    Tone::Neutral => None,
                    tone => Some(Self { slug: slug.to_string(), tone }),
                }
            }
            Some(_) => None,
            None => Some(Self::neutral(stem)),
        }
    }

    /// Expand slugs into the processing order: per slug, neutral then each bias
    pub fn expand(slugs: &[String], biases: &[i8]) -> Result<Vec<Self>> {
        let mut variants = Vec::with_capacity(slugs.len() * (biases.len() + 1));
        for slug in slugs {
            variants.push(Self::neutral(slug.clone()));
            for &bias in biases {
                variants.push(Self::biased(slug.clone(), bias)?);
            }
        }
        Ok(variants)
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.slug, self.tone)
    }
}

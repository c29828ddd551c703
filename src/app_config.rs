use anyhow::{anyhow, Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::default::Default;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use url::Url;

use crate::phonetics::{PhoneticRule, PhoneticTable};
use crate::variant::DEFAULT_BIASES;
use crate::voice::VoiceId;

/// Application configuration module
/// This module handles loading, validating and saving the settings of one
/// narration run. The configuration is built once at start-up and passed to
/// the controller; nothing in the pipeline mutates it.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Voice used for every article of the run
    #[serde(default)]
    pub voice: VoiceId,

    /// Directory holding `{slug}.html` and `{slug}_bias_{n}.html`
    #[serde(default = "default_articles_dir")]
    pub articles_dir: PathBuf,

    /// Directory receiving generated audio
    #[serde(default = "default_audio_dir")]
    pub audio_dir: PathBuf,

    /// Extension of generated audio files
    #[serde(default = "default_audio_extension")]
    pub audio_extension: String,

    /// Article slugs, processed in order. Empty means discover them from
    /// `articles_dir`.
    #[serde(default = "default_slugs")]
    pub slugs: Vec<String>,

    /// Bias renderings generated after each neutral one
    #[serde(default = "default_biases")]
    pub biases: Vec<i8>,

    /// Pipeline behaviour
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Phonetic respelling
    #[serde(default)]
    pub phonetics: PhoneticsConfig,

    /// Speech service
    #[serde(default)]
    pub speech: SpeechConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Skip rules, retries and parallelism
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PipelineConfig {
    /// Extracted text shorter than this (in characters) is not narrated
    #[serde(default = "default_min_narration_chars")]
    pub min_narration_chars: usize,

    /// Treat a zero-byte output file as missing
    #[serde(default = "default_true")]
    pub require_non_empty_output: bool,

    /// Maximum number of variants synthesized at once
    #[serde(default = "default_concurrent_requests")]
    pub concurrent_requests: usize,

    /// Retry count for transient synthesis failures
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Backoff base for retries (in milliseconds), doubled on each retry
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            min_narration_chars: default_min_narration_chars(),
            require_non_empty_output: true,
            concurrent_requests: default_concurrent_requests(),
            retry_count: default_retry_count(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

/// Phonetic rule settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PhoneticsConfig {
    /// Apply phonetic rules before synthesis
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Ordered rules; empty means the built-in Maltese table
    #[serde(default)]
    pub rules: Vec<PhoneticRule>,
}

impl Default for PhoneticsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            rules: Vec::new(),
        }
    }
}

/// Azure Speech service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SpeechConfig {
    /// Service region, e.g. "westeurope"
    #[serde(default = "default_region")]
    pub region: String,

    /// Subscription key
    #[serde(default = "String::new")]
    pub api_key: String,

    /// Endpoint override; empty means the regional endpoint
    #[serde(default = "String::new")]
    pub endpoint: String,

    /// Value of the X-Microsoft-OutputFormat header
    #[serde(default = "default_output_format")]
    pub output_format: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            region: default_region(),
            api_key: String::new(),
            endpoint: String::new(),
            output_format: default_output_format(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl SpeechConfig {
    /// Get the synthesis endpoint, falling back to the regional one
    pub fn get_endpoint(&self) -> String {
        if !self.endpoint.is_empty() {
            return self.endpoint.clone();
        }
        format!("https://{}.tts.speech.microsoft.com/cognitiveservices/v1", self.region)
    }
}

/// Values given on the command line, layered over the configuration file
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub voice: Option<String>,
    pub articles_dir: Option<PathBuf>,
    pub audio_dir: Option<PathBuf>,
    pub api_key: Option<String>,
    pub region: Option<String>,
    pub concurrent_requests: Option<usize>,
    /// Replaces the configured slug list when non-empty
    pub slugs: Vec<String>,
    pub no_phonetics: bool,
    pub log_level: Option<LogLevel>,
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

fn default_articles_dir() -> PathBuf {
    PathBuf::from("articles")
}

fn default_audio_dir() -> PathBuf {
    PathBuf::from("audio")
}

fn default_audio_extension() -> String {
    "mp3".to_string()
}

fn default_slugs() -> Vec<String> {
    [
        "police-academy-venue",
        "labour-hides-deputy",
        "vacant-grants-panther",
        "labour-rent-respect",
        "fawwara-quarry",
        "fantasy-funpark",
        "building-permits-labour-rent",
        "eurovision-exodus",
        "cultural-leave",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_biases() -> Vec<i8> {
    DEFAULT_BIASES.to_vec()
}

fn default_min_narration_chars() -> usize {
    50
}

fn default_concurrent_requests() -> usize {
    1
}

fn default_retry_count() -> u32 {
    2
}

fn default_retry_backoff_ms() -> u64 {
    1000
}

fn default_true() -> bool {
    true
}

fn default_region() -> String {
    "westeurope".to_string()
}

fn default_output_format() -> String {
    "audio-24khz-48kbitrate-mono-mp3".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

impl Config {
    /// Load the configuration file, or write and return the default one when
    /// the file does not exist yet
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            let file = File::open(path)
                .with_context(|| format!("Failed to open config file: {:?}", path))?;
            let reader = BufReader::new(file);
            return serde_json::from_reader(reader)
                .with_context(|| format!("Failed to parse config file: {:?}", path));
        }

        warn!("Config file not found at {:?}, creating default config.", path);
        let config = Config::default();
        let config_json = serde_json::to_string_pretty(&config)
            .context("Failed to serialize default config to JSON")?;
        std::fs::write(path, config_json)
            .with_context(|| format!("Failed to write default config to file: {:?}", path))?;
        Ok(config)
    }

    /// Load the configuration file if present, defaults otherwise. Never
    /// writes to disk.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::load_or_create(path)
        } else {
            Ok(Config::default())
        }
    }

    /// Layer command-line values over the loaded configuration
    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) -> Result<()> {
        if let Some(voice) = &overrides.voice {
            self.voice = voice.parse::<VoiceId>()?;
        }
        if let Some(dir) = &overrides.articles_dir {
            self.articles_dir = dir.clone();
        }
        if let Some(dir) = &overrides.audio_dir {
            self.audio_dir = dir.clone();
        }
        if let Some(api_key) = &overrides.api_key {
            self.speech.api_key = api_key.clone();
        }
        if let Some(region) = &overrides.region {
            self.speech.region = region.clone();
        }
        if let Some(concurrency) = overrides.concurrent_requests {
            self.pipeline.concurrent_requests = concurrency;
        }
        if !overrides.slugs.is_empty() {
            self.slugs = overrides.slugs.clone();
        }
        if overrides.no_phonetics {
            self.phonetics.enabled = false;
        }
        if let Some(log_level) = &overrides.log_level {
            self.log_level = log_level.clone();
        }
        Ok(())
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        if self.audio_extension.trim_start_matches('.').is_empty() {
            return Err(anyhow!("Audio extension must not be empty"));
        }

        let mut seen = HashSet::new();
        for &bias in &self.biases {
            if bias == 0 || !(-3..=3).contains(&bias) {
                return Err(anyhow!("Bias values must be in -3..=3 and non-zero, got {}", bias));
            }
            if !seen.insert(bias) {
                return Err(anyhow!("Duplicate bias value: {}", bias));
            }
        }

        if self.slugs.iter().any(|s| s.trim().is_empty()) {
            return Err(anyhow!("Slug list contains an empty entry"));
        }

        if self.pipeline.concurrent_requests == 0 {
            return Err(anyhow!("concurrent_requests must be at least 1"));
        }

        if !self.speech.endpoint.is_empty() {
            Url::parse(&self.speech.endpoint)
                .with_context(|| format!("Invalid speech endpoint: {}", self.speech.endpoint))?;
        } else if self.speech.region.trim().is_empty() {
            return Err(anyhow!("Speech region is required when no endpoint is set"));
        }

        self.phonetic_table()?;

        Ok(())
    }

    /// Credentials are only needed when audio is actually synthesized
    pub fn validate_credentials(&self) -> Result<()> {
        if self.speech.api_key.is_empty() {
            return Err(anyhow!("Speech API key is required (config 'speech.api_key' or --api-key)"));
        }
        Ok(())
    }

    /// Build the phonetic table, or None when phonetics are disabled
    pub fn phonetic_table(&self) -> Result<Option<PhoneticTable>> {
        if !self.phonetics.enabled {
            return Ok(None);
        }
        let table = if self.phonetics.rules.is_empty() {
            PhoneticTable::maltese()?
        } else {
            PhoneticTable::from_rules(&self.phonetics.rules)?
        };
        Ok(Some(table))
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            voice: VoiceId::default(),
            articles_dir: default_articles_dir(),
            audio_dir: default_audio_dir(),
            audio_extension: default_audio_extension(),
            slugs: default_slugs(),
            biases: default_biases(),
            pipeline: PipelineConfig::default(),
            phonetics: PhoneticsConfig::default(),
            speech: SpeechConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}

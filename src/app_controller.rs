use anyhow::{Result, anyhow};
use bytes::Bytes;
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, error, info, warn, Level};
use rand::Rng;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::app_config::Config;
use crate::errors::{ProviderError, SkipReason};
use crate::extractor;
use crate::file_utils::FileManager;
use crate::phonetics::PhoneticTable;
use crate::providers::SpeechProvider;
use crate::variant::Variant;

// @module: Application controller for article narration

const ISSUES_LOG_FILE: &str = "narrator.issues.log";

/// Per-invocation switches that are not part of the configuration file
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Regenerate audio even when the output already exists
    pub force_overwrite: bool,
    /// Run every check but never call the provider
    pub dry_run: bool,
    /// Draw a progress bar on stderr
    pub show_progress: bool,
}

/// What happened to one variant
#[derive(Debug, Clone, PartialEq)]
pub enum VariantOutcome {
    Skipped(SkipReason),
    /// Dry run: would have been synthesized
    Planned { chars: usize },
    Generated { bytes: u64 },
    Failed(String),
}

/// Outcome of one variant
#[derive(Debug, Clone)]
pub struct VariantReport {
    pub variant: Variant,
    pub outcome: VariantOutcome,
}

/// Outcomes of a whole run, in table order
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub reports: Vec<VariantReport>,
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn generated(&self) -> usize {
        self.reports.iter().filter(|r| matches!(r.outcome, VariantOutcome::Generated { .. })).count()
    }

    pub fn planned(&self) -> usize {
        self.reports.iter().filter(|r| matches!(r.outcome, VariantOutcome::Planned { .. })).count()
    }

    pub fn failed(&self) -> usize {
        self.reports.iter().filter(|r| matches!(r.outcome, VariantOutcome::Failed(_))).count()
    }

    pub fn skipped(&self, reason: SkipReason) -> usize {
        self.reports.iter().filter(|r| r.outcome == VariantOutcome::Skipped(reason)).count()
    }

    pub fn outcome_of(&self, variant: &Variant) -> Option<&VariantOutcome> {
        self.reports.iter().find(|r| &r.variant == variant).map(|r| &r.outcome)
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} variants in {:.1}s: {} generated, {} planned, {} existing, {} without source, {} too short, {} failed",
            self.reports.len(),
            self.elapsed.as_secs_f64(),
            self.generated(),
            self.planned(),
            self.skipped(SkipReason::AlreadySatisfied),
            self.skipped(SkipReason::MissingInput),
            self.skipped(SkipReason::DegenerateContent),
            self.failed()
        )
    }
}

/// Extract narration from article HTML and apply phonetic rules when given
pub fn prepare_narration(html: &str, phonetics: Option<&PhoneticTable>) -> String {
    let text = extractor::extract_narration(html);
    match phonetics {
        Some(table) => table.apply(&text),
        None => text,
    }
}

/// Narration text of one article file, as it would be spoken
pub fn narrate_file<P: AsRef<Path>>(path: P, phonetics: Option<&PhoneticTable>) -> Result<String> {
    let path = path.as_ref();
    if !FileManager::file_exists(path) {
        return Err(anyhow!("Input file does not exist: {:?}", path));
    }
    let html = FileManager::read_to_string(path)?;
    Ok(prepare_narration(&html, phonetics))
}

/// Main application controller for article narration
pub struct Controller {
    // @field: App configuration
    pub config: Config,
    // @field: Speech synthesis backend
    provider: Arc<dyn SpeechProvider>,
    // @field: Built once from the configuration
    phonetics: Option<PhoneticTable>,
    // @field: Per-invocation switches
    options: RunOptions,
}

impl Controller {
    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config, provider: Arc<dyn SpeechProvider>) -> Result<Self> {
        let phonetics = config.phonetic_table()?;
        Ok(Self {
            config,
            provider,
            phonetics,
            options: RunOptions::default(),
        })
    }

    pub fn with_options(mut self, options: RunOptions) -> Self {
        self.options = options;
        self
    }

    pub fn phonetics(&self) -> Option<&PhoneticTable> {
        self.phonetics.as_ref()
    }

    /// Variants to process, in order. Slugs come from the configuration, or
    /// from the articles directory when none are configured.
    pub fn variants(&self) -> Result<Vec<Variant>> {
        let slugs = if self.config.slugs.is_empty() {
            let discovered = FileManager::discover_slugs(&self.config.articles_dir)?;
            info!("Discovered {} article(s) in {:?}", discovered.len(), self.config.articles_dir);
            discovered
        } else {
            self.config.slugs.clone()
        };
        Variant::expand(&slugs, &self.config.biases)
    }

    pub fn input_path(&self, variant: &Variant) -> PathBuf {
        self.config.articles_dir.join(variant.input_file_name())
    }

    pub fn output_path(&self, variant: &Variant) -> PathBuf {
        self.config.audio_dir.join(variant.output_file_name(&self.config.audio_extension))
    }

    /// Run the whole variant table. Individual failures are recorded in the
    /// summary and never abort the run.
    pub async fn run(&self) -> Result<RunSummary> {
        let start_time = Instant::now();
        let variants = self.variants()?;

        if !self.options.dry_run {
            FileManager::ensure_dir(&self.config.audio_dir)?;
        }

        info!(
            "Narrating {} variant(s) with {} ({}) via {}{}",
            variants.len(),
            self.config.voice,
            self.config.voice.language_name(),
            self.provider.name(),
            if self.options.dry_run { " (dry run)" } else { "" }
        );
        match self.phonetics() {
            Some(table) => info!("Phonetic respelling: {} rule(s)", table.len()),
            None => info!("Phonetic respelling disabled"),
        }

        let progress = self.progress_bar(variants.len() as u64);
        let concurrency = self.config.pipeline.concurrent_requests.max(1);

        let mut indexed: Vec<(usize, VariantReport)> = stream::iter(variants.into_iter().enumerate())
            .map(|(index, variant)| {
                let progress = progress.clone();
                async move {
                    let outcome = self.process_variant(&variant, &progress).await;
                    progress.inc(1);
                    (index, VariantReport { variant, outcome })
                }
            })
            .buffer_unordered(concurrency)
            .collect()
            .await;

        progress.finish_and_clear();
        indexed.sort_by_key(|(index, _)| *index);

        let summary = RunSummary {
            reports: indexed.into_iter().map(|(_, report)| report).collect(),
            elapsed: start_time.elapsed(),
        };

        if summary.failed() > 0 {
            warn!("{}", summary);
            warn!("Failed variants are retried on the next run; details in {:?}", self.issues_log_path());
        } else {
            info!("{}", summary);
        }

        Ok(summary)
    }

    /// Process one variant: skip checks, extraction, synthesis, write
    pub async fn process_variant(&self, variant: &Variant, progress: &ProgressBar) -> VariantOutcome {
        let output_path = self.output_path(variant);
        let output_name = variant.output_file_name(&self.config.audio_extension);
        let input_name = variant.input_file_name();

        if !self.options.force_overwrite
            && FileManager::output_satisfied(&output_path, self.config.pipeline.require_non_empty_output)
        {
            status(progress, Level::Info, format!("SKIP (exists): {}", output_name));
            return VariantOutcome::Skipped(SkipReason::AlreadySatisfied);
        }

        let input_path = self.input_path(variant);
        if !FileManager::file_exists(&input_path) {
            status(progress, Level::Info, format!("SKIP (no source): {}", input_name));
            return VariantOutcome::Skipped(SkipReason::MissingInput);
        }

        let html = match FileManager::read_to_string(&input_path) {
            Ok(html) => html,
            Err(e) => return self.fail(variant, progress, format!("{:#}", e)),
        };

        let extracted = extractor::extract_narration(&html);
        let chars = extracted.chars().count();
        if chars < self.config.pipeline.min_narration_chars {
            status(progress, Level::Warn, format!("SKIP (too short): {} ({} chars)", input_name, chars));
            return VariantOutcome::Skipped(SkipReason::DegenerateContent);
        }

        let text = match &self.phonetics {
            Some(table) => table.apply(&extracted),
            None => extracted,
        };
        let chars = text.chars().count();

        if self.options.dry_run {
            status(progress, Level::Info, format!("WOULD GENERATE: {} ({} chars)", output_name, chars));
            return VariantOutcome::Planned { chars };
        }

        status(progress, Level::Info, format!("GENERATING: {} ({} chars)...", output_name, chars));
        progress.set_message(output_name.clone());

        let audio = match self.synthesize_with_retry(variant, &text).await {
            Ok(audio) => audio,
            Err(e) => return self.fail(variant, progress, e.to_string()),
        };

        if let Err(e) = FileManager::write_atomic(&output_path, &audio) {
            return self.fail(variant, progress, format!("{:#}", e));
        }

        let bytes = audio.len() as u64;
        status(progress, Level::Info, format!("  OK: {} KB", bytes / 1024));
        VariantOutcome::Generated { bytes }
    }

    /// Call the provider, retrying transient failures with exponential backoff
    async fn synthesize_with_retry(&self, variant: &Variant, text: &str) -> Result<Bytes, ProviderError> {
        let retry_count = self.config.pipeline.retry_count;
        let mut attempt = 0;
        loop {
            match self.provider.synthesize(text, &self.config.voice).await {
                Ok(audio) if audio.is_empty() => return Err(ProviderError::EmptyAudio),
                Ok(audio) => return Ok(audio),
                Err(e) if e.is_transient() && attempt < retry_count => {
                    let delay = retry_delay(self.config.pipeline.retry_backoff_ms, attempt, &e);
                    warn!(
                        "Synthesis of {} failed ({}), retry {}/{} in {:?}",
                        variant, e, attempt + 1, retry_count, delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn fail(&self, variant: &Variant, progress: &ProgressBar, message: String) -> VariantOutcome {
        status(progress, Level::Error, format!("  ERROR: {}", message));
        let entry = format!("{} [{}]: {}", variant, self.provider.name(), message);
        if let Err(e) = FileManager::append_to_log_file(self.issues_log_path(), &entry) {
            debug!("Could not record failure in issues log: {}", e);
        }
        VariantOutcome::Failed(message)
    }

    fn issues_log_path(&self) -> PathBuf {
        self.config.audio_dir.join(ISSUES_LOG_FILE)
    }

    fn progress_bar(&self, total: u64) -> ProgressBar {
        if !self.options.show_progress {
            return ProgressBar::hidden();
        }
        let progress_bar = ProgressBar::new(total);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} variants {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(style.progress_chars("=>-"));
        progress_bar
    }
}

/// Log a status line without tearing the progress bar
fn status(progress: &ProgressBar, level: Level, message: String) {
    progress.suspend(|| match level {
        Level::Error => error!("{}", message),
        Level::Warn => warn!("{}", message),
        _ => info!("{}", message),
    });
}

/// Delay before retry number `attempt + 1`: base doubled per attempt plus up
/// to a quarter of the base as jitter, never shorter than a server hint
fn retry_delay(base_ms: u64, attempt: u32, error: &ProviderError) -> Duration {
    let backoff = base_ms.saturating_mul(1u64 << attempt.min(16));
    let jitter = rand::rng().random_range(0..=base_ms / 4);
    let mut delay_ms = backoff.saturating_add(jitter);
    if let ProviderError::RateLimitExceeded { retry_after_secs: Some(secs), .. } = error {
        delay_ms = delay_ms.max(secs.saturating_mul(1000));
    }
    Duration::from_millis(delay_ms)
}

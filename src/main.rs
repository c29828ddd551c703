// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Result, Context};
use log::{info, LevelFilter, Log, Metadata, Record, Level, SetLoggerError};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use clap::{Args, Parser, ValueEnum, CommandFactory, Subcommand};
use clap_complete::{generate, Shell};

use narrator::app_config::{self, Config, ConfigOverrides};
use narrator::providers::azure::AzureSpeech;
use narrator::{Controller, RunOptions, narrate_file};

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

fn level_filter(level: &app_config::LogLevel) -> LevelFilter {
    match level {
        app_config::LogLevel::Error => LevelFilter::Error,
        app_config::LogLevel::Warn => LevelFilter::Warn,
        app_config::LogLevel::Info => LevelFilter::Info,
        app_config::LogLevel::Debug => LevelFilter::Debug,
        app_config::LogLevel::Trace => LevelFilter::Trace,
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate audio for every article variant (default command)
    Generate(GenerateArgs),

    /// Print the narration text of one article, as it would be spoken
    Extract {
        /// Article HTML file
        #[arg(value_name = "HTML_FILE")]
        input_file: PathBuf,

        /// Print the text without phonetic respelling
        #[arg(long)]
        no_phonetics: bool,

        /// Configuration file path (for phonetic rules)
        #[arg(short, long, default_value = "narrator.json")]
        config_path: String,
    },

    /// Generate shell completions for narrator
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// Regenerate audio even if the output file exists
    #[arg(short, long)]
    force_overwrite: bool,

    /// Check every variant but do not call the speech service
    #[arg(long)]
    dry_run: bool,

    /// Skip phonetic respelling of Maltese phrases
    #[arg(long)]
    no_phonetics: bool,

    /// Only process these slugs (repeatable)
    #[arg(short, long = "slug", value_name = "SLUG")]
    slugs: Vec<String>,

    /// Voice identifier (e.g. 'en-GB-SoniaNeural')
    #[arg(short, long)]
    voice: Option<String>,

    /// Directory holding the article HTML files
    #[arg(long)]
    articles_dir: Option<PathBuf>,

    /// Directory receiving the audio files
    #[arg(long)]
    audio_dir: Option<PathBuf>,

    /// Speech service subscription key
    #[arg(long, env = "AZURE_SPEECH_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Speech service region
    #[arg(long, env = "AZURE_SPEECH_REGION")]
    region: Option<String>,

    /// Number of variants synthesized at once
    #[arg(short = 'j', long)]
    concurrency: Option<usize>,

    /// Configuration file path
    #[arg(short, long, default_value = "narrator.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,

    /// Disable the progress bar
    #[arg(long)]
    no_progress: bool,
}

/// Narrator - spoken audio for commentary articles
///
/// Converts HTML commentary articles and their tone variants into narrated
/// audio files with a neural text-to-speech voice.
#[derive(Parser, Debug)]
#[command(name = "narrator")]
#[command(version)]
#[command(about = "Narrate HTML commentary articles with a neural TTS voice")]
#[command(args_conflicts_with_subcommands = true)]
#[command(long_about = "Narrator extracts the commentary body of each article variant and synthesizes it to audio.

EXAMPLES:
    narrator                                   # Generate missing audio using narrator.json
    narrator -f                                # Regenerate everything
    narrator --dry-run                         # Show what would be generated
    narrator -s eurovision-exodus              # Only one article (all tone variants)
    narrator --no-phonetics                    # Skip Maltese respelling
    narrator extract articles/fawwara-quarry.html   # Proofread narration text
    narrator completions bash > narrator.bash  # Generate bash completions

CONFIGURATION:
    Configuration is stored in narrator.json by default. If the file doesn't
    exist, a default one is created. The subscription key can also be given
    through AZURE_SPEECH_KEY.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    generate: GenerateArgs,
}

// @struct: Custom logger implementation. Filters on `log::max_level()` only,
// so the level can be raised after the configuration is loaded.
struct CustomLogger;

impl CustomLogger {
    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        log::set_boxed_logger(Box::new(CustomLogger))?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI colour for level
    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "{}{} {:<5} {}\x1B[0m",
                Self::color_for_level(record.level()),
                now,
                record.level(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Info until the configuration says otherwise
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();

    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "narrator", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::Extract { input_file, no_phonetics, config_path }) => {
            run_extract(&input_file, no_phonetics, &config_path)
        }
        Some(Commands::Generate(args)) => run_generate(args).await,
        None => run_generate(cli.generate).await,
    }
}

impl GenerateArgs {
    /// Command-line values that take precedence over the configuration file
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            voice: self.voice.clone(),
            articles_dir: self.articles_dir.clone(),
            audio_dir: self.audio_dir.clone(),
            api_key: self.api_key.clone(),
            region: self.region.clone(),
            concurrent_requests: self.concurrency,
            slugs: self.slugs.clone(),
            no_phonetics: self.no_phonetics,
            log_level: self.log_level.clone().map(Into::into),
        }
    }
}

async fn run_generate(options: GenerateArgs) -> Result<()> {
    if let Some(cmd_log_level) = &options.log_level {
        log::set_max_level(level_filter(&cmd_log_level.clone().into()));
    }

    let mut config = Config::load_or_create(&options.config_path)?;
    config.apply_overrides(&options.overrides())?;
    config.validate().context("Configuration validation failed")?;

    if options.log_level.is_none() {
        log::set_max_level(level_filter(&config.log_level));
    }

    if !options.dry_run {
        config.validate_credentials()?;
    }

    let provider = Arc::new(AzureSpeech::from_config(&config.speech));
    info!("Speech endpoint: {}", provider.endpoint());

    let run_options = RunOptions {
        force_overwrite: options.force_overwrite,
        dry_run: options.dry_run,
        show_progress: !options.no_progress,
    };
    let controller = Controller::with_config(config, provider)?.with_options(run_options);

    // Per-variant failures are in the summary; the run itself succeeded
    controller.run().await?;
    Ok(())
}

fn run_extract(input_file: &Path, no_phonetics: bool, config_path: &str) -> Result<()> {
    let mut config = Config::load_or_default(config_path)?;
    if no_phonetics {
        config.phonetics.enabled = false;
    }

    let phonetics = config.phonetic_table()?;
    let text = narrate_file(input_file, phonetics.as_ref())?;

    let mut stdout = std::io::stdout();
    writeln!(stdout, "{}", text)?;
    info!("{} characters", text.chars().count());
    Ok(())
}

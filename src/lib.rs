/*!
 * # Narrator - spoken audio for commentary articles
 *
 * A Rust library and CLI that turns pre-authored HTML commentary articles
 * into narrated audio files through a neural text-to-speech voice.
 *
 * ## Features
 *
 * - Extract only the commentary body from article HTML (no title, byline,
 *   share bar or images)
 * - Respell Maltese phrases so an English voice pronounces them acceptably
 * - Generate every tone variant of every article (`{slug}.html`,
 *   `{slug}_bias_{n}.html`)
 * - Resume safely: existing audio is skipped, failures are retried next run
 * - Optional bounded concurrency and retry of transient service errors
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `extractor`: HTML to narration text
 * - `phonetics`: ordered phonetic rule table
 * - `variant`: article variants and file naming
 * - `voice`: voice identifiers
 * - `app_config`: Configuration management
 * - `file_utils`: File system operations
 * - `app_controller`: Variant loop, skip rules and run summary
 * - `providers`: Speech synthesis clients:
 *   - `providers::azure`: Azure Speech REST client
 *   - `providers::mock`: Scripted provider for tests
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod errors;
pub mod extractor;
pub mod file_utils;
pub mod phonetics;
pub mod providers;
pub mod variant;
pub mod voice;

// Re-export main types for easier usage
pub use app_config::{Config, ConfigOverrides};
pub use app_controller::{Controller, RunOptions, RunSummary, VariantOutcome, narrate_file, prepare_narration};
pub use errors::{ProviderError, SkipReason};
pub use extractor::extract_narration;
pub use phonetics::{PhoneticRule, PhoneticTable};
pub use variant::{Tone, Variant};
pub use voice::VoiceId;

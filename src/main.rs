// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{anyhow, Result};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{warn, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;
use std::path::{Path, PathBuf};

use capwai::app_config::{self, Config, TranslationProvider};
use capwai::app_controller::{Controller, EventOutput};
use capwai::translation::SpeedMode;

/// CLI Wrapper for TranslationProvider to implement ValueEnum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliTranslationProvider {
    Gemini,
    Anthropic,
    Ollama,
}

impl From<CliTranslationProvider> for TranslationProvider {
    fn from(cli_provider: CliTranslationProvider) -> Self {
        match cli_provider {
            CliTranslationProvider::Gemini => TranslationProvider::Gemini,
            CliTranslationProvider::Anthropic => TranslationProvider::Anthropic,
            CliTranslationProvider::Ollama => TranslationProvider::Ollama,
        }
    }
}

/// CLI Wrapper for SpeedMode to implement ValueEnum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliSpeedMode {
    Fast,
    Stable,
}

impl From<CliSpeedMode> for SpeedMode {
    fn from(cli_mode: CliSpeedMode) -> Self {
        match cli_mode {
            CliSpeedMode::Fast => SpeedMode::Fast,
            CliSpeedMode::Stable => SpeedMode::Stable,
        }
    }
}

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, Copy, ValueEnum)]
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

/// CLI Wrapper for EventOutput to implement ValueEnum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliEventOutput {
    Progress,
    Json,
    Log,
}

impl From<CliEventOutput> for EventOutput {
    fn from(cli_output: CliEventOutput) -> Self {
        match cli_output {
            CliEventOutput::Progress => EventOutput::Progress,
            CliEventOutput::Json => EventOutput::Json,
            CliEventOutput::Log => EventOutput::Log,
        }
    }
}

/// Options shared by every command
#[derive(Args, Debug)]
struct GlobalArgs {
    /// Configuration file path
    #[arg(short, long, default_value = "conf.json", global = true)]
    config_path: PathBuf,

    /// Translation provider to use
    #[arg(short, long, value_enum, global = true)]
    provider: Option<CliTranslationProvider>,

    /// Model name to use for translation
    #[arg(short, long, global = true)]
    model: Option<String>,

    /// API key for the provider
    #[arg(long, env = "CAPWAI_API_KEY", hide_env_values = true, global = true)]
    api_key: Option<String>,

    /// Source language code (e.g., 'en', 'es', 'fr')
    #[arg(short, long, global = true)]
    source_language: Option<String>,

    /// Target language code (e.g., 'ko', 'ja', 'fr')
    #[arg(short, long, global = true)]
    target_language: Option<String>,

    /// Batch dispatch mode
    #[arg(long, value_enum, global = true)]
    mode: Option<CliSpeedMode>,

    /// Do not read or write the result cache
    #[arg(long, global = true)]
    no_cache: bool,

    /// How to show progress events
    #[arg(long, value_enum, default_value = "progress", global = true)]
    events: CliEventOutput,

    /// Set logging level
    #[arg(short, long, value_enum, global = true)]
    log_level: Option<CliLogLevel>,
}

#[derive(Subcommand, Debug)]
enum CacheAction {
    /// Show what the result cache holds
    Stats,
    /// Remove every cached translation for the target language
    Clear,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Translate a caption file or a directory of caption files (default command)
    Translate(TranslateArgs),

    /// Translate one sentence with its surrounding context
    Sentence {
        /// Sentence to translate
        #[arg(long)]
        current: String,
        /// Preceding context
        #[arg(long, default_value = "")]
        prev: String,
        /// Following context
        #[arg(long, default_value = "")]
        next: String,
    },

    /// Check that the configured provider answers
    TestConnection,

    /// Write a plain-text transcript of a caption file
    Transcript {
        /// Caption file
        #[arg(value_name = "INPUT_PATH")]
        input_path: PathBuf,
        /// Directory for the transcript (defaults to the input's directory)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// Import a translation produced elsewhere
    Import {
        /// Translated JSON file
        #[arg(value_name = "TRANSLATED_PATH")]
        translated_path: PathBuf,
        /// Source captions the translation belongs to; stores it in the cache
        #[arg(long)]
        source: Option<PathBuf>,
        /// Write the normalized captions here
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Inspect or clear the result cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Generate shell completions for capwai
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args, Debug)]
struct TranslateArgs {
    /// Caption JSON file or directory to process
    #[arg(value_name = "INPUT_PATH")]
    input_path: PathBuf,

    /// Directory for translated files (defaults to the input's directory)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Force overwrite of existing output files
    #[arg(short, long)]
    force_overwrite: bool,
}

/// capwai - Caption translation with AI
///
/// Translates timed lecture captions in chunks, caches complete results by
/// content fingerprint, and translates live sentences with context.
#[derive(Parser, Debug)]
#[command(name = "capwai")]
#[command(version)]
#[command(about = "AI-powered caption translation tool")]
#[command(long_about = "capwai translates timed caption lists (JSON arrays of {startInSeconds, endInSeconds, text}) using AI providers.

EXAMPLES:
    capwai lecture.json                          # Translate using default config
    capwai -f lecture.json                       # Force overwrite existing output
    capwai --mode fast -t ja lecture.json        # Parallel dispatch into Japanese
    capwai --events json lecture.json            # Print events as JSON lines
    capwai sentence --current \"the bias term\"   # Translate one sentence
    capwai cache stats                           # Inspect the result cache
    capwai completions bash > capwai.bash        # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. If the file does not exist,
    a default one is created. The API key may also come from CAPWAI_API_KEY.

SUPPORTED PROVIDERS:
    gemini    - Google Gemini API (default: gemini-2.0-flash-lite, requires API key)
    anthropic - Anthropic Claude API (requires API key)
    ollama    - Local Ollama server (default: llama3.2:3b)")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    global: GlobalArgs,

    /// Caption JSON file or directory to process
    #[arg(value_name = "INPUT_PATH")]
    input_path: Option<PathBuf>,

    /// Directory for translated files
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Force overwrite of existing output files
    #[arg(short, long)]
    force_overwrite: bool,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        log::set_boxed_logger(Box::new(CustomLogger { level: LevelFilter::Trace }))?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI color and tag for a level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("\x1B[1;31m", "ERROR"),
            Level::Warn => ("\x1B[1;33m", "WARN "),
            Level::Info => ("\x1B[1;32m", "INFO "),
            Level::Debug => ("\x1B[1;36m", "DEBUG"),
            Level::Trace => ("\x1B[1;35m", "TRACE"),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level && metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let (color, tag) = Self::style_for_level(record.level());
            let _ = writeln!(std::io::stderr(), "{}{} {} {}\x1B[0m", color, now, tag, record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();
    let global = cli.global;

    let command = match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "capwai", &mut std::io::stdout());
            return Ok(());
        }
        Some(command) => command,
        None => {
            let input_path = cli
                .input_path
                .ok_or_else(|| anyhow!("INPUT_PATH is required when no subcommand is specified"))?;
            Commands::Translate(TranslateArgs {
                input_path,
                output_dir: cli.output_dir,
                force_overwrite: cli.force_overwrite,
            })
        }
    };

    let config = load_config(&global)?;
    log::set_max_level((&config.log_level).into());

    let controller = Controller::with_config(config)?.with_event_output(global.events.into());

    match command {
        Commands::Translate(args) => {
            if !args.input_path.exists() {
                return Err(anyhow!("Input path does not exist: {:?}", args.input_path));
            }
            controller
                .run(args.input_path, args.output_dir, args.force_overwrite)
                .await
        }
        Commands::Sentence { current, prev, next } => {
            match controller.translate_sentence(&current, &prev, &next).await? {
                Some(translation) => println!("{}", translation),
                None => warn!("Sentence translation is disabled in the configuration"),
            }
            Ok(())
        }
        Commands::TestConnection => controller.test_connection().await,
        Commands::Transcript { input_path, output_dir } => {
            let path = controller.write_transcript(&input_path, output_dir.as_deref())?;
            println!("{}", path.display());
            Ok(())
        }
        Commands::Import {
            translated_path,
            source,
            output,
        } => {
            let items = controller
                .import(&translated_path, source.as_deref(), output.as_deref())
                .await?;
            println!("Imported {} captions", items.len());
            Ok(())
        }
        Commands::Cache { action } => match action {
            CacheAction::Stats => {
                println!("{}", controller.cache_stats().await?);
                Ok(())
            }
            CacheAction::Clear => {
                println!("Removed {} cached translations", controller.clear_cache().await?);
                Ok(())
            }
        },
        Commands::Completions { .. } => Ok(()),
    }
}

/// Load or create the configuration file, then apply command line overrides
fn load_config(options: &GlobalArgs) -> Result<Config> {
    let config_path: &Path = &options.config_path;
    if !config_path.exists() {
        warn!("Config file not found at {:?}, creating default config.", config_path);
    }
    let mut config = Config::load_or_create(config_path)?;

    if let Some(provider) = options.provider {
        config.translation.provider = provider.into();
    }
    if let Some(model) = &options.model {
        config.translation.set_model(model.clone());
    }
    if let Some(api_key) = &options.api_key {
        config.translation.set_api_key(api_key.clone());
    }
    if let Some(source_lang) = &options.source_language {
        config.source_language = source_lang.clone();
    }
    if let Some(target_lang) = &options.target_language {
        config.target_language = target_lang.clone();
    }
    if let Some(mode) = options.mode {
        config.translation.common.speed_mode = mode.into();
    }
    if options.no_cache {
        config.cache.enabled = false;
    }
    if let Some(log_level) = options.log_level {
        config.log_level = log_level.into();
    }

    Ok(config)
}

// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Result, Context};
use log::{warn, info, LevelFilter, Log, Metadata, Record, Level, SetLoggerError};
use std::fs::File;
use std::io::BufReader;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use clap::{Parser, ValueEnum, CommandFactory, Subcommand};
use clap_complete::{generate, Shell};

use crate::app_config::{ClassifierProvider, Config, ResponderProvider};
use crate::providers::{Classifier, Responder};
use crate::providers::gemini::Gemini;
use crate::providers::vision::GoogleVision;
use crate::scheduler::CoalescingScheduler;
use crate::session::SessionStore;

mod app_config;
mod emotion;
mod errors;
mod providers;
mod scheduler;
mod server;
mod session;

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

fn level_filter_for(level: &app_config::LogLevel) -> LevelFilter {
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
    /// Run the analysis server (default command)
    #[command(alias = "run")]
    Serve(ServeArgs),

    /// Generate shell completions for moodgate
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
struct ServeArgs {
    /// Bind address for the HTTP server
    #[arg(long)]
    host: Option<String>,

    /// Bind port for the HTTP server
    #[arg(long)]
    port: Option<u16>,

    /// API key for the Google services, applied to both providers
    #[arg(short, long, env = "GOOGLE_API_KEY")]
    api_key: Option<String>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

/// moodgate - emotion-aware chat backend
///
/// Accepts webcam frames per client session, coalesces the expensive face
/// classification calls, and optionally generates an empathetic chat reply.
#[derive(Parser, Debug)]
#[command(name = "moodgate")]
#[command(version = "0.3.0")]
#[command(about = "Emotion-aware chat backend with per-session request coalescing")]
#[command(long_about = "moodgate serves two endpoints: POST /analyze_emotion/ accepts a frame and
optional message for a session, GET /get_result/ polls the last published
result. Frames arriving faster than the per-session rate gate are buffered
(newest wins) and classified by a deferred task.

EXAMPLES:
    moodgate                                  # Serve using default config
    moodgate serve --port 9000                # Override the bind port
    moodgate serve -a $GOOGLE_API_KEY         # Supply the API key inline
    moodgate --log-level debug                # Verbose request logging
    moodgate completions bash > moodgate.bash # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default
    one will be created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Bind address for the HTTP server
    #[arg(long)]
    host: Option<String>,

    /// Bind port for the HTTP server
    #[arg(long)]
    port: Option<u16>,

    /// API key for the Google services, applied to both providers
    #[arg(short, long, env = "GOOGLE_API_KEY")]
    api_key: Option<String>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI color code for log level
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
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let color = Self::color_for_level(record.level());

            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "{}{} {:5} {}\x1B[0m",
                color, now, record.level(), record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize the logger once with info level by default
    // We'll update the level after loading the config if needed
    CustomLogger::init(LevelFilter::Info)?;

    // Parse command line arguments using clap
    let cli = CommandLineOptions::parse();

    // Handle subcommands
    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "moodgate", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::Serve(args)) => run_serve(args).await,
        None => {
            // Default behavior - use top-level args for backwards compatibility
            let serve_args = ServeArgs {
                host: cli.host,
                port: cli.port,
                api_key: cli.api_key,
                config_path: cli.config_path,
                log_level: cli.log_level,
            };
            run_serve(serve_args).await
        }
    }
}

async fn run_serve(options: ServeArgs) -> Result<()> {
    // If log level is set via command line, apply it immediately
    if let Some(cmd_log_level) = &options.log_level {
        let config_log_level: app_config::LogLevel = cmd_log_level.clone().into();
        log::set_max_level(level_filter_for(&config_log_level));
    }

    // Load or create configuration
    let config_path = &options.config_path;
    let mut config = if Path::new(config_path).exists() {
        // Load existing configuration
        let file = File::open(config_path)
            .context(format!("Failed to open config file: {}", config_path))?;

        let reader = BufReader::new(file);
        let config: Config = serde_json::from_reader(reader)
            .context(format!("Failed to parse config file: {}", config_path))?;

        config
    } else {
        // Create default configuration if not exists
        warn!("Config file not found at '{}', creating default config.", config_path);

        let config = Config::default();

        // Save default config
        let config_json = serde_json::to_string_pretty(&config)
            .context("Failed to serialize default config to JSON")?;

        std::fs::write(config_path, config_json)
            .context(format!("Failed to write default config to file: {}", config_path))?;

        config
    };

    // Override config with CLI options if provided
    if let Some(host) = &options.host {
        config.server.host = host.clone();
    }
    if let Some(port) = options.port {
        config.server.port = port;
    }
    if let Some(api_key) = &options.api_key {
        if config.classifier.api_key.is_empty() {
            config.classifier.api_key = api_key.clone();
        }
        if config.responder.api_key.is_empty() {
            config.responder.api_key = api_key.clone();
        }
    }
    if let Some(log_level) = &options.log_level {
        config.log_level = log_level.clone().into();
    }

    // Validate the configuration after loading and overriding
    config.validate()
        .context("Configuration validation failed")?;

    // If log level was not set via command line, update it from config now
    if options.log_level.is_none() {
        // Just update the max level without reinitializing the logger
        log::set_max_level(level_filter_for(&config.log_level));
    }

    // Build the external collaborators from the configuration
    let classifier: Arc<dyn Classifier> = match config.classifier.provider {
        ClassifierProvider::GoogleVision => Arc::new(GoogleVision::with_timeout(
            config.classifier.api_key.clone(),
            config.classifier.endpoint.clone(),
            config.classifier.max_faces,
            Duration::from_secs(config.classifier.timeout_secs),
        )),
    };
    let responder: Arc<dyn Responder> = match config.responder.provider {
        ResponderProvider::Gemini => Arc::new(Gemini::with_timeout(
            config.responder.api_key.clone(),
            config.responder.endpoint.clone(),
            config.responder.model.clone(),
            Duration::from_secs(config.responder.timeout_secs),
        )),
    };

    // Check provider connectivity in a background task; a failed check logs
    // without blocking startup.
    {
        let classifier = Arc::clone(&classifier);
        let responder = Arc::clone(&responder);
        tokio::spawn(async move {
            if let Err(e) = classifier.test_connection().await {
                warn!("Classifier connectivity check failed: {}", e);
            }
            if let Err(e) = responder.test_connection().await {
                warn!("Responder connectivity check failed: {}", e);
            }
        });
    }

    info!(
        "Classifier: {}, responder: {} ({})",
        config.classifier.provider.display_name(),
        config.responder.provider.display_name(),
        config.responder.model
    );
    info!(
        "Rate gate: {}ms interval, {}ms debounce",
        config.scheduler.min_process_interval_ms,
        config.scheduler.debounce_delay_ms
    );

    // The store is created once at startup and lives for the process lifetime
    let store = Arc::new(SessionStore::new());
    let scheduler = CoalescingScheduler::new(store, classifier, responder, config.scheduler.clone());

    server::serve(&config.server.bind_addr(), scheduler).await
}

use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::time::Duration;
use url::Url;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// HTTP server bind settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Per-session scheduling settings
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// Face classification provider settings
    #[serde(default)]
    pub classifier: ClassifierConfig,

    /// Reply generation provider settings
    #[serde(default)]
    pub responder: ResponderConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Face classification provider type
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ClassifierProvider {
    // @provider: Google Cloud Vision face detection
    #[default]
    GoogleVision,
}

impl ClassifierProvider {
    // @returns: Capitalized provider name
    pub fn display_name(&self) -> &str {
        match self {
            Self::GoogleVision => "Google Vision",
        }
    }

    // @returns: Lowercase provider identifier
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::GoogleVision => "googlevision".to_string(),
        }
    }
}

// Implement Display trait for ClassifierProvider
impl std::fmt::Display for ClassifierProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

// Implement FromStr trait for ClassifierProvider
impl std::str::FromStr for ClassifierProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "googlevision" => Ok(Self::GoogleVision),
            _ => Err(anyhow!("Invalid classifier provider type: {}", s)),
        }
    }
}

/// Reply generation provider type
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ResponderProvider {
    // @provider: Google Gemini
    #[default]
    Gemini,
}

impl ResponderProvider {
    // @returns: Capitalized provider name
    pub fn display_name(&self) -> &str {
        match self {
            Self::Gemini => "Gemini",
        }
    }

    // @returns: Lowercase provider identifier
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::Gemini => "gemini".to_string(),
        }
    }
}

// Implement Display trait for ResponderProvider
impl std::fmt::Display for ResponderProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

// Implement FromStr trait for ResponderProvider
impl std::str::FromStr for ResponderProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "gemini" => Ok(Self::Gemini),
            _ => Err(anyhow!("Invalid responder provider type: {}", s)),
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerConfig {
    // @field: Bind address
    #[serde(default = "default_host")]
    pub host: String,

    // @field: Bind port
    #[serde(default = "default_port")]
    pub port: u16,
}

impl ServerConfig {
    /// Socket address string for the listener
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Per-session request-coalescing configuration
///
/// The two delays are independent knobs: the interval gates how often a
/// session may hit the classification backend, the debounce delay is how long
/// a deferred task sleeps before draining the pending buffer.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SchedulerConfig {
    // @field: Minimum milliseconds between two classifications of one session
    #[serde(default = "default_min_process_interval_ms")]
    pub min_process_interval_ms: u64,

    // @field: Milliseconds a deferred task waits before firing
    #[serde(default = "default_debounce_delay_ms")]
    pub debounce_delay_ms: u64,
}

impl SchedulerConfig {
    /// Rate-limit threshold as a Duration
    pub fn min_process_interval(&self) -> Duration {
        Duration::from_millis(self.min_process_interval_ms)
    }

    /// Debounce delay as a Duration
    pub fn debounce_delay(&self) -> Duration {
        Duration::from_millis(self.debounce_delay_ms)
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            min_process_interval_ms: default_min_process_interval_ms(),
            debounce_delay_ms: default_debounce_delay_ms(),
        }
    }
}

/// Face classification service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ClassifierConfig {
    // @field: Provider type identifier
    #[serde(default)]
    pub provider: ClassifierProvider,

    // @field: API key
    #[serde(default = "String::new")]
    pub api_key: String,

    // @field: Service URL
    #[serde(default = "default_vision_endpoint")]
    pub endpoint: String,

    // @field: Max faces requested per image
    #[serde(default = "default_max_faces")]
    pub max_faces: u32,

    // @field: Timeout seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            provider: ClassifierProvider::default(),
            api_key: String::new(),
            endpoint: default_vision_endpoint(),
            max_faces: default_max_faces(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Reply generation service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ResponderConfig {
    // @field: Provider type identifier
    #[serde(default)]
    pub provider: ResponderProvider,

    // @field: Model name
    #[serde(default = "default_gemini_model")]
    pub model: String,

    // @field: API key
    #[serde(default = "String::new")]
    pub api_key: String,

    // @field: Service URL
    #[serde(default = "default_gemini_endpoint")]
    pub endpoint: String,

    // @field: Timeout seconds
    #[serde(default = "default_responder_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ResponderConfig {
    fn default() -> Self {
        Self {
            provider: ResponderProvider::default(),
            model: default_gemini_model(),
            api_key: String::new(),
            endpoint: default_gemini_endpoint(),
            timeout_secs: default_responder_timeout_secs(),
        }
    }
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

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_min_process_interval_ms() -> u64 {
    1200
}

fn default_debounce_delay_ms() -> u64 {
    1000
}

fn default_max_faces() -> u32 {
    10
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_responder_timeout_secs() -> u64 {
    60
}

fn default_vision_endpoint() -> String {
    "https://vision.googleapis.com".to_string()
}

fn default_gemini_endpoint() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_gemini_model() -> String {
    "gemini-2.5-flash".to_string()
}

impl Config {

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        // Both hosted providers require an API key
        if self.classifier.api_key.is_empty() {
            return Err(anyhow!(
                "API key is required for the {} classifier provider",
                self.classifier.provider.display_name()
            ));
        }
        if self.responder.api_key.is_empty() {
            return Err(anyhow!(
                "API key is required for the {} responder provider",
                self.responder.provider.display_name()
            ));
        }

        // Endpoints must be well-formed URLs
        Url::parse(&self.classifier.endpoint)
            .map_err(|e| anyhow!("Invalid classifier endpoint '{}': {}", self.classifier.endpoint, e))?;
        Url::parse(&self.responder.endpoint)
            .map_err(|e| anyhow!("Invalid responder endpoint '{}': {}", self.responder.endpoint, e))?;

        // A zero interval would disable coalescing entirely; treat as a mistake
        if self.scheduler.min_process_interval_ms == 0 {
            return Err(anyhow!("scheduler.min_process_interval_ms must be greater than zero"));
        }
        if self.scheduler.debounce_delay_ms == 0 {
            return Err(anyhow!("scheduler.debounce_delay_ms must be greater than zero"));
        }

        Ok(())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig::default(),
            scheduler: SchedulerConfig::default(),
            classifier: ClassifierConfig::default(),
            responder: ResponderConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}

//! Configuration loading and config file resolution
//!
//! Bootstrap configuration comes from a TOML file. Resolution priority:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (`LMS_CONFIG`)
//! 3. Platform config file (`~/.config/lms/config.toml`, `/etc/lms/config.toml`)
//! 4. Compiled defaults (fallback)
//!
//! A missing config file is not an error: the service warns and starts with
//! defaults. A config file that exists but cannot be parsed is an error.

use crate::{Error, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "LMS_CONFIG";
/// Environment variable overriding `api.base_url`
pub const API_BASE_ENV_VAR: &str = "LMS_API_BASE";
/// Environment variable carrying the API auth token
pub const API_TOKEN_ENV_VAR: &str = "LMS_API_TOKEN";

/// Lesson id that always maps to a fixed fallback video
pub const PINNED_FALLBACK_LESSON_ID: &str = "67e3e23fe1a0909288719e19";
/// Video pinned to [`PINNED_FALLBACK_LESSON_ID`]
pub const PINNED_FALLBACK_VIDEO_URL: &str = "https://www.youtube.com/watch?v=JhHMJCUmq28";

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Deserialize, Default)]
pub struct TomlConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub samples: SampleConfig,
    #[serde(default)]
    pub media: MediaConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP server settings
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

/// Remote LMS API settings
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the LMS REST API (e.g. "https://lms.example.com/api")
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Explicit auth token (highest priority)
    #[serde(default)]
    pub token: Option<String>,

    /// File holding the auth token (defaults to `<data dir>/lms/token`)
    #[serde(default)]
    pub token_file: Option<PathBuf>,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Course-type variants tried against the multi-tenant endpoint, in order
    #[serde(default = "default_course_types")]
    pub course_types: Vec<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token: None,
            token_file: None,
            request_timeout_secs: default_request_timeout_secs(),
            course_types: default_course_types(),
        }
    }
}

impl ApiConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Resolve the auth token
    ///
    /// Priority: explicit `token` > `LMS_API_TOKEN` > contents of `token_file`
    /// (or the default token file). Blank values are skipped.
    pub fn resolve_token(&self) -> Option<String> {
        if let Some(token) = non_blank(self.token.as_deref()) {
            return Some(token);
        }

        if let Ok(token) = std::env::var(API_TOKEN_ENV_VAR) {
            if let Some(token) = non_blank(Some(&token)) {
                return Some(token);
            }
        }

        let path = self.token_file.clone().or_else(default_token_file)?;
        match std::fs::read_to_string(&path) {
            Ok(contents) => non_blank(Some(&contents)),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "No token file");
                None
            }
        }
    }
}

/// Curriculum cache settings
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_ttl_secs")]
    pub ttl_secs: u64,

    /// Maximum cached curricula (0 = unbounded)
    #[serde(default = "default_cache_max_entries")]
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_cache_ttl_secs(),
            max_entries: default_cache_max_entries(),
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn max_entries(&self) -> Option<usize> {
        (self.max_entries > 0).then_some(self.max_entries)
    }
}

/// Sample curriculum settings
#[derive(Debug, Clone, Deserialize)]
pub struct SampleConfig {
    /// Default for requests that do not say whether a sample is acceptable
    #[serde(default = "default_true")]
    pub fallback_to_sample: bool,

    /// Enable the demo-course templates
    #[serde(default = "default_true")]
    pub demo_templates: bool,
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            fallback_to_sample: true,
            demo_templates: true,
        }
    }
}

/// Fallback media for video lessons without a URL
#[derive(Debug, Clone, Deserialize)]
pub struct MediaConfig {
    #[serde(default = "default_fallback_videos")]
    pub fallback_videos: Vec<String>,

    /// Lesson id → video URL, bypassing the hash selection
    #[serde(default = "default_overrides")]
    pub overrides: BTreeMap<String, String>,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            fallback_videos: default_fallback_videos(),
            overrides: default_overrides(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_port() -> u16 {
    5730
}

fn default_base_url() -> String {
    "http://localhost:5000/api".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_course_types() -> Vec<String> {
    vec!["blended".to_string(), "live".to_string(), "free".to_string()]
}

fn default_cache_ttl_secs() -> u64 {
    300
}

fn default_cache_max_entries() -> usize {
    1000
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_fallback_videos() -> Vec<String> {
    [
        PINNED_FALLBACK_VIDEO_URL,
        "https://www.youtube.com/watch?v=F_Riqjdh2oM",
        "https://www.youtube.com/watch?v=QuR969uMICM",
        "https://www.youtube.com/watch?v=X8MZWCGgIb8",
        "https://www.youtube.com/watch?v=zjkBMFhNj_g",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_overrides() -> BTreeMap<String, String> {
    BTreeMap::from([(
        PINNED_FALLBACK_LESSON_ID.to_string(),
        PINNED_FALLBACK_VIDEO_URL.to_string(),
    )])
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl TomlConfig {
    /// Parse a config file
    pub fn load(path: &Path) -> Result<Self> {
        let toml_str = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;
        let config: TomlConfig = toml::from_str(&toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the services cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.api.base_url.trim().is_empty() {
            return Err(Error::Config("api.base_url must not be empty".to_string()));
        }
        if self.media.fallback_videos.is_empty() {
            return Err(Error::Config(
                "media.fallback_videos must list at least one URL".to_string(),
            ));
        }
        Ok(())
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) {
        if let Ok(base) = std::env::var(API_BASE_ENV_VAR) {
            if let Some(base) = non_blank(Some(&base)) {
                info!(base_url = %base, "API base URL overridden by {}", API_BASE_ENV_VAR);
                self.api.base_url = base;
            }
        }
    }
}

/// Config file resolution following the priority order in the module docs
pub struct ConfigResolver {
    cli_path: Option<PathBuf>,
}

impl ConfigResolver {
    pub fn new(cli_path: Option<PathBuf>) -> Self {
        Self { cli_path }
    }

    /// Resolve the config file path, if any
    ///
    /// Returns `(path, explicit)`; explicit paths (CLI or env) must exist.
    pub fn resolve(&self) -> Option<(PathBuf, bool)> {
        // Priority 1: Command-line argument
        if let Some(path) = &self.cli_path {
            return Some((path.clone(), true));
        }

        // Priority 2: Environment variable
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            if !path.trim().is_empty() {
                return Some((PathBuf::from(path), true));
            }
        }

        // Priority 3: Platform config file
        config_file_candidates()
            .into_iter()
            .find(|p| p.exists())
            .map(|p| (p, false))
    }

    /// Load configuration, degrading to compiled defaults when no file exists
    pub fn load(&self) -> Result<TomlConfig> {
        let mut config = match self.resolve() {
            Some((path, explicit)) => {
                if !path.exists() {
                    if explicit {
                        return Err(Error::Config(format!(
                            "Config file not found: {:?}",
                            path
                        )));
                    }
                    warn!(path = %path.display(), "Config file vanished, using defaults");
                    TomlConfig::default()
                } else {
                    let config = TomlConfig::load(&path)?;
                    info!("Loaded TOML configuration from {:?}", path);
                    config
                }
            }
            None => {
                // Priority 4: Compiled defaults
                warn!("No config file found, using compiled defaults");
                TomlConfig::default()
            }
        };

        config.apply_env_overrides();
        Ok(config)
    }
}

/// Platform config file locations, most specific first
pub fn config_file_candidates() -> Vec<PathBuf> {
    let mut candidates: Vec<PathBuf> = dirs::config_dir()
        .map(|d| d.join("lms").join("config.toml"))
        .into_iter()
        .collect();

    if cfg!(target_os = "linux") {
        candidates.push(PathBuf::from("/etc/lms/config.toml"));
    }

    candidates
}

/// Default location of the auth token file
pub fn default_token_file() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("lms").join("token"))
}

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const CONFIG_DIR: &str = ".refsearch";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub literal: LiteralConfig,

    #[serde(default)]
    pub documents: DocumentsConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Settings for symbol-reference search sessions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Maximum number of documents searched at the same time
    #[serde(default = "default_max_concurrent_documents")]
    pub max_concurrent_documents: usize,

    /// Still report completion when some documents failed
    #[serde(default = "default_true")]
    pub complete_on_partial_failure: bool,

    /// Maximum number of document failures recorded per session
    #[serde(default = "default_max_failures")]
    pub max_failures: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_concurrent_documents: default_max_concurrent_documents(),
            complete_on_partial_failure: true,
            max_failures: default_max_failures(),
        }
    }
}

fn default_max_concurrent_documents() -> usize {
    num_cpus::get().max(1)
}

fn default_max_failures() -> usize {
    1000
}

fn default_true() -> bool {
    true
}

/// Settings for literal (text occurrence) search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiteralConfig {
    /// Reject matches bordered by identifier characters
    #[serde(default = "default_true")]
    pub whole_token: bool,

    /// Match case exactly
    #[serde(default = "default_true")]
    pub case_sensitive: bool,
}

impl Default for LiteralConfig {
    fn default() -> Self {
        Self {
            whole_token: true,
            case_sensitive: true,
        }
    }
}

/// Which files under a root become searchable documents
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentsConfig {
    /// File extensions to search (empty = all files)
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Directory or file names to skip (in addition to .gitignore)
    #[serde(default = "default_ignore_patterns")]
    pub ignore_patterns: Vec<String>,
}

impl Default for DocumentsConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            ignore_patterns: default_ignore_patterns(),
        }
    }
}

fn default_extensions() -> Vec<String> {
    ["rs", "cs", "vb", "fs", "java", "kt", "go", "py", "ts", "tsx", "js", "c", "h", "cpp", "hpp"]
        .iter()
        .map(|ext| ext.to_string())
        .collect()
}

fn default_ignore_patterns() -> Vec<String> {
    ["target", "bin", "obj", "node_modules", ".git", "dist", "build"]
        .iter()
        .map(|pattern| pattern.to_string())
        .collect()
}

/// Logging output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Write logs to rolling files
    #[serde(default)]
    pub enabled: bool,

    /// Also log to stderr (filtered by RUST_LOG)
    #[serde(default = "default_true")]
    pub stderr: bool,

    /// File log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log directory, relative to the project root unless absolute
    #[serde(default = "default_log_directory")]
    pub directory: PathBuf,

    /// Rotation: minutely, hourly, daily, never
    #[serde(default = "default_rotation")]
    pub rotation: String,

    /// Log file name prefix
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            stderr: true,
            level: default_log_level(),
            directory: default_log_directory(),
            rotation: default_rotation(),
            file_prefix: default_file_prefix(),
        }
    }
}

fn default_log_level() -> String {
    "debug".to_string()
}

fn default_log_directory() -> PathBuf {
    PathBuf::from(CONFIG_DIR).join("logs")
}

fn default_rotation() -> String {
    "daily".to_string()
}

fn default_file_prefix() -> String {
    "refsearch.log".to_string()
}

impl Config {
    /// Load configuration from the .refsearch directory, falling back to
    /// defaults when no config file exists
    pub fn load(root: &Path) -> Result<Self> {
        let config_path = Self::config_path(root);

        if !config_path.exists() {
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config from {:?}", config_path))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config from {:?}", config_path))
    }

    /// Save configuration to the .refsearch directory
    pub fn save(&self, root: &Path) -> Result<()> {
        let config_dir = Self::config_dir(root);

        std::fs::create_dir_all(&config_dir)
            .with_context(|| format!("Failed to create config directory {:?}", config_dir))?;

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        let config_path = Self::config_path(root);
        std::fs::write(&config_path, content)
            .with_context(|| format!("Failed to write config to {:?}", config_path))?;

        Ok(())
    }

    pub fn config_dir(root: &Path) -> PathBuf {
        root.join(CONFIG_DIR)
    }

    pub fn config_path(root: &Path) -> PathBuf {
        Self::config_dir(root).join(CONFIG_FILE)
    }

    pub fn is_initialized(root: &Path) -> bool {
        Self::config_path(root).exists()
    }
}

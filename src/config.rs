//! Configuration for glide.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (GLIDE_HOME, GLIDE_BACKEND, API keys, ...)
//! 2. Config file (.glide/config.yaml)
//! 3. Defaults (~/.glide)
//!
//! Config file discovery:
//! - Searches current directory and parents for .glide/config.yaml

use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Global cached configuration (stores Result to handle init errors)
static CONFIG: OnceLock<Result<ResolvedConfig, String>> = OnceLock::new();

/// Default timeout for extraction backend calls
const DEFAULT_LLM_TIMEOUT_SECS: u64 = 60;

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub home: Option<String>,

    /// Backend choice: "anthropic" | "openai" | "groq" | "none"
    #[serde(default)]
    pub backend: Option<String>,

    #[serde(default)]
    pub llm_timeout_secs: Option<u64>,

    #[serde(default)]
    pub timezone: Option<String>,

    #[serde(default)]
    pub whisper: Option<WhisperConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WhisperConfig {
    /// Path to the whisper binary
    pub path: Option<String>,
    /// Model name (tiny, base, small, ...)
    pub model: Option<String>,
}

/// Resolved configuration
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Absolute path to the glide home directory (note store, audio)
    pub home: PathBuf,

    /// Explicit backend choice, if any
    pub backend: Option<String>,

    pub anthropic_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub groq_api_key: Option<String>,

    /// Timeout applied to each extraction backend call
    pub llm_timeout_secs: u64,

    /// User timezone for relative-date resolution in prompts
    pub timezone: String,

    pub whisper_path: String,
    pub whisper_model: String,

    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
}

impl ResolvedConfig {
    pub fn llm_timeout(&self) -> Duration {
        Duration::from_secs(self.llm_timeout_secs)
    }

    /// Directory holding note documents
    pub fn notes_dir(&self) -> PathBuf {
        self.home.join("notes")
    }

    /// Directory holding captured audio files
    pub fn audio_dir(&self) -> PathBuf {
        self.home.join("audio")
    }
}

/// Read an env var, treating empty values as unset
fn env_nonempty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Find config file by searching current directory and parents
fn find_config_file() -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let config_path = current.join(".glide").join("config.yaml");
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Load configuration from all sources
fn load_config() -> Result<ResolvedConfig> {
    let default_home = dirs::home_dir()
        .context("Failed to determine home directory")?
        .join(".glide");

    let config_path = find_config_file();
    let file = match &config_path {
        Some(path) => load_config_file(path)?,
        None => ConfigFile::default(),
    };

    let home = env_nonempty("GLIDE_HOME")
        .map(PathBuf::from)
        .or_else(|| file.home.as_ref().map(PathBuf::from))
        .unwrap_or(default_home);

    let backend = env_nonempty("GLIDE_BACKEND").or(file.backend);

    let llm_timeout_secs = env_nonempty("GLIDE_LLM_TIMEOUT_SECS")
        .and_then(|v| v.parse().ok())
        .or(file.llm_timeout_secs)
        .unwrap_or(DEFAULT_LLM_TIMEOUT_SECS);

    let timezone = env_nonempty("GLIDE_TIMEZONE")
        .or(file.timezone)
        .unwrap_or_else(|| "America/Chicago".to_string());

    let whisper = file.whisper.unwrap_or_default();
    let whisper_path = env_nonempty("WHISPER_PATH")
        .or(whisper.path)
        .unwrap_or_else(|| "whisper".to_string());
    let whisper_model = env_nonempty("WHISPER_MODEL")
        .or(whisper.model)
        .unwrap_or_else(|| "base".to_string());

    Ok(ResolvedConfig {
        home,
        backend,
        anthropic_api_key: env_nonempty("ANTHROPIC_API_KEY"),
        openai_api_key: env_nonempty("OPENAI_API_KEY"),
        groq_api_key: env_nonempty("GROQ_API_KEY"),
        llm_timeout_secs,
        timezone,
        whisper_path,
        whisper_model,
        config_file: config_path,
    })
}

/// Get the global configuration (loads once, then cached)
pub fn config() -> Result<&'static ResolvedConfig> {
    let result = CONFIG.get_or_init(|| load_config().map_err(|e| e.to_string()));

    match result {
        Ok(config) => Ok(config),
        Err(e) => anyhow::bail!("{}", e),
    }
}

/// Force reload configuration (useful for testing)
pub fn reload_config() -> Result<ResolvedConfig> {
    load_config()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_config_file_parsing() {
        let temp = TempDir::new().unwrap();
        let glide_dir = temp.path().join(".glide");
        std::fs::create_dir_all(&glide_dir).unwrap();

        let config_path = glide_dir.join("config.yaml");
        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(
            file,
            r#"
home: /tmp/glide-test
backend: anthropic
llm_timeout_secs: 30
whisper:
  path: /usr/local/bin/whisper
  model: small
"#
        )
        .unwrap();

        let config = load_config_file(&config_path).unwrap();
        assert_eq!(config.home, Some("/tmp/glide-test".to_string()));
        assert_eq!(config.backend, Some("anthropic".to_string()));
        assert_eq!(config.llm_timeout_secs, Some(30));

        let whisper = config.whisper.unwrap();
        assert_eq!(whisper.model, Some("small".to_string()));
    }

    #[test]
    fn test_empty_config_file_is_valid() {
        let config: ConfigFile = serde_yaml::from_str("{}").unwrap();
        assert!(config.home.is_none());
        assert!(config.backend.is_none());
    }

    #[test]
    fn test_derived_dirs() {
        let config = ResolvedConfig {
            home: PathBuf::from("/test/.glide"),
            backend: None,
            anthropic_api_key: None,
            openai_api_key: None,
            groq_api_key: None,
            llm_timeout_secs: 60,
            timezone: "America/Chicago".to_string(),
            whisper_path: "whisper".to_string(),
            whisper_model: "base".to_string(),
            config_file: None,
        };

        assert_eq!(config.notes_dir(), PathBuf::from("/test/.glide/notes"));
        assert_eq!(config.audio_dir(), PathBuf::from("/test/.glide/audio"));
        assert_eq!(config.llm_timeout(), Duration::from_secs(60));
    }
}

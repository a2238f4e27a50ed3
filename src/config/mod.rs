use crate::global;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub session: SessionConfig,
    pub genai: GenAiConfig,
    pub summary: SummaryConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Maximum utterances retained per meeting; oldest evicted beyond this.
    pub log_cap: usize,
    /// Coalescing window for durable session writes.
    pub flush_debounce_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            log_cap: 300,
            flush_debounce_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenAiConfig {
    /// Ranked model names checked first during selection (exact match).
    pub preferred_models: Vec<String>,
    /// Marker token for the fast/economical fallback tier.
    pub economical_marker: String,
    /// Timeout for discovery and generation requests.
    pub timeout_secs: u64,
    pub max_output_tokens: u32,
    pub temperature: f32,
}

impl Default for GenAiConfig {
    fn default() -> Self {
        Self {
            preferred_models: vec![
                "gemini-2.0-flash".to_string(),
                "gemini-1.5-flash".to_string(),
            ],
            economical_marker: "flash".to_string(),
            timeout_secs: 30,
            max_output_tokens: 1024,
            temperature: 0.3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryConfig {
    /// Most recent utterances sent to the model; older context is dropped.
    pub clip_last: usize,
    /// Bounded summary history; oldest records evicted beyond this.
    pub history_cap: usize,
    /// Speaker names folded into `speaker_label` before prompting.
    pub self_aliases: Vec<String>,
    pub speaker_label: String,
    /// Filler utterances dropped before prompting.
    pub filler_stoplist: Vec<String>,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            clip_last: 120,
            history_cap: 30,
            self_aliases: vec!["you".to_string(), "自分".to_string(), "あなた".to_string()],
            speaker_label: "Me".to_string(),
            filler_stoplist: vec![
                "uh".to_string(),
                "um".to_string(),
                "mm-hmm".to_string(),
                "uh-huh".to_string(),
                "yeah".to_string(),
                "okay".to_string(),
                "ok".to_string(),
                "えっと".to_string(),
                "うん".to_string(),
                "はい".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 3838 }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        if !config_path.exists() {
            info!(
                "Config file not found, creating default at {:?}",
                config_path
            );
            let config = Self::default();
            config.save()?;
            return Ok(config);
        }

        let content =
            std::fs::read_to_string(&config_path).context("Failed to read config file")?;

        let config: Self = toml::from_str(&content).context("Failed to parse config file")?;

        info!("Loaded config from {:?}", config_path);
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(&config_path, content).context("Failed to write config file")?;

        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        global::config_file()
    }
}

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

// ============================================================================
// Top-level config
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ThymosConfig {
    pub emotion: EmotionConfig,
    pub render: RenderConfig,
    pub store: StoreConfig,
    pub classifier: ClassifierConfig,
    pub logging: LoggingConfig,
}

impl ThymosConfig {
    /// Load config from a TOML file, falling back to defaults for missing fields.
    /// After loading, env var overrides are applied.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;
        let mut config: ThymosConfig =
            toml::from_str(&content).with_context(|| "Failed to parse TOML config")?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Try to load from path; if file doesn't exist, return defaults with env overrides.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::info!("Config file not found or invalid ({}), using defaults", e);
                let mut cfg = Self::default();
                cfg.apply_env_overrides();
                cfg
            }
        }
    }

    /// Apply environment variable overrides on top of file-based config.
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("THYMOS_PROVIDER") {
            self.classifier.provider = v;
        }
        if let Ok(v) = std::env::var("THYMOS_CLASSIFIER_URL") {
            self.classifier.url = Some(v);
        }
        if let Ok(v) = std::env::var("THYMOS_MODEL") {
            self.classifier.model = v;
        }
        if let Ok(v) = std::env::var("OPENAI_BASE_URL") {
            self.classifier.base_url = v;
        }
        if let Ok(v) = std::env::var("OPENAI_API_KEY") {
            self.classifier.api_key = Some(v);
        }
        if let Ok(v) = std::env::var("THYMOS_TIMEOUT_MS") {
            if let Ok(n) = v.parse() {
                self.classifier.timeout_ms = n;
            }
        }
        if let Ok(v) = std::env::var("THYMOS_STATE_DIR") {
            self.store.root = Some(PathBuf::from(v));
        }
        if let Ok(v) = std::env::var("THYMOS_TIMEZONE") {
            self.render.timezone = v;
        }
        if let Ok(v) = std::env::var("THYMOS_CONFIDENCE_MIN") {
            if let Ok(n) = v.parse() {
                self.emotion.confidence_min = n;
            }
        }
        if let Ok(v) = std::env::var("THYMOS_HISTORY_SIZE") {
            if let Ok(n) = v.parse() {
                self.emotion.history_size = n;
            }
        }
    }
}

// ============================================================================
// Sub-configs
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmotionConfig {
    /// Closed label set. Classifier output outside it becomes `neutral`.
    pub labels: Vec<String>,
    /// Results below this confidence are stored as neutral/low/unsure.
    pub confidence_min: f64,
    /// Max history entries kept per bucket.
    pub history_size: usize,
    pub half_life_hours: f64,
    pub trend_window_hours: f64,
    /// Max tracked users per scope; 0 disables pruning.
    pub max_users: usize,
    pub max_reason_chars: usize,
}

impl Default for EmotionConfig {
    fn default() -> Self {
        Self {
            labels: default_labels(),
            confidence_min: 0.35,
            history_size: 50,
            half_life_hours: 12.0,
            trend_window_hours: 24.0,
            max_users: 100,
            max_reason_chars: 160,
        }
    }
}

impl EmotionConfig {
    pub fn allows_label(&self, label: &str) -> bool {
        label == "neutral" || self.labels.iter().any(|l| l.eq_ignore_ascii_case(label))
    }
}

fn default_labels() -> Vec<String> {
    [
        "neutral",
        "calm",
        "happy",
        "excited",
        "grateful",
        "curious",
        "confused",
        "anxious",
        "frustrated",
        "sad",
        "angry",
        "tired",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub max_user_entries: usize,
    pub max_agent_entries: usize,
    pub max_other_agents: usize,
    /// IANA zone name used for rendered timestamps.
    pub timezone: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            max_user_entries: 3,
            max_agent_entries: 3,
            max_other_agents: 3,
            timezone: "UTC".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Directory holding one sub-directory per agent scope.
    pub root: Option<PathBuf>,
    pub file_name: String,
    pub lock_stale_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root: None,
            file_name: "emotion-state.json".to_string(),
            lock_stale_secs: 10,
        }
    }
}

impl StoreConfig {
    /// Configured root, or `~/.thymos/agents`.
    pub fn root_dir(&self) -> PathBuf {
        match &self.root {
            Some(root) => root.clone(),
            None => dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".thymos")
                .join("agents"),
        }
    }

    pub fn lock_stale_after(&self) -> Duration {
        Duration::from_secs(self.lock_stale_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// `llm`, `http` or `keyword`.
    pub provider: String,
    /// Endpoint for the `http` provider.
    pub url: Option<String>,
    pub model: String,
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout_ms: u64,
    pub temperature: f32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            provider: "llm".to_string(),
            url: None,
            model: "gpt-4o-mini".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: None,
            timeout_ms: 5000,
            temperature: 0.0,
        }
    }
}

impl ClassifierConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive; `RUST_LOG` wins when set.
    pub filter: String,
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            file: None,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

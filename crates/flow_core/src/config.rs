use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

// ============================================================================
// Top-level config
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FlowConfig {
    pub llm: LlmConfig,
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub client: ClientConfig,
}

impl FlowConfig {
    /// Load config from a TOML file, falling back to defaults for missing fields.
    /// After loading, env var overrides are applied.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;
        let mut config: FlowConfig =
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

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("LLM_PROVIDER") {
            self.llm.provider = v;
        }
        if let Ok(v) = std::env::var("LLM_MODEL") {
            self.llm.model = v;
        }
        if let Ok(v) = std::env::var("LLM_BASE_URL") {
            self.llm.base_url = Some(v);
        }
        if let Ok(v) = std::env::var("LLM_MAX_TOKENS") {
            if let Ok(n) = v.parse() {
                self.llm.max_tokens = n;
            }
        }
        if let Ok(v) = std::env::var("LLM_TEMPERATURE") {
            if let Ok(n) = v.parse() {
                self.llm.temperature = n;
            }
        }
        if let Ok(v) = std::env::var("FLOW_HOST") {
            self.server.host = v;
        }
        if let Ok(v) = std::env::var("FLOW_PORT") {
            if let Ok(n) = v.parse() {
                self.server.port = n;
            }
        }
        if let Ok(v) = std::env::var("FLOW_DATA_DIR") {
            self.storage.data_dir = PathBuf::from(v);
        }
        // An empty value means "no backend", same as unset.
        if let Ok(v) = std::env::var("FLOW_API_URL") {
            self.client.api_url = Some(v).filter(|s| !s.trim().is_empty());
        }
    }
}

// ============================================================================
// Sub-configs
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// "mock", "gemini" or "openai".
    pub provider: String,
    pub model: String,
    pub base_url: Option<String>,
    /// Name of the env var holding the API key.
    pub api_key_env: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub request_timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "mock".to_string(),
            model: "gemini-2.5-flash".to_string(),
            base_url: None,
            api_key_env: "GEMINI_API_KEY".to_string(),
            max_tokens: 8000,
            temperature: 0.7,
            request_timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Upper bound for a single planning request.
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            request_timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    pub memory_file: String,
    pub workspace_file: String,
    pub preferences_file: String,
    /// Seed new users with the sample tasks, goals and classes.
    pub seed_sample_data: bool,
    /// Number of memory items handed to agents as context.
    pub context_items: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("sample_data"),
            memory_file: "memory.json".to_string(),
            workspace_file: "workspace.json".to_string(),
            preferences_file: "preferences.json".to_string(),
            seed_sample_data: false,
            context_items: 5,
        }
    }
}

impl StorageConfig {
    pub fn memory_path(&self) -> PathBuf {
        self.data_dir.join(&self.memory_file)
    }

    pub fn workspace_path(&self) -> PathBuf {
        self.data_dir.join(&self.workspace_file)
    }

    pub fn preferences_path(&self) -> PathBuf {
        self.data_dir.join(&self.preferences_file)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Backend base URL. `None` means every call is answered from mock data.
    pub api_url: Option<String>,
    pub user_id: String,
    pub poll_interval_secs: u64,
    pub request_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: None,
            user_id: "default".to_string(),
            poll_interval_secs: 2,
            request_timeout_secs: 30,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

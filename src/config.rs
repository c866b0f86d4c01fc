use crate::interview::InterviewConfig;
use crate::llm::GeminiConfig;
use crate::speech::{CaptureConfig, OutputConfig};
use crate::store::SupabaseConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Environment overrides look like `INTERVIEWER__SPEECH__RATE=1.1`
pub const ENV_PREFIX: &str = "INTERVIEWER";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub service: ServiceConfig,
    pub interview: InterviewSection,
    pub speech: SpeechSection,
    pub llm: LlmSection,
    pub store: StoreSection,
    pub nats: NatsSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "voice-interviewer".to_string(),
            http: HttpConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InterviewSection {
    pub max_questions: usize,
    pub post_speech_delay_ms: u64,
    pub silent_turn_limit: usize,
    pub notice_ttl_secs: u64,
}

impl Default for InterviewSection {
    fn default() -> Self {
        Self {
            max_questions: 5,
            post_speech_delay_ms: 1000,
            silent_turn_limit: 3,
            notice_ttl_secs: 5,
        }
    }
}

impl InterviewSection {
    pub fn to_config(&self) -> InterviewConfig {
        InterviewConfig {
            max_questions: self.max_questions,
            post_speech_delay: Duration::from_millis(self.post_speech_delay_ms),
            silent_turn_limit: self.silent_turn_limit.max(1),
            notice_ttl: Duration::from_secs(self.notice_ttl_secs),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechSection {
    pub single_silence_ms: u64,
    pub conversational_silence_ms: u64,
    pub single_grace_ms: u64,
    pub conversational_grace_ms: u64,
    pub min_speech_timeout_ms: u64,
    pub per_char_timeout_ms: u64,
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
    pub language: String,
}

impl Default for SpeechSection {
    fn default() -> Self {
        Self {
            single_silence_ms: 1500,
            conversational_silence_ms: 2000,
            single_grace_ms: 500,
            conversational_grace_ms: 300,
            min_speech_timeout_ms: 10_000,
            per_char_timeout_ms: 100,
            rate: 0.9,
            pitch: 1.0,
            volume: 1.0,
            language: "en-US".to_string(),
        }
    }
}

impl SpeechSection {
    pub fn output_config(&self) -> OutputConfig {
        OutputConfig {
            min_timeout: Duration::from_millis(self.min_speech_timeout_ms),
            per_char_timeout: Duration::from_millis(self.per_char_timeout_ms),
            rate: self.rate,
            pitch: self.pitch,
            volume: self.volume,
            language: self.language.clone(),
        }
    }

    pub fn capture_config(&self) -> CaptureConfig {
        CaptureConfig {
            single_window: Duration::from_millis(self.single_silence_ms),
            conversational_window: Duration::from_millis(self.conversational_silence_ms),
            single_grace: Duration::from_millis(self.single_grace_ms),
            conversational_grace: Duration::from_millis(self.conversational_grace_ms),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSection {
    pub base_url: String,
    pub model: String,
    /// Name of the environment variable holding the API key
    pub api_key_env: String,
    pub timeout_secs: u64,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            model: "gemini-1.5-flash".to_string(),
            api_key_env: "GOOGLE_GEMINI_API_KEY".to_string(),
            timeout_secs: 30,
        }
    }
}

impl LlmSection {
    pub fn gemini_config(&self) -> Result<GeminiConfig> {
        let api_key = std::env::var(&self.api_key_env)
            .with_context(|| format!("{} is not set", self.api_key_env))?;
        Ok(GeminiConfig {
            base_url: self.base_url.clone(),
            model: self.model.clone(),
            api_key,
            timeout: Duration::from_secs(self.timeout_secs),
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Memory,
    Supabase,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSection {
    pub backend: StoreBackend,
    pub url: String,
    /// Name of the environment variable holding the anon key
    pub anon_key_env: String,
    pub timeout_secs: u64,
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            url: String::new(),
            anon_key_env: "SUPABASE_ANON_KEY".to_string(),
            timeout_secs: 30,
        }
    }
}

impl StoreSection {
    pub fn supabase_config(&self) -> Result<SupabaseConfig> {
        if self.url.is_empty() {
            anyhow::bail!("store.url must be set for the supabase backend");
        }
        let anon_key = std::env::var(&self.anon_key_env)
            .with_context(|| format!("{} is not set", self.anon_key_env))?;
        Ok(SupabaseConfig {
            url: self.url.clone(),
            anon_key,
            timeout: Duration::from_secs(self.timeout_secs),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NatsSection {
    pub url: String,
}

impl Default for NatsSection {
    fn default() -> Self {
        Self {
            url: "nats://localhost:4222".to_string(),
        }
    }
}

impl Config {
    /// Load `path` (extension optional, missing file allowed) and overlay
    /// `INTERVIEWER__*` environment variables
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()
            .with_context(|| format!("Failed to read config from {}", path))?;

        settings
            .try_deserialize()
            .context("Invalid configuration")
    }
}

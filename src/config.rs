use anyhow::Result;
use serde::Deserialize;
use std::time::Duration;

use crate::audio::SegmenterConfig;
use crate::session::SessionConfig;

/// Prefix for environment overrides, e.g. `VOICE_AGENT__SERVICE__HTTP__PORT=9000`
pub const ENV_PREFIX: &str = "VOICE_AGENT";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub service: ServiceConfig,
    pub audio: AudioConfig,
    pub agent: AgentConfig,
    pub llm: LlmConfig,
    pub scheduling: SchedulingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
    /// Directory served as the web frontend
    pub static_dir: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "voice-agent".to_string(),
            http: HttpConfig::default(),
            static_dir: "static".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Used when the client does not pass `sample_rate` on connect
    pub default_sample_rate: u32,
    pub silence_threshold: f64,
    pub silence_chunks: usize,
    pub min_segment_ms: u32,
    pub pre_roll_chunks: usize,
}

impl Default for AudioConfig {
    fn default() -> Self {
        let segmenter = SegmenterConfig::default();
        Self {
            default_sample_rate: segmenter.sample_rate,
            silence_threshold: segmenter.silence_threshold,
            silence_chunks: segmenter.silence_chunks,
            min_segment_ms: segmenter.min_segment_ms,
            pre_roll_chunks: segmenter.pre_roll_chunks,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub system_prompt: String,
    /// Reply substring (case-insensitive) that starts scheduling
    pub trigger_phrase: String,
    /// Upper bound on waiting for the client's playback acknowledgment
    pub ack_timeout_secs: u64,
    /// Invitee added to scheduled events
    pub attendee: String,
    pub fallback_reply: String,
    pub scheduled_reply: String,
    pub schedule_failed_reply: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        let session = SessionConfig::default();
        Self {
            system_prompt: session.system_prompt,
            trigger_phrase: session.trigger_phrase,
            ack_timeout_secs: session.ack_timeout.as_secs(),
            attendee: session.attendee,
            fallback_reply: session.fallback_reply,
            scheduled_reply: session.scheduled_reply,
            schedule_failed_reply: session.schedule_failed_reply,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// OpenAI-compatible API root
    pub base_url: String,
    /// Name of the environment variable holding the API key
    pub api_key_env: String,
    pub chat_model: String,
    pub extraction_model: String,
    pub transcription_model: String,
    pub language: String,
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.groq.com/openai/v1".to_string(),
            api_key_env: "GROQ_API_KEY".to_string(),
            chat_model: "llama-3.3-70b-versatile".to_string(),
            extraction_model: "llama-3.1-8b-instant".to_string(),
            transcription_model: "whisper-large-v3-turbo".to_string(),
            language: "en".to_string(),
            timeout_secs: 10,
        }
    }
}

impl LlmConfig {
    /// Read and trim the API key from the configured environment variable
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SchedulingConfig {
    /// Endpoint receiving event creation requests; scheduling is disabled
    /// when unset
    pub webhook_url: Option<String>,
    /// Offset applied to extracted times that carry no zone
    pub default_utc_offset_minutes: i32,
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            default_utc_offset_minutes: 330,
        }
    }
}

impl Config {
    /// Load `path` (any format the config crate recognizes, extension
    /// optional) layered under `VOICE_AGENT__*` environment overrides.
    /// A missing file falls back to defaults.
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Per-connection settings for a client streaming at `sample_rate`
    pub fn session_config(&self, sample_rate: u32) -> SessionConfig {
        SessionConfig {
            session_id: uuid::Uuid::new_v4().to_string(),
            segmenter: SegmenterConfig {
                sample_rate,
                silence_threshold: self.audio.silence_threshold,
                silence_chunks: self.audio.silence_chunks,
                min_segment_ms: self.audio.min_segment_ms,
                pre_roll_chunks: self.audio.pre_roll_chunks,
            },
            system_prompt: self.agent.system_prompt.clone(),
            trigger_phrase: self.agent.trigger_phrase.clone(),
            ack_timeout: Duration::from_secs(self.agent.ack_timeout_secs),
            attendee: self.agent.attendee.clone(),
            default_utc_offset_minutes: self.scheduling.default_utc_offset_minutes,
            fallback_reply: self.agent.fallback_reply.clone(),
            scheduled_reply: self.agent.scheduled_reply.clone(),
            schedule_failed_reply: self.agent.schedule_failed_reply.clone(),
        }
    }
}

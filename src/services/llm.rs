//! OpenAI-compatible HTTP adapter (Groq by default) for transcription,
//! replies and meeting extraction.

use chrono::Local;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

use super::error::{ensure_success, ServiceError, ServiceResult};
use super::traits::{Extractor, Responder, Transcriber};
use crate::audio::{pcm, AudioSegment};
use crate::config::LlmConfig;
use crate::session::{Role, Turn};

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: Role,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

pub struct LlmClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    chat_model: String,
    extraction_model: String,
    transcription_model: String,
    language: String,
}

impl LlmClient {
    pub fn new(config: &LlmConfig, api_key: String) -> ServiceResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            chat_model: config.chat_model.clone(),
            extraction_model: config.extraction_model.clone(),
            transcription_model: config.transcription_model.clone(),
            language: config.language.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn chat(
        &self,
        model: &str,
        messages: Vec<ChatMessage<'_>>,
        response_format: Option<ResponseFormat>,
    ) -> ServiceResult<String> {
        let request = ChatRequest {
            model,
            messages,
            response_format,
        };

        let response = self
            .http
            .post(self.url("chat/completions"))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let body: ChatResponse = ensure_success("chat completions", response)
            .await?
            .json()
            .await?;

        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| ServiceError::InvalidResponse {
                service: "chat completions",
                message: "no message content".to_string(),
            })
    }
}

/// System prompt first, then the non-system turns of `history`
fn chat_messages<'a>(system_prompt: &'a str, history: &'a [Turn]) -> Vec<ChatMessage<'a>> {
    std::iter::once(ChatMessage {
        role: Role::System,
        content: system_prompt,
    })
    .chain(
        history
            .iter()
            .filter(|turn| turn.role != Role::System)
            .map(|turn| ChatMessage {
                role: turn.role,
                content: &turn.content,
            }),
    )
    .collect()
}

fn extraction_prompt(today: &str) -> String {
    format!(
        r#"Extract the following details from the conversation as a flat JSON object.
Reference date (TODAY): {today}

{{
    "summary": "meeting title (use 'Meeting' if not specified)",
    "start_time": "ISO 8601 format (e.g., 2026-10-27T10:00:00, assume future year based on reference date)",
    "duration_minutes": 30
}}

Return ONLY the JSON object. Do not nest it under any key."#
    )
}

#[async_trait::async_trait]
impl Transcriber for LlmClient {
    async fn transcribe(&self, segment: &AudioSegment) -> ServiceResult<String> {
        let wav = pcm::encode_wav(&segment.pcm, segment.sample_rate)?;
        debug!(
            "Sending {}ms of audio ({} bytes WAV) for transcription",
            segment.duration_ms(),
            wav.len()
        );

        let form = Form::new()
            .part(
                "file",
                Part::bytes(wav).file_name("audio.wav").mime_str("audio/wav")?,
            )
            .text("model", self.transcription_model.clone())
            .text("language", self.language.clone())
            .text("response_format", "json");

        let response = self
            .http
            .post(self.url("audio/transcriptions"))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;

        let body: TranscriptionResponse = ensure_success("transcription", response)
            .await?
            .json()
            .await?;

        Ok(body.text)
    }
}

#[async_trait::async_trait]
impl Responder for LlmClient {
    async fn reply(&self, history: &[Turn], system_prompt: &str) -> ServiceResult<String> {
        info!("Requesting LLM response using model: {}", self.chat_model);
        self.chat(&self.chat_model, chat_messages(system_prompt, history), None)
            .await
    }
}

#[async_trait::async_trait]
impl Extractor for LlmClient {
    async fn extract(&self, history: &[Turn]) -> ServiceResult<serde_json::Value> {
        let today = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        let prompt = extraction_prompt(&today);

        let content = self
            .chat(
                &self.extraction_model,
                chat_messages(&prompt, history),
                Some(ResponseFormat {
                    kind: "json_object",
                }),
            )
            .await?;

        Ok(serde_json::from_str(&content)?)
    }
}

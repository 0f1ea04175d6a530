// Shared fixtures: PCM chunk builders and scripted collaborators
#![allow(dead_code)]

use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use voice_agent::protocol::{OutboundFrame, ServerMessage};
use voice_agent::services::{BrowserSynthesizer, ServiceResult};
use voice_agent::{
    AudioSegment, DuplexController, Extractor, Responder, ScheduleRequest, ScheduledEvent,
    Scheduler, SegmenterConfig, ServiceError, Services, SessionConfig, Transcriber, Turn,
};

pub const SAMPLE_RATE: u32 = 16000;
/// 20ms at 16kHz
pub const CHUNK_SAMPLES: usize = 320;
pub const CHUNK_BYTES: usize = CHUNK_SAMPLES * 2;

pub fn segmenter_config() -> SegmenterConfig {
    SegmenterConfig {
        sample_rate: SAMPLE_RATE,
        silence_threshold: 500.0,
        silence_chunks: 3,
        min_segment_ms: 100, // 3200 bytes = 5 chunks
        pre_roll_chunks: 0,
    }
}

pub fn session_config() -> SessionConfig {
    SessionConfig {
        session_id: "test-session".to_string(),
        segmenter: segmenter_config(),
        ack_timeout: Duration::from_secs(5),
        attendee: "guest@example.com".to_string(),
        default_utc_offset_minutes: 0,
        ..SessionConfig::default()
    }
}

fn chunk(amplitude: i16, samples: usize) -> Vec<u8> {
    (0..samples)
        .flat_map(|i| {
            let s = if i % 2 == 0 { amplitude } else { -amplitude };
            s.to_le_bytes()
        })
        .collect()
}

/// Above-threshold chunk
pub fn speech() -> Vec<u8> {
    chunk(8000, CHUNK_SAMPLES)
}

/// Below-threshold chunk
pub fn silence() -> Vec<u8> {
    chunk(20, CHUNK_SAMPLES)
}

/// Chunks that make one finalized utterance: speech then endpointing silence
pub fn utterance_chunks(speech_chunks: usize) -> Vec<Vec<u8>> {
    let mut chunks = vec![speech(); speech_chunks];
    chunks.extend(vec![silence(); segmenter_config().silence_chunks]);
    chunks
}

/// Returns scripted texts in order, then errors
#[derive(Default)]
pub struct ScriptedTranscriber {
    texts: Mutex<VecDeque<String>>,
    pub calls: Mutex<Vec<usize>>,
}

impl ScriptedTranscriber {
    pub fn new(texts: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            texts: Mutex::new(texts.iter().map(|t| t.to_string()).collect()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl Transcriber for ScriptedTranscriber {
    async fn transcribe(&self, segment: &AudioSegment) -> ServiceResult<String> {
        self.calls.lock().unwrap().push(segment.len());
        self.texts
            .lock()
            .unwrap()
            .pop_front()
            .ok_or(ServiceError::NotConfigured("transcript script"))
    }
}

/// Replies "reply to: <last user turn>" unless scripted otherwise
#[derive(Default)]
pub struct EchoResponder {
    replies: Mutex<VecDeque<ServiceResult<String>>>,
    pub histories: Mutex<Vec<Vec<Turn>>>,
}

impl EchoResponder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn scripted(replies: Vec<ServiceResult<String>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            histories: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait::async_trait]
impl Responder for EchoResponder {
    async fn reply(&self, history: &[Turn], _system_prompt: &str) -> ServiceResult<String> {
        self.histories.lock().unwrap().push(history.to_vec());
        if let Some(reply) = self.replies.lock().unwrap().pop_front() {
            return reply;
        }
        let last = history.last().map(|t| t.content.clone()).unwrap_or_default();
        Ok(format!("reply to: {}", last))
    }
}

/// Echo replies that each wait for a permit on `gate`
pub struct GatedResponder {
    pub gate: tokio::sync::Semaphore,
    /// Signalled whenever a reply call starts waiting
    pub entered: tokio::sync::Notify,
    pub histories: Mutex<Vec<Vec<Turn>>>,
}

impl GatedResponder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            gate: tokio::sync::Semaphore::new(0),
            entered: tokio::sync::Notify::new(),
            histories: Mutex::new(Vec::new()),
        })
    }

    pub fn release_one(&self) {
        self.gate.add_permits(1);
    }
}

#[async_trait::async_trait]
impl Responder for GatedResponder {
    async fn reply(&self, history: &[Turn], _system_prompt: &str) -> ServiceResult<String> {
        self.histories.lock().unwrap().push(history.to_vec());
        self.entered.notify_one();
        if let Ok(permit) = self.gate.acquire().await {
            permit.forget();
        }
        let last = history.last().map(|t| t.content.clone()).unwrap_or_default();
        Ok(format!("reply to: {}", last))
    }
}

pub struct FixedExtractor {
    result: Mutex<Option<ServiceResult<Value>>>,
    pub calls: Mutex<usize>,
}

impl FixedExtractor {
    pub fn returning(value: Value) -> Arc<Self> {
        Arc::new(Self {
            result: Mutex::new(Some(Ok(value))),
            calls: Mutex::new(0),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            result: Mutex::new(Some(Err(ServiceError::NotConfigured("extractor")))),
            calls: Mutex::new(0),
        })
    }
}

#[async_trait::async_trait]
impl Extractor for FixedExtractor {
    async fn extract(&self, _history: &[Turn]) -> ServiceResult<Value> {
        *self.calls.lock().unwrap() += 1;
        match self.result.lock().unwrap().take() {
            Some(result) => result,
            None => Err(ServiceError::NotConfigured("extractor")),
        }
    }
}

pub struct RecordingScheduler {
    succeed: bool,
    pub requests: Mutex<Vec<ScheduleRequest>>,
}

impl RecordingScheduler {
    pub fn new(succeed: bool) -> Arc<Self> {
        Arc::new(Self {
            succeed,
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<ScheduleRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Scheduler for RecordingScheduler {
    async fn create_event(&self, request: &ScheduleRequest) -> ServiceResult<ScheduledEvent> {
        self.requests.lock().unwrap().push(request.clone());
        if self.succeed {
            Ok(ScheduledEvent {
                id: Some("evt-1".to_string()),
                link: None,
            })
        } else {
            Err(ServiceError::NotConfigured("calendar"))
        }
    }
}

pub fn services(
    transcriber: Arc<ScriptedTranscriber>,
    responder: Arc<EchoResponder>,
    extractor: Arc<FixedExtractor>,
    scheduler: Arc<RecordingScheduler>,
) -> Services {
    Services {
        transcriber,
        responder,
        extractor,
        synthesizer: Arc::new(BrowserSynthesizer),
        scheduler,
    }
}

/// Texts of every `speak` instruction in `frames`
pub fn spoken(frames: &[OutboundFrame]) -> Vec<String> {
    frames
        .iter()
        .filter_map(|frame| match frame {
            OutboundFrame::Message(ServerMessage::Speak { text }) => Some(text.clone()),
            _ => None,
        })
        .collect()
}

/// Acknowledge every `speak` as soon as it is seen, recording all frames
pub fn auto_acknowledge(
    duplex: Arc<DuplexController>,
    mut outbound: mpsc::UnboundedReceiver<OutboundFrame>,
) -> Arc<Mutex<Vec<OutboundFrame>>> {
    let frames = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&frames);

    tokio::spawn(async move {
        while let Some(frame) = outbound.recv().await {
            let is_speak = matches!(frame, OutboundFrame::Message(ServerMessage::Speak { .. }));
            seen.lock().unwrap().push(frame);
            if is_speak {
                duplex.acknowledge().await;
            }
        }
    });

    frames
}

use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::stats::SessionCounters;
use crate::audio::AudioSegment;
use crate::protocol::{OutboundFrame, ServerMessage};
use crate::services::Transcriber;

/// Drain finalized segments in order, turning each into at most one
/// utterance. Runs until the segment queue closes.
pub async fn run_transcription(
    mut segments: mpsc::UnboundedReceiver<AudioSegment>,
    transcriber: Arc<dyn Transcriber>,
    utterances: mpsc::UnboundedSender<String>,
    outbound: mpsc::UnboundedSender<OutboundFrame>,
    counters: Arc<SessionCounters>,
) {
    debug!("Transcription worker started");

    while let Some(segment) = segments.recv().await {
        SessionCounters::incr(&counters.transcriptions);

        let text = match transcriber.transcribe(&segment).await {
            Ok(text) => text.trim().to_string(),
            Err(e) => {
                warn!("Transcription failed, dropping {}ms segment: {}", segment.duration_ms(), e);
                continue;
            }
        };

        if text.is_empty() {
            debug!("Empty transcription for {}ms segment", segment.duration_ms());
            continue;
        }

        info!("Transcript: '{}'", text);
        SessionCounters::incr(&counters.utterances);

        let _ = outbound.send(ServerMessage::Transcript { text: text.clone() }.into());
        if utterances.send(text).is_err() {
            debug!("Conversation loop gone, utterance not queued");
        }
    }

    debug!("Transcription worker stopped");
}

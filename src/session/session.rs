use chrono::{DateTime, Utc};
use futures::stream::{Stream, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use super::config::SessionConfig;
use super::conversation::Turn;
use super::duplex::DuplexController;
use super::sequencer::TurnSequencer;
use super::stats::{SessionCounters, SessionStats};
use super::transcription::run_transcription;
use crate::audio::Segmenter;
use crate::protocol::{ClientMessage, InboundFrame, OutboundFrame};
use crate::scheduling::SchedulingBridge;
use crate::services::Services;

/// One connection's conversation: segmentation, half-duplex gating,
/// transcription and the turn loop.
pub struct VoiceSession {
    config: SessionConfig,
    services: Services,
    segmenter: Arc<Segmenter>,
    counters: Arc<SessionCounters>,
    started_at: DateTime<Utc>,
}

/// Read-only view used by the status endpoints
#[derive(Clone)]
pub struct SessionHandle {
    session_id: String,
    sample_rate: u32,
    started_at: DateTime<Utc>,
    segmenter: Arc<Segmenter>,
    counters: Arc<SessionCounters>,
}

impl SessionHandle {
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn stats(&self) -> SessionStats {
        SessionStats::snapshot(
            &self.session_id,
            self.sample_rate,
            self.started_at,
            &self.counters,
            self.segmenter.discarded_count(),
        )
    }
}

/// What a finished session leaves behind
#[derive(Debug, Clone)]
pub struct SessionReport {
    pub stats: SessionStats,
    pub conversation: Vec<Turn>,
}

impl VoiceSession {
    pub fn new(config: SessionConfig, services: Services) -> Self {
        info!(
            "Creating voice session: {} ({}Hz)",
            config.session_id,
            config.sample_rate()
        );

        let segmenter = Arc::new(Segmenter::new(config.segmenter.clone()));

        Self {
            config,
            services,
            segmenter,
            counters: Arc::new(SessionCounters::default()),
            started_at: Utc::now(),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.config.session_id
    }

    pub fn handle(&self) -> SessionHandle {
        SessionHandle {
            session_id: self.config.session_id.clone(),
            sample_rate: self.config.sample_rate(),
            started_at: self.started_at,
            segmenter: Arc::clone(&self.segmenter),
            counters: Arc::clone(&self.counters),
        }
    }

    /// Drive the session until `inbound` ends (client disconnect).
    ///
    /// The calling task is the inbound reader; transcription and the turn
    /// loop run on their own tasks so the reader never waits on a
    /// collaborator.
    pub async fn run<S>(self, inbound: S, outbound: mpsc::UnboundedSender<OutboundFrame>) -> SessionReport
    where
        S: Stream<Item = InboundFrame>,
    {
        let handle = self.handle();
        let (segment_tx, segment_rx) = mpsc::unbounded_channel();
        let (utterance_tx, utterance_rx) = mpsc::unbounded_channel();

        let duplex = Arc::new(DuplexController::new(
            Arc::clone(&self.segmenter),
            segment_tx,
            outbound.clone(),
            Arc::clone(&self.services.synthesizer),
            self.config.ack_timeout,
            Arc::clone(&self.counters),
        ));

        let transcription_task = tokio::spawn(run_transcription(
            segment_rx,
            Arc::clone(&self.services.transcriber),
            utterance_tx,
            outbound,
            Arc::clone(&self.counters),
        ));

        let bridge = SchedulingBridge::new(
            Arc::clone(&self.services.extractor),
            Arc::clone(&self.services.scheduler),
            &self.config,
        );
        let sequencer = TurnSequencer::new(
            &self.config,
            Arc::clone(&duplex),
            Arc::clone(&self.services.responder),
            bridge,
            Arc::clone(&self.counters),
        );
        let conversation = sequencer.conversation();
        let sequencer_task = tokio::spawn(sequencer.run(utterance_rx));

        info!("Session {} started", self.config.session_id);

        let mut inbound = std::pin::pin!(inbound);
        while let Some(frame) = inbound.next().await {
            match frame {
                InboundFrame::Audio(chunk) => {
                    duplex.offer_chunk(&chunk).await;
                }
                InboundFrame::Control(text) => match ClientMessage::parse(&text) {
                    Ok(ClientMessage::Unmute) => {
                        duplex.acknowledge().await;
                    }
                    Err(e) => debug!("Ignoring malformed control message {:?}: {}", text, e),
                },
            }
        }

        info!("Client disconnected from session {}", self.config.session_id);

        // Capture any trailing speech, then abandon the turn loop; its
        // outstanding collaborator calls are not awaited.
        duplex.close().await;
        sequencer_task.abort();
        if let Err(e) = sequencer_task.await {
            if !e.is_cancelled() {
                error!("Conversation task panicked: {}", e);
            }
        }

        // Last handle on the segment queue; the worker drains and exits
        drop(duplex);
        if let Err(e) = transcription_task.await {
            error!("Transcription task panicked: {}", e);
        }

        let conversation = conversation.lock().await.clone().into_turns();
        let stats = handle.stats();
        info!(
            "Session {} closed after {:.1}s ({} turns)",
            stats.session_id, stats.duration_secs, stats.turns
        );

        SessionReport {
            stats,
            conversation,
        }
    }
}

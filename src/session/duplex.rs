//! Half-duplex speak/acknowledge controller
//!
//! While the agent's reply is playing on the client, inbound audio is
//! dropped before it reaches the segmenter so the session never
//! transcribes its own voice or room echo.
//!
//! ```text
//!   Listening ──speak()──▶ AgentSpeaking ──unmute | timeout──▶ Listening
//!   flush(true), arm ack     deliver text                    flush(false)
//! ```

use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, Mutex};
use tracing::{debug, info, warn};

use super::stats::SessionCounters;
use crate::audio::{AudioSegment, Segmenter};
use crate::protocol::{OutboundFrame, ServerMessage};
use crate::services::Synthesizer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplexState {
    Listening,
    AgentSpeaking,
}

/// How a speak cycle returned to `Listening`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackOutcome {
    /// Client signalled playback completion
    Acknowledged,
    /// No acknowledgment within the timeout
    TimedOut,
}

pub struct DuplexController {
    state: Mutex<DuplexState>,
    /// Held for a whole speak cycle; overlapping `speak` calls queue here
    cycle: Mutex<()>,
    /// Armed for exactly one speak cycle
    pending_ack: Mutex<Option<oneshot::Sender<()>>>,
    segmenter: Arc<Segmenter>,
    segments: mpsc::UnboundedSender<AudioSegment>,
    outbound: mpsc::UnboundedSender<OutboundFrame>,
    synthesizer: Arc<dyn Synthesizer>,
    ack_timeout: Duration,
    counters: Arc<SessionCounters>,
}

impl DuplexController {
    pub fn new(
        segmenter: Arc<Segmenter>,
        segments: mpsc::UnboundedSender<AudioSegment>,
        outbound: mpsc::UnboundedSender<OutboundFrame>,
        synthesizer: Arc<dyn Synthesizer>,
        ack_timeout: Duration,
        counters: Arc<SessionCounters>,
    ) -> Self {
        Self {
            state: Mutex::new(DuplexState::Listening),
            cycle: Mutex::new(()),
            pending_ack: Mutex::new(None),
            segmenter,
            segments,
            outbound,
            synthesizer,
            ack_timeout,
            counters,
        }
    }

    pub async fn state(&self) -> DuplexState {
        *self.state.lock().await
    }

    /// Route an inbound chunk through the mute gate.
    ///
    /// Returns `true` if the chunk reached the segmenter.
    pub async fn offer_chunk(&self, chunk: &[u8]) -> bool {
        SessionCounters::incr(&self.counters.chunks_received);

        let state = self.state.lock().await;
        if *state == DuplexState::AgentSpeaking {
            SessionCounters::incr(&self.counters.chunks_muted);
            return false;
        }

        if let Some(segment) = self.segmenter.add_chunk(chunk).await {
            self.dispatch(segment);
        }
        true
    }

    /// Signal playback completion for the cycle in flight.
    ///
    /// Returns `false` when no cycle is waiting; such stray
    /// acknowledgments are ignored.
    pub async fn acknowledge(&self) -> bool {
        match self.pending_ack.lock().await.take() {
            Some(ack) => ack.send(()).is_ok(),
            None => {
                debug!("Ignoring unmute with no speak cycle in flight");
                false
            }
        }
    }

    /// Run one full speak/acknowledge cycle for `text`.
    ///
    /// Returns once the controller is back in `Listening`. A call made
    /// while another cycle is in flight waits for that cycle to finish.
    pub async fn speak(&self, text: &str) -> PlaybackOutcome {
        let _cycle = self.cycle.lock().await;
        let ack = self.begin_speaking().await;

        let outcome = if self.deliver(text).await {
            match tokio::time::timeout(self.ack_timeout, ack).await {
                Ok(Ok(())) => PlaybackOutcome::Acknowledged,
                _ => PlaybackOutcome::TimedOut,
            }
        } else {
            PlaybackOutcome::TimedOut
        };

        self.finish_speaking().await;

        SessionCounters::incr(&self.counters.speak_cycles);
        match outcome {
            PlaybackOutcome::Acknowledged => debug!("Playback acknowledged, listening"),
            PlaybackOutcome::TimedOut => {
                SessionCounters::incr(&self.counters.ack_timeouts);
                warn!(
                    "No playback acknowledgment after {:?}, resuming listening",
                    self.ack_timeout
                );
            }
        }

        outcome
    }

    /// Final flush on disconnect: keep trailing user audio if listening,
    /// drop in-flight audio if muted.
    pub async fn close(&self) {
        let state = self.state.lock().await;
        match *state {
            DuplexState::Listening => {
                if let Some(segment) = self.segmenter.flush(true).await {
                    info!("Flushing {}ms of trailing audio on disconnect", segment.duration_ms());
                    self.dispatch(segment);
                }
            }
            DuplexState::AgentSpeaking => {
                self.segmenter.flush(false).await;
            }
        }
    }

    async fn begin_speaking(&self) -> oneshot::Receiver<()> {
        let mut state = self.state.lock().await;

        // Capture whatever the user said right before the mute
        if let Some(segment) = self.segmenter.flush(true).await {
            self.dispatch(segment);
        }

        let (tx, rx) = oneshot::channel();
        *self.pending_ack.lock().await = Some(tx);
        *state = DuplexState::AgentSpeaking;
        debug!("Muted microphone for agent speech");

        rx
    }

    async fn finish_speaking(&self) {
        let mut state = self.state.lock().await;

        self.pending_ack.lock().await.take();
        self.segmenter.flush(false).await;
        *state = DuplexState::Listening;
    }

    /// Returns `false` when the connection writer is gone and no
    /// acknowledgment can arrive.
    async fn deliver(&self, text: &str) -> bool {
        let messages = [
            ServerMessage::Response {
                text: text.to_string(),
            },
            ServerMessage::Speak {
                text: text.to_string(),
            },
        ];
        for message in messages {
            if self.outbound.send(message.into()).is_err() {
                debug!("Connection writer closed, reply not delivered");
                return false;
            }
        }

        match self.synthesizer.synthesize(text).await {
            Ok(Some(audio)) => {
                let _ = self.outbound.send(OutboundFrame::Audio(audio));
            }
            Ok(None) => {}
            Err(e) => warn!("Speech synthesis failed, client will speak text: {}", e),
        }
        true
    }

    fn dispatch(&self, segment: AudioSegment) {
        SessionCounters::incr(&self.counters.segments_finalized);
        if self.segments.send(segment).is_err() {
            warn!("Transcription worker gone, dropping segment");
        }
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Live counters shared by a session's tasks
#[derive(Debug, Default)]
pub struct SessionCounters {
    pub chunks_received: AtomicUsize,
    pub chunks_muted: AtomicUsize,
    pub segments_finalized: AtomicUsize,
    pub transcriptions: AtomicUsize,
    pub utterances: AtomicUsize,
    pub turns: AtomicUsize,
    pub speak_cycles: AtomicUsize,
    pub ack_timeouts: AtomicUsize,
    pub events_scheduled: AtomicUsize,
    pub scheduling_failures: AtomicUsize,
}

impl SessionCounters {
    pub fn incr(counter: &AtomicUsize) {
        counter.fetch_add(1, Ordering::SeqCst);
    }

    fn get(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

/// Statistics about a voice session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStats {
    pub session_id: String,

    /// Client audio sample rate in Hz
    pub sample_rate: u32,

    /// When the connection was accepted
    pub started_at: DateTime<Utc>,

    /// Total duration in seconds
    pub duration_secs: f64,

    /// Audio chunks received from the client
    pub chunks_received: usize,

    /// Chunks dropped because the agent was speaking
    pub chunks_muted: usize,

    /// Segments handed to transcription
    pub segments_finalized: usize,

    /// Segments discarded as too short
    pub segments_discarded: usize,

    /// Transcription calls made
    pub transcriptions: usize,

    /// Non-empty utterances queued for the conversation loop
    pub utterances: usize,

    /// User and assistant turns appended (system turn excluded)
    pub turns: usize,

    /// Completed speak/acknowledge cycles
    pub speak_cycles: usize,

    /// Cycles that ended on timeout instead of acknowledgment
    pub ack_timeouts: usize,

    pub events_scheduled: usize,
    pub scheduling_failures: usize,
}

impl SessionStats {
    pub(crate) fn snapshot(
        session_id: &str,
        sample_rate: u32,
        started_at: DateTime<Utc>,
        counters: &SessionCounters,
        segments_discarded: usize,
    ) -> Self {
        let duration = Utc::now().signed_duration_since(started_at);

        Self {
            session_id: session_id.to_string(),
            sample_rate,
            started_at,
            duration_secs: duration.num_milliseconds() as f64 / 1000.0,
            chunks_received: SessionCounters::get(&counters.chunks_received),
            chunks_muted: SessionCounters::get(&counters.chunks_muted),
            segments_finalized: SessionCounters::get(&counters.segments_finalized),
            segments_discarded,
            transcriptions: SessionCounters::get(&counters.transcriptions),
            utterances: SessionCounters::get(&counters.utterances),
            turns: SessionCounters::get(&counters.turns),
            speak_cycles: SessionCounters::get(&counters.speak_cycles),
            ack_timeouts: SessionCounters::get(&counters.ack_timeouts),
            events_scheduled: SessionCounters::get(&counters.events_scheduled),
            scheduling_failures: SessionCounters::get(&counters.scheduling_failures),
        }
    }
}

pub mod audio;
pub mod config;
pub mod http;
pub mod protocol;
pub mod scheduling;
pub mod services;
pub mod session;

pub use audio::{AudioSegment, Segmenter, SegmenterConfig};
pub use config::Config;
pub use http::{create_router, AppState};
pub use protocol::{ClientMessage, InboundFrame, OutboundFrame, ServerMessage};
pub use scheduling::{BridgeOutcome, ScheduleRequest, ScheduledEvent, SchedulingBridge};
pub use services::{
    Extractor, Responder, Scheduler, ServiceError, Services, Synthesizer, Transcriber,
};
pub use session::{
    Conversation, DuplexController, DuplexState, PlaybackOutcome, Role, SessionConfig,
    SessionReport, SessionStats, Turn, TurnSequencer, VoiceSession,
};

//! Meeting extraction and scheduling, run when a reply contains the
//! trigger phrase.

mod bridge;
mod request;

pub use bridge::{BridgeOutcome, SchedulingBridge};
pub use request::{
    parse_start_time, MeetingDetails, ScheduleRequest, ScheduledEvent, DEFAULT_DURATION_MINUTES,
    DEFAULT_SUMMARY,
};

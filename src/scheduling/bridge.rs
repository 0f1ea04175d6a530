use chrono::{FixedOffset, Offset, Utc};
use std::sync::Arc;
use tracing::{error, info, warn};

use super::request::{MeetingDetails, ScheduleRequest};
use crate::services::{Extractor, Scheduler};
use crate::session::{SessionConfig, Turn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeOutcome {
    /// Nothing to schedule; the conversation continues without comment
    NoAction,
    Scheduled(ScheduleRequest),
    Failed(ScheduleRequest),
}

/// Turns conversation history into at most one scheduled event
pub struct SchedulingBridge {
    extractor: Arc<dyn Extractor>,
    scheduler: Arc<dyn Scheduler>,
    attendee: String,
    default_offset: FixedOffset,
    scheduled_reply: String,
    schedule_failed_reply: String,
}

impl SchedulingBridge {
    pub fn new(
        extractor: Arc<dyn Extractor>,
        scheduler: Arc<dyn Scheduler>,
        config: &SessionConfig,
    ) -> Self {
        let default_offset = FixedOffset::east_opt(config.default_utc_offset_minutes * 60)
            .unwrap_or_else(|| Utc.fix());

        Self {
            extractor,
            scheduler,
            attendee: config.attendee.clone(),
            default_offset,
            scheduled_reply: config.scheduled_reply.clone(),
            schedule_failed_reply: config.schedule_failed_reply.clone(),
        }
    }

    /// Extract meeting fields from `history` and, if a start time was
    /// found, call the scheduler exactly once.
    pub async fn handle_trigger(&self, history: &[Turn]) -> BridgeOutcome {
        let extracted = match self.extractor.extract(history).await {
            Ok(value) => value,
            Err(e) => {
                error!("Meeting extraction failed: {}", e);
                return BridgeOutcome::NoAction;
            }
        };
        info!("Extracted details: {}", extracted);

        let Some(details) = MeetingDetails::from_value(&extracted, self.default_offset) else {
            warn!("Extraction result is not an object, skipping scheduling");
            return BridgeOutcome::NoAction;
        };

        let Some(request) = details.into_request(&self.attendee) else {
            info!("No usable start time extracted, skipping scheduling");
            return BridgeOutcome::NoAction;
        };

        info!(
            "Scheduling '{}' at {} for {} minutes",
            request.summary, request.start_time, request.duration_minutes
        );

        match self.scheduler.create_event(&request).await {
            Ok(event) => {
                info!("Event created: {:?}", event.link.or(event.id));
                BridgeOutcome::Scheduled(request)
            }
            Err(e) => {
                error!("Error creating event: {}", e);
                BridgeOutcome::Failed(request)
            }
        }
    }

    /// Text to speak for an outcome, if any
    pub fn confirmation(&self, outcome: &BridgeOutcome) -> Option<&str> {
        match outcome {
            BridgeOutcome::NoAction => None,
            BridgeOutcome::Scheduled(_) => Some(&self.scheduled_reply),
            BridgeOutcome::Failed(_) => Some(&self.schedule_failed_reply),
        }
    }
}

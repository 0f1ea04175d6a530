use reqwest::StatusCode;
use serde::Serialize;
use std::time::Duration;
use tracing::{info, warn};

use super::error::{ensure_success, ServiceError, ServiceResult};
use super::traits::Scheduler;
use crate::scheduling::{ScheduleRequest, ScheduledEvent};

const SERVICE: &str = "scheduling webhook";

/// Event body posted to the webhook
#[derive(Debug, Serialize)]
struct EventPayload<'a> {
    summary: &'a str,
    start: String,
    end: String,
    duration_minutes: u32,
    attendees: Vec<&'a str>,
}

impl<'a> EventPayload<'a> {
    fn new(request: &'a ScheduleRequest, with_attendees: bool) -> Self {
        let attendees = if with_attendees && !request.attendee.is_empty() {
            vec![request.attendee.as_str()]
        } else {
            Vec::new()
        };

        Self {
            summary: &request.summary,
            start: request.start_time.to_rfc3339(),
            end: request.end_time().to_rfc3339(),
            duration_minutes: request.duration_minutes,
            attendees,
        }
    }
}

/// Creates events by POSTing JSON to a configured endpoint
pub struct WebhookScheduler {
    http: reqwest::Client,
    url: String,
}

impl WebhookScheduler {
    pub fn new(url: String, timeout: Duration) -> ServiceResult<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http, url })
    }

    async fn post(&self, payload: &EventPayload<'_>) -> ServiceResult<reqwest::Response> {
        Ok(self.http.post(&self.url).json(payload).send().await?)
    }
}

#[async_trait::async_trait]
impl Scheduler for WebhookScheduler {
    async fn create_event(&self, request: &ScheduleRequest) -> ServiceResult<ScheduledEvent> {
        let payload = EventPayload::new(request, true);
        let mut response = self.post(&payload).await?;

        // Some calendar accounts may not invite attendees; retry bare
        if response.status() == StatusCode::FORBIDDEN && !payload.attendees.is_empty() {
            warn!("Backend refused attendee invites. Retrying without attendees.");
            response = self.post(&EventPayload::new(request, false)).await?;
        }

        let body = ensure_success(SERVICE, response).await?.text().await?;
        let event: ScheduledEvent = serde_json::from_str(&body).unwrap_or_default();
        info!("Scheduling backend accepted '{}'", request.summary);

        Ok(event)
    }
}

/// Used when no scheduling backend is configured; every request fails
#[derive(Debug, Default, Clone)]
pub struct DisabledScheduler;

#[async_trait::async_trait]
impl Scheduler for DisabledScheduler {
    async fn create_event(&self, _request: &ScheduleRequest) -> ServiceResult<ScheduledEvent> {
        Err(ServiceError::NotConfigured(SERVICE))
    }
}

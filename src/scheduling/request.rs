use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const DEFAULT_SUMMARY: &str = "Meeting";
pub const DEFAULT_DURATION_MINUTES: u32 = 30;

/// Zone-less layouts accepted for extracted start times
const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Offset without a colon (`+0530`), which RFC 3339 rejects
const OFFSET_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f%z";

/// A validated event creation request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleRequest {
    pub summary: String,
    pub start_time: DateTime<FixedOffset>,
    pub duration_minutes: u32,
    pub attendee: String,
}

impl ScheduleRequest {
    pub fn end_time(&self) -> DateTime<FixedOffset> {
        self.start_time + Duration::minutes(self.duration_minutes as i64)
    }
}

/// What the scheduling backend reports back
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledEvent {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, alias = "htmlLink", alias = "html_link")]
    pub link: Option<String>,
}

/// Meeting fields normalised from an extraction result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeetingDetails {
    pub summary: String,
    pub start_time: Option<DateTime<FixedOffset>>,
    pub duration_minutes: u32,
}

impl MeetingDetails {
    /// Normalise an extracted JSON object.
    ///
    /// An object whose only field is itself an object (`{"meeting": {..}}`)
    /// is unwrapped one level. Returns `None` for non-objects.
    pub fn from_value(value: &Value, default_offset: FixedOffset) -> Option<Self> {
        let mut fields: &Map<String, Value> = value.as_object()?;
        if fields.len() == 1 {
            if let Some(Value::Object(inner)) = fields.values().next() {
                fields = inner;
            }
        }

        let summary = non_empty_str(fields.get("summary"))
            .or_else(|| non_empty_str(fields.get("title")))
            .unwrap_or(DEFAULT_SUMMARY)
            .to_string();

        let duration_minutes = fields
            .get("duration_minutes")
            .and_then(parse_minutes)
            .unwrap_or(DEFAULT_DURATION_MINUTES);

        let start_time = fields
            .get("start_time")
            .and_then(Value::as_str)
            .and_then(|raw| parse_start_time(raw, default_offset));

        Some(Self {
            summary,
            start_time,
            duration_minutes,
        })
    }

    /// `None` when no usable start time was extracted
    pub fn into_request(self, attendee: &str) -> Option<ScheduleRequest> {
        Some(ScheduleRequest {
            summary: self.summary,
            start_time: self.start_time?,
            duration_minutes: self.duration_minutes,
            attendee: attendee.to_string(),
        })
    }
}

/// Parse an ISO 8601 timestamp with an offset, or a zone-less date-time
/// (or bare date, taken as midnight) in `default_offset`.
pub fn parse_start_time(raw: &str, default_offset: FixedOffset) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed);
    }
    if let Ok(parsed) = DateTime::parse_from_str(raw, OFFSET_FORMAT) {
        return Some(parsed);
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .and_then(|naive| naive.and_local_timezone(default_offset).single())
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn parse_minutes(value: &Value) -> Option<u32> {
    let minutes = match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 1.0).map(|f| f.round() as u64)),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    }?;

    u32::try_from(minutes).ok().filter(|m| *m > 0)
}

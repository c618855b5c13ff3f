//! Webhook event kinds, lookup tables and payload enrichment.

use chrono::DateTime;
use serde::Serialize;
use serde_json::{Map, Value};

/// Name given to event type codes missing from the table.
pub const UNKNOWN_EVENT: &str = "unknown_event";
/// Platform name for codes missing from the platform table.
pub const UNKNOWN_PLATFORM: &str = "Unknown";
/// Leave reason for codes missing from the reason table.
pub const UNKNOWN_REASON: &str = "Unknown reason";

const PLATFORMS: &[(i64, &str)] = &[
    (0, "Other platforms"),
    (1, "Android"),
    (2, "iOS"),
    (5, "Windows"),
    (6, "Linux"),
    (7, "Web"),
    (8, "macOS"),
];

const LEAVE_REASONS: &[(i64, &str)] = &[
    (0, "Other reasons"),
    (1, "Normal leave"),
    (2, "Connection timeout"),
    (3, "Permission issue"),
    (4, "Server internal reason"),
    (5, "Device switch"),
    (9, "Multiple IP addresses"),
    (10, "Network connection problem"),
    (999, "Abnormal user"),
];

const EVENT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Channel event kinds known to this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    ChannelCreate,
    ChannelDestroy,
    BroadcasterJoinChannel,
    BroadcasterLeaveChannel,
    AudienceJoinChannel,
    AudienceLeaveChannel,
    ClientRoleChangeToBroadcaster,
    ClientRoleChangeToAudience,
}

impl EventType {
    pub const ALL: [EventType; 8] = [
        EventType::ChannelCreate,
        EventType::ChannelDestroy,
        EventType::BroadcasterJoinChannel,
        EventType::BroadcasterLeaveChannel,
        EventType::AudienceJoinChannel,
        EventType::AudienceLeaveChannel,
        EventType::ClientRoleChangeToBroadcaster,
        EventType::ClientRoleChangeToAudience,
    ];

    pub fn code(&self) -> i64 {
        match self {
            EventType::ChannelCreate => 101,
            EventType::ChannelDestroy => 102,
            EventType::BroadcasterJoinChannel => 103,
            EventType::BroadcasterLeaveChannel => 104,
            EventType::AudienceJoinChannel => 105,
            EventType::AudienceLeaveChannel => 106,
            EventType::ClientRoleChangeToBroadcaster => 111,
            EventType::ClientRoleChangeToAudience => 112,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|event| event.code() == code)
    }

    pub fn name(&self) -> &'static str {
        match self {
            EventType::ChannelCreate => "channel_create",
            EventType::ChannelDestroy => "channel_destroy",
            EventType::BroadcasterJoinChannel => "broadcaster_join_channel",
            EventType::BroadcasterLeaveChannel => "broadcaster_leave_channel",
            EventType::AudienceJoinChannel => "audience_join_channel",
            EventType::AudienceLeaveChannel => "audience_leave_channel",
            EventType::ClientRoleChangeToBroadcaster => "client_role_change_to_broadcaster",
            EventType::ClientRoleChangeToAudience => "client_role_change_to_audience",
        }
    }

    /// Channel lifecycle events (create / destroy).
    pub fn is_channel_event(&self) -> bool {
        matches!(self, EventType::ChannelCreate | EventType::ChannelDestroy)
    }

    /// Events about a participant: joins, leaves and role changes.
    pub fn is_user_event(&self) -> bool {
        !self.is_channel_event()
    }

    pub fn is_role_change_event(&self) -> bool {
        matches!(
            self,
            EventType::ClientRoleChangeToBroadcaster | EventType::ClientRoleChangeToAudience
        )
    }
}

/// A verified and normalized webhook event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WebhookEvent {
    pub notice_id: String,
    pub product_id: i64,
    pub event_type: i64,
    pub event_name: String,
    /// Provider notification time, epoch milliseconds.
    pub notify_timestamp: i64,
    pub session_id: Option<String>,
    /// Original payload plus any enrichment fields.
    pub payload: Map<String, Value>,
}

impl WebhookEvent {
    /// The known kind of this event, `None` for codes introduced after this table.
    pub fn kind(&self) -> Option<EventType> {
        EventType::from_code(self.event_type)
    }

    pub fn is_known(&self) -> bool {
        self.kind().is_some()
    }
}

/// Event name for a type code, [`UNKNOWN_EVENT`] when not in the table.
pub(crate) fn event_name(code: i64) -> &'static str {
    EventType::from_code(code)
        .map(|event| event.name())
        .unwrap_or(UNKNOWN_EVENT)
}

/// Platform name for a platform code, [`UNKNOWN_PLATFORM`] when not in the table.
pub fn platform_name(code: i64) -> &'static str {
    lookup(PLATFORMS, code).unwrap_or(UNKNOWN_PLATFORM)
}

/// Leave reason text for a reason code, [`UNKNOWN_REASON`] when not in the table.
pub fn leave_reason_text(code: i64) -> &'static str {
    lookup(LEAVE_REASONS, code).unwrap_or(UNKNOWN_REASON)
}

fn lookup(table: &[(i64, &'static str)], code: i64) -> Option<&'static str> {
    table
        .iter()
        .find(|(key, _)| *key == code)
        .map(|(_, text)| *text)
}

/// `HH:MM:SS` when at least an hour, `MM:SS` otherwise.
pub fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let remaining = seconds % 60;

    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, remaining)
    } else {
        format!("{:02}:{:02}", minutes, remaining)
    }
}

/// `YYYY-MM-DD HH:MM:SS` in UTC, `None` when out of chrono's range.
pub fn format_event_time(unix_seconds: i64) -> Option<String> {
    DateTime::from_timestamp(unix_seconds, 0)
        .map(|time| time.format(EVENT_TIME_FORMAT).to_string())
}

/// Add derived fields for every source field present in the payload.
///
/// Applied the same way for every event type.
pub(crate) fn enrich_payload(mut payload: Map<String, Value>) -> Map<String, Value> {
    if let Some(platform) = present(&payload, "platform") {
        let name = coerce_integer(platform)
            .map(platform_name)
            .unwrap_or(UNKNOWN_PLATFORM);
        payload.insert("platform_name".to_string(), Value::from(name));
    }

    if let Some(reason) = present(&payload, "reason") {
        let text = coerce_integer(reason)
            .map(leave_reason_text)
            .unwrap_or(UNKNOWN_REASON);
        payload.insert("leave_reason_text".to_string(), Value::from(text));
    }

    if let Some(event_time) = present(&payload, "ts")
        .and_then(coerce_integer)
        .and_then(format_event_time)
    {
        payload.insert("event_time".to_string(), Value::from(event_time));
    }

    if let Some(duration) = present(&payload, "duration")
        .and_then(coerce_integer)
        .and_then(|seconds| u64::try_from(seconds).ok())
    {
        payload.insert(
            "duration_formatted".to_string(),
            Value::from(format_duration(duration)),
        );
    }

    payload
}

/// Integer value of a lookup field. Integral floats and numeric strings count too.
fn coerce_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64().or_else(|| {
            number
                .as_f64()
                .filter(|float| float.fract() == 0.0 && float.abs() < i64::MAX as f64)
                .map(|float| float as i64)
        }),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn present<'a>(payload: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    payload.get(key).filter(|value| !value.is_null())
}

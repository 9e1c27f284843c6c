use chrono::{DateTime, FixedOffset};
use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use tracing::{debug, warn};

/// Default number of events kept on screen.
pub const MAX_EVENTS: usize = 10;

/// Server-assigned cron job identifier.
///
/// Opaque to the client. The wire value may be a string or an integer; both
/// are kept as text so the id round-trips into the delete path unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<u64> for JobId {
    fn from(n: u64) -> Self {
        Self(n.to_string())
    }
}

impl<'de> Deserialize<'de> for JobId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(serde_json::Number),
        }

        Ok(match Option::<Raw>::deserialize(deserializer)? {
            Some(Raw::Text(s)) => JobId(s),
            Some(Raw::Number(n)) => JobId(n.to_string()),
            None => JobId::default(),
        })
    }
}

/// A scheduled notification as listed by the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CronJob {
    #[serde(default)]
    pub id: JobId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub message: String,
    /// Schedule expression, shown verbatim. Parsing is the backend's business.
    #[serde(default, deserialize_with = "null_as_default")]
    pub schedule: String,
}

/// Producer of an event. Known producers get their own variant; anything else
/// is kept under its original name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventSource {
    System,
    Api,
    Cron,
    Test,
    Other(String),
}

impl EventSource {
    pub fn as_str(&self) -> &str {
        match self {
            EventSource::System => "System",
            EventSource::Api => "API",
            EventSource::Cron => "Cron",
            EventSource::Test => "Test",
            EventSource::Other(name) => name,
        }
    }
}

impl Default for EventSource {
    fn default() -> Self {
        EventSource::Other(String::new())
    }
}

impl From<String> for EventSource {
    fn from(s: String) -> Self {
        match s.as_str() {
            "System" => EventSource::System,
            "API" => EventSource::Api,
            "Cron" => EventSource::Cron,
            "Test" => EventSource::Test,
            _ => EventSource::Other(s),
        }
    }
}

impl From<&str> for EventSource {
    fn from(s: &str) -> Self {
        EventSource::from(s.to_string())
    }
}

impl From<EventSource> for String {
    fn from(source: EventSource) -> Self {
        match source {
            EventSource::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for EventSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One notification-delivery attempt recorded by the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(default, deserialize_with = "null_as_default")]
    pub source: EventSource,
    #[serde(default, deserialize_with = "null_as_default")]
    pub message: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub success: bool,
    /// `None` when the backend sent no timestamp or one that is not RFC 3339.
    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub timestamp: Option<DateTime<FixedOffset>>,
}

impl Event {
    pub fn new(
        source: impl Into<EventSource>,
        message: impl Into<String>,
        success: bool,
        timestamp: Option<DateTime<FixedOffset>>,
    ) -> Self {
        Self {
            source: source.into(),
            message: message.into(),
            success,
            timestamp,
        }
    }
}

/// Bounded, newest-first window over the backend's event log.
#[derive(Debug, Clone, PartialEq)]
pub struct EventLog {
    cap: usize,
    entries: Vec<Event>,
}

impl EventLog {
    /// A cap of zero is raised to one so the newest event is never dropped.
    pub fn new(cap: usize) -> Self {
        Self {
            cap: cap.max(1),
            entries: Vec::new(),
        }
    }

    /// Replace the whole window. Input is newest-first; anything past the cap
    /// is the oldest and gets dropped.
    pub fn replace(&mut self, mut events: Vec<Event>) {
        events.truncate(self.cap);
        self.entries = events;
    }

    /// Put one event on top, then cap.
    pub fn prepend(&mut self, event: Event) {
        self.entries.insert(0, event);
        self.entries.truncate(self.cap);
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn as_slice(&self) -> &[Event] {
        &self.entries
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new(MAX_EVENTS)
    }
}

/// Decode a list body without letting one bad entry sink the whole list.
///
/// `null` is an absent list. Entries that are not objects, or that do not fit
/// `T` even with defaults, are skipped.
pub fn lenient_list<T: DeserializeOwned>(value: Value) -> Vec<T> {
    match value {
        Value::Null => Vec::new(),
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .filter_map(|(index, item)| {
                if !item.is_object() {
                    debug!(index, "skipping non-object list entry");
                    return None;
                }
                match serde_json::from_value(item) {
                    Ok(entry) => Some(entry),
                    Err(e) => {
                        debug!(index, error = %e, "skipping undecodable list entry");
                        None
                    }
                }
            })
            .collect(),
        other => {
            warn!(kind = json_kind(&other), "expected a JSON array, treating as empty");
            Vec::new()
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<FixedOffset>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(Value::String(s)) => DateTime::parse_from_rfc3339(&s).ok(),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(message: &str) -> Event {
        Event::new("System", message, true, None)
    }

    #[test]
    fn job_id_accepts_string_and_number() {
        let jobs: Vec<CronJob> = lenient_list(serde_json::json!([
            {"id": "3f1c", "message": "Backup", "schedule": "0 2 * * *"},
            {"id": 42, "message": "Ping", "schedule": "* * * * *"}
        ]));
        assert_eq!(jobs[0].id.as_str(), "3f1c");
        assert_eq!(jobs[1].id, JobId::from(42u64));
    }

    #[test]
    fn job_with_missing_fields_passes_through() {
        let jobs: Vec<CronJob> = lenient_list(serde_json::json!([{"message": null}]));
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0], CronJob::default());
    }

    #[test]
    fn null_list_is_empty() {
        let jobs: Vec<CronJob> = lenient_list(Value::Null);
        assert!(jobs.is_empty());
    }

    #[test]
    fn non_object_entries_are_skipped() {
        let events: Vec<Event> = lenient_list(serde_json::json!([
            null,
            7,
            {"source": "API", "message": "user1", "success": true}
        ]));
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].source, EventSource::Api);
    }

    #[test]
    fn event_decodes_backend_shape() {
        let json = r#"{"timestamp":"2025-06-01T14:03:09.123456789+02:00","source":"Cron","message":"Backup","success":false}"#;
        let ev: Event = serde_json::from_str(json).unwrap();
        assert_eq!(ev.source, EventSource::Cron);
        assert!(!ev.success);
        assert!(ev.timestamp.is_some());
    }

    #[test]
    fn bad_timestamp_becomes_none() {
        let ev: Event =
            serde_json::from_str(r#"{"source":"API","message":"x","success":true,"timestamp":"yesterday"}"#)
                .unwrap();
        assert!(ev.timestamp.is_none());
    }

    #[test]
    fn unknown_source_keeps_its_name() {
        let ev: Event = serde_json::from_str(r#"{"source":"Backup-Agent"}"#).unwrap();
        assert_eq!(ev.source, EventSource::Other("Backup-Agent".to_string()));
        let json = serde_json::to_string(&ev).unwrap();
        assert!(json.contains(r#""source":"Backup-Agent""#));
    }

    #[test]
    fn known_source_serializes_as_producer_name() {
        let json = serde_json::to_string(&event("hi")).unwrap();
        assert!(json.contains(r#""source":"System""#));
        assert!(!json.contains("timestamp"));
    }

    #[test]
    fn replace_keeps_newest_within_cap() {
        let mut log = EventLog::default();
        let snapshot: Vec<Event> = (0..15).map(|i| event(&format!("e{i}"))).collect();
        log.replace(snapshot);
        assert_eq!(log.len(), MAX_EVENTS);
        assert_eq!(log.as_slice()[0].message, "e0");
        assert_eq!(log.as_slice()[9].message, "e9");
    }

    #[test]
    fn prepend_drops_oldest() {
        let mut log = EventLog::new(3);
        for i in 0..3 {
            log.prepend(event(&format!("e{i}")));
        }
        log.prepend(event("newest"));
        let messages: Vec<&str> = log.as_slice().iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, vec!["newest", "e2", "e1"]);
    }

    #[test]
    fn zero_cap_still_keeps_newest() {
        let mut log = EventLog::new(0);
        log.prepend(event("only"));
        assert_eq!(log.len(), 1);
        assert_eq!(log.cap(), 1);
    }
}

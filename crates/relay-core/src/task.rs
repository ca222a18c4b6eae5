//! Task records and inbound frame normalization.
//!
//! Clients send either a JSON object `{"text": "...", "timestamp": "..."}` or
//! a plain string. Normalization is a two-stage parse: [`try_structured`]
//! recognizes the JSON shape, [`fallback_literal`] treats the whole payload as
//! task text. Every input yields a [`TaskRecord`].

use chrono::{DateTime, Local, LocalResult, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;

/// Naive ISO-8601 layouts accepted when the timestamp carries no offset.
const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// A normalized unit of work submitted by a client.
///
/// Immutable once created. `timestamp` is always present: it defaults to
/// the normalizer's observation time when the client omitted it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TaskRecord {
    request_id: String,
    text: String,
    timestamp: DateTime<Utc>,
}

impl TaskRecord {
    /// Create a record with a freshly generated request id.
    pub fn new(text: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            request_id: new_request_id(),
            text: text.into(),
            timestamp,
        }
    }

    /// Replace the generated request id with a client-supplied one.
    #[must_use]
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = request_id.into();
        self
    }

    /// Identifier used to correlate the task's result.
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Task text handed to the executor.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Client-side (or observed) submission time.
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Outcome of normalizing one frame, tagged by which parse stage produced it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Normalized {
    /// The frame was a JSON object with a string `text` field.
    Structured(TaskRecord),
    /// The frame was taken verbatim as task text.
    Literal(TaskRecord),
}

impl Normalized {
    /// Whether the structured stage recognized the frame.
    pub fn is_structured(&self) -> bool {
        matches!(self, Self::Structured(_))
    }

    /// Borrow the record.
    pub fn record(&self) -> &TaskRecord {
        match self {
            Self::Structured(r) | Self::Literal(r) => r,
        }
    }

    /// Take the record.
    pub fn into_record(self) -> TaskRecord {
        match self {
            Self::Structured(r) | Self::Literal(r) => r,
        }
    }
}

/// Normalize a text frame, stamping missing timestamps with the current time.
pub fn normalize(raw: &str) -> Normalized {
    normalize_at(raw, Utc::now())
}

/// Normalize a binary frame. Invalid UTF-8 is replaced, never rejected.
pub fn normalize_bytes(raw: &[u8]) -> Normalized {
    normalize(&String::from_utf8_lossy(raw))
}

/// Normalize with an explicit observation time.
pub fn normalize_at(raw: &str, now: DateTime<Utc>) -> Normalized {
    match try_structured(raw, now) {
        Some(record) => Normalized::Structured(record),
        None => Normalized::Literal(fallback_literal(raw, now)),
    }
}

/// Stage one: a JSON object carrying a string `text`.
///
/// `timestamp` and `requestId` are optional. An unparseable timestamp falls
/// back to `now` instead of rejecting the frame.
pub fn try_structured(raw: &str, now: DateTime<Utc>) -> Option<TaskRecord> {
    let value: Value = serde_json::from_str(raw).ok()?;
    let obj = value.as_object()?;
    let text = obj.get("text")?.as_str()?;

    let timestamp = match obj.get("timestamp").and_then(Value::as_str) {
        Some(ts) => parse_timestamp(ts).unwrap_or_else(|| {
            tracing::debug!(timestamp = ts, "unparseable task timestamp, using receipt time");
            now
        }),
        None => now,
    };

    let record = TaskRecord::new(text, timestamp);
    Some(
        match obj
            .get("requestId")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
        {
            Some(id) => record.with_request_id(id),
            None => record,
        },
    )
}

/// Stage two: the raw payload is the task text.
pub fn fallback_literal(raw: &str, now: DateTime<Utc>) -> TaskRecord {
    TaskRecord::new(raw, now)
}

/// Parse an ISO-8601 timestamp.
///
/// Offsets (including `Z`) are honored. Timestamps without an offset are
/// read in the server's local time zone. A bare date means local midnight.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(local_to_utc(naive));
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(local_to_utc)
}

fn local_to_utc(naive: NaiveDateTime) -> DateTime<Utc> {
    match naive.and_local_timezone(Local) {
        LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => dt.with_timezone(&Utc),
        // Skipped by a DST transition.
        LocalResult::None => naive.and_utc(),
    }
}

fn new_request_id() -> String {
    format!("req_{}", uuid::Uuid::now_v7().simple())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn structured_with_offset_timestamp() {
        let n = normalize_at(
            r#"{"text":"go to example.com","timestamp":"2024-01-01T00:00:00Z"}"#,
            fixed_now(),
        );
        assert!(n.is_structured());
        let r = n.into_record();
        assert_eq!(r.text(), "go to example.com");
        assert_eq!(
            r.timestamp(),
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn structured_naive_timestamp_is_local_time() {
        let n = normalize_at(
            r#"{"text":"t","timestamp":"2024-01-01T00:00:00"}"#,
            fixed_now(),
        );
        let expected = Local
            .with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(n.record().timestamp(), expected);
    }

    #[test]
    fn structured_fractional_seconds() {
        let ts = parse_timestamp("2024-03-05T10:11:12.345678").unwrap();
        let expected = Local
            .with_ymd_and_hms(2024, 3, 5, 10, 11, 12)
            .unwrap()
            .with_timezone(&Utc)
            + chrono::Duration::microseconds(345_678);
        assert_eq!(ts, expected);
    }

    #[test]
    fn structured_without_timestamp_uses_now() {
        let n = normalize_at(r#"{"text":"hi"}"#, fixed_now());
        assert!(n.is_structured());
        assert_eq!(n.record().timestamp(), fixed_now());
    }

    #[test]
    fn structured_with_bad_timestamp_uses_now() {
        let n = normalize_at(r#"{"text":"hi","timestamp":"yesterday"}"#, fixed_now());
        assert!(n.is_structured());
        assert_eq!(n.record().text(), "hi");
        assert_eq!(n.record().timestamp(), fixed_now());
    }

    #[test]
    fn structured_with_non_string_timestamp_uses_now() {
        let n = normalize_at(r#"{"text":"hi","timestamp":1700000000}"#, fixed_now());
        assert_eq!(n.record().timestamp(), fixed_now());
    }

    #[test]
    fn structured_keeps_client_request_id() {
        let n = normalize_at(r#"{"text":"hi","requestId":"r-42"}"#, fixed_now());
        assert_eq!(n.record().request_id(), "r-42");
    }

    #[test]
    fn empty_request_id_is_replaced() {
        let n = normalize_at(r#"{"text":"hi","requestId":""}"#, fixed_now());
        assert!(n.record().request_id().starts_with("req_"));
    }

    #[test]
    fn plain_string_is_literal() {
        let n = normalize_at("hello", fixed_now());
        assert_matches!(&n, Normalized::Literal(r) if r.text() == "hello");
        assert_eq!(n.record().timestamp(), fixed_now());
    }

    #[test]
    fn json_without_text_is_literal() {
        let raw = r#"{"task":"hello"}"#;
        let n = normalize_at(raw, fixed_now());
        assert!(!n.is_structured());
        assert_eq!(n.record().text(), raw);
    }

    #[test]
    fn json_with_non_string_text_is_literal() {
        let raw = r#"{"text":42}"#;
        let n = normalize_at(raw, fixed_now());
        assert!(!n.is_structured());
        assert_eq!(n.record().text(), raw);
    }

    #[test]
    fn json_array_and_scalars_are_literal() {
        for raw in ["[1,2,3]", "\"quoted\"", "null", "3.5", "true"] {
            let n = normalize_at(raw, fixed_now());
            assert!(!n.is_structured(), "{raw} should be literal");
            assert_eq!(n.record().text(), raw);
        }
    }

    #[test]
    fn empty_payload_is_literal() {
        let n = normalize_at("", fixed_now());
        assert_eq!(n.record().text(), "");
    }

    #[test]
    fn invalid_utf8_bytes_are_replaced() {
        let n = normalize_bytes(&[b'h', 0xff, b'i']);
        assert_eq!(n.record().text(), "h\u{fffd}i");
    }

    #[test]
    fn binary_json_is_structured() {
        let n = normalize_bytes(br#"{"text":"from bytes"}"#);
        assert!(n.is_structured());
        assert_eq!(n.record().text(), "from bytes");
    }

    #[test]
    fn generated_request_ids_are_unique() {
        let a = TaskRecord::new("a", fixed_now());
        let b = TaskRecord::new("a", fixed_now());
        assert_ne!(a.request_id(), b.request_id());
    }

    #[test]
    fn parse_timestamp_accepts_space_separator_and_bare_date() {
        assert!(parse_timestamp("2024-01-01 08:30:00").is_some());
        assert!(parse_timestamp("2024-01-01T08:30").is_some());
        assert!(parse_timestamp("2024-01-01").is_some());
        assert!(parse_timestamp("2024-01-01T08:30:00+02:00").is_some());
    }

    #[test]
    fn parse_timestamp_rejects_garbage() {
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("not a date").is_none());
        assert!(parse_timestamp("2024-13-45T99:00:00").is_none());
    }

    proptest! {
        #[test]
        fn normalize_never_fails_on_any_string(raw in ".*") {
            let n = normalize_at(&raw, fixed_now());
            if !n.is_structured() {
                prop_assert_eq!(n.record().text(), raw.as_str());
            }
        }

        #[test]
        fn normalize_never_fails_on_any_bytes(
            raw in proptest::collection::vec(any::<u8>(), 0..256)
        ) {
            let _ = normalize_bytes(&raw);
        }

        #[test]
        fn structured_text_round_trips(text in ".*") {
            let raw = serde_json::json!({ "text": text }).to_string();
            let n = normalize_at(&raw, fixed_now());
            prop_assert!(n.is_structured());
            prop_assert_eq!(n.record().text(), text.as_str());
        }
    }
}

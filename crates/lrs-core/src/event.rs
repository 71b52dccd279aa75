//! Caliper-style learning activity events.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// A normalized learning activity event.
///
/// Inbound events may arrive without an `id` or `eventTime`; both are filled
/// in by [`Event::with_defaults`] before persistence. Once stored, `id` and
/// `eventTime` are immutable and non-empty.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Caller-visible event identifier. Blank means "assign one on save".
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    /// The action performed (e.g., a Caliper action URI).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    /// The actor performing the action.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<Value>,
    /// The object acted upon.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object: Option<Value>,
    /// JSON-LD context.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    /// The application that originated the event.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ed_app: Option<Value>,
    /// When the activity occurred. Required at storage time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub federated_session: Option<String>,
    /// The result object generated by the action.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated: Option<Value>,
    /// The group (class/section) the activity belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<Value>,
    /// The actor's relationship to the group, including role labels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub membership: Option<Membership>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<Value>,
    /// The event type (e.g., a Caliper event type URI).
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Local UTC offset in whole seconds, captured when the id is assigned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_zone_offset: Option<i64>,
}

/// An actor's membership in the event's group.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Membership {
    #[serde(default, rename = "@id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Role labels attached to the membership (e.g., "student").
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<String>,
    /// Remaining membership fields, carried through untouched.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// A Caliper sensor envelope: a batch of events plus sensor metadata.
///
/// The transport layer deserializes one of these and hands each event in
/// `data` to the service individually.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub sensor: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub send_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub data: Vec<Event>,
}

/// A persisted event wrapped with its storage-level partition keys.
///
/// `(tenant_id, organization_id, event.id)` is unique;
/// `(tenant_id, organization_id, class_id, user_id)` is a non-unique lookup
/// key. The `storage_id` is a store-assigned surrogate, distinct from the
/// event's own id, and is `None` until the record has been saved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_id: Option<String>,
    pub tenant_id: String,
    pub organization_id: String,
    pub class_id: String,
    pub user_id: String,
    pub event: Event,
}

impl Event {
    /// Returns true if the event carries a non-blank identifier.
    pub fn has_id(&self) -> bool {
        !self.id.trim().is_empty()
    }

    /// Fills identity and default fields on an inbound event.
    ///
    /// If the id is blank, assigns a fresh 32-character hex id, sets
    /// `eventTime` to now when absent, and captures the local UTC offset in
    /// whole seconds. Events that already carry an id are returned unchanged;
    /// idempotent resubmission is the caller's responsibility.
    #[must_use]
    pub fn with_defaults(self) -> Self {
        if self.has_id() {
            return self;
        }
        let offset = i64::from(chrono::Local::now().offset().local_minus_utc());
        Self {
            id: Uuid::new_v4().simple().to_string(),
            event_time: self.event_time.or_else(|| Some(Utc::now())),
            time_zone_offset: Some(offset),
            ..self
        }
    }
}

/// Formats a timestamp the way it is stored: RFC 3339 with millisecond
/// precision and a `Z` suffix, so lexicographic order matches chronological
/// order.
pub fn format_event_time(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

//! Core domain logic for the learning record store.
//!
//! This crate contains the fundamental types and logic for:
//! - Event model: Caliper-style events, envelopes, and stored records
//! - Defaults assignment: id/eventTime/timeZoneOffset for inbound events
//! - Statistics: per-class, per-student, per-date event rollups
//! - Range queries: parsing optional from/to bounds into a time filter
//! - Tenant seams: resolver and id-converter traits for identity keys

pub mod error;
pub mod event;
pub mod range;
pub mod stats;
pub mod tenant;

pub use error::Error;
pub use event::{Envelope, Event, Membership, StoredEvent, format_event_time};
pub use range::TimeRange;
pub use stats::{ClassEventStatistics, aggregate};
pub use tenant::{
    AgentIdConverter, ClassIdConverter, GroupIdConverter, NoTenants, TenantContextResolver,
    TenantRecord, UserIdConverter,
};

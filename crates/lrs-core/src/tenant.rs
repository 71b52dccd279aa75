//! Tenant context and identity normalization seams.
//!
//! Tenant metadata lookup and id normalization policy live outside this
//! core; these traits define the shape the service depends on. A missing
//! tenant is an expected condition, not a fault: converters receive an
//! `Option` and must define behavior for the absent case.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::event::Event;

/// Tenant metadata handed to identity conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantRecord {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<Value>,
}

/// Looks up a tenant record by id. Absence is tolerated.
pub trait TenantContextResolver {
    fn find_by_id(&self, tenant_id: &str) -> Option<TenantRecord>;
}

/// Computes the canonical user id used as a storage key.
pub trait UserIdConverter {
    fn convert(&self, tenant: Option<&TenantRecord>, event: &Event) -> String;
}

/// Computes the canonical class id used as a storage key.
pub trait ClassIdConverter {
    fn convert(&self, tenant: Option<&TenantRecord>, event: &Event) -> String;
}

/// A resolver for deployments without tenant metadata: every lookup misses,
/// and converters fall back to the raw event fields.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoTenants;

impl TenantContextResolver for NoTenants {
    fn find_by_id(&self, _tenant_id: &str) -> Option<TenantRecord> {
        None
    }
}

/// Default user id conversion: the actor's `@id`.
#[derive(Debug, Default, Clone, Copy)]
pub struct AgentIdConverter;

impl UserIdConverter for AgentIdConverter {
    fn convert(&self, _tenant: Option<&TenantRecord>, event: &Event) -> String {
        entity_id(event.agent.as_ref())
    }
}

/// Default class id conversion: the group's `@id`.
#[derive(Debug, Default, Clone, Copy)]
pub struct GroupIdConverter;

impl ClassIdConverter for GroupIdConverter {
    fn convert(&self, _tenant: Option<&TenantRecord>, event: &Event) -> String {
        entity_id(event.group.as_ref())
    }
}

fn entity_id(entity: Option<&Value>) -> String {
    entity
        .and_then(|value| value.get("@id").or_else(|| value.get("id")))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Event;

    #[test]
    fn agent_converter_reads_the_actor_id() {
        let event = Event {
            agent: Some(serde_json::json!({"@id": "user-1", "@type": "Person"})),
            ..Event::default()
        };
        assert_eq!(AgentIdConverter.convert(None, &event), "user-1");
    }

    #[test]
    fn group_converter_reads_the_group_id() {
        let event = Event {
            group: Some(serde_json::json!({"@id": "class-1"})),
            ..Event::default()
        };
        assert_eq!(GroupIdConverter.convert(None, &event), "class-1");
    }

    #[test]
    fn converters_tolerate_a_missing_tenant_and_missing_entities() {
        let event = Event::default();
        assert!(NoTenants.find_by_id("tenant-1").is_none());
        assert_eq!(AgentIdConverter.convert(None, &event), "");
        assert_eq!(GroupIdConverter.convert(None, &event), "");
    }

    #[test]
    fn plain_id_field_is_accepted_as_fallback() {
        let event = Event {
            agent: Some(serde_json::json!({"id": "user-2"})),
            ..Event::default()
        };
        assert_eq!(AgentIdConverter.convert(None, &event), "user-2");
    }
}

//! Service facade over the event store.
//!
//! Wires defaults assignment, tenant resolution, and identity conversion in
//! front of [`EventStore`]. This is the surface a transport/auth layer calls
//! after it has already enforced authorization.

use lrs_core::{
    ClassEventStatistics, ClassIdConverter, Error, Event, StoredEvent, TenantContextResolver,
    TimeRange, UserIdConverter, stats,
};

use crate::EventStore;

/// Multi-tenant event persistence and analytics service.
pub struct EventService<R, U, C> {
    store: EventStore,
    tenants: R,
    user_ids: U,
    class_ids: C,
}

impl<R, U, C> EventService<R, U, C>
where
    R: TenantContextResolver,
    U: UserIdConverter,
    C: ClassIdConverter,
{
    pub const fn new(store: EventStore, tenants: R, user_ids: U, class_ids: C) -> Self {
        Self {
            store,
            tenants,
            user_ids,
            class_ids,
        }
    }

    /// Persists an event under a tenant and organization and returns its
    /// caller-visible id.
    ///
    /// Events without an id get one assigned, along with a capture timestamp
    /// and timezone offset; events that already carry an id are stored as
    /// supplied. Storage keys are computed by the identity converters, with
    /// the tenant record as context when one exists.
    pub fn save(
        &mut self,
        tenant_id: &str,
        organization_id: &str,
        event: Event,
    ) -> Result<String, Error> {
        let event = event.with_defaults();
        let tenant = self.tenants.find_by_id(tenant_id);
        let record = StoredEvent {
            storage_id: None,
            tenant_id: tenant_id.to_string(),
            organization_id: organization_id.to_string(),
            class_id: self.class_ids.convert(tenant.as_ref(), &event),
            user_id: self.user_ids.convert(tenant.as_ref(), &event),
            event,
        };
        let event_id = self.store.save(&record)?;
        tracing::debug!(event_id = %event_id, "event saved");
        Ok(event_id)
    }

    /// Exact lookup by event id. Absence is not an error.
    pub fn get_event_for_id(
        &self,
        tenant_id: &str,
        organization_id: &str,
        event_id: &str,
    ) -> Result<Option<Event>, Error> {
        Ok(self
            .store
            .find_by_id(tenant_id, organization_id, event_id)?
            .map(|record| record.event))
    }

    /// All events for an organization; possibly empty.
    pub fn get_events(
        &self,
        tenant_id: &str,
        organization_id: &str,
    ) -> Result<Vec<Event>, Error> {
        Ok(events_of(self.store.find_all(tenant_id, organization_id)?))
    }

    /// Events for a class and user (user id matched case-insensitively);
    /// possibly empty.
    pub fn get_events_for_class_and_user(
        &self,
        tenant_id: &str,
        organization_id: &str,
        class_id: &str,
        user_id: &str,
    ) -> Result<Vec<Event>, Error> {
        Ok(events_of(self.store.find_by_class_and_user(
            tenant_id,
            organization_id,
            class_id,
            user_id,
        )?))
    }

    /// Computes per-class statistics from a fresh snapshot of the class's
    /// events. Fails with [`Error::NotFound`] when no events match.
    pub fn get_event_statistics_for_class(
        &self,
        tenant_id: &str,
        organization_id: &str,
        class_id: &str,
        students_only: bool,
    ) -> Result<ClassEventStatistics, Error> {
        let records =
            self.store
                .find_by_class(tenant_id, organization_id, class_id, students_only)?;
        stats::aggregate(class_id, &records)
    }

    /// Time-bounded events for a user.
    ///
    /// `from`/`to` are optional `yyyy-MM-dd hh:mm` strings; both bounds are
    /// exclusive. Fails with [`Error::IllegalArgument`] on blank scoping
    /// parameters, [`Error::BadRequest`] on an unparsable bound, and
    /// [`Error::NotFound`] when zero records match.
    pub fn get_events_for_user(
        &self,
        tenant_id: &str,
        organization_id: &str,
        user_id: &str,
        from: &str,
        to: &str,
    ) -> Result<Vec<Event>, Error> {
        Error::require(tenant_id, "tenantId")?;
        Error::require(organization_id, "organizationId")?;
        Error::require(user_id, "userId")?;

        let range = TimeRange::parse(from, to)?;
        let records =
            self.store
                .find_by_user_in_range(tenant_id, organization_id, user_id, &range)?;
        Ok(events_of(records))
    }
}

fn events_of(records: Vec<StoredEvent>) -> Vec<Event> {
    records.into_iter().map(|record| record.event).collect()
}

use sqlx::SqlitePool;

use crate::{
    auth::AdminAuth,
    store::{ApplicationStore, AppointmentStore, AvailabilityStore, CatalogStore},
};

/// Shared application state: one repository per entity family, all backed by
/// the same pool, injected into both the public booking surface and the
/// admin surface.
#[derive(Clone)]
pub struct AppState {
    pub availability: AvailabilityStore,
    pub appointments: AppointmentStore,
    pub catalog: CatalogStore,
    pub applications: ApplicationStore,
    pub admin: AdminAuth,
}

impl AppState {
    pub fn new(pool: SqlitePool, admin: AdminAuth, enforce_unique_slots: bool) -> Self {
        Self {
            availability: AvailabilityStore::new(pool.clone()),
            appointments: AppointmentStore::new(pool.clone())
                .with_unique_slots(enforce_unique_slots),
            catalog: CatalogStore::new(pool.clone()),
            applications: ApplicationStore::new(pool),
            admin,
        }
    }
}

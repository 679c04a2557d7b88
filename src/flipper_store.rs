use std::sync::{Arc, RwLock};

use crate::flipper::FlipperData;

/// `FlipperStore` holds flippers of the last loaded tenant. It is safe to read and write from
/// multiple tasks.
///
/// There is a single slot: storing flippers for one tenant evicts those of any other tenant.
/// Clients that alternate between tenants will refetch on every switch.
pub(crate) struct FlipperStore {
    slot: RwLock<Option<TenantFlippers>>,
}

struct TenantFlippers {
    tenant_id: String,
    data: Arc<FlipperData>,
}

impl FlipperStore {
    pub fn new() -> Self {
        Self {
            slot: RwLock::new(None),
        }
    }

    /// Get flippers if they were stored for `tenant_id`.
    pub fn get(&self, tenant_id: &str) -> Option<Arc<FlipperData>> {
        // self.slot.read() should always return Ok(). Err() is possible only if the lock is
        // poisoned (writer panicked while holding the lock), which should never happen. Still,
        // using .ok()? here to not crash the app.
        let slot = self.slot.read().ok()?;
        slot.as_ref()
            .filter(|stored| stored.tenant_id == tenant_id)
            .map(|stored| Arc::clone(&stored.data))
    }

    /// Tenant whose flippers are currently stored.
    pub fn tenant_id(&self) -> Option<String> {
        let slot = self.slot.read().ok()?;
        slot.as_ref().map(|stored| stored.tenant_id.clone())
    }

    /// Flippers currently stored, regardless of tenant.
    pub fn last_flipper_data(&self) -> Option<Arc<FlipperData>> {
        let slot = self.slot.read().ok()?;
        slot.as_ref().map(|stored| Arc::clone(&stored.data))
    }

    /// Replace stored flippers wholesale, returning the previous ones.
    pub fn set(&self, tenant_id: &str, data: Arc<FlipperData>) -> Option<Arc<FlipperData>> {
        // Constructing new value before requesting the lock to minimize lock span.
        let new_value = Some(TenantFlippers {
            tenant_id: tenant_id.to_owned(),
            data,
        });

        let mut slot = self.slot.write().ok()?;
        std::mem::replace(&mut *slot, new_value).map(|previous| previous.data)
    }
}

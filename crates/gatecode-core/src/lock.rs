// ── Per-unit serialization ──
//
// Two requests for the same (site, unit) must not interleave between reading
// the unit's codes and pushing them to the command center. Distinct units
// never contend.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::trace;

use crate::context::RequestContext;
use crate::error::CoreError;
use crate::model::{SiteId, UnitId};

type UnitKey = (SiteId, UnitId);

/// Registry of per-unit async mutexes. Entries exist only while held or
/// awaited.
#[derive(Debug, Default)]
pub struct UnitLocks {
    slots: Arc<DashMap<UnitKey, Arc<Mutex<()>>>>,
}

/// Exclusive hold on one unit's codes. Released on drop.
#[derive(Debug)]
pub struct UnitGuard {
    key: UnitKey,
    slots: Arc<DashMap<UnitKey, Arc<Mutex<()>>>>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl UnitLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `unit_id` at `site_id`.
    ///
    /// Gives up with [`CoreError::Cancelled`] when the request is cancelled
    /// or its deadline passes while waiting.
    pub async fn acquire(
        &self,
        site_id: SiteId,
        unit_id: UnitId,
        ctx: &RequestContext,
    ) -> Result<UnitGuard, CoreError> {
        let key = (site_id, unit_id);
        let slot = Arc::clone(self.slots.entry(key).or_default().value());

        let acquired = ctx.run(async move { Ok(slot.lock_owned().await) }).await;
        let guard = match acquired {
            Ok(guard) => guard,
            Err(_) => {
                self.prune(key);
                return Err(CoreError::Cancelled { unit_id });
            }
        };

        trace!(site = %site_id, unit = %unit_id, "unit lock acquired");
        Ok(UnitGuard {
            key,
            slots: Arc::clone(&self.slots),
            guard: Some(guard),
        })
    }

    /// Number of units currently locked or awaited.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn prune(&self, key: UnitKey) {
        prune_slot(&self.slots, key);
    }
}

fn prune_slot(slots: &DashMap<UnitKey, Arc<Mutex<()>>>, key: UnitKey) {
    slots.remove_if(&key, |_, slot| Arc::strong_count(slot) == 1);
}

impl Drop for UnitGuard {
    fn drop(&mut self) {
        // The owned guard holds its own Arc to the mutex; release it first so
        // an idle slot is down to the registry's reference.
        drop(self.guard.take());
        prune_slot(&self.slots, self.key);
    }
}

//! The event table: name -> ordered subscription list.
//!
//! Writers are register/subscribe/unsubscribe; publish only reads. A
//! readers-writer lock keeps the publish path contention-free against other
//! publishes, and [`Registry::snapshot`] clones the (cheap, `Arc`-backed)
//! subscriber list under the read guard so tasks are submitted to the queue
//! with no table lock held.
//!
//! Names are created on demand and never deleted at runtime; a list that
//! empties out stays in the table until shutdown.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{BusError, Result};

use super::handler::{ErasedHandler, SubscriptionId};

/// One subscriber: a stable id plus its type-erased dispatch record.
#[derive(Clone)]
pub(crate) struct Subscription {
    pub(crate) id: SubscriptionId,
    pub(crate) handler: Arc<dyn ErasedHandler>,
}

/// The event table plus the id allocator.
pub(crate) struct Registry {
    table: RwLock<HashMap<String, Vec<Subscription>>>,
    next_id: AtomicU64,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self {
            table: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(0),
        }
    }

    /// Ensures `name` exists in the table. Idempotent.
    pub(crate) fn register(&self, name: &str) {
        let mut table = self.table.write();
        // Most events carry a handful of subscribers.
        table
            .entry(name.to_string())
            .or_insert_with(|| Vec::with_capacity(3));
    }

    pub(crate) fn is_registered(&self, name: &str) -> bool {
        self.table.read().contains_key(name)
    }

    /// Appends a subscription to `name` and returns its fresh id.
    pub(crate) fn subscribe(
        &self,
        name: &str,
        handler: Arc<dyn ErasedHandler>,
    ) -> Result<SubscriptionId> {
        let mut table = self.table.write();
        let Some(list) = table.get_mut(name) else {
            return Err(BusError::NotRegistered {
                name: name.to_string(),
            });
        };
        let id = SubscriptionId::from_raw(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        list.push(Subscription { id, handler });
        Ok(id)
    }

    /// Removes the first record whose id matches. Returns whether one was
    /// found; an unknown name is reported as `false`, not an error.
    pub(crate) fn unsubscribe(&self, name: &str, id: SubscriptionId) -> bool {
        let mut table = self.table.write();
        let Some(list) = table.get_mut(name) else {
            return false;
        };
        match list.iter().position(|sub| sub.id == id) {
            Some(index) => {
                list.remove(index);
                true
            }
            None => false,
        }
    }

    /// Clones the subscriber list for `name` in insertion order, or `None`
    /// when the name was never registered.
    pub(crate) fn snapshot(&self, name: &str) -> Option<Vec<Subscription>> {
        self.table.read().get(name).cloned()
    }

    pub(crate) fn subscriber_count(&self, name: &str) -> usize {
        self.table.read().get(name).map_or(0, Vec::len)
    }
}

//! Subscription management for table view changes.
//!
//! This module provides subscription IDs and a manager fanning every change
//! a node forwards out to any number of callbacks. A manager is itself a
//! `ChangeSink`; `SharedSubscriptions` lets callers keep subscribing and
//! unsubscribing after the topology took ownership of the sink.

use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;
use tabulon_core::Result;
use tabulon_incremental::{ChangeEvent, ChangeSink};

/// Unique identifier for a subscription.
pub type SubscriptionId = u64;

/// Callback type for change notifications.
pub type ChangeCallback = Box<dyn Fn(&ChangeEvent) -> Result<()> + Send>;

/// A subscription to a node's changes.
pub struct Subscription {
    /// Unique identifier
    id: SubscriptionId,
    /// Callback to invoke on changes
    callback: ChangeCallback,
    /// Whether this subscription is active
    active: bool,
}

impl Subscription {
    /// Creates a new subscription.
    pub fn new<F>(id: SubscriptionId, callback: F) -> Self
    where
        F: Fn(&ChangeEvent) -> Result<()> + Send + 'static,
    {
        Self {
            id,
            callback: Box::new(callback),
            active: true,
        }
    }

    /// Returns the subscription ID.
    #[inline]
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Returns whether this subscription is active.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Deactivates this subscription.
    #[inline]
    pub fn deactivate(&mut self) {
        self.active = false;
    }

    /// Notifies this subscription of a change.
    pub fn notify(&self, event: &ChangeEvent) -> Result<()> {
        if self.active {
            (self.callback)(event)?;
        }
        Ok(())
    }
}

/// Manages subscriptions to one node's changes.
///
/// Subscribers are notified in subscription order.
pub struct SubscriptionManager {
    /// Active subscriptions, keyed in subscription order
    subscriptions: BTreeMap<SubscriptionId, Subscription>,
    /// Next subscription ID to assign
    next_id: SubscriptionId,
}

impl Default for SubscriptionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SubscriptionManager {
    /// Creates a new subscription manager.
    pub fn new() -> Self {
        Self {
            subscriptions: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Subscribes to changes with the given callback.
    ///
    /// Returns the subscription ID that can be used to unsubscribe.
    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: Fn(&ChangeEvent) -> Result<()> + Send + 'static,
    {
        let id = self.next_id;
        self.next_id += 1;

        let subscription = Subscription::new(id, callback);
        self.subscriptions.insert(id, subscription);

        id
    }

    /// Unsubscribes by ID.
    ///
    /// Returns true if the subscription was found and removed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscriptions.remove(&id).is_some()
    }

    /// Pauses or resumes a subscription without dropping it.
    ///
    /// Returns true if the subscription exists.
    pub fn set_active(&mut self, id: SubscriptionId, active: bool) -> bool {
        match self.subscriptions.get_mut(&id) {
            Some(sub) => {
                sub.active = active;
                true
            }
            None => false,
        }
    }

    /// Notifies a specific subscription of a change.
    pub fn notify(&self, id: SubscriptionId, event: &ChangeEvent) -> Result<()> {
        match self.subscriptions.get(&id) {
            Some(sub) => sub.notify(event),
            None => Ok(()),
        }
    }

    /// Notifies all active subscriptions of a change, oldest first.
    ///
    /// Stops at the first callback error and returns it; later subscribers
    /// are not called.
    pub fn notify_all(&self, event: &ChangeEvent) -> Result<()> {
        for sub in self.subscriptions.values() {
            sub.notify(event)?;
        }
        Ok(())
    }

    /// Returns the number of subscriptions.
    #[inline]
    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    /// Returns true if there are no subscriptions.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    /// Returns all subscription IDs in ascending order.
    pub fn subscription_ids(&self) -> Vec<SubscriptionId> {
        self.subscriptions.keys().copied().collect()
    }

    /// Clears all subscriptions.
    pub fn clear(&mut self) {
        self.subscriptions.clear();
    }
}

impl ChangeSink for SubscriptionManager {
    fn on_change(&mut self, event: &ChangeEvent) -> Result<()> {
        self.notify_all(event)
    }
}

/// A subscription manager shared between a topology and its callers.
#[derive(Clone, Default)]
pub struct SharedSubscriptions {
    inner: Arc<Mutex<SubscriptionManager>>,
}

impl SharedSubscriptions {
    /// Creates an empty shared manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes to changes with the given callback.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&ChangeEvent) -> Result<()> + Send + 'static,
    {
        self.inner.lock().subscribe(callback)
    }

    /// Unsubscribes by ID.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.lock().unsubscribe(id)
    }

    /// Returns the number of subscriptions.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Returns true if there are no subscriptions.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

impl ChangeSink for SharedSubscriptions {
    fn on_change(&mut self, event: &ChangeEvent) -> Result<()> {
        self.inner.lock().notify_all(event)
    }
}

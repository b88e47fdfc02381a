//! Active-word highlighting shared between views
//!
//! One store is built at startup and handed to whoever needs it. Subscribers
//! hear about every change of the active word location, either through a
//! synchronous callback or an async [`watch::Receiver`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use tokio::sync::watch;

type Callback = Arc<dyn Fn(Option<&str>) + Send + Sync>;

#[derive(Clone, Default)]
pub struct ActiveWordStore {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    active: watch::Sender<Option<String>>,
    subscribers: Mutex<HashMap<u64, Callback>>,
    next_id: AtomicU64,
}

impl Default for StoreInner {
    fn default() -> Self {
        let (active, _) = watch::channel(None);
        Self {
            active,
            subscribers: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(0),
        }
    }
}

impl ActiveWordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the active word location (`"surah:verse:word"`), or clear it.
    /// Subscribers are called only when the value actually changes.
    pub fn set_active(&self, location: Option<String>) {
        let changed = self.inner.active.send_if_modified(|active| {
            if *active == location {
                return false;
            }
            *active = location.clone();
            true
        });
        if !changed {
            return;
        }

        // Callbacks may subscribe or unsubscribe, so don't hold the lock
        let callbacks: Vec<Callback> = self.inner.subscribers.lock().unwrap().values().cloned().collect();
        for callback in callbacks {
            callback(location.as_deref());
        }
    }

    pub fn get_active(&self) -> Option<String> {
        self.inner.active.borrow().clone()
    }

    /// Receiver that wakes on every change of the active word.
    pub fn watch(&self) -> watch::Receiver<Option<String>> {
        self.inner.active.subscribe()
    }

    /// Register `callback`. It stays registered until the returned
    /// [`Subscription`] is dropped or explicitly unsubscribed.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(Option<&str>) + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner.subscribers.lock().unwrap().insert(id, Arc::new(callback));
        Subscription { id, store: Arc::downgrade(&self.inner) }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.lock().unwrap().len()
    }
}

#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    id: u64,
    store: Weak<StoreInner>,
}

impl Subscription {
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(store) = self.store.upgrade() {
            store.subscribers.lock().unwrap().remove(&self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_set_and_get() {
        let store = ActiveWordStore::new();
        assert_eq!(store.get_active(), None);
        store.set_active(Some("2:255:3".to_string()));
        assert_eq!(store.get_active().as_deref(), Some("2:255:3"));
        store.set_active(None);
        assert_eq!(store.get_active(), None);
    }

    #[test]
    fn test_subscribers_notified_on_change_only() {
        let store = ActiveWordStore::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let sub = store.subscribe(move |loc| sink.lock().unwrap().push(loc.map(str::to_string)));

        store.set_active(Some("1:1:1".to_string()));
        store.set_active(Some("1:1:1".to_string()));
        store.set_active(Some("1:1:2".to_string()));
        store.set_active(None);

        assert_eq!(
            *seen.lock().unwrap(),
            vec![Some("1:1:1".to_string()), Some("1:1:2".to_string()), None]
        );
        sub.unsubscribe();
        assert_eq!(store.subscriber_count(), 0);
    }

    #[test]
    fn test_dropped_subscription_stops_notifications() {
        let store = ActiveWordStore::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let counter = calls.clone();
        let sub = store.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        store.set_active(Some("1:1:1".to_string()));
        drop(sub);
        store.set_active(Some("1:1:2".to_string()));

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_watch_receiver_sees_changes() {
        let store = ActiveWordStore::new();
        let mut rx = store.watch();

        let writer = store.clone();
        tokio::spawn(async move {
            writer.set_active(Some("2:255:1".to_string()));
        });

        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().as_deref(), Some("2:255:1"));

        // Setting the same value does not wake receivers
        store.set_active(Some("2:255:1".to_string()));
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn test_clones_share_state() {
        let store = ActiveWordStore::new();
        let other = store.clone();
        other.set_active(Some("3:1:1".to_string()));
        assert_eq!(store.get_active().as_deref(), Some("3:1:1"));
    }
}

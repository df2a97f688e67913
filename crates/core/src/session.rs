use std::{
    collections::HashMap,
    sync::Mutex,
    time::{Duration, Instant},
};

use uuid::Uuid;

struct Entry<T> {
    value: T,
    touched: Instant,
}

/// Per-session state with an idle expiry.
///
/// Each session owns one value, created on first use, replaced by later
/// writes, and dropped once it has been idle for longer than the TTL.
pub struct SessionStore<T> {
    inner: Mutex<HashMap<Uuid, Entry<T>>>,
    ttl: Duration,
}

impl<T: Clone + Default> SessionStore<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    pub fn create(&self) -> Uuid {
        let id = Uuid::new_v4();
        self.inner.lock().expect("SessionStore poisoned").insert(
            id,
            Entry {
                value: T::default(),
                touched: Instant::now(),
            },
        );
        id
    }

    /// Snapshot of a live session, refreshing its idle timer.
    pub fn get(&self, id: &Uuid) -> Option<T> {
        let mut inner = self.inner.lock().expect("SessionStore poisoned");
        let expired = inner.get(id)?.touched.elapsed() >= self.ttl;
        if expired {
            inner.remove(id);
            return None;
        }

        let entry = inner.get_mut(id)?;
        entry.touched = Instant::now();
        Some(entry.value.clone())
    }

    /// Mutate a session's value, starting from the default when it is unknown or expired.
    pub fn update<R>(&self, id: Uuid, f: impl FnOnce(&mut T) -> R) -> R {
        let mut inner = self.inner.lock().expect("SessionStore poisoned");
        let entry = inner.entry(id).or_insert_with(|| Entry {
            value: T::default(),
            touched: Instant::now(),
        });
        if entry.touched.elapsed() >= self.ttl {
            entry.value = T::default();
        }
        entry.touched = Instant::now();
        f(&mut entry.value)
    }

    pub fn purge_expired(&self) -> usize {
        let mut inner = self.inner.lock().expect("SessionStore poisoned");
        let before = inner.len();
        inner.retain(|_, entry| entry.touched.elapsed() < self.ttl);
        before - inner.len()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("SessionStore poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

//! Named counting semaphores shared between trees.
//!
//! A [`SemaphoreRepository`] is handed to every tree that should see the
//! same semaphores; [`SemaphoreGuard`](crate::SemaphoreGuard) tasks look
//! their semaphore up through it by name.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

/// Counting semaphore whose `acquire` never waits.
#[derive(Debug)]
pub struct NonBlockingSemaphore {
    name: String,
    max: usize,
    acquired: AtomicUsize,
}

impl NonBlockingSemaphore {
    pub fn new(name: impl Into<String>, max: usize) -> Self {
        Self {
            name: name.into(),
            max,
            acquired: AtomicUsize::new(0),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn max(&self) -> usize {
        self.max
    }

    pub fn acquired(&self) -> usize {
        self.acquired.load(Ordering::Acquire)
    }

    pub fn available(&self) -> usize {
        self.max.saturating_sub(self.acquired())
    }

    /// Takes one resource. Returns `false` when none is left.
    pub fn acquire(&self) -> bool {
        self.acquired
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |acquired| {
                (acquired < self.max).then_some(acquired + 1)
            })
            .is_ok()
    }

    /// Gives one resource back. Returns `false` when nothing was acquired.
    pub fn release(&self) -> bool {
        self.acquired
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |acquired| {
                acquired.checked_sub(1)
            })
            .is_ok()
    }
}

/// Registry of named semaphores; clones share the same registry.
#[derive(Debug, Clone, Default)]
pub struct SemaphoreRepository {
    semaphores: Arc<RwLock<HashMap<String, Arc<NonBlockingSemaphore>>>>,
}

impl SemaphoreRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a semaphore with `max` resources, replacing any previous one
    /// of the same name.
    pub fn add(&self, name: impl Into<String>, max: usize) -> Arc<NonBlockingSemaphore> {
        let name = name.into();
        debug!(semaphore = %name, max, "semaphore added");
        let semaphore = Arc::new(NonBlockingSemaphore::new(name.clone(), max));
        self.semaphores
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name, Arc::clone(&semaphore));
        semaphore
    }

    pub fn get(&self, name: &str) -> Option<Arc<NonBlockingSemaphore>> {
        self.semaphores
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    pub fn remove(&self, name: &str) -> Option<Arc<NonBlockingSemaphore>> {
        self.semaphores
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name)
    }

    pub fn clear(&self) {
        self.semaphores
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn len(&self) -> usize {
        self.semaphores
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_stops_at_max() {
        let semaphore = NonBlockingSemaphore::new("door", 2);
        assert!(semaphore.acquire());
        assert!(semaphore.acquire());
        assert!(!semaphore.acquire());
        assert_eq!(semaphore.available(), 0);

        assert!(semaphore.release());
        assert_eq!(semaphore.available(), 1);
        assert!(semaphore.acquire());
    }

    #[test]
    fn release_without_acquire_is_refused() {
        let semaphore = NonBlockingSemaphore::new("door", 1);
        assert!(!semaphore.release());
        assert_eq!(semaphore.acquired(), 0);
    }

    #[test]
    fn repository_clones_share_semaphores() {
        let repository = SemaphoreRepository::new();
        let shared = repository.clone();
        repository.add("door", 1);

        let semaphore = shared.get("door").unwrap();
        assert!(semaphore.acquire());
        assert!(!repository.get("door").unwrap().acquire());

        shared.remove("door");
        assert!(repository.get("door").is_none());
        assert!(repository.is_empty());
    }
}

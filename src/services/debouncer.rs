//! Coalescing bursts of load order changes into a single check.
//!
//! Dragging a plugin emits one change per displaced entry; re-validating after
//! each one would repeat work and flicker notifications. [`Debouncer`] keeps a
//! single pending task per key and restarts its timer on every new call.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinHandle;

/// Default quiet window before a scheduled check runs
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(1200);

type BoxedFuture = Pin<Box<dyn Future<Output = ()> + Send>>;
type BoxedTask<A> = Arc<dyn Fn(A) -> BoxedFuture + Send + Sync>;

struct Slot {
    generation: u64,
    handle: JoinHandle<()>,
}

/// Single-slot delayed task runner, keyed by `K`.
///
/// Must be used from within a tokio runtime.
pub struct Debouncer<K, A> {
    delay: Duration,
    task: BoxedTask<A>,
    slots: Arc<Mutex<HashMap<K, Slot>>>,
    next_generation: Mutex<u64>,
}

impl<K, A> Debouncer<K, A>
where
    K: Eq + Hash + Clone + Send + 'static,
    A: Send + 'static,
{
    pub fn new<F, Fut>(delay: Duration, task: F) -> Self
    where
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Self {
            delay,
            task: Arc::new(move |args| -> BoxedFuture { Box::pin(task(args)) }),
            slots: Arc::new(Mutex::new(HashMap::new())),
            next_generation: Mutex::new(0),
        }
    }

    /// Run the task with `args` once `delay` passes without another call for `key`.
    ///
    /// A pending task for the same key is cancelled; only the latest arguments
    /// are ever used.
    pub fn schedule(&self, key: K, args: A) {
        let generation = {
            let mut next = lock(&self.next_generation);
            *next += 1;
            *next
        };

        let delay = self.delay;
        let task = Arc::clone(&self.task);
        let slots = Arc::clone(&self.slots);
        let slot_key = key.clone();

        // The slot is registered before the task can observe it
        let mut pending = lock(&self.slots);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            {
                let mut slots = lock(&slots);
                // A newer call owns the slot now
                if slots.get(&slot_key).map(|slot| slot.generation) != Some(generation) {
                    return;
                }
                slots.remove(&slot_key);
            }
            task(args).await;
        });

        if let Some(previous) = pending.insert(key, Slot { generation, handle }) {
            tracing::trace!("Debounce timer reset");
            previous.handle.abort();
        }
    }

    /// Drop the pending task for `key`. Returns whether one was pending.
    pub fn cancel(&self, key: &K) -> bool {
        match lock(&self.slots).remove(key) {
            Some(slot) => {
                slot.handle.abort();
                true
            }
            None => false,
        }
    }

    /// Number of keys with a task waiting to run
    pub fn pending(&self) -> usize {
        lock(&self.slots).len()
    }
}

impl<K, A> Drop for Debouncer<K, A> {
    fn drop(&mut self) {
        for (_, slot) in lock(&self.slots).drain() {
            slot.handle.abort();
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

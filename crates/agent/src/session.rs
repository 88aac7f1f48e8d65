use std::collections::HashMap;
use std::sync::{Arc, Mutex as SyncMutex, PoisonError};

use tokio::sync::{Mutex, OwnedMutexGuard};

type LockMap = HashMap<String, Arc<Mutex<()>>>;

/// Per-thread exclusive locks. Turns for one `thread_id` run one at a time;
/// different threads never wait on each other. An entry lives only while a
/// turn holds or waits on it.
#[derive(Clone, Default)]
pub struct ThreadLocks {
    locks: Arc<SyncMutex<LockMap>>,
}

/// Held for the duration of a turn. Dropping it releases the thread and
/// forgets the entry when nobody else is queued on it.
pub struct ThreadGuard {
    guard: Option<OwnedMutexGuard<()>>,
    thread_id: String,
    locks: Arc<SyncMutex<LockMap>>,
}

impl ThreadLocks {
    pub async fn acquire(&self, thread_id: &str) -> ThreadGuard {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            locks.entry(thread_id.to_string()).or_insert_with(|| Arc::new(Mutex::new(()))).clone()
        };
        ThreadGuard {
            guard: Some(lock.lock_owned().await),
            thread_id: thread_id.to_string(),
            locks: Arc::clone(&self.locks),
        }
    }

    pub fn tracked_threads(&self) -> usize {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

impl Drop for ThreadGuard {
    fn drop(&mut self) {
        drop(self.guard.take());
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        // Waiters hold their own clone, so a count of one means only the map is left.
        if locks.get(&self.thread_id).is_some_and(|lock| Arc::strong_count(lock) == 1) {
            locks.remove(&self.thread_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::ThreadLocks;

    #[tokio::test]
    async fn same_thread_is_serialized() {
        let locks = ThreadLocks::default();
        let guard = locks.acquire("t-1").await;

        let contender = locks.clone();
        let waiting = tokio::spawn(async move {
            let _guard = contender.acquire("t-1").await;
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiting.is_finished());

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), waiting)
            .await
            .expect("second turn proceeds once the first releases")
            .expect("task completes");
    }

    #[tokio::test]
    async fn different_threads_do_not_block_each_other() {
        let locks = ThreadLocks::default();
        let _first = locks.acquire("t-1").await;

        let second = tokio::time::timeout(Duration::from_millis(200), locks.acquire("t-2")).await;

        assert!(second.is_ok());
    }

    #[tokio::test]
    async fn released_entries_are_forgotten() {
        let locks = ThreadLocks::default();
        drop(locks.acquire("t-1").await);
        let held = locks.acquire("t-2").await;

        assert_eq!(locks.tracked_threads(), 1);
        drop(held);
        assert_eq!(locks.tracked_threads(), 0);
    }

    #[tokio::test]
    async fn entry_survives_while_a_waiter_is_queued() {
        let locks = ThreadLocks::default();
        let first = locks.acquire("t-1").await;

        let contender = locks.clone();
        let waiting = tokio::spawn(async move {
            let _guard = contender.acquire("t-1").await;
            tokio::time::sleep(Duration::from_millis(10)).await;
        });
        tokio::time::sleep(Duration::from_millis(20)).await;

        drop(first);
        assert_eq!(locks.tracked_threads(), 1);

        tokio::time::timeout(Duration::from_secs(1), waiting)
            .await
            .expect("waiter finishes")
            .expect("task completes");
        assert_eq!(locks.tracked_threads(), 0);
    }
}

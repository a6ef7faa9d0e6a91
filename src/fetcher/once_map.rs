use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::OnceCell;

/// A map whose values are computed at most once per key
///
/// Concurrent callers for the same key wait for the first one's result.
/// Failed or cancelled initialisations leave the key empty, so a later
/// caller tries again. A bounded map keeps at most `capacity` finished
/// values and drops the oldest first; with capacity zero it only
/// deduplicates work that is in flight.
pub struct OnceMap<K, V> {
    slots: Mutex<Slots<K, V>>,
    capacity: Option<usize>,
}

struct Slot<V> {
    cell: Arc<OnceCell<V>>,
    settled: bool,
}

struct Slots<K, V> {
    cells: HashMap<K, Slot<V>>,
    /// Settled keys, oldest first
    order: VecDeque<K>,
}

impl<K, V> OnceMap<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new() -> Self {
        Self::with_capacity(None)
    }

    /// A map holding at most `capacity` finished values
    pub fn bounded(capacity: usize) -> Self {
        Self::with_capacity(Some(capacity))
    }

    fn with_capacity(capacity: Option<usize>) -> Self {
        Self {
            slots: Mutex::new(Slots {
                cells: HashMap::new(),
                order: VecDeque::new(),
            }),
            capacity,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Slots<K, V>> {
        self.slots.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Returns the value for `key`, running `init` if nobody has produced it yet
    pub async fn get_or_try_init<F, Fut, E>(&self, key: K, init: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        let cell = {
            let mut slots = self.lock();
            let slot = slots.cells.entry(key.clone()).or_insert_with(|| Slot {
                cell: Arc::new(OnceCell::new()),
                settled: false,
            });
            Arc::clone(&slot.cell)
        };

        let settle = Settle {
            map: self,
            key: Some(key),
            cell,
        };
        let value = settle.cell.get_or_try_init(init).await.cloned();
        value
    }

    /// The value for `key`, if already produced and still held
    pub fn get(&self, key: &K) -> Option<V> {
        let slots = self.lock();
        slots.cells.get(key).and_then(|slot| slot.cell.get().cloned())
    }

    /// Number of keys holding a value
    pub fn len(&self) -> usize {
        let slots = self.lock();
        slots.cells.values().filter(|slot| slot.cell.initialized()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keys currently tracked, finished or not
    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.lock().cells.len()
    }

    /// Records the outcome of one caller's wait on `cell`
    fn settle(&self, key: K, cell: &Arc<OnceCell<V>>) {
        let mut slots = self.lock();
        let Some(slot) = slots.cells.get_mut(&key) else { return };
        if !Arc::ptr_eq(&slot.cell, cell) {
            return;
        }

        if !cell.initialized() {
            // Only the map and this caller hold the cell: nobody is retrying.
            if Arc::strong_count(cell) == 2 {
                slots.cells.remove(&key);
            }
            return;
        }
        if slot.settled {
            return;
        }
        slot.settled = true;
        slots.order.push_back(key);

        if let Some(capacity) = self.capacity {
            while slots.order.len() > capacity {
                let Some(oldest) = slots.order.pop_front() else { break };
                slots.cells.remove(&oldest);
            }
        }
    }
}

/// Settles a caller's slot when its wait ends, including by cancellation
struct Settle<'a, K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    map: &'a OnceMap<K, V>,
    key: Option<K>,
    cell: Arc<OnceCell<V>>,
}

impl<K, V> Drop for Settle<'_, K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn drop(&mut self) {
        if let Some(key) = self.key.take() {
            self.map.settle(key, &self.cell);
        }
    }
}

impl<K, V> Default for OnceMap<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_concurrent_callers_share_one_init() {
        let map: Arc<OnceMap<String, String>> = Arc::new(OnceMap::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let map = Arc::clone(&map);
            let calls = Arc::clone(&calls);
            handles.push(tokio::spawn(async move {
                map.get_or_try_init("Black Sea".to_string(), || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    Ok::<_, String>("<html/>".to_string())
                })
                .await
            }));
        }

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), "<html/>");
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(map.len(), 1);
    }

    #[tokio::test]
    async fn test_failure_is_not_remembered() {
        let map: OnceMap<&str, u32> = OnceMap::new();

        let first = map.get_or_try_init("k", || async { Err::<u32, _>("down") }).await;
        assert_eq!(first, Err("down"));
        assert!(map.get(&"k").is_none());
        assert!(map.is_empty());

        let second = map.get_or_try_init("k", || async { Ok::<_, &str>(7) }).await;
        assert_eq!(second, Ok(7));
        assert_eq!(map.get(&"k"), Some(7));
    }

    #[tokio::test]
    async fn test_failed_keys_are_not_tracked() {
        let map: OnceMap<u32, u32> = OnceMap::new();
        for key in 0..100 {
            let _ = map.get_or_try_init(key, || async { Err::<u32, _>("missing") }).await;
        }
        assert_eq!(map.tracked(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_init_is_not_tracked() {
        let map: OnceMap<&str, u32> = OnceMap::new();
        let pending = map.get_or_try_init("slow", || async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok::<_, &str>(1)
        });
        assert!(tokio::time::timeout(Duration::from_millis(10), pending).await.is_err());
        assert_eq!(map.tracked(), 0);
    }

    #[tokio::test]
    async fn test_bounded_map_drops_oldest() {
        let map: OnceMap<u32, u32> = OnceMap::bounded(2);
        for key in 1..=3 {
            map.get_or_try_init(key, || async move { Ok::<_, ()>(key * 10) })
                .await
                .unwrap();
        }
        assert_eq!(map.len(), 2);
        assert_eq!(map.get(&1), None);
        assert_eq!(map.get(&2), Some(20));
        assert_eq!(map.get(&3), Some(30));

        // Rebuilt on demand once dropped.
        let calls = AtomicUsize::new(0);
        let again = map
            .get_or_try_init(1, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, ()>(10)
            })
            .await;
        assert_eq!(again, Ok(10));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(map.get(&2), None);
    }

    #[tokio::test]
    async fn test_zero_capacity_only_shares_in_flight_work() {
        let map: Arc<OnceMap<&str, u32>> = Arc::new(OnceMap::bounded(0));
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..4 {
            let map = Arc::clone(&map);
            let calls = Arc::clone(&calls);
            handles.push(tokio::spawn(async move {
                map.get_or_try_init("Black Sea", || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    Ok::<_, ()>(1)
                })
                .await
            }));
        }
        for handle in handles {
            assert_eq!(handle.await.unwrap(), Ok(1));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(map.is_empty());
        assert_eq!(map.tracked(), 0);
    }
}

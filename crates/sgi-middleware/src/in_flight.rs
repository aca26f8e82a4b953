use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
/// Processing keys with a pass currently underway.
pub struct InFlightSet {
    keys: Mutex<HashSet<String>>,
}

impl InFlightSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims `key`, returning `None` when another pass already holds it.
    ///
    /// The key is released when the returned guard drops.
    pub fn try_claim(&self, key: &str) -> Option<InFlightGuard<'_>> {
        if lock_or_recover(&self.keys).insert(key.to_string()) {
            Some(InFlightGuard {
                set: self,
                key: key.to_string(),
            })
        } else {
            None
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        lock_or_recover(&self.keys).contains(key)
    }

    pub fn len(&self) -> usize {
        lock_or_recover(&self.keys).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn release(&self, key: &str) {
        lock_or_recover(&self.keys).remove(key);
    }
}

#[derive(Debug)]
#[must_use = "dropping the guard releases the key immediately"]
pub struct InFlightGuard<'a> {
    set: &'a InFlightSet,
    key: String,
}

impl InFlightGuard<'_> {
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.set.release(&self.key);
    }
}

fn lock_or_recover<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

#[cfg(test)]
mod tests {
    use super::InFlightSet;

    #[test]
    fn unit_try_claim_rejects_held_key_until_guard_drops() {
        let set = InFlightSet::new();
        let guard = set.try_claim("C1:100.1").expect("first claim");
        assert_eq!(guard.key(), "C1:100.1");
        assert!(set.contains("C1:100.1"));
        assert!(set.try_claim("C1:100.1").is_none());

        drop(guard);
        assert!(set.is_empty());
        assert!(set.try_claim("C1:100.1").is_some());
    }

    #[test]
    fn unit_try_claim_tracks_keys_independently() {
        let set = InFlightSet::new();
        let first = set.try_claim("C1:100.1").expect("first");
        let second = set.try_claim("C1:100.2").expect("second");
        assert_eq!(set.len(), 2);
        drop(first);
        assert!(!set.contains("C1:100.1"));
        assert!(set.contains(second.key()));
    }

    #[test]
    fn regression_guard_releases_key_during_unwind() {
        let set = InFlightSet::new();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = set.try_claim("C1:100.1").expect("claim");
            panic!("boom");
        }));
        assert!(result.is_err());
        assert!(set.is_empty());
    }
}

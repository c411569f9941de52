//! Property-based tests for the cache store.

use proptest::prelude::*;
use std::collections::HashSet;

use crate::cache::PageCache;

fn key_strategy() -> impl Strategy<Value = String> {
    "/api/[a-z]{1,8}(/[a-z0-9]{1,4})?".prop_map(|s| s)
}

fn payload_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ]{0,64}".prop_map(|s| s)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Storing then reading before expiry returns the stored payload.
    #[test]
    fn prop_set_then_get(key in key_strategy(), payload in payload_strategy()) {
        let cache = PageCache::unbounded();
        cache.set(key.clone(), payload.clone());
        prop_assert_eq!(cache.get(&key), Some(payload));
    }

    // Clearing one key leaves every other key in place.
    #[test]
    fn prop_clear_removes_only_target(keys in prop::collection::hash_set(key_strategy(), 1..20)) {
        let cache = PageCache::unbounded();
        for key in &keys {
            cache.set(key.clone(), key.clone());
        }

        let target = keys.iter().next().cloned().unwrap_or_default();
        cache.clear(Some(&target));

        for key in &keys {
            prop_assert_eq!(cache.get(key).is_some(), key != &target);
        }
    }

    // Prefix clearing removes exactly the keys that contain the pattern.
    #[test]
    fn prop_clear_by_prefix_exact(
        keys in prop::collection::hash_set(key_strategy(), 1..30),
        pattern in "/api/[a-z]{1,3}",
    ) {
        let cache = PageCache::unbounded();
        for key in &keys {
            cache.set(key.clone(), String::new());
        }

        let expected_removed: HashSet<&String> = keys.iter().filter(|k| k.contains(&pattern)).collect();
        let removed = cache.clear_by_prefix(&pattern);

        prop_assert_eq!(removed, expected_removed.len());
        for key in &keys {
            prop_assert_eq!(cache.contains(key), !expected_removed.contains(key));
        }
    }
}

//! Property-Based Tests for the Object Cache
//!
//! Uses proptest to check the invariants that must hold after any sequence
//! of operations.

use proptest::prelude::*;
use std::collections::{HashMap, HashSet};
use std::thread::sleep;
use std::time::Duration;

use crate::cache::{ObjectCache, MAX_KEY_LENGTH};
use crate::config::CacheConfig;

// == Test Configuration ==
const TEST_MAX_ENTRIES: usize = 100;

fn test_cache() -> ObjectCache<String> {
    ObjectCache::new(
        CacheConfig::default()
            .with_max_entries(TEST_MAX_ENTRIES)
            .with_ttl(Duration::from_secs(300)),
    )
}

// == Strategies ==
/// Generates valid cache keys (non-empty, within length limit)
fn valid_key_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_]{1,64}".prop_map(|s| s)
}

fn valid_value_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ]{1,256}".prop_map(|s| s)
}

/// Keys drawn from a small alphabet so sequences revisit the same keys
fn narrow_key_strategy() -> impl Strategy<Value = String> {
    "[a-e]".prop_map(|s| s)
}

#[derive(Debug, Clone)]
enum CacheOp {
    Set { key: String, value: String },
    Get { key: String },
    Delete { key: String },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        (narrow_key_strategy(), valid_value_strategy())
            .prop_map(|(key, value)| CacheOp::Set { key, value }),
        narrow_key_strategy().prop_map(|key| CacheOp::Get { key }),
        narrow_key_strategy().prop_map(|key| CacheOp::Delete { key }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Statistics Accuracy: hits and misses match what a model of the store predicts
    #[test]
    fn prop_statistics_accuracy(ops in prop::collection::vec(cache_op_strategy(), 1..50)) {
        let mut cache = test_cache();
        let mut model: HashMap<String, String> = HashMap::new();
        let mut expected_hits: u64 = 0;
        let mut expected_misses: u64 = 0;

        for op in ops {
            match op {
                CacheOp::Set { key, value } => {
                    cache.set(key.clone(), value.clone()).unwrap();
                    model.insert(key, value);
                }
                CacheOp::Get { key } => {
                    let got = cache.get(&key);
                    prop_assert_eq!(got.as_ref(), model.get(&key));
                    if got.is_some() {
                        expected_hits += 1;
                    } else {
                        expected_misses += 1;
                    }
                }
                CacheOp::Delete { key } => {
                    prop_assert_eq!(cache.delete(&key), model.remove(&key).is_some());
                }
            }
        }

        let stats = cache.stats();
        prop_assert_eq!(stats.total_hits, expected_hits);
        prop_assert_eq!(stats.total_misses, expected_misses);
        prop_assert_eq!(stats.total_requests, expected_hits + expected_misses);
        prop_assert_eq!(stats.size, model.len());
        prop_assert_eq!(stats.evictions, 0);
    }

    // Round-Trip: a stored value reads back unchanged
    #[test]
    fn prop_set_get_round_trip(key in valid_key_strategy(), value in valid_value_strategy()) {
        let mut cache = test_cache();
        cache.set(key.clone(), value.clone()).unwrap();
        prop_assert_eq!(cache.get(&key), Some(value));
        prop_assert!(cache.has(&key));
    }

    // Overwrite: the last write wins and the entry count does not grow
    #[test]
    fn prop_overwrite_semantics(
        key in valid_key_strategy(),
        first in valid_value_strategy(),
        second in valid_value_strategy()
    ) {
        let mut cache = test_cache();
        cache.set(key.clone(), first).unwrap();
        cache.set(key.clone(), second.clone()).unwrap();

        prop_assert_eq!(cache.len(), 1);
        prop_assert_eq!(cache.get(&key), Some(second));
    }

    // Delete: a removed key is gone and a second delete reports nothing removed
    #[test]
    fn prop_delete_removes_key(key in valid_key_strategy(), value in valid_value_strategy()) {
        let mut cache = test_cache();
        cache.set(key.clone(), value).unwrap();

        prop_assert!(cache.delete(&key));
        prop_assert!(!cache.has(&key));
        prop_assert_eq!(cache.get(&key), None);
        prop_assert!(!cache.delete(&key));
    }

    // Capacity: the store never holds more than max_entries
    #[test]
    fn prop_capacity_bound(
        max_entries in 1usize..10,
        keys in prop::collection::vec(valid_key_strategy(), 1..60)
    ) {
        let mut cache: ObjectCache<String> =
            ObjectCache::new(CacheConfig::default().with_max_entries(max_entries));

        for key in keys {
            cache.set(key, "v".to_string()).unwrap();
            prop_assert!(cache.len() <= max_entries);
        }
    }

    // LRU: with capacity N, the N most recently written distinct keys survive
    #[test]
    fn prop_lru_eviction_order(
        max_entries in 1usize..6,
        keys in prop::collection::vec(valid_key_strategy(), 1..30)
    ) {
        let mut cache: ObjectCache<String> =
            ObjectCache::new(CacheConfig::default().with_max_entries(max_entries));

        for key in &keys {
            cache.set(key.clone(), "v".to_string()).unwrap();
        }

        let mut expected: Vec<String> = Vec::new();
        let mut seen = HashSet::new();
        for key in keys.iter().rev() {
            if seen.insert(key.clone()) {
                expected.push(key.clone());
            }
            if expected.len() == max_entries {
                break;
            }
        }
        expected.reverse();

        prop_assert_eq!(cache.keys(), expected);
    }

    // Memory Budget: usage stays within budget unless a single entry exceeds it
    #[test]
    fn prop_memory_budget(
        budget in 50usize..400,
        values in prop::collection::vec(valid_value_strategy(), 1..30)
    ) {
        let mut cache: ObjectCache<String> =
            ObjectCache::new(CacheConfig::default().with_max_memory_bytes(budget));

        for (i, value) in values.into_iter().enumerate() {
            let size = serde_json::to_vec(&value).unwrap().len();
            cache.set(format!("key{}", i), value).unwrap();

            if size <= budget {
                prop_assert!(cache.memory_usage() <= budget);
            } else {
                prop_assert_eq!(cache.len(), 1);
            }
        }
    }

    // Invalid Keys: empty and over-long keys are rejected without touching the store
    #[test]
    fn prop_oversized_keys_rejected(extra in 1usize..64) {
        let mut cache = test_cache();
        let key = "k".repeat(MAX_KEY_LENGTH + extra);

        prop_assert!(cache.set(key, "v".to_string()).is_err());
        prop_assert!(cache.set("", "v".to_string()).is_err());
        prop_assert!(cache.is_empty());
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(5))]

    // TTL Expiration: entries vanish once the TTL has passed
    #[test]
    fn prop_ttl_expiration(key in valid_key_strategy(), value in valid_value_strategy()) {
        let mut cache: ObjectCache<String> =
            ObjectCache::new(CacheConfig::default().with_ttl(Duration::from_millis(20)));
        cache.set(key.clone(), value.clone()).unwrap();
        prop_assert_eq!(cache.get(&key), Some(value));

        sleep(Duration::from_millis(40));

        prop_assert!(!cache.has(&key));
        prop_assert_eq!(cache.get(&key), None);
        prop_assert_eq!(cache.stats().evictions, 1);
    }
}

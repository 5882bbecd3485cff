//! Eviction Engine
//!
//! Victim selection for the object cache. Capacity pressure evicts strictly by
//! recency; memory pressure evicts by a recency/frequency score.

use std::collections::HashMap;

use crate::cache::{CacheEntry, LruTracker};

/// Why an entry left the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvictionReason {
    /// Store held `max_entries` when a new key arrived
    Capacity,
    /// Total size exceeded `max_memory_bytes`
    Memory,
    /// Entry outlived the TTL
    Expired,
}

// == Eviction Score ==
/// `access_count / (now - last_accessed_at + 1)`.
///
/// Low scores belong to entries that are both rarely read and long untouched.
pub fn eviction_score<V>(entry: &CacheEntry<V>, now: u64) -> f64 {
    let idle = now.saturating_sub(entry.last_accessed_at) + 1;
    entry.access_count as f64 / idle as f64
}

// == Capacity Victim ==
/// Least recently used key.
pub fn select_lru_victim(lru: &LruTracker) -> Option<String> {
    lru.oldest().map(str::to_string)
}

// == Memory Victim ==
/// Key with the smallest eviction score, skipping `protected`.
///
/// Candidates are scanned oldest first and only a strictly smaller score
/// replaces the current pick, so ties go to the least recently used key.
pub fn select_memory_victim<V>(
    entries: &HashMap<String, CacheEntry<V>>,
    lru: &LruTracker,
    now: u64,
    protected: Option<&str>,
) -> Option<String> {
    let mut victim: Option<(&str, f64)> = None;

    for key in lru.iter_oldest_first() {
        if Some(key) == protected {
            continue;
        }
        let Some(entry) = entries.get(key) else {
            continue;
        };
        let score = eviction_score(entry, now);
        match victim {
            Some((_, best)) if score >= best => {}
            _ => victim = Some((key, score)),
        }
    }

    victim.map(|(key, _)| key.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(access_count: u64, last_accessed_at: u64) -> CacheEntry<u8> {
        CacheEntry {
            value: 0,
            created_at: 0,
            last_accessed_at,
            access_count,
            size_bytes: 1,
        }
    }

    #[test]
    fn test_score_prefers_frequent_and_recent() {
        let now = 10_000;
        let hot = eviction_score(&entry(10, 9_990), now);
        let cold = eviction_score(&entry(1, 1_000), now);
        let never_read = eviction_score(&entry(0, 9_999), now);

        assert!(hot > cold);
        assert_eq!(never_read, 0.0);
    }

    #[test]
    fn test_select_lru_victim() {
        let mut lru = LruTracker::new();
        assert_eq!(select_lru_victim(&lru), None);

        lru.touch("a");
        lru.touch("b");
        assert_eq!(select_lru_victim(&lru), Some("a".to_string()));
    }

    #[test]
    fn test_memory_victim_lowest_score() {
        let mut entries = HashMap::new();
        let mut lru = LruTracker::new();

        entries.insert("hot".to_string(), entry(50, 990));
        entries.insert("cold".to_string(), entry(2, 100));
        lru.touch("cold");
        lru.touch("hot");

        let victim = select_memory_victim(&entries, &lru, 1_000, None);
        assert_eq!(victim, Some("cold".to_string()));
    }

    #[test]
    fn test_memory_victim_skips_protected() {
        let mut entries = HashMap::new();
        let mut lru = LruTracker::new();

        entries.insert("old".to_string(), entry(5, 500));
        entries.insert("new".to_string(), entry(0, 1_000));
        lru.touch("old");
        lru.touch("new");

        let victim = select_memory_victim(&entries, &lru, 1_000, Some("new"));
        assert_eq!(victim, Some("old".to_string()));

        entries.remove("old");
        lru.remove("old");
        assert_eq!(select_memory_victim(&entries, &lru, 1_000, Some("new")), None);
    }

    #[test]
    fn test_memory_victim_ties_go_to_oldest() {
        let mut entries = HashMap::new();
        let mut lru = LruTracker::new();

        for key in ["first", "second", "third"] {
            entries.insert(key.to_string(), entry(0, 1_000));
            lru.touch(key);
        }

        let victim = select_memory_victim(&entries, &lru, 1_000, None);
        assert_eq!(victim, Some("first".to_string()));
    }
}

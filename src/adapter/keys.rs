//! Key derivation and group bookkeeping for the response cache.

use std::collections::{BTreeSet, HashMap};

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Hashes a request identity into a cache key (64-bit FNV-1a).
///
/// Stable across processes. Distinct identities can still collide, which is
/// why [`GroupIndex`] remembers the identity behind each key.
pub fn derive_key(identity: &str) -> i64 {
    let hash = identity.bytes().fold(FNV_OFFSET_BASIS, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(FNV_PRIME)
    });
    hash as i64
}

/// Returns the invalidation group of a request path: its first segment.
///
/// `/items/3?full=1` belongs to `items`; `/` has no group.
pub fn group_of(path: &str) -> Option<&str> {
    path.split('/').find(|segment| !segment.is_empty())
}

// == Group Index ==
/// Who a cache key was stored for.
#[derive(Debug, Clone)]
struct Claim {
    group: String,
    identity: String,
}

/// Maps each group to the cache keys stored on its behalf.
///
/// Also hands out per-group generations. Invalidating a group retires its
/// generation, so a response computed before the invalidation can be told
/// apart from one computed after it.
#[derive(Debug, Default)]
pub struct GroupIndex {
    groups: HashMap<String, BTreeSet<i64>>,
    claims: HashMap<i64, Claim>,
    generations: HashMap<String, u64>,
    next_generation: u64,
}

impl GroupIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if `key` is already claimed by a different identity.
    pub fn is_free_for(&self, key: i64, identity: &str) -> bool {
        self.claims
            .get(&key)
            .map_or(true, |claim| claim.identity == identity)
    }

    /// Returns true only if `key` was registered for exactly `identity`.
    pub fn owns(&self, key: i64, identity: &str) -> bool {
        self.claims
            .get(&key)
            .is_some_and(|claim| claim.identity == identity)
    }

    /// Records `key` as belonging to `group`.
    pub fn register(&mut self, group: &str, key: i64, identity: &str) {
        self.claims.insert(
            key,
            Claim {
                group: group.to_string(),
                identity: identity.to_string(),
            },
        );
        self.groups.entry(group.to_string()).or_default().insert(key);
    }

    /// Current generation of `group`, starting a new one if it has none.
    pub fn generation(&mut self, group: &str) -> u64 {
        if let Some(generation) = self.generations.get(group) {
            return *generation;
        }

        self.next_generation += 1;
        self.generations
            .insert(group.to_string(), self.next_generation);
        self.next_generation
    }

    /// Returns true if `generation` is still the live generation of `group`.
    pub fn is_current(&self, group: &str, generation: u64) -> bool {
        self.generations.get(group) == Some(&generation)
    }

    /// Keys currently recorded for `group`, ascending.
    pub fn keys(&self, group: &str) -> Vec<i64> {
        self.groups
            .get(group)
            .map(|keys| keys.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Removes a group and forgets its keys, returning them.
    ///
    /// The group's generation is retired even when it holds no keys.
    pub fn take_group(&mut self, group: &str) -> Vec<i64> {
        self.generations.remove(group);
        let keys: Vec<i64> = self
            .groups
            .remove(group)
            .map(|keys| keys.into_iter().collect())
            .unwrap_or_default();

        for key in &keys {
            self.claims.remove(key);
        }
        keys
    }

    /// Forgets keys that left the store without an invalidation.
    ///
    /// Groups left empty are dropped along with their generation; a response
    /// still being computed for such a group is then served uncached.
    pub fn forget(&mut self, keys: &[i64]) {
        for key in keys {
            let Some(claim) = self.claims.remove(key) else {
                continue;
            };
            if let Some(group_keys) = self.groups.get_mut(&claim.group) {
                group_keys.remove(key);
                if group_keys.is_empty() {
                    self.groups.remove(&claim.group);
                }
            }
        }

        let groups = &self.groups;
        self.generations.retain(|group, _| groups.contains_key(group));
    }

    /// Number of groups with at least one key.
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Number of keys tracked across all groups.
    pub fn len(&self) -> usize {
        self.claims.len()
    }

    /// Returns true if no key is tracked.
    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }
}

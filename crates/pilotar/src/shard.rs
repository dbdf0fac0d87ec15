//! Shard-key routing for distributed execution.
//!
//! Tests are routed by affinity, not load: the shard key is a structural
//! property of the test identifier — its platform grouping segment — and
//! every test sharing a key lands on the same worker. Keys map to workers
//! through a deterministic hash, so the assignment is stable across
//! processes and machines.

use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

/// Identifier segment separator in test ids (`web::search::first_result`)
const ID_SEPARATOR: &str = "::";

/// Extract the shard key from a test identifier.
///
/// The key is the leading platform grouping segment; an identifier without
/// separators is its own key.
#[must_use]
pub fn shard_key(test_id: &str) -> &str {
    test_id.split(ID_SEPARATOR).next().unwrap_or(test_id)
}

/// Routes shard keys onto a fixed set of workers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShardRouter {
    workers: usize,
}

impl ShardRouter {
    /// Create a router over `workers` workers (at least one)
    #[must_use]
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }

    /// Number of workers routed onto
    #[must_use]
    pub const fn workers(&self) -> usize {
        self.workers
    }

    /// Worker index for a test, derived from its shard key
    #[must_use]
    pub fn worker_for(&self, test_id: &str) -> usize {
        let mut hasher = DefaultHasher::new();
        shard_key(test_id).hash(&mut hasher);
        (hasher.finish() % self.workers as u64) as usize
    }

    /// Partition test ids into per-worker batches, preserving input order
    /// within each batch.
    #[must_use]
    pub fn partition<'a>(&self, test_ids: &[&'a str]) -> Vec<Vec<&'a str>> {
        let mut batches = vec![Vec::new(); self.workers];
        for id in test_ids {
            batches[self.worker_for(id)].push(*id);
        }
        batches
    }

    /// Group test ids by shard key, ordered by key
    #[must_use]
    pub fn group_by_key<'a>(test_ids: &[&'a str]) -> BTreeMap<&'a str, Vec<&'a str>> {
        let mut groups: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for id in test_ids {
            groups.entry(shard_key(id)).or_default().push(id);
        }
        groups
    }
}

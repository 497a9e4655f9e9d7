// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Path → descriptor cache.
//!
//! Bounded LRU in front of tree resolution. The only invalidation is a
//! wholesale purge: the notification transport calls [`DescriptorCache::invalidate`]
//! whenever the governed stream changes, from whatever thread it runs on, so
//! the cache carries its own lock independent of the namespace.
//!
//! Every purge bumps a generation counter. A caller that missed, resolved
//! the path from the store and then inserts passes the generation it saw
//! before resolving; if a purge happened in between, the insert is dropped
//! so a descriptor read before the change cannot outlive it.

use crate::descriptor::Descriptor;
use diagnostics::*;
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;

/// Counters for monitoring cache effectiveness
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub inserts: u64,
    pub invalidations: u64,
    /// Inserts dropped because a purge raced with the resolution
    pub stale: u64,
}

struct Inner {
    entries: LruCache<String, Descriptor>,
    stats: CacheStats,
    generation: u64,
}

pub struct DescriptorCache {
    inner: Mutex<Inner>,
}

impl DescriptorCache {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: LruCache::new(capacity),
                stats: CacheStats::default(),
                generation: 0,
            }),
        }
    }

    /// Cached descriptor for `path`, marking it most recently used
    pub fn lookup(&self, path: &str) -> Option<Descriptor> {
        let mut inner = self.inner.lock();
        let found = inner.entries.get(path).cloned();
        match found {
            Some(desc) => {
                inner.stats.hits += 1;
                Some(desc)
            }
            None => {
                inner.stats.misses += 1;
                None
            }
        }
    }

    /// Current purge generation; read it before resolving a missed path
    pub fn generation(&self) -> u64 {
        self.inner.lock().generation
    }

    /// Cache the persisted part of `desc`; runtime state is not kept.
    ///
    /// Returns false, caching nothing, when the cache was purged since
    /// `generation` was read.
    pub fn insert(&self, path: &str, desc: &Descriptor, generation: u64) -> bool {
        let mut inner = self.inner.lock();
        if inner.generation != generation {
            inner.stats.stale += 1;
            return false;
        }
        _ = inner
            .entries
            .put(path.to_string(), Descriptor::from(desc.record().clone()));
        inner.stats.inserts += 1;
        true
    }

    /// Drop every entry
    pub fn invalidate(&self) {
        let purged = {
            let mut inner = self.inner.lock();
            let purged = inner.entries.len();
            inner.entries.clear();
            inner.generation += 1;
            inner.stats.invalidations += 1;
            purged
        };
        debug!("descriptor cache purged {purged} entries", purged: purged);
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        self.inner.lock().stats
    }
}

// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use super::{STREAM, new_namespace, open_namespace, write_file};
use crate::cache::DescriptorCache;
use crate::config::Config;
use crate::error::Result;
use crate::memory::MemoryStore;
use crate::namespace::Namespace;
use crate::store::{Record, RecordId, RecordStore, StreamId};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;

/// Store that purges a cache once, in the middle of the next window read,
/// as a change notification arriving during a lookup would
#[derive(Default)]
struct PurgingStore {
    inner: MemoryStore,
    armed: Mutex<Option<Arc<DescriptorCache>>>,
}

#[async_trait]
impl RecordStore for PurgingStore {
    async fn append(&self, stream: &StreamId, content: &str) -> Result<RecordId> {
        self.inner.append(stream, content).await
    }

    async fn edit(&self, stream: &StreamId, id: &RecordId, content: &str) -> Result<()> {
        self.inner.edit(stream, id, content).await
    }

    async fn records_after(
        &self,
        stream: &StreamId,
        anchor: &RecordId,
        limit: usize,
    ) -> Result<Vec<Record>> {
        let records = self.inner.records_after(stream, anchor, limit).await?;
        let armed = self.armed.lock().take();
        if let Some(cache) = armed {
            cache.invalidate();
        }
        Ok(records)
    }

    async fn read_metadata(&self, stream: &StreamId) -> Result<Option<String>> {
        self.inner.read_metadata(stream).await
    }

    async fn write_metadata(&self, stream: &StreamId, text: &str) -> Result<()> {
        self.inner.write_metadata(stream, text).await
    }
}

#[tokio::test]
async fn test_repeated_lookup_skips_store() {
    let (store, mut ns) = new_namespace().await;
    _ = ns.mkdir("/a").await.unwrap();
    write_file(&mut ns, "/a/f", b"cached").await;

    let first = ns.lookup("/a/f").await.unwrap();
    let calls = store.call_count().await;
    let second = ns.lookup("/a/f").await.unwrap();

    assert_eq!(store.call_count().await, calls);
    assert_eq!(first.record(), second.record());
    assert!(!second.is_materialized());
    assert_eq!(ns.cache().stats().hits, 1);
}

#[tokio::test]
async fn test_invalidate_forces_walk() {
    let (store, mut ns) = new_namespace().await;
    write_file(&mut ns, "/f", b"x").await;
    _ = ns.lookup("/f").await.unwrap();

    ns.invalidate();
    assert!(ns.cache().is_empty());

    let calls = store.call_count().await;
    _ = ns.lookup("/f").await.unwrap();
    assert!(store.call_count().await > calls);
}

#[tokio::test]
async fn test_own_changes_are_visible() {
    let (_store, mut ns) = new_namespace().await;
    write_file(&mut ns, "/f", b"one").await;
    assert_eq!(ns.attributes("/f").await.unwrap().size, 3);

    write_file(&mut ns, "/f", b"three").await;
    assert_eq!(ns.attributes("/f").await.unwrap().size, 5);

    ns.unlink("/f").await.unwrap();
    assert!(ns.lookup("/f").await.is_err());
}

#[tokio::test]
async fn test_external_change_needs_invalidation() {
    let store = MemoryStore::new();
    let mut writer = open_namespace(&store).await;
    let reader = open_namespace(&store).await;

    write_file(&mut writer, "/f", b"one").await;
    assert_eq!(reader.attributes("/f").await.unwrap().size, 3);

    write_file(&mut writer, "/f", b"changed").await;
    // Nothing told the reader
    assert_eq!(reader.attributes("/f").await.unwrap().size, 3);

    reader.invalidate();
    assert_eq!(reader.attributes("/f").await.unwrap().size, 7);
}

#[tokio::test]
async fn test_change_notifications_purge_cache() {
    let store = MemoryStore::new();
    let mut writer = open_namespace(&store).await;
    let reader = open_namespace(&store).await;

    let cache = reader.cache();
    store.subscribe(move |_| cache.invalidate()).await;

    write_file(&mut writer, "/f", b"one").await;
    assert_eq!(reader.attributes("/f").await.unwrap().size, 3);

    write_file(&mut writer, "/f", b"changed").await;
    assert_eq!(reader.attributes("/f").await.unwrap().size, 7);
    assert!(reader.cache().stats().invalidations > 0);
}

#[tokio::test]
async fn test_purge_during_lookup_is_not_lost() {
    let store = Arc::new(PurgingStore::default());
    let mut ns = Namespace::open(store.clone(), StreamId::new(STREAM), Config::default())
        .await
        .unwrap();
    write_file(&mut ns, "/f", b"one").await;

    *store.armed.lock() = Some(ns.cache());
    assert_eq!(ns.lookup("/f").await.unwrap().size(), 3);

    // What was resolved before the purge is not kept
    assert!(ns.cache().is_empty());
    assert_eq!(ns.cache().stats().stale, 1);

    _ = ns.lookup("/f").await.unwrap();
    assert_eq!(ns.cache().len(), 1);
}

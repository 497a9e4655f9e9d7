// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Record chains: the block layer on top of a message stream.
//!
//! A chain is one anchor record followed by data records. The anchor's id is
//! the chain's address; each data record carries [`DATA_MARKER`] followed by
//! up to `chunk_size` payload bytes. Chains are never deleted; a chain that
//! is replaced or whose node is removed simply stays in the stream.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::store::{Record, RecordId, RecordStore, StreamId};
use diagnostics::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Leading byte of every data record
pub const DATA_MARKER: char = 'f';

/// Longest label kept in an anchor record, in bytes
pub const ANCHOR_LABEL_LIMIT: usize = 200;

/// Text of an anchor record. Long labels are cut on a character boundary
/// so the anchor always fits in one record.
fn anchor_text(label: &str) -> String {
    let mut end = label.len().min(ANCHOR_LABEL_LIMIT);
    while !label.is_char_boundary(end) {
        end -= 1;
    }
    format!("#anchor {}", &label[..end])
}

/// Address of a chain: the stream it lives in and its anchor record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainHandle {
    #[serde(rename = "channel_id")]
    pub stream: StreamId,
    #[serde(rename = "start_id")]
    pub anchor: RecordId,
}

/// Split `payload` into chunks of at most `chunk_size` bytes.
///
/// Boundaries never split a UTF-8 character, so a chunk of non-ASCII text
/// may come up a few bytes short.
pub fn split_chunks(payload: &str, chunk_size: usize) -> Vec<&str> {
    let mut chunks = Vec::with_capacity(payload.len().div_ceil(chunk_size.max(1)));
    let mut rest = payload;
    while !rest.is_empty() {
        let mut end = chunk_size.min(rest.len());
        while end > 0 && !rest.is_char_boundary(end) {
            end -= 1;
        }
        if end == 0 {
            end = rest.chars().next().map_or(rest.len(), char::len_utf8);
        }
        let (head, tail) = rest.split_at(end);
        chunks.push(head);
        rest = tail;
    }
    chunks
}

/// Allocates, fetches and rewrites chains in one store
#[derive(Clone)]
pub struct ChainStore {
    store: Arc<dyn RecordStore>,
    chunk_size: usize,
    max_fetch_chunks: usize,
}

impl ChainStore {
    pub fn new(store: Arc<dyn RecordStore>, config: &Config) -> Self {
        Self {
            store,
            chunk_size: config.chunk_size,
            max_fetch_chunks: config.max_fetch_chunks,
        }
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Number of data records `allocate` would write for `payload`
    pub fn chunks_needed(&self, payload: &str) -> usize {
        split_chunks(payload, self.chunk_size).len()
    }

    /// Write a new chain holding `payload`, returning its handle and chunk count.
    ///
    /// A failed append leaves whatever was already written in the stream.
    pub async fn allocate(
        &self,
        stream: &StreamId,
        label: &str,
        payload: &str,
    ) -> Result<(ChainHandle, usize)> {
        let anchor = self.store.append(stream, &anchor_text(label)).await?;
        let chunks = split_chunks(payload, self.chunk_size);
        for chunk in &chunks {
            _ = self
                .store
                .append(stream, &format!("{DATA_MARKER}{chunk}"))
                .await?;
        }

        let count = chunks.len();
        let anchor_id = anchor.to_string();
        debug!(
            "allocated chain {anchor_id} for {label} with {count} chunks",
            anchor_id: anchor_id,
            label: label,
            count: count
        );
        Ok((
            ChainHandle {
                stream: stream.clone(),
                anchor,
            },
            count,
        ))
    }

    /// The first `count` data records of a chain, oldest first
    async fn chain_records(&self, handle: &ChainHandle, count: usize) -> Result<Vec<Record>> {
        if count > self.max_fetch_chunks {
            return Err(Error::TooLarge {
                count,
                limit: self.max_fetch_chunks,
            });
        }
        if count == 0 {
            return Ok(Vec::new());
        }

        let mut records = self
            .store
            .records_after(&handle.stream, &handle.anchor, count)
            .await?;
        records.reverse();

        if let Some(foreign) = records
            .iter()
            .find(|r| !r.content.starts_with(DATA_MARKER))
        {
            return Err(Error::serialization(format!(
                "record {} in chain {} is not a data record",
                foreign.id, handle.anchor
            )));
        }
        Ok(records)
    }

    /// Reassemble the payload held by the first `count` data records
    pub async fn fetch(&self, handle: &ChainHandle, count: usize) -> Result<String> {
        let records = self.chain_records(handle, count).await?;
        let mut payload = String::with_capacity(records.len() * self.chunk_size);
        for record in &records {
            payload.push_str(&record.content[DATA_MARKER.len_utf8()..]);
        }
        Ok(payload)
    }

    /// Overwrite the chain's leading records in place with `payload`.
    ///
    /// The chain must already hold at least `chunks_needed(payload)` records.
    /// Records whose content is unchanged are not edited. Returns the number
    /// of chunks the payload now occupies.
    pub async fn rewrite(&self, handle: &ChainHandle, payload: &str) -> Result<usize> {
        let chunks = split_chunks(payload, self.chunk_size);
        let records = self.chain_records(handle, chunks.len()).await?;
        if records.len() < chunks.len() {
            return Err(Error::serialization(format!(
                "chain {} holds {} records, {} needed",
                handle.anchor,
                records.len(),
                chunks.len()
            )));
        }

        let mut edited = 0usize;
        for (record, chunk) in records.iter().zip(&chunks) {
            let content = format!("{DATA_MARKER}{chunk}");
            if record.content != content {
                self.store.edit(&handle.stream, &record.id, &content).await?;
                edited += 1;
            }
        }

        let anchor_id = handle.anchor.to_string();
        debug!(
            "rewrote {edited} records of chain {anchor_id}",
            edited: edited,
            anchor_id: anchor_id
        );
        Ok(chunks.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CHUNK_SIZE, RECORD_LIMIT};
    use crate::memory::MemoryStore;

    fn chains(store: &MemoryStore) -> ChainStore {
        ChainStore::new(Arc::new(store.clone()), &Config::default())
    }

    #[test]
    fn test_split_exact_boundaries() {
        for k in 1..=3 {
            let exact = "a".repeat(k * CHUNK_SIZE);
            assert_eq!(split_chunks(&exact, CHUNK_SIZE).len(), k);

            let over = "a".repeat(k * CHUNK_SIZE + 1);
            let chunks = split_chunks(&over, CHUNK_SIZE);
            assert_eq!(chunks.len(), k + 1);
            assert_eq!(chunks[k], "a");
        }
        assert!(split_chunks("", CHUNK_SIZE).is_empty());
    }

    #[test]
    fn test_split_respects_char_boundaries() {
        // 'é' is two bytes; a 3 byte chunk cannot hold two of them
        let chunks = split_chunks("éééé", 3);
        assert_eq!(chunks, vec!["é", "é", "é", "é"]);
        assert_eq!(chunks.concat(), "éééé");

        // Wider than the chunk: emitted whole rather than looping
        assert_eq!(split_chunks("€", 1), vec!["€"]);
    }

    #[tokio::test]
    async fn test_allocate_layout() {
        let store = MemoryStore::new();
        let stream = StreamId::new("general");
        let payload = "x".repeat(CHUNK_SIZE + 10);

        let (handle, count) = chains(&store)
            .allocate(&stream, "/file", &payload)
            .await
            .unwrap();
        assert_eq!(count, 2);

        let records = store.records(&stream).await;
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].id, handle.anchor);
        assert!(!records[0].content.starts_with(DATA_MARKER));
        assert_eq!(records[1].content.len(), CHUNK_SIZE + 1);
        assert_eq!(records[2].content, format!("f{}", "x".repeat(10)));
    }

    #[tokio::test]
    async fn test_fetch_reassembles_in_write_order() {
        let store = MemoryStore::new();
        let stream = StreamId::new("general");
        let chains = chains(&store);
        let payload: String = (0..3 * CHUNK_SIZE)
            .map(|i| char::from(b'a' + (i % 26) as u8))
            .collect();

        let (handle, count) = chains.allocate(&stream, "/f", &payload).await.unwrap();
        // Unrelated traffic after the chain is not picked up
        _ = store.append(&stream, "hello everyone").await.unwrap();

        assert_eq!(chains.fetch(&handle, count).await.unwrap(), payload);
    }

    #[tokio::test]
    async fn test_fetch_ceiling_checked_before_store() {
        let store = MemoryStore::new();
        let stream = StreamId::new("general");
        let chains = chains(&store);
        let (handle, _) = chains.allocate(&stream, "/f", "abc").await.unwrap();
        let before = store.call_count().await;

        let result = chains.fetch(&handle, MAX + 1).await;
        assert_eq!(
            result,
            Err(Error::TooLarge {
                count: MAX + 1,
                limit: MAX
            })
        );
        assert_eq!(store.call_count().await, before);
    }

    const MAX: usize = crate::config::MAX_FETCH_CHUNKS;

    #[tokio::test]
    async fn test_fetch_empty() {
        let store = MemoryStore::new();
        let stream = StreamId::new("general");
        let chains = chains(&store);
        let (handle, count) = chains.allocate(&stream, "/empty", "").await.unwrap();
        assert_eq!(count, 0);
        assert_eq!(chains.fetch(&handle, 0).await.unwrap(), "");
        // Nothing written after the anchor yet
        assert_eq!(chains.fetch(&handle, 1).await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_foreign_record_in_chain() {
        let store = MemoryStore::new();
        let stream = StreamId::new("general");
        let chains = chains(&store);
        let (handle, _) = chains.allocate(&stream, "/f", "abc").await.unwrap();
        _ = store.append(&stream, "someone talking").await.unwrap();

        let result = chains.fetch(&handle, 2).await;
        assert!(matches!(result, Err(Error::SerializationFailure(_))));
    }

    #[tokio::test]
    async fn test_rewrite_every_chunk() {
        let store = MemoryStore::new();
        let stream = StreamId::new("general");
        let chains = chains(&store);
        let old = "a".repeat(2 * CHUNK_SIZE);
        let (handle, count) = chains.allocate(&stream, "/f", &old).await.unwrap();

        let new = "b".repeat(2 * CHUNK_SIZE);
        assert_eq!(chains.rewrite(&handle, &new).await.unwrap(), 2);
        assert_eq!(chains.fetch(&handle, count).await.unwrap(), new);

        let short = "c".repeat(10);
        assert_eq!(chains.rewrite(&handle, &short).await.unwrap(), 1);
        assert_eq!(chains.fetch(&handle, 1).await.unwrap(), short);
    }

    #[tokio::test]
    async fn test_rewrite_beyond_chain() {
        let store = MemoryStore::new();
        let stream = StreamId::new("general");
        let chains = chains(&store);
        let (handle, _) = chains.allocate(&stream, "/f", "abc").await.unwrap();

        let result = chains.rewrite(&handle, &"z".repeat(CHUNK_SIZE + 1)).await;
        assert!(matches!(result, Err(Error::SerializationFailure(_))));
    }

    #[tokio::test]
    async fn test_allocate_failure() {
        let store = MemoryStore::new();
        let stream = StreamId::new("general");
        store.fail_after(2).await;
        let payload = "q".repeat(3 * CHUNK_SIZE);
        let result = chains(&store).allocate(&stream, "/f", &payload).await;
        assert!(matches!(result, Err(Error::IoFailure(_))));
        // Anchor and first chunk stay behind
        assert_eq!(store.records(&stream).await.len(), 2);
    }

    #[test]
    fn test_anchor_label_is_bounded() {
        assert_eq!(anchor_text("/docs/a.txt"), "#anchor /docs/a.txt");

        let long = "é".repeat(1500);
        let text = anchor_text(&long);
        assert!(text.len() <= "#anchor ".len() + ANCHOR_LABEL_LIMIT);
        assert!(!text.starts_with(DATA_MARKER));
    }

    #[tokio::test]
    async fn test_allocate_with_long_label() {
        let store = MemoryStore::new();
        let chains = chains(&store);
        let stream = StreamId::new("general");
        let label = format!("/{}", "n".repeat(5000));

        let (handle, count) = chains.allocate(&stream, &label, "abc").await.unwrap();
        assert_eq!(chains.fetch(&handle, count).await.unwrap(), "abc");
        let anchor = &store.records(&stream).await[0];
        assert!(anchor.content.len() <= RECORD_LIMIT);
    }
}

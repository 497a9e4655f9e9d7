// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! In-memory record store.
//!
//! Behaves like the hosted service as far as the namespace can observe:
//! ordered append-only streams, size-limited records, newest-first windows
//! and one metadata slot per stream. Used by the tests and for local
//! experiments; nothing survives the process.

use crate::config::RECORD_LIMIT;
use crate::error::{Error, Result};
use crate::store::{Record, RecordId, RecordStore, StreamId};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Callback run after every change to a stream, standing in for the
/// service's push notifications
pub type ChangeListener = Arc<dyn Fn(&StreamId) + Send + Sync>;

#[derive(Clone, Default)]
pub struct MemoryStore(Arc<Mutex<State>>);

#[derive(Default)]
struct State {
    streams: HashMap<StreamId, Vec<Record>>,
    metadata: HashMap<StreamId, String>,
    next_id: u64,
    calls: usize,
    // Calls left before every request starts failing
    fail_after: Option<usize>,
    listeners: Vec<ChangeListener>,
}

impl State {
    fn begin_call(&mut self) -> Result<()> {
        self.calls += 1;
        match self.fail_after {
            Some(0) => Err(Error::io("memory store: injected failure")),
            Some(n) => {
                self.fail_after = Some(n - 1);
                Ok(())
            }
            None => Ok(()),
        }
    }

    fn check_size(content: &str) -> Result<()> {
        if content.len() > RECORD_LIMIT {
            return Err(Error::io(format!(
                "memory store: record of {} bytes exceeds {} byte limit",
                content.len(),
                RECORD_LIMIT
            )));
        }
        Ok(())
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a change listener
    pub async fn subscribe<F>(&self, listener: F)
    where
        F: Fn(&StreamId) + Send + Sync + 'static,
    {
        self.0.lock().await.listeners.push(Arc::new(listener));
    }

    /// Let `calls` more requests succeed, then fail every request
    pub async fn fail_after(&self, calls: usize) {
        self.0.lock().await.fail_after = Some(calls);
    }

    /// Clear any injected failure
    pub async fn heal(&self) {
        self.0.lock().await.fail_after = None;
    }

    /// Number of requests issued so far, failed ones included
    pub async fn call_count(&self) -> usize {
        self.0.lock().await.calls
    }

    /// Snapshot of a stream, oldest record first
    pub async fn records(&self, stream: &StreamId) -> Vec<Record> {
        self.0
            .lock()
            .await
            .streams
            .get(stream)
            .cloned()
            .unwrap_or_default()
    }

    fn notify(listeners: Vec<ChangeListener>, stream: &StreamId) {
        for listener in listeners {
            listener(stream);
        }
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn append(&self, stream: &StreamId, content: &str) -> Result<RecordId> {
        let (id, listeners) = {
            let mut state = self.0.lock().await;
            state.begin_call()?;
            State::check_size(content)?;
            state.next_id += 1;
            let id = RecordId::new(format!("{:018}", state.next_id));
            state.streams.entry(stream.clone()).or_default().push(Record {
                id: id.clone(),
                content: content.to_string(),
            });
            (id, state.listeners.clone())
        };
        Self::notify(listeners, stream);
        Ok(id)
    }

    async fn edit(&self, stream: &StreamId, id: &RecordId, content: &str) -> Result<()> {
        let listeners = {
            let mut state = self.0.lock().await;
            state.begin_call()?;
            State::check_size(content)?;
            let record = state
                .streams
                .get_mut(stream)
                .and_then(|records| records.iter_mut().find(|r| &r.id == id))
                .ok_or_else(|| Error::not_found(format!("record {id}")))?;
            record.content = content.to_string();
            state.listeners.clone()
        };
        Self::notify(listeners, stream);
        Ok(())
    }

    async fn records_after(
        &self,
        stream: &StreamId,
        anchor: &RecordId,
        limit: usize,
    ) -> Result<Vec<Record>> {
        let mut state = self.0.lock().await;
        state.begin_call()?;
        let Some(records) = state.streams.get(stream) else {
            return Ok(Vec::new());
        };
        let pos = records
            .iter()
            .position(|r| &r.id == anchor)
            .ok_or_else(|| Error::not_found(format!("record {anchor}")))?;
        let mut window: Vec<Record> = records
            .iter()
            .skip(pos + 1)
            .take(limit)
            .cloned()
            .collect();
        window.reverse();
        Ok(window)
    }

    async fn read_metadata(&self, stream: &StreamId) -> Result<Option<String>> {
        let mut state = self.0.lock().await;
        state.begin_call()?;
        Ok(state.metadata.get(stream).cloned())
    }

    async fn write_metadata(&self, stream: &StreamId, text: &str) -> Result<()> {
        let listeners = {
            let mut state = self.0.lock().await;
            state.begin_call()?;
            _ = state.metadata.insert(stream.clone(), text.to_string());
            state.listeners.clone()
        };
        Self::notify(listeners, stream);
        Ok(())
    }
}

// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies one ordered record stream (a chat channel)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StreamId(String);

/// Store-assigned record identifier. Only meaningful as an address handed
/// back to the store; callers never choose one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl StreamId {
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl RecordId {
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One text entry in a stream
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub id: RecordId,
    pub content: String,
}

/// Backing store adapter - the only operations the hosted service offers.
///
/// Implementations report every failed call as `Error::IoFailure`; nothing
/// above this trait retries.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Append a record to the end of the stream
    async fn append(&self, stream: &StreamId, content: &str) -> Result<RecordId>;

    /// Replace the content of an existing record
    async fn edit(&self, stream: &StreamId, id: &RecordId, content: &str) -> Result<()>;

    /// Up to `limit` records written immediately after `anchor`, newest first
    async fn records_after(
        &self,
        stream: &StreamId,
        anchor: &RecordId,
        limit: usize,
    ) -> Result<Vec<Record>>;

    /// The stream's free-text metadata slot, if it has ever been set
    async fn read_metadata(&self, stream: &StreamId) -> Result<Option<String>>;

    async fn write_metadata(&self, stream: &StreamId, text: &str) -> Result<()>;
}

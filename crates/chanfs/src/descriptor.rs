// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use crate::chain::ChainHandle;
use crate::path;
use serde::{Deserialize, Serialize};

fn is_false(value: &bool) -> bool {
    !*value
}

/// Persisted half of a descriptor.
///
/// This is exactly what is stored in a parent's listing, or in the stream
/// metadata slot for the root. Field names are part of the stored format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DescriptorRecord {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    pub path: String,

    #[serde(default, skip_serializing_if = "is_false")]
    pub is_root: bool,

    #[serde(default, skip_serializing_if = "is_false")]
    pub is_dir: bool,

    /// Decoded length in bytes; unused for directories
    #[serde(default)]
    pub size: u64,

    /// Chunks originally allocated for the chain
    #[serde(rename = "capacity", default)]
    pub chunk_capacity: usize,

    #[serde(flatten)]
    pub chain: ChainHandle,

    /// Data records currently valid in the chain
    #[serde(rename = "count", default)]
    pub chunk_count: usize,
}

impl DescriptorRecord {
    pub fn root(chain: ChainHandle, chunk_count: usize) -> Self {
        Self {
            name: String::new(),
            path: path::ROOT.to_string(),
            is_root: true,
            is_dir: true,
            size: 0,
            chunk_capacity: chunk_count,
            chain,
            chunk_count,
        }
    }

    pub fn file(path: &str, chain: ChainHandle, chunk_count: usize) -> Self {
        Self {
            name: path::basename(path).to_string(),
            path: path.to_string(),
            is_root: false,
            is_dir: false,
            size: 0,
            chunk_capacity: chunk_count,
            chain,
            chunk_count,
        }
    }

    pub fn directory(path: &str, chain: ChainHandle, chunk_count: usize) -> Self {
        Self {
            is_dir: true,
            ..Self::file(path, chain, chunk_count)
        }
    }

    /// Point the record at a new path, keeping `name` in step
    pub fn set_path(&mut self, path: String) {
        self.name = path::basename(&path).to_string();
        self.path = path;
    }
}

/// A resolved node: its persisted record plus runtime-only state.
///
/// `content` holds the decoded bytes (raw listing text for directories) once
/// they have been materialized; `dirty` is set when they differ from what
/// the chain holds.
#[derive(Debug, Clone)]
pub struct Descriptor {
    record: DescriptorRecord,
    dirty: bool,
    content: Option<Vec<u8>>,
}

impl From<DescriptorRecord> for Descriptor {
    fn from(record: DescriptorRecord) -> Self {
        Self {
            record,
            dirty: false,
            content: None,
        }
    }
}

impl Descriptor {
    pub fn record(&self) -> &DescriptorRecord {
        &self.record
    }

    pub(crate) fn record_mut(&mut self) -> &mut DescriptorRecord {
        &mut self.record
    }

    pub fn into_record(self) -> DescriptorRecord {
        self.record
    }

    pub fn path(&self) -> &str {
        &self.record.path
    }

    pub fn name(&self) -> &str {
        &self.record.name
    }

    pub fn is_dir(&self) -> bool {
        self.record.is_dir
    }

    pub fn is_root(&self) -> bool {
        self.record.is_root
    }

    pub fn size(&self) -> u64 {
        self.record.size
    }

    pub fn chunk_count(&self) -> usize {
        self.record.chunk_count
    }

    pub fn chunk_capacity(&self) -> usize {
        self.record.chunk_capacity
    }

    pub fn chain(&self) -> &ChainHandle {
        &self.record.chain
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn is_materialized(&self) -> bool {
        self.content.is_some()
    }

    pub(crate) fn content(&self) -> Option<&[u8]> {
        self.content.as_deref()
    }

    pub(crate) fn content_mut(&mut self) -> Option<&mut Vec<u8>> {
        self.content.as_mut()
    }

    pub(crate) fn set_content(&mut self, content: Vec<u8>) {
        self.content = Some(content);
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn mark_clean(&mut self) {
        self.dirty = false;
    }
}

// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use crate::descriptor::Descriptor;
use crate::error::Result;
use crate::namespace::Namespace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

/// Attributes reported to the dispatch layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeMetadata {
    pub kind: EntryKind,
    /// Decoded length; zero for directories
    pub size: u64,
    pub chunk_count: usize,
}

impl From<&Descriptor> for NodeMetadata {
    fn from(desc: &Descriptor) -> Self {
        let kind = if desc.is_dir() {
            EntryKind::Directory
        } else {
            EntryKind::File
        };
        Self {
            kind,
            size: if desc.is_dir() { 0 } else { desc.size() },
            chunk_count: desc.chunk_count(),
        }
    }
}

impl Namespace {
    pub async fn attributes(&self, path: &str) -> Result<NodeMetadata> {
        let desc = self.lookup(path).await?;
        Ok(NodeMetadata::from(&desc))
    }
}

// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! File content access.
//!
//! Records only carry text, so file bytes are stored base64 encoded;
//! directory listings are stored as plain JSON. A descriptor's decoded bytes
//! are fetched once and kept on the descriptor until it is dropped.

use crate::descriptor::Descriptor;
use crate::error::{Error, Result};
use crate::namespace::Namespace;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use diagnostics::*;

/// The chain payload for a descriptor's current content
pub(crate) fn encode_payload(desc: &Descriptor) -> Result<String> {
    let bytes = desc.content().unwrap_or_default();
    if desc.is_dir() {
        Ok(String::from_utf8(bytes.to_vec())?)
    } else {
        Ok(B64.encode(bytes))
    }
}

fn decode_payload(desc: &Descriptor, payload: String) -> Result<Vec<u8>> {
    if desc.is_dir() {
        Ok(payload.into_bytes())
    } else {
        Ok(B64.decode(payload.as_bytes())?)
    }
}

fn buffer(desc: &mut Descriptor) -> Result<&mut Vec<u8>> {
    let path = desc.path().to_string();
    desc.content_mut()
        .ok_or_else(|| Error::serialization(format!("content of {path} not loaded")))
}

impl Namespace {
    /// Fetch and decode the descriptor's chain unless already done
    pub(crate) async fn materialize(&self, desc: &mut Descriptor) -> Result<()> {
        if desc.is_materialized() {
            return Ok(());
        }
        let payload = self.chains.fetch(desc.chain(), desc.chunk_count()).await?;
        let bytes = decode_payload(desc, payload)?;

        let path = desc.path().to_string();
        let len = bytes.len();
        debug!("materialized {path}: {len} bytes", path: path, len: len);
        desc.set_content(bytes);
        Ok(())
    }

    /// Read up to `length` bytes at `offset`. Short reads at the end of the
    /// file are clamped rather than failing.
    pub async fn read(&self, desc: &mut Descriptor, offset: u64, length: usize) -> Result<Vec<u8>> {
        if desc.is_dir() {
            return Err(Error::not_a_file(desc.path()));
        }
        self.materialize(desc).await?;

        let data = desc.content().unwrap_or_default();
        let len = data.len() as u64;
        if offset >= len {
            // Reading an empty file from the start is just end-of-file
            if offset == 0 {
                return Ok(Vec::new());
            }
            return Err(Error::OutOfRange { offset, len });
        }
        let start = offset as usize;
        let end = start.saturating_add(length).min(data.len());
        Ok(data[start..end].to_vec())
    }

    /// Overwrite `data.len()` bytes at `offset`, growing the file as needed.
    ///
    /// Growth past what a chain can hold within the fetch ceiling fails with
    /// [`Error::TooLarge`] and leaves the file untouched.
    ///
    /// Growth updates the stored size right away so attribute queries see
    /// it before the next flush. The content itself is only persisted by
    /// [`Namespace::flush`].
    pub async fn write(&mut self, desc: &mut Descriptor, data: &[u8], offset: u64) -> Result<usize> {
        if desc.is_dir() {
            return Err(Error::not_a_file(desc.path()));
        }
        self.materialize(desc).await?;

        let current = buffer(desc)?.len() as u64;
        let end = offset
            .checked_add(data.len() as u64)
            .ok_or(Error::OutOfRange { offset, len: current })?;
        if end > current {
            self.check_capacity(end)?;
            self.persist_size(desc, end).await?;
        }

        let start = offset as usize;
        let end = end as usize;
        let content = buffer(desc)?;
        if end > content.len() {
            content.resize(end, 0);
        }
        content[start..end].copy_from_slice(data);
        desc.mark_dirty();
        Ok(data.len())
    }

    /// Set the file length to `size`, zero-filling on growth
    pub async fn truncate(&mut self, desc: &mut Descriptor, size: u64) -> Result<()> {
        if desc.is_dir() {
            return Err(Error::not_a_file(desc.path()));
        }
        self.materialize(desc).await?;

        let current = buffer(desc)?.len() as u64;
        if current == size && desc.size() == size {
            return Ok(());
        }
        self.check_capacity(size)?;
        self.persist_size(desc, size).await?;
        buffer(desc)?.resize(size as usize, 0);
        desc.mark_dirty();
        Ok(())
    }

    /// Reject file sizes whose encoded chain could never be fetched again.
    /// Checked before anything is persisted or allocated.
    fn check_capacity(&self, size: u64) -> Result<()> {
        let encoded = size.div_ceil(3).saturating_mul(4);
        let count = encoded.div_ceil(self.chains.chunk_size() as u64);
        let limit = self.config().max_fetch_chunks;
        if count > limit as u64 {
            return Err(Error::TooLarge {
                count: usize::try_from(count).unwrap_or(usize::MAX),
                limit,
            });
        }
        Ok(())
    }

    /// Record a new size in the parent listing, leaving the descriptor
    /// unchanged if that fails
    async fn persist_size(&mut self, desc: &mut Descriptor, size: u64) -> Result<()> {
        let previous = desc.size();
        desc.record_mut().size = size;
        if let Err(e) = self.persist(desc.record()).await {
            desc.record_mut().size = previous;
            return Err(e);
        }
        Ok(())
    }
}

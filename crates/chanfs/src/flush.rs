// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use crate::content::encode_payload;
use crate::descriptor::Descriptor;
use crate::error::Result;
use crate::namespace::Namespace;
use diagnostics::*;

impl Namespace {
    /// Persist a dirty descriptor's content.
    ///
    /// Content that still fits the chain's valid records is edited in place;
    /// anything larger goes to a freshly allocated chain and the old one is
    /// abandoned. Either way the descriptor's metadata is recorded in its
    /// parent (or the root slot) whenever it changes. On failure the
    /// descriptor keeps its previous metadata and stays dirty.
    pub async fn flush(&mut self, desc: &mut Descriptor) -> Result<()> {
        if !desc.is_dirty() {
            return Ok(());
        }

        let payload = encode_payload(desc)?;
        let needed = self.chains.chunks_needed(&payload);
        let path = desc.path().to_string();

        if needed > desc.chunk_count() {
            let (chain, count) = self.chains.allocate(&self.stream, &path, &payload).await?;
            let previous = desc.record().clone();
            {
                let record = desc.record_mut();
                record.chain = chain;
                record.chunk_count = count;
                record.chunk_capacity = count;
            }
            if let Err(e) = self.persist(desc.record()).await {
                *desc.record_mut() = previous;
                return Err(e);
            }

            let abandoned = previous.chain.anchor.to_string();
            debug!(
                "flushed {path} to new chain of {count} chunks, chain {abandoned} abandoned",
                path: path,
                count: count,
                abandoned: abandoned
            );
        } else {
            let written = self.chains.rewrite(desc.chain(), &payload).await?;
            if written != desc.chunk_count() {
                let previous = desc.chunk_count();
                desc.record_mut().chunk_count = written;
                if let Err(e) = self.persist(desc.record()).await {
                    desc.record_mut().chunk_count = previous;
                    return Err(e);
                }
            }
            debug!("flushed {path} in place, {written} chunks", path: path, written: written);
        }

        desc.mark_clean();
        self.cache.invalidate();
        Ok(())
    }
}

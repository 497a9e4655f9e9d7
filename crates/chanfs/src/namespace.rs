// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use crate::cache::DescriptorCache;
use crate::chain::ChainStore;
use crate::config::Config;
use crate::descriptor::{Descriptor, DescriptorRecord};
use crate::error::{Error, Result};
use crate::listing::Listing;
use crate::path;
use crate::store::{RecordStore, StreamId};
use diagnostics::*;
use std::sync::Arc;

/// One mounted namespace: the context every operation runs against.
///
/// Holds the backing store session, the stream that carries the tree, the
/// configuration and the descriptor cache. Operations that change the tree
/// take `&mut self`, so at most one mutation is in flight at a time; the
/// cache is shared separately with the notification transport through
/// [`Namespace::cache`].
pub struct Namespace {
    pub(crate) chains: ChainStore,
    pub(crate) stream: StreamId,
    pub(crate) cache: Arc<DescriptorCache>,
    config: Config,
}

impl Namespace {
    /// Open the namespace carried by `stream`, creating an empty root when
    /// the stream has no usable root metadata yet
    pub async fn open(
        store: Arc<dyn RecordStore>,
        stream: StreamId,
        config: Config,
    ) -> Result<Self> {
        init_diagnostics();
        config.validate()?;
        let ns = Self {
            chains: ChainStore::new(store, &config),
            stream,
            cache: Arc::new(DescriptorCache::new(config.cache_capacity()?)),
            config,
        };

        let stream_id = ns.stream.to_string();
        match ns.resolve_root().await {
            Ok(_) => {
                info!("opened namespace on stream {stream_id}", stream_id: stream_id);
            }
            Err(Error::SerializationFailure(reason)) => {
                info!(
                    "initializing namespace on stream {stream_id}: {reason}",
                    stream_id: stream_id,
                    reason: reason
                );
                _ = ns.initialize().await?;
            }
            Err(e) => return Err(e),
        }
        Ok(ns)
    }

    /// Write an empty root directory and record it in the metadata slot
    async fn initialize(&self) -> Result<Descriptor> {
        let payload = Listing::default().to_json()?;
        let (chain, count) = self
            .chains
            .allocate(&self.stream, path::ROOT, &payload)
            .await?;
        let record = DescriptorRecord::root(chain, count);
        self.write_root(&record).await?;
        Ok(record.into())
    }

    pub(crate) async fn write_root(&self, record: &DescriptorRecord) -> Result<()> {
        let text = serde_json::to_string(record)?;
        self.chains
            .store()
            .write_metadata(&self.stream, &text)
            .await?;
        self.cache.invalidate();
        Ok(())
    }

    pub fn stream(&self) -> &StreamId {
        &self.stream
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Handle for the notification transport. The transport calls
    /// `invalidate()` on it whenever the stream changes.
    pub fn cache(&self) -> Arc<DescriptorCache> {
        self.cache.clone()
    }

    /// Purge the descriptor cache
    pub fn invalidate(&self) {
        self.cache.invalidate();
    }
}

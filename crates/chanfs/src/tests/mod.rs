// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

mod cache;

use crate::config::Config;
use crate::error::Result;
use crate::memory::MemoryStore;
use crate::namespace::Namespace;
use crate::store::StreamId;
use std::sync::Arc;

pub(crate) const STREAM: &str = "general";

/// Fresh namespace over an empty in-memory store
pub(crate) async fn new_namespace() -> (MemoryStore, Namespace) {
    let store = MemoryStore::new();
    let ns = open_namespace(&store).await;
    (store, ns)
}

pub(crate) async fn open_namespace(store: &MemoryStore) -> Namespace {
    open_with_config(store, Config::default()).await
}

pub(crate) async fn open_with_config(store: &MemoryStore, config: Config) -> Namespace {
    Namespace::open(Arc::new(store.clone()), StreamId::new(STREAM), config)
        .await
        .unwrap()
}

/// Create (or open) a file, replace its content and flush it
pub(crate) async fn write_file(ns: &mut Namespace, path: &str, data: &[u8]) {
    let mut desc = ns.create_file(path).await.unwrap();
    ns.truncate(&mut desc, 0).await.unwrap();
    _ = ns.write(&mut desc, data, 0).await.unwrap();
    ns.flush(&mut desc).await.unwrap();
}

/// Whole content of the file at `path`, resolved from scratch
pub(crate) async fn read_file(ns: &Namespace, path: &str) -> Result<Vec<u8>> {
    let mut desc = ns.resolve(path).await?;
    ns.read(&mut desc, 0, usize::MAX).await
}

// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! chanfs - a file namespace stored in a chat channel's message history
//!
//! The channel is used as an append-only block store: file and directory
//! content is split into record chains, the root descriptor lives in the
//! channel's topic, and every other descriptor lives in its parent's listing.
//!
//! Set CHANFS_LOG to control logging:
//! - CHANFS_LOG=off (default) - silent
//! - CHANFS_LOG=info - namespace changes
//! - CHANFS_LOG=debug - chain allocation, flushes, cache purges

/// Backing store contract
pub mod store;

/// In-memory store for tests and local use
pub mod memory;

/// Record chains
pub mod chain;

/// Descriptors and their stored form
pub mod descriptor;
pub mod listing;

// Namespace context and the operations on it
pub mod namespace;
mod content;
mod flush;
mod tree;

pub mod cache;
pub mod config;
pub mod error;
pub mod metadata;
pub mod path;

pub use cache::{CacheStats, DescriptorCache};
pub use chain::{ChainHandle, ChainStore};
pub use config::Config;
pub use descriptor::{Descriptor, DescriptorRecord};
pub use error::{Error, Result};
pub use listing::Listing;
pub use memory::MemoryStore;
pub use metadata::{EntryKind, NodeMetadata};
pub use namespace::Namespace;
pub use store::{Record, RecordId, RecordStore, StreamId};

#[cfg(test)]
mod tests;

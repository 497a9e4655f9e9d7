// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Tunables for a mounted namespace.
//!
//! Defaults match the limits of the hosted chat service: a record holds at most
//! [`RECORD_LIMIT`] bytes, one of which is the data marker.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;

/// Largest record the backing store accepts
pub const RECORD_LIMIT: usize = 2000;

/// Payload bytes per data record (record limit minus the marker)
pub const CHUNK_SIZE: usize = RECORD_LIMIT - 1;

/// Ceiling on chunks fetched for one chain (about 200KB)
pub const MAX_FETCH_CHUNKS: usize = 100;

pub const DEFAULT_CACHE_CAPACITY: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Payload bytes stored in each data record
    pub chunk_size: usize,

    /// Maximum number of data records a single fetch may request
    pub max_fetch_chunks: usize,

    /// Entries held by the descriptor cache
    pub cache_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            chunk_size: CHUNK_SIZE,
            max_fetch_chunks: MAX_FETCH_CHUNKS,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

impl Config {
    /// Parse a YAML document; missing keys take their defaults
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let config: Config = serde_yaml_ng::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::config("chunk_size must be positive"));
        }
        if self.chunk_size + 1 > RECORD_LIMIT {
            return Err(Error::config(format!(
                "chunk_size {} plus marker exceeds the {} byte record limit",
                self.chunk_size, RECORD_LIMIT
            )));
        }
        if self.max_fetch_chunks == 0 {
            return Err(Error::config("max_fetch_chunks must be positive"));
        }
        _ = self.cache_capacity()?;
        Ok(())
    }

    pub fn cache_capacity(&self) -> Result<NonZeroUsize> {
        NonZeroUsize::new(self.cache_capacity)
            .ok_or_else(|| Error::config("cache_capacity must be positive"))
    }
}

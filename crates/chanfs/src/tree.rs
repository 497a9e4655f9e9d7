// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Directory tree navigation and structural changes.
//!
//! Every directory's listing lives in its own chain, so a walk from the root
//! fetches one chain per path segment. Structural changes rewrite the parent
//! listing and flush it; flushing may move the parent to a new chain, which
//! in turn is recorded in the grandparent, up to the root metadata slot.

use crate::descriptor::{Descriptor, DescriptorRecord};
use crate::error::{Error, Result};
use crate::listing::Listing;
use crate::namespace::Namespace;
use crate::path;
use diagnostics::*;
use std::future::Future;
use std::pin::Pin;

impl Namespace {
    /// Load the root descriptor from the stream metadata slot
    pub async fn resolve_root(&self) -> Result<Descriptor> {
        let text = self
            .chains
            .store()
            .read_metadata(&self.stream)
            .await?
            .ok_or_else(|| Error::serialization("stream has no root metadata"))?;
        let mut record: DescriptorRecord = serde_json::from_str(&text)?;
        if !record.is_root || !record.is_dir {
            return Err(Error::serialization("metadata is not a root directory"));
        }
        record.path = path::ROOT.to_string();
        record.name.clear();
        Ok(record.into())
    }

    /// Walk from the root to `path`, one listing per segment
    pub async fn resolve(&self, path: &str) -> Result<Descriptor> {
        let path = path::normalize(path)?;
        let mut current = self.resolve_root().await?;

        for name in path::segments(&path) {
            if !current.is_dir() {
                return Err(Error::not_a_directory(current.path()));
            }
            let listing = self.load_listing(&mut current).await?;
            let child = listing
                .find_name(name)
                .cloned()
                .ok_or_else(|| Error::not_found(&path))?;
            current = Descriptor::from(child);
        }
        Ok(current)
    }

    /// `resolve` through the descriptor cache
    pub async fn lookup(&self, path: &str) -> Result<Descriptor> {
        let path = path::normalize(path)?;
        let generation = self.cache.generation();
        if let Some(desc) = self.cache.lookup(&path) {
            return Ok(desc);
        }
        let desc = self.resolve(&path).await?;
        if !self.cache.insert(&path, &desc, generation) {
            debug!("not caching {path}, purged while resolving", path: path);
        }
        Ok(desc)
    }

    /// Child records of the directory at `path`
    pub async fn list(&self, path: &str) -> Result<Vec<DescriptorRecord>> {
        let mut dir = self.lookup(path).await?;
        if !dir.is_dir() {
            return Err(Error::not_a_directory(dir.path()));
        }
        Ok(self.load_listing(&mut dir).await?.entries().to_vec())
    }

    pub(crate) async fn load_listing(&self, dir: &mut Descriptor) -> Result<Listing> {
        self.materialize(dir).await?;
        let text = std::str::from_utf8(dir.content().unwrap_or_default())?;
        Listing::parse(text)
    }

    /// Resolve a directory and load its listing
    async fn resolve_dir(&self, path: &str) -> Result<(Descriptor, Listing)> {
        let mut dir = self.resolve(path).await?;
        if !dir.is_dir() {
            return Err(Error::not_a_directory(dir.path()));
        }
        let listing = self.load_listing(&mut dir).await?;
        Ok((dir, listing))
    }

    /// Replace a directory's content with `listing` and flush it
    async fn store_listing(&mut self, dir: &mut Descriptor, listing: &Listing) -> Result<()> {
        dir.set_content(listing.to_json()?.into_bytes());
        dir.mark_dirty();
        self.flush(dir).await
    }

    /// Add `record` to the listing of the directory at `parent`
    pub async fn create(&mut self, parent: &str, record: DescriptorRecord) -> Result<()> {
        let (mut dir, mut listing) = self.resolve_dir(parent).await?;
        if listing.find_name(&record.name).is_some() {
            return Err(Error::already_exists(&record.path));
        }
        listing.push(record);
        self.store_listing(&mut dir, &listing).await
    }

    /// Open-or-create a regular file
    pub async fn create_file(&mut self, path: &str) -> Result<Descriptor> {
        let path = path::normalize(path)?;
        if path::is_root(&path) {
            return Err(Error::already_exists(&path));
        }
        let (mut parent, mut listing) = self.resolve_dir(path::dirname(&path)).await?;
        if let Some(existing) = listing.find_name(path::basename(&path)) {
            if existing.is_dir {
                return Err(Error::already_exists(&path));
            }
            return Ok(existing.clone().into());
        }

        let (chain, count) = self.chains.allocate(&self.stream, &path, "").await?;
        let record = DescriptorRecord::file(&path, chain, count);
        listing.push(record.clone());
        self.store_listing(&mut parent, &listing).await?;

        info!("created file {path}", path: path);
        Ok(record.into())
    }

    pub async fn mkdir(&mut self, path: &str) -> Result<Descriptor> {
        let path = path::normalize(path)?;
        if path::is_root(&path) {
            return Err(Error::already_exists(&path));
        }
        let (mut parent, mut listing) = self.resolve_dir(path::dirname(&path)).await?;
        if listing.find_name(path::basename(&path)).is_some() {
            return Err(Error::already_exists(&path));
        }

        let empty = Listing::default().to_json()?;
        let (chain, count) = self.chains.allocate(&self.stream, &path, &empty).await?;
        let record = DescriptorRecord::directory(&path, chain, count);
        listing.push(record.clone());
        self.store_listing(&mut parent, &listing).await?;

        info!("created directory {path}", path: path);
        Ok(record.into())
    }

    /// Drop the entry at `path` from its parent. The node's chain is left
    /// in the stream.
    pub async fn remove(&mut self, path: &str) -> Result<DescriptorRecord> {
        let path = path::normalize(path)?;
        if path::is_root(&path) {
            return Err(Error::invalid_path(&path));
        }
        let (mut parent, mut listing) = self.resolve_dir(path::dirname(&path)).await?;
        let removed = listing
            .remove_path(&path)
            .ok_or_else(|| Error::not_found(&path))?;
        self.store_listing(&mut parent, &listing).await?;

        let anchor = removed.chain.anchor.to_string();
        debug!("removed {path}, chain {anchor} abandoned", path: path, anchor: anchor);
        Ok(removed)
    }

    /// Remove a regular file
    pub async fn unlink(&mut self, path: &str) -> Result<()> {
        let target = self.resolve(path).await?;
        if target.is_dir() {
            return Err(Error::not_a_file(target.path()));
        }
        _ = self.remove(target.path()).await?;
        Ok(())
    }

    /// Remove an empty directory
    pub async fn rmdir(&mut self, path: &str) -> Result<()> {
        let mut target = self.resolve(path).await?;
        if !target.is_dir() {
            return Err(Error::not_a_directory(target.path()));
        }
        if target.is_root() {
            return Err(Error::invalid_path(target.path()));
        }
        if !self.load_listing(&mut target).await?.is_empty() {
            return Err(Error::directory_not_empty(target.path()));
        }
        _ = self.remove(target.path()).await?;
        Ok(())
    }

    /// Move the entry at `old` to `new`, replacing anything already at `new`.
    ///
    /// A moved directory keeps its chain; every descendant's stored path is
    /// rewritten under the new prefix, at any depth.
    pub async fn rename(&mut self, old: &str, new: &str) -> Result<()> {
        let old = path::normalize(old)?;
        let new = path::normalize(new)?;
        if path::is_root(&old) {
            return Err(Error::invalid_path(&old));
        }
        if path::is_root(&new) {
            return Err(Error::invalid_path(&new));
        }
        if old == new {
            return Ok(());
        }
        // Replacing an ancestor would drop the listing holding the source
        if path::is_within(&old, &new) {
            return Err(Error::invalid_path(&new));
        }

        let old_parent = path::dirname(&old).to_string();
        let new_parent = path::dirname(&new).to_string();

        let (mut parent, mut listing) = self.resolve_dir(&old_parent).await?;
        let mut moved = listing
            .find_path(&old)
            .cloned()
            .ok_or_else(|| Error::not_found(&old))?;
        if moved.is_dir && path::is_within(&new, &old) {
            return Err(Error::invalid_path(&new));
        }
        moved.set_path(new.clone());

        if old_parent == new_parent {
            if listing.remove_path(&new).is_some() {
                debug!("rename replaces existing {new}", new: new);
            }
            _ = listing.remove_path(&old);
            listing.push(moved.clone());
            self.store_listing(&mut parent, &listing).await?;
        } else {
            // Insert at the destination before removing the source, so a
            // failure in between leaves the node reachable
            let (mut dest, mut dest_listing) = self.resolve_dir(&new_parent).await?;
            if dest_listing.remove_path(&new).is_some() {
                debug!("rename replaces existing {new}", new: new);
            }
            dest_listing.push(moved.clone());
            self.store_listing(&mut dest, &dest_listing).await?;

            // The source listing may have changed while storing the
            // destination, so load it again
            let (mut source, mut source_listing) = self.resolve_dir(&old_parent).await?;
            _ = source_listing.remove_path(&old);
            self.store_listing(&mut source, &source_listing).await?;
        }

        if moved.is_dir {
            self.rebase_descendants(&old, &new).await?;
        }

        info!("renamed {old} to {new}", old: old, new: new);
        Ok(())
    }

    /// Rewrite the `old` prefix of every path below the directory now at `new`
    async fn rebase_descendants(&mut self, old: &str, new: &str) -> Result<()> {
        let mut pending = vec![new.to_string()];
        while let Some(dir_path) = pending.pop() {
            let (mut dir, mut listing) = self.resolve_dir(&dir_path).await?;
            let changed = listing.rebase_paths(old, new);
            pending.extend(
                listing
                    .entries()
                    .iter()
                    .filter(|e| e.is_dir)
                    .map(|e| e.path.clone()),
            );
            if changed > 0 {
                debug!(
                    "rebased {changed} entries under {dir_path}",
                    changed: changed,
                    dir_path: dir_path
                );
                self.store_listing(&mut dir, &listing).await?;
            }
        }
        Ok(())
    }

    /// Record `record` where it is persisted: the metadata slot for the root,
    /// otherwise the entry with the same path in the parent's listing.
    pub fn persist<'a>(
        &'a mut self,
        record: &'a DescriptorRecord,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            if record.is_root {
                return self.write_root(record).await;
            }
            let (mut parent, mut listing) =
                self.resolve_dir(path::dirname(&record.path)).await?;
            if !listing.replace(record) {
                return Err(Error::not_found(&record.path));
            }
            self.store_listing(&mut parent, &listing).await
        })
    }
}

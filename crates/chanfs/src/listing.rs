// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use crate::descriptor::DescriptorRecord;
use crate::error::Result;
use crate::path;
use serde::{Deserialize, Serialize};

/// Contents of a directory: the full records of its direct children, in
/// insertion order. Grandchildren live in each child's own chain.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Listing {
    entries: Vec<DescriptorRecord>,
}

impl Listing {
    pub fn parse(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn entries(&self) -> &[DescriptorRecord] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn find_name(&self, name: &str) -> Option<&DescriptorRecord> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn find_path(&self, path: &str) -> Option<&DescriptorRecord> {
        self.entries.iter().find(|e| e.path == path)
    }

    pub fn push(&mut self, record: DescriptorRecord) {
        self.entries.push(record);
    }

    pub fn remove_path(&mut self, path: &str) -> Option<DescriptorRecord> {
        let pos = self.entries.iter().position(|e| e.path == path)?;
        Some(self.entries.remove(pos))
    }

    /// Replace the entry with the same path; false if there is none
    pub fn replace(&mut self, record: &DescriptorRecord) -> bool {
        match self.entries.iter_mut().find(|e| e.path == record.path) {
            Some(entry) => {
                *entry = record.clone();
                true
            }
            None => false,
        }
    }

    /// Rewrite the `old` prefix of every entry path to `new`.
    /// Returns the number of entries changed.
    pub fn rebase_paths(&mut self, old: &str, new: &str) -> usize {
        let mut changed = 0;
        for entry in &mut self.entries {
            if let Some(rebased) = path::rebase(&entry.path, old, new) {
                if rebased != entry.path {
                    entry.set_path(rebased);
                    changed += 1;
                }
            }
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::ChainHandle;
    use crate::error::Error;
    use crate::store::{RecordId, StreamId};

    fn record(path: &str) -> DescriptorRecord {
        DescriptorRecord::file(
            path,
            ChainHandle {
                stream: StreamId::new("s"),
                anchor: RecordId::new(path),
            },
            1,
        )
    }

    #[test]
    fn test_empty_forms() {
        assert!(Listing::parse("[]").unwrap().is_empty());
        assert!(Listing::parse("").unwrap().is_empty());
        assert_eq!(Listing::default().to_json().unwrap(), "[]");
    }

    #[test]
    fn test_malformed() {
        assert!(matches!(
            Listing::parse("[{\"path\":"),
            Err(Error::SerializationFailure(_))
        ));
    }

    #[test]
    fn test_edit_operations() {
        let mut listing = Listing::default();
        listing.push(record("/d/a"));
        listing.push(record("/d/b"));

        let text = listing.to_json().unwrap();
        let mut listing = Listing::parse(&text).unwrap();
        assert_eq!(listing.len(), 2);
        assert_eq!(listing.find_name("b").unwrap().path, "/d/b");

        let mut grown = record("/d/a");
        grown.size = 99;
        assert!(listing.replace(&grown));
        assert_eq!(listing.find_path("/d/a").unwrap().size, 99);
        assert!(!listing.replace(&record("/d/zzz")));

        assert!(listing.remove_path("/d/b").is_some());
        assert!(listing.remove_path("/d/b").is_none());
        assert_eq!(listing.len(), 1);
    }

    #[test]
    fn test_rebase_paths() {
        let mut listing = Listing::default();
        listing.push(record("/old/a"));
        listing.push(record("/old/sub"));
        assert_eq!(listing.rebase_paths("/old", "/new"), 2);
        assert!(listing.find_path("/new/a").is_some());
        assert_eq!(listing.find_path("/new/sub").unwrap().name, "sub");
        assert_eq!(listing.rebase_paths("/old", "/new"), 0);
    }
}

//! Duplicate classification: partition the flat bookmark list into classes
//! that share an identity key.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::bookmarks::FlatBookmark;

/// Identity rule for duplicate detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ScanMode {
    /// URL only.
    #[default]
    Url,
    /// URL + title.
    Strict,
}

impl ScanMode {
    pub fn name(&self) -> &'static str {
        match self {
            ScanMode::Url => "url",
            ScanMode::Strict => "strict",
        }
    }
}

impl fmt::Display for ScanMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Identity key of a bookmark under the given mode. Verbatim comparison; a
/// missing title and an empty title both key as the empty string.
pub fn identity_key(bookmark: &FlatBookmark, mode: ScanMode) -> String {
    match mode {
        ScanMode::Url => bookmark.url.clone(),
        ScanMode::Strict => format!("{}|{}", bookmark.url, bookmark.title),
    }
}

/// Bookmarks sharing one identity key, in flattening order. Always holds at
/// least two members; `members[0]` is the canonical one.
#[derive(Debug, Clone)]
pub struct DuplicateClass {
    pub key: String,
    pub members: Vec<FlatBookmark>,
}

impl DuplicateClass {
    pub fn canonical(&self) -> &FlatBookmark {
        &self.members[0]
    }

    /// Members after the canonical one, the ones grouping moves and deletion
    /// removes.
    pub fn redundant(&self) -> &[FlatBookmark] {
        &self.members[1..]
    }
}

/// Classes keyed by identity, in first-seen order. Transient: valid only for
/// the snapshot it was computed from, recomputed after every mutation pass.
#[derive(Debug, Clone, Default)]
pub struct DuplicateIndex {
    classes: Vec<DuplicateClass>,
}

impl DuplicateIndex {
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn classes(&self) -> &[DuplicateClass] {
        &self.classes
    }

    pub fn get(&self, key: &str) -> Option<&DuplicateClass> {
        self.classes.iter().find(|c| c.key == key)
    }

    /// Total bookmarks involved in duplication (members of all classes).
    pub fn total_duplicates(&self) -> usize {
        self.classes.iter().map(|c| c.members.len()).sum()
    }

    /// Items a delete pass would remove (everything but the canonicals).
    pub fn redundant_count(&self) -> usize {
        self.classes.iter().map(|c| c.members.len() - 1).sum()
    }
}

/// Bucket the flat list by identity key and keep only buckets with two or
/// more members. Single pass; bucket order is first-seen key order, member
/// order inside a bucket is flattening order.
pub fn find_duplicates(flat: &[FlatBookmark], mode: ScanMode) -> DuplicateIndex {
    let mut buckets: Vec<DuplicateClass> = Vec::new();
    let mut by_key: HashMap<String, usize> = HashMap::new();

    for bookmark in flat {
        let key = identity_key(bookmark, mode);
        match by_key.get(&key) {
            Some(&idx) => buckets[idx].members.push(bookmark.clone()),
            None => {
                by_key.insert(key.clone(), buckets.len());
                buckets.push(DuplicateClass { key, members: vec![bookmark.clone()] });
            }
        }
    }

    buckets.retain(|c| c.members.len() >= 2);
    DuplicateIndex { classes: buckets }
}

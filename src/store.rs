//! The external bookmark store: the single source of truth for the tree.
//!
//! The engine never holds an authoritative copy; every snapshot it takes can
//! go stale the moment the store is mutated, so it reloads through this trait
//! after every mutation pass.

use std::collections::HashSet;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::bookmarks::{BookmarkNode, NodeKind};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse bookmark data: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("unexpected bookmark file format: {0}")]
    Format(String),

    #[error("no node with id {0}")]
    NodeNotFound(String),

    #[error("cannot move {id}: {reason}")]
    InvalidMove { id: String, reason: String },

    #[error("cannot remove non-empty folder {0}")]
    NotEmpty(String),
}

/// Async store contract. Mutations address nodes by stable id, never by
/// position, so a stale caller gets an item-not-found error rather than
/// corrupting unrelated nodes.
#[async_trait]
pub trait BookmarkStore: Send + Sync {
    /// Read the full tree. One or more virtual roots.
    async fn get_tree(&self) -> Result<Vec<BookmarkNode>, StoreError>;

    /// Reparent a node, appending it to the destination folder's children.
    async fn move_node(&self, id: &str, new_parent_id: &str) -> Result<(), StoreError>;

    /// Remove a bookmark or an empty folder.
    async fn remove(&self, id: &str) -> Result<(), StoreError>;
}

/// In-memory store used by the test suites. Supports per-id failure
/// injection so batch error isolation can be exercised.
pub struct MemoryStore {
    inner: Mutex<MemoryStoreInner>,
}

struct MemoryStoreInner {
    roots: Vec<BookmarkNode>,
    failing_ids: HashSet<String>,
}

impl MemoryStore {
    pub fn new(roots: Vec<BookmarkNode>) -> Self {
        Self {
            inner: Mutex::new(MemoryStoreInner { roots, failing_ids: HashSet::new() }),
        }
    }

    /// Make every future mutation touching `id` fail, as if the store
    /// rejected it.
    pub async fn fail_mutations_on(&self, id: &str) {
        self.inner.lock().await.failing_ids.insert(id.to_string());
    }
}

#[async_trait]
impl BookmarkStore for MemoryStore {
    async fn get_tree(&self) -> Result<Vec<BookmarkNode>, StoreError> {
        Ok(self.inner.lock().await.roots.clone())
    }

    async fn move_node(&self, id: &str, new_parent_id: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        if inner.failing_ids.contains(id) {
            return Err(StoreError::InvalidMove {
                id: id.to_string(),
                reason: "store rejected the request".to_string(),
            });
        }
        // Mutate a copy and commit only on success, so a refused move never
        // drops the node. A destination inside the moved subtree vanishes
        // with the detach and is reported as invalid.
        let mut trees = inner.roots.clone();
        let mut node = detach_node(&mut trees, id)
            .ok_or_else(|| StoreError::NodeNotFound(id.to_string()))?;
        node.parent_id = Some(new_parent_id.to_string());
        let dest = find_node_mut(&mut trees, new_parent_id).ok_or_else(|| {
            StoreError::InvalidMove {
                id: id.to_string(),
                reason: format!("destination {new_parent_id} not found"),
            }
        })?;
        let children = dest.children_mut().ok_or_else(|| StoreError::InvalidMove {
            id: id.to_string(),
            reason: format!("destination {new_parent_id} is not a folder"),
        })?;
        children.push(node);
        inner.roots = trees;
        Ok(())
    }

    async fn remove(&self, id: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        if inner.failing_ids.contains(id) {
            return Err(StoreError::NodeNotFound(id.to_string()));
        }
        // Refuse non-empty folders before touching the tree, mirroring
        // stores without recursive removal.
        match find_node_mut(&mut inner.roots, id) {
            None => return Err(StoreError::NodeNotFound(id.to_string())),
            Some(node) => {
                if let NodeKind::Folder { children } = &node.kind {
                    if !children.is_empty() {
                        return Err(StoreError::NotEmpty(id.to_string()));
                    }
                }
            }
        }
        detach_node(&mut inner.roots, id)
            .ok_or_else(|| StoreError::NodeNotFound(id.to_string()))?;
        Ok(())
    }
}

/// Find and detach the node with `id` anywhere under `roots`.
pub(crate) fn detach_node(roots: &mut [BookmarkNode], id: &str) -> Option<BookmarkNode> {
    for root in roots.iter_mut() {
        if let Some(found) = detach_from(root, id) {
            return Some(found);
        }
    }
    None
}

fn detach_from(node: &mut BookmarkNode, id: &str) -> Option<BookmarkNode> {
    let children = node.children_mut()?;
    if let Some(pos) = children.iter().position(|c| c.id == id) {
        return Some(children.remove(pos));
    }
    for child in children.iter_mut() {
        if let Some(found) = detach_from(child, id) {
            return Some(found);
        }
    }
    None
}

pub(crate) fn find_node_mut<'a>(
    roots: &'a mut [BookmarkNode],
    id: &str,
) -> Option<&'a mut BookmarkNode> {
    for root in roots.iter_mut() {
        if let Some(found) = find_in_mut(root, id) {
            return Some(found);
        }
    }
    None
}

fn find_in_mut<'a>(node: &'a mut BookmarkNode, id: &str) -> Option<&'a mut BookmarkNode> {
    if node.id == id {
        return Some(node);
    }
    match &mut node.kind {
        NodeKind::Folder { children } => {
            for child in children.iter_mut() {
                if let Some(found) = find_in_mut(child, id) {
                    return Some(found);
                }
            }
            None
        }
        NodeKind::Bookmark { .. } => None,
    }
}

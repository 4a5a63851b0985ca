use serde::{Deserialize, Serialize};

/// A node in the bookmark tree as returned by the store.
///
/// Whether a raw node is a folder or a bookmark is decided once, at ingestion:
/// a node with a URL is a bookmark leaf, everything else is a folder. Leaves
/// never carry children.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookmarkNode {
    pub id: String,
    /// Absent only for virtual roots.
    pub parent_id: Option<String>,
    pub title: String,
    /// Unix milliseconds, store-assigned. Display only, never identity.
    pub date_added: Option<i64>,
    pub kind: NodeKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum NodeKind {
    Folder { children: Vec<BookmarkNode> },
    Bookmark { url: String },
}

impl BookmarkNode {
    pub fn folder(id: &str, parent_id: Option<&str>, title: &str) -> Self {
        Self {
            id: id.to_string(),
            parent_id: parent_id.map(|s| s.to_string()),
            title: title.to_string(),
            date_added: None,
            kind: NodeKind::Folder { children: Vec::new() },
        }
    }

    pub fn bookmark(id: &str, parent_id: &str, title: &str, url: &str) -> Self {
        Self {
            id: id.to_string(),
            parent_id: Some(parent_id.to_string()),
            title: title.to_string(),
            date_added: None,
            kind: NodeKind::Bookmark { url: url.to_string() },
        }
    }

    pub fn is_folder(&self) -> bool {
        matches!(self.kind, NodeKind::Folder { .. })
    }

    pub fn url(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Bookmark { url } => Some(url),
            NodeKind::Folder { .. } => None,
        }
    }

    pub fn children(&self) -> &[BookmarkNode] {
        match &self.kind {
            NodeKind::Folder { children } => children,
            NodeKind::Bookmark { .. } => &[],
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<BookmarkNode>> {
        match &mut self.kind {
            NodeKind::Folder { children } => Some(children),
            NodeKind::Bookmark { .. } => None,
        }
    }
}

/// A bookmark leaf lifted out of the tree. One point-in-time snapshot entry;
/// stale the moment the store is mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatBookmark {
    pub id: String,
    pub parent_id: Option<String>,
    pub title: String,
    pub url: String,
    pub date_added: Option<i64>,
}

/// Flatten the bookmark tree(s) into the ordered list of leaves.
///
/// Depth-first pre-order: children in their stored order, folders recursed
/// into and never emitted. The output order is what makes the "first" member
/// of a duplicate class deterministic, so it must not be changed.
pub fn flatten(roots: &[BookmarkNode]) -> Vec<FlatBookmark> {
    let mut flat = Vec::new();
    for root in roots {
        flatten_into(root, &mut flat);
    }
    flat
}

fn flatten_into(node: &BookmarkNode, flat: &mut Vec<FlatBookmark>) {
    match &node.kind {
        NodeKind::Folder { children } => {
            for child in children {
                flatten_into(child, flat);
            }
        }
        NodeKind::Bookmark { url } => {
            flat.push(FlatBookmark {
                id: node.id.clone(),
                parent_id: node.parent_id.clone(),
                title: node.title.clone(),
                url: url.clone(),
                date_added: node.date_added,
            });
        }
    }
}

//! Chromium `Bookmarks` file store.
//!
//! Chromium keeps the bookmark tree in a JSON file with three virtual roots
//! under `roots` (`bookmark_bar`, `other`, `synced`). Timestamps are WebKit
//! epoch microseconds (since 1601-01-01); they are converted to Unix
//! milliseconds at ingestion and back on write.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::bookmarks::{BookmarkNode, NodeKind};
use crate::store::{detach_node, find_node_mut, BookmarkStore, StoreError};

/// Offset between the WebKit epoch (1601) and the Unix epoch (1970), in ms.
const WEBKIT_EPOCH_OFFSET_MS: i64 = 11_644_473_600_000;

#[derive(Debug)]
pub struct ChromiumFileStore {
    path: PathBuf,
    inner: Mutex<StoreState>,
}

#[derive(Debug)]
struct StoreState {
    /// Root key in the file (`bookmark_bar`, ...) paired with its parsed tree.
    roots: Vec<(String, BookmarkNode)>,
    backed_up: bool,
}

impl ChromiumFileStore {
    /// Open an existing Chromium bookmarks file.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let data = std::fs::read_to_string(path)?;
        let document: Value = serde_json::from_str(&data)?;
        let roots = parse_roots(&document)?;

        let leaf_count: usize = roots
            .iter()
            .map(|(_, r)| crate::bookmarks::flatten(std::slice::from_ref(r)).len())
            .sum();
        debug!("Opened {:?}: {} roots, {} bookmarks", path, roots.len(), leaf_count);

        Ok(Self {
            path: path.to_path_buf(),
            inner: Mutex::new(StoreState { roots, backed_up: false }),
        })
    }

    /// Locate the default Chrome/Chromium bookmarks file for this platform.
    pub fn detect_path() -> Result<PathBuf, StoreError> {
        let home = std::env::var("HOME")
            .map_err(|_| StoreError::Format("HOME is not set".to_string()))?;

        #[cfg(target_os = "macos")]
        let candidates = [format!(
            "{}/Library/Application Support/Google/Chrome/Default/Bookmarks",
            home
        )];

        #[cfg(not(target_os = "macos"))]
        let candidates = [
            format!("{}/.config/google-chrome/Default/Bookmarks", home),
            format!("{}/.config/chromium/Default/Bookmarks", home),
        ];

        for candidate in &candidates {
            let path = PathBuf::from(candidate);
            if path.exists() {
                debug!("Found bookmarks file at: {:?}", path);
                return Ok(path);
            }
        }

        Err(StoreError::Format(
            "no Chromium bookmarks file found; pass one with --file".to_string(),
        ))
    }

    fn write_locked(&self, state: &mut StoreState) -> Result<(), StoreError> {
        // Backup once per session before the first write.
        if !state.backed_up {
            let backup_path = self.path.with_extension("json.backup");
            std::fs::copy(&self.path, &backup_path)?;
            info!("💾 Backup created: {:?}", backup_path);
            state.backed_up = true;
        }

        let mut roots = serde_json::Map::new();
        for (key, root) in &state.roots {
            roots.insert(key.clone(), node_to_json(root));
        }
        let document = json!({ "roots": Value::Object(roots), "version": 1 });
        let data = serde_json::to_string_pretty(&document)?;
        std::fs::write(&self.path, data)?;
        Ok(())
    }
}

#[async_trait]
impl BookmarkStore for ChromiumFileStore {
    async fn get_tree(&self) -> Result<Vec<BookmarkNode>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner.roots.iter().map(|(_, r)| r.clone()).collect())
    }

    async fn move_node(&self, id: &str, new_parent_id: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        let mut trees: Vec<BookmarkNode> = inner.roots.iter().map(|(_, r)| r.clone()).collect();

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

        for ((_, slot), tree) in inner.roots.iter_mut().zip(trees) {
            *slot = tree;
        }
        self.write_locked(&mut inner)
    }

    async fn remove(&self, id: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        let mut trees: Vec<BookmarkNode> = inner.roots.iter().map(|(_, r)| r.clone()).collect();

        let node = detach_node(&mut trees, id)
            .ok_or_else(|| StoreError::NodeNotFound(id.to_string()))?;
        if let NodeKind::Folder { children } = &node.kind {
            if !children.is_empty() {
                return Err(StoreError::NotEmpty(id.to_string()));
            }
        }

        for ((_, slot), tree) in inner.roots.iter_mut().zip(trees) {
            *slot = tree;
        }
        self.write_locked(&mut inner)
    }
}

fn parse_roots(document: &Value) -> Result<Vec<(String, BookmarkNode)>, StoreError> {
    let roots = document
        .get("roots")
        .and_then(|v| v.as_object())
        .ok_or_else(|| StoreError::Format("missing \"roots\" object".to_string()))?;

    let mut parsed = Vec::new();
    for (key, value) in roots {
        // Chromium also stores metadata entries under roots; only objects
        // with an id are tree nodes.
        if value.get("id").is_some() {
            parsed.push((key.clone(), parse_node(value, None)));
        }
    }
    if parsed.is_empty() {
        return Err(StoreError::Format("no root folders found".to_string()));
    }
    Ok(parsed)
}

fn parse_node(value: &Value, parent_id: Option<&str>) -> BookmarkNode {
    let id = value
        .get("id")
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string();
    let title = value
        .get("name")
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string();
    let date_added = value.get("date_added").and_then(parse_webkit_time);

    // URL presence is authoritative: with a url the node is a leaf and any
    // children are dropped, without one it is a folder.
    let kind = match value.get("url").and_then(|v| v.as_str()) {
        Some(url) => NodeKind::Bookmark { url: url.to_string() },
        None => {
            let children = value
                .get("children")
                .and_then(|v| v.as_array())
                .map(|arr| arr.iter().map(|c| parse_node(c, Some(&id))).collect())
                .unwrap_or_default();
            NodeKind::Folder { children }
        }
    };

    BookmarkNode {
        id,
        parent_id: parent_id.map(|s| s.to_string()),
        title,
        date_added,
        kind,
    }
}

/// Chromium writes timestamps as decimal strings of WebKit microseconds;
/// tolerate plain numbers too.
fn parse_webkit_time(value: &Value) -> Option<i64> {
    let micros = match value {
        Value::String(s) => s.parse::<i64>().ok()?,
        Value::Number(n) => n.as_i64()?,
        _ => return None,
    };
    if micros == 0 {
        return None;
    }
    Some(micros / 1000 - WEBKIT_EPOCH_OFFSET_MS)
}

fn to_webkit_time(unix_ms: i64) -> String {
    ((unix_ms + WEBKIT_EPOCH_OFFSET_MS) * 1000).to_string()
}

fn node_to_json(node: &BookmarkNode) -> Value {
    let mut object = serde_json::Map::new();
    object.insert("id".to_string(), json!(node.id));
    object.insert("name".to_string(), json!(node.title));
    if let Some(ms) = node.date_added {
        object.insert("date_added".to_string(), json!(to_webkit_time(ms)));
    }
    match &node.kind {
        NodeKind::Bookmark { url } => {
            object.insert("type".to_string(), json!("url"));
            object.insert("url".to_string(), json!(url));
        }
        NodeKind::Folder { children } => {
            object.insert("type".to_string(), json!("folder"));
            object.insert(
                "children".to_string(),
                Value::Array(children.iter().map(node_to_json).collect()),
            );
        }
    }
    Value::Object(object)
}

//! End-to-end engine scenarios: scan, group, delete, and reconciliation
//! against in-memory and file-backed stores.

use async_trait::async_trait;

use bookmark_cleaner::{
    flatten, BookmarkNode, BookmarkStore, ChromiumFileStore, CleanerEngine, MemoryStore, ScanMode,
    StoreError,
};

/// Folder A holding {url: http://x.com, title: X1}, folder B holding
/// {url: http://x.com, title: X2}, plus one unique bookmark.
fn two_folder_tree() -> Vec<BookmarkNode> {
    let mut folder_a = BookmarkNode::folder("10", Some("1"), "A");
    folder_a
        .children_mut()
        .unwrap()
        .push(BookmarkNode::bookmark("11", "10", "X1", "http://x.com"));

    let mut folder_b = BookmarkNode::folder("20", Some("1"), "B");
    folder_b
        .children_mut()
        .unwrap()
        .push(BookmarkNode::bookmark("21", "20", "X2", "http://x.com"));

    let mut root = BookmarkNode::folder("1", None, "root");
    root.children_mut().unwrap().push(folder_a);
    root.children_mut().unwrap().push(folder_b);
    root.children_mut()
        .unwrap()
        .push(BookmarkNode::bookmark("30", "1", "Y", "http://y.com"));
    vec![root]
}

#[tokio::test]
async fn scan_url_mode_one_class_canonical_from_first_folder() {
    let mut engine = CleanerEngine::new(MemoryStore::new(two_folder_tree()));
    let index = engine.scan(ScanMode::Url).await.unwrap();

    assert_eq!(index.len(), 1);
    let class = &index.classes()[0];
    assert_eq!(class.members.len(), 2);
    // A precedes B in traversal, so A's child is canonical.
    assert_eq!(class.canonical().id, "11");
    assert_eq!(class.canonical().title, "X1");
}

#[tokio::test]
async fn scan_strict_mode_differing_titles_no_class() {
    let mut engine = CleanerEngine::new(MemoryStore::new(two_folder_tree()));
    let index = engine.scan(ScanMode::Strict).await.unwrap();
    assert!(index.is_empty());
}

#[tokio::test]
async fn rescan_of_unchanged_tree_is_identical() {
    let mut engine = CleanerEngine::new(MemoryStore::new(two_folder_tree()));
    let first: Vec<(String, Vec<String>)> = engine
        .scan(ScanMode::Url)
        .await
        .unwrap()
        .classes()
        .iter()
        .map(|c| (c.key.clone(), c.members.iter().map(|m| m.id.clone()).collect()))
        .collect();

    let second: Vec<(String, Vec<String>)> = engine
        .scan(ScanMode::Url)
        .await
        .unwrap()
        .classes()
        .iter()
        .map(|c| (c.key.clone(), c.members.iter().map(|m| m.id.clone()).collect()))
        .collect();

    assert_eq!(first, second);
}

#[tokio::test]
async fn delete_returns_success_count_and_empties_index() {
    let mut engine = CleanerEngine::new(MemoryStore::new(two_folder_tree()));
    engine.scan(ScanMode::Url).await.unwrap();

    let summary = engine.delete_duplicates().await.unwrap();
    assert_eq!(summary.succeeded, 1);

    // A fresh scan of the reconciled store reports nothing.
    let index = engine.scan(ScanMode::Url).await.unwrap();
    assert!(index.is_empty());

    // Canonical and the unique bookmark survive.
    let ids: Vec<&str> = engine.bookmarks().iter().map(|b| b.id.as_str()).collect();
    assert_eq!(ids, vec!["11", "30"]);
}

#[tokio::test]
async fn group_relocates_into_canonical_folder_class_survives() {
    let mut engine = CleanerEngine::new(MemoryStore::new(two_folder_tree()));
    engine.scan(ScanMode::Url).await.unwrap();

    let summary = engine.group_duplicates().await.unwrap();
    assert_eq!(summary.succeeded, 1);
    assert!(summary.failures.is_empty());

    // The class still exists, both members parented under A.
    let index = engine.scan(ScanMode::Url).await.unwrap();
    assert_eq!(index.len(), 1);
    let class = &index.classes()[0];
    assert_eq!(class.members.len(), 2);
    assert!(class
        .members
        .iter()
        .all(|m| m.parent_id.as_deref() == Some("10")));
}

#[tokio::test]
async fn one_failing_member_does_not_stop_the_batch() {
    let mut root = BookmarkNode::folder("1", None, "root");
    {
        let children = root.children_mut().unwrap();
        children.push(BookmarkNode::bookmark("2", "1", "a", "http://x.com"));
        children.push(BookmarkNode::bookmark("3", "1", "b", "http://x.com"));
        children.push(BookmarkNode::bookmark("4", "1", "c", "http://x.com"));
    }
    let store = MemoryStore::new(vec![root]);
    store.fail_mutations_on("3").await;

    let mut engine = CleanerEngine::new(store);
    engine.scan(ScanMode::Url).await.unwrap();
    let summary = engine.delete_duplicates().await.unwrap();

    // Both redundant members were attempted; only the injected one failed.
    assert_eq!(summary.attempted, 2);
    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.failures.len(), 1);
    assert_eq!(summary.failures[0].id, "3");
}

#[tokio::test]
async fn group_failure_is_isolated_per_class() {
    let mut folder_a = BookmarkNode::folder("10", Some("1"), "A");
    folder_a
        .children_mut()
        .unwrap()
        .push(BookmarkNode::bookmark("11", "10", "x", "http://x.com"));
    let mut folder_b = BookmarkNode::folder("20", Some("1"), "B");
    {
        let children = folder_b.children_mut().unwrap();
        children.push(BookmarkNode::bookmark("21", "20", "x", "http://x.com"));
        children.push(BookmarkNode::bookmark("22", "20", "x", "http://x.com"));
    }
    let mut root = BookmarkNode::folder("1", None, "root");
    root.children_mut().unwrap().push(folder_a);
    root.children_mut().unwrap().push(folder_b);

    let store = MemoryStore::new(vec![root]);
    store.fail_mutations_on("21").await;

    let mut engine = CleanerEngine::new(store);
    engine.scan(ScanMode::Url).await.unwrap();
    let summary = engine.group_duplicates().await.unwrap();

    assert_eq!(summary.attempted, 2);
    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.failures[0].id, "21");

    // The member that could move did move.
    let moved = engine
        .bookmarks()
        .iter()
        .find(|b| b.id == "22")
        .unwrap()
        .clone();
    assert_eq!(moved.parent_id.as_deref(), Some("10"));
}

struct BrokenStore;

#[async_trait]
impl BookmarkStore for BrokenStore {
    async fn get_tree(&self) -> Result<Vec<BookmarkNode>, StoreError> {
        Err(StoreError::Format("store unavailable".to_string()))
    }

    async fn move_node(&self, _id: &str, _new_parent_id: &str) -> Result<(), StoreError> {
        unreachable!("no tree was ever read")
    }

    async fn remove(&self, _id: &str) -> Result<(), StoreError> {
        unreachable!("no tree was ever read")
    }
}

#[tokio::test]
async fn tree_read_failure_is_fatal_to_the_scan() {
    let mut engine = CleanerEngine::new(BrokenStore);
    let err = engine.scan(ScanMode::Url).await.unwrap_err();
    assert!(err.to_string().contains("failed to load bookmark tree"));
    // No partial snapshot was produced.
    assert!(engine.bookmarks().is_empty());
}

const CHROMIUM_SAMPLE: &str = r#"{
    "roots": {
        "bookmark_bar": {
            "id": "1",
            "name": "Bookmarks Bar",
            "type": "folder",
            "children": [
                {
                    "id": "10",
                    "name": "A",
                    "type": "folder",
                    "children": [
                        { "id": "11", "name": "X1", "type": "url", "url": "http://x.com" }
                    ]
                },
                {
                    "id": "20",
                    "name": "B",
                    "type": "folder",
                    "children": [
                        { "id": "21", "name": "X2", "type": "url", "url": "http://x.com" }
                    ]
                }
            ]
        },
        "other": { "id": "2", "name": "Other", "type": "folder", "children": [] }
    },
    "version": 1
}"#;

#[tokio::test]
async fn delete_pass_round_trips_through_chromium_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Bookmarks");
    std::fs::write(&path, CHROMIUM_SAMPLE).unwrap();

    let mut engine = CleanerEngine::new(ChromiumFileStore::open(&path).unwrap());
    engine.scan(ScanMode::Url).await.unwrap();
    let summary = engine.delete_duplicates().await.unwrap();
    assert_eq!(summary.succeeded, 1);

    // A freshly opened store sees the mutation.
    let reopened = ChromiumFileStore::open(&path).unwrap();
    let flat = flatten(&reopened.get_tree().await.unwrap());
    assert_eq!(flat.len(), 1);
    assert_eq!(flat[0].id, "11");
}

#[tokio::test]
async fn group_pass_round_trips_through_chromium_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Bookmarks");
    std::fs::write(&path, CHROMIUM_SAMPLE).unwrap();

    let mut engine = CleanerEngine::new(ChromiumFileStore::open(&path).unwrap());
    engine.scan(ScanMode::Url).await.unwrap();
    engine.group_duplicates().await.unwrap();

    let reopened = ChromiumFileStore::open(&path).unwrap();
    let flat = flatten(&reopened.get_tree().await.unwrap());
    assert_eq!(flat.len(), 2);
    assert!(flat.iter().all(|b| b.parent_id.as_deref() == Some("10")));
}

//! The duplicate resolution engine.
//!
//! One engine instance owns a point-in-time flat snapshot of the tree and the
//! duplicate index derived from it. The store stays the sole source of truth:
//! after any mutation pass the engine reloads, re-flattens, and reclassifies
//! before reporting anything.

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::bookmarks::{flatten, FlatBookmark};
use crate::dedup::{find_duplicates, DuplicateIndex, ScanMode};
use crate::store::BookmarkStore;

/// One mutation that could not be applied. The batch keeps going.
#[derive(Debug)]
pub struct ItemFailure {
    pub id: String,
    pub url: String,
    pub reason: String,
}

/// Outcome of a group or delete pass. `succeeded` counts only mutations the
/// store accepted.
#[derive(Debug, Default)]
pub struct MutationSummary {
    pub attempted: usize,
    pub succeeded: usize,
    pub failures: Vec<ItemFailure>,
}

impl MutationSummary {
    fn record_success(&mut self) {
        self.attempted += 1;
        self.succeeded += 1;
    }

    fn record_failure(&mut self, bookmark: &FlatBookmark, reason: String) {
        self.attempted += 1;
        self.failures.push(ItemFailure {
            id: bookmark.id.clone(),
            url: bookmark.url.clone(),
            reason,
        });
    }

    pub fn print_summary(&self, verb: &str) {
        println!("\n📊 {} summary", verb);
        println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        println!("  Attempted: {}", self.attempted);
        println!("  Succeeded: {}", self.succeeded);
        if !self.failures.is_empty() {
            println!("  Failed:    {}", self.failures.len());
            for failure in &self.failures {
                println!("    • {} ({}): {}", failure.id, failure.url, failure.reason);
            }
        }
        println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
    }
}

pub struct CleanerEngine<S: BookmarkStore> {
    store: S,
    bookmarks: Vec<FlatBookmark>,
    duplicates: DuplicateIndex,
    last_mode: ScanMode,
}

impl<S: BookmarkStore> CleanerEngine<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            bookmarks: Vec::new(),
            duplicates: DuplicateIndex::default(),
            last_mode: ScanMode::default(),
        }
    }

    pub fn bookmarks(&self) -> &[FlatBookmark] {
        &self.bookmarks
    }

    pub fn duplicates(&self) -> &DuplicateIndex {
        &self.duplicates
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Reload the tree from the store and flatten it, replacing any held
    /// snapshot. A store read failure is fatal to the scan cycle.
    pub async fn load_bookmarks(&mut self) -> Result<&[FlatBookmark]> {
        let tree = self
            .store
            .get_tree()
            .await
            .context("failed to load bookmark tree")?;
        self.bookmarks = flatten(&tree);
        info!("Loaded {} bookmarks", self.bookmarks.len());
        Ok(&self.bookmarks)
    }

    /// Classify the currently loaded snapshot, replacing any held index.
    pub fn find_duplicates(&mut self, mode: ScanMode) -> &DuplicateIndex {
        self.last_mode = mode;
        self.duplicates = find_duplicates(&self.bookmarks, mode);
        debug!(
            "Found {} duplicate classes ({} bookmarks) in {} mode",
            self.duplicates.len(),
            self.duplicates.total_duplicates(),
            mode
        );
        &self.duplicates
    }

    /// Reload + classify in one step.
    pub async fn scan(&mut self, mode: ScanMode) -> Result<&DuplicateIndex> {
        self.load_bookmarks().await?;
        Ok(self.find_duplicates(mode))
    }

    /// Move every redundant member of every class into its canonical
    /// member's folder. Mutations are issued one at a time, each awaited, and
    /// a failed item never aborts the batch. Grouping relocates duplicates,
    /// it does not remove them.
    pub async fn group_duplicates(&mut self) -> Result<MutationSummary> {
        let mut summary = MutationSummary::default();

        for class in self.duplicates.classes() {
            let canonical = class.canonical();
            let Some(target_parent) = canonical.parent_id.as_deref() else {
                // Rootless canonical: nowhere to converge on.
                for member in class.redundant() {
                    warn!("Cannot group {}: canonical {} has no parent", member.id, canonical.id);
                    summary.record_failure(member, "canonical member has no parent".to_string());
                }
                continue;
            };

            for member in class.redundant() {
                if member.parent_id.as_deref() == Some(target_parent) {
                    continue;
                }
                match self.store.move_node(&member.id, target_parent).await {
                    Ok(()) => {
                        debug!("Moved {} under {}", member.id, target_parent);
                        summary.record_success();
                    }
                    Err(e) => {
                        warn!("Failed to move {}: {}", member.id, e);
                        summary.record_failure(member, e.to_string());
                    }
                }
            }
        }

        info!(
            "Grouped {}/{} duplicates, reloading tree",
            summary.succeeded, summary.attempted
        );
        self.reconcile().await?;
        Ok(summary)
    }

    /// Remove every redundant member of every class, keeping the canonical
    /// one. Per-item failures are isolated; the summary counts successful
    /// removals only.
    pub async fn delete_duplicates(&mut self) -> Result<MutationSummary> {
        let mut summary = MutationSummary::default();

        for class in self.duplicates.classes() {
            for member in class.redundant() {
                match self.store.remove(&member.id).await {
                    Ok(()) => {
                        debug!("Removed {} ({})", member.id, member.url);
                        summary.record_success();
                    }
                    Err(e) => {
                        warn!("Failed to remove {}: {}", member.id, e);
                        summary.record_failure(member, e.to_string());
                    }
                }
            }
        }

        info!(
            "Deleted {}/{} duplicates, reloading tree",
            summary.succeeded, summary.attempted
        );
        // The held index is void now; reconcile rebuilds it from the store.
        self.duplicates = DuplicateIndex::default();
        self.reconcile().await?;
        Ok(summary)
    }

    /// Post-mutation reconciliation: reload, re-flatten, reclassify with the
    /// mode of the last scan. The store is the sole source of truth, so no
    /// local view is trusted after a mutation pass.
    async fn reconcile(&mut self) -> Result<()> {
        self.load_bookmarks().await?;
        self.find_duplicates(self.last_mode);
        Ok(())
    }
}

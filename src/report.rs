//! Text rendering of scan results: the duplicate report and the tree
//! explorer view.

use chrono::{Local, TimeZone};

use crate::bookmarks::{BookmarkNode, NodeKind};
use crate::dedup::DuplicateIndex;

fn format_date(ms: Option<i64>) -> String {
    ms.and_then(|ms| Local.timestamp_millis_opt(ms).single())
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "?".to_string())
}

/// Per-class duplicate report. `detailed` adds ids and dates per member.
pub fn format_report(index: &DuplicateIndex, detailed: bool) -> String {
    let mut output = String::new();

    output.push_str("\n🔍 Duplicate Report\n");
    output.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");

    if index.is_empty() {
        output.push_str("  No duplicates found! 🎉\n");
        output.push_str("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
        return output;
    }

    for class in index.classes() {
        output.push_str(&format!("  {} ({} copies)\n", class.key, class.members.len()));
        for member in &class.members {
            let title = if member.title.is_empty() { "(untitled)" } else { member.title.as_str() };
            output.push_str(&format!("    • {}\n", title));
            if detailed {
                output.push_str(&format!(
                    "      id: {}, added: {}\n",
                    member.id,
                    format_date(member.date_added)
                ));
            }
        }
        output.push('\n');
    }

    output.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
    output.push_str(&format!(
        "  {} classes, {} bookmarks involved, {} removable\n",
        index.len(),
        index.total_duplicates(),
        index.redundant_count()
    ));
    output
}

/// Indented tree view with duplicate leaves marked. Duplicated URLs get a
/// group number in first-seen order, the way the explorer view tags them.
pub fn format_tree(roots: &[BookmarkNode], index: &DuplicateIndex) -> String {
    let mut output = String::new();
    for root in roots {
        render_node(root, 0, index, &mut output);
    }
    output
}

fn render_node(node: &BookmarkNode, depth: usize, index: &DuplicateIndex, output: &mut String) {
    let indent = "  ".repeat(depth);
    match &node.kind {
        NodeKind::Folder { children } => {
            let title = if node.title.is_empty() {
                if node.parent_id.is_none() { "(root)" } else { "(unnamed folder)" }
            } else {
                node.title.as_str()
            };
            output.push_str(&format!("{}📁 {}\n", indent, title));
            for child in children {
                render_node(child, depth + 1, index, output);
            }
        }
        NodeKind::Bookmark { url } => {
            let title = if node.title.is_empty() { url.as_str() } else { node.title.as_str() };
            let marker = index
                .classes()
                .iter()
                .position(|c| c.members.iter().any(|m| m.id == node.id))
                .map(|pos| {
                    let class = &index.classes()[pos];
                    format!("  ⚠️ dup #{} ({} copies)", pos + 1, class.members.len())
                })
                .unwrap_or_default();
            output.push_str(&format!("{}🔗 {}{}\n", indent, title, marker));
        }
    }
}

//! Tree views over the flat entry list.
//!
//! The parent graph is client-supplied and nothing upstream rejects cycles,
//! so every traversal here carries a visited set and terminates on any input.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::organization::DirectoryEntry;
use crate::types::DbId;

/// Index entries by id. With duplicate ids the first occurrence wins.
pub fn index_by_id(entries: &[DirectoryEntry]) -> HashMap<DbId, &DirectoryEntry> {
    let mut index = HashMap::with_capacity(entries.len());
    for entry in entries {
        index.entry(entry.id).or_insert(entry);
    }
    index
}

/// Parent id of `entry` if it resolves to another entry in `index`.
fn resolved_parent(entry: &DirectoryEntry, index: &HashMap<DbId, &DirectoryEntry>) -> Option<DbId> {
    entry
        .parent_id
        .filter(|pid| *pid != entry.id && index.contains_key(pid))
}

/// Children of every resolving parent, each list sorted by id.
fn children_by_parent<'a>(
    index: &HashMap<DbId, &'a DirectoryEntry>,
) -> HashMap<DbId, Vec<&'a DirectoryEntry>> {
    let mut children: HashMap<DbId, Vec<&DirectoryEntry>> = HashMap::new();
    for entry in index.values() {
        if let Some(pid) = resolved_parent(entry, index) {
            children.entry(pid).or_default().push(*entry);
        }
    }
    for list in children.values_mut() {
        list.sort_by_key(|e| e.id);
    }
    children
}

// ---------------------------------------------------------------------------
// Forest
// ---------------------------------------------------------------------------

/// A node of the nested tree built by [`build_forest`].
#[derive(Debug, Clone, PartialEq)]
pub struct TreeNode<'a> {
    pub entry: &'a DirectoryEntry,
    pub depth: u32,
    pub children: Vec<TreeNode<'a>>,
}

impl TreeNode<'_> {
    /// Number of nodes in this subtree, including `self`.
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(TreeNode::size).sum::<usize>()
    }
}

/// Build the nested tree.
///
/// Roots are entries whose parent is absent, self-referencing or missing
/// from the list. Entries caught in a parent cycle have no such root; the
/// lowest id of each unreached cycle is promoted to a root so every entry
/// appears exactly once.
pub fn build_forest(entries: &[DirectoryEntry]) -> Vec<TreeNode<'_>> {
    let index = index_by_id(entries);
    let children = children_by_parent(&index);

    let mut ordered: Vec<&DirectoryEntry> = index.values().copied().collect();
    ordered.sort_by_key(|e| e.id);

    let mut visited = HashSet::new();
    let mut forest = Vec::new();

    for &entry in ordered.iter().filter(|e| resolved_parent(e, &index).is_none()) {
        forest.push(grow(entry, 0, &children, &mut visited));
    }
    for &entry in &ordered {
        if !visited.contains(&entry.id) {
            forest.push(grow(entry, 0, &children, &mut visited));
        }
    }

    forest
}

fn grow<'a>(
    entry: &'a DirectoryEntry,
    depth: u32,
    children: &HashMap<DbId, Vec<&'a DirectoryEntry>>,
    visited: &mut HashSet<DbId>,
) -> TreeNode<'a> {
    visited.insert(entry.id);
    let mut node = TreeNode {
        entry,
        depth,
        children: Vec::new(),
    };
    if let Some(kids) = children.get(&entry.id) {
        for &kid in kids {
            if visited.contains(&kid.id) {
                continue;
            }
            node.children.push(grow(kid, depth + 1, children, visited));
        }
    }
    node
}

// ---------------------------------------------------------------------------
// Parent picker
// ---------------------------------------------------------------------------

/// One selectable parent in the edit form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentOption {
    pub id: DbId,
    /// Indentation depth in the picker.
    pub depth: u32,
    /// Stored level of the candidate.
    pub level: u32,
    pub label: String,
}

/// Depth-first list of entries that may become the parent of `editing`.
///
/// `editing` and all of its descendants are left out, so choosing any
/// listed option cannot close a cycle.
pub fn parent_options(entries: &[DirectoryEntry], editing: Option<DbId>) -> Vec<ParentOption> {
    let mut options = Vec::new();
    for root in build_forest(entries) {
        flatten_options(&root, editing, &mut options);
    }
    options
}

fn flatten_options(node: &TreeNode<'_>, editing: Option<DbId>, out: &mut Vec<ParentOption>) {
    if Some(node.entry.id) == editing {
        return;
    }
    out.push(ParentOption {
        id: node.entry.id,
        depth: node.depth,
        level: node.entry.level,
        label: node.entry.picker_label(),
    });
    for child in &node.children {
        flatten_options(child, editing, out);
    }
}

// ---------------------------------------------------------------------------
// Levels
// ---------------------------------------------------------------------------

/// Level for an entry placed under `parent_id`: one below the parent, or 0
/// for a root or a parent that is not in `entries`.
pub fn resolve_level(parent_id: Option<DbId>, entries: &[DirectoryEntry]) -> u32 {
    parent_id
        .and_then(|pid| entries.iter().find(|e| e.id == pid))
        .map(|parent| parent.level.saturating_add(1))
        .unwrap_or(0)
}

/// New levels for the descendants of `root` once `root` sits at
/// `root_level`, in depth-first order. `root` itself is not included.
pub fn subtree_levels(entries: &[DirectoryEntry], root: DbId, root_level: u32) -> Vec<(DbId, u32)> {
    let index = index_by_id(entries);
    let children = children_by_parent(&index);
    let mut visited: HashSet<DbId> = HashSet::from([root]);
    let mut out = Vec::new();
    let mut stack: Vec<(DbId, u32)> = vec![(root, root_level)];

    while let Some((id, level)) = stack.pop() {
        let Some(kids) = children.get(&id) else {
            continue;
        };
        for child in kids.iter().rev() {
            if visited.insert(child.id) {
                stack.push((child.id, level.saturating_add(1)));
            }
        }
        if id != root {
            out.push((id, level));
        }
    }
    out
}

/// Graph depth of every entry, derived from `parent_id`.
///
/// Roots get 0 and each resolving child its parent's depth plus one.
/// An entry whose parent is missing keeps its supplied `level` and anchors
/// its own descendants; entries on a cycle keep their supplied `level` too.
pub fn derive_levels(entries: &[DirectoryEntry]) -> BTreeMap<DbId, u32> {
    let index = index_by_id(entries);
    let mut levels: BTreeMap<DbId, u32> = BTreeMap::new();

    for start in entries {
        if levels.contains_key(&start.id) {
            continue;
        }

        let mut path: Vec<&DirectoryEntry> = Vec::new();
        let mut node = index[&start.id];

        loop {
            if let Some(&known) = levels.get(&node.id) {
                assign_chain(&path, path.len(), known, &mut levels);
                break;
            }

            if let Some(k) = path.iter().position(|e| e.id == node.id) {
                for member in &path[k..] {
                    levels.insert(member.id, member.level);
                }
                assign_chain(&path, k, path[k].level, &mut levels);
                break;
            }

            path.push(node);
            let anchor = path.len() - 1;

            match node.parent_id.filter(|pid| *pid != node.id) {
                None => {
                    assign_chain(&path, anchor, 0, &mut levels);
                    levels.insert(node.id, 0);
                    break;
                }
                Some(pid) => match index.get(&pid) {
                    Some(&parent) => node = parent,
                    None => {
                        assign_chain(&path, anchor, node.level, &mut levels);
                        levels.insert(node.id, node.level);
                        break;
                    }
                },
            }
        }
    }

    levels
}

/// `path[i]` is a descendant `anchor - i` steps below a node at `base`.
fn assign_chain(
    path: &[&DirectoryEntry],
    anchor: usize,
    base: u32,
    levels: &mut BTreeMap<DbId, u32>,
) {
    for (i, entry) in path.iter().enumerate().take(anchor) {
        let steps = u32::try_from(anchor - i).unwrap_or(u32::MAX);
        levels.insert(entry.id, base.saturating_add(steps));
    }
}

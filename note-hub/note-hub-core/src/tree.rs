//! Navigation tree materialization.
//!
//! Clients fetch one user space's complete flat folder/note sets and
//! get back the nested tree plus a flat `id -> parent` table for O(1)
//! ancestor lookups without re-walking the tree.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::Serialize;
use tracing::error;
use uuid::Uuid;

use crate::error::{HierarchyError, Result};
use crate::model::{Folder, Note};

/// A folder with its direct children materialized.
///
/// `item_count` counts direct children only (child folders plus child
/// notes), not the whole subtree.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderNode {
    #[serde(flatten)]
    pub folder: Folder,
    pub folders: Vec<FolderNode>,
    pub notes: Vec<Note>,
    pub item_count: usize,
}

impl FolderNode {
    fn new(folder: Folder) -> Self {
        Self {
            folder,
            folders: Vec::new(),
            notes: Vec::new(),
            item_count: 0,
        }
    }
}

/// Nested reconstruction of one user space. The root lists hold
/// exactly the entities with no parent.
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationTree {
    pub folders: Vec<FolderNode>,
    pub notes: Vec<Note>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeView {
    pub tree: NavigationTree,
    /// Covers every folder and note in the space.
    pub parent_lookup: HashMap<Uuid, Option<Uuid>>,
}

/// Rebuilds the nested navigation tree from one tenant's flat folder
/// and note sets.
///
/// Siblings are ordered by name/title, case-insensitively and
/// numerically aware ("Folder 2" before "Folder 10"). A parent id
/// that resolves to no folder in the input is a stored-data
/// consistency violation and fails the call; nothing is silently
/// dropped.
pub fn build_navigation_tree(folders: Vec<Folder>, notes: Vec<Note>) -> Result<TreeView> {
    let mut parent_lookup: HashMap<Uuid, Option<Uuid>> = HashMap::new();
    let mut nodes: HashMap<Uuid, FolderNode> = HashMap::new();
    for folder in folders {
        parent_lookup.insert(folder.id, folder.parent_id);
        nodes.insert(folder.id, FolderNode::new(folder));
    }

    let mut child_folders: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
    let mut root_folders: Vec<Uuid> = Vec::new();
    for (&id, &parent) in &parent_lookup {
        match parent {
            Some(parent) => {
                if !nodes.contains_key(&parent) {
                    error!(folder = %id, parent = %parent, "folder references a missing parent");
                    return Err(HierarchyError::DanglingReference { id, parent });
                }
                child_folders.entry(parent).or_default().push(id);
            }
            None => root_folders.push(id),
        }
    }

    let mut root_notes: Vec<Note> = Vec::new();
    for note in notes {
        parent_lookup.insert(note.id, note.parent_id);
        match note.parent_id {
            Some(parent) => match nodes.get_mut(&parent) {
                Some(node) => {
                    node.item_count += 1;
                    node.notes.push(note);
                }
                None => {
                    error!(note = %note.id, parent = %parent, "note references a missing parent");
                    return Err(HierarchyError::DanglingReference {
                        id: note.id,
                        parent,
                    });
                }
            },
            None => root_notes.push(note),
        }
    }

    // sibling ordering, decided before assembly while names are easy
    // to look up
    let names: HashMap<Uuid, String> = nodes
        .iter()
        .map(|(&id, node)| (id, node.folder.name.clone()))
        .collect();
    let by_name = |a: &Uuid, b: &Uuid| compare_labels(&names[a], &names[b]);
    for children in child_folders.values_mut() {
        children.sort_by(by_name);
    }
    root_folders.sort_by(by_name);
    for node in nodes.values_mut() {
        node.notes.sort_by(|a, b| compare_labels(&a.title, &b.title));
    }
    root_notes.sort_by(|a, b| compare_labels(&a.title, &b.title));

    // post-order assembly with an explicit stack; child nodes are
    // finished before their parent picks them up
    enum Step {
        Enter(Uuid),
        Attach(Uuid),
    }
    let mut built: HashMap<Uuid, FolderNode> = HashMap::new();
    let mut stack: Vec<Step> = root_folders.iter().copied().map(Step::Enter).collect();
    while let Some(step) = stack.pop() {
        match step {
            Step::Enter(id) => {
                stack.push(Step::Attach(id));
                if let Some(children) = child_folders.get(&id) {
                    stack.extend(children.iter().copied().map(Step::Enter));
                }
            }
            Step::Attach(id) => {
                let Some(mut node) = nodes.remove(&id) else {
                    continue;
                };
                for child in child_folders.remove(&id).unwrap_or_default() {
                    if let Some(child_node) = built.remove(&child) {
                        node.item_count += 1;
                        node.folders.push(child_node);
                    }
                }
                built.insert(id, node);
            }
        }
    }

    // anything left was unreachable from a root, which only happens
    // when the stored parent relation contains a cycle
    if let Some((&id, node)) = nodes.iter().next() {
        let parent = node.folder.parent_id.unwrap_or(id);
        error!(folder = %id, "folder is unreachable from any root");
        return Err(HierarchyError::DanglingReference { id, parent });
    }

    let tree = NavigationTree {
        folders: root_folders
            .iter()
            .filter_map(|id| built.remove(id))
            .collect(),
        notes: root_notes,
    };
    Ok(TreeView {
        tree,
        parent_lookup,
    })
}

/// Case-insensitive, numeric-aware label ordering. Ties fall back to
/// the raw byte order so the result is total and deterministic.
pub fn compare_labels(a: &str, b: &str) -> Ordering {
    natural_cmp(a, b).then_with(|| a.cmp(b))
}

fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut xs = a.chars().peekable();
    let mut ys = b.chars().peekable();
    loop {
        match (xs.peek().copied(), ys.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                if x.is_ascii_digit() && y.is_ascii_digit() {
                    let nx = take_digits(&mut xs);
                    let ny = take_digits(&mut ys);
                    let tx = nx.trim_start_matches('0');
                    let ty = ny.trim_start_matches('0');
                    let ord = tx
                        .len()
                        .cmp(&ty.len())
                        .then_with(|| tx.cmp(ty))
                        .then_with(|| nx.len().cmp(&ny.len()));
                    if ord != Ordering::Equal {
                        return ord;
                    }
                } else {
                    let ord = x.to_lowercase().cmp(y.to_lowercase());
                    if ord != Ordering::Equal {
                        return ord;
                    }
                    xs.next();
                    ys.next();
                }
            }
        }
    }
}

fn take_digits(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut out = String::new();
    while let Some(&c) = chars.peek() {
        if !c.is_ascii_digit() {
            break;
        }
        out.push(c);
        chars.next();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn folder(space: Uuid, name: &str, parent: Option<Uuid>) -> Folder {
        let now = Utc::now();
        Folder {
            id: Uuid::new_v4(),
            user_space_id: space,
            name: name.to_string(),
            parent_id: parent,
            created_time: now,
            last_updated_time: now,
        }
    }

    fn note(space: Uuid, title: &str, parent: Option<Uuid>) -> Note {
        let now = Utc::now();
        Note {
            id: Uuid::new_v4(),
            user_space_id: space,
            title: title.to_string(),
            parent_id: parent,
            content: Vec::new(),
            created_time: now,
            last_updated_time: now,
        }
    }

    #[test]
    fn nests_folders_and_notes_under_their_parents() {
        let space = Uuid::new_v4();
        let a = folder(space, "A", None);
        let b = folder(space, "B", Some(a.id));
        let n = note(space, "N", Some(b.id));

        let view = build_navigation_tree(vec![a.clone(), b.clone()], vec![n.clone()]).unwrap();

        assert_eq!(view.tree.folders.len(), 1);
        let root = &view.tree.folders[0];
        assert_eq!(root.folder.id, a.id);
        assert_eq!(root.item_count, 1);
        assert_eq!(root.folders.len(), 1);
        let child = &root.folders[0];
        assert_eq!(child.folder.id, b.id);
        assert_eq!(child.item_count, 1);
        assert_eq!(child.notes.len(), 1);
        assert_eq!(child.notes[0].id, n.id);
        assert!(view.tree.notes.is_empty());

        assert_eq!(view.parent_lookup[&a.id], None);
        assert_eq!(view.parent_lookup[&b.id], Some(a.id));
        assert_eq!(view.parent_lookup[&n.id], Some(b.id));
    }

    #[test]
    fn root_lists_hold_exactly_the_parentless_entities() {
        let space = Uuid::new_v4();
        let a = folder(space, "a", None);
        let b = folder(space, "b", None);
        let child = folder(space, "c", Some(a.id));
        let loose = note(space, "loose", None);
        let filed = note(space, "filed", Some(a.id));

        let view = build_navigation_tree(
            vec![a.clone(), b.clone(), child.clone()],
            vec![loose.clone(), filed.clone()],
        )
        .unwrap();

        let root_ids: Vec<Uuid> = view.tree.folders.iter().map(|f| f.folder.id).collect();
        assert_eq!(root_ids, vec![a.id, b.id]);
        assert_eq!(view.tree.notes.len(), 1);
        assert_eq!(view.tree.notes[0].id, loose.id);
    }

    #[test]
    fn siblings_sort_numerically_and_case_insensitively() {
        let space = Uuid::new_v4();
        let f10 = folder(space, "Folder 10", None);
        let f2 = folder(space, "folder 2", None);
        let alpha = folder(space, "alpha", None);
        let beta = folder(space, "Beta", None);

        let view = build_navigation_tree(
            vec![f10.clone(), f2.clone(), alpha.clone(), beta.clone()],
            Vec::new(),
        )
        .unwrap();

        let names: Vec<&str> = view
            .tree
            .folders
            .iter()
            .map(|f| f.folder.name.as_str())
            .collect();
        assert_eq!(names, vec!["alpha", "Beta", "folder 2", "Folder 10"]);
    }

    #[test]
    fn dangling_folder_parent_is_surfaced() {
        let space = Uuid::new_v4();
        let ghost = Uuid::new_v4();
        let orphan = folder(space, "orphan", Some(ghost));
        match build_navigation_tree(vec![orphan.clone()], Vec::new()) {
            Err(HierarchyError::DanglingReference { id, parent }) => {
                assert_eq!(id, orphan.id);
                assert_eq!(parent, ghost);
            }
            other => panic!("expected dangling reference, got {other:?}"),
        }
    }

    #[test]
    fn dangling_note_parent_is_surfaced() {
        let space = Uuid::new_v4();
        let ghost = Uuid::new_v4();
        let n = note(space, "n", Some(ghost));
        assert!(matches!(
            build_navigation_tree(Vec::new(), vec![n]),
            Err(HierarchyError::DanglingReference { .. })
        ));
    }

    #[test]
    fn stored_cycle_is_surfaced_not_looped() {
        let space = Uuid::new_v4();
        let mut a = folder(space, "a", None);
        let mut b = folder(space, "b", None);
        a.parent_id = Some(b.id);
        b.parent_id = Some(a.id);
        assert!(matches!(
            build_navigation_tree(vec![a, b], Vec::new()),
            Err(HierarchyError::DanglingReference { .. })
        ));
    }

    #[test]
    fn deep_chains_do_not_recurse() {
        let space = Uuid::new_v4();
        let mut folders = vec![folder(space, "0", None)];
        for i in 1..5000 {
            let parent = folders[i - 1].id;
            folders.push(folder(space, &i.to_string(), Some(parent)));
        }
        let view = build_navigation_tree(folders, Vec::new()).unwrap();
        assert_eq!(view.tree.folders.len(), 1);
        let mut depth = 0;
        let mut cursor = &view.tree.folders[0];
        while let Some(next) = cursor.folders.first() {
            cursor = next;
            depth += 1;
        }
        assert_eq!(depth, 4999);
    }

    #[test]
    fn label_comparison_is_numeric_aware() {
        assert_eq!(compare_labels("Folder 2", "Folder 10"), Ordering::Less);
        assert_eq!(compare_labels("folder 2", "Folder 2"), Ordering::Greater);
        assert_eq!(compare_labels("a02", "a2"), Ordering::Greater);
        assert_eq!(compare_labels("abc", "ABD"), Ordering::Less);
    }
}

//! Queries and structural edits over a questionnaire.
//!
//! Every mutation takes the current snapshot by reference and returns a new
//! one, leaving the input untouched so callers can keep it for undo. Lookups
//! are pre-order depth-first and the first match wins.

use thiserror::Error;
use tracing::debug;

use crate::ids::reassign_ids;
use crate::spec::{Node, NodeKind, NodeRef, Questionnaire};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EditError {
    #[error("node '{0}' not found")]
    NodeNotFound(String),
    #[error("parent '{0}' not found")]
    ParentNotFound(String),
    #[error("a {parent} cannot contain a {child}")]
    NotAllowed { parent: NodeKind, child: NodeKind },
    #[error("the questionnaire root cannot be moved, deleted or duplicated")]
    RootImmutable,
    #[error("cannot move '{0}' into its own subtree")]
    CycleDetected(String),
}

/// Where a new child lands among its siblings.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Position {
    #[default]
    End,
    /// Clamped to the number of children.
    Index(usize),
    /// Right after the sibling with this id, or at the end when the parent
    /// has no such child.
    After(String),
}

pub fn find<'a>(doc: &'a Questionnaire, id: &str) -> Option<NodeRef<'a>> {
    if doc.id == id {
        return Some(NodeRef::Root(doc));
    }
    find_in(&doc.children, id).map(NodeRef::Node)
}

fn find_in<'a>(nodes: &'a [Node], id: &str) -> Option<&'a Node> {
    for node in nodes {
        if node.id() == id {
            return Some(node);
        }
        if let Some(found) = find_in(node.children(), id) {
            return Some(found);
        }
    }
    None
}

/// Immediate container of the first node with `id`. `None` for the root.
pub fn find_parent<'a>(doc: &'a Questionnaire, id: &str) -> Option<NodeRef<'a>> {
    let path = index_path(doc, id)?;
    let (_, parent) = path.split_last()?;
    node_at(doc, parent)
}

/// Child indices from the root down to the first node with `id`; empty for
/// the root itself. Edits follow this path in the cloned snapshot, so a
/// repeated id elsewhere in the tree is never touched by mistake.
fn index_path(doc: &Questionnaire, id: &str) -> Option<Vec<usize>> {
    fn walk(nodes: &[Node], id: &str, path: &mut Vec<usize>) -> bool {
        for (index, node) in nodes.iter().enumerate() {
            path.push(index);
            if node.id() == id || walk(node.children(), id, path) {
                return true;
            }
            path.pop();
        }
        false
    }
    if doc.id == id {
        return Some(Vec::new());
    }
    let mut path = Vec::new();
    walk(&doc.children, id, &mut path).then_some(path)
}

fn node_at<'a>(doc: &'a Questionnaire, path: &[usize]) -> Option<NodeRef<'a>> {
    let mut current = NodeRef::Root(doc);
    for &index in path {
        current = NodeRef::Node(current.children().get(index)?);
    }
    Some(current)
}

/// Chain from the root down to the node with `id`, both ends included.
pub fn node_path<'a>(doc: &'a Questionnaire, id: &str) -> Option<Vec<NodeRef<'a>>> {
    let mut path = vec![NodeRef::Root(doc)];
    if doc.id == id || path_in(&doc.children, id, &mut path) {
        Some(path)
    } else {
        None
    }
}

fn path_in<'a>(nodes: &'a [Node], id: &str, path: &mut Vec<NodeRef<'a>>) -> bool {
    for node in nodes {
        path.push(NodeRef::Node(node));
        if node.id() == id || path_in(node.children(), id, path) {
            return true;
        }
        path.pop();
    }
    false
}

/// Every node below the root in pre-order.
pub fn preorder(doc: &Questionnaire) -> Vec<&Node> {
    fn walk<'a>(nodes: &'a [Node], out: &mut Vec<&'a Node>) {
        for node in nodes {
            out.push(node);
            walk(node.children(), out);
        }
    }
    let mut out = Vec::new();
    walk(&doc.children, &mut out);
    out
}

/// Every id in the document in pre-order, root first.
pub fn collect_ids(doc: &Questionnaire) -> Vec<&str> {
    std::iter::once(doc.id.as_str())
        .chain(preorder(doc).into_iter().map(Node::id))
        .collect()
}

/// Whether `node` or anything beneath it carries `id`.
pub fn subtree_contains(node: &Node, id: &str) -> bool {
    node.id() == id || node.children().iter().any(|child| subtree_contains(child, id))
}

pub fn insert_child(
    doc: &Questionnaire,
    parent_id: &str,
    node: Node,
    position: Position,
) -> Result<Questionnaire, EditError> {
    let parent_path = index_path(doc, parent_id)
        .ok_or_else(|| EditError::ParentNotFound(parent_id.to_string()))?;
    let parent_kind = node_at(doc, &parent_path)
        .ok_or_else(|| EditError::ParentNotFound(parent_id.to_string()))?
        .kind();
    ensure_accepts(parent_kind, node.kind())?;

    let mut updated = doc.clone();
    let siblings = children_at(&mut updated, &parent_path)
        .ok_or_else(|| EditError::ParentNotFound(parent_id.to_string()))?;
    let index = match &position {
        Position::End => siblings.len(),
        Position::Index(index) => (*index).min(siblings.len()),
        Position::After(sibling) => siblings
            .iter()
            .position(|child| child.id() == sibling)
            .map_or(siblings.len(), |index| index + 1),
    };
    debug!(parent = parent_id, child = node.id(), kind = %node.kind(), index, "insert node");
    siblings.insert(index, node);
    Ok(updated)
}

/// Detaches `node_id` and reinserts it under `new_parent_id`.
///
/// `index` is read against the sibling list before the node is detached,
/// so moving within one parent past the node's own slot shifts it down by
/// one: `[A, B, C]` with A moved to 2 gives `[B, A, C]`.
pub fn move_node(
    doc: &Questionnaire,
    node_id: &str,
    new_parent_id: &str,
    index: usize,
) -> Result<Questionnaire, EditError> {
    if node_id == doc.id {
        return Err(EditError::RootImmutable);
    }
    let moving_path = index_path(doc, node_id)
        .ok_or_else(|| EditError::NodeNotFound(node_id.to_string()))?;
    let (&old_index, old_parent_path) = moving_path
        .split_last()
        .ok_or(EditError::RootImmutable)?;
    let moving = node_at(doc, &moving_path)
        .and_then(|found| found.as_node())
        .ok_or_else(|| EditError::NodeNotFound(node_id.to_string()))?;
    let mut new_parent_path = index_path(doc, new_parent_id)
        .ok_or_else(|| EditError::ParentNotFound(new_parent_id.to_string()))?;
    let new_parent = node_at(doc, &new_parent_path)
        .ok_or_else(|| EditError::ParentNotFound(new_parent_id.to_string()))?;
    ensure_accepts(new_parent.kind(), moving.kind())?;
    if subtree_contains(moving, new_parent_id) {
        return Err(EditError::CycleDetected(node_id.to_string()));
    }

    let same_parent = old_parent_path == new_parent_path.as_slice();
    // Detaching shifts later siblings of the moved node one slot left,
    // including the new parent or one of its ancestors.
    let depth = old_parent_path.len();
    if new_parent_path.len() > depth
        && new_parent_path[..depth] == *old_parent_path
        && new_parent_path[depth] > old_index
    {
        new_parent_path[depth] -= 1;
    }

    let mut updated = doc.clone();
    let detached = children_at(&mut updated, old_parent_path)
        .and_then(|siblings| take(siblings, old_index))
        .ok_or_else(|| EditError::NodeNotFound(node_id.to_string()))?;

    let siblings = children_at(&mut updated, &new_parent_path)
        .ok_or_else(|| EditError::ParentNotFound(new_parent_id.to_string()))?;
    let index = if same_parent && index > old_index {
        index - 1
    } else {
        index
    };
    let index = index.min(siblings.len());
    debug!(node = node_id, parent = new_parent_id, index, "move node");
    siblings.insert(index, detached);
    Ok(updated)
}

/// Removes the node and its whole subtree.
pub fn delete_node(doc: &Questionnaire, node_id: &str) -> Result<Questionnaire, EditError> {
    if node_id == doc.id {
        return Err(EditError::RootImmutable);
    }
    let path = index_path(doc, node_id)
        .ok_or_else(|| EditError::NodeNotFound(node_id.to_string()))?;
    let (&index, parent_path) = path.split_last().ok_or(EditError::RootImmutable)?;

    let mut updated = doc.clone();
    let removed = children_at(&mut updated, parent_path)
        .and_then(|siblings| take(siblings, index))
        .ok_or_else(|| EditError::NodeNotFound(node_id.to_string()))?;
    debug!(node = node_id, removed = removed.subtree_len(), "delete node");
    Ok(updated)
}

/// Deep-copies the subtree, gives every copied node a fresh id in pre-order
/// and places the copy right after the original. Returns the copy's id.
pub fn duplicate_node(
    doc: &Questionnaire,
    node_id: &str,
) -> Result<(Questionnaire, String), EditError> {
    if node_id == doc.id {
        return Err(EditError::RootImmutable);
    }
    let path = index_path(doc, node_id)
        .ok_or_else(|| EditError::NodeNotFound(node_id.to_string()))?;
    let (&index, parent_path) = path.split_last().ok_or(EditError::RootImmutable)?;
    let mut copy = node_at(doc, &path)
        .and_then(|found| found.as_node())
        .ok_or_else(|| EditError::NodeNotFound(node_id.to_string()))?
        .clone();

    let mut updated = doc.clone();
    reassign_ids(&mut updated, &mut copy);
    let copy_id = copy.id().to_string();
    let siblings = children_at(&mut updated, parent_path)
        .ok_or_else(|| EditError::NodeNotFound(node_id.to_string()))?;
    let index = (index + 1).min(siblings.len());
    siblings.insert(index, copy);
    debug!(node = node_id, copy = %copy_id, "duplicate node");
    Ok((updated, copy_id))
}

/// Applies `change` to the node with `id`. The id is kept, the edited
/// node must still be a kind its parent accepts, and its children must
/// all be kinds it accepts.
pub fn update_node<F>(doc: &Questionnaire, id: &str, change: F) -> Result<Questionnaire, EditError>
where
    F: FnOnce(&mut Node),
{
    let path = index_path(doc, id).ok_or_else(|| EditError::NodeNotFound(id.to_string()))?;
    let (&index, parent_path) = path
        .split_last()
        .ok_or_else(|| EditError::NodeNotFound(id.to_string()))?;
    let parent_kind = node_at(doc, parent_path)
        .ok_or_else(|| EditError::NodeNotFound(id.to_string()))?
        .kind();

    let mut updated = doc.clone();
    let node = children_at(&mut updated, parent_path)
        .and_then(|siblings| siblings.get_mut(index))
        .ok_or_else(|| EditError::NodeNotFound(id.to_string()))?;
    change(node);
    *node.id_mut() = id.to_string();
    ensure_accepts(parent_kind, node.kind())?;
    for child in node.children() {
        ensure_accepts(node.kind(), child.kind())?;
    }
    Ok(updated)
}

/// Renames the document.
pub fn update_questionnaire(doc: &Questionnaire, title: &str) -> Questionnaire {
    Questionnaire {
        title: title.to_string(),
        ..doc.clone()
    }
}

fn ensure_accepts(parent: NodeKind, child: NodeKind) -> Result<(), EditError> {
    if parent.accepts(child) {
        Ok(())
    } else {
        Err(EditError::NotAllowed { parent, child })
    }
}

fn take(siblings: &mut Vec<Node>, index: usize) -> Option<Node> {
    (index < siblings.len()).then(|| siblings.remove(index))
}

fn children_at<'a>(doc: &'a mut Questionnaire, path: &[usize]) -> Option<&'a mut Vec<Node>> {
    let mut children = &mut doc.children;
    for &index in path {
        children = children.get_mut(index)?.children_mut()?;
    }
    Some(children)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::{Section, Subsection};

    fn subsection(id: &str) -> Node {
        Node::Subsection(Subsection {
            id: id.into(),
            title: id.into(),
            show_in_bar_admin: true,
            children: Vec::new(),
        })
    }

    fn doc() -> Questionnaire {
        Questionnaire {
            id: "1".into(),
            title: "t".into(),
            suffix: String::new(),
            next_id: 10,
            children: vec![Node::Section(Section {
                id: "P".into(),
                title: "p".into(),
                show_in_bar_admin: true,
                children: vec![subsection("A"), subsection("B"), subsection("C")],
            })],
        }
    }

    fn child_ids(doc: &Questionnaire, parent: &str) -> Vec<String> {
        find(doc, parent)
            .expect("parent")
            .children()
            .iter()
            .map(|child| child.id().to_string())
            .collect()
    }

    #[test]
    fn insert_after_sibling() {
        let updated =
            insert_child(&doc(), "P", subsection("X"), Position::After("A".into())).expect("insert");
        assert_eq!(child_ids(&updated, "P"), ["A", "X", "B", "C"]);
    }

    #[test]
    fn insert_index_is_clamped() {
        let updated = insert_child(&doc(), "P", subsection("X"), Position::Index(99)).expect("insert");
        assert_eq!(child_ids(&updated, "P"), ["A", "B", "C", "X"]);
    }

    #[test]
    fn path_runs_from_root() {
        let doc = doc();
        let path = node_path(&doc, "B").expect("path");
        let ids: Vec<_> = path.iter().map(NodeRef::id).collect();
        assert_eq!(ids, ["1", "P", "B"]);
        assert!(node_path(&doc, "missing").is_none());
    }

    #[test]
    fn move_section_into_itself_is_refused() {
        let err = move_node(&doc(), "P", "P", 0).expect_err("refused");
        assert_eq!(err, EditError::NotAllowed {
            parent: NodeKind::Section,
            child: NodeKind::Section,
        });
    }

    #[test]
    fn update_keeps_id() {
        let updated = update_node(&doc(), "B", |node| {
            if let Node::Subsection(sub) = node {
                sub.title = "Renamed".into();
                sub.id = "hijacked".into();
            }
        })
        .expect("update");
        match find(&updated, "B").and_then(|found| found.as_node()) {
            Some(Node::Subsection(sub)) => assert_eq!(sub.title, "Renamed"),
            other => panic!("unexpected {other:?}"),
        }
    }
}

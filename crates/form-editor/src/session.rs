use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use form_spec::{
    AnswerMap, EditError, Node, NodeKind, Position, ProfileField, QuestionType, Questionnaire,
    Reference, ValidationReport, VisibilityMap, allocate_id, build_xml, delete_node,
    duplicate_node, find, insert_child, move_node, new_questionnaire, parse_xml, reassign_ids,
    regenerate_all_ids, resolve_visibility, update_node, update_questionnaire, validate,
};

use crate::error::EditorError;
use crate::history::{DEFAULT_MAX_LEVELS, History};
use crate::templates::Template;

const PROFILE_TABLE: &str = "profile";

/// What the clipboard holds: a detached subtree and when it was copied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClipboardEntry {
    pub node: Node,
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
}

/// One open document with its undo history, selection and clipboard.
///
/// Edits go through the pure functions in `form_spec::edit`; a refused edit
/// leaves the session exactly as it was.
#[derive(Debug, Clone)]
pub struct Session {
    doc: Questionnaire,
    history: History,
    selected: Option<String>,
    /// Serialized [`ClipboardEntry`], kept as JSON so it can be handed to
    /// and restored from a host-side store.
    clipboard: Option<String>,
}

impl Session {
    pub fn new(doc: Questionnaire) -> Self {
        Self::with_max_levels(doc, DEFAULT_MAX_LEVELS)
    }

    pub fn with_max_levels(doc: Questionnaire, max_levels: usize) -> Self {
        Self {
            history: History::with_max_levels(doc.clone(), max_levels),
            doc,
            selected: None,
            clipboard: None,
        }
    }

    /// Starts an empty document. A random suffix is drawn when none is given.
    pub fn create(title: &str, suffix: Option<&str>) -> Result<Self, EditorError> {
        let doc = new_questionnaire(title, suffix)?;
        info!(id = %doc.id, suffix = %doc.suffix, "created questionnaire");
        Ok(Self::new(doc))
    }

    pub fn open_xml(xml: &str) -> Result<Self, EditorError> {
        let doc = parse_xml(xml)?;
        info!(id = %doc.id, title = %doc.title, "opened questionnaire");
        Ok(Self::new(doc))
    }

    /// Swaps in a new document and starts a fresh history for it. The
    /// clipboard survives.
    pub fn replace_document(&mut self, doc: Questionnaire) {
        self.history = History::with_max_levels(doc.clone(), self.history.max_levels());
        self.doc = doc;
        self.selected = None;
    }

    pub fn document(&self) -> &Questionnaire {
        &self.doc
    }

    pub fn export_xml(&self) -> String {
        build_xml(&self.doc)
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Selects `id`, or clears the selection with `None`. Unknown ids are
    /// refused.
    pub fn select(&mut self, id: Option<&str>) -> Result<(), EditorError> {
        match id {
            Some(id) if find(&self.doc, id).is_none() => {
                Err(EditError::NodeNotFound(id.to_string()).into())
            }
            Some(id) => {
                self.selected = Some(id.to_string());
                Ok(())
            }
            None => {
                self.selected = None;
                Ok(())
            }
        }
    }

    fn commit(&mut self, doc: Questionnaire) {
        self.history.record(doc.clone());
        self.doc = doc;
    }

    /// Adds the template's node(s) under `parent_id` and selects the first.
    ///
    /// Single nodes land right after the selected node when it is one of the
    /// parent's children, otherwise at the end. An address set is always
    /// appended.
    pub fn add(&mut self, parent_id: &str, template: Template) -> Result<String, EditorError> {
        let parent_kind = find(&self.doc, parent_id)
            .ok_or_else(|| EditError::ParentNotFound(parent_id.to_string()))?
            .kind();
        if !parent_kind.accepts(template.kind()) {
            return Err(EditError::NotAllowed {
                parent: parent_kind,
                child: template.kind(),
            }
            .into());
        }

        let appends = matches!(template, Template::AddressSet);
        let mut working = self.doc.clone();
        let nodes = template.instantiate(&mut working);
        let first = nodes
            .first()
            .map(|node| node.id().to_string())
            .unwrap_or_default();

        let mut position = match (&self.selected, appends) {
            (Some(selected), false) => Position::After(selected.clone()),
            _ => Position::End,
        };
        for node in nodes {
            let id = node.id().to_string();
            working = insert_child(&working, parent_id, node, position)?;
            position = if appends {
                Position::End
            } else {
                Position::After(id)
            };
        }
        debug!(parent = parent_id, node = %first, "added from template");
        self.commit(working);
        self.selected = Some(first.clone());
        Ok(first)
    }

    /// Points `question_id` at a profile field. The question becomes a
    /// `profilereference` and any earlier reference is replaced.
    pub fn add_reference(
        &mut self,
        question_id: &str,
        field: ProfileField,
    ) -> Result<String, EditorError> {
        match find(&self.doc, question_id).and_then(|found| found.as_node()) {
            Some(Node::Question(_)) => {}
            Some(_) => return Err(EditorError::NotAQuestion(question_id.to_string())),
            None => return Err(EditError::NodeNotFound(question_id.to_string()).into()),
        }

        let mut working = self.doc.clone();
        let reference_id = allocate_id(&mut working);
        let reference = Node::Reference(Reference {
            id: reference_id.clone(),
            table: PROFILE_TABLE.to_string(),
            field,
        });
        let working = update_node(&working, question_id, move |node| {
            if let Node::Question(question) = node {
                question.kind = QuestionType::ProfileReference;
                question
                    .children
                    .retain(|child| child.kind() != NodeKind::Reference);
                question.children.push(reference);
            }
        })?;
        self.commit(working);
        self.selected = Some(question_id.to_string());
        Ok(reference_id)
    }

    /// Replaces a node's own fields with those of `replacement`. The id and
    /// children of the existing node are kept; its kind may not change.
    pub fn update(&mut self, id: &str, replacement: Node) -> Result<(), EditorError> {
        let existing = find(&self.doc, id)
            .and_then(|found| found.as_node())
            .ok_or_else(|| EditError::NodeNotFound(id.to_string()))?
            .kind();
        if existing != replacement.kind() {
            return Err(EditorError::KindChanged {
                id: id.to_string(),
                existing,
                replacement: replacement.kind(),
            });
        }
        let working = update_node(&self.doc, id, move |node| {
            let children = node.children().to_vec();
            *node = replacement;
            if let Some(slot) = node.children_mut() {
                *slot = children;
            }
        })?;
        self.commit(working);
        Ok(())
    }

    pub fn rename(&mut self, title: &str) {
        let working = update_questionnaire(&self.doc, title);
        self.commit(working);
    }

    pub fn delete(&mut self, id: &str) -> Result<(), EditorError> {
        let working = delete_node(&self.doc, id)?;
        self.commit(working);
        self.selected = None;
        Ok(())
    }

    pub fn move_node(&mut self, id: &str, parent_id: &str, index: usize) -> Result<(), EditorError> {
        let working = move_node(&self.doc, id, parent_id, index)?;
        self.commit(working);
        Ok(())
    }

    /// Duplicates `id` next to itself and selects the copy.
    pub fn duplicate(&mut self, id: &str) -> Result<String, EditorError> {
        let (working, copy_id) = duplicate_node(&self.doc, id)?;
        self.commit(working);
        self.selected = Some(copy_id.clone());
        Ok(copy_id)
    }

    pub fn regenerate_ids(&mut self) {
        let working = regenerate_all_ids(&self.doc);
        self.commit(working);
        self.selected = None;
    }

    /// Puts a copy of the subtree on the clipboard. The document is not
    /// touched and no history entry is made.
    pub fn copy(&mut self, id: &str) -> Result<(), EditorError> {
        let node = find(&self.doc, id)
            .and_then(|found| found.as_node())
            .ok_or_else(|| EditError::NodeNotFound(id.to_string()))?
            .clone();
        let entry = ClipboardEntry {
            node,
            timestamp: now_millis(),
        };
        self.clipboard = Some(serde_json::to_string(&entry).map_err(EditorError::Clipboard)?);
        debug!(node = id, "copied to clipboard");
        Ok(())
    }

    pub fn clipboard_json(&self) -> Option<&str> {
        self.clipboard.as_deref()
    }

    /// Restores clipboard content saved by a host. Not validated until paste.
    pub fn set_clipboard_json(&mut self, json: Option<String>) {
        self.clipboard = json;
    }

    fn clipboard_entry(&self) -> Result<ClipboardEntry, EditorError> {
        let json = self.clipboard.as_deref().ok_or(EditorError::ClipboardEmpty)?;
        serde_json::from_str(json).map_err(EditorError::Clipboard)
    }

    pub fn can_paste(&self, parent_id: &str) -> bool {
        let Ok(entry) = self.clipboard_entry() else {
            return false;
        };
        find(&self.doc, parent_id).is_some_and(|parent| parent.kind().accepts(entry.node.kind()))
    }

    /// Pastes the clipboard under `parent_id` with fresh ids, after the
    /// selected node when it is a child of that parent.
    pub fn paste(&mut self, parent_id: &str) -> Result<String, EditorError> {
        let mut node = self.clipboard_entry()?.node;
        let parent_kind = find(&self.doc, parent_id)
            .ok_or_else(|| EditError::ParentNotFound(parent_id.to_string()))?
            .kind();
        if !parent_kind.accepts(node.kind()) {
            return Err(EditorError::PasteRejected {
                parent: parent_kind,
                child: node.kind(),
            });
        }

        let mut working = self.doc.clone();
        reassign_ids(&mut working, &mut node);
        let pasted = node.id().to_string();
        let position = self
            .selected
            .clone()
            .map_or(Position::End, Position::After);
        let working = insert_child(&working, parent_id, node, position)?;
        self.commit(working);
        self.selected = Some(pasted.clone());
        Ok(pasted)
    }

    pub fn undo(&mut self) -> Result<(), EditorError> {
        let doc = self.history.undo().cloned().ok_or(EditorError::NothingToUndo)?;
        self.doc = doc;
        self.drop_stale_selection();
        Ok(())
    }

    pub fn redo(&mut self) -> Result<(), EditorError> {
        let doc = self.history.redo().cloned().ok_or(EditorError::NothingToRedo)?;
        self.doc = doc;
        self.drop_stale_selection();
        Ok(())
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    fn drop_stale_selection(&mut self) {
        if let Some(selected) = &self.selected
            && find(&self.doc, selected).is_none()
        {
            self.selected = None;
        }
    }

    pub fn visibility(&self, answers: &AnswerMap) -> VisibilityMap {
        resolve_visibility(&self.doc, answers)
    }

    pub fn validate(&self) -> ValidationReport {
        validate(&self.doc)
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or_default()
}

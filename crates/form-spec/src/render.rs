use serde::Serialize;

use crate::spec::{Node, NodeKind, Questionnaire};

const QUESTION_LABEL_LEN: usize = 50;
const TEXT_LABEL_LEN: usize = 40;

/// One row of the document outline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutlineEntry {
    pub depth: usize,
    pub id: String,
    pub node_type: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub badge: Option<String>,
}

/// Flattened pre-order outline, root first at depth 0.
pub fn outline(doc: &Questionnaire) -> Vec<OutlineEntry> {
    let mut entries = vec![OutlineEntry {
        depth: 0,
        id: doc.id.clone(),
        node_type: NodeKind::Questionnaire.tag().to_string(),
        label: doc.title.clone(),
        badge: None,
    }];
    push_entries(&doc.children, 1, &mut entries);
    entries
}

fn push_entries(nodes: &[Node], depth: usize, entries: &mut Vec<OutlineEntry>) {
    for node in nodes {
        entries.push(OutlineEntry {
            depth,
            id: node.id().to_string(),
            node_type: node.kind().tag().to_string(),
            label: label(node),
            badge: badge(node),
        });
        push_entries(node.children(), depth + 1, entries);
    }
}

/// Display label used in the tree view.
pub fn label(node: &Node) -> String {
    match node {
        Node::Section(section) => section.title.clone(),
        Node::Subsection(subsection) => subsection.title.clone(),
        Node::Question(question) => match question.label() {
            Some(text) if !text.is_empty() => truncate(text, QUESTION_LABEL_LEN, "..."),
            _ => format!("[{}]", question.kind),
        },
        Node::Entity(entity) if entity.title.is_empty() => "Entity".to_string(),
        Node::Entity(entity) => entity.title.clone(),
        Node::ConditionSet(set) => {
            format!("Condition ({})", set.operator.as_str().to_uppercase())
        }
        Node::Conditional(conditional) => format!("If {}", conditional.condition),
        Node::Description(description) => text_label(&description.text, node.kind()),
        Node::Warning(warning) => text_label(&warning.text, node.kind()),
        Node::Note(note) => text_label(&note.text, node.kind()),
        Node::Choice(choice) if choice.text.is_empty() => choice.value.clone(),
        Node::Choice(choice) => choice.text.clone(),
        Node::Reference(reference) => format!("{}.{}", reference.table, reference.field),
        Node::IncludeForm(include) if include.title.is_empty() => include.form_name.clone(),
        Node::IncludeForm(include) => include.title.clone(),
        Node::RequiredDoc(doc) => doc.title.clone(),
    }
}

/// Short type marker for questions, entities and condition sets.
pub fn badge(node: &Node) -> Option<String> {
    match node {
        Node::Question(question) => Some(question.kind.to_string()),
        Node::Entity(entity) => Some(entity.kind.to_string()),
        Node::ConditionSet(set) => Some(set.operator.to_string()),
        _ => None,
    }
}

fn text_label(text: &str, kind: NodeKind) -> String {
    if text.is_empty() {
        kind.tag().to_string()
    } else {
        truncate(text, TEXT_LABEL_LEN, "")
    }
}

fn truncate(text: &str, max_chars: usize, ellipsis: &str) -> String {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => format!("{}{ellipsis}", &text[..end]),
        None => text.to_string(),
    }
}

/// Indented plain-text rendering of [`outline`].
pub fn render_outline(doc: &Questionnaire) -> String {
    let mut out = String::new();
    for entry in outline(doc) {
        out.push_str(&"  ".repeat(entry.depth));
        out.push_str(&entry.label);
        if let Some(badge) = &entry.badge {
            out.push_str(&format!(" [{badge}]"));
        }
        out.push_str(&format!(" ({} {})\n", entry.node_type, entry.id));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::{ConditionOperator, ConditionSet, Description, Question, QuestionType};

    #[test]
    fn question_label_falls_back_to_type() {
        let question = Node::Question(Question {
            id: "2".into(),
            kind: QuestionType::Date,
            ..Question::default()
        });
        assert_eq!(label(&question), "[date]");
        assert_eq!(badge(&question).as_deref(), Some("date"));
    }

    #[test]
    fn long_question_label_is_truncated() {
        let question = Node::Question(Question {
            id: "2".into(),
            children: vec![Node::Description(Description {
                id: "3".into(),
                prefix: String::new(),
                text: "x".repeat(60),
            })],
            ..Question::default()
        });
        assert_eq!(label(&question), format!("{}...", "x".repeat(50)));
    }

    #[test]
    fn condition_set_label_is_upper_case() {
        let set = Node::ConditionSet(ConditionSet {
            id: "4".into(),
            operator: ConditionOperator::Switch,
            children: Vec::new(),
        });
        assert_eq!(label(&set), "Condition (SWITCH)");
    }
}

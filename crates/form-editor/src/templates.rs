//! Ready-made nodes the editor inserts, with ids drawn from the document.

use serde::{Deserialize, Serialize};

use form_spec::{
    Choice, ConditionOperator, ConditionSet, Conditional, Description, Entity, EntityType,
    IncludeForm, Node, NodeKind, Note, Question, QuestionType, Questionnaire, RequiredDoc,
    Section, Subsection, Warning, allocate_id,
};

pub const NEW_QUESTION_TEXT: &str = "New Question";
pub const NEW_SUBSECTION_TITLE: &str = "New Subsection";
pub const TRIGGER_QUESTION_TEXT: &str = "Trigger Question";
const ADDMORE_MAX: u32 = 10;

const ADDRESS_FIELDS: &[(&str, QuestionType, bool)] = &[
    ("Address 1", QuestionType::Char, true),
    ("Address 2", QuestionType::Char, false),
    ("City", QuestionType::Char, true),
    ("State", QuestionType::State, true),
    ("County", QuestionType::County, true),
    ("Country", QuestionType::Country, true),
    ("Zip", QuestionType::Zip, true),
];

/// Something the editor can add under a parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "template", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Template {
    /// A section with one empty subsection inside.
    Section { title: String },
    Subsection { title: String },
    Question {
        #[serde(rename = "type", default)]
        kind: QuestionType,
        #[serde(default)]
        text: Option<String>,
        #[serde(default)]
        format: Option<String>,
    },
    Entity {
        title: String,
        #[serde(rename = "type", default)]
        kind: EntityType,
    },
    /// A yes/no radio trigger plus one conditional branch.
    ConditionSet,
    Conditional,
    #[serde(rename = "option")]
    Choice { value: String, text: String },
    Description { text: String },
    Warning { text: String },
    Note { text: String },
    IncludeForm { form_name: String, title: String },
    RequiredDoc { title: String },
    /// Seven address questions added as siblings.
    AddressSet,
}

impl Template {
    /// Kind of the node(s) this template produces.
    pub fn kind(&self) -> NodeKind {
        match self {
            Template::Section { .. } => NodeKind::Section,
            Template::Subsection { .. } => NodeKind::Subsection,
            Template::Question { .. } | Template::AddressSet => NodeKind::Question,
            Template::Entity { .. } => NodeKind::Entity,
            Template::ConditionSet => NodeKind::ConditionSet,
            Template::Conditional => NodeKind::Conditional,
            Template::Choice { .. } => NodeKind::Choice,
            Template::Description { .. } => NodeKind::Description,
            Template::Warning { .. } => NodeKind::Warning,
            Template::Note { .. } => NodeKind::Note,
            Template::IncludeForm { .. } => NodeKind::IncludeForm,
            Template::RequiredDoc { .. } => NodeKind::RequiredDoc,
        }
    }

    /// Builds the nodes, advancing `doc.next_id` for every id handed out.
    pub fn instantiate(self, doc: &mut Questionnaire) -> Vec<Node> {
        let node = match self {
            Template::Section { title } => {
                let id = allocate_id(doc);
                let subsection = Subsection {
                    id: allocate_id(doc),
                    title: NEW_SUBSECTION_TITLE.to_string(),
                    show_in_bar_admin: false,
                    children: Vec::new(),
                };
                Node::Section(Section {
                    id,
                    title,
                    show_in_bar_admin: false,
                    children: vec![Node::Subsection(subsection)],
                })
            }
            Template::Subsection { title } => Node::Subsection(Subsection {
                id: allocate_id(doc),
                title,
                show_in_bar_admin: false,
                children: Vec::new(),
            }),
            Template::Question { kind, text, format } => {
                let mut question = question(doc, kind, text.as_deref().unwrap_or(NEW_QUESTION_TEXT));
                question.format = format.unwrap_or_default();
                Node::Question(question)
            }
            Template::Entity { title, kind } => Node::Entity(entity(doc, title, kind)),
            Template::ConditionSet => Node::ConditionSet(condition_set(doc)),
            Template::Conditional => Node::Conditional(conditional(doc)),
            Template::Choice { value, text } => Node::Choice(Choice {
                id: allocate_id(doc),
                value,
                text,
            }),
            Template::Description { text } => Node::Description(description(doc, &text)),
            Template::Warning { text } => Node::Warning(Warning {
                id: allocate_id(doc),
                text,
            }),
            Template::Note { text } => Node::Note(Note {
                id: allocate_id(doc),
                text,
                is_check_item: false,
            }),
            Template::IncludeForm { form_name, title } => Node::IncludeForm(IncludeForm {
                id: allocate_id(doc),
                form_name,
                title,
                kind: form_spec::xml::DEFAULT_INCLUDE_TYPE.to_string(),
                multiple_include: false,
                required: true,
            }),
            Template::RequiredDoc { title } => Node::RequiredDoc(RequiredDoc {
                id: allocate_id(doc),
                title,
                prevent_submit: true,
            }),
            Template::AddressSet => {
                return ADDRESS_FIELDS
                    .iter()
                    .map(|(label, kind, required)| {
                        let mut question = question(doc, kind.clone(), label);
                        question.required = *required;
                        Node::Question(question)
                    })
                    .collect();
            }
        };
        vec![node]
    }
}

fn description(doc: &mut Questionnaire, text: &str) -> Description {
    Description {
        id: allocate_id(doc),
        prefix: String::new(),
        text: text.to_string(),
    }
}

fn yes_no(doc: &mut Questionnaire) -> [Node; 2] {
    [("yes", "Yes"), ("no", "No")].map(|(value, text)| {
        Node::Choice(Choice {
            id: allocate_id(doc),
            value: value.to_string(),
            text: text.to_string(),
        })
    })
}

/// Required question labelled `text`; option kinds get Yes/No choices.
fn question(doc: &mut Questionnaire, kind: QuestionType, text: &str) -> Question {
    let id = allocate_id(doc);
    let mut children = vec![Node::Description(description(doc, text))];
    if kind.has_options() {
        children.extend(yes_no(doc));
    }
    Question {
        id,
        kind,
        required: true,
        children,
        ..Question::default()
    }
}

fn entity(doc: &mut Questionnaire, title: String, kind: EntityType) -> Entity {
    let max = if kind == EntityType::AddMore { ADDMORE_MAX } else { 0 };
    Entity {
        id: allocate_id(doc),
        title,
        kind,
        min: 0,
        max,
        next_order: 1,
        show_in_bar_admin: false,
        is_amended: false,
        group_type: String::new(),
        ncbe_name: String::new(),
        ncbe_value: String::new(),
        ilg_name: String::new(),
        ilg_value: String::new(),
        children: Vec::new(),
    }
}

fn conditional(doc: &mut Questionnaire) -> Conditional {
    Conditional {
        id: allocate_id(doc),
        condition: form_spec::xml::DEFAULT_CONDITION.to_string(),
        children: Vec::new(),
    }
}

fn condition_set(doc: &mut Questionnaire) -> ConditionSet {
    let id = allocate_id(doc);
    let mut trigger = question(doc, QuestionType::Radio, TRIGGER_QUESTION_TEXT);
    trigger.required = false;
    trigger.trigger_value = "yes".to_string();
    let branch = conditional(doc);
    ConditionSet {
        id,
        operator: ConditionOperator::And,
        children: vec![Node::Question(trigger), Node::Conditional(branch)],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use form_spec::new_questionnaire;

    fn doc() -> Questionnaire {
        new_questionnaire("Templates", Some("10101")).expect("doc")
    }

    fn collect(node: &Node, ids: &mut Vec<String>) {
        ids.push(node.id().to_string());
        for child in node.children() {
            collect(child, ids);
        }
    }

    #[test]
    fn radio_question_gets_yes_no_options() {
        let mut doc = doc();
        let nodes = Template::Question {
            kind: QuestionType::Radio,
            text: None,
            format: None,
        }
        .instantiate(&mut doc);
        let Node::Question(question) = &nodes[0] else {
            panic!("expected question");
        };
        assert!(question.required);
        assert_eq!(question.id, "210101");
        assert_eq!(question.label(), Some(NEW_QUESTION_TEXT));
        let kinds: Vec<_> = question.children.iter().map(Node::kind).collect();
        assert_eq!(kinds, [NodeKind::Description, NodeKind::Choice, NodeKind::Choice]);
        assert_eq!(doc.next_id, 6);
    }

    #[test]
    fn plain_question_has_only_a_description() {
        let mut doc = doc();
        let nodes = Template::Question {
            kind: QuestionType::Date,
            text: Some("Date of birth".into()),
            format: Some("mm/dd/yyyy".into()),
        }
        .instantiate(&mut doc);
        let Node::Question(question) = &nodes[0] else {
            panic!("expected question");
        };
        assert_eq!(question.children.len(), 1);
        assert_eq!(question.format, "mm/dd/yyyy");
        assert_eq!(question.label(), Some("Date of birth"));
    }

    #[test]
    fn condition_set_ids_follow_document_order() {
        let mut doc = doc();
        let nodes = Template::ConditionSet.instantiate(&mut doc);
        let Node::ConditionSet(set) = &nodes[0] else {
            panic!("expected conditionset");
        };
        assert_eq!(set.id, "210101");
        let mut ids = Vec::new();
        collect(&nodes[0], &mut ids);
        let expected: Vec<String> = (2..=7).map(|n| format!("{n}10101")).collect();
        assert_eq!(ids, expected);
        assert_eq!(doc.next_id, 8);
        assert_eq!(set.operator, ConditionOperator::And);
        match &set.children[..] {
            [Node::Question(trigger), Node::Conditional(branch)] => {
                assert!(!trigger.required);
                assert_eq!(trigger.trigger_value, "yes");
                assert_eq!(trigger.label(), Some(TRIGGER_QUESTION_TEXT));
                assert_eq!(branch.condition, "true");
            }
            other => panic!("unexpected children {other:?}"),
        }
    }

    #[test]
    fn addmore_entity_defaults_to_ten_rows() {
        let mut doc = doc();
        let nodes = Template::Entity {
            title: "Employment".into(),
            kind: EntityType::AddMore,
        }
        .instantiate(&mut doc);
        let Node::Entity(entity) = &nodes[0] else {
            panic!("expected entity");
        };
        assert_eq!(entity.max, 10);
        assert!(!entity.show_in_bar_admin);
    }

    #[test]
    fn address_set_is_seven_questions() {
        let mut doc = doc();
        let nodes = Template::AddressSet.instantiate(&mut doc);
        assert_eq!(nodes.len(), 7);
        let optional: Vec<_> = nodes
            .iter()
            .filter_map(|node| match node {
                Node::Question(question) if !question.required => question.label(),
                _ => None,
            })
            .collect();
        assert_eq!(optional, ["Address 2"]);
    }

    #[test]
    fn templates_deserialize_from_tagged_json() {
        let template: Template =
            serde_json::from_str(r#"{"template":"question","type":"select","text":"Pick"}"#)
                .expect("decode");
        assert_eq!(template.kind(), NodeKind::Question);
        let template: Template = serde_json::from_str(
            r#"{"template":"includeForm","formName":"employment","title":"Jobs"}"#,
        )
        .expect("decode");
        assert_eq!(template.kind(), NodeKind::IncludeForm);
    }
}

#![allow(missing_docs)]

pub mod edit;
pub mod ids;
pub mod render;
pub mod spec;
pub mod validate;
pub mod visibility;
pub mod xml;

pub use edit::{
    EditError, Position, collect_ids, delete_node, duplicate_node, find, find_parent, insert_child,
    move_node, node_path, preorder, subtree_contains, update_node, update_questionnaire,
};
pub use ids::{
    IdError, allocate_id, counter_of, generate_suffix, is_valid_suffix, new_questionnaire,
    reassign_ids, regenerate_all_ids,
};
pub use render::{OutlineEntry, badge, label, outline, render_outline};
pub use spec::{
    Choice, ConditionOperator, ConditionSet, Conditional, Description, Entity, EntityType,
    IncludeForm, Node, NodeKind, NodeRef, Note, ProfileField, Question, QuestionType,
    Questionnaire, Reference, RequiredDoc, Section, Subsection, Warning,
};
pub use validate::{Finding, Severity, ValidationReport, validate};
pub use visibility::{
    AnswerMap, VisibilityMap, evaluate_condition_set, resolve_visibility, values_match,
};
pub use xml::{ParseError, SyntheticIds, build_xml, parse_xml, parse_xml_with, write_xml};

/// JSON Schema of the document model.
pub fn schema() -> schemars::Schema {
    schemars::schema_for!(Questionnaire)
}

pub fn to_json(doc: &Questionnaire) -> serde_json::Result<String> {
    serde_json::to_string_pretty(doc)
}

pub fn from_json(json: &str) -> serde_json::Result<Questionnaire> {
    serde_json::from_str(json)
}

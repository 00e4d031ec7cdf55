use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::spec::kinds::{ProfileField, QuestionType};
use crate::spec::node::Node;

/// A single prompt the applicant answers.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: QuestionType,
    pub format: String,
    pub option: String,
    pub required: bool,
    pub trigger_value: String,
    pub comment: String,
    pub maxlength: u32,
    pub refname: String,
    pub app_type: String,
    pub app_type_trigger: String,
    pub is_amended: bool,
    pub validator_class: String,
    pub validation_message: String,
    pub ncbe_name: String,
    pub ncbe_currently: bool,
    pub ilg_name: String,
    /// Description, option and reference nodes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Node>,
}

impl Question {
    /// Text of the first description child, which is what the applicant
    /// reads as the question label.
    pub fn label(&self) -> Option<&str> {
        self.children.iter().find_map(|child| match child {
            Node::Description(description) => Some(description.text.as_str()),
            _ => None,
        })
    }
}

/// `<option>`: one selectable answer of a radio or select question.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Choice {
    pub id: String,
    pub value: String,
    pub text: String,
}

/// Pulls a question's value from the applicant profile.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Reference {
    pub id: String,
    pub table: String,
    pub field: ProfileField,
}

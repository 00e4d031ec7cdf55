use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::spec::kinds::{ConditionOperator, EntityType};
use crate::spec::node::Node;

/// Repeatable or single grouping of content, e.g. an employment record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: EntityType,
    pub min: u32,
    pub max: u32,
    pub next_order: u32,
    pub show_in_bar_admin: bool,
    pub is_amended: bool,
    pub group_type: String,
    pub ncbe_name: String,
    pub ncbe_value: String,
    pub ilg_name: String,
    pub ilg_value: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Node>,
}

/// Trigger questions plus the conditional branches they switch on.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConditionSet {
    pub id: String,
    pub operator: ConditionOperator,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Node>,
}

/// Content shown when the enclosing conditionset selects this branch.
///
/// `condition` is a literal answer value, `true`/`false`, `else`, or a
/// `;v1;v2;` list for the switch operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Conditional {
    pub id: String,
    pub condition: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Node>,
}

impl Conditional {
    pub const ELSE: &'static str = "else";

    pub fn is_else(&self) -> bool {
        self.condition == Self::ELSE
    }
}

/// Label text; may embed inline markup such as `<strong>`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Description {
    pub id: String,
    pub prefix: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Warning {
    pub id: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: String,
    pub text: String,
    pub is_check_item: bool,
}

/// Embeds another form by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct IncludeForm {
    pub id: String,
    pub form_name: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub multiple_include: bool,
    pub required: bool,
}

/// A document the applicant must upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RequiredDoc {
    pub id: String,
    pub title: String,
    pub prevent_submit: bool,
}

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::spec::node::Node;

/// Root of a questionnaire document.
///
/// Every id allocated for the document is `<counter><suffix>`; `next_id` is
/// the counter the next allocation will use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Questionnaire {
    pub id: String,
    pub title: String,
    pub suffix: String,
    pub next_id: u64,
    /// Sections only.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Node>,
}

/// Top-level grouping shown as one step of the application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub id: String,
    pub title: String,
    pub show_in_bar_admin: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Subsection {
    pub id: String,
    pub title: String,
    pub show_in_bar_admin: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Node>,
}

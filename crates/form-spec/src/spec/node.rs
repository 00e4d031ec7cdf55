use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::spec::content::{
    ConditionSet, Conditional, Description, Entity, IncludeForm, Note, RequiredDoc, Warning,
};
use crate::spec::form::{Questionnaire, Section, Subsection};
use crate::spec::question::{Choice, Question, Reference};

/// Any node below the questionnaire root, tagged by `nodeType`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "nodeType", rename_all = "lowercase")]
pub enum Node {
    Section(Section),
    Subsection(Subsection),
    Question(Question),
    Entity(Entity),
    ConditionSet(ConditionSet),
    Conditional(Conditional),
    #[serde(rename = "option")]
    Choice(Choice),
    Description(Description),
    Warning(Warning),
    Note(Note),
    Reference(Reference),
    IncludeForm(IncludeForm),
    #[serde(rename = "required-doc")]
    RequiredDoc(RequiredDoc),
}

/// The `nodeType` tag, including the root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeKind {
    Questionnaire,
    Section,
    Subsection,
    Question,
    Entity,
    ConditionSet,
    Conditional,
    Choice,
    Description,
    Warning,
    Note,
    Reference,
    IncludeForm,
    RequiredDoc,
}

const CONTENT: &[NodeKind] = &[
    NodeKind::Question,
    NodeKind::Entity,
    NodeKind::ConditionSet,
    NodeKind::Description,
    NodeKind::Warning,
    NodeKind::Note,
    NodeKind::IncludeForm,
    NodeKind::RequiredDoc,
];

const CONDITION_SET_CONTENT: &[NodeKind] = &[
    NodeKind::Question,
    NodeKind::Conditional,
    NodeKind::Description,
    NodeKind::Warning,
    NodeKind::Note,
    NodeKind::RequiredDoc,
];

const QUESTION_CONTENT: &[NodeKind] = &[
    NodeKind::Description,
    NodeKind::Choice,
    NodeKind::Reference,
];

impl NodeKind {
    /// Element name in the XML dialect and `nodeType` value in JSON.
    pub fn tag(self) -> &'static str {
        match self {
            NodeKind::Questionnaire => "questionnaire",
            NodeKind::Section => "section",
            NodeKind::Subsection => "subsection",
            NodeKind::Question => "question",
            NodeKind::Entity => "entity",
            NodeKind::ConditionSet => "conditionset",
            NodeKind::Conditional => "conditional",
            NodeKind::Choice => "option",
            NodeKind::Description => "description",
            NodeKind::Warning => "warning",
            NodeKind::Note => "note",
            NodeKind::Reference => "reference",
            NodeKind::IncludeForm => "includeform",
            NodeKind::RequiredDoc => "required-doc",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        let kind = match tag {
            "questionnaire" => NodeKind::Questionnaire,
            "section" => NodeKind::Section,
            "subsection" => NodeKind::Subsection,
            "question" => NodeKind::Question,
            "entity" => NodeKind::Entity,
            "conditionset" => NodeKind::ConditionSet,
            "conditional" => NodeKind::Conditional,
            "option" => NodeKind::Choice,
            "description" => NodeKind::Description,
            "warning" => NodeKind::Warning,
            "note" => NodeKind::Note,
            "reference" => NodeKind::Reference,
            "includeform" => NodeKind::IncludeForm,
            "required-doc" => NodeKind::RequiredDoc,
            _ => return None,
        };
        Some(kind)
    }

    /// Child kinds a node of this kind may hold. Leaves return an empty slice.
    pub fn allowed_children(self) -> &'static [NodeKind] {
        match self {
            NodeKind::Questionnaire => &[NodeKind::Section],
            NodeKind::Section => &[NodeKind::Subsection],
            NodeKind::Subsection | NodeKind::Entity | NodeKind::Conditional => CONTENT,
            NodeKind::ConditionSet => CONDITION_SET_CONTENT,
            NodeKind::Question => QUESTION_CONTENT,
            NodeKind::Choice
            | NodeKind::Description
            | NodeKind::Warning
            | NodeKind::Note
            | NodeKind::Reference
            | NodeKind::IncludeForm
            | NodeKind::RequiredDoc => &[],
        }
    }

    pub fn accepts(self, child: NodeKind) -> bool {
        self.allowed_children().contains(&child)
    }

    pub fn is_container(self) -> bool {
        !self.allowed_children().is_empty()
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Section(_) => NodeKind::Section,
            Node::Subsection(_) => NodeKind::Subsection,
            Node::Question(_) => NodeKind::Question,
            Node::Entity(_) => NodeKind::Entity,
            Node::ConditionSet(_) => NodeKind::ConditionSet,
            Node::Conditional(_) => NodeKind::Conditional,
            Node::Choice(_) => NodeKind::Choice,
            Node::Description(_) => NodeKind::Description,
            Node::Warning(_) => NodeKind::Warning,
            Node::Note(_) => NodeKind::Note,
            Node::Reference(_) => NodeKind::Reference,
            Node::IncludeForm(_) => NodeKind::IncludeForm,
            Node::RequiredDoc(_) => NodeKind::RequiredDoc,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Node::Section(node) => &node.id,
            Node::Subsection(node) => &node.id,
            Node::Question(node) => &node.id,
            Node::Entity(node) => &node.id,
            Node::ConditionSet(node) => &node.id,
            Node::Conditional(node) => &node.id,
            Node::Choice(node) => &node.id,
            Node::Description(node) => &node.id,
            Node::Warning(node) => &node.id,
            Node::Note(node) => &node.id,
            Node::Reference(node) => &node.id,
            Node::IncludeForm(node) => &node.id,
            Node::RequiredDoc(node) => &node.id,
        }
    }

    pub fn id_mut(&mut self) -> &mut String {
        match self {
            Node::Section(node) => &mut node.id,
            Node::Subsection(node) => &mut node.id,
            Node::Question(node) => &mut node.id,
            Node::Entity(node) => &mut node.id,
            Node::ConditionSet(node) => &mut node.id,
            Node::Conditional(node) => &mut node.id,
            Node::Choice(node) => &mut node.id,
            Node::Description(node) => &mut node.id,
            Node::Warning(node) => &mut node.id,
            Node::Note(node) => &mut node.id,
            Node::Reference(node) => &mut node.id,
            Node::IncludeForm(node) => &mut node.id,
            Node::RequiredDoc(node) => &mut node.id,
        }
    }

    pub fn children(&self) -> &[Node] {
        match self {
            Node::Section(node) => &node.children,
            Node::Subsection(node) => &node.children,
            Node::Question(node) => &node.children,
            Node::Entity(node) => &node.children,
            Node::ConditionSet(node) => &node.children,
            Node::Conditional(node) => &node.children,
            Node::Choice(_)
            | Node::Description(_)
            | Node::Warning(_)
            | Node::Note(_)
            | Node::Reference(_)
            | Node::IncludeForm(_)
            | Node::RequiredDoc(_) => &[],
        }
    }

    /// `None` for leaf kinds.
    pub fn children_mut(&mut self) -> Option<&mut Vec<Node>> {
        match self {
            Node::Section(node) => Some(&mut node.children),
            Node::Subsection(node) => Some(&mut node.children),
            Node::Question(node) => Some(&mut node.children),
            Node::Entity(node) => Some(&mut node.children),
            Node::ConditionSet(node) => Some(&mut node.children),
            Node::Conditional(node) => Some(&mut node.children),
            Node::Choice(_)
            | Node::Description(_)
            | Node::Warning(_)
            | Node::Note(_)
            | Node::Reference(_)
            | Node::IncludeForm(_)
            | Node::RequiredDoc(_) => None,
        }
    }

    /// Number of nodes in this subtree, the node itself included.
    pub fn subtree_len(&self) -> usize {
        1 + self
            .children()
            .iter()
            .map(Node::subtree_len)
            .sum::<usize>()
    }
}

/// Borrowed view over either the root or a regular node, used by queries
/// that may land on the questionnaire itself.
#[derive(Debug, Clone, Copy)]
pub enum NodeRef<'a> {
    Root(&'a Questionnaire),
    Node(&'a Node),
}

impl<'a> NodeRef<'a> {
    pub fn id(&self) -> &'a str {
        match self {
            NodeRef::Root(root) => &root.id,
            NodeRef::Node(node) => node.id(),
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            NodeRef::Root(_) => NodeKind::Questionnaire,
            NodeRef::Node(node) => node.kind(),
        }
    }

    pub fn children(&self) -> &'a [Node] {
        match self {
            NodeRef::Root(root) => &root.children,
            NodeRef::Node(node) => node.children(),
        }
    }

    pub fn as_node(&self) -> Option<&'a Node> {
        match self {
            NodeRef::Root(_) => None,
            NodeRef::Node(node) => Some(node),
        }
    }
}

use tracing::{debug, warn};

use crate::spec::{
    Choice, ConditionOperator, ConditionSet, Conditional, Description, Entity, EntityType,
    IncludeForm, Node, NodeKind, Note, ProfileField, Question, QuestionType, Questionnaire,
    Reference, RequiredDoc, Section, Subsection, Warning,
};
use crate::xml::ParseError;
use crate::xml::dom::{XmlElement, read_root};

pub const DEFAULT_TITLE: &str = "Untitled Form";
pub const DEFAULT_INCLUDE_TYPE: &str = "online";
pub const DEFAULT_CONDITION: &str = "true";

/// Source of placeholder ids for elements that arrive without one.
///
/// Threaded through the parse call so repeated parses are deterministic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntheticIds {
    next: u64,
}

impl SyntheticIds {
    pub fn starting_at(next: u64) -> Self {
        Self { next }
    }

    pub fn issued(&self) -> u64 {
        self.next
    }

    fn next_id(&mut self) -> String {
        let id = format!("node_{}", self.next);
        self.next += 1;
        id
    }
}

impl Default for SyntheticIds {
    fn default() -> Self {
        Self::starting_at(1)
    }
}

/// Parses questionnaire XML. Lenient: bad attributes default, unknown
/// elements are skipped, and only non-well-formed input or a missing
/// `<questionnaire>` root fails.
pub fn parse_xml(xml: &str) -> Result<Questionnaire, ParseError> {
    parse_xml_with(xml, &mut SyntheticIds::default())
}

pub fn parse_xml_with(xml: &str, ids: &mut SyntheticIds) -> Result<Questionnaire, ParseError> {
    let root = read_root(xml)?
        .filter(|element| element.name == NodeKind::Questionnaire.tag())
        .ok_or(ParseError::MissingRoot)?;

    let mut parser = NodeParser { ids };
    let questionnaire = Questionnaire {
        id: parser.id(&root),
        title: string_or(&root, "title", DEFAULT_TITLE),
        suffix: string_or(&root, "suffix", ""),
        next_id: number::<u64>(&root, "nextid", 1).max(1),
        children: parser.children(&root, NodeKind::Questionnaire),
    };
    debug!(
        id = %questionnaire.id,
        sections = questionnaire.children.len(),
        "parsed questionnaire"
    );
    Ok(questionnaire)
}

struct NodeParser<'a> {
    ids: &'a mut SyntheticIds,
}

impl NodeParser<'_> {
    fn id(&mut self, element: &XmlElement) -> String {
        match element.attr("id") {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => {
                let id = self.ids.next_id();
                warn!(element = %element.name, %id, "element without id, assigned synthetic id");
                id
            }
        }
    }

    fn children(&mut self, element: &XmlElement, parent: NodeKind) -> Vec<Node> {
        let mut nodes = Vec::new();
        for child in &element.children {
            match NodeKind::from_tag(&child.name) {
                Some(kind) if parent.accepts(kind) => nodes.extend(self.node(kind, child)),
                _ => debug!(parent = %parent, element = %child.name, "ignoring element"),
            }
        }
        nodes
    }

    fn node(&mut self, kind: NodeKind, element: &XmlElement) -> Option<Node> {
        if kind == NodeKind::Questionnaire {
            return None;
        }
        let id = self.id(element);
        let node = match kind {
            NodeKind::Section => Node::Section(Section {
                id,
                title: string(element, "title"),
                show_in_bar_admin: flag_unless_false(element, "showinbaradmin"),
                children: self.children(element, kind),
            }),
            NodeKind::Subsection => Node::Subsection(Subsection {
                id,
                title: string(element, "title"),
                show_in_bar_admin: flag_unless_false(element, "showinbaradmin"),
                children: self.children(element, kind),
            }),
            NodeKind::Question => Node::Question(Question {
                id,
                kind: element
                    .attr("type")
                    .map(QuestionType::from)
                    .unwrap_or_default(),
                format: string(element, "format"),
                option: string(element, "option"),
                required: flag(element, "required"),
                trigger_value: string(element, "triggervalue"),
                comment: string(element, "comment"),
                maxlength: number(element, "maxlength", 0),
                refname: string(element, "refname"),
                app_type: string(element, "app_type"),
                app_type_trigger: string(element, "app_type_trigger"),
                is_amended: flag(element, "isamended"),
                validator_class: string(element, "validatorclass"),
                validation_message: string(element, "validationmessage"),
                ncbe_name: string(element, "ncbe_name"),
                ncbe_currently: flag(element, "ncbe_currently"),
                ilg_name: string(element, "ilg_name"),
                children: self.children(element, kind),
            }),
            NodeKind::Entity => Node::Entity(Entity {
                id,
                title: string(element, "title"),
                kind: element
                    .attr("type")
                    .map(EntityType::from)
                    .unwrap_or_default(),
                min: number(element, "min", 0),
                max: number(element, "max", 0),
                next_order: number(element, "nextorder", 1),
                show_in_bar_admin: flag_unless_false(element, "showinbaradmin"),
                is_amended: flag(element, "isamended"),
                group_type: string(element, "grouptype"),
                ncbe_name: string(element, "ncbe_name"),
                ncbe_value: string(element, "ncbe_value"),
                ilg_name: string(element, "ilg_name"),
                ilg_value: string(element, "ilg_value"),
                children: self.children(element, kind),
            }),
            NodeKind::ConditionSet => Node::ConditionSet(ConditionSet {
                id,
                operator: element
                    .attr("operator")
                    .map(ConditionOperator::from)
                    .unwrap_or_default(),
                children: self.children(element, kind),
            }),
            NodeKind::Conditional => Node::Conditional(Conditional {
                id,
                condition: string_or(element, "condition", DEFAULT_CONDITION),
                children: self.children(element, kind),
            }),
            NodeKind::Choice => Node::Choice(Choice {
                id,
                value: string(element, "value"),
                text: element.text(),
            }),
            NodeKind::Description => Node::Description(Description {
                id,
                prefix: string(element, "prefix"),
                text: element.text(),
            }),
            NodeKind::Warning => Node::Warning(Warning {
                id,
                text: element.text(),
            }),
            NodeKind::Note => Node::Note(Note {
                id,
                text: element.text(),
                is_check_item: flag(element, "ischeckitem"),
            }),
            NodeKind::Reference => Node::Reference(Reference {
                id,
                table: string(element, "table"),
                field: element
                    .attr("field")
                    .map(ProfileField::from)
                    .unwrap_or_default(),
            }),
            NodeKind::IncludeForm => Node::IncludeForm(IncludeForm {
                id,
                form_name: string(element, "formname"),
                title: string(element, "title"),
                kind: string_or(element, "type", DEFAULT_INCLUDE_TYPE),
                multiple_include: flag(element, "multipleinclude"),
                required: flag(element, "required"),
            }),
            NodeKind::RequiredDoc => Node::RequiredDoc(RequiredDoc {
                id,
                title: string(element, "title"),
                prevent_submit: flag_unless_false(element, "preventsubmit"),
            }),
            NodeKind::Questionnaire => return None,
        };
        Some(node)
    }
}

fn string(element: &XmlElement, name: &str) -> String {
    string_or(element, name, "")
}

fn string_or(element: &XmlElement, name: &str, default: &str) -> String {
    element.attr(name).unwrap_or(default).to_string()
}

/// Only the literal `true` is true.
fn flag(element: &XmlElement, name: &str) -> bool {
    element.attr(name) == Some("true")
}

/// Anything but the literal `false` is true, absence included.
fn flag_unless_false(element: &XmlElement, name: &str) -> bool {
    element.attr(name) != Some("false")
}

fn number<T>(element: &XmlElement, name: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    element
        .attr(name)
        .and_then(leading_integer)
        .and_then(|digits| digits.parse().ok())
        .unwrap_or(default)
}

/// Leading run of ASCII digits after optional whitespace, so `"12px"`
/// reads as 12 the way lenient integer parsing does.
fn leading_integer(raw: &str) -> Option<&str> {
    let trimmed = raw.trim_start();
    let end = trimmed
        .find(|ch: char| !ch.is_ascii_digit())
        .unwrap_or(trimmed.len());
    if end == 0 { None } else { Some(&trimmed[..end]) }
}

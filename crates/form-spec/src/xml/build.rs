use std::io::{self, Write};

use quick_xml::Writer;
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, Event};
use tracing::error;

use crate::spec::{EntityType, Node, NodeKind, Questionnaire};
use crate::xml::parse::{DEFAULT_CONDITION, DEFAULT_INCLUDE_TYPE};

const INDENT: usize = 4;

/// Renders `doc` as a pretty-printed XML string with a trailing newline.
pub fn build_xml(doc: &Questionnaire) -> String {
    let mut buffer = Vec::new();
    if let Err(err) = write_xml(doc, &mut buffer) {
        error!(%err, "failed to render questionnaire xml");
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

/// Streams `doc` into `sink`.
///
/// Attributes equal to what the reader would assume when they are absent
/// are left out, text-bearing leaves always carry CDATA, and siblings are
/// grouped by element name in order of first appearance.
pub fn write_xml<W: Write>(doc: &Questionnaire, sink: W) -> io::Result<()> {
    let mut writer = Writer::new_with_indent(sink, b' ', INDENT);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut root = BytesStart::new(NodeKind::Questionnaire.tag());
    root.push_attribute(("id", doc.id.as_str()));
    root.push_attribute(("nextid", doc.next_id.to_string().as_str()));
    root.push_attribute(("suffix", doc.suffix.as_str()));
    root.push_attribute(("title", doc.title.as_str()));
    if doc.children.is_empty() {
        writer.write_event(Event::Empty(root))?;
    } else {
        writer.write_event(Event::Start(root))?;
        write_children(&mut writer, &doc.children)?;
        writer.write_event(Event::End(BytesEnd::new(NodeKind::Questionnaire.tag())))?;
    }
    writer.get_mut().write_all(b"\n")
}

fn write_children<W: Write>(writer: &mut Writer<W>, children: &[Node]) -> io::Result<()> {
    let mut groups: Vec<NodeKind> = Vec::new();
    for child in children {
        if !groups.contains(&child.kind()) {
            groups.push(child.kind());
        }
    }
    for kind in groups {
        for child in children.iter().filter(|child| child.kind() == kind) {
            write_node(writer, child)?;
        }
    }
    Ok(())
}

fn write_node<W: Write>(writer: &mut Writer<W>, node: &Node) -> io::Result<()> {
    let tag = node.kind().tag();
    let mut start = BytesStart::new(tag);
    let text = push_attributes(&mut start, node);
    let text = text.filter(|text| !text.is_empty());

    if text.is_none() && node.children().is_empty() {
        return writer.write_event(Event::Empty(start));
    }
    writer.write_event(Event::Start(start))?;
    if let Some(text) = text {
        for section in cdata_sections(text) {
            writer.write_event(Event::CData(BytesCData::new(section)))?;
        }
    }
    write_children(writer, node.children())?;
    writer.write_event(Event::End(BytesEnd::new(tag)))
}

/// Writes the node's attributes and returns its text content, if it has any.
fn push_attributes<'n>(start: &mut BytesStart<'_>, node: &'n Node) -> Option<&'n str> {
    start.push_attribute(("id", node.id()));
    match node {
        Node::Section(section) => {
            text(start, "title", &section.title);
            shown(start, "showinbaradmin", section.show_in_bar_admin);
            None
        }
        Node::Subsection(subsection) => {
            text(start, "title", &subsection.title);
            shown(start, "showinbaradmin", subsection.show_in_bar_admin);
            None
        }
        Node::Question(question) => {
            start.push_attribute(("type", question.kind.as_str()));
            text(start, "format", &question.format);
            text(start, "option", &question.option);
            flag(start, "required", question.required);
            text(start, "triggervalue", &question.trigger_value);
            text(start, "comment", &question.comment);
            number(start, "maxlength", question.maxlength, 0);
            text(start, "refname", &question.refname);
            text(start, "app_type", &question.app_type);
            text(start, "app_type_trigger", &question.app_type_trigger);
            flag(start, "isamended", question.is_amended);
            text(start, "validatorclass", &question.validator_class);
            text(start, "validationmessage", &question.validation_message);
            text(start, "ncbe_name", &question.ncbe_name);
            flag(start, "ncbe_currently", question.ncbe_currently);
            text(start, "ilg_name", &question.ilg_name);
            None
        }
        Node::Entity(entity) => {
            text(start, "title", &entity.title);
            if entity.kind != EntityType::default() {
                start.push_attribute(("type", entity.kind.as_str()));
            }
            number(start, "min", entity.min, 0);
            number(start, "max", entity.max, 0);
            number(start, "nextorder", entity.next_order, 1);
            shown(start, "showinbaradmin", entity.show_in_bar_admin);
            flag(start, "isamended", entity.is_amended);
            text(start, "grouptype", &entity.group_type);
            text(start, "ncbe_name", &entity.ncbe_name);
            text(start, "ncbe_value", &entity.ncbe_value);
            text(start, "ilg_name", &entity.ilg_name);
            text(start, "ilg_value", &entity.ilg_value);
            None
        }
        Node::ConditionSet(set) => {
            start.push_attribute(("operator", set.operator.as_str()));
            None
        }
        Node::Conditional(conditional) => {
            if conditional.condition != DEFAULT_CONDITION {
                start.push_attribute(("condition", conditional.condition.as_str()));
            }
            None
        }
        Node::Choice(choice) => {
            text(start, "value", &choice.value);
            Some(&choice.text)
        }
        Node::Description(description) => {
            text(start, "prefix", &description.prefix);
            Some(&description.text)
        }
        Node::Warning(warning) => Some(&warning.text),
        Node::Note(note) => {
            flag(start, "ischeckitem", note.is_check_item);
            Some(&note.text)
        }
        Node::Reference(reference) => {
            text(start, "table", &reference.table);
            start.push_attribute(("field", reference.field.as_str()));
            None
        }
        Node::IncludeForm(include) => {
            text(start, "formname", &include.form_name);
            text(start, "title", &include.title);
            if include.kind != DEFAULT_INCLUDE_TYPE {
                start.push_attribute(("type", include.kind.as_str()));
            }
            flag(start, "multipleinclude", include.multiple_include);
            flag(start, "required", include.required);
            None
        }
        Node::RequiredDoc(doc) => {
            text(start, "title", &doc.title);
            shown(start, "preventsubmit", doc.prevent_submit);
            None
        }
    }
}

fn text(start: &mut BytesStart<'_>, name: &str, value: &str) {
    if !value.is_empty() {
        start.push_attribute((name, value));
    }
}

fn flag(start: &mut BytesStart<'_>, name: &str, value: bool) {
    if value {
        start.push_attribute((name, "true"));
    }
}

/// For attributes that read as true when absent.
fn shown(start: &mut BytesStart<'_>, name: &str, value: bool) {
    if !value {
        start.push_attribute((name, "false"));
    }
}

fn number(start: &mut BytesStart<'_>, name: &str, value: u32, default: u32) {
    if value != default {
        start.push_attribute((name, value.to_string().as_str()));
    }
}

/// Splits text so no section contains the `]]>` terminator; the pieces
/// concatenate back to the original.
fn cdata_sections(text: &str) -> Vec<&str> {
    let mut sections = Vec::new();
    let mut rest = text;
    while let Some(position) = rest.find("]]>") {
        sections.push(&rest[..position + 2]);
        rest = &rest[position + 2..];
    }
    sections.push(rest);
    sections
}

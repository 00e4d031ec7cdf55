//! String-in, string-out entry points for an embedding host.
//!
//! Documents travel as JSON snapshots. Every function answers with JSON;
//! failures come back as `{"error": "..."}` rather than as a panic.

use serde::Deserialize;
use serde_json::{Value, json};
use thiserror::Error;

use form_spec::{AnswerMap, Node, ProfileField, Questionnaire, outline as form_outline};

use crate::error::EditorError;
use crate::session::Session;
use crate::templates::Template;

#[derive(Debug, Error)]
enum HostError {
    #[error("failed to parse {0}: {1}")]
    Decode(&'static str, #[source] serde_json::Error),
    #[error("json encode error: {0}")]
    JsonEncode(#[source] serde_json::Error),
    #[error(transparent)]
    Editor(#[from] EditorError),
}

/// One edit applied to a document snapshot.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Command {
    Add {
        parent_id: String,
        #[serde(flatten)]
        template: Template,
        #[serde(default)]
        selected: Option<String>,
    },
    AddReference {
        question_id: String,
        field: ProfileField,
    },
    Update {
        id: String,
        node: Node,
    },
    Rename {
        title: String,
    },
    Delete {
        id: String,
    },
    Move {
        id: String,
        parent_id: String,
        index: usize,
    },
    Duplicate {
        id: String,
    },
    RegenerateIds,
}

fn respond(result: Result<Value, HostError>) -> String {
    match result {
        Ok(value) => serde_json::to_string(&value).unwrap_or_else(|error| {
            json!({"error": format!("json encode: {}", error)}).to_string()
        }),
        Err(err) => json!({ "error": err.to_string() }).to_string(),
    }
}

fn respond_string(result: Result<String, HostError>) -> String {
    match result {
        Ok(value) => value,
        Err(err) => json!({ "error": err.to_string() }).to_string(),
    }
}

fn parse_document(doc_json: &str) -> Result<Questionnaire, HostError> {
    serde_json::from_str(doc_json).map_err(|err| HostError::Decode("document", err))
}

fn parse_answers(answers_json: &str) -> AnswerMap {
    serde_json::from_str(answers_json).unwrap_or_default()
}

fn document_value(doc: &Questionnaire) -> Result<Value, HostError> {
    serde_json::to_value(doc).map_err(HostError::JsonEncode)
}

pub fn create(title: &str, suffix: Option<&str>) -> String {
    respond(
        Session::create(title, suffix)
            .map_err(HostError::from)
            .and_then(|session| document_value(session.document())),
    )
}

pub fn import_xml(xml: &str) -> String {
    respond(
        Session::open_xml(xml)
            .map_err(HostError::from)
            .and_then(|session| document_value(session.document())),
    )
}

/// Raw XML on success, an error object otherwise.
pub fn export_xml(doc_json: &str) -> String {
    respond_string(parse_document(doc_json).map(|doc| Session::new(doc).export_xml()))
}

/// Applies `command_json` and returns `{"document": .., "nodeId": ..}`;
/// `nodeId` names the node the edit created or touched, if any.
pub fn apply(doc_json: &str, command_json: &str) -> String {
    respond(parse_document(doc_json).and_then(|doc| {
        let command: Command = serde_json::from_str(command_json)
            .map_err(|err| HostError::Decode("command", err))?;
        let mut session = Session::new(doc);
        let node_id = run(&mut session, command)?;
        Ok(json!({
            "document": document_value(session.document())?,
            "nodeId": node_id,
        }))
    }))
}

fn run(session: &mut Session, command: Command) -> Result<Option<String>, EditorError> {
    let node_id = match command {
        Command::Add {
            parent_id,
            template,
            selected,
        } => {
            session.select(selected.as_deref())?;
            Some(session.add(&parent_id, template)?)
        }
        Command::AddReference { question_id, field } => {
            Some(session.add_reference(&question_id, field)?)
        }
        Command::Update { id, node } => {
            session.update(&id, node)?;
            Some(id)
        }
        Command::Rename { title } => {
            session.rename(&title);
            None
        }
        Command::Delete { id } => {
            session.delete(&id)?;
            None
        }
        Command::Move {
            id,
            parent_id,
            index,
        } => {
            session.move_node(&id, &parent_id, index)?;
            Some(id)
        }
        Command::Duplicate { id } => Some(session.duplicate(&id)?),
        Command::RegenerateIds => {
            session.regenerate_ids();
            None
        }
    };
    Ok(node_id)
}

pub fn visibility(doc_json: &str, answers_json: &str) -> String {
    respond(parse_document(doc_json).and_then(|doc| {
        let answers = parse_answers(answers_json);
        serde_json::to_value(Session::new(doc).visibility(&answers)).map_err(HostError::JsonEncode)
    }))
}

pub fn validate_document(doc_json: &str) -> String {
    respond(parse_document(doc_json).and_then(|doc| {
        serde_json::to_value(Session::new(doc).validate()).map_err(HostError::JsonEncode)
    }))
}

pub fn outline(doc_json: &str) -> String {
    respond(parse_document(doc_json).and_then(|doc| {
        serde_json::to_value(form_outline(&doc)).map_err(HostError::JsonEncode)
    }))
}

pub fn schema() -> String {
    respond(serde_json::to_value(form_spec::schema()).map_err(HostError::JsonEncode))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn created() -> String {
        create("Host Form", Some("54321"))
    }

    #[test]
    fn create_returns_document_json() {
        let value: Value = serde_json::from_str(&created()).expect("json");
        assert_eq!(value["id"], "154321");
        assert_eq!(value["nextId"], 2);
    }

    #[test]
    fn bad_suffix_is_an_error_object() {
        let value: Value = serde_json::from_str(&create("x", Some("1"))).expect("json");
        assert!(value["error"].as_str().unwrap_or_default().contains("5 digits"));
    }

    #[test]
    fn apply_add_then_export() {
        let doc = created();
        let response = apply(&doc, r#"{"op":"add","parentId":"154321","template":"section","title":"Intro"}"#);
        let value: Value = serde_json::from_str(&response).expect("json");
        assert_eq!(value["nodeId"], "254321");
        assert_eq!(value["document"]["children"][0]["nodeType"], "section");
        assert_eq!(
            value["document"]["children"][0]["children"][0]["title"],
            "New Subsection"
        );

        let xml = export_xml(&value["document"].to_string());
        assert!(xml.contains(r#"<section id="254321" title="Intro" showinbaradmin="false">"#));
    }

    #[test]
    fn refused_commands_report_errors() {
        let doc = created();
        let response = apply(&doc, r#"{"op":"delete","id":"154321"}"#);
        let value: Value = serde_json::from_str(&response).expect("json");
        assert_eq!(
            value["error"],
            "the questionnaire root cannot be moved, deleted or duplicated"
        );

        let response = apply(&doc, r#"{"op":"explode"}"#);
        let value: Value = serde_json::from_str(&response).expect("json");
        assert!(value["error"].as_str().unwrap_or_default().starts_with("failed to parse command"));
    }

    #[test]
    fn schema_describes_the_document() {
        let value: Value = serde_json::from_str(&schema()).expect("json");
        assert!(value["properties"]["nextId"].is_object());
    }
}

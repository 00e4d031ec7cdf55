use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::ids::counter_of;
use crate::spec::{Node, NodeKind, Questionnaire};

static SUFFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{5}$").expect("valid regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    pub severity: Severity,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub node_ids: Vec<String>,
}

impl Finding {
    fn error(message: String, node_ids: Vec<String>) -> Self {
        Self {
            severity: Severity::Error,
            message,
            node_ids,
        }
    }

    fn warning(message: String, node_ids: Vec<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message,
            node_ids,
        }
    }
}

/// Read-only data-quality report. Never blocks editing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: usize,
    pub warnings: usize,
    pub findings: Vec<Finding>,
}

impl ValidationReport {
    fn from_findings(findings: Vec<Finding>) -> Self {
        let errors = findings
            .iter()
            .filter(|finding| finding.severity == Severity::Error)
            .count();
        Self {
            valid: errors == 0,
            errors,
            warnings: findings.len() - errors,
            findings,
        }
    }
}

pub fn validate(doc: &Questionnaire) -> ValidationReport {
    let mut all = vec![(doc.id.as_str(), NodeKind::Questionnaire)];
    collect(&doc.children, &mut all);

    let mut findings = Vec::new();

    let mut counts: BTreeMap<&str, Vec<NodeKind>> = BTreeMap::new();
    let mut first_seen: Vec<&str> = Vec::new();
    for (id, kind) in &all {
        let kinds = counts.entry(id).or_default();
        if kinds.is_empty() {
            first_seen.push(id);
        }
        kinds.push(*kind);
    }
    for id in first_seen {
        let kinds = &counts[id];
        if kinds.len() > 1 && !id.trim().is_empty() {
            let names: Vec<&str> = kinds.iter().map(|kind| kind.tag()).collect();
            findings.push(Finding::error(
                format!(
                    "Duplicate ID \"{id}\" found {} times ({})",
                    kinds.len(),
                    names.join(", ")
                ),
                vec![id.to_string()],
            ));
        }
    }

    let empty = all.iter().filter(|(id, _)| id.trim().is_empty()).count();
    if empty > 0 {
        findings.push(Finding::error(
            format!("{empty} node(s) have empty IDs"),
            Vec::new(),
        ));
    }

    for (id, _) in &all {
        if let Some(counter) = counter_of(id, &doc.suffix)
            && counter >= doc.next_id
        {
            findings.push(Finding::warning(
                format!(
                    "ID \"{id}\" >= nextId ({}). nextId should be higher.",
                    doc.next_id
                ),
                vec![id.to_string()],
            ));
        }
    }

    if !SUFFIX.is_match(&doc.suffix) {
        findings.push(Finding::warning(
            format!("Suffix \"{}\" is not a 5 digit number", doc.suffix),
            vec![doc.id.clone()],
        ));
    }

    containment(NodeKind::Questionnaire, &doc.id, &doc.children, &mut findings);

    ValidationReport::from_findings(findings)
}

fn collect<'a>(nodes: &'a [Node], out: &mut Vec<(&'a str, NodeKind)>) {
    for node in nodes {
        out.push((node.id(), node.kind()));
        collect(node.children(), out);
    }
}

fn containment(parent: NodeKind, parent_id: &str, children: &[Node], findings: &mut Vec<Finding>) {
    for child in children {
        if !parent.accepts(child.kind()) {
            findings.push(Finding::error(
                format!(
                    "{} \"{}\" is not allowed inside {parent} \"{parent_id}\"",
                    child.kind(),
                    child.id()
                ),
                vec![child.id().to_string()],
            ));
        }
        containment(child.kind(), child.id(), child.children(), findings);
    }
}

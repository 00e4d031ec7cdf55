use std::collections::BTreeMap;

use tracing::trace;

use crate::spec::{ConditionOperator, ConditionSet, Conditional, Node, Question, Questionnaire};

/// Submitted answers keyed by question id.
pub type AnswerMap = BTreeMap<String, String>;

pub type VisibilityMap = BTreeMap<String, bool>;

const TRUTHY: &[&str] = &["yes", "true", "1"];
const FALSY: &[&str] = &["no", "false", "0"];

/// Exact, case-insensitive, or the same yes/true/1 vs no/false/0 token.
pub fn values_match(value: &str, condition: &str) -> bool {
    value == condition
        || value.eq_ignore_ascii_case(condition)
        || matches!(
            (boolean_token(value), boolean_token(condition)),
            (Some(left), Some(right)) if left == right
        )
}

fn boolean_token(value: &str) -> Option<bool> {
    let lowered = value.trim().to_ascii_lowercase();
    if TRUTHY.contains(&lowered.as_str()) {
        Some(true)
    } else if FALSY.contains(&lowered.as_str()) {
        Some(false)
    } else {
        None
    }
}

/// Visibility of every conditional branch directly inside `set`, keyed by
/// the branch id.
pub fn evaluate_condition_set(set: &ConditionSet, answers: &AnswerMap) -> VisibilityMap {
    let triggers: Vec<&Question> = set
        .children
        .iter()
        .filter_map(|child| match child {
            Node::Question(question) => Some(question),
            _ => None,
        })
        .collect();
    let (else_branches, branches): (Vec<&Conditional>, Vec<&Conditional>) = set
        .children
        .iter()
        .filter_map(|child| match child {
            Node::Conditional(conditional) => Some(conditional),
            _ => None,
        })
        .partition(|conditional| conditional.is_else());

    let answered: Vec<&str> = triggers
        .iter()
        .filter_map(|trigger| answers.get(&trigger.id))
        .map(String::as_str)
        .filter(|value| !value.is_empty())
        .collect();

    let mut map = VisibilityMap::new();
    for branch in &branches {
        let visible = !answered.is_empty()
            && branch_matches(&set.operator, &branch.condition, &triggers, answers);
        map.insert(branch.id.clone(), visible);
    }
    let any_branch = map.values().any(|visible| *visible);
    for branch in &else_branches {
        map.insert(branch.id.clone(), !answered.is_empty() && !any_branch);
    }
    trace!(set = %set.id, operator = %set.operator, ?map, "evaluated condition set");
    map
}

fn branch_matches(
    operator: &ConditionOperator,
    condition: &str,
    triggers: &[&Question],
    answers: &AnswerMap,
) -> bool {
    let answered = || {
        triggers
            .iter()
            .filter_map(|trigger| answers.get(&trigger.id))
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    };
    match operator {
        // Triggers missing from the answer map are skipped; a present but
        // empty answer fails the match.
        ConditionOperator::And => triggers
            .iter()
            .filter_map(|trigger| answers.get(&trigger.id))
            .all(|value| !value.is_empty() && values_match(value, condition)),
        ConditionOperator::Contain => {
            let needle = condition.to_lowercase();
            answered().any(|value| value.to_lowercase().contains(&needle))
        }
        ConditionOperator::Switch => answered().any(|value| switch_matches(value, condition)),
        ConditionOperator::Or
        | ConditionOperator::Smaller
        | ConditionOperator::Else
        | ConditionOperator::Other(_) => answered().any(|value| values_match(value, condition)),
    }
}

/// `condition` is a `;`-delimited list such as `;a;b;`, with or without the
/// wrapping delimiters.
fn switch_matches(value: &str, condition: &str) -> bool {
    condition == value
        || condition
            .split(';')
            .filter(|item| !item.is_empty())
            .any(|item| item == value)
}

/// Visibility of every node in the document. Content under a hidden branch
/// is hidden, nested condition sets included.
pub fn resolve_visibility(doc: &Questionnaire, answers: &AnswerMap) -> VisibilityMap {
    let mut map = VisibilityMap::new();
    walk(&doc.children, true, answers, &mut map);
    map
}

fn walk(nodes: &[Node], visible: bool, answers: &AnswerMap, map: &mut VisibilityMap) {
    for node in nodes {
        map.insert(node.id().to_string(), visible);
        match node {
            Node::ConditionSet(set) => {
                let branches = evaluate_condition_set(set, answers);
                for child in &set.children {
                    match child {
                        Node::Conditional(conditional) => {
                            let shown = visible
                                && branches.get(&conditional.id).copied().unwrap_or(false);
                            map.insert(conditional.id.clone(), shown);
                            walk(&conditional.children, shown, answers, map);
                        }
                        other => walk(std::slice::from_ref(other), visible, answers, map),
                    }
                }
            }
            other => walk(other.children(), visible, answers, map),
        }
    }
}

//! Document-scoped id allocation.
//!
//! Ids are `<counter><suffix>`: the counter comes from the questionnaire's
//! `next_id` and the suffix is a fixed five digit string per document. The
//! root always takes counter 1, so a fresh document starts at `next_id = 2`.

use rand::Rng;
use thiserror::Error;
use tracing::debug;

use crate::spec::{Node, Questionnaire};

pub const SUFFIX_LEN: usize = 5;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdError {
    #[error("suffix '{0}' must be exactly {SUFFIX_LEN} digits")]
    InvalidSuffix(String),
}

pub fn is_valid_suffix(suffix: &str) -> bool {
    suffix.len() == SUFFIX_LEN && suffix.bytes().all(|byte| byte.is_ascii_digit())
}

/// Random suffix in `10000..=99999`, so it never starts with a zero.
pub fn generate_suffix() -> String {
    rand::thread_rng().gen_range(10_000..100_000u32).to_string()
}

/// Creates an empty document whose root id is `1<suffix>`.
pub fn new_questionnaire(
    title: impl Into<String>,
    suffix: Option<&str>,
) -> Result<Questionnaire, IdError> {
    let suffix = match suffix {
        Some(suffix) if is_valid_suffix(suffix) => suffix.to_string(),
        Some(suffix) => return Err(IdError::InvalidSuffix(suffix.to_string())),
        None => generate_suffix(),
    };
    Ok(Questionnaire {
        id: format!("1{suffix}"),
        title: title.into(),
        suffix,
        next_id: 2,
        children: Vec::new(),
    })
}

/// Returns `<next_id><suffix>` and advances the counter. Never idempotent:
/// two calls always yield two different ids.
pub fn allocate_id(doc: &mut Questionnaire) -> String {
    let id = format!("{}{}", doc.next_id, doc.suffix);
    doc.next_id += 1;
    id
}

/// Gives `node` and all its descendants fresh ids, pre-order.
pub fn reassign_ids(doc: &mut Questionnaire, node: &mut Node) {
    *node.id_mut() = allocate_id(doc);
    if let Some(children) = node.children_mut() {
        for child in children.iter_mut() {
            reassign_ids(doc, child);
        }
    }
}

/// Renumbers every node `1<suffix>, 2<suffix>, …` in pre-order, root
/// included, and sets `next_id` one past the last number used.
pub fn regenerate_all_ids(doc: &Questionnaire) -> Questionnaire {
    let mut updated = doc.clone();
    let suffix = updated.suffix.clone();
    let mut counter: u64 = 1;
    updated.id = format!("{counter}{suffix}");
    counter += 1;
    for child in updated.children.iter_mut() {
        renumber(child, &suffix, &mut counter);
    }
    updated.next_id = counter;
    debug!(nodes = counter - 1, "regenerated document ids");
    updated
}

fn renumber(node: &mut Node, suffix: &str, counter: &mut u64) {
    *node.id_mut() = format!("{counter}{suffix}");
    *counter += 1;
    if let Some(children) = node.children_mut() {
        for child in children.iter_mut() {
            renumber(child, suffix, counter);
        }
    }
}

/// Numeric counter of `id` when it carries `suffix`.
pub fn counter_of(id: &str, suffix: &str) -> Option<u64> {
    if suffix.is_empty() {
        return None;
    }
    id.strip_suffix(suffix)
        .filter(|counter| !counter.is_empty())
        .and_then(|counter| counter.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_document_reserves_counter_one() {
        let doc = new_questionnaire("Bar Application", Some("12345")).expect("valid suffix");
        assert_eq!(doc.id, "112345");
        assert_eq!(doc.next_id, 2);
        assert!(doc.children.is_empty());
    }

    #[test]
    fn rejects_bad_suffix() {
        assert_eq!(
            new_questionnaire("x", Some("12a45")),
            Err(IdError::InvalidSuffix("12a45".into()))
        );
        assert!(new_questionnaire("x", Some("1234")).is_err());
    }

    #[test]
    fn random_suffix_is_five_digits() {
        for _ in 0..32 {
            assert!(is_valid_suffix(&generate_suffix()));
        }
    }

    #[test]
    fn allocation_is_monotonic() {
        let mut doc = new_questionnaire("x", Some("55555")).expect("doc");
        let ids: Vec<_> = (0..4).map(|_| allocate_id(&mut doc)).collect();
        assert_eq!(ids, vec!["255555", "355555", "455555", "555555"]);
        assert_eq!(doc.next_id, 6);
    }

    #[test]
    fn counter_parsing() {
        assert_eq!(counter_of("4212345", "12345"), Some(42));
        assert_eq!(counter_of("12345", "12345"), None);
        assert_eq!(counter_of("node_7", "12345"), None);
        assert_eq!(counter_of("4212345", ""), None);
    }
}

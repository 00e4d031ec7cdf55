//! The questionnaire XML dialect: a lenient reader and a compact writer.

mod build;
mod dom;
mod parse;

use thiserror::Error;

pub use build::{build_xml, write_xml};
pub use parse::{
    DEFAULT_CONDITION, DEFAULT_INCLUDE_TYPE, DEFAULT_TITLE, SyntheticIds, parse_xml,
    parse_xml_with,
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("could not parse questionnaire xml: {0}")]
    Malformed(String),
    #[error("could not parse questionnaire xml: no <questionnaire> root element")]
    MissingRoot,
}

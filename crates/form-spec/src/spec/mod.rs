pub mod content;
pub mod form;
pub mod kinds;
pub mod node;
pub mod question;

pub use content::{
    ConditionSet, Conditional, Description, Entity, IncludeForm, Note, RequiredDoc, Warning,
};
pub use form::{Questionnaire, Section, Subsection};
pub use kinds::{ConditionOperator, EntityType, ProfileField, QuestionType};
pub use node::{Node, NodeKind, NodeRef};
pub use question::{Choice, Question, Reference};

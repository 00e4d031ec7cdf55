use thiserror::Error;

use form_spec::{EditError, IdError, NodeKind, ParseError};

#[derive(Debug, Error)]
pub enum EditorError {
    #[error(transparent)]
    Edit(#[from] EditError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Id(#[from] IdError),
    #[error("node '{0}' is not a question")]
    NotAQuestion(String),
    #[error("node '{id}' is a {existing} and cannot be replaced by a {replacement}")]
    KindChanged {
        id: String,
        existing: NodeKind,
        replacement: NodeKind,
    },
    #[error("clipboard is empty")]
    ClipboardEmpty,
    #[error("a {child} from the clipboard cannot be pasted into a {parent}")]
    PasteRejected { parent: NodeKind, child: NodeKind },
    #[error("clipboard content is unreadable: {0}")]
    Clipboard(#[source] serde_json::Error),
    #[error("nothing to undo")]
    NothingToUndo,
    #[error("nothing to redo")]
    NothingToRedo,
}

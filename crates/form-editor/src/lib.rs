pub mod error;
pub mod history;
pub mod host;
pub mod session;
pub mod templates;

pub use error::EditorError;
pub use history::{DEFAULT_MAX_LEVELS, History};
pub use host::Command;
pub use session::{ClipboardEntry, Session};
pub use templates::Template;

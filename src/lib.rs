//! Stagefs: Staged Filesystem Mutations
//!
//! An in-memory staging layer over the real filesystem. Callers read, write,
//! copy, append to, and delete files without touching disk; an explicit
//! commit step reconciles the pending state onto physical storage.

pub mod binary;
pub mod commit;
pub mod concurrency;
pub mod copy;
pub mod delete;
pub mod editor;
pub mod error;
pub mod glob;
pub mod logging;
pub mod reconcile;
pub mod source;
pub mod store;
pub mod template;
pub mod types;

pub use commit::{CommitAction, CommitOutcome, CommitReport};
pub use copy::{ContentProcessor, CopyOptions};
pub use delete::DeleteOptions;
pub use editor::Editor;
pub use error::{CommitError, EditorError};
pub use store::{FileRecord, FileStat, MemoryStore, Store};
pub use template::{PlaceholderEngine, TemplateEngine, TemplateSettings};
pub use types::{FileState, TemplateContext};

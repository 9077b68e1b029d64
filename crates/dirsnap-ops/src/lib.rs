//! Save and restore operations for dirsnap.
//!
//! [`Session`] sequences a save (capture, summarize, confirm, write) or a
//! restore (read, validate, confirm, recreate) and talks to the person
//! running it through the [`Operator`] trait. Nothing on disk changes until
//! the operator confirms.

mod persist;
mod restore;
mod session;

pub use persist::{
    DOCUMENT_EXTENSION, default_document_name, ensure_json_extension, find_default_document,
    read_snapshot, write_snapshot,
};
pub use restore::{RestoreLayout, RestoreReport, Restorer};
pub use session::{
    Operator, Outcome, PROCEED_PROMPT, RestoreRequest, SaveRequest, Session, SessionOptions,
    is_affirmative,
};

pub use dirsnap_codec::Format;

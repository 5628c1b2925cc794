//! Per-user search sessions.
//!
//! Every search binds its results to handles `1..=n`; the handles are carried
//! by the buttons of the results message and resolved when pressed.

mod store;
mod types;

pub use store::SessionStore;
pub use types::{Handle, SearchSession, SessionDraft, SessionError, SessionId};

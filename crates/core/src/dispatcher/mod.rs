//! Dispatching identifiers to the download backend.

mod handle;
mod service;
mod types;

pub use handle::BackendHandle;
pub use service::Dispatcher;
pub use types::{BackendStatus, DispatchError, SUCCESS_MESSAGE};

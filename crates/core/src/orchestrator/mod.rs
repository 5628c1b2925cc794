//! Bot orchestrator.
//!
//! Routes every inbound chat event through the access guard and then to the
//! matching interaction:
//! - `/start`, `/search`, `/download`, `/active` commands
//! - numbered download buttons attached to search results
//!
//! Each event runs on its own task, so a slow search or backend call never
//! holds up other users.

mod command;
mod config;
mod event_loop;
pub mod replies;
mod runner;

pub use command::{download_payload, ButtonAction, Command, DOWNLOAD_PAYLOAD_PREFIX};
pub use config::OrchestratorConfig;
pub use event_loop::run_event_loop;
pub use runner::BotOrchestrator;

//! Chat transport abstraction.
//!
//! The orchestrator talks to users through `ChatTransport` (outbound) and
//! receives their commands and button presses from an `EventSource`.
//! `TelegramTransport` implements both over the Telegram Bot API.

mod telegram;
mod types;

pub use telegram::TelegramTransport;
pub use types::*;

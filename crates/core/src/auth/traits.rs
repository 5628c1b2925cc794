use thiserror::Error;

use crate::chat::UserId;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

/// Decides whether a chat user may use the bot.
pub trait AccessGuard: Send + Sync {
    /// True when `user` may issue commands and press buttons.
    fn authorize(&self, user: UserId) -> bool;

    /// Name of this guard for logging
    fn method_name(&self) -> &'static str;
}

mod allow_list;
mod traits;

pub use allow_list::*;
pub use traits::*;

use tracing::warn;

use crate::chat::UserId;
use crate::config::AccessConfig;

/// Factory function to create the access guard from config
pub fn create_access_guard(config: &AccessConfig) -> Result<Box<dyn AccessGuard>, AuthError> {
    if config.allowed_users.iter().any(|id| *id == 0) {
        return Err(AuthError::ConfigurationError(
            "allowed_users must not contain 0".to_string(),
        ));
    }
    if config.allowed_users.is_empty() {
        warn!("access.allowed_users is empty; every user will be denied");
    }
    Ok(Box::new(AllowListGuard::new(
        config.allowed_users.iter().copied().map(UserId),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_access_guard() {
        let config = AccessConfig {
            allowed_users: vec![123456789, 987654321],
        };
        let guard = create_access_guard(&config).unwrap();
        assert_eq!(guard.method_name(), "allow_list");
        assert!(guard.authorize(UserId(123456789)));
        assert!(!guard.authorize(UserId(42)));
    }

    #[test]
    fn test_create_access_guard_empty_denies_all() {
        let guard = create_access_guard(&AccessConfig::default()).unwrap();
        assert!(!guard.authorize(UserId(123456789)));
    }

    #[test]
    fn test_create_access_guard_rejects_zero_id() {
        let config = AccessConfig {
            allowed_users: vec![0, 5],
        };
        let result = create_access_guard(&config);
        assert!(matches!(result, Err(AuthError::ConfigurationError(_))));
    }
}

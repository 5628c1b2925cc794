use std::collections::HashSet;

use super::{AccessGuard, UserId};

/// Guard that admits only an explicit set of user ids.
/// An empty set admits nobody.
#[derive(Debug, Clone)]
pub struct AllowListGuard {
    allowed: HashSet<UserId>,
}

impl AllowListGuard {
    pub fn new(allowed: impl IntoIterator<Item = UserId>) -> Self {
        Self {
            allowed: allowed.into_iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.allowed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.allowed.is_empty()
    }
}

impl AccessGuard for AllowListGuard {
    fn authorize(&self, user: UserId) -> bool {
        self.allowed.contains(&user)
    }

    fn method_name(&self) -> &'static str {
        "allow_list"
    }
}

//! User and owner identity types.
//!
//! An `Owner` is the proof that a caller passed authentication. Task and
//! dashboard operations take `&Owner`, never a bare `UserId`, so only the
//! identity service can mint one.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier of one registered user.
pub type UserId = Uuid;

/// Registered account, without credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: Option<String>,
    /// Unix epoch milliseconds, UTC.
    pub created_at: i64,
}

/// Authenticated owner context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Owner {
    user_id: UserId,
    username: String,
}

impl Owner {
    pub(crate) fn authenticated(user: &User) -> Self {
        Self {
            user_id: user.id,
            username: user.username.clone(),
        }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn username(&self) -> &str {
        &self.username
    }
}

use serde::{Deserialize, Serialize};

use crate::model::{api::id::ApiId, db::User};

/// Public user info. Everything else (password hash, privilege level) stays
/// out of API responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDescription {
    pub id: ApiId,
    pub username: String,
}

impl From<User> for UserDescription {
    fn from(user: User) -> Self {
        Self {
            id: user.id.into(),
            username: user.user.username,
        }
    }
}

use serde::{Deserialize, Serialize};

use crate::model::Id;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Id,
    pub username: String,
    pub nickname: String,
}

impl User {
    /// Placeholder for an editor whose account no longer resolves
    /// (deleted or anonymized). Deterministic per id.
    pub fn ghost(id: Id) -> Self {
        Self {
            id,
            username: ghost_username(id),
            nickname: "deleted or missing user".to_string(),
        }
    }
}

pub fn ghost_username(id: Id) -> String {
    format!("deleted_user_{}", id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ghost_is_deterministic() {
        assert_eq!(User::ghost(42), User::ghost(42));
        assert_eq!(User::ghost(42).username, "deleted_user_42");
        assert_ne!(ghost_username(1), ghost_username(2));
    }
}

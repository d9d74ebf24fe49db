use serde::{Deserialize, Serialize};

use crate::model::Id;

/// Permission flags granted to a caller by the auth layer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Permissions {
    pub wiki_edit: bool,
}

impl Permissions {
    /// Parse a comma-separated flag list such as `wiki_edit,foo`.
    /// Unknown flags are ignored.
    pub fn parse(raw: &str) -> Self {
        let mut permissions = Self::default();
        for flag in raw.split(',').map(str::trim) {
            if flag == "wiki_edit" {
                permissions.wiki_edit = true;
            }
        }
        permissions
    }
}

/// Caller identity extracted from request headers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserContext {
    pub user_id: Option<Id>,
    pub permissions: Permissions,
}

impl UserContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn with_permissions(user_id: Id, permissions: Permissions) -> Self {
        Self {
            user_id: Some(user_id),
            permissions,
        }
    }

    /// A logged-in wiki editor
    pub fn editor(user_id: Id) -> Self {
        Self::with_permissions(user_id, Permissions { wiki_edit: true })
    }

    /// Returns the caller id when they may edit wiki pages
    pub fn wiki_editor_id(&self) -> Option<Id> {
        match self.user_id {
            Some(id) if self.permissions.wiki_edit => Some(id),
            _ => None,
        }
    }
}

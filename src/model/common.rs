use serde::{Deserialize, Serialize};

use crate::error::WikiError;

/// Identifier of every wiki row: entities, users, revisions and revision texts.
pub type Id = i64;

pub const DEFAULT_PAGE_LIMIT: i64 = 20;
pub const MAX_PAGE_LIMIT: i64 = 100;

/// Validated limit/offset window over a result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub limit: i64,
    pub offset: i64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            limit: DEFAULT_PAGE_LIMIT,
            offset: 0,
        }
    }
}

impl Pagination {
    pub fn new(limit: Option<i64>, offset: Option<i64>) -> Result<Self, WikiError> {
        let limit = limit.unwrap_or(DEFAULT_PAGE_LIMIT);
        let offset = offset.unwrap_or(0);

        if !(1..=MAX_PAGE_LIMIT).contains(&limit) {
            return Err(WikiError::InvalidArgument(format!(
                "limit must be between 1 and {}, got {}",
                MAX_PAGE_LIMIT, limit
            )));
        }
        if offset < 0 {
            return Err(WikiError::InvalidArgument(format!(
                "offset must not be negative, got {}",
                offset
            )));
        }

        Ok(Self { limit, offset })
    }
}

/// One page of rows plus the number of rows matching before pagination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PagedResult<T> {
    pub total: i64,
    pub data: Vec<T>,
}

/// Cross-reference to another wiki row with its display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlimRef {
    pub id: Id,
    pub name: String,
}

/// Fails with `InvalidArgument` unless `id` is a positive integer.
pub fn ensure_positive_id(what: &str, id: Id) -> Result<Id, WikiError> {
    if id <= 0 {
        return Err(WikiError::InvalidArgument(format!(
            "{} must be a positive integer, got {}",
            what, id
        )));
    }
    Ok(id)
}

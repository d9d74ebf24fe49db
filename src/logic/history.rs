use itertools::Itertools;
use std::collections::HashMap;

use crate::error::WikiError;
use crate::model::{
    ensure_positive_id, Creator, Id, PagedResult, Pagination, RevisionFamily,
    RevisionHistoryEntry, RevisionType, User,
};
use crate::store::{NameStore, RevisionStore};

/// Paginated edit history of `target_id`, restricted to `types`, newest first.
///
/// `total` counts every matching revision regardless of the page window.
/// Editors that no longer resolve are shown under their ghost username.
pub async fn query_history<S>(
    store: &S,
    target_id: Id,
    types: &[RevisionType],
    page: Pagination,
) -> Result<PagedResult<RevisionHistoryEntry>, WikiError>
where
    S: RevisionStore + NameStore + ?Sized,
{
    ensure_positive_id("target id", target_id)?;
    ensure_single_family(types)?;

    let total = store.count_revisions(target_id, types).await?;
    if page.offset >= total {
        return Ok(PagedResult {
            total,
            data: Vec::new(),
        });
    }

    let revisions = store
        .list_revisions(target_id, types, page.limit, page.offset)
        .await?;

    let creator_ids: Vec<Id> = revisions.iter().map(|r| r.creator_id).unique().collect();
    let users = resolve_users(store, &creator_ids).await;

    let data = revisions
        .into_iter()
        .map(|revision| {
            let username = match users.get(&revision.creator_id) {
                Some(user) => user.username.clone(),
                None => {
                    log::debug!(
                        "editor {} of revision {} not found, using ghost user",
                        revision.creator_id,
                        revision.id
                    );
                    User::ghost(revision.creator_id).username
                }
            };
            RevisionHistoryEntry {
                id: revision.id,
                creator: Creator { username },
                created_at: revision.created_at,
                commit_message: revision.commit_message,
            }
        })
        .collect();

    Ok(PagedResult { total, data })
}

/// History of every revision type in `family`
pub async fn family_history<S>(
    store: &S,
    target_id: Id,
    family: RevisionFamily,
    page: Pagination,
) -> Result<PagedResult<RevisionHistoryEntry>, WikiError>
where
    S: RevisionStore + NameStore + ?Sized,
{
    query_history(store, target_id, family.tags(), page).await
}

fn ensure_single_family(types: &[RevisionType]) -> Result<RevisionFamily, WikiError> {
    let Some(first) = types.first() else {
        return Err(WikiError::InvalidArgument(
            "at least one revision type is required".to_string(),
        ));
    };

    let family = first.family();
    if let Some(other) = types.iter().find(|t| t.family() != family) {
        return Err(WikiError::InvalidArgument(format!(
            "revision type {} does not belong to {:?} history",
            other, family
        )));
    }
    Ok(family)
}

/// User lookup never fails the history query; on a store error every
/// editor falls back to the ghost user.
async fn resolve_users<S>(store: &S, ids: &[Id]) -> HashMap<Id, User>
where
    S: NameStore + ?Sized,
{
    match store.fetch_users(ids).await {
        Ok(users) => users,
        Err(e) => {
            log::warn!("user lookup failed, showing ghost users: {:#}", e);
            HashMap::new()
        }
    }
}

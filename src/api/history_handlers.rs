use axum::{extract::State, response::Json};

use crate::api::extract::{WikiPath, WikiQuery};
use crate::api::handlers::{api_error, ApiError, AppState, PageQuery};
use crate::logic::{family_history, load_revision_detail};
use crate::model::{Id, PagedResult, RevisionDetailResponse, RevisionFamily, RevisionHistoryEntry};
use crate::store::traits::Store;

pub type HistoryResponse = Result<Json<PagedResult<RevisionHistoryEntry>>, ApiError>;
pub type RevisionResponse = Result<Json<RevisionDetailResponse>, ApiError>;

async fn history<S: Store>(
    store: &S,
    target_id: Id,
    family: RevisionFamily,
    query: PageQuery,
) -> HistoryResponse {
    let page = query.pagination()?;
    family_history(store, target_id, family, page)
        .await
        .map(Json)
        .map_err(api_error)
}

async fn revision<S: Store>(store: &S, revision_id: Id, family: RevisionFamily) -> RevisionResponse {
    load_revision_detail(store, revision_id, family)
        .await
        .map(Json)
        .map_err(api_error)
}

/// GET /p1/wiki/persons/{person_id}/history-summary
pub async fn person_history<S: Store>(
    WikiPath(person_id): WikiPath<Id>,
    WikiQuery(query): WikiQuery<PageQuery>,
    State(store): State<AppState<S>>,
) -> HistoryResponse {
    history(&*store, person_id, RevisionFamily::Person, query).await
}

/// GET /p1/wiki/characters/{character_id}/history-summary
pub async fn character_history<S: Store>(
    WikiPath(character_id): WikiPath<Id>,
    WikiQuery(query): WikiQuery<PageQuery>,
    State(store): State<AppState<S>>,
) -> HistoryResponse {
    history(&*store, character_id, RevisionFamily::Character, query).await
}

/// GET /p1/wiki/subjects/{subject_id}/history-summary
pub async fn subject_history<S: Store>(
    WikiPath(subject_id): WikiPath<Id>,
    WikiQuery(query): WikiQuery<PageQuery>,
    State(store): State<AppState<S>>,
) -> HistoryResponse {
    history(&*store, subject_id, RevisionFamily::Subject, query).await
}

/// GET /p1/wiki/characters/{character_id}/subjects/history-summary
pub async fn character_subjects_history<S: Store>(
    WikiPath(character_id): WikiPath<Id>,
    WikiQuery(query): WikiQuery<PageQuery>,
    State(store): State<AppState<S>>,
) -> HistoryResponse {
    history(&*store, character_id, RevisionFamily::CharacterSubjects, query).await
}

/// GET /p1/wiki/characters/{character_id}/casts/history-summary
pub async fn character_casts_history<S: Store>(
    WikiPath(character_id): WikiPath<Id>,
    WikiQuery(query): WikiQuery<PageQuery>,
    State(store): State<AppState<S>>,
) -> HistoryResponse {
    history(&*store, character_id, RevisionFamily::CharacterCasts, query).await
}

/// GET /p1/wiki/persons/{person_id}/casts/history-summary
pub async fn person_casts_history<S: Store>(
    WikiPath(person_id): WikiPath<Id>,
    WikiQuery(query): WikiQuery<PageQuery>,
    State(store): State<AppState<S>>,
) -> HistoryResponse {
    history(&*store, person_id, RevisionFamily::PersonCasts, query).await
}

/// GET /p1/wiki/persons/{person_id}/subjects/history-summary
pub async fn person_subjects_history<S: Store>(
    WikiPath(person_id): WikiPath<Id>,
    WikiQuery(query): WikiQuery<PageQuery>,
    State(store): State<AppState<S>>,
) -> HistoryResponse {
    history(&*store, person_id, RevisionFamily::PersonSubjects, query).await
}

/// GET /p1/wiki/persons/-/revisions/{revision_id}
pub async fn person_revision<S: Store>(
    WikiPath(revision_id): WikiPath<Id>,
    State(store): State<AppState<S>>,
) -> RevisionResponse {
    revision(&*store, revision_id, RevisionFamily::Person).await
}

/// GET /p1/wiki/characters/-/revisions/{revision_id}
pub async fn character_revision<S: Store>(
    WikiPath(revision_id): WikiPath<Id>,
    State(store): State<AppState<S>>,
) -> RevisionResponse {
    revision(&*store, revision_id, RevisionFamily::Character).await
}

/// GET /p1/wiki/subjects/-/revisions/{revision_id}
pub async fn subject_revision<S: Store>(
    WikiPath(revision_id): WikiPath<Id>,
    State(store): State<AppState<S>>,
) -> RevisionResponse {
    revision(&*store, revision_id, RevisionFamily::Subject).await
}

/// GET /p1/wiki/characters/-/subjects/revisions/{revision_id}
pub async fn character_subjects_revision<S: Store>(
    WikiPath(revision_id): WikiPath<Id>,
    State(store): State<AppState<S>>,
) -> RevisionResponse {
    revision(&*store, revision_id, RevisionFamily::CharacterSubjects).await
}

/// GET /p1/wiki/characters/-/casts/revisions/{revision_id}
pub async fn character_casts_revision<S: Store>(
    WikiPath(revision_id): WikiPath<Id>,
    State(store): State<AppState<S>>,
) -> RevisionResponse {
    revision(&*store, revision_id, RevisionFamily::CharacterCasts).await
}

/// GET /p1/wiki/persons/-/casts/revisions/{revision_id}
pub async fn person_casts_revision<S: Store>(
    WikiPath(revision_id): WikiPath<Id>,
    State(store): State<AppState<S>>,
) -> RevisionResponse {
    revision(&*store, revision_id, RevisionFamily::PersonCasts).await
}

/// GET /p1/wiki/persons/-/subjects/revisions/{revision_id}
pub async fn person_subjects_revision<S: Store>(
    WikiPath(revision_id): WikiPath<Id>,
    State(store): State<AppState<S>>,
) -> RevisionResponse {
    revision(&*store, revision_id, RevisionFamily::PersonSubjects).await
}

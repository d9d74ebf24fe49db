use axum::{routing::get, Router};
use std::sync::Arc;

use crate::api::{handlers, history_handlers, wiki_handlers};
use crate::store::traits::Store;

pub fn create_router<S: Store + 'static>() -> Router<Arc<S>> {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Person wiki
        .route(
            "/p1/wiki/persons/:person_id",
            get(wiki_handlers::get_person::<S>).patch(wiki_handlers::patch_person::<S>),
        )
        .route(
            "/p1/wiki/persons/:person_id/history-summary",
            get(history_handlers::person_history::<S>),
        )
        .route(
            "/p1/wiki/persons/:person_id/casts/history-summary",
            get(history_handlers::person_casts_history::<S>),
        )
        .route(
            "/p1/wiki/persons/:person_id/subjects/history-summary",
            get(history_handlers::person_subjects_history::<S>),
        )
        .route(
            "/p1/wiki/persons/-/revisions/:revision_id",
            get(history_handlers::person_revision::<S>),
        )
        .route(
            "/p1/wiki/persons/-/casts/revisions/:revision_id",
            get(history_handlers::person_casts_revision::<S>),
        )
        .route(
            "/p1/wiki/persons/-/subjects/revisions/:revision_id",
            get(history_handlers::person_subjects_revision::<S>),
        )
        // Character wiki
        .route(
            "/p1/wiki/characters/:character_id",
            get(wiki_handlers::get_character::<S>).patch(wiki_handlers::patch_character::<S>),
        )
        .route(
            "/p1/wiki/characters/:character_id/history-summary",
            get(history_handlers::character_history::<S>),
        )
        .route(
            "/p1/wiki/characters/:character_id/subjects/history-summary",
            get(history_handlers::character_subjects_history::<S>),
        )
        .route(
            "/p1/wiki/characters/:character_id/casts/history-summary",
            get(history_handlers::character_casts_history::<S>),
        )
        .route(
            "/p1/wiki/characters/-/revisions/:revision_id",
            get(history_handlers::character_revision::<S>),
        )
        .route(
            "/p1/wiki/characters/-/subjects/revisions/:revision_id",
            get(history_handlers::character_subjects_revision::<S>),
        )
        .route(
            "/p1/wiki/characters/-/casts/revisions/:revision_id",
            get(history_handlers::character_casts_revision::<S>),
        )
        // Subject wiki
        .route(
            "/p1/wiki/subjects/:subject_id",
            get(wiki_handlers::get_subject::<S>).patch(wiki_handlers::patch_subject::<S>),
        )
        .route(
            "/p1/wiki/subjects/:subject_id/history-summary",
            get(history_handlers::subject_history::<S>),
        )
        .route(
            "/p1/wiki/subjects/-/revisions/:revision_id",
            get(history_handlers::subject_revision::<S>),
        )
}

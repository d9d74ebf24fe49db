use axum::{extract::State, response::Json};
use serde::Deserialize;

use crate::api::extract::{WikiJson, WikiPath};
use crate::api::handlers::{api_error, ApiError, AppState};
use crate::error::WikiError;
use crate::logic::{edit_character, edit_person, edit_subject, EditOutcome, EditRequest, ExpectedFieldSet};
use crate::model::{
    ensure_positive_id, Character, EntityKind, Id, MonoPatch, Person, Subject, SubjectPatch,
    UserContext,
};
use crate::store::traits::Store;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonEditRequest {
    pub commit_message: String,
    #[serde(default)]
    pub expected_revision: ExpectedFieldSet,
    pub person: MonoPatch,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterEditRequest {
    pub commit_message: String,
    #[serde(default)]
    pub expected_revision: ExpectedFieldSet,
    pub character: MonoPatch,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectEditRequest {
    pub commit_message: String,
    #[serde(default)]
    pub expected_revision: ExpectedFieldSet,
    pub subject: SubjectPatch,
}

fn found<E>(row: anyhow::Result<Option<E>>, kind: EntityKind, id: Id) -> Result<E, ApiError> {
    match row {
        Ok(Some(entity)) => Ok(entity),
        Ok(None) => Err(api_error(WikiError::NotFound(format!("{} {}", kind, id)))),
        Err(e) => Err(api_error(e.into())),
    }
}

/// GET /p1/wiki/persons/{person_id}
pub async fn get_person<S: Store>(
    WikiPath(person_id): WikiPath<Id>,
    State(store): State<AppState<S>>,
) -> Result<Json<Person>, ApiError> {
    ensure_positive_id("person id", person_id).map_err(api_error)?;
    let person = found(store.get_person(person_id).await, EntityKind::Person, person_id)?;
    Ok(Json(person))
}

/// PATCH /p1/wiki/persons/{person_id}
pub async fn patch_person<S: Store>(
    WikiPath(person_id): WikiPath<Id>,
    State(store): State<AppState<S>>,
    ctx: UserContext,
    WikiJson(req): WikiJson<PersonEditRequest>,
) -> Result<Json<EditOutcome<Person>>, ApiError> {
    let request = EditRequest {
        commit_message: req.commit_message,
        expected: req.expected_revision,
        patch: req.person,
    };
    edit_person(&*store, &ctx, person_id, request)
        .await
        .map(Json)
        .map_err(api_error)
}

/// GET /p1/wiki/characters/{character_id}
pub async fn get_character<S: Store>(
    WikiPath(character_id): WikiPath<Id>,
    State(store): State<AppState<S>>,
) -> Result<Json<Character>, ApiError> {
    ensure_positive_id("character id", character_id).map_err(api_error)?;
    let character = found(
        store.get_character(character_id).await,
        EntityKind::Character,
        character_id,
    )?;
    Ok(Json(character))
}

/// PATCH /p1/wiki/characters/{character_id}
pub async fn patch_character<S: Store>(
    WikiPath(character_id): WikiPath<Id>,
    State(store): State<AppState<S>>,
    ctx: UserContext,
    WikiJson(req): WikiJson<CharacterEditRequest>,
) -> Result<Json<EditOutcome<Character>>, ApiError> {
    let request = EditRequest {
        commit_message: req.commit_message,
        expected: req.expected_revision,
        patch: req.character,
    };
    edit_character(&*store, &ctx, character_id, request)
        .await
        .map(Json)
        .map_err(api_error)
}

/// GET /p1/wiki/subjects/{subject_id}
pub async fn get_subject<S: Store>(
    WikiPath(subject_id): WikiPath<Id>,
    State(store): State<AppState<S>>,
) -> Result<Json<Subject>, ApiError> {
    ensure_positive_id("subject id", subject_id).map_err(api_error)?;
    let subject = found(store.get_subject(subject_id).await, EntityKind::Subject, subject_id)?;
    Ok(Json(subject))
}

/// PATCH /p1/wiki/subjects/{subject_id}
pub async fn patch_subject<S: Store>(
    WikiPath(subject_id): WikiPath<Id>,
    State(store): State<AppState<S>>,
    ctx: UserContext,
    WikiJson(req): WikiJson<SubjectEditRequest>,
) -> Result<Json<EditOutcome<Subject>>, ApiError> {
    let request = EditRequest {
        commit_message: req.commit_message,
        expected: req.expected_revision,
        patch: req.subject,
    };
    edit_subject(&*store, &ctx, subject_id, request)
        .await
        .map(Json)
        .map_err(api_error)
}

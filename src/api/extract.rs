//! Extractors that report malformed input as `INVALID_ARGUMENT`.
//!
//! axum's own `Path`, `Query` and `Json` reject with plain-text bodies (and
//! 422 for a body that does not fit the request type). These wrappers keep
//! the `{ "code", "error" }` shape for every client error.

use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Path, Query, Request},
    http::request::Parts,
    Json,
};
use serde::de::DeserializeOwned;

use crate::api::handlers::{api_error, ApiError};
use crate::error::WikiError;

/// Path parameters, e.g. `WikiPath(person_id): WikiPath<Id>`
#[derive(Debug, Clone, Copy)]
pub struct WikiPath<T>(pub T);

/// Query string parameters
#[derive(Debug, Clone, Default)]
pub struct WikiQuery<T>(pub T);

/// JSON request body
#[derive(Debug, Clone)]
pub struct WikiJson<T>(pub T);

pub(crate) fn invalid_argument(message: impl Into<String>) -> ApiError {
    api_error(WikiError::InvalidArgument(message.into()))
}

#[async_trait]
impl<S, T> FromRequestParts<S> for WikiPath<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Send,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Path::<T>::from_request_parts(parts, state)
            .await
            .map(|Path(value)| WikiPath(value))
            .map_err(|rejection| invalid_argument(rejection.body_text()))
    }
}

#[async_trait]
impl<S, T> FromRequestParts<S> for WikiQuery<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Query::<T>::from_request_parts(parts, state)
            .await
            .map(|Query(value)| WikiQuery(value))
            .map_err(|rejection| invalid_argument(rejection.body_text()))
    }
}

#[async_trait]
impl<S, T> FromRequest<S> for WikiJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        Json::<T>::from_request(req, state)
            .await
            .map(|Json(value)| WikiJson(value))
            .map_err(|rejection| invalid_argument(rejection.body_text()))
    }
}

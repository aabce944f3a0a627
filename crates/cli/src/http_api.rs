use crate::service::Service;
use axum::{
    body::Bytes,
    extract::State,
    http::{header::CONTENT_TYPE, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use kanaja_protocol::{serialize_json, ErrorEnvelope, SearchRequest, StoreRequest};
use kanaja_vector_store::{ErrorKind, VectorStoreError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

pub(crate) fn router(service: Arc<Service>) -> Router {
    Router::new()
        .route("/store", post(store_handler))
        .route("/search", post(search_handler))
        .route("/health", get(health_handler))
        .with_state(service)
}

pub(crate) async fn store_handler(State(service): State<Arc<Service>>, body: Bytes) -> Response {
    let request: StoreRequest = match decode(&body) {
        Ok(request) => request,
        Err(response) => return response,
    };
    run_blocking(move || service.store(&request)).await
}

pub(crate) async fn search_handler(State(service): State<Arc<Service>>, body: Bytes) -> Response {
    let request: SearchRequest = match decode(&body) {
        Ok(request) => request,
        Err(response) => return response,
    };
    run_blocking(move || service.search(&request)).await
}

pub(crate) async fn health_handler(State(service): State<Arc<Service>>) -> Response {
    build_response(StatusCode::OK, &service.health())
}

fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, Response> {
    serde_json::from_slice(body).map_err(|err| {
        build_response(
            StatusCode::BAD_REQUEST,
            &ErrorEnvelope::new("invalid_request", err.to_string()).with_hint(
                "Verify the request is valid JSON and matches the request schema.",
            ),
        )
    })
}

async fn run_blocking<T, F>(work: F) -> Response
where
    T: Serialize + Send + 'static,
    F: FnOnce() -> Result<T, VectorStoreError> + Send + 'static,
{
    match tokio::task::spawn_blocking(work).await {
        Ok(Ok(value)) => build_response(StatusCode::OK, &value),
        Ok(Err(err)) => error_response(&err),
        Err(join_err) => {
            log::error!("Request worker failed: {join_err}");
            build_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &ErrorEnvelope::new("internal", join_err.to_string()),
            )
        }
    }
}

pub(crate) fn error_response(err: &VectorStoreError) -> Response {
    let kind = err.kind();
    let status = status_for(kind);
    if status.is_server_error() {
        log::error!("Request failed: {err}");
    } else {
        log::debug!("Request rejected ({}): {err}", kind.code());
    }

    let mut envelope = ErrorEnvelope::new(kind.code(), err.to_string());
    if let Some(hint) = hint_for(kind) {
        envelope = envelope.with_hint(hint);
    }
    build_response(status, &envelope)
}

pub(crate) const fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::DuplicateId => StatusCode::CONFLICT,
        ErrorKind::DuplicateKey | ErrorKind::WordTable | ErrorKind::SerializationFailure => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        ErrorKind::EmptyInput
        | ErrorKind::NoKnownWords
        | ErrorKind::InvalidK
        | ErrorKind::DimensionMismatch
        | ErrorKind::ZeroVector
        | ErrorKind::NonFiniteVector
        | ErrorKind::UnknownAlgorithm => StatusCode::BAD_REQUEST,
    }
}

const fn hint_for(kind: ErrorKind) -> Option<&'static str> {
    match kind {
        ErrorKind::UnknownAlgorithm => {
            Some("Use \"exact\" (or \"knn\") or \"approximate\" (or \"ann\").")
        }
        ErrorKind::InvalidK => Some("Set \"k\" to a positive integer."),
        ErrorKind::NoKnownWords => {
            Some("Include at least one word present in the word table.")
        }
        _ => None,
    }
}

pub(crate) fn build_response<T: Serialize>(status: StatusCode, body: &T) -> Response {
    match serialize_json(body) {
        Ok(json) => (status, [(CONTENT_TYPE, "application/json")], json).into_response(),
        Err(err) => {
            log::error!("Failed to encode response: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

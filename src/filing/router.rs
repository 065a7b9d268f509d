use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde_json::json;

use super::domain::{Entity, EntityId, FilingStatus};
use super::service::FilingService;
use super::FilingError;

/// Router exposing fact intake and classification endpoints.
pub fn filing_router(service: Arc<FilingService>) -> Router {
    Router::new()
        .route("/api/v1/filing/entities", get(list_entities_handler))
        .route(
            "/api/v1/filing/entities/:entity_id",
            get(properties_handler)
                .put(put_facts_handler)
                .delete(remove_facts_handler),
        )
        .route(
            "/api/v1/filing/entities/:entity_id/verdict",
            get(verdict_handler),
        )
        .route("/api/v1/filing/status/:status", get(status_handler))
        .route("/api/v1/filing/classify", post(classify_handler))
        .route("/api/v1/filing/rules", get(rules_handler))
        .with_state(service)
}

pub(crate) async fn put_facts_handler(
    State(service): State<Arc<FilingService>>,
    Path(entity_id): Path<String>,
    payload: Result<axum::Json<Entity>, JsonRejection>,
) -> Response {
    let mut entity = match payload {
        Ok(axum::Json(entity)) => entity,
        Err(rejection) => return rejection_response(rejection),
    };
    entity.id = EntityId(entity_id);
    match service.set_facts(entity.clone()) {
        Ok(previous) => {
            let status = if previous.is_some() {
                StatusCode::OK
            } else {
                StatusCode::CREATED
            };
            (status, axum::Json(entity)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn remove_facts_handler(
    State(service): State<Arc<FilingService>>,
    Path(entity_id): Path<String>,
) -> Response {
    match service.remove(&EntityId(entity_id)) {
        Ok(removed) => (StatusCode::OK, axum::Json(removed)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn list_entities_handler(State(service): State<Arc<FilingService>>) -> Response {
    match service.entity_ids() {
        Ok(ids) => (StatusCode::OK, axum::Json(json!({ "entities": ids }))).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn properties_handler(
    State(service): State<Arc<FilingService>>,
    Path(entity_id): Path<String>,
) -> Response {
    let id = EntityId(entity_id);
    match service.properties(&id) {
        Ok(properties) => (
            StatusCode::OK,
            axum::Json(json!({ "entity_id": id, "properties": properties })),
        )
            .into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn verdict_handler(
    State(service): State<Arc<FilingService>>,
    Path(entity_id): Path<String>,
) -> Response {
    match service.classify(&EntityId(entity_id)) {
        Ok(verdict) => (StatusCode::OK, axum::Json(verdict.report())).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn status_handler(
    State(service): State<Arc<FilingService>>,
    Path(status): Path<String>,
) -> Response {
    let Some(filing_status) = FilingStatus::parse(&status) else {
        let payload = json!({
            "error": format!("unknown filing status '{status}' (expected must_file, optional or no_filing)"),
        });
        return (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response();
    };

    match service.entities_with_status(filing_status) {
        Ok(ids) => (
            StatusCode::OK,
            axum::Json(json!({ "status": filing_status.label(), "entities": ids })),
        )
            .into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn classify_handler(
    State(service): State<Arc<FilingService>>,
    payload: Result<axum::Json<Entity>, JsonRejection>,
) -> Response {
    let entity = match payload {
        Ok(axum::Json(entity)) => entity,
        Err(rejection) => return rejection_response(rejection),
    };
    if let Err(err) = entity.validate() {
        return error_response(err);
    }
    let verdict = service.engine().evaluate(&entity);
    (StatusCode::OK, axum::Json(verdict.report())).into_response()
}

pub(crate) async fn rules_handler(State(service): State<Arc<FilingService>>) -> Response {
    (StatusCode::OK, axum::Json(json!({ "rules": service.rules() }))).into_response()
}

fn error_response(err: FilingError) -> Response {
    let status = match err {
        FilingError::UnknownEntity(_) => StatusCode::NOT_FOUND,
        FilingError::InvalidFactValue { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        FilingError::StoreUnavailable => StatusCode::SERVICE_UNAVAILABLE,
    };
    let payload = json!({ "error": err.to_string() });
    (status, axum::Json(payload)).into_response()
}

fn rejection_response(rejection: JsonRejection) -> Response {
    let payload = json!({ "error": rejection.body_text() });
    (rejection.status(), axum::Json(payload)).into_response()
}

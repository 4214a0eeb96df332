use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::db::{Database, Table};
use crate::validate::{Validate, ValidationErrors};

// ============================================================
// Error Handling
// ============================================================

/// Log an internal error and return a sanitized response to the client.
/// The full error is logged server-side, but clients only see a generic
/// message.
fn internal_error(e: impl std::fmt::Display) -> (StatusCode, String) {
    tracing::error!("Internal error: {}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error".to_string(),
    )
}

fn invalid(errors: ValidationErrors) -> (StatusCode, String) {
    tracing::warn!("Rejected input: {}", errors);
    (StatusCode::BAD_REQUEST, errors.to_string())
}

fn not_found<E: Table>() -> (StatusCode, String) {
    let mut label = E::LABEL.to_string();
    if let Some(first) = label.get_mut(0..1) {
        first.make_ascii_uppercase();
    }
    (StatusCode::NOT_FOUND, format!("{} not found", label))
}

// ============================================================
// Health
// ============================================================

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ============================================================
// Tables
// ============================================================

pub async fn list<E: Table>(
    State(db): State<Database>,
    Query(query): Query<E::Query>,
) -> Result<Json<Vec<E>>, (StatusCode, String)> {
    db.list::<E>(&query).map(Json).map_err(internal_error)
}

pub async fn get<E: Table>(
    State(db): State<Database>,
    Path(id): Path<i64>,
) -> Result<Json<E>, (StatusCode, String)> {
    db.get::<E>(id)
        .map_err(internal_error)?
        .map(Json)
        .ok_or_else(not_found::<E>)
}

pub async fn create<E: Table>(
    State(db): State<Database>,
    Json(input): Json<E::Create>,
) -> Result<(StatusCode, Json<E>), (StatusCode, String)> {
    input.validate().map_err(invalid)?;
    let row = db.create::<E>(input).map_err(internal_error)?;
    tracing::info!("Created {} {}", E::LABEL, row.id());
    Ok((StatusCode::CREATED, Json(row)))
}

pub async fn update<E: Table>(
    State(db): State<Database>,
    Path(id): Path<i64>,
    Json(input): Json<E::Update>,
) -> Result<Json<E>, (StatusCode, String)> {
    input.validate().map_err(invalid)?;
    db.update::<E>(id, input)
        .map_err(internal_error)?
        .map(Json)
        .ok_or_else(not_found::<E>)
}

pub async fn remove<E: Table>(
    State(db): State<Database>,
    Path(id): Path<i64>,
) -> Result<StatusCode, (StatusCode, String)> {
    if db.delete::<E>(id).map_err(internal_error)? {
        tracing::info!("Deleted {} {}", E::LABEL, id);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found::<E>())
    }
}

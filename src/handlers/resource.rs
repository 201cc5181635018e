//! Generic handlers for every registered resource: `/{resource}` and `/{resource}/{id}`.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde_json::{json, Value};
use tracing::info;

use crate::app::AppState;
use crate::engine::CrudError;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::registry::{Registry, ResourceDef};

fn resource_def(resource: &str) -> Result<&'static ResourceDef, ApiError> {
    Registry::lookup(resource).map_err(|e| CrudError::from(e).into())
}

fn json_body(body: Result<Json<Value>, JsonRejection>) -> Result<Value, ApiError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| ApiError::invalid_json(rejection.body_text()))
}

/// Ids are integers; anything else cannot name a row
fn record_id(def: &ResourceDef, id: &str) -> Result<i64, ApiError> {
    id.parse::<i64>()
        .map_err(|_| ApiError::not_found(format!("{} {} not found", def.label, id)))
}

/// GET /{resource}
pub async fn list(State(state): State<AppState>, Path(resource): Path<String>) -> ApiResult<Value> {
    let def = resource_def(&resource)?;
    let rows = state.engine().list(def.name).await?;

    Ok(ApiResponse::success(
        format!("{} {} record(s)", rows.len(), def.label),
        Value::from(rows.into_iter().map(Value::Object).collect::<Vec<_>>()),
    ))
}

/// POST /{resource} - single object or array of objects
pub async fn create(
    State(state): State<AppState>,
    Path(resource): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Value> {
    let def = resource_def(&resource)?;
    let payload = json_body(body)?;

    let inserted = state.engine().create(def.name, &payload).await?;
    info!("Inserted {} row(s) into {}", inserted, def.table);

    Ok(ApiResponse::created(
        format!("{}(s) added successfully", def.label),
        json!({ "inserted": inserted }),
    ))
}

/// PUT /{resource}/{id} - partial update of the non-null mutable fields
pub async fn update(
    State(state): State<AppState>,
    Path((resource, id)): Path<(String, String)>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<()> {
    let def = resource_def(&resource)?;
    let id = record_id(def, &id)?;
    let payload = json_body(body)?;

    state.engine().update(def.name, id, &payload).await?;
    Ok(ApiResponse::message(format!("{} updated successfully", def.label)))
}

/// DELETE /{resource}/{id}
pub async fn delete(
    State(state): State<AppState>,
    Path((resource, id)): Path<(String, String)>,
) -> ApiResult<()> {
    let def = resource_def(&resource)?;
    let id = record_id(def, &id)?;

    state.engine().delete(def.name, id).await?;
    Ok(ApiResponse::message(format!("{} deleted successfully", def.label)))
}

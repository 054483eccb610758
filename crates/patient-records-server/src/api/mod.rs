//! HTTP surface over the record store.

mod error;

pub use error::{ApiError, ErrorResponse};

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use patient_records_core::{AnyBackend, Document, PatientRecord, RecordStore};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::sync::{Arc, Mutex};
use tower_http::trace::TraceLayer;
use tracing::debug;

/// Shared handler state.
///
/// The store is locked for the whole load-mutate-save cycle, so requests
/// handled by one process never interleave their writes.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Mutex<RecordStore<AnyBackend>>>,
}

impl AppState {
    pub fn new(store: RecordStore<AnyBackend>) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/about", get(about))
        .route("/view", get(view_patients))
        .route("/patient/:id", get(get_patient))
        .route("/sort", get(sort_patients))
        .route("/create", post(create_patient))
        .route("/edit/:id", put(update_patient))
        .route("/delete/:id", delete(delete_patient))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn message(text: &str) -> Json<Value> {
    Json(json!({ "message": text }))
}

async fn home() -> Json<Value> {
    message("Patient Management System API")
}

async fn about() -> Json<Value> {
    message("A fully functional API to manage your patient records")
}

async fn view_patients(State(state): State<AppState>) -> Result<Json<Document>, ApiError> {
    let store = state.store.lock()?;
    Ok(Json(store.load()?))
}

async fn get_patient(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PatientRecord>, ApiError> {
    let store = state.store.lock()?;
    Ok(Json(store.get(&id)?))
}

#[derive(Debug, Deserialize)]
pub struct SortParams {
    #[serde(default = "default_sort_by")]
    pub sort_by: String,
    #[serde(default = "default_order")]
    pub order: String,
}

fn default_sort_by() -> String {
    "name".to_string()
}

fn default_order() -> String {
    "asc".to_string()
}

async fn sort_patients(
    State(state): State<AppState>,
    Query(params): Query<SortParams>,
) -> Result<Json<Vec<PatientRecord>>, ApiError> {
    debug!(sort_by = %params.sort_by, order = %params.order, "Sorting patients");
    let store = state.store.lock()?;
    Ok(Json(store.list(&params.sort_by, &params.order)?))
}

/// Unwrap a JSON object body, reporting malformed input as a 400.
fn object_body(body: Result<Json<Value>, JsonRejection>) -> Result<Map<String, Value>, ApiError> {
    match body {
        Ok(Json(Value::Object(fields))) => Ok(fields),
        Ok(Json(_)) => Err(ApiError::BadRequest(
            "Request body must be a JSON object".to_string(),
        )),
        Err(rejection) => Err(ApiError::BadRequest(rejection.body_text())),
    }
}

async fn create_patient(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let raw = object_body(body)?;
    let store = state.store.lock()?;
    store.create_from_raw(&raw)?;
    Ok((StatusCode::CREATED, message("Patient created successfully")))
}

async fn update_patient(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let partial = object_body(body)?;
    let store = state.store.lock()?;
    store.update(&id, &partial)?;
    Ok(message("Patient updated successfully"))
}

async fn delete_patient(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let store = state.store.lock()?;
    store.delete(&id)?;
    Ok(message("Patient deleted successfully"))
}

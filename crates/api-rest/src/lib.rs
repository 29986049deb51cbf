//! # API REST
//!
//! REST boundary for CRS.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - extraction of the untrusted request context (via `api-shared`)
//! - the 1:1 mapping from domain error kinds to HTTP status classes
//!
//! This layer never constructs entities and never touches the store: it hands
//! an authority candidate to the core's gate, calls one write or read
//! operation, and renders the outcome. The contract it owns is the set of
//! distinguishable outcomes, not any particular payload shape.

#![warn(rust_2018_idioms)]

use api_shared::context::{candidate_from_headers, tenant_scope};
use api_shared::{HealthRes, HealthService};
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post, put},
    Router,
};
use crs_core::{
    authorize, AuthorityField, CoreConfig, Datastore, Demographics, DomainError, EncounterService,
    EncounterView, Mrn, NonEmptyText, NoteService, NoteView, PatientService, PatientView,
    ReadService,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use uuid::Uuid;

/// Application state shared across REST handlers.
///
/// All services share one [`Datastore`] and one [`CoreConfig`].
#[derive(Clone)]
pub struct AppState {
    cfg: Arc<CoreConfig>,
    encounters: EncounterService,
    notes: NoteService,
    patients: PatientService,
    reads: ReadService,
}

impl AppState {
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        let store = Arc::new(Datastore::new());
        Self {
            encounters: EncounterService::new(store.clone(), cfg.clone()),
            notes: NoteService::new(store.clone(), cfg.clone()),
            patients: PatientService::new(store.clone(), cfg.clone()),
            reads: ReadService::new(store),
            cfg,
        }
    }
}

/// Error payload returned for every failed request.
#[derive(Debug, serde::Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

/// A domain failure crossing the REST boundary.
///
/// Wraps [`DomainError`] so handlers can use `?`; the `IntoResponse` impl is
/// the single place status classes are assigned.
pub struct ApiError(DomainError);

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self(err)
    }
}

/// Maps a domain error kind to its status class.
///
/// Field-granular for missing authority context: a missing actor identifier
/// is an authorization failure (403), while the other missing fields are
/// malformed requests (400). Invalid context (bad timestamp format, unknown
/// capability, malformed identifiers) is 403.
fn status_for(err: &DomainError) -> StatusCode {
    match err {
        DomainError::AuthorityMissing(AuthorityField::Actor) => StatusCode::FORBIDDEN,
        DomainError::AuthorityMissing(_) => StatusCode::BAD_REQUEST,
        DomainError::AuthorityInvalid(_) => StatusCode::FORBIDDEN,
        DomainError::AccessDenied => StatusCode::FORBIDDEN,
        DomainError::NotFound(_) => StatusCode::NOT_FOUND,
        DomainError::Conflict(_) => StatusCode::CONFLICT,
        DomainError::Validation(_) => StatusCode::BAD_REQUEST,
        DomainError::System(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);

        // System details stay in the logs; callers get the kind only.
        let message = if matches!(self.0, DomainError::System(_)) {
            tracing::error!(error = %self.0, "request failed with system error");
            "internal error".to_owned()
        } else {
            self.0.to_string()
        };

        let body = ErrorBody {
            error: self.0.kind(),
            message,
        };
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

/// Builds the CRS REST router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/patients", post(register_patient).get(list_patients))
        .route("/patients/:id", get(get_patient))
        .route("/patients/:id/demographics", put(update_demographics))
        .route("/patients/:id/encounters", get(list_encounters_for_patient))
        .route("/patients/mrn/:mrn", get(get_patient_by_mrn))
        .route("/encounters", post(create_encounter))
        .route("/encounters/:id", get(get_encounter))
        .route("/encounters/:id/activate", post(activate_encounter))
        .route("/encounters/:id/complete", post(complete_encounter))
        .route("/encounters/:id/notes", get(list_notes_for_encounter))
        .route("/notes", post(create_note))
        .route("/notes/:id", put(update_note).get(get_note))
        .route("/notes/:id/sign", post(sign_note))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint, used by monitoring and load balancers.
async fn health(State(state): State<AppState>) -> Json<HealthRes> {
    Json(HealthService::check_health(state.cfg.service_name()))
}

// ---- patients ----

#[derive(Debug, Deserialize)]
struct RegisterPatientReq {
    mrn: Mrn,
    demographics: Demographics,
}

async fn register_patient(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<RegisterPatientReq>,
) -> ApiResult<(StatusCode, Json<PatientView>)> {
    let token = authorize(candidate_from_headers(&headers))?;
    let view = state.patients.register(&token, req.mrn, req.demographics)?;
    Ok((StatusCode::CREATED, Json(view)))
}

async fn update_demographics(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(demographics): Json<Demographics>,
) -> ApiResult<Json<PatientView>> {
    let token = authorize(candidate_from_headers(&headers))?;
    let view = state
        .patients
        .update_demographics(&token, id, demographics)?;
    Ok(Json(view))
}

async fn list_patients(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<Vec<PatientView>>> {
    let tenant = tenant_scope(&headers)?;
    Ok(Json(state.reads.patients(&tenant)?))
}

async fn get_patient(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> ApiResult<Json<PatientView>> {
    let tenant = tenant_scope(&headers)?;
    let view = state
        .reads
        .patient(&tenant, id)?
        .ok_or(DomainError::NotFound("patient record"))?;
    Ok(Json(view))
}

async fn get_patient_by_mrn(
    State(state): State<AppState>,
    Path(mrn): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Json<PatientView>> {
    let tenant = tenant_scope(&headers)?;
    let mrn = Mrn::parse(&mrn).map_err(DomainError::from)?;
    let view = state
        .reads
        .patient_by_mrn(&tenant, &mrn)?
        .ok_or(DomainError::NotFound("patient record"))?;
    Ok(Json(view))
}

// ---- encounters ----

#[derive(Debug, Deserialize)]
struct CreateEncounterReq {
    patient_id: Uuid,
}

async fn create_encounter(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateEncounterReq>,
) -> ApiResult<(StatusCode, Json<EncounterView>)> {
    let token = authorize(candidate_from_headers(&headers))?;
    let view = state.encounters.create(&token, req.patient_id)?;
    Ok((StatusCode::CREATED, Json(view)))
}

async fn activate_encounter(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> ApiResult<Json<EncounterView>> {
    let token = authorize(candidate_from_headers(&headers))?;
    Ok(Json(state.encounters.activate(&token, id)?))
}

async fn complete_encounter(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> ApiResult<Json<EncounterView>> {
    let token = authorize(candidate_from_headers(&headers))?;
    Ok(Json(state.encounters.complete(&token, id)?))
}

async fn get_encounter(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> ApiResult<Json<EncounterView>> {
    let tenant = tenant_scope(&headers)?;
    let view = state
        .reads
        .encounter(&tenant, id)?
        .ok_or(DomainError::NotFound("encounter"))?;
    Ok(Json(view))
}

async fn list_encounters_for_patient(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> ApiResult<Json<Vec<EncounterView>>> {
    let tenant = tenant_scope(&headers)?;
    Ok(Json(state.reads.encounters_for_patient(&tenant, id)?))
}

// ---- clinical notes ----

#[derive(Debug, Deserialize)]
struct CreateNoteReq {
    encounter_id: Uuid,
    content: NonEmptyText,
}

#[derive(Debug, Deserialize)]
struct UpdateNoteReq {
    content: NonEmptyText,
}

async fn create_note(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateNoteReq>,
) -> ApiResult<(StatusCode, Json<NoteView>)> {
    let token = authorize(candidate_from_headers(&headers))?;
    let view = state
        .notes
        .create_draft(&token, req.encounter_id, req.content)?;
    Ok((StatusCode::CREATED, Json(view)))
}

async fn update_note(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(req): Json<UpdateNoteReq>,
) -> ApiResult<Json<NoteView>> {
    let token = authorize(candidate_from_headers(&headers))?;
    Ok(Json(state.notes.update_draft(&token, id, req.content)?))
}

async fn sign_note(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> ApiResult<Json<NoteView>> {
    let token = authorize(candidate_from_headers(&headers))?;
    Ok(Json(state.notes.sign(&token, id)?))
}

async fn get_note(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> ApiResult<Json<NoteView>> {
    let tenant = tenant_scope(&headers)?;
    let view = state
        .reads
        .note(&tenant, id)?
        .ok_or(DomainError::NotFound("clinical note"))?;
    Ok(Json(view))
}

async fn list_notes_for_encounter(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> ApiResult<Json<Vec<NoteView>>> {
    let tenant = tenant_scope(&headers)?;
    Ok(Json(state.reads.notes_for_encounter(&tenant, id)?))
}

use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{Local, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::person::PersonRecord;
use crate::people::age::current_age;
use crate::people::search::{apply_filters, FilterCriteria, SearchParams};
use crate::people::validation::{validate_person, PersonInput};
use crate::state::AppState;

/// A stored record plus its age as of today.
#[derive(Serialize)]
pub struct PersonView {
    #[serde(flatten)]
    pub record: PersonRecord,
    pub age: u32,
}

impl From<PersonRecord> for PersonView {
    fn from(record: PersonRecord) -> Self {
        let age = current_age(record.fields.birth_date);
        PersonView { record, age }
    }
}

fn parse_body(body: Result<Json<PersonInput>, JsonRejection>) -> Result<PersonInput, AppError> {
    body.map(|Json(input)| input)
        .map_err(|rejection| AppError::Validation(rejection.body_text()))
}

/// GET /api/v1/persons
pub async fn handle_search(
    State(state): State<AppState>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Json<Vec<PersonView>>, AppError> {
    let Query(params) = params.map_err(|rejection| AppError::Validation(rejection.body_text()))?;
    let criteria = FilterCriteria::from(params);

    let candidates = state
        .people
        .list(&criteria.store_query())
        .await
        .map_err(AppError::retrieval)?;
    let candidate_count = candidates.len();
    let matches = apply_filters(candidates, &criteria);

    info!(
        candidates = candidate_count,
        matches = matches.len(),
        "Person search completed"
    );
    Ok(Json(matches.into_iter().map(PersonView::from).collect()))
}

/// POST /api/v1/persons
pub async fn handle_create(
    State(state): State<AppState>,
    body: Result<Json<PersonInput>, JsonRejection>,
) -> Result<(StatusCode, Json<PersonView>), AppError> {
    let person = validate_person(parse_body(body)?, Local::now().date_naive())?;
    let record = state
        .people
        .create(person, Utc::now())
        .await
        .map_err(AppError::write)?;
    Ok((StatusCode::CREATED, Json(record.into())))
}

/// GET /api/v1/persons/:id
pub async fn handle_get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PersonView>, AppError> {
    let record = state
        .people
        .get(id)
        .await
        .map_err(AppError::retrieval)?
        .ok_or_else(|| AppError::NotFound(format!("Person {id} not found")))?;
    Ok(Json(record.into()))
}

/// PUT /api/v1/persons/:id
///
/// Full replace: blocks and lists missing from the payload are cleared.
pub async fn handle_update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: Result<Json<PersonInput>, JsonRejection>,
) -> Result<Json<PersonView>, AppError> {
    let person = validate_person(parse_body(body)?, Local::now().date_naive())?;
    let record = state
        .people
        .update(id, person, Utc::now())
        .await
        .map_err(AppError::write)?
        .ok_or_else(|| AppError::NotFound(format!("Person {id} not found")))?;
    Ok(Json(record.into()))
}

/// DELETE /api/v1/persons/:id
pub async fn handle_delete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let deleted = state.people.delete(id).await.map_err(AppError::write)?;
    if !deleted {
        return Err(AppError::NotFound(format!("Person {id} not found")));
    }
    info!(person_id = %id, "Deleted person record");
    Ok(Json(json!({ "success": true })))
}

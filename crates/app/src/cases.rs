use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use metrics::counter;
use serde::Deserialize;
use tracing::info;

use recovery_core::{Case, CaseDraft, CaseId, CaseListQuery, CaseUpdateDraft, CaseWithClient};

use crate::error::ApiError;
use crate::router::AppState;
use crate::telemetry;

#[derive(Debug, Deserialize)]
pub struct CaseListParams {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    sort_by: Option<String>,
    #[serde(default)]
    order: Option<String>,
}

pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<CaseDraft>, JsonRejection>,
) -> Result<(StatusCode, Json<Case>), ApiError> {
    let result = create_case(&state, payload).await;
    telemetry::record_request("cases.create", &result);
    result
}

async fn create_case(
    state: &AppState,
    payload: Result<Json<CaseDraft>, JsonRejection>,
) -> Result<(StatusCode, Json<Case>), ApiError> {
    let Json(draft) = payload?;
    let new_case = draft.validate()?;

    let case = state
        .storage()
        .cases()
        .create(&new_case, state.now())
        .await?;

    counter!("cases_created_total").increment(1);
    info!(
        stage = "api",
        case_id = case.id,
        client_id = case.client_id,
        status = %case.status,
        "case created"
    );
    Ok((StatusCode::CREATED, Json(case)))
}

pub async fn list(
    State(state): State<AppState>,
    params: Result<Query<CaseListParams>, QueryRejection>,
) -> Result<Json<Vec<CaseWithClient>>, ApiError> {
    let result = list_cases(&state, params).await;
    telemetry::record_request("cases.list", &result);
    result
}

async fn list_cases(
    state: &AppState,
    params: Result<Query<CaseListParams>, QueryRejection>,
) -> Result<Json<Vec<CaseWithClient>>, ApiError> {
    let Query(params) = params?;
    let query = CaseListQuery::parse(
        params.status.as_deref(),
        params.sort_by.as_deref(),
        params.order.as_deref(),
    )?;

    let cases = state.storage().cases().list(&query).await?;
    Ok(Json(cases))
}

pub async fn get(
    State(state): State<AppState>,
    id: Result<Path<CaseId>, PathRejection>,
) -> Result<Json<CaseWithClient>, ApiError> {
    let result = get_case(&state, id).await;
    telemetry::record_request("cases.get", &result);
    result
}

async fn get_case(
    state: &AppState,
    id: Result<Path<CaseId>, PathRejection>,
) -> Result<Json<CaseWithClient>, ApiError> {
    let Path(id) = id?;
    let case = state.storage().cases().fetch_with_client(id).await?;
    Ok(Json(case))
}

pub async fn update(
    State(state): State<AppState>,
    id: Result<Path<CaseId>, PathRejection>,
    payload: Result<Json<CaseUpdateDraft>, JsonRejection>,
) -> Result<Json<Case>, ApiError> {
    let result = update_case(&state, id, payload).await;
    telemetry::record_request("cases.update", &result);
    result
}

async fn update_case(
    state: &AppState,
    id: Result<Path<CaseId>, PathRejection>,
    payload: Result<Json<CaseUpdateDraft>, JsonRejection>,
) -> Result<Json<Case>, ApiError> {
    let Path(id) = id?;
    let Json(draft) = payload?;
    let changes = draft.validate()?;

    let case = state
        .storage()
        .cases()
        .update(id, &changes, state.now())
        .await?;

    if !changes.is_empty() {
        counter!("cases_updated_total").increment(1);
        info!(stage = "api", case_id = case.id, status = %case.status, "case updated");
    }
    Ok(Json(case))
}

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use metrics::counter;
use tracing::{info, warn};

use recovery_core::{Client, ClientDraft};

use crate::error::ApiError;
use crate::router::AppState;
use crate::telemetry;

pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<ClientDraft>, JsonRejection>,
) -> Result<(StatusCode, Json<Client>), ApiError> {
    let result = create_client(&state, payload).await;
    telemetry::record_request("clients.create", &result);
    result
}

async fn create_client(
    state: &AppState,
    payload: Result<Json<ClientDraft>, JsonRejection>,
) -> Result<(StatusCode, Json<Client>), ApiError> {
    let Json(draft) = payload?;
    let new_client = draft.validate()?;

    let client = state
        .storage()
        .clients()
        .create(&new_client, state.now())
        .await
        .map_err(|err| {
            let err = ApiError::from(err);
            if matches!(err, ApiError::Conflict(_)) {
                warn!(stage = "api", "client email already registered");
            }
            err
        })?;

    counter!("clients_created_total").increment(1);
    info!(stage = "api", client_id = client.id, "client created");
    Ok((StatusCode::CREATED, Json(client)))
}

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Client>>, ApiError> {
    let result = state
        .storage()
        .clients()
        .list()
        .await
        .map(Json)
        .map_err(ApiError::from);
    telemetry::record_request("clients.list", &result);
    result
}

//! Protocol operations: get, getnext and set

use axum::{Json, extract::State};
use tracing::{debug, instrument};

use crate::access::Identity;
use crate::api::error::ApiResult;
use crate::api::middleware::Requester;
use crate::api::state::ApiState;
use crate::api::types::{OperationRequest, OperationResponse};
use crate::handlers::{Operation, OperationHandler, Request};

/// POST /api/v1/get
pub async fn get(
    State(state): State<ApiState>,
    Requester(identity): Requester,
    Json(body): Json<OperationRequest>,
) -> ApiResult<Json<OperationResponse>> {
    run(&state, Operation::Get, identity, body).await
}

/// POST /api/v1/getnext
pub async fn get_next(
    State(state): State<ApiState>,
    Requester(identity): Requester,
    Json(body): Json<OperationRequest>,
) -> ApiResult<Json<OperationResponse>> {
    run(&state, Operation::GetNext, identity, body).await
}

/// POST /api/v1/set
pub async fn set(
    State(state): State<ApiState>,
    Requester(identity): Requester,
    Json(body): Json<OperationRequest>,
) -> ApiResult<Json<OperationResponse>> {
    run(&state, Operation::Set, identity, body).await
}

#[instrument(skip(state, identity, body), fields(items = body.varbinds.len()))]
async fn run(
    state: &ApiState,
    operation: Operation,
    identity: Identity,
    body: OperationRequest,
) -> ApiResult<Json<OperationResponse>> {
    let varbinds = body
        .varbinds
        .iter()
        .map(|varbind| varbind.decode())
        .collect::<Result<Vec<_>, _>>()?;

    debug!(
        "{operation:?} from {:?}",
        state.store().gate().resolve(&identity)
    );

    let response = state
        .handlers
        .dispatch(&Request::new(operation, varbinds, identity))
        .await;

    Ok(Json(OperationResponse::from(&response)))
}

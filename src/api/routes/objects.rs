//! Catalogue of managed objects with their current values

use axum::{Json, extract::State};

use crate::api::state::ApiState;
use crate::api::types::{ObjectInfo, ObjectsResponse, WireVarBind};

/// GET /api/v1/objects
pub async fn list_objects(State(state): State<ApiState>) -> Json<ObjectsResponse> {
    let store = state.store();
    let values = store.values().await;

    let objects = store
        .registry()
        .objects()
        .iter()
        .zip(&values)
        .map(|(object, value)| ObjectInfo {
            oid: object.oid.to_string(),
            name: object.name.clone(),
            syntax: object.kind,
            access: object.access,
            value: WireVarBind::from(value).value,
        })
        .collect();

    Json(ObjectsResponse {
        base_oid: store.registry().base().to_string(),
        objects,
    })
}

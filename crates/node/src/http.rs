//! The node's HTTP surface.
//!
//! Blob upload and retrieval proxy through the storage gateway; the info
//! endpoints read the local store. All failures map to a JSON error envelope
//! with a status matching the error kind.

use crate::{Context, NodeError};
use alloy_primitives::hex;
use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use kahu_contract::ProofContract;
use kahu_kzg::Commitment;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

/// Shared handler state.
#[derive(Clone)]
pub struct HttpState {
    /// Node context (store, gateway, keys).
    pub ctx: Context,
    /// Settlement-contract handle for `addFile`.
    pub contract: Arc<dyn ProofContract>,
}

/// Builds the role's router. The warmup proxy is only mounted for the
/// store role.
pub fn router(state: HttpState, with_warmup: bool) -> Router {
    let mut router = Router::new()
        .route("/", get(|| async { "Welcome to the kahu DA node" }))
        .route("/getObject", get(get_object))
        .route("/putObject", post(put_object))
        .route("/getObjectInfo", get(get_object_info))
        .route("/getProofInfo", get(get_proof_info));
    if with_warmup {
        router = router.route("/warmup", get(warmup));
    }
    router.with_state(state)
}

struct ApiError(NodeError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

impl From<NodeError> for ApiError {
    fn from(e: NodeError) -> Self {
        Self(e)
    }
}

impl From<kahu_store::StoreError> for ApiError {
    fn from(e: kahu_store::StoreError) -> Self {
        Self(e.into())
    }
}

impl From<kahu_kzg::KzgError> for ApiError {
    fn from(e: kahu_kzg::KzgError) -> Self {
        Self(e.into())
    }
}

impl From<kahu_contract::ContractError> for ApiError {
    fn from(e: kahu_contract::ContractError) -> Self {
        Self(e.into())
    }
}

#[derive(Deserialize)]
struct IdQuery {
    #[serde(default)]
    id: String,
}

fn required_id(q: &IdQuery) -> Result<&str, ApiError> {
    if q.id.is_empty() {
        return Err(ApiError(NodeError::Decode("object id is not set".into())));
    }
    Ok(&q.id)
}

async fn get_object(
    State(state): State<HttpState>,
    Query(q): Query<IdQuery>,
) -> Result<Response, ApiError> {
    let id = required_id(&q)?;
    let data = state.ctx.gateway.get_object(id).await?;
    Ok((
        [(header::CONTENT_TYPE, "application/octet-stream")],
        data,
    )
        .into_response())
}

#[derive(Deserialize)]
struct PutObjectBody {
    #[serde(default)]
    data: String,
    #[serde(default)]
    from: String,
}

async fn put_object(
    State(state): State<HttpState>,
    Json(body): Json<PutObjectBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if body.data.is_empty() {
        return Err(ApiError(NodeError::Decode("field 'data' is not set".into())));
    }
    let bytes = hex::decode(&body.data)
        .map_err(|_| NodeError::Decode("field 'data' is not valid hex".into()))?;
    let from = if body.from.is_empty() {
        state.ctx.address.to_string()
    } else {
        body.from
    };

    let uploaded = state.ctx.gateway.put_object(&bytes, &from).await?;
    let commitment = Commitment::from_hex(&uploaded.commit)?;
    let signature = hex::decode(&uploaded.signature)
        .map_err(|_| NodeError::Decode("gateway signature is not valid hex".into()))?;

    state
        .contract
        .add_file(
            &commitment,
            uploaded.size as u64,
            uploaded.start,
            uploaded.end,
            &signature,
        )
        .await?;
    state
        .ctx
        .store
        .create_blob_mapping(&commitment, &uploaded.mid)?;

    Ok(Json(json!({ "id": commitment.to_hex() })))
}

async fn get_object_info(
    State(state): State<HttpState>,
    Query(q): Query<IdQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let id = required_id(&q)?;
    let commitment = Commitment::from_hex(id)?;
    let file = state.ctx.store.file_by_commitment(&commitment)?;
    Ok(Json(json!({
        "id": id,
        "size": file.size,
        "expiration": file.expiration,
    })))
}

async fn get_proof_info(
    State(state): State<HttpState>,
    Query(q): Query<IdQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let id = required_id(&q)?;
    let commitment = Commitment::from_hex(id)?;
    let file = state.ctx.store.file_by_commitment(&commitment)?;
    Ok(Json(json!({
        "id": id,
        "chooseNumber": file.choose_number,
        "provedSuccessNumber": file.proved_success_number,
    })))
}

async fn warmup(State(state): State<HttpState>) -> Result<Json<serde_json::Value>, ApiError> {
    state.ctx.gateway.warmup().await?;
    Ok(Json(json!(null)))
}

//! Request handlers mapping RPC methods onto the engine.

use crate::rpc_server::DaemonState;
use serde::de::DeserializeOwned;
use serde_json::json;
use stride_core::rpc::{
    AccountParams, ApplyCompletionParams, CreateAccountParams, DaemonStatus, GetPageParams,
    RpcMethod, RpcRequest, RpcResponse,
};
use stride_core::StrideError;
use tracing::info;

fn parse_params<T: DeserializeOwned>(
    params: Option<serde_json::Value>,
) -> Result<T, StrideError> {
    let value = params.unwrap_or(serde_json::Value::Null);
    serde_json::from_value(value)
        .map_err(|e| StrideError::InvalidInput(format!("bad params: {e}")))
}

/// Dispatch one request. Engine errors become JSON-RPC errors with the
/// engine's stable codes; transient and permanent failures stay
/// distinguishable on the wire.
pub async fn handle_request(request: RpcRequest, state: &DaemonState) -> RpcResponse {
    let id = request.id.clone();
    match dispatch(request, state).await {
        Ok(result) => RpcResponse::success(id, result),
        Err(e) => RpcResponse::from_error(id, &e),
    }
}

async fn dispatch(
    request: RpcRequest,
    state: &DaemonState,
) -> Result<serde_json::Value, StrideError> {
    match request.method {
        RpcMethod::Status => {
            let status = DaemonStatus {
                version: state.version.clone(),
                uptime_seconds: state.start_time.elapsed().as_secs(),
                accounts: state.store.account_count().await?,
                store_backend: state.store_backend.clone(),
            };
            Ok(serde_json::to_value(status)?)
        }

        RpcMethod::CreateAccount => {
            let params: CreateAccountParams = parse_params(request.params)?;
            let record = state
                .ledger
                .provision_account(params.account_id, &params.display_name, chrono::Utc::now())
                .await?;
            Ok(json!({
                "account_id": record.account_id,
                "display_name": record.display_name,
                "created_at": record.created_at,
            }))
        }

        RpcMethod::ApplyCompletion => {
            let params: ApplyCompletionParams = parse_params(request.params)?;
            let points = params.validated_points()?;
            let deltas = params.stat_deltas.validate()?;
            if let Some(event_id) = &params.event_id {
                info!(account_id = %params.account_id, event_id = %event_id, "completion event");
            }
            let result = state
                .ledger
                .apply_completion(&params.account_id, points, &deltas, chrono::Utc::now())
                .await?;
            Ok(serde_json::to_value(result)?)
        }

        RpcMethod::GetSnapshot => {
            let params: AccountParams = parse_params(request.params)?;
            let snapshot = state.ledger.snapshot(&params.account_id).await?;
            Ok(serde_json::to_value(snapshot)?)
        }

        RpcMethod::GetPage => {
            let params: GetPageParams = parse_params(request.params)?;
            let entries = state.ranking.page(params.offset, params.limit).await?;
            Ok(json!({ "entries": entries }))
        }

        RpcMethod::GetRank => {
            let params: AccountParams = parse_params(request.params)?;
            let rank = state
                .ranking
                .rank_of(&params.account_id)
                .await?
                .ok_or_else(|| StrideError::AccountNotFound(params.account_id.clone()))?;
            Ok(json!({ "account_id": params.account_id, "rank": rank }))
        }

        RpcMethod::ListBadges => {
            let params: AccountParams = parse_params(request.params)?;
            let badges = state.ledger.list_badges(&params.account_id).await?;
            Ok(json!({ "badges": badges }))
        }
    }
}

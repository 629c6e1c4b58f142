//! JSON-RPC 2.0 types for strided communication.
//!
//! One request per line over the unix socket. Signed integers cross the
//! wire and are validated here, before anything reaches the engine, so a
//! negative point award or stat delta is rejected with no write.

use crate::account::StatDeltas;
use crate::error::StrideError;
use serde::{Deserialize, Serialize};

/// RPC methods supported by strided
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum RpcMethod {
    Status,
    CreateAccount,
    ApplyCompletion,
    GetSnapshot,
    GetPage,
    GetRank,
    ListBadges,
}

/// JSON-RPC 2.0 request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcRequest {
    pub jsonrpc: String,
    pub method: RpcMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
    pub id: String,
}

impl RpcRequest {
    pub fn new(method: RpcMethod, params: Option<serde_json::Value>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            method,
            params,
            id: uuid::Uuid::new_v4().to_string(),
        }
    }
}

/// JSON-RPC 2.0 response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcResponse {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
    pub id: String,
}

impl RpcResponse {
    pub fn success(id: String, result: serde_json::Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            result: Some(result),
            error: None,
            id,
        }
    }

    pub fn failure(id: String, code: i32, message: String) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            result: None,
            error: Some(RpcError { code, message }),
            id,
        }
    }

    pub fn from_error(id: String, error: &StrideError) -> Self {
        Self::failure(id, error.code(), error.to_string())
    }
}

/// JSON-RPC 2.0 error object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i32,
    pub message: String,
}

/// Params for `create_account`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAccountParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    pub display_name: String,
}

/// Signed stat deltas as they arrive on the wire.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct StatDeltasParams {
    #[serde(default)]
    pub units_completed: i64,
    #[serde(default)]
    pub perfect_scores: i64,
    #[serde(default)]
    pub camps_completed: i64,
    #[serde(default)]
    pub ai_sessions: i64,
}

impl StatDeltasParams {
    pub fn validate(&self) -> Result<StatDeltas, StrideError> {
        let check = |name: &str, value: i64| -> Result<u64, StrideError> {
            u64::try_from(value).map_err(|_| {
                StrideError::InvalidInput(format!("{name} must not be negative, got {value}"))
            })
        };
        Ok(StatDeltas {
            units_completed: check("units_completed", self.units_completed)?,
            perfect_scores: check("perfect_scores", self.perfect_scores)?,
            camps_completed: check("camps_completed", self.camps_completed)?,
            ai_sessions: check("ai_sessions", self.ai_sessions)?,
        })
    }
}

/// Params for `apply_completion`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplyCompletionParams {
    pub account_id: String,
    pub points_awarded: i64,
    #[serde(default)]
    pub stat_deltas: StatDeltasParams,
    /// Upstream event id, logged for dedup correlation only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
}

impl ApplyCompletionParams {
    pub fn validated_points(&self) -> Result<u64, StrideError> {
        u64::try_from(self.points_awarded).map_err(|_| {
            StrideError::InvalidInput(format!(
                "points_awarded must not be negative, got {}",
                self.points_awarded
            ))
        })
    }
}

/// Params for `get_snapshot`, `get_rank` and `list_badges`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountParams {
    pub account_id: String,
}

fn default_page_limit() -> usize {
    10
}

/// Params for `get_page`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetPageParams {
    #[serde(default)]
    pub offset: usize,
    #[serde(default = "default_page_limit")]
    pub limit: usize,
}

/// Daemon health summary returned by `status`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonStatus {
    pub version: String,
    pub uptime_seconds: u64,
    pub accounts: u64,
    pub store_backend: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_snake_case_on_wire() {
        let json = serde_json::to_string(&RpcMethod::ApplyCompletion).unwrap();
        assert_eq!(json, "\"apply_completion\"");
    }

    #[test]
    fn test_request_round_trip() {
        let request = RpcRequest::new(
            RpcMethod::GetRank,
            Some(serde_json::json!({"account_id": "a-1"})),
        );
        let json = serde_json::to_string(&request).unwrap();
        let parsed: RpcRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.method, RpcMethod::GetRank);
        assert_eq!(parsed.id, request.id);
    }

    #[test]
    fn test_negative_points_rejected() {
        let params = ApplyCompletionParams {
            account_id: "a-1".to_string(),
            points_awarded: -5,
            stat_deltas: StatDeltasParams::default(),
            event_id: None,
        };
        let err = params.validated_points().unwrap_err();
        assert!(matches!(err, StrideError::InvalidInput(_)));
        assert_eq!(err.code(), -32602);
    }

    #[test]
    fn test_negative_delta_rejected() {
        let deltas = StatDeltasParams {
            units_completed: -1,
            ..Default::default()
        };
        assert!(deltas.validate().is_err());
    }

    #[test]
    fn test_deltas_default_when_omitted() {
        let params: ApplyCompletionParams = serde_json::from_str(
            r#"{"account_id": "a-1", "points_awarded": 100}"#,
        )
        .unwrap();
        let deltas = params.stat_deltas.validate().unwrap();
        assert!(deltas.is_empty());
        assert_eq!(params.validated_points().unwrap(), 100);
    }

    #[test]
    fn test_failure_response_carries_code() {
        let response = RpcResponse::from_error(
            "req-1".to_string(),
            &StrideError::AccountNotFound("a-1".to_string()),
        );
        assert_eq!(response.error.as_ref().unwrap().code, -32000);
        assert!(response.result.is_none());
    }
}

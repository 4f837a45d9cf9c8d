//! The response envelope a REST front door wraps results in.
//!
//! The front door itself lives outside this workspace; these types pin the
//! wire shape it must use.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Standard response wrapper: payload plus request bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse {
    pub success: bool,
    pub status_code: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    /// Per-response correlation id.
    pub guid: String,
    pub timestamp_utc: DateTime<Utc>,
    pub processing_time_ms: u64,
}

impl ApiResponse {
    pub fn ok(data: Option<serde_json::Value>, processing_time_ms: u64) -> Self {
        Self {
            success: true,
            status_code: 200,
            error_message: None,
            data,
            guid: Uuid::new_v4().to_string(),
            timestamp_utc: Utc::now(),
            processing_time_ms,
        }
    }

    pub fn error(status_code: u16, message: impl Into<String>, processing_time_ms: u64) -> Self {
        Self {
            success: false,
            status_code,
            error_message: Some(message.into()),
            data: None,
            guid: Uuid::new_v4().to_string(),
            timestamp_utc: Utc::now(),
            processing_time_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_envelope_shape() {
        let r = ApiResponse::ok(Some(serde_json::json!({"n": 1})), 3);
        assert!(r.success);
        assert_eq!(r.status_code, 200);
        let json = serde_json::to_string(&r).unwrap();
        assert!(json.contains("\"statusCode\""));
        assert!(json.contains("\"timestampUtc\""));
        assert!(json.contains("\"processingTimeMs\""));
        assert!(!json.contains("errorMessage"));
    }

    #[test]
    fn error_envelope_shape() {
        let r = ApiResponse::error(400, "bad document", 1);
        assert!(!r.success);
        assert_eq!(r.error_message.as_deref(), Some("bad document"));
        assert!(r.data.is_none());
    }
}

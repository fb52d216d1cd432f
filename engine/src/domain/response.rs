//! Base resolver response

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Success,
    Error,
}

/// Status and human-readable message returned by mutations
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ResolverResponse {
    pub status: ResponseStatus,
    pub message: String,
}

impl ResolverResponse {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Error,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.status == ResponseStatus::Error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_lowercase_status() {
        let json = serde_json::to_string(&ResolverResponse::error("boom")).unwrap();
        assert_eq!(json, r#"{"status":"error","message":"boom"}"#);
    }

    #[test]
    fn test_deserializes() {
        let res: ResolverResponse =
            serde_json::from_str(r#"{"status": "success", "message": "ok"}"#).unwrap();
        assert!(!res.is_error());
        assert_eq!(res.message, "ok");
    }
}

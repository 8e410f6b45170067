// Messages exchanged with the background worker over runtime messaging

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ChannelError;

/// Action name the background worker dispatches on
pub const REFINE_ACTION: &str = "refineText";

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RefineRequest {
    pub action: String,
    pub text: String,
    pub api_key: String,
}

impl RefineRequest {
    pub fn new(text: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            action: REFINE_ACTION.to_string(),
            text: text.into(),
            api_key: api_key.into(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RefineResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub refined_text: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl RefineResponse {
    pub fn refined(text: impl Into<String>) -> Self {
        Self {
            success: true,
            refined_text: Some(text.into()),
            error: None,
        }
    }

    /// Parse the worker's reply; a reply of any other shape counts as no reply
    pub fn from_reply(json: &str) -> Option<Self> {
        serde_json::from_str(json)
            .map_err(|e| log::warn!("Ignoring malformed reply from background worker: {}", e))
            .ok()
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            refined_text: None,
            error: Some(error.into()),
        }
    }
}

/// What the single reply callback observed
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Delivery {
    /// Callback argument; `None` when the worker did not answer
    pub response: Option<RefineResponse>,
    /// `runtime.lastError.message` at callback time
    pub last_error: Option<String>,
}

impl Delivery {
    pub fn answered(response: RefineResponse) -> Self {
        Self {
            response: Some(response),
            last_error: None,
        }
    }

    pub fn runtime_error(message: impl Into<String>) -> Self {
        Self {
            response: None,
            last_error: Some(message.into()),
        }
    }
}

#[async_trait(?Send)]
pub trait MessageChannel {
    /// Send one request and wait for exactly one reply. No timeout.
    async fn send(&self, request: &RefineRequest) -> Result<Delivery, ChannelError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_wire_shape() {
        let request = RefineRequest::new("hello world", "sk-12345");
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({ "action": "refineText", "text": "hello world", "apiKey": "sk-12345" })
        );
    }

    #[test]
    fn test_response_success() {
        let response: RefineResponse =
            serde_json::from_value(json!({ "success": true, "refinedText": "Hello, world." }))
                .unwrap();
        assert_eq!(response, RefineResponse::refined("Hello, world."));
    }

    #[test]
    fn test_reply_with_non_string_error_is_dropped() {
        assert_eq!(
            RefineResponse::from_reply(r#"{"success":false,"error":{"code":429}}"#),
            None
        );
        assert_eq!(RefineResponse::from_reply("\"acknowledged\""), None);
        assert_eq!(
            RefineResponse::from_reply(r#"{"success":false,"error":"rate limited"}"#),
            Some(RefineResponse::failed("rate limited"))
        );
    }

    #[test]
    fn test_response_failure_without_error() {
        let response: RefineResponse =
            serde_json::from_value(json!({ "success": false, "status": 500 })).unwrap();
        assert!(!response.success);
        assert_eq!(response.error, None);
    }
}

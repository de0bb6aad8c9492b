use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestKind {
    /// Hand raw sensitive text to the peer for off-system encrypted storage.
    #[serde(rename = "REQUEST_ONCHAIN_STORAGE")]
    Escrow,
    /// Ask the peer to decrypt a previously escrowed item by reference.
    #[serde(rename = "REQUEST_DECRYPTION")]
    Decrypt,
}

/// Outbound envelope `{type, requestId, payload}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerMessage {
    #[serde(rename = "type")]
    pub kind: RequestKind,
    #[serde(rename = "requestId")]
    pub request_id: String,
    pub payload: Value,
}

/// Payload of a [`RequestKind::Escrow`] request.
pub fn escrow_payload(data: &str) -> Value {
    serde_json::json!({ "dataToStore": data })
}

/// Payload of a [`RequestKind::Decrypt`] request.
pub fn decrypt_payload(data_id: &str) -> Value {
    serde_json::json!({ "dataId": data_id })
}

/// Inbound frames from the peer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    #[serde(rename = "OPERATION_RESULT")]
    OperationResult {
        #[serde(rename = "requestId")]
        request_id: String,
        payload: OperationResultPayload,
    },
}

impl ClientMessage {
    pub fn parse(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OperationResultPayload {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl OperationResultPayload {
    pub fn ok(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }

    /// Decrypted text, when the peer replied successfully with either a bare
    /// string or an object carrying `plaintext`.
    pub fn plaintext(&self) -> Option<&str> {
        if !self.success {
            return None;
        }
        match self.data.as_ref()? {
            Value::String(s) => Some(s.as_str()),
            Value::Object(map) => map.get("plaintext").and_then(Value::as_str),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn envelopes_use_peer_field_names() {
        let msg = ServerMessage {
            kind: RequestKind::Escrow,
            request_id: "r-1".to_string(),
            payload: escrow_payload("secret"),
        };
        assert_eq!(
            serde_json::to_value(&msg).expect("json"),
            json!({"type": "REQUEST_ONCHAIN_STORAGE", "requestId": "r-1", "payload": {"dataToStore": "secret"}})
        );
        let msg = ServerMessage {
            kind: RequestKind::Decrypt,
            request_id: "r-2".to_string(),
            payload: decrypt_payload("ref-1"),
        };
        let msg = serde_json::to_value(&msg).expect("json");
        assert_eq!(msg["type"], "REQUEST_DECRYPTION");
        assert_eq!(msg["payload"]["dataId"], "ref-1");
    }

    #[test]
    fn parses_operation_result() {
        let ClientMessage::OperationResult {
            request_id,
            payload,
        } = ClientMessage::parse(
            r#"{"type":"OPERATION_RESULT","requestId":"r-1","payload":{"success":true,"data":{"plaintext":"hello"}}}"#,
        )
        .expect("parse");
        assert_eq!(request_id, "r-1");
        assert_eq!(payload.plaintext(), Some("hello"));

        assert!(ClientMessage::parse(r#"{"type":"SOMETHING_ELSE","requestId":"x"}"#).is_err());
    }

    #[test]
    fn plaintext_requires_success() {
        assert_eq!(OperationResultPayload::ok(json!("abc")).plaintext(), Some("abc"));
        assert_eq!(OperationResultPayload::ok(json!({"cid": "Qm"})).plaintext(), None);
        let mut failed = OperationResultPayload::ok(json!("abc"));
        failed.success = false;
        assert_eq!(failed.plaintext(), None);
        assert_eq!(OperationResultPayload::failed("denied").plaintext(), None);
    }
}

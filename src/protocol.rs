//! Wire format shared by the authority service and its clients.
//!
//! The protocol is deliberately small: a form-encoded request surface and a
//! JSON query reply. Every protocol-level rejection is a 503 with one of the
//! plain-text bodies below, so clients can match on them verbatim.

use serde::{Deserialize, Serialize};

/// `message` value reporting that the workload has started.
pub const MESSAGE_STARTED: &str = "started";
/// `message` value reporting that the workload has stopped.
pub const MESSAGE_STOPPED: &str = "stopped";

pub const INVALID_KEY: &str = "Invalid key.";
pub const NO_MESSAGE: &str = "No message supplied.";
pub const NO_IP: &str = "No IP supplied!";

/// Conflict body returned when an acquire finds the slot taken.
pub fn already_running(holder: &str) -> String {
    format!("Server already running at {holder}!")
}

/// Recover the holder identity from an [`already_running`] body.
pub fn parse_already_running(body: &str) -> Option<&str> {
    body.strip_prefix("Server already running at ")
        .and_then(|rest| rest.strip_suffix('!'))
}

/// Reply to `GET /?key=...`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryReply {
    pub online: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
}

impl QueryReply {
    pub fn from_holder(holder: Option<String>) -> Self {
        Self {
            online: holder.is_some(),
            ip: holder,
        }
    }
}

/// Form body of `POST /`.
///
/// Everything is optional at the wire level; the service answers a specific
/// 503 for each missing piece instead of failing to deserialize.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub key: Option<String>,
    pub message: Option<String>,
    pub ip: Option<String>,
}

impl Report {
    pub fn started(key: &str, identity: &str) -> Self {
        Self {
            key: Some(key.to_string()),
            message: Some(MESSAGE_STARTED.to_string()),
            ip: Some(identity.to_string()),
        }
    }

    pub fn stopped(key: &str) -> Self {
        Self {
            key: Some(key.to_string()),
            message: Some(MESSAGE_STOPPED.to_string()),
            ip: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_reply_offline_omits_ip() {
        let json = serde_json::to_string(&QueryReply::from_holder(None)).unwrap();
        assert_eq!(json, r#"{"online":false}"#);
    }

    #[test]
    fn test_query_reply_online_carries_ip() {
        let reply = QueryReply::from_holder(Some("10.0.0.1".to_string()));
        let json = serde_json::to_string(&reply).unwrap();
        assert_eq!(json, r#"{"online":true,"ip":"10.0.0.1"}"#);
    }

    #[test]
    fn test_conflict_body_round_trips() {
        let body = already_running("203.0.113.7");
        assert_eq!(parse_already_running(&body), Some("203.0.113.7"));
        assert_eq!(parse_already_running("Invalid key."), None);
    }
}

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

pub const QUERY_REQUIRED: &str = "A query is required.";

/// Raw query-string pairs in request order, repeated keys included.
pub type QueryPairs = Vec<(String, String)>;

/// First value wins for a repeated key.
fn first_value(pairs: &[(String, String)], key: &str) -> Option<String> {
    pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone())
}

#[derive(Debug, Default)]
pub struct VerifyParams {
    pub mode: Option<String>,
    pub challenge: Option<String>,
    pub verify_token: Option<String>,
}

impl VerifyParams {
    pub fn from_pairs(pairs: &[(String, String)]) -> Self {
        VerifyParams {
            mode: first_value(pairs, "hub.mode"),
            challenge: first_value(pairs, "hub.challenge"),
            verify_token: first_value(pairs, "hub.verify_token"),
        }
    }

    /// The challenge to echo back, if the handshake is valid for `expected_token`.
    pub fn accepted_challenge(&self, expected_token: &str) -> Option<&str> {
        if self.mode.as_deref() != Some("subscribe") {
            return None;
        }
        if self.verify_token.as_deref() != Some(expected_token) {
            return None;
        }
        self.challenge.as_deref()
    }
}

#[derive(Debug, Default)]
pub struct SearchParams {
    pub q: Option<String>,
}

impl SearchParams {
    pub fn from_pairs(pairs: &[(String, String)]) -> Self {
        SearchParams {
            q: first_value(pairs, "q"),
        }
    }
}

/// JSON body returned by every search endpoint, success or not.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct SearchEnvelope {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<String>,
    pub data: BTreeMap<String, Vec<Value>>,
}

impl SearchEnvelope {
    fn data(key: &str, docs: Vec<Value>) -> BTreeMap<String, Vec<Value>> {
        BTreeMap::from([(key.to_string(), docs)])
    }

    pub fn missing_query(key: &str) -> Self {
        SearchEnvelope {
            status: None,
            message: None,
            error: Some(QUERY_REQUIRED.to_string()),
            results: Some(String::new()),
            data: Self::data(key, Vec::new()),
        }
    }

    pub fn found(key: &str, docs: Vec<Value>, not_found: &str) -> Self {
        let message = docs.is_empty().then(|| not_found.to_string());
        SearchEnvelope {
            status: Some("success".to_string()),
            message,
            error: None,
            results: None,
            data: Self::data(key, docs),
        }
    }

    pub fn failed(key: &str, message: impl Into<String>) -> Self {
        SearchEnvelope {
            status: Some("error".to_string()),
            message: Some(message.into()),
            error: None,
            results: None,
            data: Self::data(key, Vec::new()),
        }
    }

    pub fn items(&self, key: &str) -> &[Value] {
        self.data.get(key).map(Vec::as_slice).unwrap_or_default()
    }
}

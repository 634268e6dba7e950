// Response interpretation: every attempted call, answered or not, ends up
// as exactly one `RequestOutcome`. Nothing in here can fail.

use crate::transport::{TransportError, WireResponse};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use tracing::{error, info, warn};

/// Terminal result of one transport attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestOutcome {
    /// 2xx. A JSON body is parsed; any other body is carried verbatim as
    /// a string.
    Success(Value),
    NotFound,
    BadRequest(String),
    ServerError(String),
    ConnectionError,
    Timeout,
    UnexpectedError(String),
}

/// One stored record as returned by `/getall` and `/getfull`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct StoredRecord {
    pub key: String,
    pub value: Value,
    #[serde(default)]
    pub lastchange: Option<String>,
}

/// Map an answered request onto an outcome.
pub fn classify_response(response: WireResponse, operation: &str) -> RequestOutcome {
    let is_json = response.is_json();
    let WireResponse { status, body, .. } = response;
    match status {
        200..=299 => {
            info!("{} - request completed successfully", operation);
            RequestOutcome::Success(parse_payload(body, is_json))
        }
        404 => {
            warn!("{} - resource not found (404)", operation);
            RequestOutcome::NotFound
        }
        400 => {
            warn!("{} - bad request (400): {}", operation, body);
            RequestOutcome::BadRequest(body)
        }
        500..=599 => {
            error!("{} - server error ({}): {}", operation, status, body);
            RequestOutcome::ServerError(body)
        }
        _ => {
            error!("{} - HTTP error {}: {}", operation, status, body);
            RequestOutcome::UnexpectedError(format!("{}: {}", status_line(status), body))
        }
    }
}

/// Map a request that produced no response onto an outcome.
pub fn classify_failure(err: &TransportError, operation: &str) -> RequestOutcome {
    error!("{} - {}", operation, err);
    match err {
        TransportError::Connect(_) => RequestOutcome::ConnectionError,
        TransportError::Timeout(_) => RequestOutcome::Timeout,
        TransportError::Other(detail) => RequestOutcome::UnexpectedError(detail.clone()),
    }
}

/// Total mapping from a transport attempt to an outcome.
pub fn interpret(
    attempt: Result<WireResponse, TransportError>,
    operation: &str,
) -> RequestOutcome {
    match attempt {
        Ok(response) => classify_response(response, operation),
        Err(err) => classify_failure(&err, operation),
    }
}

fn parse_payload(body: String, is_json: bool) -> Value {
    if body.trim().is_empty() {
        return Value::Null;
    }
    if !is_json {
        return Value::String(body);
    }
    match serde_json::from_str(&body) {
        Ok(value) => value,
        Err(e) => {
            warn!("body declared as JSON does not parse: {}", e);
            Value::String(body)
        }
    }
}

fn status_line(status: u16) -> String {
    match reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
    {
        Some(reason) => format!("{} {}", status, reason),
        None => status.to_string(),
    }
}

fn one_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

impl RequestOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RequestOutcome::Success(_))
    }

    pub fn payload(&self) -> Option<&Value> {
        match self {
            RequestOutcome::Success(v) => Some(v),
            _ => None,
        }
    }

    /// Decode a successful `/getall` payload. An empty body means no records.
    pub fn records(&self) -> Option<Result<Vec<StoredRecord>, serde_json::Error>> {
        self.payload().map(|v| match v {
            Value::Null => Ok(Vec::new()),
            v => serde_json::from_value::<Vec<StoredRecord>>(v.clone()),
        })
    }

    /// Decode a successful `/getfull` payload.
    pub fn record(&self) -> Option<Result<StoredRecord, serde_json::Error>> {
        self.payload()
            .map(|v| serde_json::from_value::<StoredRecord>(v.clone()))
    }

    /// One-line message for the user.
    pub fn message(&self) -> String {
        match self {
            RequestOutcome::Success(Value::String(s)) => one_line(s),
            RequestOutcome::Success(Value::Null) => "Done".to_string(),
            RequestOutcome::Success(v) => v.to_string(),
            RequestOutcome::NotFound => {
                "Resource not found: the requested key does not exist".to_string()
            }
            RequestOutcome::BadRequest(detail) => format!("Bad request: {}", one_line(detail)),
            RequestOutcome::ServerError(_) => {
                "Server error: the backend service encountered an error".to_string()
            }
            RequestOutcome::ConnectionError => {
                "Connection error: cannot reach the server, is it running?".to_string()
            }
            RequestOutcome::Timeout => {
                "Timeout: the server took too long to respond, please try again".to_string()
            }
            RequestOutcome::UnexpectedError(detail) => {
                format!("Unexpected error: {}", one_line(detail))
            }
        }
    }
}

impl fmt::Display for RequestOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

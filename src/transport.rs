// Transport: one blocking HTTP exchange per call. `HttpTransport` is the
// real implementation on top of reqwest; the `Transport` trait exists so
// the client can be driven by a recording fake in tests.

use reqwest::blocking::Client;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Put,
    Post,
    Delete,
}

impl Method {
    fn as_reqwest(self) -> reqwest::Method {
        match self {
            Method::Get => reqwest::Method::GET,
            Method::Put => reqwest::Method::PUT,
            Method::Post => reqwest::Method::POST,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// Everything needed to issue one call against the API base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct WireRequest {
    pub method: Method,
    /// Path relative to the base URL, e.g. `/put`.
    pub path: &'static str,
    pub query: Vec<(&'static str, String)>,
    pub body: Option<Value>,
    pub timeout: Duration,
}

impl WireRequest {
    pub fn new(method: Method, path: &'static str, timeout: Duration) -> Self {
        WireRequest {
            method,
            path,
            query: Vec::new(),
            body: None,
            timeout,
        }
    }

    pub fn query(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.query.push((name, value.into()));
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// A response that made it back, whatever its status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireResponse {
    pub status: u16,
    /// Raw `Content-Type` header, if the server sent one.
    pub content_type: Option<String>,
    pub body: String,
}

impl WireResponse {
    /// True for `application/json` and `+json` media types, parameters ignored.
    pub fn is_json(&self) -> bool {
        self.content_type.as_deref().map_or(false, |ct| {
            let essence = ct.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
            essence == "application/json" || essence.ends_with("+json")
        })
    }
}

/// The request never produced a response.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("cannot connect: {0}")]
    Connect(String),
    #[error("timed out: {0}")]
    Timeout(String),
    #[error("{0}")]
    Other(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        // A connect attempt that runs past the deadline reports both flags;
        // the deadline is what the caller configured, so it takes priority.
        if err.is_timeout() {
            TransportError::Timeout(err.to_string())
        } else if err.is_connect() {
            TransportError::Connect(err.to_string())
        } else {
            TransportError::Other(err.to_string())
        }
    }
}

pub trait Transport {
    fn execute(&self, request: &WireRequest) -> Result<WireResponse, TransportError>;

    /// Human-readable location of the backend, used in messages.
    fn endpoint(&self) -> &str;
}

/// reqwest-backed transport bound to a fixed base URL.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>) -> Result<Self, TransportError> {
        let client = Client::builder()
            .build()
            .map_err(|e| TransportError::Other(format!("failed to build HTTP client: {}", e)))?;
        Ok(HttpTransport {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

impl Transport for HttpTransport {
    fn execute(&self, request: &WireRequest) -> Result<WireResponse, TransportError> {
        let url = format!("{}{}", self.base_url, request.path);
        info!(method = ?request.method, %url, query = ?request.query, "sending request");

        let mut builder = self
            .client
            .request(request.method.as_reqwest(), &url)
            .timeout(request.timeout);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let res = builder.send()?;
        let status = res.status().as_u16();
        let final_url = res.url().to_string();
        let content_type = res
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let body = res.text()?;
        info!(status, url = %final_url, content_type = ?content_type, "response received");
        Ok(WireResponse {
            status,
            content_type,
            body,
        })
    }

    fn endpoint(&self) -> &str {
        &self.base_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builder_accumulates_query_and_body() {
        let req = WireRequest::new(Method::Get, "/get", Duration::from_secs(1))
            .query("key", "abc")
            .json(json!({"x": 1}));
        assert_eq!(req.query, vec![("key", "abc".to_string())]);
        assert_eq!(req.body, Some(json!({"x": 1})));
    }

    #[test]
    fn json_detection_uses_media_type() {
        let with = |ct: Option<&str>| WireResponse {
            status: 200,
            content_type: ct.map(String::from),
            body: "1".into(),
        };
        assert!(with(Some("application/json")).is_json());
        assert!(with(Some("Application/JSON; charset=UTF-8")).is_json());
        assert!(with(Some("application/problem+json")).is_json());
        assert!(!with(Some("text/plain;charset=UTF-8")).is_json());
        assert!(!with(None).is_json());
    }

    #[derive(Clone, Default)]
    struct Captured(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn requests_are_logged_at_info() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let transport = HttpTransport::new(format!("http://127.0.0.1:{}/api", port)).unwrap();
        let request = WireRequest::new(Method::Get, "/getall", Duration::from_secs(2));

        let logs = Captured::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let result = tracing::subscriber::with_default(subscriber, || transport.execute(&request));

        assert!(matches!(result, Err(TransportError::Connect(_))));
        let text = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert!(text.contains("INFO"));
        assert!(text.contains("sending request"));
        assert!(text.contains("/api/getall"));
    }

    #[test]
    fn base_url_loses_trailing_slash() {
        let transport = HttpTransport::new("http://localhost:8080/api/").unwrap();
        assert_eq!(transport.endpoint(), "http://localhost:8080/api");
    }
}

// API client module: one method per backend endpoint. Every method either
// refuses up front with a `ValidationError` (nothing is sent) or issues
// exactly one request and returns the interpreted `RequestOutcome`.

use crate::batch::Batch;
use crate::config::Config;
use crate::entry::{normalize_key, KeyValueEntry, ValidationError};
use crate::outcome::{interpret, RequestOutcome};
use crate::transport::{HttpTransport, Method, Transport, TransportError, WireRequest};
use serde_json::json;
use std::time::Duration;
use tracing::{info, warn};

/// Client for the key-value API. Holds the transport and the two
/// timeouts; nothing else is kept between calls.
#[derive(Clone)]
pub struct KvClient<T = HttpTransport> {
    transport: T,
    default_timeout: Duration,
    batch_timeout: Duration,
}

impl KvClient<HttpTransport> {
    /// Build a reqwest-backed client from the resolved configuration.
    pub fn from_config(config: &Config) -> Result<Self, TransportError> {
        let transport = HttpTransport::new(config.base_url.as_str())?;
        Ok(KvClient::with_transport(
            transport,
            config.default_timeout,
            config.batch_timeout,
        ))
    }
}

impl<T: Transport> KvClient<T> {
    pub fn with_transport(transport: T, default_timeout: Duration, batch_timeout: Duration) -> Self {
        KvClient {
            transport,
            default_timeout,
            batch_timeout,
        }
    }

    pub fn endpoint(&self) -> &str {
        self.transport.endpoint()
    }

    fn call(&self, request: WireRequest, operation: &str) -> RequestOutcome {
        interpret(self.transport.execute(&request), operation)
    }

    /// Upsert a single entry with `PUT /put`.
    pub fn save(&self, entry: &KeyValueEntry) -> RequestOutcome {
        info!("Saving single value with key: '{}'", entry.key());
        let request = WireRequest::new(Method::Put, "/put", self.default_timeout)
            .json(json!({ "key": entry.key(), "value": entry.value() }));
        self.call(request, "Save single value")
    }

    /// Upsert a whole batch with one `PUT /putall`.
    pub fn save_all(&self, batch: &Batch) -> Result<RequestOutcome, ValidationError> {
        let body = batch.to_wire()?;
        info!("Saving batch of {} values", batch.len());
        let request = WireRequest::new(Method::Put, "/putall", self.batch_timeout).json(body);
        Ok(self.call(request, "Save batch values"))
    }

    /// Replace the value of an existing key with `POST /update`.
    pub fn update(&self, entry: &KeyValueEntry) -> RequestOutcome {
        info!("Updating value for key: '{}'", entry.key());
        let request = WireRequest::new(Method::Post, "/update", self.default_timeout)
            .json(json!({ "key": entry.key(), "value": entry.value() }));
        self.call(request, "Update value")
    }

    /// Fetch the value stored under `key`.
    pub fn get(&self, key: &str) -> Result<RequestOutcome, ValidationError> {
        let key = self.checked_key(key, "get value")?;
        info!("Retrieving value for key: '{}'", key);
        let request = WireRequest::new(Method::Get, "/get", self.default_timeout).query("key", &key);
        Ok(self.call(request, &format!("Get value for key '{}'", key)))
    }

    /// Fetch the value plus its metadata (last change timestamp).
    pub fn get_full(&self, key: &str) -> Result<RequestOutcome, ValidationError> {
        let key = self.checked_key(key, "get full object")?;
        info!("Retrieving full object for key: '{}'", key);
        let request =
            WireRequest::new(Method::Get, "/getfull", self.default_timeout).query("key", &key);
        Ok(self.call(request, &format!("Get full object for key '{}'", key)))
    }

    /// Fetch every stored record.
    pub fn get_all(&self) -> RequestOutcome {
        info!("Retrieving all values from database");
        let request = WireRequest::new(Method::Get, "/getall", self.default_timeout);
        self.call(request, "Get all values")
    }

    pub fn delete(&self, key: &str) -> Result<RequestOutcome, ValidationError> {
        let key = self.checked_key(key, "delete value")?;
        info!("Deleting value for key: '{}'", key);
        let request =
            WireRequest::new(Method::Delete, "/delete", self.default_timeout).query("key", &key);
        Ok(self.call(request, &format!("Delete key '{}'", key)))
    }

    /// Remove everything. There is no undo; callers confirm first.
    pub fn delete_all(&self) -> RequestOutcome {
        warn!("DESTRUCTIVE OPERATION: deleting all values from database");
        let request = WireRequest::new(Method::Delete, "/deleteall", self.batch_timeout);
        self.call(request, "Delete all values")
    }

    fn checked_key(&self, key: &str, what: &str) -> Result<String, ValidationError> {
        normalize_key(key).map_err(|e| {
            warn!("Attempted to {} with empty key", what);
            e
        })
    }
}

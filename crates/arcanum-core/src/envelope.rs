//! Canonical response envelope shared by every backend endpoint.
//!
//! The backend wraps all responses in `{ code, msg, data?, rows?, total? }`.
//! A handful of endpoints (captcha, user info) also put fields at the top
//! level next to the envelope, so unknown fields are kept in `extra`.

use crate::error::{ArcanumError, Result};
use serde::Deserialize;
use serde_json::{Map, Value};

/// HTTP-ish application code signalling success.
pub const CODE_OK: i64 = 200;
/// Application code signalling an expired or missing credential.
pub const CODE_UNAUTHORIZED: i64 = 401;

/// The uniform response envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub rows: Option<Value>,
    #[serde(default)]
    pub total: Option<i64>,
    /// Top-level fields outside the canonical envelope shape.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Envelope {
    /// The application code, defaulting to the given transport status when
    /// the body omits it.
    pub fn code_or(&self, fallback: i64) -> i64 {
        self.code.unwrap_or(fallback)
    }

    /// The envelope message, or an empty string.
    pub fn msg(&self) -> &str {
        self.msg.as_deref().unwrap_or("")
    }

    /// Deserializes the `data` payload into `T`.
    ///
    /// # Errors
    ///
    /// Returns an Upstream error when `data` is absent, or a Serialization
    /// error when it does not match `T`.
    pub fn data_as<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        match &self.data {
            Some(value) => Ok(serde_json::from_value(value.clone())?),
            None => Err(ArcanumError::upstream(
                self.code_or(CODE_OK),
                "响应数据为空",
            )),
        }
    }

    /// Deserializes the `data` payload into `T`, returning `None` when absent.
    pub fn opt_data_as<T: serde::de::DeserializeOwned>(&self) -> Result<Option<T>> {
        match &self.data {
            Some(Value::Null) | None => Ok(None),
            Some(value) => Ok(Some(serde_json::from_value(value.clone())?)),
        }
    }

    /// Deserializes the `rows` payload into a vector, defaulting to empty
    /// when the server omitted it.
    pub fn rows_as<T: serde::de::DeserializeOwned>(&self) -> Result<Vec<T>> {
        match &self.rows {
            Some(Value::Null) | None => Ok(Vec::new()),
            Some(value) => Ok(serde_json::from_value(value.clone())?),
        }
    }

    /// Server-reported total, falling back to the observed row count.
    pub fn total_or(&self, observed: usize) -> i64 {
        self.total.unwrap_or(observed as i64)
    }

    /// Looks up a top-level field outside the canonical envelope.
    pub fn extra_as<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.extra
            .get(key)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }
}

//! Wire types of the JSON protocol binding
//!
//! Variable bindings travel as `{"oid": "1.3.6...", "type": "integer", "value": 5}`.
//! Read requests may omit both `type` and `value`. Exceptions in responses
//! carry a type and no value.

use serde::{Deserialize, Serialize};

use crate::error::ErrorStatus;
use crate::handlers::Response;
use crate::mib::{Access, ObjectKind, Oid, Value, VarBind, VarValue};

use super::error::ApiError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WireType {
    Text,
    Integer,
    #[default]
    Null,
    NoSuchObject,
    EndOfMibView,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireVarBind {
    pub oid: String,

    #[serde(rename = "type", default)]
    pub kind: WireType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
}

impl WireVarBind {
    pub fn read(oid: impl Into<String>) -> Self {
        Self {
            oid: oid.into(),
            kind: WireType::Null,
            value: None,
        }
    }

    pub fn text(oid: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            oid: oid.into(),
            kind: WireType::Text,
            value: Some(serde_json::Value::String(text.into())),
        }
    }

    pub fn integer(oid: impl Into<String>, value: i64) -> Self {
        Self {
            oid: oid.into(),
            kind: WireType::Integer,
            value: Some(value.into()),
        }
    }

    /// Decode into an identifier and a proposed value
    ///
    /// A missing or `null` value decodes as [`Value::Null`] whatever the
    /// declared type.
    pub fn decode(&self) -> Result<(Oid, Value), ApiError> {
        let oid: Oid = self.oid.parse()?;

        let value = match (self.kind, &self.value) {
            (_, None | Some(serde_json::Value::Null)) => Value::Null,
            (WireType::Text, Some(serde_json::Value::String(text))) => Value::Text(text.clone()),
            (WireType::Integer, Some(number)) => number
                .as_i64()
                .map(Value::Integer)
                .ok_or_else(|| ApiError::InvalidRequest(format!("{oid}: not an integer: {number}")))?,
            (kind, Some(value)) => {
                return Err(ApiError::InvalidRequest(format!(
                    "{oid}: value {value} does not match type {kind:?}"
                )));
            }
        };

        Ok((oid, value))
    }
}

impl From<&Value> for WireVarBind {
    fn from(value: &Value) -> Self {
        let (kind, value) = match value {
            Value::Text(text) => (WireType::Text, Some(serde_json::Value::String(text.clone()))),
            Value::Integer(number) => (WireType::Integer, Some((*number).into())),
            Value::Null => (WireType::Null, None),
        };

        Self {
            oid: String::new(),
            kind,
            value,
        }
    }
}

impl From<&VarBind> for WireVarBind {
    fn from(varbind: &VarBind) -> Self {
        let mut wire = match &varbind.value {
            VarValue::Value(value) => WireVarBind::from(value),
            VarValue::NoSuchObject => WireVarBind {
                oid: String::new(),
                kind: WireType::NoSuchObject,
                value: None,
            },
            VarValue::EndOfMibView => WireVarBind {
                oid: String::new(),
                kind: WireType::EndOfMibView,
                value: None,
            },
        };
        wire.oid = varbind.oid.to_string();
        wire
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationRequest {
    pub varbinds: Vec<WireVarBind>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationResponse {
    /// `no_error` or the snake_case error status
    pub error_status: String,

    /// SNMPv2 error-status code, 0 on success
    pub error_code: u32,

    /// 1-based position of the failing varbind, 0 on success
    pub error_index: usize,

    pub varbinds: Vec<WireVarBind>,
}

impl From<&Response> for OperationResponse {
    fn from(response: &Response) -> Self {
        Self {
            error_status: response
                .error_status
                .map_or("no_error", ErrorStatus::as_str)
                .to_string(),
            error_code: response.error_status.map_or(0, ErrorStatus::code),
            error_index: response.error_index,
            varbinds: response.varbinds.iter().map(WireVarBind::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub objects: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectInfo {
    pub oid: String,
    pub name: String,
    pub syntax: ObjectKind,
    pub access: Access,
    pub value: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectsResponse {
    pub base_oid: String,
    pub objects: Vec<ObjectInfo>,
}

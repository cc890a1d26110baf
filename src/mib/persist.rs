//! Whole-file JSON snapshot of the store
//!
//! ```json
//! {
//!   "baseoid": "1.3.6.1.4.1.28308.1",
//!   "scalars": {
//!     "manager": { "oid": "1.3.6.1.4.1.28308.1.1.0", "type": "DisplayString",
//!                  "access": "read-write", "value": "manager" },
//!     ...
//!   }
//! }
//! ```
//!
//! Only `value` is read back; the remaining fields describe the object for
//! humans and other tools. Loaded values are not checked against constraints.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use crate::error::StoreResult;

use super::oid::Oid;
use super::registry::{Access, ObjectKind, Registry};
use super::value::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseoid: Option<Oid>,
    #[serde(default)]
    pub scalars: BTreeMap<String, PersistedScalar>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedScalar {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oid: Option<Oid>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ObjectKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access: Option<Access>,
    pub value: serde_json::Value,
}

impl StateDocument {
    /// Snapshot `values`, which must be parallel to `registry.objects()`
    pub fn from_values(registry: &Registry, values: &[Value]) -> Self {
        let scalars = registry
            .objects()
            .iter()
            .zip(values)
            .map(|(object, value)| {
                let scalar = PersistedScalar {
                    oid: Some(object.oid.clone()),
                    kind: Some(object.kind),
                    access: Some(object.access),
                    value: to_json(value),
                };
                (object.name.clone(), scalar)
            })
            .collect();

        Self {
            baseoid: Some(registry.base().clone()),
            scalars,
        }
    }

    /// Current value for every registry entry, in registry order
    ///
    /// Entries missing from the document, or stored with the wrong JSON kind,
    /// fall back to the object's default.
    pub fn values_for(&self, registry: &Registry) -> Vec<Value> {
        registry
            .objects()
            .iter()
            .map(|object| {
                let Some(scalar) = self.scalars.get(&object.name) else {
                    trace!("{} not in state file, using default", object.name);
                    return object.default.clone();
                };

                match from_json(object.kind, &scalar.value) {
                    Some(value) => value,
                    None => {
                        warn!(
                            "{}: persisted value {} does not match {:?}, using default",
                            object.name, scalar.value, object.kind
                        );
                        object.default.clone()
                    }
                }
            })
            .collect()
    }

    /// Read the document at `path`; `Ok(None)` if the file does not exist
    pub async fn load(path: &Path) -> StoreResult<Option<Self>> {
        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        let document = serde_json::from_str(&content)?;
        trace!("loaded state from {}", path.display());
        Ok(Some(document))
    }

    /// Replace the file at `path` with this document
    ///
    /// The content goes to a sibling temporary file first and is renamed over
    /// the target, so readers never see a half-written document.
    pub async fn save_atomic(&self, path: &Path) -> StoreResult<()> {
        let content = serde_json::to_vec_pretty(self)?;
        let temporary = temporary_path(path);

        tokio::fs::write(&temporary, content).await?;
        tokio::fs::rename(&temporary, path).await?;

        trace!("saved state to {}", path.display());
        Ok(())
    }
}

fn temporary_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

fn to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Text(text) => serde_json::Value::String(text.clone()),
        Value::Integer(number) => serde_json::Value::from(*number),
        Value::Null => serde_json::Value::Null,
    }
}

fn from_json(kind: ObjectKind, value: &serde_json::Value) -> Option<Value> {
    match kind {
        ObjectKind::Text => value.as_str().map(|text| Value::Text(text.to_string())),
        ObjectKind::Integer => value.as_i64().map(Value::Integer),
    }
}

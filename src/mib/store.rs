//! Current values for every registry entry
//!
//! ## Locking
//!
//! All values live behind a single `RwLock`. Lookups take the shared guard;
//! every mutation (protocol write batch, sampled-value update, explicit save)
//! takes the exclusive guard and rewrites the state file before releasing it,
//! so the file always matches some sequential history of operations.
//!
//! ## Write path
//!
//! ```text
//! write_batch(items, identity)
//!   ├─ validate_write(item 1) ─┐
//!   ├─ ...                     ├─ first failure → BatchFailure { index, status }, nothing applied
//!   ├─ validate_write(item n) ─┘
//!   ├─ apply item 1..n in order
//!   └─ persist snapshot
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, error, info, instrument, trace};

use crate::access::{AccessGate, Identity};
use crate::error::{ErrorStatus, StoreError, StoreResult};

use super::oid::Oid;
use super::persist::StateDocument;
use super::registry::Registry;
use super::value::Value;

/// Audit record of a committed write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteRecord {
    pub oid: Oid,
    pub name: String,
    pub previous: Value,
    pub current: Value,
}

/// First item of a batch that failed validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchFailure {
    /// 1-based position in the request
    pub index: usize,
    pub status: ErrorStatus,
}

#[derive(Debug)]
struct StoreInner {
    registry: Registry,
    gate: AccessGate,
    values: RwLock<Vec<Value>>,
    path: Option<PathBuf>,
}

/// Shared handle to the object store
///
/// Cloning is cheap; all clones see the same values.
#[derive(Debug, Clone)]
pub struct ObjectStore {
    inner: Arc<StoreInner>,
}

impl ObjectStore {
    /// Open a file-backed store
    ///
    /// Values come from the state file at `path` if it exists, otherwise from
    /// the registry defaults, in which case the default document is written
    /// right away.
    pub async fn open(
        registry: Registry,
        gate: AccessGate,
        path: impl Into<PathBuf>,
    ) -> StoreResult<Self> {
        let path = path.into();

        let (values, fresh) = match StateDocument::load(&path).await? {
            Some(document) => {
                debug!("restoring values from {}", path.display());
                (document.values_for(&registry), false)
            }
            None => {
                debug!("no state at {}, starting from defaults", path.display());
                (defaults(&registry), true)
            }
        };

        let store = Self::build(registry, gate, values, Some(path));

        if fresh {
            let values = store.inner.values.write().await;
            store.persist(&values).await;
        }

        Ok(store)
    }

    /// Store without a backing file, initialised from defaults
    pub fn in_memory(registry: Registry, gate: AccessGate) -> Self {
        let values = defaults(&registry);
        Self::build(registry, gate, values, None)
    }

    fn build(registry: Registry, gate: AccessGate, values: Vec<Value>, path: Option<PathBuf>) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                registry,
                gate,
                values: RwLock::new(values),
                path,
            }),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.inner.registry
    }

    pub fn gate(&self) -> &AccessGate {
        &self.inner.gate
    }

    pub fn path(&self) -> Option<&Path> {
        self.inner.path.as_deref()
    }

    /// Value registered exactly at `oid`; `None` means "no such object"
    pub async fn lookup_exact(&self, oid: &Oid) -> Option<Value> {
        let index = self.registry().find(oid)?;
        let values = self.inner.values.read().await;
        values.get(index).cloned()
    }

    /// Smallest registered identifier strictly greater than `oid`, with its
    /// value; `None` means "end of tree"
    pub async fn lookup_successor(&self, oid: &Oid) -> Option<(Oid, Value)> {
        let index = self.registry().successor(oid)?;
        let object = self.registry().get(index)?;
        let values = self.inner.values.read().await;
        values.get(index).map(|value| (object.oid.clone(), value.clone()))
    }

    pub async fn lookup_name(&self, name: &str) -> Option<Value> {
        let index = self.registry().index_of(name)?;
        let values = self.inner.values.read().await;
        values.get(index).cloned()
    }

    /// Check whether `identity` may write `value` to `oid`
    ///
    /// Side-effect free. See [`Registry::validate`] for the check order.
    pub fn validate_write(
        &self,
        oid: &Oid,
        value: &Value,
        identity: &Identity,
    ) -> Result<(), ErrorStatus> {
        let principal = self.gate().resolve(identity);
        self.registry().validate(principal, oid, value).map(|_| ())
    }

    /// Apply a value that already passed [`ObjectStore::validate_write`] and
    /// persist the store
    pub async fn commit_write(&self, oid: &Oid, value: Value) -> StoreResult<WriteRecord> {
        let index = self
            .registry()
            .find(oid)
            .ok_or_else(|| StoreError::UnknownObject(oid.clone()))?;

        let mut values = self.inner.values.write().await;
        let record = self.apply(&mut values, index, value);
        self.persist(&values).await;

        Ok(record)
    }

    /// All-or-nothing write of several objects
    ///
    /// Every item is validated in request order before anything is applied.
    /// On the first failure nothing changes and the failing item's 1-based
    /// position is reported. Otherwise all items are applied in order and
    /// the store is persisted once.
    #[instrument(
        skip(self, items, identity),
        fields(items = items.len(), principal = ?self.gate().resolve(identity))
    )]
    pub async fn write_batch(
        &self,
        items: &[(Oid, Value)],
        identity: &Identity,
    ) -> Result<Vec<WriteRecord>, BatchFailure> {
        let principal = self.gate().resolve(identity);
        let mut values = self.inner.values.write().await;

        let mut indices = Vec::with_capacity(items.len());
        for (position, (oid, value)) in items.iter().enumerate() {
            match self.registry().validate(principal, oid, value) {
                Ok(index) => indices.push(index),
                Err(status) => {
                    debug!("item {} ({oid}) rejected: {status}", position + 1);
                    return Err(BatchFailure {
                        index: position + 1,
                        status,
                    });
                }
            }
        }

        let records = indices
            .into_iter()
            .zip(items)
            .map(|(index, (_, value))| self.apply(&mut values, index, value.clone()))
            .collect();

        self.persist(&values).await;

        Ok(records)
    }

    /// Update a value on behalf of the sampler
    ///
    /// Skips the permission and access checks of the protocol write path but
    /// still persists.
    pub async fn set_sampled_value(&self, oid: &Oid, value: Value) -> StoreResult<()> {
        let index = self
            .registry()
            .find(oid)
            .ok_or_else(|| StoreError::UnknownObject(oid.clone()))?;

        let mut values = self.inner.values.write().await;
        trace!("sampled {} = {value}", self.registry().objects()[index].name);
        values[index] = value;
        self.persist(&values).await;

        Ok(())
    }

    /// Copy of every value, in registry order
    pub async fn values(&self) -> Vec<Value> {
        self.inner.values.read().await.clone()
    }

    /// Write the current values to the state file
    ///
    /// Unlike the implicit save after a mutation, failures are returned.
    pub async fn save(&self) -> StoreResult<()> {
        let Some(path) = self.path() else {
            return Ok(());
        };

        let values = self.inner.values.write().await;
        StateDocument::from_values(self.registry(), &values)
            .save_atomic(path)
            .await
    }

    fn apply(&self, values: &mut [Value], index: usize, value: Value) -> WriteRecord {
        let object = &self.registry().objects()[index];
        let previous = std::mem::replace(&mut values[index], value.clone());

        info!("{}: {previous} -> {value}", object.name);

        WriteRecord {
            oid: object.oid.clone(),
            name: object.name.clone(),
            previous,
            current: value,
        }
    }

    /// Persist under the caller's guard; failures leave memory untouched and
    /// are only logged
    async fn persist(&self, values: &[Value]) {
        let Some(path) = self.path() else {
            return;
        };

        if let Err(e) = StateDocument::from_values(self.registry(), values)
            .save_atomic(path)
            .await
        {
            error!("failed to persist state to {}: {e}", path.display());
        }
    }
}

fn defaults(registry: &Registry) -> Vec<Value> {
    registry
        .objects()
        .iter()
        .map(|object| object.default.clone())
        .collect()
}

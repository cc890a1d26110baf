//! Request handlers for the three management operations
//!
//! The operation set is closed: [`Operation`] has exactly Get, GetNext and
//! Set, and [`OperationHandler`] has one method per variant plus a provided
//! [`OperationHandler::dispatch`]. Handlers are pure translators between a
//! decoded request and store calls; they keep no state of their own.

use async_trait::async_trait;
use tracing::{debug, info, instrument, warn};

use crate::access::Identity;
use crate::error::ErrorStatus;
use crate::mib::{ObjectStore, Oid, Value, VarBind, VarValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Get,
    GetNext,
    Set,
}

/// A decoded request as delivered by the protocol engine
#[derive(Debug, Clone)]
pub struct Request {
    pub operation: Operation,

    /// Requested identifiers with their (proposed) values. Reads carry
    /// [`Value::Null`].
    pub varbinds: Vec<(Oid, Value)>,

    pub identity: Identity,
}

impl Request {
    pub fn new(operation: Operation, varbinds: Vec<(Oid, Value)>, identity: Identity) -> Self {
        Self {
            operation,
            varbinds,
            identity,
        }
    }
}

/// Outcome of a request, ready to be re-encoded by the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// `None` when the request succeeded
    pub error_status: Option<ErrorStatus>,

    /// 1-based position of the failing item, 0 on success
    pub error_index: usize,

    pub varbinds: Vec<VarBind>,
}

impl Response {
    pub fn success(varbinds: Vec<VarBind>) -> Self {
        Self {
            error_status: None,
            error_index: 0,
            varbinds,
        }
    }

    pub fn failure(status: ErrorStatus, index: usize, varbinds: Vec<VarBind>) -> Self {
        Self {
            error_status: Some(status),
            error_index: index,
            varbinds,
        }
    }

    pub fn is_success(&self) -> bool {
        self.error_status.is_none()
    }
}

#[async_trait]
pub trait OperationHandler: Send + Sync {
    async fn get(&self, request: &Request) -> Response;

    async fn get_next(&self, request: &Request) -> Response;

    async fn set(&self, request: &Request) -> Response;

    async fn dispatch(&self, request: &Request) -> Response {
        match request.operation {
            Operation::Get => self.get(request).await,
            Operation::GetNext => self.get_next(request).await,
            Operation::Set => self.set(request).await,
        }
    }
}

/// Handlers backed by an [`ObjectStore`]
#[derive(Clone)]
pub struct StoreHandlers {
    store: ObjectStore,
}

impl StoreHandlers {
    pub fn new(store: ObjectStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &ObjectStore {
        &self.store
    }

    fn name_of(&self, oid: &Oid) -> &str {
        self.store
            .registry()
            .find(oid)
            .and_then(|index| self.store.registry().get(index))
            .map_or("unknown", |object| object.name.as_str())
    }
}

#[async_trait]
impl OperationHandler for StoreHandlers {
    #[instrument(skip_all, fields(items = request.varbinds.len()))]
    async fn get(&self, request: &Request) -> Response {
        let mut varbinds = Vec::with_capacity(request.varbinds.len());

        for (oid, _) in &request.varbinds {
            let value = match self.store.lookup_exact(oid).await {
                Some(value) => {
                    debug!("get {oid} ({}) = {value}", self.name_of(oid));
                    VarValue::Value(value)
                }
                None => {
                    debug!("get {oid}: no such object");
                    VarValue::NoSuchObject
                }
            };
            varbinds.push(VarBind::new(oid.clone(), value));
        }

        Response::success(varbinds)
    }

    #[instrument(skip_all, fields(items = request.varbinds.len()))]
    async fn get_next(&self, request: &Request) -> Response {
        let mut varbinds = Vec::with_capacity(request.varbinds.len());

        for (oid, _) in &request.varbinds {
            let varbind = match self.store.lookup_successor(oid).await {
                Some((next, value)) => {
                    debug!("getnext {oid} -> {next} ({}) = {value}", self.name_of(&next));
                    VarBind::new(next, VarValue::Value(value))
                }
                None => {
                    debug!("getnext {oid}: end of mib view");
                    VarBind::new(oid.clone(), VarValue::EndOfMibView)
                }
            };
            varbinds.push(varbind);
        }

        Response::success(varbinds)
    }

    #[instrument(skip_all, fields(items = request.varbinds.len()))]
    async fn set(&self, request: &Request) -> Response {
        match self
            .store
            .write_batch(&request.varbinds, &request.identity)
            .await
        {
            Ok(records) => {
                info!("set applied {} item(s)", records.len());

                let mut varbinds = Vec::with_capacity(request.varbinds.len());
                for (oid, _) in &request.varbinds {
                    let value = self
                        .store
                        .lookup_exact(oid)
                        .await
                        .map_or(VarValue::NoSuchObject, VarValue::Value);
                    varbinds.push(VarBind::new(oid.clone(), value));
                }

                Response::success(varbinds)
            }
            Err(failure) => {
                warn!(
                    "set rejected at item {}: {} ({:?})",
                    failure.index,
                    failure.status,
                    self.store.gate().resolve(&request.identity)
                );

                // echo the request unchanged
                let varbinds = request
                    .varbinds
                    .iter()
                    .map(|(oid, value)| VarBind::new(oid.clone(), VarValue::Value(value.clone())))
                    .collect();

                Response::failure(failure.status, failure.index, varbinds)
            }
        }
    }
}

pub mod access;
pub mod config;
pub mod error;
pub mod handlers;
pub mod mib;
pub mod notify;
pub mod sampler;
pub mod util;

#[cfg(feature = "api")]
pub mod api;

pub use access::{AccessGate, Identity, Principal};
pub use error::{ErrorStatus, StoreError, StoreResult};
pub use handlers::{Operation, OperationHandler, Request, Response, StoreHandlers};
pub use mib::{ObjectStore, Oid, Registry, Value, VarBind, VarValue};

//! Management information base
//!
//! - [`oid`]: object identifiers and their total order
//! - [`registry`]: the static catalogue of managed scalars
//! - [`value`]: typed values and variable bindings
//! - [`store`]: current values, lookups and the atomic write path
//! - [`persist`]: whole-file JSON snapshot of the store

pub mod oid;
pub mod persist;
pub mod registry;
pub mod store;
pub mod value;

pub use oid::Oid;
pub use registry::{Access, Constraints, ManagedObject, ObjectKind, Registry};
pub use store::{BatchFailure, ObjectStore, WriteRecord};
pub use value::{Value, VarBind, VarValue};

//! Static catalogue of managed scalar objects
//!
//! The registry is built once at startup and never mutated. Entries are kept
//! sorted by identifier so that both exact and successor lookups are binary
//! searches, and so that a store can keep its values in a parallel `Vec`
//! addressed by the same index.

use serde::{Deserialize, Serialize};

use crate::access::Principal;
use crate::error::{ErrorStatus, StoreError, StoreResult};

use super::oid::Oid;
use super::value::Value;

pub const MANAGER: &str = "manager";
pub const MANAGER_EMAIL: &str = "managerEmail";
pub const CPU_USAGE: &str = "cpuUsage";
pub const CPU_THRESHOLD: &str = "cpuThreshold";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectKind {
    #[serde(rename = "DisplayString")]
    Text,
    #[serde(rename = "Integer32")]
    Integer,
}

impl ObjectKind {
    pub fn matches(self, value: &Value) -> bool {
        matches!(
            (self, value),
            (ObjectKind::Text, Value::Text(_)) | (ObjectKind::Integer, Value::Integer(_))
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Access {
    ReadOnly,
    ReadWrite,
}

impl Access {
    pub fn short(self) -> &'static str {
        match self {
            Access::ReadOnly => "RO",
            Access::ReadWrite => "RW",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constraints {
    /// Inclusive bounds on the number of characters
    Length { min: usize, max: usize },

    /// Inclusive bounds on the numeric value
    Range { min: i64, max: i64 },
}

impl Constraints {
    /// Whether `value` is acceptable. A value of the wrong kind is never
    /// acceptable.
    pub fn allows(&self, value: &Value) -> bool {
        match (self, value) {
            (Constraints::Length { min, max }, Value::Text(text)) => {
                (*min..=*max).contains(&text.chars().count())
            }
            (Constraints::Range { min, max }, Value::Integer(number)) => {
                (*min..=*max).contains(number)
            }
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedObject {
    pub oid: Oid,
    pub name: String,
    pub kind: ObjectKind,
    pub access: Access,
    pub constraints: Constraints,
    pub default: Value,
}

impl ManagedObject {
    pub fn text(
        oid: Oid,
        name: &str,
        access: Access,
        (min, max): (usize, usize),
        default: &str,
    ) -> Self {
        Self {
            oid,
            name: name.to_string(),
            kind: ObjectKind::Text,
            access,
            constraints: Constraints::Length { min, max },
            default: Value::Text(default.to_string()),
        }
    }

    pub fn integer(
        oid: Oid,
        name: &str,
        access: Access,
        (min, max): (i64, i64),
        default: i64,
    ) -> Self {
        Self {
            oid,
            name: name.to_string(),
            kind: ObjectKind::Integer,
            access,
            constraints: Constraints::Range { min, max },
            default: Value::Integer(default),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Registry {
    base: Oid,
    objects: Vec<ManagedObject>,
}

impl Registry {
    /// Build a registry from an arbitrary set of objects
    ///
    /// Fails if two objects share an identifier.
    pub fn new(base: Oid, mut objects: Vec<ManagedObject>) -> StoreResult<Self> {
        objects.sort_by(|a, b| a.oid.cmp(&b.oid));

        if let Some(pair) = objects.windows(2).find(|pair| pair[0].oid == pair[1].oid) {
            return Err(StoreError::DuplicateOid(pair[0].oid.clone()));
        }

        Ok(Self { base, objects })
    }

    /// The four scalars this agent exposes, rooted at `base`
    pub fn scalar_agent(base: &Oid) -> StoreResult<Self> {
        Self::new(
            base.clone(),
            vec![
                ManagedObject::text(
                    base.child(&[1, 0]),
                    MANAGER,
                    Access::ReadWrite,
                    (1, 255),
                    "manager",
                ),
                ManagedObject::text(
                    base.child(&[2, 0]),
                    MANAGER_EMAIL,
                    Access::ReadWrite,
                    (4, 255),
                    "operator@localhost",
                ),
                ManagedObject::integer(
                    base.child(&[3, 0]),
                    CPU_USAGE,
                    Access::ReadOnly,
                    (0, 100),
                    10,
                ),
                ManagedObject::integer(
                    base.child(&[4, 0]),
                    CPU_THRESHOLD,
                    Access::ReadWrite,
                    (0, 100),
                    80,
                ),
            ],
        )
    }

    pub fn base(&self) -> &Oid {
        &self.base
    }

    pub fn objects(&self) -> &[ManagedObject] {
        &self.objects
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ManagedObject> {
        self.objects.get(index)
    }

    /// Index of the entry registered exactly at `oid`
    pub fn find(&self, oid: &Oid) -> Option<usize> {
        self.objects.binary_search_by(|object| object.oid.cmp(oid)).ok()
    }

    /// Index of the smallest entry strictly greater than `oid`
    ///
    /// `oid` does not have to be registered; gaps and prefixes are valid probe
    /// points.
    pub fn successor(&self, oid: &Oid) -> Option<usize> {
        let index = self.objects.partition_point(|object| object.oid <= *oid);
        (index < self.objects.len()).then_some(index)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.objects.iter().position(|object| object.name == name)
    }

    pub fn by_name(&self, name: &str) -> Option<&ManagedObject> {
        self.index_of(name).map(|index| &self.objects[index])
    }

    /// Run the ordered write checks and return the target's index
    ///
    /// The first failing check determines the reported status:
    /// principal unknown, principal read-only, unregistered identifier,
    /// read-only object, kind mismatch, constraint violation.
    pub fn validate(
        &self,
        principal: Principal,
        oid: &Oid,
        value: &Value,
    ) -> Result<usize, ErrorStatus> {
        if !principal.can_write() {
            return Err(ErrorStatus::AuthorizationError);
        }

        let index = self.find(oid).ok_or(ErrorStatus::NoSuchObject)?;
        let object = &self.objects[index];

        if object.access != Access::ReadWrite {
            return Err(ErrorStatus::NotWritable);
        }

        if !object.kind.matches(value) {
            return Err(ErrorStatus::WrongType);
        }

        if !object.constraints.allows(value) {
            return Err(ErrorStatus::WrongValue);
        }

        Ok(index)
    }
}

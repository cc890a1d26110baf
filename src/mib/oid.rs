//! Object identifiers
//!
//! An [`Oid`] is an ordered sequence of non-negative integers. Ordering is
//! lexicographic, component-wise, with a proper prefix sorting before any of
//! its extensions (`1.3` < `1.3.0` < `1.4`). This is exactly the ordering
//! `Vec<u32>` already implements, so it is derived.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::StoreError;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Oid(Vec<u32>);

impl Oid {
    pub fn new(components: impl Into<Vec<u32>>) -> Self {
        Self(components.into())
    }

    pub fn components(&self) -> &[u32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// New identifier with `suffix` appended
    pub fn child(&self, suffix: &[u32]) -> Oid {
        let mut components = self.0.clone();
        components.extend_from_slice(suffix);
        Oid(components)
    }

    pub fn starts_with(&self, prefix: &Oid) -> bool {
        self.0.starts_with(&prefix.0)
    }
}

impl FromStr for Oid {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // leading dot is accepted, as net-snmp tools print it
        let trimmed = s.trim().trim_start_matches('.');
        if trimmed.is_empty() {
            return Err(StoreError::InvalidOid(s.to_string()));
        }

        trimmed
            .split('.')
            .map(|part| part.parse::<u32>())
            .collect::<Result<Vec<_>, _>>()
            .map(Oid)
            .map_err(|_| StoreError::InvalidOid(s.to_string()))
    }
}

impl TryFrom<String> for Oid {
    type Error = StoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Oid> for String {
    fn from(oid: Oid) -> Self {
        oid.to_string()
    }
}

impl From<&[u32]> for Oid {
    fn from(components: &[u32]) -> Self {
        Oid(components.to_vec())
    }
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for component in &self.0 {
            if !first {
                f.write_str(".")?;
            }
            write!(f, "{component}")?;
            first = false;
        }
        Ok(())
    }
}

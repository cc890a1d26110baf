//! Community-based access control
//!
//! The protocol engine resolves who sent a request and hands the core an
//! [`Identity`]. The [`AccessGate`] turns that identity into a [`Principal`].
//! Anything the gate does not recognise, including a request the engine
//! could not attribute at all, is [`Principal::Unknown`] and never gets
//! write access.

use std::collections::HashSet;
use std::fmt;

use tracing::trace;

use crate::config::Communities;

/// Requester identity as supplied by the protocol engine
///
/// Community names are credentials, so `Debug` never prints them.
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum Identity {
    /// The engine extracted a community/security name
    Resolved(String),

    /// The engine could not determine who sent the request
    Unresolved,
}

impl Identity {
    pub fn resolved(name: impl Into<String>) -> Self {
        Identity::Resolved(name.into())
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identity::Resolved(_) => f.write_str("Resolved(..)"),
            Identity::Unresolved => f.write_str("Unresolved"),
        }
    }
}

impl From<Option<String>> for Identity {
    fn from(name: Option<String>) -> Self {
        name.map_or(Identity::Unresolved, Identity::Resolved)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Principal {
    Unknown,
    ReadOnly,
    ReadWrite,
}

impl Principal {
    pub fn can_write(self) -> bool {
        matches!(self, Principal::ReadWrite)
    }
}

#[derive(Debug, Clone)]
pub struct AccessGate {
    read_only: HashSet<String>,
    read_write: HashSet<String>,
}

impl AccessGate {
    pub fn new<RO, RW>(read_only: RO, read_write: RW) -> Self
    where
        RO: IntoIterator,
        RO::Item: Into<String>,
        RW: IntoIterator,
        RW::Item: Into<String>,
    {
        Self {
            read_only: read_only.into_iter().map(Into::into).collect(),
            read_write: read_write.into_iter().map(Into::into).collect(),
        }
    }

    pub fn from_config(communities: &Communities) -> Self {
        Self::new(
            communities.read_only.iter().cloned(),
            communities.read_write.iter().cloned(),
        )
    }

    pub fn resolve(&self, identity: &Identity) -> Principal {
        let principal = match identity {
            Identity::Unresolved => Principal::Unknown,
            // a name listed at both levels only gets the weaker one
            Identity::Resolved(name) if self.read_only.contains(name) => Principal::ReadOnly,
            Identity::Resolved(name) if self.read_write.contains(name) => Principal::ReadWrite,
            Identity::Resolved(_) => Principal::Unknown,
        };
        trace!("resolved requester to {principal:?}");
        principal
    }
}

impl Default for AccessGate {
    fn default() -> Self {
        Self::from_config(&Communities::default())
    }
}

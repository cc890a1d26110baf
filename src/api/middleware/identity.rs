//! Requester identity extraction
//!
//! The community name is taken from the `X-Community` header. A missing or
//! non-UTF-8 header is not rejected; it yields [`Identity::Unresolved`] and
//! the access gate decides what that may do.

use std::convert::Infallible;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::access::Identity;

pub const COMMUNITY_HEADER: &str = "x-community";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requester(pub Identity);

#[async_trait]
impl<S> FromRequestParts<S> for Requester
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let community = parts
            .headers
            .get(COMMUNITY_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        Ok(Requester(Identity::from(community)))
    }
}

pub mod identity;

pub use identity::{COMMUNITY_HEADER, Requester};

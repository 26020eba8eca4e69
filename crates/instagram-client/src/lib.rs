//! Instagram lookup client
//!
//! Resolves whether a username exists, its profile picture URL, and whether
//! one account follows another. Lookups run through a strategy chain — an
//! authenticated session when one is configured, falling back to anonymous
//! page fetches — with conclusive answers cached for a bounded TTL.

mod extract;
mod handle;
mod resolver;
mod session;
mod types;
mod upstream;

pub use handle::normalize_handle;
pub use resolver::{InstagramResolver, ResolverConfig};
pub use types::{CacheStats, ExistenceReason, ExistenceResult, FollowReason, FollowResult};

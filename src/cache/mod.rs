//! Agora query cache.
//!
//! A stale-while-revalidate cache for the client data layer:
//!
//! - **Keys** address one read per (scope, normalized filters) tuple.
//! - **The coordinator** deduplicates concurrent fetches, serves stale data
//!   while revalidating, retries once, and applies results in request order.
//! - **Invalidation** is coarse: a mutation to one content kind marks every
//!   entry under that kind stale, because it can affect any filtered view
//!   and the aggregate counts.
//! - **The change feed** is the port mutation paths and realtime bridges
//!   publish into.
//!
//! Staleness windows, retention, and the sweep cadence come from
//! [`CacheConfig`]; see `config.rs` for the defaults.

mod config;
mod entry;
mod events;
mod keys;
mod store;

pub use config::CacheConfig;
pub use entry::{EntryState, QueryOutcome};
pub use events::{ChangeEvent, ChangeFeed};
pub use keys::{KeyScope, QueryKey, normalize_param};
pub use store::{QueryCache, QueryHandle};

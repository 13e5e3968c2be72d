//! Query cache
//!
//! Keyed cache of remote collections shared by every view of the app:
//! - one in-flight request per key, however many views ask
//! - stale-while-revalidate once data is older than the configured stale time
//! - explicit invalidation after successful mutations
//! - optimistic updates with rollback
//! - polling and view scopes that stop their background work on drop

pub mod cache;
pub mod config;
pub mod key;
pub mod poll;
pub mod state;

pub use cache::{fetcher, Fetcher, OptimisticUpdate, QueryCache};
pub use config::CacheConfig;
pub use key::CacheKey;
pub use poll::{PollHandle, ViewScope};
pub use state::QueryState;

//! Remote synchronization.
//!
//! When a user is signed in, planner data lives on the backend:
//!
//! - **Load**: operating code, the last 30 days of plans, goals and the
//!   profile streak are fetched concurrently on connect
//! - **Write**: every mutation updates local state first, then makes one
//!   backend call (optimistic, no rollback)
//! - **Realtime**: change feeds for code, plans and goals are drained on
//!   [`crate::planner::PlannerStore::refresh`]
//! - **Status**: [`SyncStatus`] tracks online/syncing/last-synced/error
//!
//! # Example
//!
//! ```ignore
//! use op::sync::{account, RemotePlannerStore};
//!
//! let session = account::sign_in(&*backend, "me@example.com", "secret")?;
//! let store = RemotePlannerStore::connect(backend, session, today);
//! ```

pub mod account;
pub mod realtime;
pub mod remote;
pub mod status;

pub use realtime::Subscriptions;
pub use remote::{RemotePlannerStore, PLAN_WINDOW_DAYS};
pub use status::SyncStatus;

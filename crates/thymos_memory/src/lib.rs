//! # Thymos Memory
//!
//! Durable per-scope emotion state: the JSON document store with atomic
//! replace, the advisory lock guarding read-modify-write cycles, the user
//! retention policy, and the best-effort scan of sibling agent scopes.

pub mod lock;
pub mod peers;
pub mod retention;
pub mod store;

pub use lock::{with_lock, AdvisoryLock, LockError};
pub use peers::{load_peers, Peer};
pub use retention::prune_users;
pub use store::{load_state, save_state, scope_dir_name, StateStore};

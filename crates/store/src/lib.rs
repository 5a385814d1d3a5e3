//! Branched, append-only session persistence (§4.1, §6.5).
//!
//! A session owns one or more branches; each branch owns a dense,
//! gap-free `seq`-ordered timeline of system reports and user
//! interventions. Writes to a branch are serialized by [`lock::BranchLockMap`]
//! so the Runner's round and a concurrent `delete_last_message` or
//! `fork_branch` can never interleave.

pub mod crypto;
pub mod lock;
pub mod rows;
pub mod store;

pub use lock::BranchLockMap;
pub use store::{SessionSettingsPatch, SessionSummary, Store, RECENT_WINDOW_SIZE};

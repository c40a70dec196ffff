//! # Repositories
//!
//! Data access for the offline queue.
//!
//! - [`queue`] - Pending captures per collection, with the synced flag

pub mod queue;

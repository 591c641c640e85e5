//! Shared plumbing for the Underhood crates.
//!
//! Nothing here knows about tweets or documents. The crate carries the two
//! concerns every binary and boundary crate needs:
//!
//! - [`observability`]: centralised tracing/logging initialisation
//! - [`retry`]: the fixed-delay retry policy applied at I/O boundaries
//!
//! # Examples
//!
//! ```rust
//! use std::time::Duration;
//! use underhood_common::retry::RetryPolicy;
//!
//! let policy = RetryPolicy::bounded(3, Duration::from_millis(10));
//! assert_eq!(policy.max_attempts, Some(3));
//! assert!(RetryPolicy::default().max_attempts.is_none());
//! ```

pub mod observability;
pub mod retry;

pub use retry::RetryPolicy;

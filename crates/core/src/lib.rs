//! Failure model, shared types, and error definitions.
//!
//! Foundation crate -- no I/O dependencies.

pub mod error;
pub mod failure;
pub mod types;

pub use error::{WardenError, WardenResult};
pub use failure::{Cause, Failure, FailureDetail, IntoFailure};
pub use types::{FailureKind, ResourceState};

//! Domain model: references, check outcomes, verdicts, badges, errors.

pub mod badge;
pub mod check;
pub mod error;
pub mod reference;
pub mod verdict;

pub use badge::{BadgeDescriptor, BadgePolicy};
pub use check::{CheckName, CheckOutcome};
pub use error::{FetchError, Result, VerifyError};
pub use reference::RepositoryReference;
pub use verdict::{RepositoryVerdict, RunResultSet};

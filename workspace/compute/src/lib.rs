//! Domain rules of the budgeting service that do not depend on HTTP.
//!
//! Every function taking a connection is generic over [`sea_orm::ConnectionTrait`]
//! so it can run on a plain connection or inside a transaction.

pub mod error;
pub mod ledger;
pub mod period;
pub mod recurrence;
pub mod summary;

#[cfg(test)]
mod testing;

pub use error::{ComputeError, Result};
pub use recurrence::{MaterializationReport, OverflowScope, ReloadReport};

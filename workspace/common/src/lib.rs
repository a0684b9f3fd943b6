//! Common transport-layer types shared between the compute crate and the
//! HTTP handlers. They carry no database concerns so they can be serialized
//! straight into API responses.

mod entries;
mod pagination;
mod summary;

pub use entries::{EntryKind, Recurrence};
pub use pagination::Page;
pub use summary::BudgetSummary;

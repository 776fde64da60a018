//! Vital-sign rules: acceptance bounds and the critical range.
//!
//! Both checks are pure functions over [`Vitals`](crate::models::Vitals).
//! Acceptance happens before anything is written; the critical range is
//! evaluated only for readings that were accepted.

pub mod critical;
pub mod validation;

pub use critical::*;
pub use validation::*;

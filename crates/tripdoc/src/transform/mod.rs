//! Document changes: steps, transactions and selections.

pub mod step;
pub mod transaction;

pub use step::Step;
pub use transaction::{Selection, Transaction};

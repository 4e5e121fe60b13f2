// Points ledger
//
// Append-only record of every point movement. The profile's total is a cache
// of the sum of applied deltas and is rewritten together with each entry.

pub use models::{PointsCategory, PointsLedgerEntry};
pub use service::PointsLedger;

mod models;
mod service;

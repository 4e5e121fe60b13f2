pub mod actions;
pub mod assertions;
pub mod mocks;
pub mod setup;

// Re-export main utilities for use by test files
#[allow(unused_imports)]
pub use assertions::{assert_ledger_matches_total, ProfileAssertion};
#[allow(unused_imports)]
pub use mocks::MockStorage;
#[allow(unused_imports)]
pub use setup::{TestSetup, TestSetupBuilder};

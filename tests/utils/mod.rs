#![allow(dead_code)] // Not every test binary uses every helper

pub mod actions;
pub mod assertions;
pub mod mocks;
pub mod setup;

// Re-export main utilities for use by test files
#[allow(unused_imports)]
pub use assertions::{assert_in_order, index_of};
#[allow(unused_imports)]
pub use mocks::{CallLog, MockServer};
#[allow(unused_imports)]
pub use setup::{init_message, TestSetup, TestSetupBuilder};

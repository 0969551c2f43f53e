//! Executor API Tests
//!
//! End-to-end tests through the public facade:
//! - Command enum - the instruction set, including its JSON form
//! - Output enum - typed results
//! - Error - structured errors with entity paths
//! - Persistence across close and reopen

mod common;

mod error_handling;
mod lifecycle;
mod persistence;

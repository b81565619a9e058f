//! Shared container integration tests
//!
//! Documents, transactions and the events they deliver.

mod doc_tests;
mod event_tests;

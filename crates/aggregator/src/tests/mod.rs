//! Test suites for the aggregation API server.

mod bootstrap_tests;
pub(crate) mod support;

//! Integration tests

mod config_test;
mod scenario_test;
mod service_test;

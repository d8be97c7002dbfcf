//! Integration test modules.

mod batch;
mod config;
mod cross_check;
mod properties;

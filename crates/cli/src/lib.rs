//! Storefront CLI
//!
//! Command-line interface for listing and running the storefront scenarios
//! and for preparing the local environment.

pub mod commands;
pub mod output;

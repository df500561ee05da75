//! # mpki-cli
//!
//! Operator command-line interface for the managed-PKI gateway.
//!
//! ## Features
//!
//! - **Profiles and products**: list provider profiles and the templates
//!   registered for them
//! - **Lifecycle**: enroll, renew, revoke and look up certificates
//! - **Synchronization**: stream every certificate of every product, with
//!   Ctrl-C cancellation
//! - **Output formats**: pretty tables, JSON, CSV

pub mod cli;
pub mod config;
pub mod output;

pub use cli::run;

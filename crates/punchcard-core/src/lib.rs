//! Core types and trait definitions for the punchcard attendance engine.
//!
//! This crate is deliberately free of database, HTTP and filesystem
//! dependencies. The store, the employee directory and the raw punch buffer
//! are collaborator traits; concrete backends live in other crates.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod attendance;
pub mod checkin;
pub mod clock;
pub mod employee;
pub mod error;
pub mod leave;
pub mod punch;
pub mod regularization;
pub mod settings;
pub mod shift;
pub mod store;
pub mod strategy;

pub use error::{Error, Result};

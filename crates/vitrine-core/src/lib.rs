//! Core types and trait definitions for the Vitrine site editor.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! The store and web crates depend on it; it depends on nothing of theirs.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod admin;
pub mod catalog;
pub mod content;
pub mod error;
pub mod history;
pub mod seed;
pub mod session;
pub mod store;
pub mod upload;

pub use error::{Error, Result};

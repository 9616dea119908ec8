//! Core types, capability traits and services for the Depot inventory API.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! Storage is reached through [`store::InventoryStore`]; password hashing and
//! token signing through the traits in [`credentials`].

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod activity;
pub mod credentials;
pub mod error;
pub mod identity;
pub mod item;
pub mod ledger;
pub mod page;
pub mod query;
pub mod store;
pub mod user;

pub use error::{Error, ErrorKind, Result};
pub use identity::IdentityService;
pub use ledger::Ledger;
pub use query::ActivityQuery;

//! FitSphere Core - Shared domain types.
//!
//! This crate provides the types used across all FitSphere components:
//! - `api` - The REST API server
//! - `cli` - Command-line tools for migrations, users and seeding
//! - `integration-tests` - HTTP tests against a running server
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no database
//! access, no HTTP clients. This keeps it lightweight and allows it to be used
//! anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, emails, statuses, addresses and order numbers
//! - [`cart`] - Shopping cart with merge-by-product semantics

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod types;

pub use cart::{Cart, CartError, CartItem};
pub use types::*;

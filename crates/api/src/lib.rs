//! FitSphere API library.
//!
//! The REST API behind the FitSphere storefront SPA: accounts with JWT
//! authentication, the product catalog, registered and guest checkout, the
//! admin back office and a session-backed cart.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

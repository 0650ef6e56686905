//! Core types for FitSphere.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod address;
pub mod email;
pub mod id;
pub mod order_number;
pub mod status;

pub use address::{Address, AddressError};
pub use email::{Email, EmailError};
pub use id::*;
pub use order_number::{OrderKind, OrderNumber, OrderNumberError};
pub use status::*;

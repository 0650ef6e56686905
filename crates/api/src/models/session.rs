//! Types stored in the cart session.

/// Session keys.
pub mod keys {
    /// Key for the serialized [`fitsphere_core::Cart`].
    pub const CART: &str = "cart";
}

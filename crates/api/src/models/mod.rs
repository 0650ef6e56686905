//! Domain models for the API.
//!
//! Row types double as response bodies: every struct here serializes with
//! camelCase field names and integer ids.

pub mod order;
pub mod product;
pub mod session;
pub mod user;

pub use order::{
    AdminOrderView, CheckoutRequest, CustomerInfo, GuestCheckoutRequest, GuestInfo,
    GuestInfoRequest, GuestOrder, NewOrder, NewOrderLine, Order, OrderItem, OrderLineRequest,
    Payment, PaymentRequest, RecentOrder, StatusUpdate,
};
pub use product::{
    NewProduct, Product, ProductFilter, ProductSummary, ProductUpdate, ProductValidationError,
};
pub use session::keys as session_keys;
pub use user::{CustomerContact, User};

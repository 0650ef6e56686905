//! Order types for registered and guest checkout.
//!
//! Registered orders (`O` numbers) reference a user account; guest orders
//! (`G` numbers) carry the buyer's contact details instead. Both embed the
//! same line items, addresses and payment record.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use fitsphere_core::{
    Address, Email, GuestOrderId, OrderId, OrderKind, OrderNumber, OrderStatus, PaymentStatus,
    ProductId, UserId,
};

use super::product::ProductSummary;
use super::user::CustomerContact;

/// Payment record attached to an order.
///
/// Reported by the client; never verified against a payment processor.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub method: String,
    pub status: PaymentStatus,
    pub amount: Decimal,
    pub transaction_id: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub details: Option<serde_json::Value>,
}

/// One order line.
///
/// `product` is `None` once the product has been deleted from the catalog;
/// the name and unit price captured at checkout remain.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product: Option<ProductSummary>,
    pub product_name: String,
    pub quantity: i32,
    pub price: Decimal,
}

/// An order placed by a registered user.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub order_number: OrderNumber,
    /// `None` after the account was deleted.
    pub user_id: Option<UserId>,
    pub products: Vec<OrderItem>,
    pub total_amount: Decimal,
    pub shipping_address: Address,
    pub billing_address: Address,
    pub status: OrderStatus,
    pub payment: Payment,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Contact details of a guest buyer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GuestInfo {
    pub name: String,
    pub email: Email,
    pub phone: Option<String>,
}

/// An order placed through guest checkout.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GuestOrder {
    pub id: GuestOrderId,
    pub order_number: OrderNumber,
    pub guest_info: GuestInfo,
    pub products: Vec<OrderItem>,
    pub total_amount: Decimal,
    pub shipping_address: Address,
    pub billing_address: Address,
    pub status: OrderStatus,
    pub payment: Payment,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One priced line of an order about to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderLine {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: i32,
    pub price: Decimal,
}

/// A validated, priced order ready to be stored.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub lines: Vec<NewOrderLine>,
    pub total_amount: Decimal,
    pub shipping_address: Address,
    pub billing_address: Address,
    pub payment: Payment,
}

// =============================================================================
// Request payloads
// =============================================================================

/// A requested line: product id and quantity.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderLineRequest {
    pub product: ProductId,
    pub quantity: i64,
}

/// Payment details supplied at checkout.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub method: String,
    #[serde(default)]
    pub status: Option<PaymentStatus>,
    #[serde(default)]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub details: Option<serde_json::Value>,
}

/// Body of `POST /api/orders`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub products: Vec<OrderLineRequest>,
    pub shipping_address: Address,
    /// Defaults to the shipping address.
    #[serde(default)]
    pub billing_address: Option<Address>,
    pub payment: PaymentRequest,
}

/// Guest contact details as submitted.
#[derive(Debug, Clone, Deserialize)]
pub struct GuestInfoRequest {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Body of `POST /api/guest-orders/checkout`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuestCheckoutRequest {
    pub guest_info: GuestInfoRequest,
    #[serde(flatten)]
    pub order: CheckoutRequest,
}

/// Body of the status update endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusUpdate {
    pub status: String,
}

// =============================================================================
// Admin views
// =============================================================================

/// Who placed an order, as shown in the admin order list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomerInfo {
    pub name: String,
    pub email: String,
    #[serde(rename = "type")]
    pub kind: OrderKind,
}

/// An order of either kind, flattened for the admin order list.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminOrderView {
    pub id: i32,
    pub order_number: OrderNumber,
    pub kind: OrderKind,
    pub customer_info: CustomerInfo,
    pub products: Vec<OrderItem>,
    pub total_amount: Decimal,
    pub shipping_address: Address,
    pub billing_address: Address,
    pub status: OrderStatus,
    pub payment: Payment,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Dashboard entry for one of the most recent orders.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentOrder {
    pub id: i32,
    pub order_number: OrderNumber,
    pub customer: CustomerContact,
    pub total: Decimal,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub kind: OrderKind,
}

impl From<&AdminOrderView> for RecentOrder {
    fn from(view: &AdminOrderView) -> Self {
        Self {
            id: view.id,
            order_number: view.order_number,
            customer: CustomerContact {
                name: view.customer_info.name.clone(),
                email: view.customer_info.email.clone(),
            },
            total: view.total_amount,
            status: view.status,
            created_at: view.created_at,
            kind: view.kind,
        }
    }
}

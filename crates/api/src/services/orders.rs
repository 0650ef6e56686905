//! Checkout and order status changes.
//!
//! Clients send product ids and quantities only. Names and unit prices are
//! read from the catalog at checkout and stored on the order lines, and the
//! total is computed here.

use chrono::{DateTime, Local, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use thiserror::Error;

use fitsphere_core::{
    AddressError, Cart, CartItem, Email, OrderId, OrderStatus, PaymentStatus, ProductId, UserId,
};

use crate::db::{GuestOrderRepository, OrderRepository, ProductRepository, RepositoryError};
use crate::models::{
    CheckoutRequest, GuestCheckoutRequest, GuestInfo, GuestInfoRequest, GuestOrder, NewOrder,
    NewOrderLine, Order, OrderLineRequest, Payment, PaymentRequest, Product, User,
};

/// Errors from checkout and order updates.
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("order must contain at least one product")]
    EmptyOrder,

    #[error("invalid quantity for product {0}")]
    InvalidQuantity(ProductId),

    #[error("product {0} not found")]
    UnknownProduct(ProductId),

    #[error("order total cannot exceed 9999999999.99")]
    TotalTooLarge,

    #[error("{0}")]
    Address(#[from] AddressError),

    #[error("payment method is required")]
    MissingPaymentMethod,

    #[error("invalid guest info: {0}")]
    InvalidGuestInfo(String),

    #[error("{0}")]
    InvalidStatus(String),

    #[error("order not found")]
    NotFound,

    #[error("not allowed to change this order")]
    Forbidden,

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Largest value the `NUMERIC(12,2)` total columns hold.
const MAX_TOTAL: Decimal = Decimal::from_parts(3_567_587_327, 232, 0, false, 2);

/// Order workflows on top of the order repositories.
pub struct OrderService<'a> {
    products: ProductRepository<'a>,
    orders: OrderRepository<'a>,
    guest_orders: GuestOrderRepository<'a>,
}

impl<'a> OrderService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            products: ProductRepository::new(pool),
            orders: OrderRepository::new(pool),
            guest_orders: GuestOrderRepository::new(pool),
        }
    }

    /// Price and store an order for a signed-in user.
    ///
    /// # Errors
    ///
    /// Returns a validation variant of `OrderError` for bad input and
    /// `OrderError::Repository` if the database fails.
    pub async fn place_order(
        &self,
        user_id: UserId,
        request: &CheckoutRequest,
    ) -> Result<Order, OrderError> {
        let order = self.price(request).await?;
        let order = self
            .orders
            .create(user_id, &order, Local::now().date_naive())
            .await?;
        Ok(order)
    }

    /// Price and store a guest order.
    ///
    /// # Errors
    ///
    /// Same as [`OrderService::place_order`], plus
    /// `OrderError::InvalidGuestInfo` for bad contact details.
    pub async fn place_guest_order(
        &self,
        request: &GuestCheckoutRequest,
    ) -> Result<GuestOrder, OrderError> {
        let guest = validate_guest_info(&request.guest_info)?;
        let order = self.price(&request.order).await?;
        let order = self
            .guest_orders
            .create(&guest, &order, Local::now().date_naive())
            .await?;
        Ok(order)
    }

    /// List a user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Forbidden` unless `viewer` is that user or an admin.
    pub async fn orders_for_user(
        &self,
        viewer: &User,
        user_id: UserId,
    ) -> Result<Vec<Order>, OrderError> {
        if viewer.id != user_id && !viewer.is_admin() {
            return Err(OrderError::Forbidden);
        }
        Ok(self.orders.list_for_user(user_id).await?)
    }

    /// Change the status of a registered order.
    ///
    /// Admins may set any status. The owner may only cancel, and only while
    /// the order has not shipped.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::InvalidStatus`, `OrderError::NotFound` or
    /// `OrderError::Forbidden`.
    pub async fn update_status(
        &self,
        actor: &User,
        order_id: OrderId,
        status: &str,
    ) -> Result<Order, OrderError> {
        let requested = parse_status(status)?;
        let order = self
            .orders
            .get_by_id(order_id)
            .await?
            .ok_or(OrderError::NotFound)?;

        authorize_status_change(actor, &order, requested)?;

        let updated = self
            .orders
            .update_status(order_id, requested)
            .await
            .map_err(not_found)?;

        tracing::info!(
            order_number = %updated.order_number,
            status = %requested,
            actor = %actor.id,
            "Order status updated"
        );
        Ok(updated)
    }

    /// Build the stored form of an order from a checkout request.
    async fn price(&self, request: &CheckoutRequest) -> Result<NewOrder, OrderError> {
        let ids: Vec<ProductId> = request.products.iter().map(|line| line.product).collect();
        let catalog = self.products.get_many(&ids).await?;

        price_order(request, &catalog, Utc::now())
    }
}

/// Parse a status string from a request body.
///
/// # Errors
///
/// Returns `OrderError::InvalidStatus` for unknown values.
pub fn parse_status(status: &str) -> Result<OrderStatus, OrderError> {
    status.trim().parse().map_err(OrderError::InvalidStatus)
}

/// Map a repository `NotFound` to `OrderError::NotFound`.
pub(crate) fn not_found(err: RepositoryError) -> OrderError {
    match err {
        RepositoryError::NotFound => OrderError::NotFound,
        other => OrderError::Repository(other),
    }
}

fn authorize_status_change(
    actor: &User,
    order: &Order,
    requested: OrderStatus,
) -> Result<(), OrderError> {
    if actor.is_admin() {
        return Ok(());
    }

    let owns = order.user_id == Some(actor.id);
    if owns && requested == OrderStatus::Cancelled && order.status.is_cancellable_by_owner() {
        Ok(())
    } else {
        Err(OrderError::Forbidden)
    }
}

fn validate_guest_info(info: &GuestInfoRequest) -> Result<GuestInfo, OrderError> {
    let name = info.name.trim();
    if name.is_empty() {
        return Err(OrderError::InvalidGuestInfo("name is required".to_owned()));
    }

    let email =
        Email::parse(&info.email).map_err(|e| OrderError::InvalidGuestInfo(e.to_string()))?;

    let phone = info
        .phone
        .as_deref()
        .map(str::trim)
        .filter(|phone| !phone.is_empty())
        .map(ToOwned::to_owned);

    Ok(GuestInfo {
        name: name.to_owned(),
        email,
        phone,
    })
}

/// Price a checkout request against catalog products.
///
/// Lines for the same product are merged. `catalog` must contain every
/// requested product; extra entries are ignored.
fn price_order(
    request: &CheckoutRequest,
    catalog: &[Product],
    now: DateTime<Utc>,
) -> Result<NewOrder, OrderError> {
    if request.products.is_empty() {
        return Err(OrderError::EmptyOrder);
    }

    let cart = build_cart(&request.products, catalog)?;

    let lines = cart
        .items()
        .iter()
        .map(|item| {
            let quantity = i32::try_from(item.quantity)
                .map_err(|_| OrderError::InvalidQuantity(item.product_id))?;
            Ok(NewOrderLine {
                product_id: item.product_id,
                product_name: item.name.clone(),
                quantity,
                price: item.price,
            })
        })
        .collect::<Result<Vec<_>, OrderError>>()?;

    let shipping_address = request.shipping_address.trimmed();
    shipping_address.validate()?;

    let billing_address = match &request.billing_address {
        Some(address) => {
            let address = address.trimmed();
            address.validate()?;
            address
        }
        None => shipping_address.clone(),
    };

    let total_amount = cart.total();
    if total_amount > MAX_TOTAL {
        return Err(OrderError::TotalTooLarge);
    }
    let payment = build_payment(&request.payment, total_amount, now)?;

    Ok(NewOrder {
        lines,
        total_amount,
        shipping_address,
        billing_address,
        payment,
    })
}

fn build_cart(lines: &[OrderLineRequest], catalog: &[Product]) -> Result<Cart, OrderError> {
    let mut cart = Cart::default();

    for line in lines {
        let quantity = u32::try_from(line.quantity)
            .ok()
            .filter(|q| *q >= 1)
            .ok_or(OrderError::InvalidQuantity(line.product))?;

        let product = catalog
            .iter()
            .find(|p| p.id == line.product)
            .ok_or(OrderError::UnknownProduct(line.product))?;

        cart.add(CartItem {
            product_id: product.id,
            name: product.name.clone(),
            image: Some(product.image.clone()),
            quantity,
            price: product.price,
        })
        .map_err(|_| OrderError::InvalidQuantity(line.product))?;
    }

    Ok(cart)
}

fn build_payment(
    request: &PaymentRequest,
    amount: Decimal,
    now: DateTime<Utc>,
) -> Result<Payment, OrderError> {
    let method = request.method.trim();
    if method.is_empty() {
        return Err(OrderError::MissingPaymentMethod);
    }

    let status = request.status.unwrap_or_default();
    let paid_at = (status == PaymentStatus::Completed).then_some(now);

    Ok(Payment {
        method: method.to_owned(),
        status,
        amount,
        transaction_id: request.transaction_id.clone(),
        paid_at,
        details: request.details.clone(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use fitsphere_core::{Address, Category, Role};

    use super::*;

    fn product(id: i32, name: &str, cents: i64) -> Product {
        Product {
            id: ProductId::new(id),
            name: name.to_owned(),
            description: String::new(),
            price: Decimal::new(cents, 2),
            stock: 10,
            category: Category::Yoga,
            image: format!("/img/{id}.jpg"),
            trendy: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn address() -> Address {
        Address {
            street: " 12 rue de la Paix ".to_owned(),
            city: "Paris".to_owned(),
            postal_code: "75002".to_owned(),
            country: "France".to_owned(),
        }
    }

    fn request(lines: &[(i32, i64)]) -> CheckoutRequest {
        CheckoutRequest {
            products: lines
                .iter()
                .map(|&(id, quantity)| OrderLineRequest {
                    product: ProductId::new(id),
                    quantity,
                })
                .collect(),
            shipping_address: address(),
            billing_address: None,
            payment: PaymentRequest {
                method: "card".to_owned(),
                status: None,
                transaction_id: None,
                details: None,
            },
        }
    }

    fn user(id: i32, role: Role) -> User {
        User {
            id: UserId::new(id),
            username: format!("user{id}"),
            email: Email::parse(&format!("user{id}@example.com")).unwrap(),
            role,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn order_owned_by(owner: i32, status: OrderStatus) -> Order {
        let priced = price_order(&request(&[(1, 1)]), &[product(1, "Mat", 1000)], Utc::now())
            .unwrap();
        Order {
            id: OrderId::new(9),
            order_number: "O2610180001".parse().unwrap(),
            user_id: Some(UserId::new(owner)),
            products: Vec::new(),
            total_amount: priced.total_amount,
            shipping_address: priced.shipping_address,
            billing_address: priced.billing_address,
            status,
            payment: priced.payment,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_prices_from_catalog_and_merges_lines() {
        let catalog = [product(1, "Yoga mat", 2999), product(2, "Kettlebell", 4500)];
        let order = price_order(&request(&[(1, 1), (2, 2), (1, 2)]), &catalog, Utc::now()).unwrap();

        assert_eq!(order.lines.len(), 2);
        assert_eq!(order.lines[0].product_name, "Yoga mat");
        assert_eq!(order.lines[0].quantity, 3);
        assert_eq!(order.total_amount, Decimal::new(17997, 2));
        assert_eq!(order.payment.amount, order.total_amount);
        assert_eq!(order.payment.status, PaymentStatus::Pending);
        assert!(order.payment.paid_at.is_none());
    }

    #[test]
    fn test_billing_defaults_to_shipping() {
        let order = price_order(&request(&[(1, 1)]), &[product(1, "Mat", 100)], Utc::now())
            .unwrap();
        assert_eq!(order.shipping_address.street, "12 rue de la Paix");
        assert_eq!(order.billing_address, order.shipping_address);
    }

    #[test]
    fn test_completed_payment_sets_paid_at() {
        let mut req = request(&[(1, 1)]);
        req.payment.status = Some(PaymentStatus::Completed);
        let now = Utc::now();

        let order = price_order(&req, &[product(1, "Mat", 100)], now).unwrap();
        assert_eq!(order.payment.paid_at, Some(now));
    }

    #[test]
    fn test_rejects_bad_requests() {
        let catalog = [product(1, "Mat", 100)];

        assert!(matches!(
            price_order(&request(&[]), &catalog, Utc::now()),
            Err(OrderError::EmptyOrder)
        ));
        assert!(matches!(
            price_order(&request(&[(1, 0)]), &catalog, Utc::now()),
            Err(OrderError::InvalidQuantity(_))
        ));
        assert!(matches!(
            price_order(&request(&[(1, -3)]), &catalog, Utc::now()),
            Err(OrderError::InvalidQuantity(_))
        ));
        assert!(matches!(
            price_order(&request(&[(7, 1)]), &catalog, Utc::now()),
            Err(OrderError::UnknownProduct(id)) if id == ProductId::new(7)
        ));

        assert!(matches!(
            price_order(
                &request(&[(1, 2_000_000_000)]),
                &[product(1, "Mat", 1000)],
                Utc::now()
            ),
            Err(OrderError::TotalTooLarge)
        ));
        assert!(
            price_order(
                &request(&[(1, 999_999_999)]),
                &[product(1, "Mat", 1000)],
                Utc::now()
            )
            .is_ok()
        );

        let mut no_city = request(&[(1, 1)]);
        no_city.shipping_address.city = "  ".to_owned();
        assert!(matches!(
            price_order(&no_city, &catalog, Utc::now()),
            Err(OrderError::Address(AddressError::MissingField("city")))
        ));

        let mut no_method = request(&[(1, 1)]);
        no_method.payment.method = String::new();
        assert!(matches!(
            price_order(&no_method, &catalog, Utc::now()),
            Err(OrderError::MissingPaymentMethod)
        ));
    }

    #[test]
    fn test_guest_info_validation() {
        let ok = validate_guest_info(&GuestInfoRequest {
            name: " Lea ".to_owned(),
            email: "Lea@Example.com".to_owned(),
            phone: Some("   ".to_owned()),
        })
        .unwrap();
        assert_eq!(ok.name, "Lea");
        assert!(ok.phone.is_none());

        assert!(matches!(
            validate_guest_info(&GuestInfoRequest {
                name: "Lea".to_owned(),
                email: "not-an-email".to_owned(),
                phone: None,
            }),
            Err(OrderError::InvalidGuestInfo(_))
        ));
    }

    #[test]
    fn test_parse_status() {
        assert_eq!(parse_status("shipped").unwrap(), OrderStatus::Shipped);
        assert!(matches!(parse_status("lost"), Err(OrderError::InvalidStatus(_))));
    }

    #[test]
    fn test_status_change_rules() {
        let owner = user(1, Role::User);
        let stranger = user(2, Role::User);
        let admin = user(3, Role::Admin);
        let pending = order_owned_by(1, OrderStatus::Pending);
        let shipped = order_owned_by(1, OrderStatus::Shipped);

        assert!(authorize_status_change(&owner, &pending, OrderStatus::Cancelled).is_ok());
        assert!(authorize_status_change(&owner, &pending, OrderStatus::Delivered).is_err());
        assert!(authorize_status_change(&owner, &shipped, OrderStatus::Cancelled).is_err());
        assert!(authorize_status_change(&stranger, &pending, OrderStatus::Cancelled).is_err());
        assert!(authorize_status_change(&admin, &shipped, OrderStatus::Pending).is_ok());
    }
}

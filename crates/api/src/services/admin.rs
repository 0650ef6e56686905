//! Back-office views across registered and guest orders.

use std::collections::HashMap;

use serde::Serialize;
use sqlx::PgPool;
use thiserror::Error;

use fitsphere_core::{OrderKind, OrderNumber, UserId};

use super::orders::parse_status;
use crate::db::{
    GuestOrderRepository, OrderRepository, ProductRepository, RepositoryError, UserRepository,
};
use crate::models::{
    AdminOrderView, CustomerContact, CustomerInfo, GuestOrder, Order, RecentOrder, User,
};

/// Number of orders shown on the dashboard.
const RECENT_ORDERS: i64 = 5;

#[derive(Debug, Error)]
pub enum AdminError {
    #[error("user not found")]
    UserNotFound,

    #[error("cannot delete admin user")]
    CannotDeleteAdmin,

    #[error("order not found")]
    OrderNotFound,

    #[error("{0}")]
    InvalidStatus(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Dashboard counters.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminStats {
    pub total_users: i64,
    pub total_products: i64,
    /// Registered and guest orders together.
    pub total_orders: i64,
    pub recent_orders: Vec<RecentOrder>,
}

/// Result of an admin status change.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChange {
    pub message: String,
    pub order: AdminOrderView,
    pub is_guest_order: bool,
}

pub struct AdminService<'a> {
    users: UserRepository<'a>,
    products: ProductRepository<'a>,
    orders: OrderRepository<'a>,
    guest_orders: GuestOrderRepository<'a>,
}

impl<'a> AdminService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
            products: ProductRepository::new(pool),
            orders: OrderRepository::new(pool),
            guest_orders: GuestOrderRepository::new(pool),
        }
    }

    /// Counts and the most recent orders of either kind.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Repository` if a query fails.
    pub async fn stats(&self) -> Result<AdminStats, AdminError> {
        let orders = self.orders.list_recent(Some(RECENT_ORDERS)).await?;
        let guest_orders = self.guest_orders.list_recent(Some(RECENT_ORDERS)).await?;

        let mut views = self.views(orders, guest_orders).await?;
        views.truncate(usize::try_from(RECENT_ORDERS).unwrap_or_default());

        Ok(AdminStats {
            total_users: self.users.count().await?,
            total_products: self.products.count().await?,
            total_orders: self.orders.count().await? + self.guest_orders.count().await?,
            recent_orders: views.iter().map(RecentOrder::from).collect(),
        })
    }

    /// Every order of both kinds, newest first.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Repository` if a query fails.
    pub async fn all_orders(&self) -> Result<Vec<AdminOrderView>, AdminError> {
        let orders = self.orders.list_recent(None).await?;
        let guest_orders = self.guest_orders.list_recent(None).await?;
        self.views(orders, guest_orders).await
    }

    /// Set the status of an order identified by its number.
    ///
    /// The prefix letter selects the registered or guest table. Numbers that
    /// don't parse are reported as not found.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::InvalidStatus` or `AdminError::OrderNotFound`.
    pub async fn update_order_status(
        &self,
        order_number: &str,
        status: &str,
    ) -> Result<StatusChange, AdminError> {
        let status = parse_status(status).map_err(|e| AdminError::InvalidStatus(e.to_string()))?;
        let number =
            OrderNumber::parse(order_number.trim()).map_err(|_| AdminError::OrderNotFound)?;

        let view = match number.kind() {
            OrderKind::Registered => {
                let order = self
                    .orders
                    .get_by_number(&number)
                    .await?
                    .ok_or(AdminError::OrderNotFound)?;
                let order = self
                    .orders
                    .update_status(order.id, status)
                    .await
                    .map_err(order_not_found)?;
                self.views(vec![order], Vec::new()).await?.pop()
            }
            OrderKind::Guest => {
                let order = self
                    .guest_orders
                    .get_by_number(&number)
                    .await?
                    .ok_or(AdminError::OrderNotFound)?;
                let order = self
                    .guest_orders
                    .update_status(order.id, status)
                    .await
                    .map_err(order_not_found)?;
                Some(guest_view(order))
            }
        }
        .ok_or(AdminError::OrderNotFound)?;

        tracing::info!(order_number = %number, %status, "Order status set by admin");

        Ok(StatusChange {
            message: "Order status updated successfully".to_owned(),
            order: view,
            is_guest_order: number.kind() == OrderKind::Guest,
        })
    }

    /// Delete a shopper account. Admin accounts cannot be deleted here.
    ///
    /// Their orders stay, detached from the account.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::UserNotFound` or `AdminError::CannotDeleteAdmin`.
    pub async fn delete_user(&self, user_id: UserId) -> Result<(), AdminError> {
        let user = self
            .users
            .get_by_id(user_id)
            .await?
            .ok_or(AdminError::UserNotFound)?;

        if user.is_admin() {
            return Err(AdminError::CannotDeleteAdmin);
        }

        if !self.users.delete(user_id).await? {
            return Err(AdminError::UserNotFound);
        }

        tracing::info!(user_id = %user_id, "User deleted");
        Ok(())
    }

    async fn views(
        &self,
        orders: Vec<Order>,
        guest_orders: Vec<GuestOrder>,
    ) -> Result<Vec<AdminOrderView>, AdminError> {
        let mut user_ids: Vec<UserId> = orders.iter().filter_map(|o| o.user_id).collect();
        user_ids.sort_unstable();
        user_ids.dedup();

        let users: HashMap<UserId, User> = self
            .users
            .get_many(&user_ids)
            .await?
            .into_iter()
            .map(|user| (user.id, user))
            .collect();

        Ok(merge_newest_first(
            orders
                .into_iter()
                .map(|order| registered_view(order, &users))
                .collect(),
            guest_orders.into_iter().map(guest_view).collect(),
        ))
    }
}

fn order_not_found(err: RepositoryError) -> AdminError {
    match err {
        RepositoryError::NotFound => AdminError::OrderNotFound,
        other => AdminError::Repository(other),
    }
}

fn registered_view(order: Order, users: &HashMap<UserId, User>) -> AdminOrderView {
    let contact = order
        .user_id
        .and_then(|id| users.get(&id))
        .map_or_else(CustomerContact::deleted_user, CustomerContact::from);

    AdminOrderView {
        id: order.id.as_i32(),
        order_number: order.order_number,
        kind: OrderKind::Registered,
        customer_info: CustomerInfo {
            name: contact.name,
            email: contact.email,
            kind: OrderKind::Registered,
        },
        products: order.products,
        total_amount: order.total_amount,
        shipping_address: order.shipping_address,
        billing_address: order.billing_address,
        status: order.status,
        payment: order.payment,
        created_at: order.created_at,
        updated_at: order.updated_at,
    }
}

fn guest_view(order: GuestOrder) -> AdminOrderView {
    AdminOrderView {
        id: order.id.as_i32(),
        order_number: order.order_number,
        kind: OrderKind::Guest,
        customer_info: CustomerInfo {
            name: order.guest_info.name,
            email: order.guest_info.email.to_string(),
            kind: OrderKind::Guest,
        },
        products: order.products,
        total_amount: order.total_amount,
        shipping_address: order.shipping_address,
        billing_address: order.billing_address,
        status: order.status,
        payment: order.payment,
        created_at: order.created_at,
        updated_at: order.updated_at,
    }
}

/// Merge two lists into one ordered by creation time, newest first.
///
/// Ties are broken by order number so the result is stable.
fn merge_newest_first(
    mut registered: Vec<AdminOrderView>,
    guest: Vec<AdminOrderView>,
) -> Vec<AdminOrderView> {
    registered.extend(guest);
    registered.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.order_number.cmp(&a.order_number))
    });
    registered
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{Duration, Utc};
    use fitsphere_core::{Address, Email, GuestOrderId, OrderId, OrderStatus, PaymentStatus, Role};
    use rust_decimal::Decimal;

    use super::*;
    use crate::models::{GuestInfo, Payment};

    fn address() -> Address {
        Address {
            street: "Carrer de Mallorca 401".to_owned(),
            city: "Barcelona".to_owned(),
            postal_code: "08013".to_owned(),
            country: "Spain".to_owned(),
        }
    }

    fn payment(total: Decimal) -> Payment {
        Payment {
            method: "card".to_owned(),
            status: PaymentStatus::Pending,
            amount: total,
            transaction_id: None,
            paid_at: None,
            details: None,
        }
    }

    fn order(id: i32, number: &str, user: Option<i32>, minutes_ago: i64) -> Order {
        let created = Utc::now() - Duration::minutes(minutes_ago);
        Order {
            id: OrderId::new(id),
            order_number: number.parse().unwrap(),
            user_id: user.map(UserId::new),
            products: Vec::new(),
            total_amount: Decimal::new(5000, 2),
            shipping_address: address(),
            billing_address: address(),
            status: OrderStatus::Pending,
            payment: payment(Decimal::new(5000, 2)),
            created_at: created,
            updated_at: created,
        }
    }

    fn guest_order(id: i32, number: &str, minutes_ago: i64) -> GuestOrder {
        let created = Utc::now() - Duration::minutes(minutes_ago);
        GuestOrder {
            id: GuestOrderId::new(id),
            order_number: number.parse().unwrap(),
            guest_info: GuestInfo {
                name: "Marta".to_owned(),
                email: Email::parse("marta@example.com").unwrap(),
                phone: None,
            },
            products: Vec::new(),
            total_amount: Decimal::new(2500, 2),
            shipping_address: address(),
            billing_address: address(),
            status: OrderStatus::Processing,
            payment: payment(Decimal::new(2500, 2)),
            created_at: created,
            updated_at: created,
        }
    }

    fn users() -> HashMap<UserId, User> {
        let user = User {
            id: UserId::new(1),
            username: "jordi".to_owned(),
            email: Email::parse("jordi@example.com").unwrap(),
            role: Role::User,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        HashMap::from([(user.id, user)])
    }

    #[test]
    fn test_registered_view_uses_account_contact() {
        let view = registered_view(order(1, "O2610180001", Some(1), 0), &users());
        assert_eq!(view.customer_info.name, "jordi");
        assert_eq!(view.customer_info.email, "jordi@example.com");
        assert_eq!(view.customer_info.kind, OrderKind::Registered);
    }

    #[test]
    fn test_registered_view_for_deleted_user() {
        let view = registered_view(order(1, "O2610180001", None, 0), &users());
        assert_eq!(view.customer_info.name, "Deleted user");
        assert_eq!(view.customer_info.email, "unknown");
    }

    #[test]
    fn test_merge_orders_newest_first() {
        let users = users();
        let registered = vec![
            registered_view(order(1, "O2610180001", Some(1), 30), &users),
            registered_view(order(2, "O2610180002", Some(1), 10), &users),
        ];
        let guest = vec![guest_view(guest_order(1, "G2610180001", 20))];

        let merged = merge_newest_first(registered, guest);
        let numbers: Vec<String> = merged.iter().map(|v| v.order_number.to_string()).collect();
        assert_eq!(numbers, ["O2610180002", "G2610180001", "O2610180001"]);
        assert_eq!(merged[1].kind, OrderKind::Guest);
        assert_eq!(merged[1].customer_info.name, "Marta");
    }

    #[test]
    fn test_recent_order_from_view() {
        let view = guest_view(guest_order(4, "G2610180004", 0));
        let recent = RecentOrder::from(&view);
        assert_eq!(recent.id, 4);
        assert_eq!(recent.customer.email, "marta@example.com");
        assert_eq!(recent.total, Decimal::new(2500, 2));
        assert_eq!(recent.kind, OrderKind::Guest);
    }
}

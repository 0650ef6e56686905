//! Repository for orders placed by registered users.

use chrono::NaiveDate;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::instrument;

use fitsphere_core::{OrderId, OrderKind, OrderNumber, OrderStatus, UserId};

use super::RepositoryError;
use super::order_rows::{self, HEADER_COLUMNS, HeaderRow, INSERT_COLUMNS};
use crate::models::{NewOrder, Order};

const ORDERS: &str = "fitsphere.orders";
const ORDER_ITEMS: &str = "fitsphere.order_items";

#[derive(sqlx::FromRow)]
struct OrderRow {
    #[sqlx(flatten)]
    header: HeaderRow,
    user_id: Option<UserId>,
}

/// Repository for registered-user orders.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Store an order, assigning the next `O` number for `date`.
    ///
    /// The number, the order row and its lines are written in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any statement fails.
    #[instrument(skip(self, order), fields(lines = order.lines.len()))]
    pub async fn create(
        &self,
        user_id: UserId,
        order: &NewOrder,
        date: NaiveDate,
    ) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let number =
            order_rows::next_order_number(&mut *tx, OrderKind::Registered, ORDERS, date).await?;

        let mut query: QueryBuilder<'_, Postgres> = QueryBuilder::new(format!(
            "INSERT INTO {ORDERS} (order_number, user_id, {INSERT_COLUMNS}) VALUES ("
        ));
        let mut values = query.separated(", ");
        values.push_bind(number.to_string()).push_bind(user_id);
        order_rows::push_header_values(&mut values, order);
        query.push(") RETURNING id");

        let (id,): (i32,) = query.build_query_as::<(i32,)>().fetch_one(&mut *tx).await?;

        order_rows::insert_items(&mut *tx, ORDER_ITEMS, id, order).await?;
        tx.commit().await?;

        tracing::info!(order_number = %number, "Order created");

        self.get_by_id(OrderId::new(id))
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Get an order by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {HEADER_COLUMNS}, user_id FROM {ORDERS} WHERE id = $1"
        ))
        .bind(id)
        .fetch_all(self.pool)
        .await?;

        Ok(self.assemble(rows).await?.pop())
    }

    /// Get an order by its `O` number.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_number(
        &self,
        number: &OrderNumber,
    ) -> Result<Option<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {HEADER_COLUMNS}, user_id FROM {ORDERS} WHERE order_number = $1"
        ))
        .bind(number.to_string())
        .fetch_all(self.pool)
        .await?;

        Ok(self.assemble(rows).await?.pop())
    }

    /// List a user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {HEADER_COLUMNS}, user_id FROM {ORDERS} \
             WHERE user_id = $1 ORDER BY created_at DESC, id DESC"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        self.assemble(rows).await
    }

    /// List orders newest first, optionally limited.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_recent(&self, limit: Option<i64>) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {HEADER_COLUMNS}, user_id FROM {ORDERS} \
             ORDER BY created_at DESC, id DESC LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        self.assemble(rows).await
    }

    /// Set an order's status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist.
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn update_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, RepositoryError> {
        let result = sqlx::query(&format!("UPDATE {ORDERS} SET status = $2 WHERE id = $1"))
            .bind(id)
            .bind(status)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        self.get_by_id(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Count all registered-user orders.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let (count,): (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {ORDERS}"))
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }

    async fn assemble(&self, rows: Vec<OrderRow>) -> Result<Vec<Order>, RepositoryError> {
        let ids: Vec<i32> = rows.iter().map(|r| r.header.id).collect();
        let mut items = order_rows::fetch_items(self.pool, ORDER_ITEMS, &ids).await?;

        rows.into_iter()
            .map(|row| {
                let header = row.header;
                Ok(Order {
                    id: OrderId::new(header.id),
                    order_number: header.order_number()?,
                    user_id: row.user_id,
                    products: items.remove(&header.id).unwrap_or_default(),
                    total_amount: header.total_amount,
                    shipping_address: header.shipping_address(),
                    billing_address: header.billing_address(),
                    status: header.status,
                    payment: header.payment(),
                    created_at: header.created_at,
                    updated_at: header.updated_at,
                })
            })
            .collect()
    }
}

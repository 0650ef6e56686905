//! Repository for guest checkout orders.

use chrono::NaiveDate;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::instrument;

use fitsphere_core::{Email, GuestOrderId, OrderKind, OrderNumber, OrderStatus};

use super::RepositoryError;
use super::order_rows::{self, HEADER_COLUMNS, HeaderRow, INSERT_COLUMNS};
use crate::models::{GuestInfo, GuestOrder, NewOrder};

const GUEST_ORDERS: &str = "fitsphere.guest_orders";
const GUEST_ORDER_ITEMS: &str = "fitsphere.guest_order_items";

#[derive(sqlx::FromRow)]
struct GuestOrderRow {
    #[sqlx(flatten)]
    header: HeaderRow,
    guest_name: String,
    guest_email: Email,
    guest_phone: Option<String>,
}

/// Repository for guest orders.
pub struct GuestOrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> GuestOrderRepository<'a> {
    /// Create a new guest order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Store a guest order, assigning the next `G` number for `date`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any statement fails.
    #[instrument(skip_all, fields(lines = order.lines.len()))]
    pub async fn create(
        &self,
        guest: &GuestInfo,
        order: &NewOrder,
        date: NaiveDate,
    ) -> Result<GuestOrder, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let number =
            order_rows::next_order_number(&mut *tx, OrderKind::Guest, GUEST_ORDERS, date).await?;

        let mut query: QueryBuilder<'_, Postgres> = QueryBuilder::new(format!(
            "INSERT INTO {GUEST_ORDERS} \
             (order_number, guest_name, guest_email, guest_phone, {INSERT_COLUMNS}) VALUES ("
        ));
        let mut values = query.separated(", ");
        values
            .push_bind(number.to_string())
            .push_bind(guest.name.clone())
            .push_bind(guest.email.clone())
            .push_bind(guest.phone.clone());
        order_rows::push_header_values(&mut values, order);
        query.push(") RETURNING id");

        let (id,) = query
            .build_query_as::<(i32,)>()
            .fetch_one(&mut *tx)
            .await?;

        order_rows::insert_items(&mut *tx, GUEST_ORDER_ITEMS, id, order).await?;
        tx.commit().await?;

        tracing::info!(order_number = %number, "Guest order created");

        self.get_by_id(GuestOrderId::new(id))
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Get a guest order by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(
        &self,
        id: GuestOrderId,
    ) -> Result<Option<GuestOrder>, RepositoryError> {
        let rows = sqlx::query_as::<_, GuestOrderRow>(&format!(
            "SELECT {HEADER_COLUMNS}, guest_name, guest_email, guest_phone \
             FROM {GUEST_ORDERS} WHERE id = $1"
        ))
        .bind(id)
        .fetch_all(self.pool)
        .await?;

        Ok(self.assemble(rows).await?.pop())
    }

    /// Get a guest order by its `G` number.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_number(
        &self,
        number: &OrderNumber,
    ) -> Result<Option<GuestOrder>, RepositoryError> {
        let rows = sqlx::query_as::<_, GuestOrderRow>(&format!(
            "SELECT {HEADER_COLUMNS}, guest_name, guest_email, guest_phone \
             FROM {GUEST_ORDERS} WHERE order_number = $1"
        ))
        .bind(number.to_string())
        .fetch_all(self.pool)
        .await?;

        Ok(self.assemble(rows).await?.pop())
    }

    /// List guest orders newest first, optionally limited.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_recent(
        &self,
        limit: Option<i64>,
    ) -> Result<Vec<GuestOrder>, RepositoryError> {
        let rows = sqlx::query_as::<_, GuestOrderRow>(&format!(
            "SELECT {HEADER_COLUMNS}, guest_name, guest_email, guest_phone \
             FROM {GUEST_ORDERS} ORDER BY created_at DESC, id DESC LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        self.assemble(rows).await
    }

    /// Set a guest order's status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist.
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn update_status(
        &self,
        id: GuestOrderId,
        status: OrderStatus,
    ) -> Result<GuestOrder, RepositoryError> {
        let result = sqlx::query(&format!(
            "UPDATE {GUEST_ORDERS} SET status = $2 WHERE id = $1"
        ))
        .bind(id)
        .bind(status)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        self.get_by_id(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Count all guest orders.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let (count,): (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {GUEST_ORDERS}"))
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }

    async fn assemble(
        &self,
        rows: Vec<GuestOrderRow>,
    ) -> Result<Vec<GuestOrder>, RepositoryError> {
        let ids: Vec<i32> = rows.iter().map(|r| r.header.id).collect();
        let mut items = order_rows::fetch_items(self.pool, GUEST_ORDER_ITEMS, &ids).await?;

        rows.into_iter()
            .map(|row| {
                let header = row.header;
                Ok(GuestOrder {
                    id: GuestOrderId::new(header.id),
                    order_number: header.order_number()?,
                    guest_info: GuestInfo {
                        name: row.guest_name,
                        email: row.guest_email,
                        phone: row.guest_phone,
                    },
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

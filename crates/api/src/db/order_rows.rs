//! Row types and queries shared by the registered and guest order tables.
//!
//! `fitsphere.orders` and `fitsphere.guest_orders` have identical header
//! columns apart from who placed the order, and their item tables are
//! identical. Callers pass the table names.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::query_builder::Separated;
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};

use fitsphere_core::{Address, OrderKind, OrderNumber, OrderStatus, PaymentStatus, ProductId};

use super::RepositoryError;
use crate::models::{NewOrder, OrderItem, Payment, ProductSummary};

/// Header columns common to both order tables, in insert order after the
/// order number and customer columns.
pub(super) const INSERT_COLUMNS: &str = "total_amount, \
     shipping_street, shipping_city, shipping_postal_code, shipping_country, \
     billing_street, billing_city, billing_postal_code, billing_country, \
     payment_method, payment_status, payment_amount, payment_transaction_id, \
     payment_paid_at, payment_details";

/// Header columns common to both order tables, for `SELECT`.
pub(super) const HEADER_COLUMNS: &str = "id, order_number, total_amount, status, \
     shipping_street, shipping_city, shipping_postal_code, shipping_country, \
     billing_street, billing_city, billing_postal_code, billing_country, \
     payment_method, payment_status, payment_amount, payment_transaction_id, \
     payment_paid_at, payment_details, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
pub(super) struct HeaderRow {
    pub id: i32,
    order_number: String,
    pub total_amount: Decimal,
    pub status: OrderStatus,
    shipping_street: String,
    shipping_city: String,
    shipping_postal_code: String,
    shipping_country: String,
    billing_street: String,
    billing_city: String,
    billing_postal_code: String,
    billing_country: String,
    payment_method: String,
    payment_status: PaymentStatus,
    payment_amount: Decimal,
    payment_transaction_id: Option<String>,
    payment_paid_at: Option<DateTime<Utc>>,
    payment_details: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl HeaderRow {
    pub fn order_number(&self) -> Result<OrderNumber, RepositoryError> {
        OrderNumber::parse(&self.order_number).map_err(|e| {
            RepositoryError::DataCorruption(format!(
                "invalid order number {:?} in database: {e}",
                self.order_number
            ))
        })
    }

    pub fn shipping_address(&self) -> Address {
        Address {
            street: self.shipping_street.clone(),
            city: self.shipping_city.clone(),
            postal_code: self.shipping_postal_code.clone(),
            country: self.shipping_country.clone(),
        }
    }

    pub fn billing_address(&self) -> Address {
        Address {
            street: self.billing_street.clone(),
            city: self.billing_city.clone(),
            postal_code: self.billing_postal_code.clone(),
            country: self.billing_country.clone(),
        }
    }

    pub fn payment(&self) -> Payment {
        Payment {
            method: self.payment_method.clone(),
            status: self.payment_status,
            amount: self.payment_amount,
            transaction_id: self.payment_transaction_id.clone(),
            paid_at: self.payment_paid_at,
            details: self.payment_details.clone(),
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ItemRow {
    order_id: i32,
    product_id: Option<ProductId>,
    product_name: String,
    quantity: i32,
    price: Decimal,
    current_name: Option<String>,
    current_price: Option<Decimal>,
    current_image: Option<String>,
}

impl From<ItemRow> for OrderItem {
    fn from(row: ItemRow) -> Self {
        let product = match (
            row.product_id,
            row.current_name,
            row.current_price,
            row.current_image,
        ) {
            (Some(id), Some(name), Some(price), Some(image)) => Some(ProductSummary {
                id,
                name,
                price,
                image,
            }),
            _ => None,
        };

        Self {
            product,
            product_name: row.product_name,
            quantity: row.quantity,
            price: row.price,
        }
    }
}

/// Bind the shared header values, in [`INSERT_COLUMNS`] order.
pub(super) fn push_header_values(
    values: &mut Separated<'_, '_, Postgres, &'static str>,
    order: &NewOrder,
) {
    let shipping = &order.shipping_address;
    let billing = &order.billing_address;
    let payment = &order.payment;

    values
        .push_bind(order.total_amount)
        .push_bind(shipping.street.clone())
        .push_bind(shipping.city.clone())
        .push_bind(shipping.postal_code.clone())
        .push_bind(shipping.country.clone())
        .push_bind(billing.street.clone())
        .push_bind(billing.city.clone())
        .push_bind(billing.postal_code.clone())
        .push_bind(billing.country.clone())
        .push_bind(payment.method.clone())
        .push_bind(payment.status)
        .push_bind(payment.amount)
        .push_bind(payment.transaction_id.clone())
        .push_bind(payment.paid_at)
        .push_bind(payment.details.clone());
}

/// Insert the lines of a freshly created order.
pub(super) async fn insert_items(
    conn: &mut PgConnection,
    items_table: &str,
    order_id: i32,
    order: &NewOrder,
) -> Result<(), RepositoryError> {
    let mut query: QueryBuilder<'_, Postgres> = QueryBuilder::new(format!(
        "INSERT INTO {items_table} (order_id, product_id, product_name, quantity, price) "
    ));

    query.push_values(&order.lines, |mut row, line| {
        row.push_bind(order_id)
            .push_bind(line.product_id)
            .push_bind(line.product_name.clone())
            .push_bind(line.quantity)
            .push_bind(line.price);
    });

    query.build().execute(conn).await?;
    Ok(())
}

/// Load the lines of several orders, keyed by order id, in insertion order.
pub(super) async fn fetch_items(
    pool: &PgPool,
    items_table: &str,
    order_ids: &[i32],
) -> Result<HashMap<i32, Vec<OrderItem>>, RepositoryError> {
    if order_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows = sqlx::query_as::<_, ItemRow>(&format!(
        r"
        SELECT i.order_id, i.product_id, i.product_name, i.quantity, i.price,
               p.name AS current_name, p.price AS current_price, p.image AS current_image
        FROM {items_table} i
        LEFT JOIN fitsphere.products p ON p.id = i.product_id
        WHERE i.order_id = ANY($1)
        ORDER BY i.id
        "
    ))
    .bind(order_ids)
    .fetch_all(pool)
    .await?;

    let mut items: HashMap<i32, Vec<OrderItem>> = HashMap::new();
    for row in rows {
        items.entry(row.order_id).or_default().push(row.into());
    }
    Ok(items)
}

/// Reserve the next order number of `kind` for `date`.
///
/// Must run inside the transaction that inserts the order. The counter row
/// is created on the first order of the day, starting after the highest
/// number already present in `orders_table` for that day.
pub(super) async fn next_order_number(
    conn: &mut PgConnection,
    kind: OrderKind,
    orders_table: &str,
    date: NaiveDate,
) -> Result<OrderNumber, RepositoryError> {
    let day_prefix = OrderNumber::day_prefix(kind, date);

    let (last_seq,): (i32,) = sqlx::query_as(&format!(
        r"
        INSERT INTO fitsphere.order_number_counters (prefix, day, last_seq)
        VALUES (
            $1,
            $2,
            COALESCE(
                (SELECT MAX(CAST(substr(order_number, 8) AS INTEGER))
                 FROM {orders_table}
                 WHERE order_number LIKE $3),
                0
            ) + 1
        )
        ON CONFLICT (prefix, day)
        DO UPDATE SET last_seq = fitsphere.order_number_counters.last_seq + 1
        RETURNING last_seq
        "
    ))
    .bind(kind.prefix().to_string())
    .bind(date)
    .bind(format!("{day_prefix}%"))
    .fetch_one(conn)
    .await?;

    let sequence = u32::try_from(last_seq).map_err(|_| {
        RepositoryError::DataCorruption(format!("negative order sequence {last_seq}"))
    })?;

    OrderNumber::new(kind, date, sequence)
        .map_err(|e| RepositoryError::DataCorruption(format!("order number counter: {e}")))
}

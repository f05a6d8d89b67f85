//! Order repository for database operations.
//!
//! Queries are built at runtime with `sqlx::query` / `sqlx::query_as` so the
//! crate compiles without a live database.

use std::collections::HashMap;

use sqlx::PgPool;
use tracing::{info, instrument, warn};

use order_hub_core::{Delivery, Item, Order, Payment};

use super::{OrderStore, RepositoryError, WriteStage};

/// Repository for order database operations.
///
/// Owns a clone of the pool (a cheap `Arc` handle) so it can be moved into
/// the long-lived consumer task.
#[derive(Clone)]
pub struct OrderRepository {
    pool: PgPool,
}

/// Row counts for a single order across the four tables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowCounts {
    pub orders: i64,
    pub delivery: i64,
    pub payment: i64,
    pub items: i64,
}

impl OrderRepository {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Count the rows stored for `order_uid` in each table.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn row_counts(&self, order_uid: &str) -> Result<RowCounts, RepositoryError> {
        let (orders, delivery, payment, items): (i64, i64, i64, i64) = sqlx::query_as(
            r"
            SELECT
                (SELECT COUNT(*) FROM orders WHERE order_uid = $1),
                (SELECT COUNT(*) FROM delivery WHERE order_uid = $1),
                (SELECT COUNT(*) FROM payment WHERE order_uid = $1),
                (SELECT COUNT(*) FROM items WHERE order_uid = $1)
            ",
        )
        .bind(order_uid)
        .fetch_one(&self.pool)
        .await?;

        Ok(RowCounts {
            orders,
            delivery,
            payment,
            items,
        })
    }

    async fn delivery(&self, order_uid: &str) -> Result<Option<Delivery>, sqlx::Error> {
        sqlx::query_as::<_, Delivery>(
            r"
            SELECT name, phone, zip, city, address, region, email
            FROM delivery
            WHERE order_uid = $1
            ",
        )
        .bind(order_uid)
        .fetch_optional(&self.pool)
        .await
    }

    async fn payment(&self, order_uid: &str) -> Result<Option<Payment>, sqlx::Error> {
        sqlx::query_as::<_, Payment>(
            r"
            SELECT transaction, request_id, currency, provider, amount, payment_dt,
                   bank, delivery_cost, goods_total, custom_fee
            FROM payment
            WHERE order_uid = $1
            ",
        )
        .bind(order_uid)
        .fetch_optional(&self.pool)
        .await
    }

    async fn items(&self, order_uid: &str) -> Result<Vec<Item>, sqlx::Error> {
        sqlx::query_as::<_, Item>(
            r"
            SELECT chrt_id, track_number, price, rid, name, sale, size,
                   total_price, nm_id, brand, status
            FROM items
            WHERE order_uid = $1
            ORDER BY id
            ",
        )
        .bind(order_uid)
        .fetch_all(&self.pool)
        .await
    }
}

impl OrderStore for OrderRepository {
    #[instrument(skip_all, fields(order_uid = %order.order_uid, items = order.items.len()))]
    async fn persist(&self, order: &Order) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await.map_err(failed(WriteStage::Begin))?;

        sqlx::query(
            r"
            INSERT INTO orders (
                order_uid, track_number, entry, locale, internal_signature,
                customer_id, delivery_service, shardkey, sm_id, date_created, oof_shard
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (order_uid) DO NOTHING
            ",
        )
        .bind(&order.order_uid)
        .bind(&order.track_number)
        .bind(&order.entry)
        .bind(&order.locale)
        .bind(&order.internal_signature)
        .bind(&order.customer_id)
        .bind(&order.delivery_service)
        .bind(&order.shardkey)
        .bind(order.sm_id)
        .bind(&order.date_created)
        .bind(&order.oof_shard)
        .execute(&mut *tx)
        .await
        .map_err(failed(WriteStage::Order))?;

        let d = &order.delivery;
        sqlx::query(
            r"
            INSERT INTO delivery (order_uid, name, phone, zip, city, address, region, email)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (order_uid) DO NOTHING
            ",
        )
        .bind(&order.order_uid)
        .bind(&d.name)
        .bind(&d.phone)
        .bind(&d.zip)
        .bind(&d.city)
        .bind(&d.address)
        .bind(&d.region)
        .bind(&d.email)
        .execute(&mut *tx)
        .await
        .map_err(failed(WriteStage::Delivery))?;

        let p = &order.payment;
        sqlx::query(
            r"
            INSERT INTO payment (
                order_uid, transaction, request_id, currency, provider, amount,
                payment_dt, bank, delivery_cost, goods_total, custom_fee
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (order_uid) DO NOTHING
            ",
        )
        .bind(&order.order_uid)
        .bind(&p.transaction)
        .bind(&p.request_id)
        .bind(&p.currency)
        .bind(&p.provider)
        .bind(p.amount)
        .bind(p.payment_dt)
        .bind(&p.bank)
        .bind(p.delivery_cost)
        .bind(p.goods_total)
        .bind(p.custom_fee)
        .execute(&mut *tx)
        .await
        .map_err(failed(WriteStage::Payment))?;

        for (index, item) in order.items.iter().enumerate() {
            sqlx::query(
                r"
                INSERT INTO items (
                    order_uid, chrt_id, track_number, price, rid, name, sale,
                    size, total_price, nm_id, brand, status
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
                ",
            )
            .bind(&order.order_uid)
            .bind(item.chrt_id)
            .bind(&item.track_number)
            .bind(item.price)
            .bind(&item.rid)
            .bind(&item.name)
            .bind(item.sale)
            .bind(&item.size)
            .bind(item.total_price)
            .bind(item.nm_id)
            .bind(&item.brand)
            .bind(item.status)
            .execute(&mut *tx)
            .await
            .map_err(failed(WriteStage::Item { index }))?;
        }

        // Dropping `tx` on any early return above rolls the whole write back.
        tx.commit().await.map_err(failed(WriteStage::Commit))?;

        info!("Order saved");
        Ok(())
    }

    #[instrument(skip_all)]
    async fn load_all(&self) -> Result<HashMap<String, Order>, RepositoryError> {
        let headers = sqlx::query_as::<_, Order>(
            r"
            SELECT order_uid, track_number, entry, locale, internal_signature,
                   customer_id, delivery_service, shardkey, sm_id, date_created, oof_shard
            FROM orders
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut orders = HashMap::with_capacity(headers.len());
        for header in headers {
            let uid = header.order_uid.clone();
            let delivery = self.delivery(&uid).await;
            let payment = self.payment(&uid).await;
            let items = self.items(&uid).await;
            orders.insert(uid, hydrate(header, delivery, payment, items));
        }

        info!(count = orders.len(), "Loaded orders from database");
        Ok(orders)
    }
}

/// Attach child rows to an order header.
///
/// Hydration is best-effort: a failed child lookup leaves that child at its
/// default (empty) value and logs a warning, without affecting the other
/// children or other orders. A missing delivery or payment row also leaves
/// the default.
pub(crate) fn hydrate(
    mut order: Order,
    delivery: Result<Option<Delivery>, sqlx::Error>,
    payment: Result<Option<Payment>, sqlx::Error>,
    items: Result<Vec<Item>, sqlx::Error>,
) -> Order {
    match delivery {
        Ok(found) => order.delivery = found.unwrap_or_default(),
        Err(e) => warn!(order_uid = %order.order_uid, error = %e, "Failed to load delivery"),
    }
    match payment {
        Ok(found) => order.payment = found.unwrap_or_default(),
        Err(e) => warn!(order_uid = %order.order_uid, error = %e, "Failed to load payment"),
    }
    match items {
        Ok(found) => order.items = found,
        Err(e) => warn!(order_uid = %order.order_uid, error = %e, "Failed to load items"),
    }
    order
}

fn failed(stage: WriteStage) -> impl FnOnce(sqlx::Error) -> RepositoryError {
    move |source| RepositoryError::Write { stage, source }
}

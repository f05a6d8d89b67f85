//! Order lookup route handlers.
//!
//! Lookups are answered from the cache alone. An order that exists in the
//! database but is not cached is reported as not found.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;
use tracing::instrument;

use order_hub_core::{Delivery, Item, Order, Payment};

use crate::error::{AppError, Result};
use crate::state::AppState;

/// Public order representation returned by `GET /order/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderResponse {
    pub order_uid: String,
    pub track_number: String,
    pub entry: String,
    pub delivery: DeliveryInfo,
    pub payment: PaymentInfo,
    pub items: Vec<ItemInfo>,
    pub locale: String,
    pub internal_signature: String,
    pub customer_id: String,
    pub delivery_service: String,
    pub shardkey: String,
    pub sm_id: i64,
    pub date_created: String,
    pub oof_shard: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveryInfo {
    pub name: String,
    pub phone: String,
    pub zip: String,
    pub city: String,
    pub address: String,
    pub region: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentInfo {
    pub transaction: String,
    pub request_id: String,
    pub currency: String,
    pub provider: String,
    pub amount: i64,
    pub payment_dt: i64,
    pub bank: String,
    pub delivery_cost: i64,
    pub goods_total: i64,
    pub custom_fee: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemInfo {
    pub chrt_id: i64,
    pub track_number: String,
    pub price: i64,
    pub rid: String,
    pub name: String,
    pub sale: i64,
    pub size: String,
    pub total_price: i64,
    pub nm_id: i64,
    pub brand: String,
    pub status: i64,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            order_uid: order.order_uid,
            track_number: order.track_number,
            entry: order.entry,
            delivery: order.delivery.into(),
            payment: order.payment.into(),
            items: order.items.into_iter().map(ItemInfo::from).collect(),
            locale: order.locale,
            internal_signature: order.internal_signature,
            customer_id: order.customer_id,
            delivery_service: order.delivery_service,
            shardkey: order.shardkey,
            sm_id: order.sm_id,
            date_created: order.date_created,
            oof_shard: order.oof_shard,
        }
    }
}

impl From<Delivery> for DeliveryInfo {
    fn from(d: Delivery) -> Self {
        Self {
            name: d.name,
            phone: d.phone,
            zip: d.zip,
            city: d.city,
            address: d.address,
            region: d.region,
            email: d.email,
        }
    }
}

impl From<Payment> for PaymentInfo {
    fn from(p: Payment) -> Self {
        Self {
            transaction: p.transaction,
            request_id: p.request_id,
            currency: p.currency,
            provider: p.provider,
            amount: p.amount,
            payment_dt: p.payment_dt,
            bank: p.bank,
            delivery_cost: p.delivery_cost,
            goods_total: p.goods_total,
            custom_fee: p.custom_fee,
        }
    }
}

impl From<Item> for ItemInfo {
    fn from(item: Item) -> Self {
        Self {
            chrt_id: item.chrt_id,
            track_number: item.track_number,
            price: item.price,
            rid: item.rid,
            name: item.name,
            sale: item.sale,
            size: item.size,
            total_price: item.total_price,
            nm_id: item.nm_id,
            brand: item.brand,
            status: item.status,
        }
    }
}

/// Look up a cached order.
///
/// GET /order/{id}
#[instrument(skip(state))]
pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>> {
    if id.is_empty() {
        return Err(missing_id());
    }

    let cached = state
        .cache()
        .get(&id)
        .ok_or_else(|| AppError::NotFound(format!("order {id}")))?;

    let order: Order = serde_json::from_str(&cached)
        .map_err(|e| AppError::Internal(format!("cached order {id} is not valid JSON: {e}")))?;

    Ok(Json(order.into()))
}

/// Reject a lookup without an order id.
///
/// GET /order/
pub async fn missing_order_id() -> AppError {
    missing_id()
}

fn missing_id() -> AppError {
    AppError::BadRequest("order id is required".to_string())
}

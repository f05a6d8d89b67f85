//! The order aggregate.
//!
//! An [`Order`] owns exactly one [`Delivery`], exactly one [`Payment`] and
//! zero or more [`Item`]s. The JSON shape is the bus wire format: snake_case
//! field names, nested `delivery` / `payment` objects and an `items` array.
//!
//! Every struct is `#[serde(default)]` and every field accepts `null`: a
//! document that omits a field or sends it as `null` still decodes, and a
//! missing `order_uid` surfaces as an empty string for [`Order::uid`] to
//! reject. Integer fields are 64-bit.

use serde::{Deserialize, Deserializer, Serialize};

use super::order_uid::{OrderUid, OrderUidError};

/// Root order record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
#[serde(default)]
pub struct Order {
    /// Globally unique order identifier.
    #[serde(deserialize_with = "null_as_default")]
    pub order_uid: String,
    #[serde(deserialize_with = "null_as_default")]
    pub track_number: String,
    /// Entry channel the order came in through.
    #[serde(deserialize_with = "null_as_default")]
    pub entry: String,
    #[cfg_attr(feature = "postgres", sqlx(skip))]
    #[serde(deserialize_with = "null_as_default")]
    pub delivery: Delivery,
    #[cfg_attr(feature = "postgres", sqlx(skip))]
    #[serde(deserialize_with = "null_as_default")]
    pub payment: Payment,
    #[cfg_attr(feature = "postgres", sqlx(skip))]
    #[serde(deserialize_with = "null_as_default")]
    pub items: Vec<Item>,
    #[serde(deserialize_with = "null_as_default")]
    pub locale: String,
    #[serde(deserialize_with = "null_as_default")]
    pub internal_signature: String,
    #[serde(deserialize_with = "null_as_default")]
    pub customer_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub delivery_service: String,
    #[serde(deserialize_with = "null_as_default")]
    pub shardkey: String,
    /// Shard manager id.
    #[serde(deserialize_with = "null_as_default")]
    pub sm_id: i64,
    /// Creation timestamp, kept in the producer's string format.
    #[serde(deserialize_with = "null_as_default")]
    pub date_created: String,
    /// Out-of-shard flag.
    #[serde(deserialize_with = "null_as_default")]
    pub oof_shard: String,
}

impl Order {
    /// Validate and return the order identifier.
    ///
    /// # Errors
    ///
    /// Returns `OrderUidError::Empty` if `order_uid` is empty.
    pub fn uid(&self) -> Result<OrderUid, OrderUidError> {
        OrderUid::parse(&self.order_uid)
    }
}

/// Recipient contact and address data (one per order).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
#[serde(default)]
pub struct Delivery {
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub phone: String,
    #[serde(deserialize_with = "null_as_default")]
    pub zip: String,
    #[serde(deserialize_with = "null_as_default")]
    pub city: String,
    #[serde(deserialize_with = "null_as_default")]
    pub address: String,
    #[serde(deserialize_with = "null_as_default")]
    pub region: String,
    #[serde(deserialize_with = "null_as_default")]
    pub email: String,
}

/// Transaction data (one per order).
///
/// Monetary amounts are integer minor units.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
#[serde(default)]
pub struct Payment {
    #[serde(deserialize_with = "null_as_default")]
    pub transaction: String,
    #[serde(deserialize_with = "null_as_default")]
    pub request_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub currency: String,
    #[serde(deserialize_with = "null_as_default")]
    pub provider: String,
    #[serde(deserialize_with = "null_as_default")]
    pub amount: i64,
    /// Transaction time as Unix epoch seconds.
    #[serde(deserialize_with = "null_as_default")]
    pub payment_dt: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub bank: String,
    #[serde(deserialize_with = "null_as_default")]
    pub delivery_cost: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub goods_total: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub custom_fee: i64,
}

/// A purchased line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
#[serde(default)]
pub struct Item {
    /// Catalog id.
    #[serde(deserialize_with = "null_as_default")]
    pub chrt_id: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub track_number: String,
    #[serde(deserialize_with = "null_as_default")]
    pub price: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub rid: String,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    /// Discount percentage.
    #[serde(deserialize_with = "null_as_default")]
    pub sale: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub size: String,
    #[serde(deserialize_with = "null_as_default")]
    pub total_price: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub nm_id: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub brand: String,
    #[serde(deserialize_with = "null_as_default")]
    pub status: i64,
}

/// Decode `null` as the field's default value.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "order_uid": "b563feb7b2b84b6test",
        "track_number": "WBILMTESTTRACK",
        "entry": "WBIL",
        "delivery": {
            "name": "Test Testov",
            "phone": "+9720000000",
            "zip": "2639809",
            "city": "Kiryat Mozkin",
            "address": "Ploshad Mira 15",
            "region": "Kraiot",
            "email": "test@gmail.com"
        },
        "payment": {
            "transaction": "b563feb7b2b84b6test",
            "request_id": "",
            "currency": "USD",
            "provider": "wbpay",
            "amount": 1817,
            "payment_dt": 1637907727,
            "bank": "alpha",
            "delivery_cost": 1500,
            "goods_total": 317,
            "custom_fee": 0
        },
        "items": [
            {
                "chrt_id": 9934930,
                "track_number": "WBILMTESTTRACK",
                "price": 453,
                "rid": "ab4219087a764ae0btest",
                "name": "Mascaras",
                "sale": 30,
                "size": "0",
                "total_price": 317,
                "nm_id": 2389212,
                "brand": "Vivienne Sabo",
                "status": 202
            }
        ],
        "locale": "en",
        "internal_signature": "",
        "customer_id": "test",
        "delivery_service": "meest",
        "shardkey": "9",
        "sm_id": 99,
        "date_created": "2021-11-26T06:22:19Z",
        "oof_shard": "1"
    }"#;

    #[test]
    fn test_decode_full_document() {
        let order: Order = serde_json::from_str(SAMPLE).unwrap();

        assert_eq!(order.order_uid, "b563feb7b2b84b6test");
        assert_eq!(order.delivery.city, "Kiryat Mozkin");
        assert_eq!(order.payment.payment_dt, 1_637_907_727);
        assert_eq!(order.items.len(), 1);
        assert_eq!(order.items.first().map(|i| i.total_price), Some(317));
        assert_eq!(order.sm_id, 99);
    }

    #[test]
    fn test_missing_fields_default() {
        let order: Order = serde_json::from_str(r#"{"track_number": "T1"}"#).unwrap();

        assert!(order.order_uid.is_empty());
        assert!(order.items.is_empty());
        assert_eq!(order.payment, Payment::default());
        assert!(order.uid().is_err());
    }

    #[test]
    fn test_type_mismatch_is_decode_error() {
        let result = serde_json::from_str::<Order>(r#"{"order_uid": 42}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_json_shape_is_stable() {
        let order: Order = serde_json::from_str(SAMPLE).unwrap();
        let encoded = serde_json::to_string(&order).unwrap();
        let decoded: Order = serde_json::from_str(&encoded).unwrap();
        assert_eq!(order, decoded);

        let value: serde_json::Value = serde_json::from_str(&encoded).unwrap();
        assert!(value.get("delivery").is_some_and(serde_json::Value::is_object));
        assert!(value.get("items").is_some_and(serde_json::Value::is_array));
    }

    #[test]
    fn test_null_fields_decode_as_defaults() {
        let order: Order = serde_json::from_str(
            r#"{
                "order_uid": "X1",
                "track_number": null,
                "delivery": null,
                "payment": {"amount": null, "currency": "USD"},
                "items": null,
                "sm_id": null
            }"#,
        )
        .unwrap();

        assert_eq!(order.order_uid, "X1");
        assert!(order.track_number.is_empty());
        assert_eq!(order.delivery, Delivery::default());
        assert_eq!(order.payment.amount, 0);
        assert_eq!(order.payment.currency, "USD");
        assert!(order.items.is_empty());
        assert_eq!(order.sm_id, 0);
    }

    #[test]
    fn test_null_inside_item_decodes_as_default() {
        let order: Order =
            serde_json::from_str(r#"{"order_uid": "X1", "items": [{"name": null, "price": 5}]}"#)
                .unwrap();

        assert_eq!(order.items.len(), 1);
        assert!(order.items.first().is_some_and(|i| i.name.is_empty() && i.price == 5));
    }

    #[test]
    fn test_integers_are_64_bit() {
        let order: Order = serde_json::from_str(
            r#"{"order_uid": "X1", "sm_id": 3000000000, "items": [{"nm_id": 9007199254740993}]}"#,
        )
        .unwrap();

        assert_eq!(order.sm_id, 3_000_000_000);
        assert_eq!(
            order.items.first().map(|i| i.nm_id),
            Some(9_007_199_254_740_993)
        );
    }
}

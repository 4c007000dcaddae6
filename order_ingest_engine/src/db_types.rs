use std::{convert::Infallible, fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use sqlx::Type;

//--------------------------------------     OrderId       ---------------------------------------------------------
/// The producer-assigned order identifier. It is the primary key in both the durable store and the cache, and is
/// never regenerated by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OrderId(pub String);

impl OrderId {
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl FromStr for OrderId {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for OrderId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

//--------------------------------------       Order       ---------------------------------------------------------
/// An order record, as produced onto the order stream.
///
/// The serialized field names follow the producer's wire format (`order_uid`, `shardkey`, ...), so the same type is
/// used for stream payloads, cache entries and HTTP responses. Opaque string fields that are absent from a payload
/// deserialize as empty strings; the structural fields (`order_uid`, `delivery`, `payment`, `items`, `date_created`)
/// must be present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    #[serde(rename = "order_uid", alias = "order_id")]
    pub order_id: OrderId,
    #[serde(default)]
    pub track_number: String,
    #[serde(default)]
    pub entry: String,
    pub delivery: Delivery,
    pub payment: Payment,
    pub items: Vec<Item>,
    #[serde(default)]
    pub locale: String,
    #[serde(default)]
    pub internal_signature: String,
    #[serde(default)]
    pub customer_id: String,
    #[serde(default)]
    pub delivery_service: String,
    #[serde(rename = "shardkey", default)]
    pub shard_key: String,
    #[serde(default)]
    pub sm_id: Option<i64>,
    /// Creation timestamp in the `YYYY-MM-DDTHH:MM:SSZ` profile. Kept verbatim so that lookups return exactly what
    /// the producer sent.
    pub date_created: String,
    #[serde(default)]
    pub oof_shard: String,
}

/// Recipient address and contact details.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delivery {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub zip: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub email: String,
}

/// Payment transaction details. Monetary values are in the payment currency and may be fractional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    #[serde(default)]
    pub transaction: String,
    #[serde(default)]
    pub request_id: String,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub provider: String,
    #[serde(default)]
    pub amount: f64,
    /// Unix timestamp (seconds) of the payment
    #[serde(default)]
    pub payment_dt: i64,
    #[serde(default)]
    pub bank: String,
    #[serde(default)]
    pub delivery_cost: f64,
    #[serde(default)]
    pub goods_total: f64,
    #[serde(default)]
    pub custom_fee: f64,
}

/// A single line item in an order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Item {
    #[serde(default)]
    pub chrt_id: i64,
    #[serde(default)]
    pub track_number: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub rid: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub sale: f64,
    #[serde(default)]
    pub size: String,
    #[serde(default)]
    pub total_price: f64,
    #[serde(default)]
    pub nm_id: i64,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub status: i32,
}

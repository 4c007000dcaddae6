//! Structural validation of incoming orders.
//!
//! [`OrderValidator`] is a plain value: construct it once and hand it to whatever needs it (the
//! [`crate::OrderService`] holds one). It has no side effects and the same order always yields the same verdict, so
//! it runs identically in the ingestion path and in tests.
//!
//! Checks run in stages, and the first failing stage wins:
//! 1. required scalar fields are non-empty,
//! 2. the order id is alphanumeric,
//! 3. `date_created` has exactly the `YYYY-MM-DDTHH:MM:SSZ` shape and is a real calendar time,
//! 4. the `delivery` and `payment` sub-records are complete and well-formed,
//! 5. `items` is non-empty and every item carries its identifying fields.
//!
//! Every failing field of the failing stage is named in the resulting [`ValidationError`].
use std::fmt::Display;

use chrono::NaiveDateTime;
use regex::Regex;
use thiserror::Error;

use crate::db_types::{Delivery, Item, Order, Payment};

/// The only accepted timestamp profile for `date_created`.
pub const DATE_CREATED_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

const ORDER_ID_PATTERN: &str = r"^[A-Za-z0-9]+$";
// chrono's parser tolerates short fields and signed years, so the shape is pinned down first
const DATE_CREATED_PATTERN: &str = r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}Z$";
const EMAIL_PATTERN: &str = r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9\-]+(\.[A-Za-z0-9\-]+)*\.[A-Za-z]{2,}$";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationStage {
    RequiredFields,
    OrderIdFormat,
    DateCreated,
    SubRecords,
    Items,
}

impl Display for ValidationStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationStage::RequiredFields => write!(f, "required fields"),
            ValidationStage::OrderIdFormat => write!(f, "order id format"),
            ValidationStage::DateCreated => write!(f, "creation date"),
            ValidationStage::SubRecords => write!(f, "delivery/payment"),
            ValidationStage::Items => write!(f, "items"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Order failed {stage} validation. Invalid fields: {}", .fields.join(", "))]
pub struct ValidationError {
    pub stage: ValidationStage,
    pub fields: Vec<String>,
}

impl ValidationError {
    fn new(stage: ValidationStage, fields: Vec<String>) -> Self {
        Self { stage, fields }
    }

    fn check(stage: ValidationStage, fields: Vec<String>) -> Result<(), Self> {
        if fields.is_empty() {
            Ok(())
        } else {
            Err(Self::new(stage, fields))
        }
    }
}

#[derive(Debug, Clone)]
pub struct OrderValidator {
    order_id: Regex,
    date_created: Regex,
    email: Regex,
}

impl Default for OrderValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl OrderValidator {
    pub fn new() -> Self {
        let order_id = Regex::new(ORDER_ID_PATTERN).expect("order id pattern is a valid regex");
        let date_created = Regex::new(DATE_CREATED_PATTERN).expect("date pattern is a valid regex");
        let email = Regex::new(EMAIL_PATTERN).expect("email pattern is a valid regex");
        Self { order_id, date_created, email }
    }

    pub fn validate(&self, order: &Order) -> Result<(), ValidationError> {
        let required = [
            ("order_uid", order.order_id.as_str()),
            ("track_number", order.track_number.as_str()),
            ("entry", order.entry.as_str()),
            ("locale", order.locale.as_str()),
            ("customer_id", order.customer_id.as_str()),
        ];
        let missing = required.iter().filter(|(_, v)| v.trim().is_empty()).map(|(k, _)| k.to_string()).collect();
        ValidationError::check(ValidationStage::RequiredFields, missing)?;

        self.validate_order_id(order.order_id.as_str())?;

        if !self.is_valid_date_created(&order.date_created) {
            return Err(ValidationError::new(ValidationStage::DateCreated, vec!["date_created".into()]));
        }

        let mut fields = self.delivery_errors(&order.delivery);
        fields.extend(payment_errors(&order.payment));
        ValidationError::check(ValidationStage::SubRecords, fields)?;

        if order.items.is_empty() {
            return Err(ValidationError::new(ValidationStage::Items, vec!["items".into()]));
        }
        let fields = order.items.iter().enumerate().flat_map(|(i, item)| item_errors(i, item)).collect();
        ValidationError::check(ValidationStage::Items, fields)
    }

    /// Checks that `id` is usable as an order identifier. Also used to reject malformed lookup requests.
    pub fn validate_order_id(&self, id: &str) -> Result<(), ValidationError> {
        if self.order_id.is_match(id) {
            Ok(())
        } else {
            Err(ValidationError::new(ValidationStage::OrderIdFormat, vec!["order_uid".into()]))
        }
    }

    fn is_valid_date_created(&self, s: &str) -> bool {
        self.date_created.is_match(s) && NaiveDateTime::parse_from_str(s, DATE_CREATED_FORMAT).is_ok()
    }

    fn delivery_errors(&self, delivery: &Delivery) -> Vec<String> {
        let required = [
            ("name", &delivery.name),
            ("phone", &delivery.phone),
            ("zip", &delivery.zip),
            ("city", &delivery.city),
            ("address", &delivery.address),
            ("region", &delivery.region),
        ];
        let mut fields = missing_fields("delivery", &required);
        if !self.email.is_match(delivery.email.trim()) {
            fields.push("delivery.email".into());
        }
        fields
    }
}

fn payment_errors(payment: &Payment) -> Vec<String> {
    let required = [
        ("transaction", &payment.transaction),
        ("currency", &payment.currency),
        ("provider", &payment.provider),
        ("bank", &payment.bank),
    ];
    let mut fields = missing_fields("payment", &required);
    let positive = [("amount", payment.amount), ("goods_total", payment.goods_total)];
    fields.extend(positive.iter().filter(|(_, v)| *v <= 0.0).map(|(k, _)| format!("payment.{k}")));
    if payment.payment_dt <= 0 {
        fields.push("payment.payment_dt".into());
    }
    let non_negative = [("delivery_cost", payment.delivery_cost), ("custom_fee", payment.custom_fee)];
    fields.extend(non_negative.iter().filter(|(_, v)| *v < 0.0).map(|(k, _)| format!("payment.{k}")));
    fields
}

fn item_errors(index: usize, item: &Item) -> Vec<String> {
    let prefix = format!("items[{index}]");
    let required =
        [("track_number", &item.track_number), ("rid", &item.rid), ("name", &item.name), ("brand", &item.brand)];
    let mut fields = missing_fields(&prefix, &required);
    let positive = [("chrt_id", item.chrt_id), ("nm_id", item.nm_id)];
    fields.extend(positive.iter().filter(|(_, v)| *v <= 0).map(|(k, _)| format!("{prefix}.{k}")));
    let non_negative = [("price", item.price), ("sale", item.sale), ("total_price", item.total_price)];
    fields.extend(non_negative.iter().filter(|(_, v)| *v < 0.0).map(|(k, _)| format!("{prefix}.{k}")));
    fields
}

fn missing_fields(prefix: &str, fields: &[(&str, &String)]) -> Vec<String> {
    fields.iter().filter(|(_, v)| v.trim().is_empty()).map(|(k, _)| format!("{prefix}.{k}")).collect()
}

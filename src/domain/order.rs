//! Order Record Model
//!
//! The order aggregate and its value objects. Every type checks its own
//! invariants at construction (`new`) and can be re-checked with `validate`
//! after being assembled field by field (e.g. when decoded from storage).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// Validation Errors
// =============================================================================

/// A violated record invariant.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("order_uid cannot be empty")]
    EmptyOrderUid,

    #[error("track_number cannot be empty")]
    EmptyTrackNumber,

    #[error("delivery name cannot be empty")]
    EmptyDeliveryName,

    #[error("delivery phone cannot be empty")]
    EmptyDeliveryPhone,

    #[error("payment transaction cannot be empty")]
    EmptyPaymentTransaction,

    #[error("payment amount must be greater than 0")]
    InvalidPaymentAmount,

    #[error("item name cannot be empty")]
    EmptyItemName,

    #[error("item price must be greater than or equal to 0")]
    InvalidItemPrice,
}

// =============================================================================
// Delivery
// =============================================================================

/// Recipient and address of an order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delivery {
    pub name: String,
    pub phone: String,
    pub zip: String,
    pub city: String,
    pub address: String,
    pub region: String,
    pub email: String,
}

impl Delivery {
    /// Create a delivery with the required fields; the rest start empty.
    pub fn new(
        name: impl Into<String>,
        phone: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let delivery = Self {
            name: name.into(),
            phone: phone.into(),
            ..Default::default()
        };
        delivery.validate()?;
        Ok(delivery)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.is_empty() {
            return Err(ValidationError::EmptyDeliveryName);
        }
        if self.phone.is_empty() {
            return Err(ValidationError::EmptyDeliveryPhone);
        }
        Ok(())
    }
}

// =============================================================================
// Payment
// =============================================================================

/// Payment details. Monetary values are in minor currency units.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub transaction: String,
    pub request_id: String,
    pub currency: String,
    pub provider: String,
    pub amount: i64,
    /// Unix seconds
    pub payment_dt: i64,
    pub bank: String,
    pub delivery_cost: i64,
    pub goods_total: i64,
    pub custom_fee: i64,
}

impl Payment {
    /// Create a payment with the required fields; the rest start empty.
    pub fn new(transaction: impl Into<String>, amount: i64) -> Result<Self, ValidationError> {
        let payment = Self {
            transaction: transaction.into(),
            amount,
            ..Default::default()
        };
        payment.validate()?;
        Ok(payment)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.transaction.is_empty() {
            return Err(ValidationError::EmptyPaymentTransaction);
        }
        if self.amount <= 0 {
            return Err(ValidationError::InvalidPaymentAmount);
        }
        Ok(())
    }
}

// =============================================================================
// Item
// =============================================================================

/// A line item of an order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
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

impl Item {
    /// Create an item with the required fields; the rest start empty.
    pub fn new(name: impl Into<String>, price: i64) -> Result<Self, ValidationError> {
        let item = Self {
            name: name.into(),
            price,
            ..Default::default()
        };
        item.validate()?;
        Ok(item)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.is_empty() {
            return Err(ValidationError::EmptyItemName);
        }
        if self.price < 0 {
            return Err(ValidationError::InvalidItemPrice);
        }
        Ok(())
    }
}

// =============================================================================
// Order
// =============================================================================

/// The order aggregate, identified by `order_uid`.
///
/// Orders are created once at ingestion and never edited in place; a later
/// write with the same `order_uid` replaces the whole record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub order_uid: String,
    pub track_number: String,
    pub entry: String,
    pub delivery: Delivery,
    pub payment: Payment,
    pub items: Vec<Item>,
    pub locale: String,
    pub internal_signature: String,
    pub customer_id: String,
    pub delivery_service: String,
    pub shardkey: String,
    pub sm_id: i64,
    pub date_created: DateTime<Utc>,
    pub oof_shard: String,
}

impl Order {
    /// Create an order shell. Delivery and payment start empty and must be
    /// filled in before `validate` passes.
    pub fn new(
        order_uid: impl Into<String>,
        track_number: impl Into<String>,
        entry: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let order_uid = order_uid.into();
        let track_number = track_number.into();

        if order_uid.is_empty() {
            return Err(ValidationError::EmptyOrderUid);
        }
        if track_number.is_empty() {
            return Err(ValidationError::EmptyTrackNumber);
        }

        Ok(Self {
            order_uid,
            track_number,
            entry: entry.into(),
            delivery: Delivery::default(),
            payment: Payment::default(),
            items: Vec::new(),
            locale: String::new(),
            internal_signature: String::new(),
            customer_id: String::new(),
            delivery_service: String::new(),
            shardkey: String::new(),
            sm_id: 0,
            date_created: Utc::now(),
            oof_shard: String::new(),
        })
    }

    /// Check every invariant, reporting the first violation.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.order_uid.is_empty() {
            return Err(ValidationError::EmptyOrderUid);
        }
        if self.track_number.is_empty() {
            return Err(ValidationError::EmptyTrackNumber);
        }
        self.delivery.validate()?;
        self.payment.validate()?;
        self.items.iter().try_for_each(Item::validate)
    }

    /// Append an item after validating it.
    pub fn add_item(&mut self, item: Item) -> Result<(), ValidationError> {
        item.validate()?;
        self.items.push(item);
        Ok(())
    }

    /// Total charged for the order.
    pub fn total(&self) -> i64 {
        self.payment.amount
    }

    pub fn items_count(&self) -> usize {
        self.items.len()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_order() -> Order {
        let mut order = Order::new("test123", "TRACK123", "WBIL").unwrap();
        order.delivery = Delivery::new("Test User", "+79001234567").unwrap();
        order.payment = Payment::new("test123", 1000).unwrap();
        order
    }

    #[test]
    fn test_new_order() {
        let cases = [
            ("test123", "TRACK123", None),
            ("", "TRACK123", Some(ValidationError::EmptyOrderUid)),
            ("test123", "", Some(ValidationError::EmptyTrackNumber)),
        ];

        for (uid, track, expected) in cases {
            match Order::new(uid, track, "WBIL") {
                Ok(order) => {
                    assert_eq!(expected, None);
                    assert_eq!(order.order_uid, uid);
                    assert_eq!(order.track_number, track);
                    assert!(order.items.is_empty());
                }
                Err(e) => assert_eq!(Some(e), expected),
            }
        }
    }

    #[test]
    fn test_add_item() {
        let mut order = valid_order();

        order.add_item(Item::new("Test Item", 1000).unwrap()).unwrap();
        assert_eq!(order.items_count(), 1);

        let invalid = Item {
            chrt_id: 456,
            price: 1000,
            ..Default::default()
        };
        assert_eq!(order.add_item(invalid), Err(ValidationError::EmptyItemName));
        assert_eq!(order.items_count(), 1);
    }

    #[test]
    fn test_delivery_validate() {
        assert!(Delivery::new("Test User", "+79001234567").is_ok());
        assert_eq!(
            Delivery::new("", "+79001234567"),
            Err(ValidationError::EmptyDeliveryName)
        );
        assert_eq!(
            Delivery::new("Test User", ""),
            Err(ValidationError::EmptyDeliveryPhone)
        );
    }

    #[test]
    fn test_payment_validate() {
        assert!(Payment::new("tx", 1).is_ok());
        assert_eq!(
            Payment::new("", 1000),
            Err(ValidationError::EmptyPaymentTransaction)
        );
        assert_eq!(
            Payment::new("tx", 0),
            Err(ValidationError::InvalidPaymentAmount)
        );
        assert_eq!(
            Payment::new("tx", -5),
            Err(ValidationError::InvalidPaymentAmount)
        );
    }

    #[test]
    fn test_item_price_boundary() {
        assert!(Item::new("free sample", 0).is_ok());
        assert_eq!(
            Item::new("refund", -1),
            Err(ValidationError::InvalidItemPrice)
        );
    }

    #[test]
    fn test_order_validate_reports_first_violation() {
        let order = valid_order();
        assert_eq!(order.validate(), Ok(()));

        let mut no_phone = order.clone();
        no_phone.delivery.phone.clear();
        no_phone.payment.amount = 0;
        assert_eq!(
            no_phone.validate(),
            Err(ValidationError::EmptyDeliveryPhone)
        );

        let mut bad_item = order.clone();
        bad_item.items.push(Item {
            name: "Broken".into(),
            price: -100,
            ..Default::default()
        });
        assert_eq!(bad_item.validate(), Err(ValidationError::InvalidItemPrice));
    }

    #[test]
    fn test_shell_order_is_not_valid_until_filled() {
        let order = Order::new("uid", "TRACK", "WBIL").unwrap();
        assert_eq!(order.validate(), Err(ValidationError::EmptyDeliveryName));
    }

    #[test]
    fn test_total() {
        let order = valid_order();
        assert_eq!(order.total(), 1000);
    }
}

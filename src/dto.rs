//! Transport DTOs
//!
//! Wire shapes for inbound order messages and outbound read responses.
//! Field names follow the snake_case message format produced upstream.
//! Missing scalar fields decode to their zero value; validation happens when
//! converting into the domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Delivery, Item, Order, Payment, ValidationError};

// =============================================================================
// Input
// =============================================================================

/// Inbound order message
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateOrderInput {
    pub order_uid: String,
    pub track_number: String,
    pub entry: String,
    pub delivery: DeliveryInput,
    pub payment: PaymentInput,
    pub items: Vec<ItemInput>,
    pub locale: String,
    pub internal_signature: String,
    pub customer_id: String,
    pub delivery_service: String,
    pub shardkey: String,
    pub sm_id: i64,
    /// Defaults to the time of conversion when absent
    pub date_created: Option<DateTime<Utc>>,
    pub oof_shard: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryInput {
    pub name: String,
    pub phone: String,
    pub zip: String,
    pub city: String,
    pub address: String,
    pub region: String,
    pub email: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaymentInput {
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

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemInput {
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

impl CreateOrderInput {
    /// Build a validated domain order.
    pub fn into_domain(self) -> Result<Order, ValidationError> {
        let mut order = Order::new(self.order_uid, self.track_number, self.entry)?;

        let d = self.delivery;
        order.delivery = Delivery {
            zip: d.zip,
            city: d.city,
            address: d.address,
            region: d.region,
            email: d.email,
            ..Delivery::new(d.name, d.phone)?
        };

        let p = self.payment;
        order.payment = Payment {
            request_id: p.request_id,
            currency: p.currency,
            provider: p.provider,
            payment_dt: p.payment_dt,
            bank: p.bank,
            delivery_cost: p.delivery_cost,
            goods_total: p.goods_total,
            custom_fee: p.custom_fee,
            ..Payment::new(p.transaction, p.amount)?
        };

        for i in self.items {
            order.add_item(Item {
                chrt_id: i.chrt_id,
                track_number: i.track_number,
                rid: i.rid,
                sale: i.sale,
                size: i.size,
                total_price: i.total_price,
                nm_id: i.nm_id,
                brand: i.brand,
                status: i.status,
                ..Item::new(i.name, i.price)?
            })?;
        }

        order.locale = self.locale;
        order.internal_signature = self.internal_signature;
        order.customer_id = self.customer_id;
        order.delivery_service = self.delivery_service;
        order.shardkey = self.shardkey;
        order.sm_id = self.sm_id;
        if let Some(date_created) = self.date_created {
            order.date_created = date_created;
        }
        order.oof_shard = self.oof_shard;

        order.validate()?;
        Ok(order)
    }
}

// =============================================================================
// Output
// =============================================================================

/// Order as returned to readers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderOutput {
    pub order_uid: String,
    pub track_number: String,
    pub entry: String,
    pub delivery: DeliveryOutput,
    pub payment: PaymentOutput,
    pub items: Vec<ItemOutput>,
    pub locale: String,
    pub internal_signature: String,
    pub customer_id: String,
    pub delivery_service: String,
    pub shardkey: String,
    pub sm_id: i64,
    pub date_created: DateTime<Utc>,
    pub oof_shard: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryOutput {
    pub name: String,
    pub phone: String,
    pub zip: String,
    pub city: String,
    pub address: String,
    pub region: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentOutput {
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

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemOutput {
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

impl From<&Order> for OrderOutput {
    fn from(order: &Order) -> Self {
        let d = &order.delivery;
        let p = &order.payment;

        Self {
            order_uid: order.order_uid.clone(),
            track_number: order.track_number.clone(),
            entry: order.entry.clone(),
            delivery: DeliveryOutput {
                name: d.name.clone(),
                phone: d.phone.clone(),
                zip: d.zip.clone(),
                city: d.city.clone(),
                address: d.address.clone(),
                region: d.region.clone(),
                email: d.email.clone(),
            },
            payment: PaymentOutput {
                transaction: p.transaction.clone(),
                request_id: p.request_id.clone(),
                currency: p.currency.clone(),
                provider: p.provider.clone(),
                amount: p.amount,
                payment_dt: p.payment_dt,
                bank: p.bank.clone(),
                delivery_cost: p.delivery_cost,
                goods_total: p.goods_total,
                custom_fee: p.custom_fee,
            },
            items: order.items.iter().map(ItemOutput::from).collect(),
            locale: order.locale.clone(),
            internal_signature: order.internal_signature.clone(),
            customer_id: order.customer_id.clone(),
            delivery_service: order.delivery_service.clone(),
            shardkey: order.shardkey.clone(),
            sm_id: order.sm_id,
            date_created: order.date_created,
            oof_shard: order.oof_shard.clone(),
        }
    }
}

impl From<&Item> for ItemOutput {
    fn from(item: &Item) -> Self {
        Self {
            chrt_id: item.chrt_id,
            track_number: item.track_number.clone(),
            price: item.price,
            rid: item.rid.clone(),
            name: item.name.clone(),
            sale: item.sale,
            size: item.size.clone(),
            total_price: item.total_price,
            nm_id: item.nm_id,
            brand: item.brand.clone(),
            status: item.status,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
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
    fn test_decode_and_convert_sample_message() {
        let input: CreateOrderInput = serde_json::from_str(SAMPLE).unwrap();
        let order = input.into_domain().unwrap();

        assert_eq!(order.order_uid, "b563feb7b2b84b6test");
        assert_eq!(order.delivery.city, "Kiryat Mozkin");
        assert_eq!(order.total(), 1817);
        assert_eq!(order.items_count(), 1);
        assert_eq!(order.items[0].brand, "Vivienne Sabo");
        assert_eq!(order.sm_id, 99);
        assert_eq!(order.date_created.to_rfc3339(), "2021-11-26T06:22:19+00:00");
    }

    #[test]
    fn test_output_preserves_fields() {
        let input: CreateOrderInput = serde_json::from_str(SAMPLE).unwrap();
        let order = input.into_domain().unwrap();
        let output = OrderOutput::from(&order);

        let json = serde_json::to_value(&output).unwrap();
        assert_eq!(json["order_uid"], "b563feb7b2b84b6test");
        assert_eq!(json["payment"]["bank"], "alpha");
        assert_eq!(json["items"][0]["nm_id"], 2389212);
        assert_eq!(json["date_created"], "2021-11-26T06:22:19Z");
    }

    #[test]
    fn test_negative_item_price_rejected() {
        let mut input: CreateOrderInput = serde_json::from_str(SAMPLE).unwrap();
        input.items[0].price = -1;
        assert_eq!(input.into_domain(), Err(ValidationError::InvalidItemPrice));
    }

    #[test]
    fn test_missing_delivery_rejected() {
        let input = CreateOrderInput {
            order_uid: "uid".into(),
            track_number: "TRACK".into(),
            ..Default::default()
        };
        assert_eq!(input.into_domain(), Err(ValidationError::EmptyDeliveryName));
    }

    #[test]
    fn test_missing_date_defaults_to_now() {
        let mut input: CreateOrderInput = serde_json::from_str(SAMPLE).unwrap();
        input.date_created = None;
        let before = Utc::now();
        let order = input.into_domain().unwrap();
        assert!(order.date_created >= before);
    }

    #[test]
    fn test_sparse_message_decodes_with_defaults() {
        let input: CreateOrderInput =
            serde_json::from_str(r#"{"order_uid": "x", "items": [{"name": "pen"}]}"#).unwrap();
        assert_eq!(input.order_uid, "x");
        assert_eq!(input.items[0].price, 0);
        assert_eq!(input.sm_id, 0);
        assert!(input.date_created.is_none());
    }
}

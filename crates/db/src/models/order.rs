//! Order and order-line models.

use serde::Serialize;
use shopforge_core::checkout::BillingAddress;
use shopforge_core::types::{Cents, DbId, Timestamp};
use sqlx::types::Json;
use sqlx::FromRow;

/// A row from the `orders` table.
///
/// `status`, `step` and `payment_method` hold the string forms of
/// [`shopforge_core::checkout`] enums.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Order {
    pub id: DbId,
    pub user_id: DbId,
    pub status: String,
    pub step: String,
    pub payment_method: Option<String>,
    pub billing_address: Option<Json<BillingAddress>>,
    pub coupon_code: Option<String>,
    pub subtotal_cents: Cents,
    pub discount_cents: Cents,
    pub total_cents: Cents,
    pub vat_cents: Cents,
    pub transfer_reference: Option<String>,
    pub paid_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct OrderItem {
    pub id: DbId,
    pub order_id: DbId,
    pub product_id: DbId,
    pub product_name: String,
    pub unit_price_cents: Cents,
    pub quantity: i32,
}

/// Order plus its lines, as returned by the checkout endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

/// Line snapshot taken from the catalogue when the order is created.
#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub product_id: DbId,
    pub product_name: String,
    pub unit_price_cents: Cents,
    pub quantity: i32,
}

#[derive(Debug)]
pub struct CreateOrder {
    pub user_id: DbId,
    pub coupon_code: Option<String>,
    pub subtotal_cents: Cents,
    pub discount_cents: Cents,
    pub total_cents: Cents,
    pub vat_cents: Cents,
    pub items: Vec<NewOrderItem>,
}

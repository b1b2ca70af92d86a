use serde::{Deserialize, Serialize};
use shopforge_core::types::{DbId, Timestamp};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Coupon {
    pub id: DbId,
    pub code: String,
    pub percent_off: i64,
    pub is_active: bool,
    pub valid_until: Option<Timestamp>,
    pub created_at: Timestamp,
}

#[derive(Debug, Deserialize)]
pub struct CreateCoupon {
    pub code: String,
    pub percent_off: i64,
    pub valid_until: Option<Timestamp>,
}

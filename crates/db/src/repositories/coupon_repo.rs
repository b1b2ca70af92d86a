//! Repository for the `coupons` table.

use sqlx::PgPool;

use crate::models::coupon::{Coupon, CreateCoupon};

const COLUMNS: &str = "id, code, percent_off, is_active, valid_until, created_at";

pub struct CouponRepo;

impl CouponRepo {
    pub async fn create(pool: &PgPool, input: &CreateCoupon) -> Result<Coupon, sqlx::Error> {
        let query = format!(
            "INSERT INTO coupons (code, percent_off, valid_until)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Coupon>(&query)
            .bind(&input.code)
            .bind(input.percent_off)
            .bind(input.valid_until)
            .fetch_one(pool)
            .await
    }

    /// Find a coupon that is active and not past its end date.
    pub async fn find_redeemable(pool: &PgPool, code: &str) -> Result<Option<Coupon>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM coupons
             WHERE code = $1
               AND is_active = true
               AND (valid_until IS NULL OR valid_until > NOW())"
        );
        sqlx::query_as::<_, Coupon>(&query)
            .bind(code)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(pool: &PgPool) -> Result<Vec<Coupon>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM coupons ORDER BY created_at DESC");
        sqlx::query_as::<_, Coupon>(&query).fetch_all(pool).await
    }
}

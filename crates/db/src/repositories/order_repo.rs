//! Repository for the `orders` and `order_items` tables.

use shopforge_core::checkout::{BillingAddress, CheckoutStep, OrderStatus, PaymentMethod};
use shopforge_core::types::DbId;
use sqlx::types::Json;
use sqlx::PgPool;

use crate::models::order::{CreateOrder, Order, OrderItem, OrderWithItems};

const COLUMNS: &str = "id, user_id, status, step, payment_method, billing_address, coupon_code, \
                       subtotal_cents, discount_cents, total_cents, vat_cents, transfer_reference, \
                       paid_at, created_at, updated_at";

const ITEM_COLUMNS: &str = "id, order_id, product_id, product_name, unit_price_cents, quantity";

pub struct OrderRepo;

impl OrderRepo {
    /// Insert an order and its lines in one transaction.
    pub async fn create(pool: &PgPool, input: &CreateOrder) -> Result<OrderWithItems, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO orders
                (user_id, coupon_code, subtotal_cents, discount_cents, total_cents, vat_cents)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        let order = sqlx::query_as::<_, Order>(&query)
            .bind(input.user_id)
            .bind(&input.coupon_code)
            .bind(input.subtotal_cents)
            .bind(input.discount_cents)
            .bind(input.total_cents)
            .bind(input.vat_cents)
            .fetch_one(&mut *tx)
            .await?;

        let item_query = format!(
            "INSERT INTO order_items (order_id, product_id, product_name, unit_price_cents, quantity)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {ITEM_COLUMNS}"
        );
        let mut items = Vec::with_capacity(input.items.len());
        for item in &input.items {
            let row = sqlx::query_as::<_, OrderItem>(&item_query)
                .bind(order.id)
                .bind(item.product_id)
                .bind(&item.product_name)
                .bind(item.unit_price_cents)
                .bind(item.quantity)
                .fetch_one(&mut *tx)
                .await?;
            items.push(row);
        }

        tx.commit().await?;
        Ok(OrderWithItems { order, items })
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Order>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM orders WHERE id = $1");
        sqlx::query_as::<_, Order>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_items(pool: &PgPool, order_id: DbId) -> Result<Vec<OrderItem>, sqlx::Error> {
        let query = format!("SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id = $1 ORDER BY id");
        sqlx::query_as::<_, OrderItem>(&query)
            .bind(order_id)
            .fetch_all(pool)
            .await
    }

    pub async fn list_for_user(
        pool: &PgPool,
        user_id: DbId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Order>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM orders
             WHERE user_id = $1
             ORDER BY created_at DESC
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, Order>(&query)
            .bind(user_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    pub async fn set_step(
        pool: &PgPool,
        id: DbId,
        step: CheckoutStep,
    ) -> Result<Option<Order>, sqlx::Error> {
        let query = format!("UPDATE orders SET step = $2 WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, Order>(&query)
            .bind(id)
            .bind(step.as_str())
            .fetch_optional(pool)
            .await
    }

    /// Store the billing address and advance to `step`.
    pub async fn set_billing_address(
        pool: &PgPool,
        id: DbId,
        address: &BillingAddress,
        step: CheckoutStep,
    ) -> Result<Option<Order>, sqlx::Error> {
        let query = format!(
            "UPDATE orders SET billing_address = $2, step = $3 WHERE id = $1 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Order>(&query)
            .bind(id)
            .bind(Json(address))
            .bind(step.as_str())
            .fetch_optional(pool)
            .await
    }

    /// Store the chosen payment method and advance to `step`.
    pub async fn set_payment_method(
        pool: &PgPool,
        id: DbId,
        method: PaymentMethod,
        step: CheckoutStep,
    ) -> Result<Option<Order>, sqlx::Error> {
        let query = format!(
            "UPDATE orders SET payment_method = $2, step = $3 WHERE id = $1 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Order>(&query)
            .bind(id)
            .bind(method.as_str())
            .bind(step.as_str())
            .fetch_optional(pool)
            .await
    }

    /// Record the gateway outcome and complete the wizard.
    ///
    /// Guarded on `expected` so two concurrent confirmations cannot both win.
    pub async fn settle(
        pool: &PgPool,
        id: DbId,
        expected: OrderStatus,
        status: OrderStatus,
        transfer_reference: Option<&str>,
    ) -> Result<Option<Order>, sqlx::Error> {
        let query = format!(
            "UPDATE orders SET
                status = $3,
                step = $4,
                transfer_reference = $5,
                paid_at = CASE WHEN $3 = 'paid' THEN NOW() ELSE paid_at END
             WHERE id = $1 AND status = $2
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Order>(&query)
            .bind(id)
            .bind(expected.as_str())
            .bind(status.as_str())
            .bind(CheckoutStep::Completed.as_str())
            .bind(transfer_reference)
            .fetch_optional(pool)
            .await
    }

    /// Move an order from `expected` to `status` (admin actions).
    pub async fn update_status(
        pool: &PgPool,
        id: DbId,
        expected: OrderStatus,
        status: OrderStatus,
    ) -> Result<Option<Order>, sqlx::Error> {
        let query = format!(
            "UPDATE orders SET
                status = $3,
                paid_at = CASE WHEN $3 = 'paid' THEN NOW() ELSE paid_at END
             WHERE id = $1 AND status = $2
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Order>(&query)
            .bind(id)
            .bind(expected.as_str())
            .bind(status.as_str())
            .fetch_optional(pool)
            .await
    }
}

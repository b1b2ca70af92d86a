//! Handlers for the checkout wizard (`/checkout`), the caller's order list
//! (`/orders`) and admin order status changes.
//!
//! An order is created from the cart at step `cart` and walks
//! `cart → billing → payment → review → completed`. Payment goes through the
//! simulated gateway in [`PaymentMethod::settle`]; licences for script
//! products are issued as soon as an order is `paid`.

use std::collections::BTreeMap;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use shopforge_core::checkout::{
    format_eur, quote, validate_quantity, BillingAddress, CheckoutStep, OrderStatus,
    PaymentMethod, PaymentOutcome, PricedLine, Quote, MAX_ORDER_LINES,
};
use shopforge_core::error::CoreError;
use shopforge_core::types::DbId;
use shopforge_db::models::order::{CreateOrder, NewOrderItem, Order, OrderWithItems};
use shopforge_db::models::script::License;
use shopforge_db::repositories::{CouponRepo, LicenseRepo, OrderRepo, ProductRepo};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::query::PaginationParams;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CartLine {
    pub product_id: DbId,
    pub quantity: i32,
}

#[derive(Debug, Deserialize)]
pub struct CartRequest {
    pub items: Vec<CartLine>,
    #[serde(default)]
    pub coupon_code: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct QuoteResponse {
    #[serde(flatten)]
    pub quote: Quote,
    pub coupon_code: Option<String>,
    /// Human-readable total, e.g. `"19,99 €"`.
    pub total_display: String,
}

#[derive(Debug, Deserialize)]
pub struct PaymentRequest {
    pub method: PaymentMethod,
}

#[derive(Debug, Deserialize)]
pub struct StepRequest {
    pub step: CheckoutStep,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: OrderStatus,
}

/// Order plus wizard position for the progress bar.
#[derive(Debug, Serialize)]
pub struct OrderView {
    #[serde(flatten)]
    pub order: OrderWithItems,
    pub step_number: u8,
    pub step_label: &'static str,
    pub total_display: String,
}

#[derive(Debug, Serialize)]
pub struct ConfirmResponse {
    pub order: OrderView,
    pub payment: PaymentOutcome,
    /// Licences issued by this confirmation.
    pub licenses: Vec<License>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/checkout/quote
///
/// Price a cart without creating an order.
pub async fn quote_cart(
    State(state): State<AppState>,
    Json(input): Json<CartRequest>,
) -> AppResult<Json<DataResponse<QuoteResponse>>> {
    let priced = price_cart(&state, &input).await?;
    Ok(Json(DataResponse {
        data: QuoteResponse {
            total_display: format_eur(priced.quote.total_cents),
            quote: priced.quote,
            coupon_code: priced.coupon_code,
        },
    }))
}

/// POST /api/v1/checkout/orders
///
/// Create a pending order from the cart. Prices are snapshotted from the
/// catalogue at this moment.
pub async fn create_order(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(input): Json<CartRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<OrderView>>)> {
    let priced = price_cart(&state, &input).await?;

    let order = OrderRepo::create(
        &state.pool,
        &CreateOrder {
            user_id: auth_user.user_id,
            coupon_code: priced.coupon_code,
            subtotal_cents: priced.quote.subtotal_cents,
            discount_cents: priced.quote.discount_cents,
            total_cents: priced.quote.total_cents,
            vat_cents: priced.quote.vat_cents,
            items: priced.items,
        },
    )
    .await?;

    tracing::info!(
        order_id = order.order.id,
        user_id = auth_user.user_id,
        total_cents = order.order.total_cents,
        "Order created",
    );
    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: order_view(order)?,
        }),
    ))
}

/// GET /api/v1/checkout/orders/{id}
pub async fn get_order(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<OrderView>>> {
    let order = load_owned_order(&state, &auth_user, id).await?;
    respond_with_items(&state, order).await
}

/// POST /api/v1/checkout/orders/{id}/step
///
/// Move the wizard. Backward moves may jump to any earlier step; forward
/// moves go one step at a time and require the data of the step being left.
pub async fn change_step(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<DbId>,
    Json(input): Json<StepRequest>,
) -> AppResult<Json<DataResponse<OrderView>>> {
    let order = load_owned_order(&state, &auth_user, id).await?;
    ensure_pending(&order)?;
    let current = CheckoutStep::from_str_db(&order.step)?;
    current.validate_transition(input.step)?;

    match input.step {
        CheckoutStep::Payment if order.billing_address.is_none() => {
            return Err(AppError::Core(CoreError::Validation(
                "Bitte gib zuerst eine Rechnungsadresse an".into(),
            )));
        }
        CheckoutStep::Review if order.payment_method.is_none() => {
            return Err(AppError::Core(CoreError::Validation(
                "Bitte wähle zuerst eine Zahlungsart".into(),
            )));
        }
        CheckoutStep::Completed => {
            return Err(AppError::Core(CoreError::Validation(
                "Bestellungen werden über die Bestätigung abgeschlossen".into(),
            )));
        }
        _ => {}
    }

    let order = OrderRepo::set_step(&state.pool, id, input.step)
        .await?
        .ok_or(order_not_found(id))?;
    tracing::debug!(order_id = id, from = current.as_str(), to = input.step.as_str(), "Checkout step changed");
    respond_with_items(&state, order).await
}

/// PUT /api/v1/checkout/orders/{id}/billing
///
/// Store the billing address (step `billing`) and advance to `payment`.
pub async fn set_billing(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<DbId>,
    Json(address): Json<BillingAddress>,
) -> AppResult<Json<DataResponse<OrderView>>> {
    address.validate()?;
    let order = load_owned_order(&state, &auth_user, id).await?;
    ensure_pending(&order)?;
    ensure_at_step(&order, CheckoutStep::Billing)?;

    let order = OrderRepo::set_billing_address(&state.pool, id, &address, CheckoutStep::Payment)
        .await?
        .ok_or(order_not_found(id))?;
    respond_with_items(&state, order).await
}

/// PUT /api/v1/checkout/orders/{id}/payment
///
/// Choose the payment method (step `payment`) and advance to `review`.
pub async fn set_payment(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<DbId>,
    Json(input): Json<PaymentRequest>,
) -> AppResult<Json<DataResponse<OrderView>>> {
    let order = load_owned_order(&state, &auth_user, id).await?;
    ensure_pending(&order)?;
    ensure_at_step(&order, CheckoutStep::Payment)?;

    let order =
        OrderRepo::set_payment_method(&state.pool, id, input.method, CheckoutStep::Review)
            .await?
            .ok_or(order_not_found(id))?;
    respond_with_items(&state, order).await
}

/// POST /api/v1/checkout/orders/{id}/confirm
///
/// Submit the reviewed order to the payment gateway and complete the wizard.
pub async fn confirm_order(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<ConfirmResponse>>> {
    let order = load_owned_order(&state, &auth_user, id).await?;
    ensure_pending(&order)?;
    ensure_at_step(&order, CheckoutStep::Review)?;

    let method = order
        .payment_method
        .as_deref()
        .map(PaymentMethod::from_str_db)
        .transpose()?
        .ok_or_else(|| {
            AppError::Core(CoreError::Validation("Bitte wähle zuerst eine Zahlungsart".into()))
        })?;

    let outcome = method.settle(order.id);
    OrderStatus::Pending.validate_transition(outcome.status)?;

    let order = OrderRepo::settle(
        &state.pool,
        id,
        OrderStatus::Pending,
        outcome.status,
        outcome.transfer_reference.as_deref(),
    )
    .await?
    .ok_or_else(|| {
        AppError::Core(CoreError::Conflict(
            "Die Bestellung wurde bereits abgeschlossen".into(),
        ))
    })?;

    let licenses = if outcome.status == OrderStatus::Paid {
        LicenseRepo::issue_for_order(&state.pool, id).await?
    } else {
        Vec::new()
    };

    tracing::info!(
        order_id = id,
        method = method.as_str(),
        status = outcome.status.as_str(),
        licenses = licenses.len(),
        "Order confirmed",
    );

    let items = OrderRepo::list_items(&state.pool, id).await?;
    Ok(Json(DataResponse {
        data: ConfirmResponse {
            order: order_view(OrderWithItems { order, items })?,
            payment: outcome,
            licenses,
        },
    }))
}

/// GET /api/v1/orders
pub async fn list_my_orders(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(page): Query<PaginationParams>,
) -> AppResult<Json<DataResponse<Vec<Order>>>> {
    let orders = OrderRepo::list_for_user(
        &state.pool,
        auth_user.user_id,
        shopforge_db::clamp_limit(page.limit),
        shopforge_db::clamp_offset(page.offset),
    )
    .await?;
    Ok(Json(DataResponse { data: orders }))
}

/// PATCH /api/v1/admin/orders/{id}/status
///
/// Manual status changes, e.g. a bank transfer arrived or a refund.
pub async fn admin_update_status(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<StatusRequest>,
) -> AppResult<Json<DataResponse<OrderView>>> {
    let order = OrderRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(order_not_found(id))?;
    let current = OrderStatus::from_str_db(&order.status)?;
    current.validate_transition(input.status)?;

    let order = OrderRepo::update_status(&state.pool, id, current, input.status)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Conflict(
                "Der Bestellstatus wurde zwischenzeitlich geändert".into(),
            ))
        })?;

    if input.status == OrderStatus::Paid {
        let issued = LicenseRepo::issue_for_order(&state.pool, id).await?;
        tracing::info!(order_id = id, licenses = issued.len(), "Licences issued");
    }
    tracing::info!(
        order_id = id,
        admin_id = admin.user_id,
        from = current.as_str(),
        to = input.status.as_str(),
        "Order status changed",
    );
    respond_with_items(&state, order).await
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

struct PricedCart {
    items: Vec<NewOrderItem>,
    quote: Quote,
    coupon_code: Option<String>,
}

/// Merge duplicate lines by product, keeping first-seen order.
fn merge_lines(lines: &[CartLine]) -> Result<Vec<(DbId, i32)>, CoreError> {
    let mut order: Vec<DbId> = Vec::new();
    let mut quantities: BTreeMap<DbId, i32> = BTreeMap::new();
    for line in lines {
        validate_quantity(line.quantity)?;
        let entry = quantities.entry(line.product_id).or_insert_with(|| {
            order.push(line.product_id);
            0
        });
        *entry += line.quantity;
    }
    order
        .into_iter()
        .map(|id| {
            let quantity = quantities[&id];
            validate_quantity(quantity).map(|()| (id, quantity))
        })
        .collect()
}

async fn price_cart(state: &AppState, input: &CartRequest) -> AppResult<PricedCart> {
    if input.items.is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "Der Warenkorb ist leer".into(),
        )));
    }
    if input.items.len() > MAX_ORDER_LINES {
        return Err(AppError::Core(CoreError::Validation(format!(
            "Eine Bestellung darf höchstens {MAX_ORDER_LINES} Positionen enthalten"
        ))));
    }
    let lines = merge_lines(&input.items)?;

    let ids: Vec<DbId> = lines.iter().map(|(id, _)| *id).collect();
    let products = ProductRepo::find_active_by_ids(&state.pool, &ids).await?;

    let mut items = Vec::with_capacity(lines.len());
    for (product_id, quantity) in lines {
        let product = products
            .iter()
            .find(|p| p.id == product_id)
            .ok_or(AppError::Core(CoreError::NotFound {
                entity: "Produkt",
                id: product_id,
            }))?;
        items.push(NewOrderItem {
            product_id,
            product_name: product.name.clone(),
            unit_price_cents: product.price_cents,
            quantity,
        });
    }

    let (coupon_code, coupon_percent) = match input
        .coupon_code
        .as_deref()
        .map(|c| c.trim().to_uppercase())
        .filter(|c| !c.is_empty())
    {
        Some(code) => {
            let coupon = CouponRepo::find_redeemable(&state.pool, &code)
                .await?
                .ok_or_else(|| {
                    AppError::Core(CoreError::Validation(format!(
                        "Der Gutschein '{code}' ist ungültig oder abgelaufen"
                    )))
                })?;
            (Some(coupon.code), Some(coupon.percent_off))
        }
        None => (None, None),
    };

    let priced: Vec<PricedLine> = items
        .iter()
        .map(|i| PricedLine {
            unit_price_cents: i.unit_price_cents,
            quantity: i.quantity,
        })
        .collect();
    let quote = quote(&priced, coupon_percent)?;

    Ok(PricedCart {
        items,
        quote,
        coupon_code,
    })
}

async fn load_owned_order(state: &AppState, user: &AuthUser, id: DbId) -> AppResult<Order> {
    let order = OrderRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(order_not_found(id))?;
    // Hide other customers' orders entirely.
    if order.user_id != user.user_id && !user.is_admin() {
        return Err(order_not_found(id));
    }
    Ok(order)
}

fn ensure_pending(order: &Order) -> AppResult<()> {
    if order.status == OrderStatus::Pending.as_str() {
        Ok(())
    } else {
        Err(AppError::Core(CoreError::Conflict(
            "Die Bestellung kann nicht mehr geändert werden".into(),
        )))
    }
}

fn ensure_at_step(order: &Order, expected: CheckoutStep) -> AppResult<()> {
    let current = CheckoutStep::from_str_db(&order.step)?;
    if current == expected {
        Ok(())
    } else {
        Err(AppError::Core(CoreError::Conflict(format!(
            "Die Bestellung ist im Schritt '{}', erwartet wird '{}'",
            current.label(),
            expected.label()
        ))))
    }
}

fn order_not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "Bestellung",
        id,
    })
}

fn order_view(order: OrderWithItems) -> AppResult<OrderView> {
    let step = CheckoutStep::from_str_db(&order.order.step)?;
    Ok(OrderView {
        step_number: step.to_number(),
        step_label: step.label(),
        total_display: format_eur(order.order.total_cents),
        order,
    })
}

async fn respond_with_items(
    state: &AppState,
    order: Order,
) -> AppResult<Json<DataResponse<OrderView>>> {
    let items = OrderRepo::list_items(&state.pool, order.id).await?;
    Ok(Json(DataResponse {
        data: order_view(OrderWithItems { order, items })?,
    }))
}

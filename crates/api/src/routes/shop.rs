//! Storefront routes: the public catalogue, checkout and order history.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::{checkout, products};
use crate::state::AppState;

/// Public catalogue mounted at `/products`.
///
/// ```text
/// GET /         -> list_products
/// GET /{slug}   -> get_product
/// ```
pub fn products_router() -> Router<AppState> {
    Router::new()
        .route("/", get(products::list_products))
        .route("/{slug}", get(products::get_product))
}

/// Checkout wizard mounted at `/checkout`.
///
/// ```text
/// POST /quote                   -> quote_cart
/// POST /orders                  -> create_order
/// GET  /orders/{id}             -> get_order
/// POST /orders/{id}/step        -> change_step
/// PUT  /orders/{id}/billing     -> set_billing
/// PUT  /orders/{id}/payment     -> set_payment
/// POST /orders/{id}/confirm     -> confirm_order
/// ```
pub fn checkout_router() -> Router<AppState> {
    Router::new()
        .route("/quote", post(checkout::quote_cart))
        .route("/orders", post(checkout::create_order))
        .route("/orders/{id}", get(checkout::get_order))
        .route("/orders/{id}/step", post(checkout::change_step))
        .route("/orders/{id}/billing", put(checkout::set_billing))
        .route("/orders/{id}/payment", put(checkout::set_payment))
        .route("/orders/{id}/confirm", post(checkout::confirm_order))
}

/// Order history mounted at `/orders`.
pub fn orders_router() -> Router<AppState> {
    Router::new().route("/", get(checkout::list_my_orders))
}

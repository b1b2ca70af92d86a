pub mod admin;
pub mod auth;
pub mod health;
pub mod media;
pub mod scripts;
pub mod shop;
pub mod websites;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /auth/...                          registration, login, OTP, OAuth, tokens
/// /products                          public catalogue
/// /checkout/...                      cart quote and checkout wizard (auth)
/// /orders                            caller's orders (auth)
/// /sections/templates                section template catalogue
/// /websites/...                      website CRUD and editor sessions (auth)
/// /sites/{slug}                      published sites (public)
/// /media/...                         media library (auth; content is public)
/// /scripts/...                       script catalogue and download links
/// /licenses                          caller's licences (auth)
/// /downloads/{token}                 signed archive download
/// /cfx/verify                        game-server licence check
/// /admin/...                         catalogue, coupons, orders, scripts, licences
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/products", shop::products_router())
        .nest("/checkout", shop::checkout_router())
        .nest("/orders", shop::orders_router())
        .nest("/sections", websites::sections_router())
        .nest("/websites", websites::router())
        .nest("/sites", websites::public_router())
        .nest("/media", media::router())
        .nest("/scripts", scripts::router())
        .nest("/licenses", scripts::licenses_router())
        .nest("/downloads", scripts::downloads_router())
        .nest("/cfx", scripts::cfx_router())
        .nest("/admin", admin::router())
}

//! Route definitions for `/admin`. Every handler requires the admin role.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, patch, post};
use axum::Router;
use shopforge_core::media::MAX_UPLOAD_BYTES;

use crate::handlers::{checkout, coupons, products, scripts};
use crate::routes::media::MULTIPART_OVERHEAD_BYTES;
use crate::state::AppState;

/// Routes mounted at `/admin`.
///
/// ```text
/// GET    /products                   -> admin_list_products
/// POST   /products                   -> create_product
/// PATCH  /products/{id}              -> update_product
/// DELETE /products/{id}              -> deactivate_product
///
/// GET    /coupons                    -> list_coupons
/// POST   /coupons                    -> create_coupon
///
/// PATCH  /orders/{id}/status         -> admin_update_status
///
/// GET    /scripts                    -> admin_list_scripts
/// POST   /scripts                    -> create_script
/// PATCH  /scripts/{id}               -> update_script
/// POST   /scripts/{id}/versions      -> upload_version (multipart)
/// GET    /scripts/{id}/licenses      -> admin_list_licenses
///
/// POST   /licenses                   -> grant_license
/// PATCH  /licenses/{id}              -> set_license_revoked
/// POST   /licenses/{id}/reset-ip     -> reset_license_ip
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/products",
            get(products::admin_list_products).post(products::create_product),
        )
        .route(
            "/products/{id}",
            patch(products::update_product).delete(products::deactivate_product),
        )
        .route(
            "/coupons",
            get(coupons::list_coupons).post(coupons::create_coupon),
        )
        .route("/orders/{id}/status", patch(checkout::admin_update_status))
        .route(
            "/scripts",
            get(scripts::admin_list_scripts).post(scripts::create_script),
        )
        .route("/scripts/{id}", patch(scripts::update_script))
        .route(
            "/scripts/{id}/versions",
            post(scripts::upload_version)
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES + MULTIPART_OVERHEAD_BYTES)),
        )
        .route("/scripts/{id}/licenses", get(scripts::admin_list_licenses))
        .route("/licenses", post(scripts::grant_license))
        .route("/licenses/{id}", patch(scripts::set_license_revoked))
        .route("/licenses/{id}/reset-ip", post(scripts::reset_license_ip))
}

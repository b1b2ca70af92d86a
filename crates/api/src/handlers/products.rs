//! Handlers for `/products` (public catalogue) and `/admin/products`.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use shopforge_core::checkout::validate_price;
use shopforge_core::error::CoreError;
use shopforge_core::types::DbId;
use shopforge_db::models::product::{
    CreateProduct, Product, UpdateProduct, PRODUCT_KIND_SCRIPT, VALID_PRODUCT_KINDS,
};
use shopforge_db::repositories::{ProductRepo, ScriptRepo};

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::query::{IncludeInactiveParams, PaginationParams};
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/products
pub async fn list_products(
    State(state): State<AppState>,
    Query(page): Query<PaginationParams>,
) -> AppResult<Json<DataResponse<Vec<Product>>>> {
    let products = ProductRepo::list(
        &state.pool,
        false,
        shopforge_db::clamp_limit(page.limit),
        shopforge_db::clamp_offset(page.offset),
    )
    .await?;
    Ok(Json(DataResponse { data: products }))
}

/// GET /api/v1/products/{slug}
pub async fn get_product(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<Json<DataResponse<Product>>> {
    let product = ProductRepo::find_by_slug(&state.pool, &slug)
        .await?
        .filter(|p| p.is_active)
        .ok_or_else(|| AppError::NotFound(format!("Produkt '{slug}' wurde nicht gefunden")))?;
    Ok(Json(DataResponse { data: product }))
}

/// GET /api/v1/admin/products
pub async fn admin_list_products(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Query(filter): Query<IncludeInactiveParams>,
    Query(page): Query<PaginationParams>,
) -> AppResult<Json<DataResponse<Vec<Product>>>> {
    let products = ProductRepo::list(
        &state.pool,
        filter.include_inactive,
        shopforge_db::clamp_limit(page.limit),
        shopforge_db::clamp_offset(page.offset),
    )
    .await?;
    Ok(Json(DataResponse { data: products }))
}

/// POST /api/v1/admin/products
pub async fn create_product(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<CreateProduct>,
) -> AppResult<(StatusCode, Json<DataResponse<Product>>)> {
    validate_create(&input)?;

    if let Some(script_id) = input.script_id {
        ScriptRepo::find_by_id(&state.pool, script_id)
            .await?
            .ok_or(AppError::Core(CoreError::NotFound {
                entity: "Skript",
                id: script_id,
            }))?;
    }

    let product = ProductRepo::create(&state.pool, &input).await?;
    tracing::info!(product_id = product.id, admin_id = admin.user_id, "Product created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: product })))
}

/// PATCH /api/v1/admin/products/{id}
pub async fn update_product(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateProduct>,
) -> AppResult<Json<DataResponse<Product>>> {
    if let Some(name) = &input.name {
        validate_name(name)?;
    }
    if let Some(price) = input.price_cents {
        validate_price(price)?;
    }

    let product = ProductRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Produkt",
            id,
        }))?;
    tracing::info!(product_id = id, admin_id = admin.user_id, "Product updated");
    Ok(Json(DataResponse { data: product }))
}

/// DELETE /api/v1/admin/products/{id}
///
/// Products are referenced by orders, so this deactivates instead of deleting.
pub async fn deactivate_product(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    let update = UpdateProduct {
        name: None,
        description: None,
        price_cents: None,
        is_active: Some(false),
    };
    ProductRepo::update(&state.pool, id, &update)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Produkt",
            id,
        }))?;
    tracing::info!(product_id = id, admin_id = admin.user_id, "Product deactivated");
    Ok(StatusCode::NO_CONTENT)
}

fn validate_create(input: &CreateProduct) -> AppResult<()> {
    validate_name(&input.name)?;
    validate_price(input.price_cents)?;
    validate_slug(&input.slug)?;

    if !VALID_PRODUCT_KINDS.contains(&input.kind.as_str()) {
        return Err(AppError::Core(CoreError::Validation(format!(
            "Ungültige Produktart '{}'. Erlaubt: {}",
            input.kind,
            VALID_PRODUCT_KINDS.join(", ")
        ))));
    }
    let is_script = input.kind == PRODUCT_KIND_SCRIPT;
    if is_script != input.script_id.is_some() {
        return Err(AppError::Core(CoreError::Validation(
            "Script-Produkte benötigen genau ein verknüpftes Script".into(),
        )));
    }
    Ok(())
}

fn validate_name(name: &str) -> AppResult<()> {
    if name.trim().is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "Der Produktname darf nicht leer sein".into(),
        )));
    }
    Ok(())
}

/// Slugs are lower-case ASCII words joined by single hyphens.
pub(crate) fn validate_slug(slug: &str) -> AppResult<()> {
    let valid = !slug.is_empty()
        && slug.len() <= 80
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && !slug.contains("--")
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if valid {
        Ok(())
    } else {
        Err(AppError::Core(CoreError::Validation(format!(
            "Ungültiger Slug '{slug}'. Erlaubt sind Kleinbuchstaben, Ziffern und Bindestriche"
        ))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(kind: &str, script_id: Option<DbId>) -> CreateProduct {
        CreateProduct {
            slug: "garage-pro".into(),
            name: "Garage Pro".into(),
            description: String::new(),
            price_cents: 1999,
            kind: kind.into(),
            script_id,
        }
    }

    #[test]
    fn slugs() {
        assert!(validate_slug("mein-shop-2").is_ok());
        for bad in ["", "-a", "a-", "a--b", "Gross", "mit leer"] {
            assert!(validate_slug(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn script_products_need_a_script() {
        assert!(validate_create(&product("script", Some(1))).is_ok());
        assert!(validate_create(&product("script", None)).is_err());
        assert!(validate_create(&product("digital", Some(1))).is_err());
        assert!(validate_create(&product("digital", None)).is_ok());
        assert!(validate_create(&product("hardware", None)).is_err());
    }
}

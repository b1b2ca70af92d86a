//! Admin handlers for `/admin/coupons`.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use shopforge_core::error::CoreError;
use shopforge_db::models::coupon::{Coupon, CreateCoupon};
use shopforge_db::repositories::CouponRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/admin/coupons
pub async fn list_coupons(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<Coupon>>>> {
    let coupons = CouponRepo::list(&state.pool).await?;
    Ok(Json(DataResponse { data: coupons }))
}

/// POST /api/v1/admin/coupons
///
/// Codes are stored upper-case; lookups at checkout upper-case the input too.
pub async fn create_coupon(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(mut input): Json<CreateCoupon>,
) -> AppResult<(StatusCode, Json<DataResponse<Coupon>>)> {
    input.code = input.code.trim().to_uppercase();
    validate_coupon(&input)?;

    let coupon = CouponRepo::create(&state.pool, &input).await?;
    tracing::info!(coupon_id = coupon.id, admin_id = admin.user_id, code = %coupon.code, "Coupon created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: coupon })))
}

fn validate_coupon(input: &CreateCoupon) -> AppResult<()> {
    let code_ok = (3..=32).contains(&input.code.len())
        && input
            .code
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '-');
    if !code_ok {
        return Err(AppError::Core(CoreError::Validation(
            "Gutscheincodes bestehen aus 3 bis 32 Zeichen: A-Z, 0-9 und '-'".into(),
        )));
    }
    if !(1..=100).contains(&input.percent_off) {
        return Err(AppError::Core(CoreError::Validation(
            "Der Rabatt muss zwischen 1 und 100 Prozent liegen".into(),
        )));
    }
    if input.valid_until.is_some_and(|until| until <= Utc::now()) {
        return Err(AppError::Core(CoreError::Validation(
            "Das Ablaufdatum muss in der Zukunft liegen".into(),
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coupon(code: &str, percent_off: i64) -> CreateCoupon {
        CreateCoupon {
            code: code.into(),
            percent_off,
            valid_until: None,
        }
    }

    #[test]
    fn coupon_rules() {
        assert!(validate_coupon(&coupon("SOMMER-10", 10)).is_ok());
        assert!(validate_coupon(&coupon("AB", 10)).is_err());
        assert!(validate_coupon(&coupon("SOMMER 10", 10)).is_err());
        assert!(validate_coupon(&coupon("SOMMER", 0)).is_err());
        assert!(validate_coupon(&coupon("SOMMER", 101)).is_err());

        let expired = CreateCoupon {
            valid_until: Some(Utc::now() - chrono::Duration::days(1)),
            ..coupon("SOMMER", 10)
        };
        assert!(validate_coupon(&expired).is_err());
    }
}

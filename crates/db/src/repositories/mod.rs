//! Repositories: zero-sized structs with async methods taking `&PgPool`.

mod coupon_repo;
mod license_repo;
mod media_repo;
mod oauth_repo;
mod order_repo;
mod otp_repo;
mod product_repo;
mod role_repo;
mod script_repo;
mod session_repo;
mod user_repo;
mod website_repo;

pub use coupon_repo::CouponRepo;
pub use license_repo::LicenseRepo;
pub use media_repo::MediaRepo;
pub use oauth_repo::OAuthIdentityRepo;
pub use order_repo::OrderRepo;
pub use otp_repo::OtpRepo;
pub use product_repo::ProductRepo;
pub use role_repo::RoleRepo;
pub use script_repo::ScriptRepo;
pub use session_repo::SessionRepo;
pub use user_repo::UserRepo;
pub use website_repo::WebsiteRepo;

//! Row structs (`FromRow`) and input DTOs, one module per table group.

pub mod coupon;
pub mod media;
pub mod oauth;
pub mod order;
pub mod otp;
pub mod product;
pub mod script;
pub mod session;
pub mod user;
pub mod website;

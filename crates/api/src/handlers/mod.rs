//! Request handlers, one submodule per resource.
//!
//! Handlers validate input, delegate to the repositories in `shopforge_db`
//! and the domain rules in `shopforge_core`, and map failures via
//! [`AppError`](crate::error::AppError).

pub mod auth;
pub mod checkout;
pub mod coupons;
pub mod editor;
pub mod media;
pub mod oauth;
pub mod products;
pub mod scripts;
pub mod websites;

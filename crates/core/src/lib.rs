//! Domain logic for the shopforge backend: editor history, website sections,
//! checkout, authentication helpers, media rules, script distribution and
//! object storage. No database or HTTP dependencies.

pub mod checkout;
pub mod crypto;
pub mod editor;
pub mod error;
pub mod history;
pub mod media;
pub mod oauth;
pub mod otp;
pub mod roles;
pub mod scripts;
pub mod sections;
pub mod storage;
pub mod types;

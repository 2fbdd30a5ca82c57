//! Backend API client and the domain services that wrap it.

pub mod analytics;
pub mod client;
pub mod currency;
pub mod history;
pub mod tier;

//! Client-local state and the conversion workflow built on top of it.

pub mod converter;
pub mod history;
pub mod rate_cache;
pub mod storage;
pub mod ui_state;

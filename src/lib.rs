//! NekoStack conversion core.
//!
//! Client-side bookkeeping for the currency and unit converters: a short-lived
//! exchange-rate cache, a bounded conversion history, persisted UI state, and
//! a JSON client for the tools, analytics and gateway backends.

pub mod api;
pub mod core;
pub mod shared;

use tracing_subscriber::EnvFilter;

pub use crate::api::client::{ApiClient, Service};
pub use crate::api::tier::{Delivery, Operation, Tier};
pub use crate::core::converter::ConversionWorkflow;
pub use crate::core::history::{ConversionHistory, MAX_HISTORY_SIZE};
pub use crate::core::rate_cache::RateCache;
pub use crate::core::storage::{InMemoryStorage, LocalStorage, RedbStorage};
pub use crate::shared::error::{AppError, AppResult};
pub use crate::shared::settings::{ApiEndpoints, AppSettings};

/// Installs the fmt subscriber, filtered by `RUST_LOG` (default `info`).
///
/// Safe to call more than once; only the first call installs anything.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

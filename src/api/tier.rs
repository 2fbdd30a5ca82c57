//! Critical vs best-effort calls.
//!
//! Critical operations hand their error back to the caller. Best-effort ones
//! log a warning and settle into a `Delivery`, so a failing side channel can
//! never interrupt the primary flow.

use tracing::{debug, warn};

use crate::shared::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Critical,
    BestEffort,
}

/// A named service operation tagged with its tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operation {
    pub name: &'static str,
    pub tier: Tier,
}

impl Operation {
    pub const fn critical(name: &'static str) -> Self {
        Self { name, tier: Tier::Critical }
    }

    pub const fn best_effort(name: &'static str) -> Self {
        Self { name, tier: Tier::BestEffort }
    }

    /// Passes a critical result through unchanged, noting failures.
    pub fn propagate<T>(&self, result: AppResult<T>) -> AppResult<T> {
        debug_assert_eq!(self.tier, Tier::Critical, "{} is not critical", self.name);
        if let Err(e) = &result {
            debug!("[{}] failed: {}", self.name, e);
        }
        result
    }

    /// Settles a best-effort result, logging instead of failing.
    pub fn settle<T>(&self, result: AppResult<T>) -> Delivery<T> {
        debug_assert_eq!(self.tier, Tier::BestEffort, "{} is not best-effort", self.name);
        match result {
            Ok(value) => Delivery::Delivered(value),
            Err(e) => {
                warn!("[{}] best-effort call dropped: {}", self.name, e);
                Delivery::Dropped(e)
            }
        }
    }
}

/// Outcome of a best-effort call.
#[must_use = "a Delivery may carry a dropped error worth inspecting"]
#[derive(Debug, Clone)]
pub enum Delivery<T> {
    Delivered(T),
    Dropped(AppError),
}

impl<T> Delivery<T> {
    pub fn is_delivered(&self) -> bool {
        matches!(self, Delivery::Delivered(_))
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Delivery::Delivered(value) => Some(value),
            Delivery::Dropped(_) => None,
        }
    }

    pub fn dropped_error(&self) -> Option<&AppError> {
        match self {
            Delivery::Delivered(_) => None,
            Delivery::Dropped(e) => Some(e),
        }
    }
}

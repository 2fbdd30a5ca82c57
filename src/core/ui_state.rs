//! Persisted UI state slices.
//!
//! Each slice is a plain serializable struct with an explicit load/save
//! boundary. Loading never fails: a missing or corrupt value yields the
//! slice's default.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::storage::{load_json, save_json, LocalStorage};
use crate::shared::error::AppResult;
use crate::shared::types::{Announcement, UserProfile};

pub trait PersistedSlice: Serialize + DeserializeOwned + Default {
    const KEY: &'static str;

    fn load(storage: &dyn LocalStorage) -> Self {
        match load_json(storage, Self::KEY) {
            Ok(Some(slice)) => slice,
            Ok(None) => Self::default(),
            Err(e) => {
                warn!("[UiState] Resetting {}: {}", Self::KEY, e);
                Self::default()
            }
        }
    }

    fn save(&self, storage: &dyn LocalStorage) -> AppResult<()> {
        save_json(storage, Self::KEY, self)
    }

    fn clear(storage: &dyn LocalStorage) -> AppResult<()> {
        storage.remove(Self::KEY)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DismissedAnnouncements {
    ids: Vec<String>,
}

impl PersistedSlice for DismissedAnnouncements {
    const KEY: &'static str = "nekostack.announcements.dismissed";
}

impl DismissedAnnouncements {
    pub fn dismiss(&mut self, id: &str) {
        if !self.is_dismissed(id) {
            self.ids.push(id.to_string());
        }
    }

    pub fn is_dismissed(&self, id: &str) -> bool {
        self.ids.iter().any(|d| d == id)
    }

    /// Announcements still worth showing. Non-dismissible ones are always shown.
    pub fn visible<'a>(&self, announcements: &'a [Announcement]) -> Vec<&'a Announcement> {
        announcements
            .iter()
            .filter(|a| !a.dismissible || !self.is_dismissed(&a.id))
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StarredFiles {
    ids: Vec<String>,
}

impl PersistedSlice for StarredFiles {
    const KEY: &'static str = "nekostack.files.starred";
}

impl StarredFiles {
    /// Stars or unstars `id`, returning whether it is starred afterwards.
    pub fn toggle(&mut self, id: &str) -> bool {
        if let Some(pos) = self.ids.iter().position(|s| s == id) {
            self.ids.remove(pos);
            false
        } else {
            self.ids.push(id.to_string());
            true
        }
    }

    pub fn is_starred(&self, id: &str) -> bool {
        self.ids.iter().any(|s| s == id)
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingProgress {
    pub completed_steps: Vec<String>,
    pub finished: bool,
    #[serde(default)]
    pub finished_at: Option<DateTime<Utc>>,
}

impl PersistedSlice for OnboardingProgress {
    const KEY: &'static str = "nekostack.onboarding";
}

impl OnboardingProgress {
    pub fn complete_step(&mut self, step: &str) {
        if !self.completed_steps.iter().any(|s| s == step) {
            self.completed_steps.push(step.to_string());
        }
    }

    pub fn finish(&mut self) {
        self.finished = true;
        self.finished_at = Some(Utc::now());
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Snapshot of the signed-in user, if any.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSnapshot {
    pub user: Option<UserProfile>,
    #[serde(default)]
    pub signed_in_at: Option<DateTime<Utc>>,
}

impl PersistedSlice for AuthSnapshot {
    const KEY: &'static str = "nekostack.auth.user";
}

impl AuthSnapshot {
    pub fn sign_in(&mut self, user: UserProfile) {
        self.user = Some(user);
        self.signed_in_at = Some(Utc::now());
    }

    pub fn sign_out(&mut self) {
        self.user = None;
        self.signed_in_at = None;
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}

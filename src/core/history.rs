use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, warn};

use crate::core::storage::{load_json, save_json, LocalStorage};
use crate::shared::types::ConversionHistoryItem;

/// Maximum number of conversion records to keep
pub const MAX_HISTORY_SIZE: usize = 50;

pub const HISTORY_KEY: &str = "nekostack.conversion.history";

/// Conversion history, newest first, mirrored to local storage on every change.
pub struct ConversionHistory {
    storage: Arc<dyn LocalStorage>,
    items: Mutex<Vec<ConversionHistoryItem>>,
}

impl ConversionHistory {
    /// Loads whatever is persisted. An unreadable list starts out empty.
    pub fn load(storage: Arc<dyn LocalStorage>) -> Self {
        let mut items: Vec<ConversionHistoryItem> = match load_json(storage.as_ref(), HISTORY_KEY) {
            Ok(Some(items)) => items,
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!("[ConversionHistory] Discarding unreadable history: {}", e);
                Vec::new()
            }
        };
        items.truncate(MAX_HISTORY_SIZE);

        Self {
            storage,
            items: Mutex::new(items),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<ConversionHistoryItem>> {
        match self.items.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("[ConversionHistory] Mutex poisoned, recovering...");
                poisoned.into_inner()
            }
        }
    }

    /// Prepends a record and keeps only the most recent `MAX_HISTORY_SIZE`.
    pub fn add(&self, item: ConversionHistoryItem) {
        let mut items = self.lock();
        items.insert(0, item);
        items.truncate(MAX_HISTORY_SIZE);

        if let Err(e) = save_json(self.storage.as_ref(), HISTORY_KEY, &*items) {
            warn!("[ConversionHistory] Failed to persist history: {}", e);
        }
        debug!("[ConversionHistory] Now holding {} records", items.len());
    }

    pub fn clear(&self) {
        self.lock().clear();
        if let Err(e) = self.storage.remove(HISTORY_KEY) {
            warn!("[ConversionHistory] Failed to remove stored history: {}", e);
        }
    }

    pub fn items(&self) -> Vec<ConversionHistoryItem> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::storage::{InMemoryStorage, RedbStorage};
    use crate::shared::types::ConversionKind;
    use rust_decimal::Decimal;

    fn record(i: usize) -> ConversionHistoryItem {
        ConversionHistoryItem::currency("USD", format!("C{:02}", i), Decimal::from(i as u64))
    }

    #[test]
    fn test_add_and_get_items() {
        let history = ConversionHistory::load(Arc::new(InMemoryStorage::new()));

        history.add(ConversionHistoryItem::unit("km", "mi", "length"));
        history.add(ConversionHistoryItem::currency("USD", "EUR", Decimal::ONE));

        let items = history.items();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].kind, ConversionKind::Currency); // Most recent first
        assert_eq!(items[1].kind, ConversionKind::Unit);
    }

    #[test]
    fn test_max_history_size() {
        let history = ConversionHistory::load(Arc::new(InMemoryStorage::new()));

        for i in 0..60 {
            history.add(record(i));
        }

        let items = history.items();
        assert_eq!(items.len(), MAX_HISTORY_SIZE);
        assert_eq!(items[0].to, "C59");
        assert_eq!(items[MAX_HISTORY_SIZE - 1].to, "C10");
    }

    #[test]
    fn test_duplicates_are_kept() {
        let history = ConversionHistory::load(Arc::new(InMemoryStorage::new()));
        let item = ConversionHistoryItem::unit("kg", "lb", "mass");
        history.add(item.clone());
        history.add(item);
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn test_every_add_is_persisted() {
        let storage = Arc::new(InMemoryStorage::new());
        let history = ConversionHistory::load(storage.clone());
        history.add(record(1));
        history.add(record(2));

        let stored: Vec<ConversionHistoryItem> = load_json(storage.as_ref(), HISTORY_KEY).unwrap().unwrap();
        assert_eq!(stored, history.items());
    }

    #[test]
    fn test_clear() {
        let storage = Arc::new(InMemoryStorage::new());
        let history = ConversionHistory::load(storage.clone());

        history.add(record(1));
        history.add(record(2));
        assert_eq!(history.len(), 2);

        history.clear();

        assert!(history.is_empty());
        assert_eq!(storage.get(HISTORY_KEY).unwrap(), None);
    }

    #[test]
    fn test_history_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.redb");
        {
            let storage = Arc::new(RedbStorage::open(&path).unwrap());
            let history = ConversionHistory::load(storage);
            history.add(record(1));
            history.add(record(2));
        }

        let storage = Arc::new(RedbStorage::open(&path).unwrap());
        let history = ConversionHistory::load(storage);
        let items = history.items();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].to, "C02");
    }

    #[test]
    fn test_corrupt_history_loads_empty() {
        let storage = Arc::new(InMemoryStorage::new());
        storage.set(HISTORY_KEY, "not a list").unwrap();

        let history = ConversionHistory::load(storage);
        assert!(history.is_empty());
    }
}

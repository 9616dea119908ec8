//! Read-only access to the audit trail.

use std::{sync::Arc, time::Duration};

use uuid::Uuid;

use crate::{
  Result,
  activity::{ActivityFilter, ActivityLog},
  page::{MAX_PAGE_SIZE, Page, PageRequest},
  store::{InventoryStore, bounded},
};

/// Default size of [`ActivityQuery::recent`].
pub const DEFAULT_RECENT: u32 = 10;

pub struct ActivityQuery<S> {
  store:   Arc<S>,
  timeout: Duration,
}

impl<S: InventoryStore> ActivityQuery<S> {
  pub fn new(store: Arc<S>, timeout: Duration) -> Self { Self { store, timeout } }

  pub async fn list(&self, filter: &ActivityFilter, page: PageRequest) -> Result<Page<ActivityLog>> {
    bounded(self.timeout, self.store.list_activities(filter, page)).await
  }

  /// History of one item; still answers after the item has been deleted.
  pub async fn list_by_item(&self, item_id: Uuid, page: PageRequest) -> Result<Page<ActivityLog>> {
    let filter = ActivityFilter::for_item(item_id);
    bounded(self.timeout, self.store.list_activities(&filter, page)).await
  }

  /// The `n` newest rows across all items. `n` outside `1..=100` falls back
  /// to [`DEFAULT_RECENT`].
  pub async fn recent(&self, n: Option<i64>) -> Result<Vec<ActivityLog>> {
    let n = n
      .filter(|n| (1..=i64::from(MAX_PAGE_SIZE)).contains(n))
      .and_then(|n| u32::try_from(n).ok())
      .unwrap_or(DEFAULT_RECENT);
    bounded(self.timeout, self.store.recent_activities(n)).await
  }
}

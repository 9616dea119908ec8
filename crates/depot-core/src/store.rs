//! The `InventoryStore` trait and the timeout wrapper services use around it.
//!
//! The trait is implemented by storage backends (e.g. `depot-store-sqlite`).
//! The services in this crate depend on this abstraction, not on any concrete
//! backend, and receive it explicitly in their constructors.

use std::{
  future::Future,
  time::{Duration, Instant},
};

use uuid::Uuid;

use crate::{
  Error, Result,
  activity::{ActivityFilter, ActivityLog, Actor},
  item::{Item, ItemPatch, ItemUpdate, NewItem, StockChange},
  page::{Page, PageRequest},
  user::{NewUser, User},
};

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a Depot storage backend.
///
/// Every item mutation writes the item and its [`ActivityLog`] row in a single
/// transaction: either both land or neither does. Rules that depend on the
/// current row (the stock floor in particular) are evaluated against the value
/// read inside that transaction.
///
/// Mutations also take a [`Deadline`]. A backend must not commit once it has
/// passed; it reports [`Error::Timeout`] and leaves nothing behind.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait InventoryStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static + Into<Error>;

  // ── Users ─────────────────────────────────────────────────────────────

  /// Persist a new user. Fails with a conflict if the email is taken.
  fn insert_user(
    &self,
    input: NewUser,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  fn get_user(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  fn find_user_by_email<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + 'a;

  // ── Items: ledger writes ──────────────────────────────────────────────

  /// Materialise `input` into a new item and write it with its
  /// `ITEM_CREATED` row. Fails with a conflict on a duplicate SKU.
  fn create_item(
    &self,
    actor: Actor,
    input: NewItem,
    deadline: Deadline,
  ) -> impl Future<Output = Result<(Item, ActivityLog), Self::Error>> + Send + '_;

  /// Apply `patch` and write the `ITEM_UPDATED` row. The returned
  /// [`ItemUpdate`] carries the row as it was read inside the transaction.
  fn update_item(
    &self,
    id: Uuid,
    actor: Actor,
    patch: ItemPatch,
    deadline: Deadline,
  ) -> impl Future<Output = Result<ItemUpdate, Self::Error>> + Send + '_;

  /// Move stock and write the matching `STOCK_*` row. A decrement below zero
  /// leaves both the item and the audit trail untouched.
  fn adjust_stock(
    &self,
    id: Uuid,
    actor: Actor,
    change: StockChange,
    deadline: Deadline,
  ) -> impl Future<Output = Result<(Item, ActivityLog), Self::Error>> + Send + '_;

  /// Delete the item and write the `ITEM_DELETED` row. Returns the item as it
  /// was just before deletion.
  fn delete_item(
    &self,
    id: Uuid,
    actor: Actor,
    deadline: Deadline,
  ) -> impl Future<Output = Result<(Item, ActivityLog), Self::Error>> + Send + '_;

  // ── Items: reads ──────────────────────────────────────────────────────

  fn get_item(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Item>, Self::Error>> + Send + '_;

  /// All items, newest first, with their creator projection.
  fn list_items(&self) -> impl Future<Output = Result<Vec<Item>, Self::Error>> + Send + '_;

  // ── Activity ──────────────────────────────────────────────────────────

  /// Matching rows, newest first, plus the total match count.
  fn list_activities<'a>(
    &'a self,
    filter: &'a ActivityFilter,
    page: PageRequest,
  ) -> impl Future<Output = Result<Page<ActivityLog>, Self::Error>> + Send + 'a;

  fn recent_activities(
    &self,
    limit: u32,
  ) -> impl Future<Output = Result<Vec<ActivityLog>, Self::Error>> + Send + '_;
}

// ─── Deadline ────────────────────────────────────────────────────────────────

/// The point after which a store mutation must give up instead of committing.
///
/// Reads are simply abandoned when they run long (see [`bounded`]). Writes
/// cannot be: the work already handed to the backend would still commit after
/// the caller had been told it timed out. So the backend checks the deadline
/// itself, inside the transaction.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
  at:     Instant,
  budget: Duration,
}

impl Deadline {
  pub fn after(budget: Duration) -> Self {
    Self {
      at: Instant::now() + budget,
      budget,
    }
  }

  /// Time left, or [`Error::Timeout`] once it has run out.
  pub fn remaining(&self) -> Result<Duration> {
    match self.at.checked_duration_since(Instant::now()) {
      Some(left) if !left.is_zero() => Ok(left),
      _ => Err(self.expired()),
    }
  }

  pub fn check(&self) -> Result<()> { self.remaining().map(|_| ()) }

  pub fn expired(&self) -> Error { Error::Timeout(self.budget) }
}

/// Await a read-only store call for at most `limit`, folding its error into
/// [`Error`].
pub(crate) async fn bounded<T, E>(
  limit: Duration,
  call: impl Future<Output = Result<T, E>>,
) -> Result<T>
where
  E: Into<Error>,
{
  match tokio::time::timeout(limit, call).await {
    Ok(outcome) => outcome.map_err(Into::into),
    Err(_) => Err(Error::Timeout(limit)),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn slow_call_times_out() {
    let err = bounded(Duration::from_millis(10), async {
      tokio::time::sleep(Duration::from_secs(5)).await;
      Ok::<_, Error>(())
    })
    .await
    .unwrap_err();
    assert!(matches!(err, Error::Timeout(_)));
  }

  #[test]
  fn deadline_runs_out() {
    let deadline = Deadline::after(Duration::from_millis(5));
    assert!(deadline.check().is_ok());
    std::thread::sleep(Duration::from_millis(10));
    assert!(matches!(deadline.remaining(), Err(Error::Timeout(d)) if d == Duration::from_millis(5)));
    assert!(Deadline::after(Duration::ZERO).check().is_err());
  }

  #[tokio::test]
  async fn fast_call_passes_through() {
    let value = bounded(Duration::from_secs(1), async { Ok::<_, Error>(7) })
      .await
      .unwrap();
    assert_eq!(value, 7);
  }
}

//! The inventory ledger: item lifecycle with a mandatory audit row per change.
//!
//! The ledger validates caller input and resolves the acting user; the
//! backend then applies each mutation and its [`ActivityLog`] row in one
//! transaction (see [`InventoryStore`]).
//!
//! Writes are awaited to completion rather than abandoned on a timer. The
//! time budget travels into the transaction as a [`Deadline`], so a
//! [`Error::Timeout`] from a mutation always means nothing was committed.

use std::{sync::Arc, time::Duration};

use uuid::Uuid;

use crate::{
  Error, Result,
  activity::{ActivityLog, Actor},
  item::{Item, ItemPatch, ItemUpdate, NewItem, StockChange},
  store::{Deadline, InventoryStore, bounded},
};

pub struct Ledger<S> {
  store:   Arc<S>,
  timeout: Duration,
}

impl<S: InventoryStore> Ledger<S> {
  pub fn new(store: Arc<S>, timeout: Duration) -> Self { Self { store, timeout } }

  /// Resolve the caller to a stored user. A token for a user that no longer
  /// resolves is a fatal precondition failure, not something to retry.
  async fn actor(&self, caller: Uuid) -> Result<Actor> {
    let user = bounded(self.timeout, self.store.get_user(caller))
      .await?
      .ok_or(Error::UserNotFound(caller))?;
    Ok(Actor::from(&user))
  }

  pub async fn create_item(&self, input: NewItem, caller: Uuid) -> Result<(Item, ActivityLog)> {
    input.validate()?;
    let deadline = Deadline::after(self.timeout);
    let actor = self.actor(caller).await?;
    let (item, log) = self
      .store
      .create_item(actor, input, deadline)
      .await
      .map_err(Into::<Error>::into)?;
    tracing::info!(
      item_id = %item.id,
      sku = %item.sku,
      stock = item.stock,
      user_id = %caller,
      "item created"
    );
    Ok((item, log))
  }

  pub async fn update_item(
    &self,
    id: Uuid,
    patch: ItemPatch,
    caller: Uuid,
  ) -> Result<ItemUpdate> {
    patch.validate()?;
    let deadline = Deadline::after(self.timeout);
    let actor = self.actor(caller).await?;
    let update = self
      .store
      .update_item(id, actor, patch, deadline)
      .await
      .map_err(Into::<Error>::into)?;
    tracing::info!(item_id = %id, user_id = %caller, "item updated");
    Ok(update)
  }

  /// Move stock up or down. `quantity` and `direction` are raw caller input
  /// and are validated here even if a request layer already did so.
  pub async fn update_stock(
    &self,
    id: Uuid,
    quantity: i64,
    direction: &str,
    reason: Option<String>,
    caller: Uuid,
  ) -> Result<(Item, ActivityLog)> {
    let change = StockChange::new(quantity, direction, reason)?;
    let deadline = Deadline::after(self.timeout);
    let actor = self.actor(caller).await?;
    let direction = change.direction;

    let outcome = self.store.adjust_stock(id, actor, change, deadline).await;
    match outcome.map_err(Into::<Error>::into) {
      Ok((item, log)) => {
        tracing::info!(
          item_id = %id,
          %direction,
          quantity = log.quantity,
          old_stock = log.old_stock,
          new_stock = log.new_stock,
          user_id = %caller,
          "stock adjusted"
        );
        Ok((item, log))
      }
      Err(e @ Error::InsufficientStock { available, requested, .. }) => {
        tracing::warn!(item_id = %id, available, requested, user_id = %caller, "stock decrement rejected");
        Err(e)
      }
      Err(e) => Err(e),
    }
  }

  pub async fn delete_item(&self, id: Uuid, caller: Uuid) -> Result<(Item, ActivityLog)> {
    let deadline = Deadline::after(self.timeout);
    let actor = self.actor(caller).await?;
    let (item, log) = self
      .store
      .delete_item(id, actor, deadline)
      .await
      .map_err(Into::<Error>::into)?;
    tracing::info!(item_id = %id, name = %item.name, user_id = %caller, "item deleted");
    Ok((item, log))
  }

  pub async fn get_item(&self, id: Uuid) -> Result<Item> {
    bounded(self.timeout, self.store.get_item(id))
      .await?
      .ok_or(Error::ItemNotFound(id))
  }

  pub async fn list_items(&self) -> Result<Vec<Item>> {
    bounded(self.timeout, self.store.list_items()).await
  }
}

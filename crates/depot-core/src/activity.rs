//! The append-only audit trail.
//!
//! An [`ActivityLog`] row is written in the same transaction as the item
//! mutation it describes and is never updated afterwards. User and item names
//! are copied in at write time, so rows stay readable after the item is gone.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  item::{Item, StockChange, StockDirection},
  user::User,
};

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
  strum::IntoStaticStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityAction {
  ItemCreated,
  ItemUpdated,
  ItemDeleted,
  StockIncrement,
  StockDecrement,
}

impl ActivityAction {
  pub fn parse(raw: &str) -> Result<Self> {
    raw
      .parse()
      .map_err(|_| Error::invalid(format!("unknown activity type: {raw:?}")))
  }
}

impl From<StockDirection> for ActivityAction {
  fn from(direction: StockDirection) -> Self {
    match direction {
      StockDirection::Increment => Self::StockIncrement,
      StockDirection::Decrement => Self::StockDecrement,
    }
  }
}

/// The user performing a ledger mutation, captured by value for the audit row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
  pub user_id: Uuid,
  pub name:    String,
}

impl From<&User> for Actor {
  fn from(user: &User) -> Self {
    Self { user_id: user.id, name: user.name.clone() }
  }
}

/// One immutable audit record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityLog {
  pub id:          Uuid,
  pub user_id:     Uuid,
  pub user_name:   String,
  pub item_id:     Uuid,
  pub item_name:   String,
  pub action:      ActivityAction,
  /// Units moved; zero for non-stock actions.
  pub quantity:    u32,
  pub old_stock:   u32,
  pub new_stock:   u32,
  pub description: String,
  pub created_at:  DateTime<Utc>,
}

impl ActivityLog {
  fn base(
    actor: &Actor,
    item: &Item,
    action: ActivityAction,
    description: impl Into<String>,
    now: DateTime<Utc>,
  ) -> Self {
    Self {
      id: Uuid::new_v4(),
      user_id: actor.user_id,
      user_name: actor.name.clone(),
      item_id: item.id,
      item_name: item.name.clone(),
      action,
      quantity: 0,
      old_stock: 0,
      new_stock: 0,
      description: description.into(),
      created_at: now,
    }
  }

  /// Opening row: the whole initial stock counts as the first movement.
  pub fn item_created(actor: &Actor, item: &Item, now: DateTime<Utc>) -> Self {
    Self {
      quantity: item.stock,
      new_stock: item.stock,
      ..Self::base(actor, item, ActivityAction::ItemCreated, "Item created", now)
    }
  }

  pub fn item_updated(actor: &Actor, item: &Item, now: DateTime<Utc>) -> Self {
    Self::base(actor, item, ActivityAction::ItemUpdated, "Item updated", now)
  }

  /// `item` is the row *after* the change; `old_stock` is what was read in the
  /// same transaction.
  pub fn stock_changed(
    actor: &Actor,
    item: &Item,
    change: &StockChange,
    old_stock: u32,
    now: DateTime<Utc>,
  ) -> Self {
    Self {
      quantity: change.quantity,
      old_stock,
      new_stock: item.stock,
      ..Self::base(actor, item, change.direction.into(), change.reason.clone(), now)
    }
  }

  pub fn item_deleted(actor: &Actor, item: &Item, now: DateTime<Utc>) -> Self {
    Self::base(actor, item, ActivityAction::ItemDeleted, "Item deleted", now)
  }
}

/// Filters for [`crate::query::ActivityQuery::list`]. Every `None` field is
/// unconstrained.
#[derive(Debug, Clone, Default)]
pub struct ActivityFilter {
  pub action:       Option<ActivityAction>,
  pub item_id:      Option<Uuid>,
  pub user_id:      Option<Uuid>,
  /// Inclusive lower bound on `created_at`.
  pub created_from: Option<DateTime<Utc>>,
  /// Inclusive upper bound on `created_at`.
  pub created_to:   Option<DateTime<Utc>>,
}

impl ActivityFilter {
  pub fn for_item(item_id: Uuid) -> Self {
    Self { item_id: Some(item_id), ..Default::default() }
  }
}

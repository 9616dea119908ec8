//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings (nanosecond
//! precision, `Z` suffix) so that text ordering matches time ordering.
//! Prices are stored as decimal text to keep them exact. UUIDs are stored as
//! hyphenated lowercase strings.

use std::str::FromStr as _;

use chrono::{DateTime, SecondsFormat, Utc};
use depot_core::{
  activity::{ActivityAction, ActivityLog},
  item::{Creator, Item},
  user::{Role, User},
};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_price(price: Decimal) -> String { price.to_string() }

pub fn decode_price(s: &str) -> Result<Decimal> { Ok(Decimal::from_str(s)?) }

pub fn encode_role(role: Role) -> &'static str { role.into() }

pub fn decode_role(s: &str) -> Result<Role> {
  Role::from_str(s).map_err(|_| Error::UnknownValue {
    column: "role",
    value:  s.to_owned(),
  })
}

pub fn encode_action(action: ActivityAction) -> &'static str { action.into() }

pub fn decode_action(s: &str) -> Result<ActivityAction> {
  ActivityAction::from_str(s).map_err(|_| Error::UnknownValue {
    column: "action",
    value:  s.to_owned(),
  })
}

// ─── Users ───────────────────────────────────────────────────────────────────

pub const USER_COLUMNS: &str =
  "user_id, name, email, password_hash, role, created_at, updated_at";

/// Raw values read directly from a `users` row.
pub struct RawUser {
  pub user_id:       String,
  pub name:          String,
  pub email:         String,
  pub password_hash: String,
  pub role:          String,
  pub created_at:    String,
  pub updated_at:    String,
}

impl RawUser {
  /// Read a row selected with [`USER_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:       row.get(0)?,
      name:          row.get(1)?,
      email:         row.get(2)?,
      password_hash: row.get(3)?,
      role:          row.get(4)?,
      created_at:    row.get(5)?,
      updated_at:    row.get(6)?,
    })
  }

  pub fn into_user(self) -> Result<User> {
    Ok(User {
      id:            decode_uuid(&self.user_id)?,
      name:          self.name,
      email:         self.email,
      password_hash: self.password_hash,
      role:          decode_role(&self.role)?,
      created_at:    decode_dt(&self.created_at)?,
      updated_at:    decode_dt(&self.updated_at)?,
    })
  }
}

// ─── Items ───────────────────────────────────────────────────────────────────

/// Item columns joined with the creator's name. Use with [`ITEM_FROM`].
pub const ITEM_COLUMNS: &str = "i.item_id, i.name, i.description, i.category, \
   i.stock, i.min_stock, i.max_stock, i.price, i.sku, i.location, \
   i.created_by, u.name, i.created_at, i.updated_at";

pub const ITEM_FROM: &str = "items i LEFT JOIN users u ON u.user_id = i.created_by";

/// Raw values read directly from an `items` row joined with `users`.
pub struct RawItem {
  pub item_id:      String,
  pub name:         String,
  pub description:  String,
  pub category:     String,
  pub stock:        u32,
  pub min_stock:    u32,
  pub max_stock:    u32,
  pub price:        String,
  pub sku:          String,
  pub location:     String,
  pub created_by:   String,
  pub creator_name: Option<String>,
  pub created_at:   String,
  pub updated_at:   String,
}

impl RawItem {
  /// Read a row selected with [`ITEM_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      item_id:      row.get(0)?,
      name:         row.get(1)?,
      description:  row.get(2)?,
      category:     row.get(3)?,
      stock:        row.get(4)?,
      min_stock:    row.get(5)?,
      max_stock:    row.get(6)?,
      price:        row.get(7)?,
      sku:          row.get(8)?,
      location:     row.get(9)?,
      created_by:   row.get(10)?,
      creator_name: row.get(11)?,
      created_at:   row.get(12)?,
      updated_at:   row.get(13)?,
    })
  }

  pub fn into_item(self) -> Result<Item> {
    let created_by = decode_uuid(&self.created_by)?;
    Ok(Item {
      id: decode_uuid(&self.item_id)?,
      name: self.name,
      description: self.description,
      category: self.category,
      stock: self.stock,
      min_stock: self.min_stock,
      max_stock: self.max_stock,
      price: decode_price(&self.price)?,
      sku: self.sku,
      location: self.location,
      created_by,
      creator: self.creator_name.map(|name| Creator { id: created_by, name }),
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

// ─── Activity ────────────────────────────────────────────────────────────────

pub const ACTIVITY_COLUMNS: &str = "activity_id, user_id, user_name, item_id, \
   item_name, action, quantity, old_stock, new_stock, description, created_at";

/// Raw values read directly from an `activity_logs` row.
pub struct RawActivity {
  pub activity_id: String,
  pub user_id:     String,
  pub user_name:   String,
  pub item_id:     String,
  pub item_name:   String,
  pub action:      String,
  pub quantity:    u32,
  pub old_stock:   u32,
  pub new_stock:   u32,
  pub description: String,
  pub created_at:  String,
}

impl RawActivity {
  /// Read a row selected with [`ACTIVITY_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      activity_id: row.get(0)?,
      user_id:     row.get(1)?,
      user_name:   row.get(2)?,
      item_id:     row.get(3)?,
      item_name:   row.get(4)?,
      action:      row.get(5)?,
      quantity:    row.get(6)?,
      old_stock:   row.get(7)?,
      new_stock:   row.get(8)?,
      description: row.get(9)?,
      created_at:  row.get(10)?,
    })
  }

  pub fn into_activity(self) -> Result<ActivityLog> {
    Ok(ActivityLog {
      id:          decode_uuid(&self.activity_id)?,
      user_id:     decode_uuid(&self.user_id)?,
      user_name:   self.user_name,
      item_id:     decode_uuid(&self.item_id)?,
      item_name:   self.item_name,
      action:      decode_action(&self.action)?,
      quantity:    self.quantity,
      old_stock:   self.old_stock,
      new_stock:   self.new_stock,
      description: self.description,
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}

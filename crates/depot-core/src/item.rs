//! Inventory items and the pure rules that govern their mutation.
//!
//! Nothing in here touches storage. Backends call these helpers from inside
//! their write transaction so the rule is evaluated against the row they
//! actually hold.

use chrono::{DateTime, Utc};
use rand_core::{OsRng, RngCore as _};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, activity::ActivityLog};

/// Applied when a create request omits `min_stock`.
pub const DEFAULT_MIN_STOCK: u32 = 10;
/// Applied when a create request omits `max_stock`.
pub const DEFAULT_MAX_STOCK: u32 = 100;

// ─── Item ────────────────────────────────────────────────────────────────────

/// The `{id, name}` projection of the user who created an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Creator {
  pub id:   Uuid,
  pub name: String,
}

/// A stocked inventory item. `stock` is unsigned, so the non-negative
/// invariant is also carried by the type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
  pub id:          Uuid,
  pub name:        String,
  pub description: String,
  pub category:    String,
  pub stock:       u32,
  pub min_stock:   u32,
  pub max_stock:   u32,
  pub price:       Decimal,
  pub sku:         String,
  pub location:    String,
  pub created_by:  Uuid,
  /// Populated on reads; `None` only if the creator row is missing.
  pub creator:     Option<Creator>,
  pub created_at:  DateTime<Utc>,
  pub updated_at:  DateTime<Utc>,
}

// ─── NewItem ─────────────────────────────────────────────────────────────────

/// Input to [`crate::ledger::Ledger::create_item`].
#[derive(Debug, Clone)]
pub struct NewItem {
  pub name:        String,
  pub description: String,
  pub category:    String,
  pub stock:       u32,
  pub min_stock:   u32,
  pub max_stock:   u32,
  pub price:       Decimal,
  /// Generated by [`generate_sku`] when `None` or blank.
  pub sku:         Option<String>,
  pub location:    String,
}

impl NewItem {
  /// Convenience constructor with every optional field at its default.
  pub fn new(name: impl Into<String>, stock: u32) -> Self {
    Self {
      name: name.into(),
      description: String::new(),
      category: String::new(),
      stock,
      min_stock: DEFAULT_MIN_STOCK,
      max_stock: DEFAULT_MAX_STOCK,
      price: Decimal::ZERO,
      sku: None,
      location: String::new(),
    }
  }

  pub fn validate(&self) -> Result<()> {
    if self.name.trim().is_empty() {
      return Err(Error::invalid("item name is required"));
    }
    if self.price < Decimal::ZERO {
      return Err(Error::invalid("price must not be negative"));
    }
    Ok(())
  }

  /// Build the item row, assigning its id, timestamps and (if needed) SKU.
  pub fn into_item(self, created_by: Uuid, now: DateTime<Utc>) -> Item {
    let sku = match self.sku {
      Some(sku) if !sku.trim().is_empty() => sku.trim().to_owned(),
      _ => generate_sku(now),
    };
    Item {
      id: Uuid::new_v4(),
      name: self.name.trim().to_owned(),
      description: self.description,
      category: self.category,
      stock: self.stock,
      min_stock: self.min_stock,
      max_stock: self.max_stock,
      price: self.price,
      sku,
      location: self.location,
      created_by,
      creator: None,
      created_at: now,
      updated_at: now,
    }
  }
}

/// `ITM-<epoch seconds>-<8 hex chars>`; the random suffix keeps SKUs generated
/// in the same second apart.
pub fn generate_sku(now: DateTime<Utc>) -> String {
  let mut suffix = [0u8; 4];
  OsRng.fill_bytes(&mut suffix);
  format!("ITM-{}-{}", now.timestamp(), hex::encode(suffix))
}

// ─── ItemPatch ───────────────────────────────────────────────────────────────

/// A partial update. A field that is `Some` replaces the stored value, even
/// when it is empty or zero; `None` leaves it untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemPatch {
  pub name:        Option<String>,
  pub description: Option<String>,
  pub category:    Option<String>,
  pub min_stock:   Option<u32>,
  pub max_stock:   Option<u32>,
  pub price:       Option<Decimal>,
  pub location:    Option<String>,
}

impl ItemPatch {
  pub fn validate(&self) -> Result<()> {
    if let Some(name) = &self.name
      && name.trim().is_empty()
    {
      return Err(Error::invalid("item name cannot be empty"));
    }
    if let Some(price) = self.price
      && price < Decimal::ZERO
    {
      return Err(Error::invalid("price must not be negative"));
    }
    Ok(())
  }

  /// Overwrite every present field on `item` and bump `updated_at`.
  pub fn apply(self, item: &mut Item, now: DateTime<Utc>) {
    if let Some(name) = self.name {
      item.name = name.trim().to_owned();
    }
    if let Some(description) = self.description {
      item.description = description;
    }
    if let Some(category) = self.category {
      item.category = category;
    }
    if let Some(min_stock) = self.min_stock {
      item.min_stock = min_stock;
    }
    if let Some(max_stock) = self.max_stock {
      item.max_stock = max_stock;
    }
    if let Some(price) = self.price {
      item.price = price;
    }
    if let Some(location) = self.location {
      item.location = location;
    }
    item.updated_at = now;
  }
}

/// Outcome of an update: the row before and after the patch, both as seen
/// inside the writing transaction, plus its audit row.
#[derive(Debug, Clone)]
pub struct ItemUpdate {
  pub before: Item,
  pub item:   Item,
  pub log:    ActivityLog,
}

// ─── Stock ───────────────────────────────────────────────────────────────────

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
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum StockDirection {
  Increment,
  Decrement,
}

impl StockDirection {
  pub fn parse(raw: &str) -> Result<Self> {
    raw.parse().map_err(|_| {
      Error::invalid(format!(
        "stock change type must be 'increment' or 'decrement', got {raw:?}"
      ))
    })
  }

  /// Compute the stock level after moving `quantity` units from `current`.
  /// A decrement below zero is [`Error::InsufficientStock`].
  pub fn apply(self, item_id: Uuid, current: u32, quantity: u32) -> Result<u32> {
    match self {
      Self::Increment => current
        .checked_add(quantity)
        .ok_or_else(|| Error::invalid("stock level would overflow")),
      Self::Decrement => {
        current
          .checked_sub(quantity)
          .ok_or(Error::InsufficientStock {
            item_id,
            available: current,
            requested: quantity,
          })
      }
    }
  }
}

/// A validated stock movement, ready for a backend to apply atomically.
#[derive(Debug, Clone)]
pub struct StockChange {
  pub direction: StockDirection,
  /// Always greater than zero.
  pub quantity:  u32,
  pub reason:    String,
}

impl StockChange {
  /// Validate raw caller input. `quantity` arrives signed so that zero and
  /// negative values are rejected here rather than wrapping.
  pub fn new(quantity: i64, direction: &str, reason: Option<String>) -> Result<Self> {
    if quantity <= 0 {
      return Err(Error::invalid("quantity must be greater than 0"));
    }
    let quantity = u32::try_from(quantity)
      .map_err(|_| Error::invalid("quantity is out of range"))?;
    Ok(Self {
      direction: StockDirection::parse(direction)?,
      quantity,
      reason: reason.unwrap_or_default(),
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn sample_item() -> Item {
    NewItem::new("Widget", 10).into_item(Uuid::new_v4(), Utc::now())
  }

  #[test]
  fn decrement_below_zero_is_insufficient() {
    let id = Uuid::new_v4();
    let err = StockDirection::Decrement.apply(id, 10, 15).unwrap_err();
    assert!(matches!(
      err,
      Error::InsufficientStock { item_id, available: 10, requested: 15 } if item_id == id
    ));
  }

  #[test]
  fn decrement_to_exactly_zero_is_allowed() {
    let left = StockDirection::Decrement.apply(Uuid::nil(), 7, 7).unwrap();
    assert_eq!(left, 0);
  }

  #[test]
  fn increment_overflow_is_rejected() {
    let err = StockDirection::Increment
      .apply(Uuid::nil(), u32::MAX, 1)
      .unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));
  }

  #[test]
  fn stock_change_rejects_non_positive_quantity() {
    assert!(StockChange::new(0, "increment", None).is_err());
    assert!(StockChange::new(-3, "decrement", None).is_err());
    assert!(StockChange::new(i64::from(u32::MAX) + 1, "increment", None).is_err());
  }

  #[test]
  fn stock_change_rejects_unknown_direction() {
    let err = StockChange::new(1, "sideways", None).unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));
  }

  #[test]
  fn stock_change_accepts_valid_input() {
    let change = StockChange::new(4, "decrement", Some("sold".into())).unwrap();
    assert_eq!(change.direction, StockDirection::Decrement);
    assert_eq!(change.quantity, 4);
    assert_eq!(change.reason, "sold");
  }

  #[test]
  fn generated_sku_has_expected_shape() {
    let now = Utc::now();
    let sku = generate_sku(now);
    let parts: Vec<&str> = sku.split('-').collect();
    assert_eq!(parts.len(), 3, "sku: {sku}");
    assert_eq!(parts[0], "ITM");
    assert_eq!(parts[1], now.timestamp().to_string());
    assert_eq!(parts[2].len(), 8);
    assert!(parts[2].chars().all(|c| c.is_ascii_hexdigit()));
  }

  #[test]
  fn supplied_sku_is_kept_and_blank_sku_is_generated() {
    let mut input = NewItem::new("Widget", 1);
    input.sku = Some("WID-001".into());
    assert_eq!(input.into_item(Uuid::nil(), Utc::now()).sku, "WID-001");

    let mut input = NewItem::new("Widget", 1);
    input.sku = Some("   ".into());
    assert!(input.into_item(Uuid::nil(), Utc::now()).sku.starts_with("ITM-"));
  }

  #[test]
  fn new_item_requires_a_name() {
    assert!(NewItem::new("  ", 1).validate().is_err());
    let mut input = NewItem::new("Widget", 1);
    input.price = Decimal::new(-1, 2);
    assert!(input.validate().is_err());
  }

  #[test]
  fn patch_replaces_only_present_fields() {
    let mut item = sample_item();
    item.description = "old".into();
    item.category = "tools".into();

    let patch = ItemPatch {
      description: Some(String::new()),
      min_stock: Some(0),
      price: Some(Decimal::new(1999, 2)),
      ..Default::default()
    };
    patch.validate().unwrap();
    patch.apply(&mut item, Utc::now());

    assert_eq!(item.name, "Widget");
    assert_eq!(item.description, "");
    assert_eq!(item.category, "tools");
    assert_eq!(item.min_stock, 0);
    assert_eq!(item.max_stock, DEFAULT_MAX_STOCK);
    assert_eq!(item.price, Decimal::new(1999, 2));
  }

  #[test]
  fn patch_rejects_blank_name() {
    let patch = ItemPatch { name: Some(" ".into()), ..Default::default() };
    assert!(matches!(patch.validate(), Err(Error::InvalidArgument(_))));
  }
}

//! Handlers for `/items` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/items` | Newest first |
//! | `POST`   | `/items` | 201 with the created item |
//! | `GET`    | `/items/{id}` | 404 if not found |
//! | `PUT`    | `/items/{id}` | Partial update; returns `changes` |
//! | `PATCH`  | `/items/{id}/stock` | Body: `{"quantity":5,"type":"decrement","reason":"..."}` |
//! | `DELETE` | `/items/{id}` | Returns the deleted item's id and name |

use axum::{
  Json,
  extract::{
    Path, State,
    rejection::{JsonRejection, PathRejection},
  },
  http::StatusCode,
  response::Response,
};
use depot_core::{
  Error,
  item::{DEFAULT_MAX_STOCK, DEFAULT_MIN_STOCK, Item, ItemPatch, NewItem},
  store::InventoryStore,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use uuid::Uuid;

use crate::{AppState, auth::Authenticated, envelope, error::ApiError};

/// Convert a signed request number into a stock figure.
fn stock_field(field: &str, value: Option<i64>, default: u32) -> Result<u32, Error> {
  match value {
    None => Ok(default),
    Some(v) => u32::try_from(v)
      .map_err(|_| Error::invalid(format!("{field} must be a non-negative integer"))),
  }
}

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /items`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  Authenticated(_): Authenticated,
) -> Result<Response, ApiError>
where
  S: InventoryStore + 'static,
{
  let items = state.ledger.list_items().await?;
  Ok(envelope::success(
    StatusCode::OK,
    "Items retrieved successfully",
    json!({ "count": items.len(), "items": items }),
  ))
}

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  #[serde(default)]
  pub name:        String,
  #[serde(default)]
  pub description: String,
  #[serde(default)]
  pub category:    String,
  pub stock:       Option<i64>,
  pub min_stock:   Option<i64>,
  pub max_stock:   Option<i64>,
  pub price:       Option<Decimal>,
  pub sku:         Option<String>,
  #[serde(default)]
  pub location:    String,
}

impl CreateBody {
  fn into_new_item(self) -> Result<NewItem, Error> {
    Ok(NewItem {
      name:        self.name,
      description: self.description,
      category:    self.category,
      stock:       stock_field("stock", self.stock, 0)?,
      min_stock:   stock_field("min_stock", self.min_stock, DEFAULT_MIN_STOCK)?,
      max_stock:   stock_field("max_stock", self.max_stock, DEFAULT_MAX_STOCK)?,
      price:       self.price.unwrap_or(Decimal::ZERO),
      sku:         self.sku,
      location:    self.location,
    })
  }
}

/// `POST /items`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  Authenticated(caller): Authenticated,
  body: Result<Json<CreateBody>, JsonRejection>,
) -> Result<Response, ApiError>
where
  S: InventoryStore + 'static,
{
  let Json(body) = body?;
  let (item, _) = state
    .ledger
    .create_item(body.into_new_item()?, caller.user_id)
    .await?;
  Ok(envelope::success(
    StatusCode::CREATED,
    "Item created successfully",
    json!({ "item": item }),
  ))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /items/{id}`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  Authenticated(_): Authenticated,
  id: Result<Path<Uuid>, PathRejection>,
) -> Result<Response, ApiError>
where
  S: InventoryStore + 'static,
{
  let Path(id) = id?;
  let item = state.ledger.get_item(id).await?;
  Ok(envelope::success(
    StatusCode::OK,
    "Item retrieved successfully",
    json!({ "item": item }),
  ))
}

// ─── Update ───────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct Change<T> {
  from: T,
  to:   T,
}

fn record<T: PartialEq + Serialize>(out: &mut Map<String, Value>, field: &str, from: T, to: T) {
  if from != to {
    out.insert(field.to_owned(), json!(Change { from, to }));
  }
}

/// Field-level diff of the descriptive fields a caller is most likely to edit.
fn changes(before: &Item, after: &Item) -> Map<String, Value> {
  let mut out = Map::new();
  record(&mut out, "name", &before.name, &after.name);
  record(&mut out, "description", &before.description, &after.description);
  record(&mut out, "category", &before.category, &after.category);
  record(&mut out, "price", before.price, after.price);
  out
}

/// `PUT /items/{id}`
pub async fn update<S>(
  State(state): State<AppState<S>>,
  Authenticated(caller): Authenticated,
  id: Result<Path<Uuid>, PathRejection>,
  body: Result<Json<ItemPatch>, JsonRejection>,
) -> Result<Response, ApiError>
where
  S: InventoryStore + 'static,
{
  let Path(id) = id?;
  let Json(patch) = body?;
  let update = state.ledger.update_item(id, patch, caller.user_id).await?;
  let changes = changes(&update.before, &update.item);
  Ok(envelope::success(
    StatusCode::OK,
    "Item updated successfully",
    json!({ "item": update.item, "changes": changes }),
  ))
}

// ─── Stock ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct StockBody {
  #[serde(default)]
  pub quantity:  i64,
  #[serde(rename = "type", default)]
  pub direction: String,
  pub reason:    Option<String>,
}

/// `PATCH /items/{id}/stock`
pub async fn update_stock<S>(
  State(state): State<AppState<S>>,
  Authenticated(caller): Authenticated,
  id: Result<Path<Uuid>, PathRejection>,
  body: Result<Json<StockBody>, JsonRejection>,
) -> Result<Response, ApiError>
where
  S: InventoryStore + 'static,
{
  let Path(id) = id?;
  let Json(body) = body?;
  let (item, activity) = state
    .ledger
    .update_stock(id, body.quantity, &body.direction, body.reason, caller.user_id)
    .await?;
  Ok(envelope::success(
    StatusCode::OK,
    "Stock updated successfully",
    json!({ "item": item, "activity": activity }),
  ))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /items/{id}`
pub async fn delete<S>(
  State(state): State<AppState<S>>,
  Authenticated(caller): Authenticated,
  id: Result<Path<Uuid>, PathRejection>,
) -> Result<Response, ApiError>
where
  S: InventoryStore + 'static,
{
  let Path(id) = id?;
  let (item, _) = state.ledger.delete_item(id, caller.user_id).await?;
  Ok(envelope::success(
    StatusCode::OK,
    "Item deleted successfully",
    json!({ "deleted_item": { "id": item.id, "name": item.name } }),
  ))
}

#[cfg(test)]
mod tests {
  use chrono::Utc;

  use super::*;

  #[test]
  fn diff_lists_only_changed_fields() {
    let before = NewItem::new("Widget", 1).into_item(Uuid::new_v4(), Utc::now());
    let mut after = before.clone();
    after.name = "Gadget".into();
    after.price = Decimal::new(250, 2);
    after.location = "B-2".into();

    let diff = changes(&before, &after);
    assert_eq!(diff.len(), 2);
    assert_eq!(diff["name"], json!({ "from": "Widget", "to": "Gadget" }));
    assert_eq!(diff["price"]["to"], json!("2.50"));
  }

  #[test]
  fn negative_stock_is_invalid() {
    let body: CreateBody = serde_json::from_value(json!({ "name": "Widget", "stock": -1 })).unwrap();
    assert!(matches!(body.into_new_item(), Err(Error::InvalidArgument(_))));
  }

  #[test]
  fn omitted_thresholds_take_defaults() {
    let body: CreateBody = serde_json::from_value(json!({ "name": "Widget" })).unwrap();
    let input = body.into_new_item().unwrap();
    assert_eq!((input.stock, input.min_stock, input.max_stock), (0, 10, 100));
  }
}

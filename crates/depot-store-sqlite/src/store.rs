//! [`SqliteStore`], the SQLite implementation of [`InventoryStore`].

use std::{path::Path, time::Duration};

use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension as _, TransactionBehavior};
use uuid::Uuid;

use depot_core::{
  activity::{ActivityFilter, ActivityLog, Actor},
  item::{Creator, Item, ItemPatch, ItemUpdate, NewItem, StockChange},
  page::{Page, PageRequest},
  store::{Deadline, InventoryStore},
  user::{NewUser, User},
};

use crate::{
  Error, Result,
  encode::{
    ACTIVITY_COLUMNS, ITEM_COLUMNS, ITEM_FROM, RawActivity, RawItem, RawUser, USER_COLUMNS,
    encode_action, encode_dt, encode_price, encode_role, encode_uuid,
  },
  error::{is_busy, is_unique_violation},
  schema::SCHEMA,
};

/// Shared `WHERE` clause for activity listings. Parameters 1 to 5 are the
/// action, item id, user id and the inclusive time bounds; `NULL` disables a
/// condition.
const ACTIVITY_FILTER: &str = "(?1 IS NULL OR action = ?1)
   AND (?2 IS NULL OR item_id = ?2)
   AND (?3 IS NULL OR user_id = ?3)
   AND (?4 IS NULL OR created_at >= ?4)
   AND (?5 IS NULL OR created_at <= ?5)";

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Depot inventory store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted. All calls are
/// executed in order on the connection's own thread.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, mostly for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── Transaction bodies ──────────────────────────────────────────────────────
//
// These run on the connection thread. Each mutation opens a `BEGIN IMMEDIATE`
// transaction, so the row it reads cannot change before it commits. Returning
// early with an error drops the transaction, which rolls it back.

/// Matches `PRAGMA busy_timeout` in the schema.
const BUSY_TIMEOUT: Duration = Duration::from_millis(5000);

/// Run `body` in a `BEGIN IMMEDIATE` transaction and commit it only while
/// `deadline` still holds. Waiting for the write lock counts against it.
fn write_tx<T>(
  conn: &mut rusqlite::Connection,
  deadline: Deadline,
  body: impl FnOnce(&rusqlite::Transaction<'_>) -> Result<T>,
) -> Result<T> {
  conn.busy_timeout(deadline.remaining()?)?;
  let outcome = match conn.transaction_with_behavior(TransactionBehavior::Immediate) {
    Ok(tx) => commit_within(tx, deadline, body),
    Err(e) if is_busy(&e) => Err(deadline.expired().into()),
    Err(e) => Err(e.into()),
  };
  // The outcome is settled; a failure here must not mask it.
  conn.busy_timeout(BUSY_TIMEOUT).ok();
  outcome
}

fn commit_within<T>(
  tx: rusqlite::Transaction<'_>,
  deadline: Deadline,
  body: impl FnOnce(&rusqlite::Transaction<'_>) -> Result<T>,
) -> Result<T> {
  let value = body(&tx)?;
  deadline.check()?;
  tx.commit()?;
  Ok(value)
}

fn load_item(conn: &rusqlite::Connection, id: Uuid) -> Result<Item> {
  conn
    .query_row(
      &format!("SELECT {ITEM_COLUMNS} FROM {ITEM_FROM} WHERE i.item_id = ?1"),
      [encode_uuid(id)],
      RawItem::from_row,
    )
    .optional()?
    .ok_or(Error::ItemNotFound(id))?
    .into_item()
}

fn insert_activity(conn: &rusqlite::Connection, log: &ActivityLog) -> Result<()> {
  conn.execute(
    &format!(
      "INSERT INTO activity_logs ({ACTIVITY_COLUMNS})
       VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"
    ),
    rusqlite::params![
      encode_uuid(log.id),
      encode_uuid(log.user_id),
      log.user_name,
      encode_uuid(log.item_id),
      log.item_name,
      encode_action(log.action),
      log.quantity,
      log.old_stock,
      log.new_stock,
      log.description,
      encode_dt(log.created_at),
    ],
  )?;
  Ok(())
}

fn create_item_tx(
  tx: &rusqlite::Transaction<'_>,
  actor: Actor,
  input: NewItem,
  now: DateTime<Utc>,
) -> Result<(Item, ActivityLog)> {
  let mut item = input.into_item(actor.user_id, now);

  tx.execute(
    "INSERT INTO items (
       item_id, name, description, category, stock, min_stock, max_stock,
       price, sku, location, created_by, created_at, updated_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
    rusqlite::params![
      encode_uuid(item.id),
      item.name,
      item.description,
      item.category,
      item.stock,
      item.min_stock,
      item.max_stock,
      encode_price(item.price),
      item.sku,
      item.location,
      encode_uuid(item.created_by),
      encode_dt(item.created_at),
      encode_dt(item.updated_at),
    ],
  )
  .map_err(|e| {
    if is_unique_violation(&e) {
      Error::DuplicateSku(item.sku.clone())
    } else {
      e.into()
    }
  })?;

  item.creator = Some(Creator {
    id:   actor.user_id,
    name: actor.name.clone(),
  });
  let log = ActivityLog::item_created(&actor, &item, now);
  insert_activity(tx, &log)?;
  Ok((item, log))
}

fn update_item_tx(
  tx: &rusqlite::Transaction<'_>,
  id: Uuid,
  actor: Actor,
  patch: ItemPatch,
  now: DateTime<Utc>,
) -> Result<ItemUpdate> {
  let before = load_item(tx, id)?;
  let mut item = before.clone();
  patch.apply(&mut item, now);

  tx.execute(
    "UPDATE items
        SET name = ?2, description = ?3, category = ?4, min_stock = ?5,
            max_stock = ?6, price = ?7, location = ?8, updated_at = ?9
      WHERE item_id = ?1",
    rusqlite::params![
      encode_uuid(id),
      item.name,
      item.description,
      item.category,
      item.min_stock,
      item.max_stock,
      encode_price(item.price),
      item.location,
      encode_dt(item.updated_at),
    ],
  )?;

  let log = ActivityLog::item_updated(&actor, &item, now);
  insert_activity(tx, &log)?;
  Ok(ItemUpdate { before, item, log })
}

fn adjust_stock_tx(
  tx: &rusqlite::Transaction<'_>,
  id: Uuid,
  actor: Actor,
  change: StockChange,
  now: DateTime<Utc>,
) -> Result<(Item, ActivityLog)> {
  let mut item = load_item(tx, id)?;
  let old_stock = item.stock;

  // Rejection here drops the transaction: no item write, no audit row.
  item.stock = change.direction.apply(id, old_stock, change.quantity)?;
  item.updated_at = now;

  tx.execute(
    "UPDATE items SET stock = ?2, updated_at = ?3 WHERE item_id = ?1",
    rusqlite::params![encode_uuid(id), item.stock, encode_dt(now)],
  )?;

  let log = ActivityLog::stock_changed(&actor, &item, &change, old_stock, now);
  insert_activity(tx, &log)?;
  Ok((item, log))
}

fn delete_item_tx(
  tx: &rusqlite::Transaction<'_>,
  id: Uuid,
  actor: Actor,
  now: DateTime<Utc>,
) -> Result<(Item, ActivityLog)> {
  let item = load_item(tx, id)?;

  tx.execute("DELETE FROM items WHERE item_id = ?1", [encode_uuid(id)])?;

  let log = ActivityLog::item_deleted(&actor, &item, now);
  insert_activity(tx, &log)?;
  Ok((item, log))
}

// ─── InventoryStore impl ─────────────────────────────────────────────────────

impl InventoryStore for SqliteStore {
  type Error = Error;

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn insert_user(&self, input: NewUser) -> Result<User> {
    let now = Utc::now();
    let user = User {
      id:            Uuid::new_v4(),
      name:          input.name,
      email:         input.email,
      password_hash: input.password_hash,
      role:          input.role,
      created_at:    now,
      updated_at:    now,
    };

    let id_str    = encode_uuid(user.id);
    let name      = user.name.clone();
    let email     = user.email.clone();
    let hash      = user.password_hash.clone();
    let role_str  = encode_role(user.role);
    let at_str    = encode_dt(now);

    let inserted = self
      .conn
      .call(move |conn| {
        let outcome = conn.execute(
          &format!("INSERT INTO users ({USER_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)"),
          rusqlite::params![id_str, name, email, hash, role_str, at_str],
        );
        Ok(outcome)
      })
      .await?;

    match inserted {
      Ok(_) => Ok(user),
      Err(e) if is_unique_violation(&e) => Err(Error::DuplicateEmail(user.email)),
      Err(e) => Err(e.into()),
    }
  }

  async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
    let id_str = encode_uuid(id);
    let raw = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = ?1"),
              [id_str],
              RawUser::from_row,
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawUser::into_user).transpose()
  }

  async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
    let email = email.to_owned();
    let raw = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
              [email],
              RawUser::from_row,
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawUser::into_user).transpose()
  }

  // ── Items: ledger writes ──────────────────────────────────────────────────

  async fn create_item(
    &self,
    actor: Actor,
    input: NewItem,
    deadline: Deadline,
  ) -> Result<(Item, ActivityLog)> {
    let now = Utc::now();
    self
      .conn
      .call(move |conn| {
        Ok(write_tx(conn, deadline, |tx| create_item_tx(tx, actor, input, now)))
      })
      .await?
  }

  async fn update_item(
    &self,
    id: Uuid,
    actor: Actor,
    patch: ItemPatch,
    deadline: Deadline,
  ) -> Result<ItemUpdate> {
    let now = Utc::now();
    self
      .conn
      .call(move |conn| {
        Ok(write_tx(conn, deadline, |tx| update_item_tx(tx, id, actor, patch, now)))
      })
      .await?
  }

  async fn adjust_stock(
    &self,
    id: Uuid,
    actor: Actor,
    change: StockChange,
    deadline: Deadline,
  ) -> Result<(Item, ActivityLog)> {
    let now = Utc::now();
    self
      .conn
      .call(move |conn| {
        Ok(write_tx(conn, deadline, |tx| adjust_stock_tx(tx, id, actor, change, now)))
      })
      .await?
  }

  async fn delete_item(
    &self,
    id: Uuid,
    actor: Actor,
    deadline: Deadline,
  ) -> Result<(Item, ActivityLog)> {
    let now = Utc::now();
    self
      .conn
      .call(move |conn| Ok(write_tx(conn, deadline, |tx| delete_item_tx(tx, id, actor, now))))
      .await?
  }

  // ── Items: reads ──────────────────────────────────────────────────────────

  async fn get_item(&self, id: Uuid) -> Result<Option<Item>> {
    let id_str = encode_uuid(id);
    let raw = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {ITEM_COLUMNS} FROM {ITEM_FROM} WHERE i.item_id = ?1"),
              [id_str],
              RawItem::from_row,
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawItem::into_item).transpose()
  }

  async fn list_items(&self) -> Result<Vec<Item>> {
    let raws = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {ITEM_COLUMNS} FROM {ITEM_FROM}
           ORDER BY i.created_at DESC, i.rowid DESC"
        ))?;
        let rows = stmt
          .query_map([], RawItem::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawItem::into_item).collect()
  }

  // ── Activity ──────────────────────────────────────────────────────────────

  async fn list_activities(
    &self,
    filter: &ActivityFilter,
    page: PageRequest,
  ) -> Result<Page<ActivityLog>> {
    let action  = filter.action.map(encode_action);
    let item_id = filter.item_id.map(encode_uuid);
    let user_id = filter.user_id.map(encode_uuid);
    let from    = filter.created_from.map(encode_dt);
    let to      = filter.created_to.map(encode_dt);
    let limit   = page.limit();
    let offset  = i64::try_from(page.offset()).unwrap_or(i64::MAX);

    let (total, raws) = self
      .conn
      .call(move |conn| {
        // One read transaction so the count and the page agree.
        let tx = conn.transaction()?;
        let total: i64 = tx.query_row(
          &format!("SELECT COUNT(*) FROM activity_logs WHERE {ACTIVITY_FILTER}"),
          rusqlite::params![action, item_id, user_id, from, to],
          |r| r.get(0),
        )?;
        let raws = {
          let mut stmt = tx.prepare(&format!(
            "SELECT {ACTIVITY_COLUMNS} FROM activity_logs
             WHERE {ACTIVITY_FILTER}
             ORDER BY created_at DESC, rowid DESC
             LIMIT ?6 OFFSET ?7"
          ))?;
          stmt
            .query_map(
              rusqlite::params![action, item_id, user_id, from, to, limit, offset],
              RawActivity::from_row,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };
        tx.commit()?;
        Ok((total, raws))
      })
      .await?;

    Ok(Page {
      items:   raws
        .into_iter()
        .map(RawActivity::into_activity)
        .collect::<Result<_>>()?,
      total:   u64::try_from(total).unwrap_or_default(),
      request: page,
    })
  }

  async fn recent_activities(&self, limit: u32) -> Result<Vec<ActivityLog>> {
    let raws = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {ACTIVITY_COLUMNS} FROM activity_logs
           ORDER BY created_at DESC, rowid DESC
           LIMIT ?1"
        ))?;
        let rows = stmt
          .query_map([limit], RawActivity::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawActivity::into_activity).collect()
  }
}

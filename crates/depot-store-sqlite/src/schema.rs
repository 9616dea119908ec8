//! SQL schema for the Depot SQLite store.
//!
//! Executed once at connection startup. `PRAGMA user_version` records the
//! layout so later migrations can be gated on it.

/// Full schema DDL; idempotent thanks to `CREATE ... IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;
PRAGMA busy_timeout = 5000;

CREATE TABLE IF NOT EXISTS users (
    user_id       TEXT PRIMARY KEY,
    name          TEXT NOT NULL,
    email         TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    role          TEXT NOT NULL DEFAULT 'user',   -- 'admin' | 'user'
    created_at    TEXT NOT NULL,
    updated_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS items (
    item_id     TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    category    TEXT NOT NULL DEFAULT '',
    stock       INTEGER NOT NULL DEFAULT 0   CHECK (stock >= 0),
    min_stock   INTEGER NOT NULL DEFAULT 10  CHECK (min_stock >= 0),
    max_stock   INTEGER NOT NULL DEFAULT 100 CHECK (max_stock >= 0),
    price       TEXT NOT NULL DEFAULT '0',    -- exact decimal, as text
    sku         TEXT NOT NULL UNIQUE,
    location    TEXT NOT NULL DEFAULT '',
    created_by  TEXT NOT NULL REFERENCES users(user_id),
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_items_created_at ON items(created_at);

-- Audit rows are append-only and outlive the items they describe,
-- so item_id and user_id are plain columns without foreign keys.
CREATE TABLE IF NOT EXISTS activity_logs (
    activity_id TEXT PRIMARY KEY,
    user_id     TEXT NOT NULL,
    user_name   TEXT NOT NULL,
    item_id     TEXT NOT NULL,
    item_name   TEXT NOT NULL,
    action      TEXT NOT NULL,
    quantity    INTEGER NOT NULL DEFAULT 0,
    old_stock   INTEGER NOT NULL DEFAULT 0,
    new_stock   INTEGER NOT NULL DEFAULT 0,
    description TEXT NOT NULL DEFAULT '',
    created_at  TEXT NOT NULL             -- fixed-width RFC 3339, sorts as text
);

CREATE INDEX IF NOT EXISTS idx_activity_item    ON activity_logs(item_id);
CREATE INDEX IF NOT EXISTS idx_activity_user    ON activity_logs(user_id);
CREATE INDEX IF NOT EXISTS idx_activity_action  ON activity_logs(action);
CREATE INDEX IF NOT EXISTS idx_activity_created ON activity_logs(created_at);

PRAGMA user_version = 1;
";

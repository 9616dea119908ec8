//! Users and the identity resolved from a bearer token.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Access role carried in tokens. The core only requires *some* valid identity
/// for mutations; the role is informational.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
  strum::IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
  Admin,
  #[default]
  User,
}

/// A registered user. The password hash is kept for verification but is never
/// serialised.
#[derive(Debug, Clone, Serialize)]
pub struct User {
  pub id:            Uuid,
  pub name:          String,
  pub email:         String,
  #[serde(skip_serializing)]
  pub password_hash: String,
  pub role:          Role,
  pub created_at:    DateTime<Utc>,
  pub updated_at:    DateTime<Utc>,
}

/// Input to [`crate::store::InventoryStore::insert_user`]. The secret has
/// already been hashed; ids and timestamps are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewUser {
  pub name:          String,
  pub email:         String,
  pub password_hash: String,
  pub role:          Role,
}

/// The caller identity recovered from a verified token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
  pub user_id: Uuid,
  pub name:    String,
  pub email:   String,
  pub role:    Role,
}

//! Pluggable credential capabilities.
//!
//! The core never hashes a password or signs a token itself. It depends only
//! on these black-box contracts; `depot-server` supplies argon2 and HS256 JWT
//! implementations.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Result,
  user::{Identity, Role},
};

/// One-way password hashing.
pub trait SecretHasher: Send + Sync {
  /// Produce a self-describing hash of `secret` (salt included).
  fn hash(&self, secret: &str) -> Result<String>;

  /// `true` iff `secret` matches `hash`. A malformed hash is a mismatch.
  fn verify(&self, secret: &str, hash: &str) -> bool;
}

/// Claims carried by a bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
  /// Subject: the user id.
  pub sub:   Uuid,
  pub email: String,
  pub name:  String,
  pub role:  Role,
  pub iss:   String,
  /// Issued-at, seconds since the Unix epoch.
  pub iat:   i64,
  /// Expiry, seconds since the Unix epoch.
  pub exp:   i64,
}

impl From<Claims> for Identity {
  fn from(c: Claims) -> Self {
    Identity { user_id: c.sub, name: c.name, email: c.email, role: c.role }
  }
}

/// Signed, tamper-evident tokens.
pub trait TokenCodec: Send + Sync {
  fn sign(&self, claims: &Claims) -> Result<String>;

  /// Verify signature, issuer and expiry. Any failure is
  /// [`crate::Error::Unauthenticated`].
  fn verify(&self, token: &str) -> Result<Claims>;

  /// The issuer this codec stamps into and expects from tokens.
  fn issuer(&self) -> &str;
}

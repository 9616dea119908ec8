//! Registration, login and token authentication.
//!
//! Authorization is stateless: nothing about a session is stored, every
//! request is authenticated afresh from its bearer token.

use std::{sync::Arc, time::Duration};

use chrono::Utc;
use uuid::Uuid;

use crate::{
  Error, Result,
  credentials::{Claims, SecretHasher, TokenCodec},
  store::{InventoryStore, bounded},
  user::{Identity, NewUser, Role, User},
};

pub const MIN_SECRET_LEN: usize = 6;

/// Uniform message for unknown email and wrong password alike.
const INVALID_CREDENTIALS: &str = "invalid credentials";

pub struct IdentityService<S> {
  store:     Arc<S>,
  hasher:    Arc<dyn SecretHasher>,
  tokens:    Arc<dyn TokenCodec>,
  token_ttl: chrono::Duration,
  timeout:   Duration,
}

impl<S: InventoryStore> IdentityService<S> {
  pub fn new(
    store: Arc<S>,
    hasher: Arc<dyn SecretHasher>,
    tokens: Arc<dyn TokenCodec>,
    token_ttl: chrono::Duration,
    timeout: Duration,
  ) -> Self {
    Self { store, hasher, tokens, token_ttl, timeout }
  }

  /// Create a user with the default role.
  pub async fn register(&self, name: &str, email: &str, secret: &str) -> Result<User> {
    self.register_with_role(name, email, secret, Role::default()).await
  }

  /// Create a user with an explicit role. Only reachable from trusted code
  /// paths such as seeding; the HTTP surface always uses [`Self::register`].
  pub async fn register_with_role(
    &self,
    name: &str,
    email: &str,
    secret: &str,
    role: Role,
  ) -> Result<User> {
    let name = name.trim();
    let email = email.trim();
    if name.is_empty() || email.is_empty() || secret.is_empty() {
      return Err(Error::invalid("name, email, and password are required"));
    }
    if !email.contains('@') {
      return Err(Error::invalid("email address is malformed"));
    }
    if secret.chars().count() < MIN_SECRET_LEN {
      return Err(Error::invalid(format!(
        "password must be at least {MIN_SECRET_LEN} characters"
      )));
    }

    let password_hash = self.hasher.hash(secret)?;
    let user = bounded(
      self.timeout,
      self.store.insert_user(NewUser {
        name: name.to_owned(),
        email: email.to_owned(),
        password_hash,
        role,
      }),
    )
    .await?;

    tracing::info!(user_id = %user.id, role = %user.role, "user registered");
    Ok(user)
  }

  /// Verify credentials and issue a signed token.
  pub async fn login(&self, email: &str, secret: &str) -> Result<String> {
    let user = bounded(self.timeout, self.store.find_user_by_email(email.trim()))
      .await?
      .ok_or_else(|| Error::unauthenticated(INVALID_CREDENTIALS))?;

    if !self.hasher.verify(secret, &user.password_hash) {
      tracing::debug!(user_id = %user.id, "password mismatch");
      return Err(Error::unauthenticated(INVALID_CREDENTIALS));
    }

    let now = Utc::now();
    let expires = now
      .checked_add_signed(self.token_ttl)
      .ok_or_else(|| Error::Internal(format!("token lifetime {} is out of range", self.token_ttl)))?;
    let claims = Claims {
      sub:   user.id,
      email: user.email,
      name:  user.name,
      role:  user.role,
      iss:   self.tokens.issuer().to_owned(),
      iat:   now.timestamp(),
      exp:   expires.timestamp(),
    };
    let token = self.tokens.sign(&claims)?;
    tracing::info!(user_id = %claims.sub, "login succeeded");
    Ok(token)
  }

  /// Resolve a bearer token to the caller's identity.
  pub fn authenticate(&self, token: &str) -> Result<Identity> {
    if token.trim().is_empty() {
      return Err(Error::unauthenticated("missing token"));
    }
    Ok(self.tokens.verify(token.trim())?.into())
  }

  pub async fn profile(&self, user_id: Uuid) -> Result<User> {
    bounded(self.timeout, self.store.get_user(user_id))
      .await?
      .ok_or(Error::UserNotFound(user_id))
  }

  pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
    bounded(self.timeout, self.store.find_user_by_email(email.trim())).await
  }
}

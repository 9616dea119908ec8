//! JSON REST API for Depot.
//!
//! Exposes an axum [`Router`] backed by any [`InventoryStore`], plus the
//! argon2 and JWT implementations of the core credential traits.
//!
//! # Mounting
//!
//! ```rust,ignore
//! let state = AppState::new(Arc::new(store), config);
//! axum::serve(listener, depot_server::router(state)).await?;
//! ```

pub mod auth;
pub mod envelope;
pub mod error;
pub mod handlers;
pub mod seed;

pub use error::ApiError;

use std::{path::PathBuf, sync::Arc, time::Duration};

use axum::{
  Router,
  http::Method,
  routing::{get, patch, post},
};
use depot_core::{ActivityQuery, IdentityService, Ledger, store::InventoryStore};
use serde::Deserialize;
use tower_http::{
  cors::{Any, CorsLayer},
  trace::TraceLayer,
};

use auth::{Argon2Hasher, JwtCodec};
use handlers::{activities, auth as session, items};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Longest token lifetime the server will issue: one year.
pub const MAX_JWT_EXPIRE_HOURS: i64 = 24 * 365;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
  #[error("jwt_secret must be set (config file or DEPOT_JWT_SECRET)")]
  MissingJwtSecret,

  #[error("jwt_expire_hours must be between 1 and {max}, got {hours}")]
  JwtExpireHours { hours: i64, max: i64 },
}

/// Runtime server configuration, deserialised from `config.toml` and
/// `DEPOT_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
  pub host:             String,
  pub port:             u16,
  /// `production` switches logs to JSON.
  pub environment:      String,
  pub store_path:       PathBuf,
  pub jwt_secret:       String,
  pub jwt_issuer:       String,
  pub jwt_expire_hours: i64,
  pub store_timeout_ms: u64,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:             "0.0.0.0".to_string(),
      port:             3000,
      environment:      "development".to_string(),
      store_path:       PathBuf::from("depot.db"),
      jwt_secret:       String::new(),
      jwt_issuer:       "depot".to_string(),
      jwt_expire_hours: 24,
      store_timeout_ms: 5000,
    }
  }
}

impl ServerConfig {
  pub fn is_production(&self) -> bool { self.environment.eq_ignore_ascii_case("production") }

  pub fn store_timeout(&self) -> Duration { Duration::from_millis(self.store_timeout_ms) }

  /// Token lifetime, clamped to `1..=MAX_JWT_EXPIRE_HOURS` hours.
  pub fn token_ttl(&self) -> chrono::Duration {
    chrono::Duration::hours(self.jwt_expire_hours.clamp(1, MAX_JWT_EXPIRE_HOURS))
  }

  /// Reject settings the server cannot run with.
  pub fn validate(&self) -> Result<(), ConfigError> {
    if self.jwt_secret.is_empty() {
      return Err(ConfigError::MissingJwtSecret);
    }
    if !(1..=MAX_JWT_EXPIRE_HOURS).contains(&self.jwt_expire_hours) {
      return Err(ConfigError::JwtExpireHours {
        hours: self.jwt_expire_hours,
        max:   MAX_JWT_EXPIRE_HOURS,
      });
    }
    Ok(())
  }
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S> {
  pub identity:   Arc<IdentityService<S>>,
  pub ledger:     Arc<Ledger<S>>,
  pub activities: Arc<ActivityQuery<S>>,
  pub config:     Arc<ServerConfig>,
}

// Manual impl: a derive would demand `S: Clone`.
impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      identity:   self.identity.clone(),
      ledger:     self.ledger.clone(),
      activities: self.activities.clone(),
      config:     self.config.clone(),
    }
  }
}

impl<S: InventoryStore> AppState<S> {
  /// Wire the three services to `store` with argon2 hashing and HS256 tokens.
  pub fn new(store: Arc<S>, config: ServerConfig) -> Self {
    let timeout = config.store_timeout();
    let tokens = JwtCodec::new(&config.jwt_secret, config.jwt_issuer.clone());
    Self {
      identity:   Arc::new(IdentityService::new(
        store.clone(),
        Arc::new(Argon2Hasher),
        Arc::new(tokens),
        config.token_ttl(),
        timeout,
      )),
      ledger:     Arc::new(Ledger::new(store.clone(), timeout)),
      activities: Arc::new(ActivityQuery::new(store, timeout)),
      config:     Arc::new(config),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full application router, everything nested under `/api`.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: InventoryStore + 'static,
{
  let api = Router::new()
    // Identity
    .route("/register", post(session::register::<S>))
    .route("/login", post(session::login::<S>))
    .route("/profile", get(session::profile::<S>))
    // Activity
    .route("/activities", get(activities::list::<S>))
    .route("/activities/recent", get(activities::recent::<S>))
    // Items
    .route("/items", get(items::list::<S>).post(items::create::<S>))
    .route(
      "/items/{id}",
      get(items::get_one::<S>)
        .put(items::update::<S>)
        .delete(items::delete::<S>),
    )
    .route("/items/{id}/stock", patch(items::update_stock::<S>))
    .route("/items/{id}/activities", get(activities::by_item::<S>));

  let cors = CorsLayer::new()
    .allow_origin(Any)
    .allow_methods([
      Method::GET,
      Method::POST,
      Method::PUT,
      Method::PATCH,
      Method::DELETE,
      Method::OPTIONS,
    ])
    .allow_headers(Any);

  Router::new()
    .nest("/api", api)
    .layer(cors)
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

#[cfg(test)]
mod tests;

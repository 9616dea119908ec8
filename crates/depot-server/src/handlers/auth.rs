//! Handlers for registration, login and the caller's profile.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/register` | Body: `{"name","email","password"}` |
//! | `POST` | `/login` | Body: `{"email","password"}`; returns a bearer token |
//! | `GET`  | `/profile` | Requires a token |

use axum::{
  Json,
  extract::{State, rejection::JsonRejection},
  http::StatusCode,
  response::Response,
};
use depot_core::store::InventoryStore;
use serde::Deserialize;
use serde_json::json;

use crate::{AppState, auth::Authenticated, envelope, error::ApiError};

// ─── Register ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RegisterBody {
  #[serde(default)]
  pub name:     String,
  #[serde(default)]
  pub email:    String,
  #[serde(default)]
  pub password: String,
}

/// `POST /register`
pub async fn register<S>(
  State(state): State<AppState<S>>,
  body: Result<Json<RegisterBody>, JsonRejection>,
) -> Result<Response, ApiError>
where
  S: InventoryStore + 'static,
{
  let Json(body) = body?;
  let user = state
    .identity
    .register(&body.name, &body.email, &body.password)
    .await?;
  Ok(envelope::success(
    StatusCode::CREATED,
    "Registration successful",
    json!({ "user": user }),
  ))
}

// ─── Login ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LoginBody {
  #[serde(default)]
  pub email:    String,
  #[serde(default)]
  pub password: String,
}

/// `POST /login`
pub async fn login<S>(
  State(state): State<AppState<S>>,
  body: Result<Json<LoginBody>, JsonRejection>,
) -> Result<Response, ApiError>
where
  S: InventoryStore + 'static,
{
  let Json(body) = body?;
  if body.email.trim().is_empty() || body.password.is_empty() {
    return Err(depot_core::Error::invalid("email and password are required").into());
  }
  let token = state.identity.login(&body.email, &body.password).await?;
  Ok(envelope::success(
    StatusCode::OK,
    "Login successful",
    json!({ "token": token }),
  ))
}

// ─── Profile ──────────────────────────────────────────────────────────────────

/// `GET /profile`
pub async fn profile<S>(
  State(state): State<AppState<S>>,
  Authenticated(caller): Authenticated,
) -> Result<Response, ApiError>
where
  S: InventoryStore + 'static,
{
  let user = state.identity.profile(caller.user_id).await?;
  Ok(envelope::success(
    StatusCode::OK,
    "Profile retrieved successfully",
    json!({ "user": user }),
  ))
}

//! Credential capabilities (argon2 hashing, HS256 tokens) and the bearer-token
//! extractor.

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use axum::{
  extract::FromRequestParts,
  http::{header, request::Parts},
};
use depot_core::{
  Error,
  credentials::{Claims, SecretHasher, TokenCodec},
  store::InventoryStore,
  user::Identity,
};
use jsonwebtoken::{
  Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
  errors::ErrorKind as JwtErrorKind,
};
use rand_core::OsRng;

use crate::{AppState, error::ApiError};

// ─── Passwords ────────────────────────────────────────────────────────────────

/// Argon2id with the crate's default parameters, PHC string output.
pub struct Argon2Hasher;

impl SecretHasher for Argon2Hasher {
  fn hash(&self, secret: &str) -> depot_core::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
      .hash_password(secret.as_bytes(), &salt)
      .map(|hash| hash.to_string())
      .map_err(|e| Error::Internal(format!("argon2 error: {e}")))
  }

  fn verify(&self, secret: &str, hash: &str) -> bool {
    PasswordHash::new(hash).is_ok_and(|parsed| {
      Argon2::default()
        .verify_password(secret.as_bytes(), &parsed)
        .is_ok()
    })
  }
}

// ─── Tokens ───────────────────────────────────────────────────────────────────

/// HS256 JSON Web Tokens. Expiry is checked with zero leeway.
pub struct JwtCodec {
  encoding:   EncodingKey,
  decoding:   DecodingKey,
  validation: Validation,
  issuer:     String,
}

impl JwtCodec {
  pub fn new(secret: &str, issuer: impl Into<String>) -> Self {
    let issuer = issuer.into();
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    validation.set_issuer(&[issuer.as_str()]);
    Self {
      encoding: EncodingKey::from_secret(secret.as_bytes()),
      decoding: DecodingKey::from_secret(secret.as_bytes()),
      validation,
      issuer,
    }
  }
}

impl TokenCodec for JwtCodec {
  fn sign(&self, claims: &Claims) -> depot_core::Result<String> {
    encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
      .map_err(|e| Error::Internal(format!("token signing failed: {e}")))
  }

  fn verify(&self, token: &str) -> depot_core::Result<Claims> {
    decode::<Claims>(token, &self.decoding, &self.validation)
      .map(|data| data.claims)
      .map_err(|e| match e.kind() {
        JwtErrorKind::ExpiredSignature => Error::unauthenticated("token expired"),
        JwtErrorKind::InvalidIssuer => Error::unauthenticated("token issuer mismatch"),
        _ => Error::unauthenticated("invalid token"),
      })
  }

  fn issuer(&self) -> &str { &self.issuer }
}

// ─── Extractor ────────────────────────────────────────────────────────────────

/// The verified caller. Present in a handler means the request carried a valid
/// `Authorization: Bearer <token>` header.
pub struct Authenticated(pub Identity);

/// Pull the token out of an `Authorization: Bearer ...` header value.
fn bearer_token(parts: &Parts) -> Result<&str, Error> {
  let value = parts
    .headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .ok_or_else(|| Error::unauthenticated("missing authorization header"))?;

  value
    .strip_prefix("Bearer ")
    .or_else(|| value.strip_prefix("bearer "))
    .ok_or_else(|| Error::unauthenticated("authorization header must be a bearer token"))
}

impl<S> FromRequestParts<AppState<S>> for Authenticated
where
  S: InventoryStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let token = bearer_token(parts)?;
    Ok(Authenticated(state.identity.authenticate(token)?))
  }
}

#[cfg(test)]
mod tests {
  use chrono::Utc;
  use depot_core::user::Role;
  use uuid::Uuid;

  use super::*;

  fn claims(issuer: &str, exp_offset_secs: i64) -> Claims {
    let now = Utc::now().timestamp();
    Claims {
      sub:   Uuid::new_v4(),
      email: "ada@example.com".into(),
      name:  "Ada".into(),
      role:  Role::User,
      iss:   issuer.into(),
      iat:   now,
      exp:   now + exp_offset_secs,
    }
  }

  #[test]
  fn argon2_round_trip() {
    let hasher = Argon2Hasher;
    let hash = hasher.hash("password").unwrap();
    assert!(hash.starts_with("$argon2"));
    assert!(hasher.verify("password", &hash));
    assert!(!hasher.verify("Password", &hash));
    assert!(!hasher.verify("password", "not-a-phc-string"));
  }

  #[test]
  fn token_round_trip() {
    let codec = JwtCodec::new("secret", "depot");
    let issued = claims("depot", 3600);
    let token = codec.sign(&issued).unwrap();
    assert_eq!(codec.verify(&token).unwrap(), issued);
  }

  #[test]
  fn expired_token_is_rejected() {
    let codec = JwtCodec::new("secret", "depot");
    let token = codec.sign(&claims("depot", -10)).unwrap();
    let err = codec.verify(&token).unwrap_err();
    assert!(matches!(err, Error::Unauthenticated(ref m) if m == "token expired"));
  }

  #[test]
  fn foreign_secret_is_rejected() {
    let token = JwtCodec::new("other", "depot").sign(&claims("depot", 3600)).unwrap();
    let err = JwtCodec::new("secret", "depot").verify(&token).unwrap_err();
    assert!(matches!(err, Error::Unauthenticated(_)));
  }

  #[test]
  fn foreign_issuer_is_rejected() {
    let codec = JwtCodec::new("secret", "depot");
    let token = codec.sign(&claims("someone-else", 3600)).unwrap();
    assert!(matches!(codec.verify(&token), Err(Error::Unauthenticated(_))));
  }

  #[test]
  fn bearer_prefix_is_required() {
    let (parts, _) = axum::http::Request::builder()
      .header(header::AUTHORIZATION, "Basic abc")
      .body(())
      .unwrap()
      .into_parts();
    assert!(bearer_token(&parts).is_err());

    let (parts, _) = axum::http::Request::builder()
      .header(header::AUTHORIZATION, "Bearer abc.def")
      .body(())
      .unwrap()
      .into_parts();
    assert_eq!(bearer_token(&parts).unwrap(), "abc.def");
  }
}

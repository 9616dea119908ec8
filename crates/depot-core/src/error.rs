//! Error types for `depot-core`.
//!
//! Every backend and capability error is folded into [`Error`] before it
//! leaves a service, so callers only ever match on this taxonomy.

use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid argument: {0}")]
  InvalidArgument(String),

  #[error("unauthenticated: {0}")]
  Unauthenticated(String),

  #[error("user not found: {0}")]
  UserNotFound(Uuid),

  #[error("item not found: {0}")]
  ItemNotFound(Uuid),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error(
    "insufficient stock for item {item_id}: {available} available, {requested} requested"
  )]
  InsufficientStock {
    item_id:   Uuid,
    available: u32,
    requested: u32,
  },

  #[error("store unavailable: {0}")]
  Unavailable(String),

  #[error("store call timed out after {0:?}")]
  Timeout(Duration),

  #[error("internal error: {0}")]
  Internal(String),
}

impl Error {
  pub fn invalid(msg: impl Into<String>) -> Self {
    Self::InvalidArgument(msg.into())
  }

  pub fn unauthenticated(msg: impl Into<String>) -> Self {
    Self::Unauthenticated(msg.into())
  }

  /// The stable, machine-readable classification of this error.
  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
      Self::Unauthenticated(_) => ErrorKind::Unauthenticated,
      Self::UserNotFound(_) | Self::ItemNotFound(_) => ErrorKind::NotFound,
      Self::Conflict(_) => ErrorKind::Conflict,
      Self::InsufficientStock { .. } => ErrorKind::InsufficientStock,
      Self::Unavailable(_) => ErrorKind::Unavailable,
      Self::Timeout(_) => ErrorKind::Timeout,
      Self::Internal(_) => ErrorKind::Internal,
    }
  }
}

/// Coarse error classes exposed to API clients.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display, strum::IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
  InvalidArgument,
  Unauthenticated,
  NotFound,
  Conflict,
  InsufficientStock,
  Unavailable,
  Timeout,
  Internal,
}

impl ErrorKind {
  /// Whether a caller may retry the same request after backing off.
  pub fn is_retryable(self) -> bool {
    matches!(self, Self::Unavailable | Self::Timeout)
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn not_found_variants_share_a_kind() {
    assert_eq!(Error::UserNotFound(Uuid::nil()).kind(), ErrorKind::NotFound);
    assert_eq!(Error::ItemNotFound(Uuid::nil()).kind(), ErrorKind::NotFound);
  }

  #[test]
  fn kind_renders_snake_case() {
    let kind = Error::InsufficientStock {
      item_id:   Uuid::nil(),
      available: 1,
      requested: 2,
    }
    .kind();
    assert_eq!(kind.to_string(), "insufficient_stock");
    assert_eq!(
      serde_json::to_value(kind).unwrap(),
      serde_json::json!("insufficient_stock")
    );
  }

  #[test]
  fn only_transient_kinds_are_retryable() {
    assert!(ErrorKind::Timeout.is_retryable());
    assert!(ErrorKind::Unavailable.is_retryable());
    assert!(!ErrorKind::InsufficientStock.is_retryable());
    assert!(!ErrorKind::Conflict.is_retryable());
  }
}

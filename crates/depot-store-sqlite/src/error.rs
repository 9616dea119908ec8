//! Error type for `depot-store-sqlite`.

use rusqlite::ErrorCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A domain rule rejected the mutation inside its transaction.
  #[error("core error: {0}")]
  Core(#[from] depot_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("sqlite error: {0}")]
  Sqlite(#[from] rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("decimal parse error: {0}")]
  Decimal(#[from] rust_decimal::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("unknown {column} value: {value:?}")]
  UnknownValue { column: &'static str, value: String },

  #[error("item not found: {0}")]
  ItemNotFound(uuid::Uuid),

  #[error("email {0} is already registered")]
  DuplicateEmail(String),

  #[error("sku {0} already exists")]
  DuplicateSku(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// `true` for a UNIQUE constraint failure.
pub(crate) fn is_unique_violation(e: &rusqlite::Error) -> bool {
  matches!(
    e,
    rusqlite::Error::SqliteFailure(f, _)
      if f.code == ErrorCode::ConstraintViolation
        && f.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
  )
}

pub(crate) fn is_busy(e: &rusqlite::Error) -> bool {
  matches!(
    e,
    rusqlite::Error::SqliteFailure(f, _)
      if matches!(f.code, ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked)
  )
}

impl From<Error> for depot_core::Error {
  fn from(e: Error) -> Self {
    use depot_core::Error as Core;
    match e {
      Error::Core(inner) => inner,
      Error::ItemNotFound(id) => Core::ItemNotFound(id),
      Error::DuplicateEmail(email) => {
        Core::Conflict(format!("email {email} is already registered"))
      }
      Error::DuplicateSku(sku) => Core::Conflict(format!("sku {sku} already exists")),
      Error::Database(tokio_rusqlite::Error::ConnectionClosed) => {
        Core::Unavailable("database connection closed".to_owned())
      }
      Error::Database(tokio_rusqlite::Error::Rusqlite(inner)) | Error::Sqlite(inner)
        if is_busy(&inner) =>
      {
        Core::Unavailable(inner.to_string())
      }
      other => Core::Internal(other.to_string()),
    }
  }
}

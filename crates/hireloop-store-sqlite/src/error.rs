//! Error type for `hireloop-store-sqlite`.

use hireloop_core::{Classify, ErrorKind};
use rusqlite::{ErrorCode, ffi};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Core(#[from] hireloop_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("sqlite error: {0}")]
  Sqlite(#[from] rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("decimal parse error: {0}")]
  Decimal(#[from] rust_decimal::Error),

  /// A stored value could not be decoded back into its domain type.
  #[error("decode error: {0}")]
  Decode(String),
}

impl Classify for Error {
  fn kind(&self) -> ErrorKind {
    match self {
      Error::Core(e) => e.kind(),
      Error::Sqlite(e) => sqlite_kind(e),
      Error::Database(tokio_rusqlite::Error::Rusqlite(e)) => sqlite_kind(e),
      Error::Database(tokio_rusqlite::Error::ConnectionClosed) => ErrorKind::Unavailable,
      Error::Database(_) | Error::Json(_) | Error::Decimal(_) | Error::Decode(_) => {
        ErrorKind::Internal
      }
    }
  }
}

fn sqlite_kind(e: &rusqlite::Error) -> ErrorKind {
  match e {
    rusqlite::Error::SqliteFailure(f, _)
      if matches!(f.code, ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked) =>
    {
      ErrorKind::Unavailable
    }
    _ if is_unique_violation(e) => ErrorKind::Conflict,
    _ => ErrorKind::Internal,
  }
}

/// `true` for a UNIQUE or PRIMARY KEY violation. Check constraints and
/// foreign keys are not included.
pub(crate) fn is_unique_violation(e: &rusqlite::Error) -> bool {
  matches!(
    e,
    rusqlite::Error::SqliteFailure(f, _)
      if f.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
        || f.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY
  )
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

//! The mongodb crate doesn't expose error code constants, so the codes we
//! care about live here.

use mongodb::error::{Error as DbError, ErrorKind, WriteFailure};

/// Error code raised when a write violates a unique index.
pub const DUPLICATE_KEY: i32 = 11000;

/// Return true if the given result failed with a duplicate key write error.
pub fn is_duplicate_key_error<T>(result: Result<T, &DbError>) -> bool {
    match result {
        Err(err) => matches!(
            *err.kind,
            ErrorKind::Write(WriteFailure::WriteError(ref e)) if e.code == DUPLICATE_KEY
        ),
        Ok(_) => false,
    }
}

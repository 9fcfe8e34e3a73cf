//! Error taxonomy for the TLOG writer.
//!
//! Usage errors are programming faults and fail loudly; I/O errors come from
//! the sink and make the writer unusable.

use thiserror::Error;

use crate::identifier::Identifier;

/// Errors returned by [`crate::FileWriter`] operations.
#[derive(Error, Debug)]
pub enum TlogError {
    /// A mutating call was made after `close()` already ran.
    #[error("writer is not open")]
    NotOpen,

    /// Reserved for a future re-openable writer API; a writer is opened by
    /// construction and cannot currently be reopened, so this is never
    /// produced today.
    #[error("writer is already open")]
    AlreadyOpen,

    /// `WriteSchema`/`WriteData` referenced an identifier that was never
    /// allocated or reserved on this writer.
    #[error("unknown identifier {0}")]
    UnknownIdentifier(Identifier),

    /// Reserved for a future API distinguishing "name bound to a different
    /// id" from the boolean `false` `ReserveIdentifier`/`AllocateIdentifier`
    /// already return for that case.
    #[error("name already bound to a different identifier")]
    DuplicateName,

    /// `WriteSchema` called twice for the same identifier.
    #[error("schema already written for identifier {0}")]
    SchemaAlreadyWritten(Identifier),

    /// `ReserveIdentifier` was called with identifier `0`, which is reserved
    /// and never assignable.
    #[error("identifier 0 is reserved and cannot be assigned")]
    IdentifierReserved,

    /// The underlying sink failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias for results from this crate.
pub type Result<T> = std::result::Result<T, TlogError>;

//! TLOG v3: a self-describing, seekable, append-only binary log.
//!
//! A log is a sequence of typed, length-prefixed blocks (see [`block`])
//! ending in a trailing index that lets a reader find any identifier's
//! schema and most recent record without scanning the whole file. Callers
//! interact with the format exclusively through [`FileWriter`].

mod block;
mod error;
mod identifier;
mod index;
mod options;
mod writer;

pub use block::{data_flags, BlockType, FOOTER_MAGIC, MAGIC, NO_RECORD_OFFSET};
pub use error::{Result, TlogError};
pub use identifier::Identifier;
pub use index::IndexEntry;
pub use options::FileWriterOptions;
pub use writer::FileWriter;

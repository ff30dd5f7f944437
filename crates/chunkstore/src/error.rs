//! Store-specific error types.

use std::error::Error;
use std::fmt;
use std::io;

/// Errors that can occur during store serialization or table lookups.
///
/// Out-of-range element indices are deliberately absent: they are a caller
/// contract violation, not a recoverable condition (see the crate docs).
#[derive(Debug)]
pub enum StoreError {
    /// An I/O error occurred during save or load (including a truncated stream).
    Io(io::Error),
    /// The `bytes_per_block` word of a loaded header does not match the
    /// value implied by the receiving array's block size and element type.
    ChunkSizeMismatch {
        /// Bytes per block the receiving array was compiled for.
        expected: u32,
        /// Bytes per block recorded in the stream.
        found: u32,
    },
    /// `save` was asked to write more logical elements than are allocated.
    LineCountExceedsCapacity {
        /// Requested number of logical elements.
        lines: usize,
        /// Allocated capacity in logical elements.
        capacity: usize,
    },
    /// A count does not fit in its 32-bit header word.
    HeaderOverflow {
        /// Which header word overflowed.
        field: &'static str,
        /// The value that did not fit.
        value: usize,
    },
    /// A loaded header is internally inconsistent.
    MalformedHeader {
        /// Human-readable description of what went wrong.
        detail: String,
    },
    /// No store with this name exists in the table.
    UnknownStore {
        /// The requested name.
        name: String,
    },
    /// A store with this name already exists in the table.
    DuplicateStore {
        /// The conflicting name.
        name: String,
    },
    /// A store's block size differs from the table it is added to.
    IncompatibleChunkSize {
        /// The store name.
        name: String,
        /// Block size of the table.
        expected: usize,
        /// Block size of the rejected store.
        found: usize,
    },
    /// A store exists but has a different concrete type than requested.
    TypeMismatch {
        /// The store name.
        name: String,
        /// The requested concrete type.
        expected: &'static str,
        /// The element type actually stored.
        found: &'static str,
    },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::ChunkSizeMismatch { expected, found } => {
                write!(
                    f,
                    "chunk size mismatch: expected {expected} bytes per block, stream has {found}"
                )
            }
            Self::LineCountExceedsCapacity { lines, capacity } => {
                write!(
                    f,
                    "cannot save {lines} elements: only {capacity} are allocated"
                )
            }
            Self::HeaderOverflow { field, value } => {
                write!(f, "{field} = {value} does not fit in a 32-bit header word")
            }
            Self::MalformedHeader { detail } => write!(f, "malformed header: {detail}"),
            Self::UnknownStore { name } => write!(f, "unknown store: {name:?}"),
            Self::DuplicateStore { name } => write!(f, "store {name:?} already exists"),
            Self::IncompatibleChunkSize {
                name,
                expected,
                found,
            } => {
                write!(
                    f,
                    "store {name:?} has chunk size {found}, table uses {expected}"
                )
            }
            Self::TypeMismatch {
                name,
                expected,
                found,
            } => {
                write!(
                    f,
                    "store {name:?} has element type {found}, requested {expected}"
                )
            }
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for StoreError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

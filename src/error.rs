//! Errors returned by [`crate::device::RamRsBlockDevice`].
//!
//! Contract violations (misaligned offsets, out-of-range blocks,
//! impossible configurations) are `assert!`s, not `Result`s — they are
//! programmer errors. Only data errors discovered while decoding a
//! codeword, and allocation failure while constructing a device, are
//! represented here.

use std::fmt;

/// Why a read was rejected as corrupt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorruptReason {
    /// Berlekamp-Massey found more byte errors than the device's
    /// `error_correction` policy allows.
    TooManyErrors { found: usize, limit: usize },
    /// Correction was attempted but the syndromes were still non-zero
    /// afterwards — the codeword had more errors than Λ could resolve.
    VerifyFailed,
}

impl fmt::Display for CorruptReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CorruptReason::TooManyErrors { found, limit } => {
                write!(f, "{} > {}", found, limit)
            }
            CorruptReason::VerifyFailed => write!(f, "s != 0"),
        }
    }
}

/// Errors returned by device operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A codeword could not be read back correctly.
    Corrupt {
        block: u32,
        offset: u32,
        size: u32,
        reason: CorruptReason,
    },
    /// Construction failed to allocate a buffer.
    NoMemory,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Corrupt {
                block,
                offset,
                size,
                reason,
            } => write!(
                f,
                "found uncorrectable ramrsbd errors 0x{:x}.{:x} {} ({})",
                block, offset, size, reason
            ),
            Error::NoMemory => write!(f, "out of memory"),
        }
    }
}

impl std::error::Error for Error {}

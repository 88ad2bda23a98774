//! `ramrsbd`: a Reed-Solomon BCH error-correcting block device backed by
//! RAM.
//!
//! Stores fixed-size erase blocks in memory and transparently encodes
//! each fixed-size codeword with a systematic, narrow-sense Reed-Solomon
//! code over GF(256) before writing it, decoding (and correcting byte
//! errors in) each codeword on read.
//!
//! ```
//! use ramrsbd::{RamRsBlockDevice, RsConfig, BlockConfig};
//!
//! let rs = RsConfig {
//!     code_size: 16,
//!     ecc_size: 4,
//!     error_correction: 0,
//!     generator_poly: None,
//! };
//! let block = BlockConfig {
//!     read_size: 12,
//!     prog_size: 12,
//!     block_size: 12,
//!     block_count: 4,
//!     erase_size: 16,
//! };
//! let mut dev = RamRsBlockDevice::new(rs, block).unwrap();
//!
//! dev.erase(0);
//! dev.prog(0, 0, b"hello world!");
//!
//! // a byte of media corruption is still correctable
//! let mut out = [0u8; 12];
//! dev.read(0, 0, &mut out).unwrap();
//! assert_eq!(&out, b"hello world!");
//! ```

/// Galois-field (GF(256)) arithmetic.
pub mod gf;
pub use gf::Gf256;

/// Polynomial arithmetic over GF(256), MS-first byte slices.
pub mod poly;

/// Generator-polynomial construction, systematic encode, and
/// syndrome/Berlekamp-Massey/Forney decode.
pub mod rs;

/// Configuration entities (`RsConfig`, `BlockConfig`) and validation.
pub mod config;
pub use config::{BlockConfig, RsConfig};

/// Error and diagnostic types.
pub mod error;
pub use error::{CorruptReason, Error};

/// The block-device façade.
pub mod device;
pub use device::RamRsBlockDevice;

// Lightweight, feature-gated tracing, mirroring ramrsbd's own
// RAMRSBD_TRACE/RAMRSBD_DEBUG/RAMRSBD_WARN macros (compiled to nothing
// unless the `trace` feature is on, rather than pulling in a logging
// crate no repo in this lineage depends on for this purpose).
#[doc(hidden)]
#[macro_export]
macro_rules! trace {
    ($($args:tt)*) => {
        #[cfg(feature = "trace")]
        eprintln!("ramrsbd::trace: {}", format!($($args)*));
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! debug {
    ($($args:tt)*) => {
        #[cfg(feature = "trace")]
        eprintln!("ramrsbd::debug: {}", format!($($args)*));
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! warn {
    ($($args:tt)*) => {
        #[cfg(feature = "trace")]
        eprintln!("ramrsbd::warn: {}", format!($($args)*));
    };
}

//! The block-device façade: a RAM-backed store whose codewords are
//! transparently Reed-Solomon encoded and decoded on `prog`/`read`.

use std::ops::{Deref, DerefMut};

use crate::config::{self, BlockConfig, RsConfig};
use crate::error::{CorruptReason, Error};
use crate::rs::{self, DecodeScratch, Decoded};

/// A buffer the device either owns outright or borrows from the caller.
///
/// Replaces the ownership-boolean-plus-manual-free the original C driver
/// needs (`bd->cfg->buffer` present or not, freed in `destroy` only in
/// the latter case): here, `Drop` frees an `Owned` buffer and simply
/// drops the borrow of a `Borrowed` one, for free.
enum Storage<'a> {
    Owned(Vec<u8>),
    Borrowed(&'a mut [u8]),
}

impl Deref for Storage<'_> {
    type Target = [u8];
    fn deref(&self) -> &[u8] {
        match self {
            Storage::Owned(v) => v,
            Storage::Borrowed(s) => s,
        }
    }
}

impl DerefMut for Storage<'_> {
    fn deref_mut(&mut self) -> &mut [u8] {
        match self {
            Storage::Owned(v) => v,
            Storage::Borrowed(s) => s,
        }
    }
}

fn try_zeroed(len: usize) -> Result<Vec<u8>, Error> {
    let mut v = Vec::new();
    v.try_reserve_exact(len).map_err(|_| Error::NoMemory)?;
    v.resize(len, 0);
    Ok(v)
}

/// A Reed-Solomon protected RAM block device.
///
/// Message-space offsets passed to [`read`](Self::read)/
/// [`prog`](Self::prog) are translated to codeword-space offsets
/// internally (`off_c = (off / k) * n`); callers never see codeword
/// bytes directly.
pub struct RamRsBlockDevice<'a> {
    rs: RsConfig,
    block: BlockConfig,
    buffer: Storage<'a>,

    // codeword scratch, C(x)
    c: Vec<u8>,
    // generator polynomial, P(x), implicit leading 1
    p: Vec<u8>,
    // syndrome/locator/Berlekamp-Massey scratch, reused across reads
    scratch: DecodeScratch,
}

impl<'a> RamRsBlockDevice<'a> {
    /// Construct a device that allocates both its backing store and its
    /// math scratch space itself.
    pub fn new(rs: RsConfig, block: BlockConfig) -> Result<Self, Error> {
        Self::with_storage_and_math(rs, block, None, None)
    }

    /// Construct a device backed by a caller-supplied buffer of exactly
    /// `erase_size * block_count` bytes. Math scratch is still allocated
    /// by the device.
    pub fn with_buffer(
        rs: RsConfig,
        block: BlockConfig,
        buffer: &'a mut [u8],
    ) -> Result<Self, Error> {
        Self::with_storage_and_math(rs, block, Some(buffer), None)
    }

    /// Construct a device whose math scratch space (codeword, generator,
    /// syndrome/Ω, error-locator, and Berlekamp-Massey buffers) is carved
    /// out of one caller-supplied buffer of `code_size + 4*ecc_size`
    /// bytes, instead of five separate allocations.
    pub fn with_math_buffer(
        rs: RsConfig,
        block: BlockConfig,
        math_buffer: Vec<u8>,
    ) -> Result<Self, Error> {
        Self::with_storage_and_math(rs, block, None, Some(math_buffer))
    }

    fn with_storage_and_math(
        rs: RsConfig,
        block: BlockConfig,
        buffer: Option<&'a mut [u8]>,
        math_buffer: Option<Vec<u8>>,
    ) -> Result<Self, Error> {
        crate::trace!(
            "create(code_size={}, ecc_size={}, erase_size={}, erase_count={})",
            rs.code_size,
            rs.ecc_size,
            block.erase_size,
            block.block_count
        );
        config::validate(&rs, &block);

        let ecc_size = rs.ecc_size as usize;
        let code_size = rs.code_size as usize;

        let backing_len = block.erase_size as usize * block.block_count as usize;
        let buffer = match buffer {
            Some(b) => {
                assert_eq!(
                    b.len(),
                    backing_len,
                    "ramrsbd: supplied buffer has the wrong length"
                );
                b.fill(0);
                Storage::Borrowed(b)
            }
            None => Storage::Owned(try_zeroed(backing_len)?),
        };

        let (c, mut p, mut s, mut lambda, mut t);
        if let Some(mut math) = math_buffer {
            assert_eq!(
                math.len(),
                code_size + 4 * ecc_size,
                "ramrsbd: math_buffer must be code_size + 4*ecc_size bytes"
            );
            t = math.split_off(code_size + 3 * ecc_size);
            lambda = math.split_off(code_size + 2 * ecc_size);
            s = math.split_off(code_size + ecc_size);
            p = math.split_off(code_size);
            c = math;
        } else {
            c = try_zeroed(code_size)?;
            p = try_zeroed(ecc_size)?;
            s = try_zeroed(ecc_size)?;
            lambda = try_zeroed(ecc_size)?;
            t = try_zeroed(ecc_size)?;
        }

        match &rs.generator_poly {
            Some(g) => p.copy_from_slice(g),
            None => rs::generator_poly(&mut p),
        }

        s.fill(0);
        lambda.fill(0);
        t.fill(0);

        Ok(Self {
            rs,
            block,
            buffer,
            c,
            p,
            scratch: DecodeScratch { s, lambda, t },
        })
    }

    fn k(&self) -> usize {
        self.rs.k() as usize
    }

    fn n(&self) -> usize {
        self.rs.code_size as usize
    }

    /// Read `buf.len()` message bytes starting at message-space offset
    /// `off` within `block`, correcting byte errors as needed.
    ///
    /// Returns [`Error::Corrupt`] if a codeword has more byte errors
    /// than the configured `error_correction` policy allows, or if
    /// correction was attempted but verification still failed
    /// afterwards. On error, the contents of `buf` are unspecified.
    pub fn read(&mut self, block: u32, off: u32, buf: &mut [u8]) -> Result<(), Error> {
        crate::trace!("read(0x{:x}, {}, {})", block, off, buf.len());
        assert!(block < self.block.block_count, "ramrsbd: block out of range");
        assert!(
            off % self.block.read_size == 0,
            "ramrsbd: off must be a multiple of read_size"
        );
        assert!(
            buf.len() as u32 % self.block.read_size == 0,
            "ramrsbd: size must be a multiple of read_size"
        );
        assert!(
            off + buf.len() as u32 <= self.block.block_size,
            "ramrsbd: read out of bounds"
        );

        let k = self.k();
        let n = self.n();
        let limit = self.rs.correction_limit();

        let mut off = off as usize;
        let mut written = 0;
        while written < buf.len() {
            let off_c = (off / k) * n;
            let base = block as usize * self.block.erase_size as usize + off_c;
            self.c.copy_from_slice(&self.buffer[base..base + n]);

            match rs::decode(&mut self.c, &mut self.scratch, limit) {
                Decoded::Clean => {}
                Decoded::Corrected { errors } => {
                    crate::debug!(
                        "found {} correctable ramrsbd errors 0x{:x}.{:x} {}",
                        errors,
                        block,
                        off_c,
                        k
                    );
                }
                Decoded::Uncorrectable { errors } => {
                    let reason = match errors {
                        Some(found) => CorruptReason::TooManyErrors { found, limit },
                        None => CorruptReason::VerifyFailed,
                    };
                    crate::warn!(
                        "found uncorrectable ramrsbd errors 0x{:x}.{:x} {} ({})",
                        block,
                        off_c,
                        k,
                        reason
                    );
                    return Err(Error::Corrupt {
                        block,
                        offset: off_c as u32,
                        size: k as u32,
                        reason,
                    });
                }
            }

            buf[written..written + k].copy_from_slice(&self.c[..k]);
            off += k;
            written += k;
        }

        Ok(())
    }

    /// Program `buf.len()` message bytes at message-space offset `off`
    /// within `block`. The block must have previously been erased.
    pub fn prog(&mut self, block: u32, off: u32, buf: &[u8]) {
        crate::trace!("prog(0x{:x}, {}, {})", block, off, buf.len());
        assert!(block < self.block.block_count, "ramrsbd: block out of range");
        assert!(
            off % self.block.prog_size == 0,
            "ramrsbd: off must be a multiple of prog_size"
        );
        assert!(
            buf.len() as u32 % self.block.prog_size == 0,
            "ramrsbd: size must be a multiple of prog_size"
        );
        assert!(
            off + buf.len() as u32 <= self.block.block_size,
            "ramrsbd: prog out of bounds"
        );

        let k = self.k();
        let n = self.n();

        let mut off = off as usize;
        let mut read = 0;
        while read < buf.len() {
            let off_c = (off / k) * n;
            let message = &buf[read..read + k];

            rs::encode(message, &mut self.c, &self.p);

            let base = block as usize * self.block.erase_size as usize + off_c;
            self.buffer[base..base + n].copy_from_slice(&self.c);

            off += k;
            read += k;
        }
    }

    /// Erase a block. This is a no-op beyond validating `block`: the
    /// state of an erased block is undefined, same as the original
    /// driver, so there's nothing to actually clear.
    pub fn erase(&mut self, block: u32) {
        crate::trace!("erase(0x{:x})", block);
        assert!(block < self.block.block_count, "ramrsbd: block out of range");
    }

    /// Sync the device. No-op: everything is already in RAM.
    pub fn sync(&mut self) {
        crate::trace!("sync()");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_device() -> RamRsBlockDevice<'static> {
        let rs = RsConfig {
            code_size: 16,
            ecc_size: 4,
            error_correction: 0,
            generator_poly: None,
        };
        let block = BlockConfig {
            read_size: 12,
            prog_size: 12,
            block_size: 12,
            block_count: 4,
            erase_size: 16,
        };
        RamRsBlockDevice::new(rs, block).unwrap()
    }

    #[test]
    fn clean_roundtrip() {
        let mut dev = small_device();
        let message: Vec<u8> = (0..12).collect();
        dev.erase(0);
        dev.prog(0, 0, &message);
        let mut out = vec![0u8; 12];
        dev.read(0, 0, &mut out).unwrap();
        assert_eq!(out, message);
    }

    #[test]
    fn corrects_single_byte_error() {
        let mut dev = small_device();
        let message: Vec<u8> = (0..12).collect();
        dev.erase(0);
        dev.prog(0, 0, &message);

        // flip a byte directly in the backing store, simulating media bitrot
        dev.buffer[0] ^= 0xff;

        let mut out = vec![0u8; 12];
        dev.read(0, 0, &mut out).unwrap();
        assert_eq!(out, message);
    }

    #[test]
    fn three_errors_exceed_t_equals_2_and_report_corrupt() {
        let mut dev = small_device();
        let message: Vec<u8> = (0..12).collect();
        dev.erase(0);
        dev.prog(0, 0, &message);

        dev.buffer[0] ^= 0xaa;
        dev.buffer[5] ^= 0x55;
        dev.buffer[9] ^= 0x11;

        let mut out = vec![0u8; 12];
        assert!(dev.read(0, 0, &mut out).is_err());
    }

    #[test]
    fn detect_only_policy_rejects_any_error() {
        let rs = RsConfig {
            code_size: 16,
            ecc_size: 4,
            error_correction: -1,
            generator_poly: None,
        };
        let block = BlockConfig {
            read_size: 12,
            prog_size: 12,
            block_size: 12,
            block_count: 4,
            erase_size: 16,
        };
        let mut dev = RamRsBlockDevice::new(rs, block).unwrap();
        let message: Vec<u8> = (0..12).collect();
        dev.erase(0);
        dev.prog(0, 0, &message);

        dev.buffer[0] ^= 0x01;
        let mut out = vec![0u8; 12];
        assert!(dev.read(0, 0, &mut out).is_err());
    }

    #[test]
    fn correction_cap_below_max_forces_corrupt() {
        // ecc_size/2 = 2 would normally correct 2 errors, but cap at 1
        let rs = RsConfig {
            code_size: 16,
            ecc_size: 4,
            error_correction: 1,
            generator_poly: None,
        };
        let block = BlockConfig {
            read_size: 12,
            prog_size: 12,
            block_size: 12,
            block_count: 4,
            erase_size: 16,
        };
        let mut dev = RamRsBlockDevice::new(rs, block).unwrap();
        let message: Vec<u8> = (0..12).collect();
        dev.erase(0);
        dev.prog(0, 0, &message);

        dev.buffer[0] ^= 0xaa;
        dev.buffer[5] ^= 0x55;
        let mut out = vec![0u8; 12];
        assert!(dev.read(0, 0, &mut out).is_err());
    }

    #[test]
    fn with_math_buffer_carves_scratch_from_one_allocation() {
        let rs = RsConfig {
            code_size: 16,
            ecc_size: 4,
            error_correction: 0,
            generator_poly: None,
        };
        let block = BlockConfig {
            read_size: 12,
            prog_size: 12,
            block_size: 12,
            block_count: 4,
            erase_size: 16,
        };
        let math = vec![0u8; 16 + 4 * 4];
        let mut dev = RamRsBlockDevice::with_math_buffer(rs, block, math).unwrap();
        let message: Vec<u8> = (0..12).collect();
        dev.erase(0);
        dev.prog(0, 0, &message);
        let mut out = vec![0u8; 12];
        dev.read(0, 0, &mut out).unwrap();
        assert_eq!(out, message);
    }

    #[test]
    fn ecc_size_one_detects_but_cannot_correct() {
        // ecc_size/2 == 0 in integer division, so even the "correct as
        // much as possible" default policy can only ever detect, never
        // correct, a single-byte error.
        let rs = RsConfig {
            code_size: 13,
            ecc_size: 1,
            error_correction: 0,
            generator_poly: None,
        };
        let block = BlockConfig {
            read_size: 12,
            prog_size: 12,
            block_size: 12,
            block_count: 4,
            erase_size: 13,
        };
        let mut dev = RamRsBlockDevice::new(rs, block).unwrap();
        let message: Vec<u8> = (0..12).collect();
        dev.erase(0);
        dev.prog(0, 0, &message);

        assert!(dev.read(0, 0, &mut vec![0u8; 12]).is_ok());

        dev.buffer[0] ^= 0xff;
        assert!(dev.read(0, 0, &mut vec![0u8; 12]).is_err());
    }

    #[test]
    fn code_size_255_round_trips_and_corrects() {
        let rs = RsConfig {
            code_size: 255,
            ecc_size: 8,
            error_correction: 0,
            generator_poly: None,
        };
        let block = BlockConfig {
            read_size: 247,
            prog_size: 247,
            block_size: 247,
            block_count: 2,
            erase_size: 255,
        };
        let mut dev = RamRsBlockDevice::new(rs, block).unwrap();
        let message: Vec<u8> = (0..247).map(|x: u32| (x % 256) as u8).collect();
        dev.erase(0);
        dev.prog(0, 0, &message);

        dev.buffer[10] ^= 0xaa;
        dev.buffer[200] ^= 0x55;

        let mut out = vec![0u8; 247];
        dev.read(0, 0, &mut out).unwrap();
        assert_eq!(out, message);
    }

    #[test]
    fn ecc_size_zero_is_pass_through() {
        let rs = RsConfig {
            code_size: 12,
            ecc_size: 0,
            error_correction: 0,
            generator_poly: None,
        };
        let block = BlockConfig {
            read_size: 12,
            prog_size: 12,
            block_size: 12,
            block_count: 4,
            erase_size: 12,
        };
        let mut dev = RamRsBlockDevice::new(rs, block).unwrap();
        let message: Vec<u8> = (0..12).collect();
        dev.erase(0);
        dev.prog(0, 0, &message);
        let mut out = vec![0u8; 12];
        dev.read(0, 0, &mut out).unwrap();
        assert_eq!(out, message);
    }
}

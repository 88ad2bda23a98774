//! Configuration entities for [`crate::device::RamRsBlockDevice`].
//!
//! Split the way `ramrsbd_config` and the paired `lfs_config` are split
//! in the original driver: [`RsConfig`] is the RS-specific half (field,
//! code size, correction policy), [`BlockConfig`] is the block-device
//! half (erase/read/prog geometry) that the RS layer sits underneath.

/// Reed-Solomon code parameters.
#[derive(Debug, Clone)]
pub struct RsConfig {
    /// Codeword size in bytes, `n`. Must be in `1..=255`.
    pub code_size: u8,
    /// Error-correcting code size in bytes, `n - k`. Must be `<= code_size`.
    pub ecc_size: u8,
    /// Number of byte errors to try to correct.
    ///
    /// `0` (the default) tries to correct as many errors as possible,
    /// up to `ecc_size/2`. A positive value caps correction below that
    /// maximum (trading correction for more reliable detection). `-1`
    /// disables correction entirely: any error at all is reported as
    /// corrupt.
    pub error_correction: i32,
    /// Precomputed generator polynomial, length `ecc_size`, implicit
    /// leading 1. If absent, the device computes it at construction.
    pub generator_poly: Option<Vec<u8>>,
}

impl RsConfig {
    /// The message (data) size per codeword, `code_size - ecc_size`.
    pub fn k(&self) -> u8 {
        self.code_size - self.ecc_size
    }

    /// Maximum number of byte errors Λ can resolve for this code.
    pub fn max_correctable(&self) -> u8 {
        self.ecc_size / 2
    }

    /// Resolve `error_correction` into the error count above which a
    /// read is reported corrupt, combining the always-applicable
    /// `ecc_size/2` ceiling with the configured policy.
    pub fn correction_limit(&self) -> usize {
        match self.error_correction {
            0 => self.max_correctable() as usize,
            -1 => 0,
            c if c > 0 => (c as usize).min(self.max_correctable() as usize),
            c => panic!("ramrsbd: invalid error_correction {}", c),
        }
    }

    fn validate(&self) {
        assert!(self.code_size > 0, "ramrsbd: code_size must be nonzero");
        assert!(
            self.ecc_size <= self.code_size,
            "ramrsbd: ecc_size must not exceed code_size"
        );
        assert!(
            self.error_correction >= -1,
            "ramrsbd: error_correction must be >= -1"
        );
        assert!(
            self.error_correction <= 0
                || self.error_correction as u32 <= self.max_correctable() as u32,
            "ramrsbd: error_correction exceeds ecc_size/2"
        );
        if let Some(p) = &self.generator_poly {
            assert_eq!(
                p.len(),
                self.ecc_size as usize,
                "ramrsbd: generator_poly must have length ecc_size"
            );
        }
    }
}

/// Block-device geometry the RS layer is addressed through, message-space
/// sized (i.e. these describe the caller-visible `k`-byte-aligned view,
/// not the on-media `n`-byte codewords).
#[derive(Debug, Clone, Copy)]
pub struct BlockConfig {
    /// Granularity of a read, in message bytes. Must be a multiple of `k`.
    pub read_size: u32,
    /// Granularity of a program, in message bytes. Must be a multiple of `k`.
    pub prog_size: u32,
    /// Size of one erase block in message bytes.
    pub block_size: u32,
    /// Number of erase blocks on the device.
    pub block_count: u32,
    /// Size of one erase block in on-media (codeword) bytes. Must be a
    /// multiple of `code_size`.
    pub erase_size: u32,
}

impl BlockConfig {
    fn validate(&self, rs: &RsConfig) {
        let code_size = rs.code_size as u32;
        let k = rs.k() as u32;

        assert!(
            self.erase_size % code_size == 0,
            "ramrsbd: erase_size must be a multiple of code_size"
        );
        assert!(
            self.read_size % k == 0,
            "ramrsbd: read_size must be a multiple of code_size - ecc_size"
        );
        assert!(
            self.prog_size % k == 0,
            "ramrsbd: prog_size must be a multiple of code_size - ecc_size"
        );

        // message bytes available per erase block, after ecc overhead
        let message_per_erase = self.erase_size - (self.erase_size / code_size) * rs.ecc_size as u32;
        assert!(
            self.block_size % message_per_erase == 0,
            "ramrsbd: block_size must be a multiple of the per-erase-block message capacity"
        );
    }
}

/// Validate an `(RsConfig, BlockConfig)` pair together, matching the
/// assertion set `ramrsbd_create` runs before allocating anything.
pub fn validate(rs: &RsConfig, block: &BlockConfig) {
    rs.validate();
    block.validate(rs);
}
